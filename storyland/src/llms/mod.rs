//! Provider implementations.
//!
//! Each back end is organized into its own submodule.
//!
//! # Available Back Ends
//!
//! - [`openai`] - OpenAI chat completions and speech
//! - [`elevenlabs`] - ElevenLabs voice-cloning speech
//! - [`google`] - Google Translate speech, no credentials required

pub mod elevenlabs;
pub mod google;
pub mod openai;

pub use elevenlabs::{ElevenLabs, ElevenLabsConfig};
pub use google::{GoogleTts, GoogleTtsConfig};
pub use openai::{OpenAI, OpenAIConfig};
