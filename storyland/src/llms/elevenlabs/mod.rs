//! ElevenLabs text-to-speech client.
//!
//! Narrates with a cloned or library voice selected by voice id, with
//! adjustable stability, similarity boost and speech rate.

mod client;
mod config;

pub use client::ElevenLabs;
pub use config::ElevenLabsConfig;
