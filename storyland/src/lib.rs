//! Storyland - children's story generation and narration
//!
//! This crate composes a story prompt and token budget from a handful of
//! inputs, sends it to a hosted chat-completion service, and narrates the
//! result through one of several text-to-speech back ends.

pub mod audio;
pub mod chat;
pub mod error;
pub mod llms;
pub mod message;
pub mod mock;
pub mod prelude;
pub mod prompts;
pub mod story;
pub mod storyteller;
pub mod usage;

pub use error::{Error, LlmError, Result};
