//! OpenAI API client implementation.
//!
//! This module provides a client for the OpenAI API, supporting:
//! - Chat completions for story generation
//! - Text-to-Speech for narration, buffered or streamed

mod audio;
mod chat;
mod client;
mod config;
mod types;

pub use client::OpenAI;
pub use config::OpenAIConfig;
