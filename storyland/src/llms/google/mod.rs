//! Google Translate speech back end.
//!
//! Uses the public `translate_tts` endpoint, which needs no credentials but
//! only accepts short inputs. Longer text is split into chunks and the MP3
//! bodies are concatenated.

mod client;
mod config;

pub use client::GoogleTts;
pub use config::GoogleTtsConfig;
