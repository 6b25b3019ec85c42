//! Storyland CLI - generate and narrate children's stories
//!
//! Configuration and error handling for the `storyland` binary.

pub mod config;
pub mod error;
