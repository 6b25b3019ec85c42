//! Prelude module for convenient imports.
//!
//! This module re-exports commonly used types and traits for easy access.
//!
//! # Usage
//!
//! ```rust,ignore
//! use storyland::prelude::*;
//! ```

pub use crate::llms::{
    ElevenLabs, ElevenLabsConfig, GoogleTts, GoogleTtsConfig, OpenAI, OpenAIConfig,
};

pub use crate::audio::{
    AudioFormat, AudioStream, SpeechRequest, SpeechResponse, TextToSpeechProvider, Voice,
    write_stream,
};
pub use crate::chat::{ChatProvider, ChatRequest, ChatResponse, SharedChatProvider, StopReason};
pub use crate::error::{Error, LlmError, LlmErrorKind, Result};
pub use crate::message::{Message, Role};
pub use crate::prompts::{NARRATION_INSTRUCTIONS, Persona};
pub use crate::story::{
    ComposedPrompt, NarrationCap, StoryRequest, Theme, TokenBudget, TokenRatio, build_prompt,
    compute_token_budget,
};
pub use crate::storyteller::{NarrationSettings, Story, Storyteller, narrate, narrate_to};
pub use crate::usage::Usage;
