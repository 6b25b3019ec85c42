//! The completion seam used to write stories.
//!
//! A story is one [`ChatRequest`] (persona as the system message, composed
//! prompt as the user message, budget as `max_tokens`) answered by one
//! [`ChatResponse`] from any [`ChatProvider`].
//!
//! # Example
//!
//! ```rust,ignore
//! use storyland::prelude::*;
//!
//! let request = ChatRequest::new("gpt-4o")
//!     .system(Persona::LATEST.text())
//!     .user(prompt)
//!     .max_tokens(400)
//!     .temperature(0.7);
//!
//! let response = provider.chat(&request).await?;
//! println!("{}", response.text().unwrap_or_default());
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::message::Message;
use crate::usage::Usage;

/// Why a completion stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The model finished on its own.
    #[default]
    Stop,
    /// The token budget ran out.
    Length,
    /// The provider withheld content.
    ContentFilter,
}

impl StopReason {
    /// Wire name of the reason.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Stop => "stop",
            Self::Length => "length",
            Self::ContentFilter => "content_filter",
        }
    }

    /// Reads a provider `finish_reason`; anything unrecognised is [`Self::Stop`].
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "length" | "max_tokens" => Self::Length,
            "content_filter" => Self::ContentFilter,
            _ => Self::Stop,
        }
    }

    /// The story stopped because the budget was hit.
    #[must_use]
    pub const fn is_truncated(&self) -> bool {
        matches!(self, Self::Length)
    }
}

/// One completion call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Model id; empty means the provider default.
    #[serde(default)]
    pub model: String,

    /// Persona and prompt, in order.
    #[serde(default)]
    pub messages: Vec<Message>,

    /// Token budget for the story.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Sampling temperature, `0.0..=2.0`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Opaque end-user id forwarded to the provider.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

impl ChatRequest {
    /// Empty request for `model`.
    #[must_use]
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Default::default()
        }
    }

    /// Adds a system message.
    #[must_use]
    pub fn system(mut self, content: impl Into<String>) -> Self {
        self.messages.push(Message::system(content));
        self
    }

    /// Adds a user message.
    #[must_use]
    pub fn user(mut self, content: impl Into<String>) -> Self {
        self.messages.push(Message::user(content));
        self
    }

    /// Caps the completion length.
    #[must_use]
    pub const fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Sampling temperature.
    #[must_use]
    pub const fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// End-user id.
    #[must_use]
    pub fn user_id(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }
}

/// What a provider returned for a [`ChatRequest`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Assistant message holding the story text.
    pub message: Message,

    /// Why generation ended.
    pub stop_reason: StopReason,

    /// Token accounting, when reported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,

    /// Model that actually answered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Provider completion id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl ChatResponse {
    /// Assistant reply with the given text.
    #[must_use]
    pub fn from_text(content: impl Into<String>) -> Self {
        Self {
            message: Message::assistant(content),
            ..Default::default()
        }
    }

    /// Overrides the stop reason.
    #[must_use]
    pub const fn with_stop_reason(mut self, reason: StopReason) -> Self {
        self.stop_reason = reason;
        self
    }

    /// Attaches token usage.
    #[must_use]
    pub const fn with_usage(mut self, usage: Usage) -> Self {
        self.usage = Some(usage);
        self
    }

    /// Records the answering model.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Story text, if any.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.message.text()
    }

    /// See [`StopReason::is_truncated`].
    #[must_use]
    pub const fn is_truncated(&self) -> bool {
        self.stop_reason.is_truncated()
    }
}

/// A hosted model that can write a story from a [`ChatRequest`].
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Runs the request to completion.
    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse>;

    /// Short name for logs and errors.
    fn provider_name(&self) -> &'static str;

    /// Model used when the request leaves `model` empty.
    fn default_model(&self) -> &str;
}

/// Provider handle shared by storytellers.
pub type SharedChatProvider = Arc<dyn ChatProvider>;
