//! Story generation and narration.
//!
//! [`Storyteller`] turns a [`StoryRequest`] into a [`Story`] by composing the
//! prompt and budget, then calling a [`ChatProvider`]. Narration is a
//! separate step that takes the story by reference, so a failed call never
//! disturbs the story the caller already holds.
//!
//! # Example
//!
//! ```rust,ignore
//! use storyland::prelude::*;
//!
//! let storyteller = Storyteller::new(Arc::new(OpenAI::from_env()?))
//!     .cap(NarrationCap::default());
//!
//! let story = storyteller.generate(&StoryRequest::default()).await?;
//! println!("{}", story.text);
//!
//! let openai = OpenAI::from_env()?;
//! narrate_to(&story, &openai, &NarrationSettings::default(), "story.mp3").await?;
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::audio::{
    AudioFormat, SpeechRequest, SpeechResponse, TextToSpeechProvider, Voice, write_stream,
};
use crate::chat::{ChatRequest, SharedChatProvider};
use crate::error::{Error, LlmError, Result};
use crate::prompts::{NARRATION_INSTRUCTIONS, Persona};
use crate::story::{ComposedPrompt, NarrationCap, StoryRequest, TokenRatio};
use crate::usage::Usage;

/// A generated story.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Story {
    /// The story text.
    pub text: String,
    /// Prompt and budget the story was generated from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub composed: Option<ComposedPrompt>,
    /// Model that wrote the story.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Token usage of the completion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
    /// Whether the completion hit the token budget.
    #[serde(default)]
    pub truncated: bool,
}

impl Story {
    /// Wrap existing text, e.g. a story loaded from disk.
    #[must_use]
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            composed: None,
            model: None,
            usage: None,
            truncated: false,
        }
    }

    /// Number of whitespace-separated words.
    #[must_use]
    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}

/// Generates stories from story requests.
#[derive(Clone)]
pub struct Storyteller {
    provider: SharedChatProvider,
    model: Option<String>,
    temperature: f32,
    persona: Persona,
    ratio: TokenRatio,
    cap: Option<NarrationCap>,
}

impl std::fmt::Debug for Storyteller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storyteller")
            .field("provider", &self.provider.provider_name())
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("persona", &self.persona)
            .field("ratio", &self.ratio)
            .field("cap", &self.cap)
            .finish()
    }
}

impl Storyteller {
    /// Default sampling temperature.
    pub const DEFAULT_TEMPERATURE: f32 = 0.7;

    /// Create a storyteller backed by `provider`.
    #[must_use]
    pub fn new(provider: SharedChatProvider) -> Self {
        Self {
            provider,
            model: None,
            temperature: Self::DEFAULT_TEMPERATURE,
            persona: Persona::default(),
            ratio: TokenRatio::default(),
            cap: None,
        }
    }

    /// Use a specific model instead of the provider default.
    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the sampling temperature.
    #[must_use]
    pub const fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the persona sent as the system message.
    #[must_use]
    pub const fn persona(mut self, persona: Persona) -> Self {
        self.persona = persona;
        self
    }

    /// Set the words-per-token ratio.
    #[must_use]
    pub const fn ratio(mut self, ratio: TokenRatio) -> Self {
        self.ratio = ratio;
        self
    }

    /// Limit the budget to a narration ceiling.
    #[must_use]
    pub const fn cap(mut self, cap: NarrationCap) -> Self {
        self.cap = Some(cap);
        self
    }

    /// Compose the prompt and budget for a request.
    #[must_use]
    pub fn compose(&self, request: &StoryRequest) -> ComposedPrompt {
        request.compose(self.ratio, self.cap)
    }

    fn chat_request(&self, composed: &ComposedPrompt) -> ChatRequest {
        let model = self
            .model
            .clone()
            .unwrap_or_else(|| self.provider.default_model().to_owned());

        ChatRequest::new(model)
            .system(self.persona.text())
            .user(&composed.prompt)
            .max_tokens(composed.budget.max_tokens)
            .temperature(self.temperature)
    }

    /// Generate a story.
    ///
    /// # Errors
    ///
    /// Returns the provider's error, or a response format error when the
    /// completion has no text.
    pub async fn generate(&self, request: &StoryRequest) -> Result<Story> {
        let composed = self.compose(request);
        let budget = composed.budget;
        if budget.capped {
            warn!(
                requested_words = request.target_word_count,
                word_target = budget.word_target,
                max_tokens = budget.max_tokens,
                "narration cap shortened the story"
            );
        }

        let chat = self.chat_request(&composed);
        debug!(
            provider = self.provider.provider_name(),
            model = %chat.model,
            persona = %self.persona,
            max_tokens = budget.max_tokens,
            "generating story"
        );

        let response = self.provider.chat(&chat).await?;

        let Some(text) = response.text().map(str::trim).filter(|t| !t.is_empty()) else {
            let got = response
                .message
                .refusal
                .as_deref()
                .map_or_else(|| "an empty completion".to_owned(), |r| format!("refusal: {r}"));
            return Err(LlmError::response_format("story text", got)
                .with_provider(self.provider.provider_name())
                .into());
        };
        let text = text.to_owned();

        let truncated = response.is_truncated();
        if truncated {
            warn!(max_tokens = budget.max_tokens, "story stopped at the token budget");
        }

        let story = Story {
            text,
            composed: Some(composed),
            model: response.model.or(Some(chat.model)),
            usage: response.usage,
            truncated,
        };
        info!(words = story.word_count(), model = ?story.model, "story generated");

        Ok(story)
    }
}

/// Voice settings for narrating a story.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrationSettings {
    /// Speech model. Empty selects the provider default.
    #[serde(default)]
    pub model: String,
    /// Voice id, or language code for Google. Empty selects the provider default.
    #[serde(default)]
    pub voice: String,
    /// Speaking rate, 1.0 is normal speed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f32>,
    /// Voice stability.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stability: Option<f32>,
    /// Similarity boost.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity_boost: Option<f32>,
    /// Tone instructions for providers that accept them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    /// Output format.
    #[serde(default)]
    pub format: AudioFormat,
}

impl Default for NarrationSettings {
    fn default() -> Self {
        Self {
            model: String::new(),
            voice: String::new(),
            speed: None,
            stability: None,
            similarity_boost: None,
            instructions: Some(NARRATION_INSTRUCTIONS.to_owned()),
            format: AudioFormat::Mp3,
        }
    }
}

impl NarrationSettings {
    /// Settings for a specific voice.
    #[must_use]
    pub fn voice(voice: impl Into<String>) -> Self {
        Self {
            voice: voice.into(),
            ..Self::default()
        }
    }

    /// Build the speech request for `text`.
    #[must_use]
    pub fn speech_request(&self, text: &str) -> SpeechRequest {
        SpeechRequest {
            model: self.model.clone(),
            input: text.to_owned(),
            voice: Voice::new(self.voice.clone()),
            response_format: self.format,
            speed: self.speed,
            stability: self.stability,
            similarity_boost: self.similarity_boost,
            instructions: self.instructions.clone(),
        }
    }
}

fn narration_request(story: &Story, settings: &NarrationSettings) -> Result<SpeechRequest> {
    if story.text.trim().is_empty() {
        return Err(Error::invalid_input("story has no text to narrate"));
    }
    Ok(settings.speech_request(&story.text))
}

/// Narrate a story into an in-memory audio buffer.
///
/// # Errors
///
/// Returns an invalid input error for an empty story, or the provider's error.
pub async fn narrate(
    story: &Story,
    provider: &dyn TextToSpeechProvider,
    settings: &NarrationSettings,
) -> Result<SpeechResponse> {
    let request = narration_request(story, settings)?;
    debug!(provider = provider.provider_name(), voice = %request.voice.id, "narrating story");

    let response = provider.speech(&request).await?;
    info!(
        provider = provider.provider_name(),
        bytes = response.audio.len(),
        "narration ready"
    );
    Ok(response)
}

/// Narrate a story and stream the audio into a file.
///
/// Returns the number of bytes written.
///
/// # Errors
///
/// Returns an invalid input error for an empty story, the provider's error,
/// or an I/O error while writing.
pub async fn narrate_to(
    story: &Story,
    provider: &dyn TextToSpeechProvider,
    settings: &NarrationSettings,
    path: impl AsRef<Path>,
) -> Result<u64> {
    let path = path.as_ref();
    let request = narration_request(story, settings)?;
    debug!(provider = provider.provider_name(), voice = %request.voice.id, "streaming narration");

    let stream = provider.speech_stream(&request).await?;
    let written = write_stream(stream, path).await?;
    info!(
        provider = provider.provider_name(),
        bytes = written,
        path = %path.display(),
        "narration saved"
    );
    Ok(written)
}
