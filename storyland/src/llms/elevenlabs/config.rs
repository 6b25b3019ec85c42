//! ElevenLabs client configuration.

use crate::error::{LlmError, Result};

/// Configuration for the ElevenLabs client.
#[derive(Debug, Clone)]
pub struct ElevenLabsConfig {
    /// API key sent as `xi-api-key`.
    pub api_key: String,
    /// Base URL for the API.
    pub base_url: String,
    /// Voice used when a request does not name one.
    pub voice_id: Option<String>,
    /// Default speech model.
    pub model_id: String,
    /// Request timeout in seconds.
    pub timeout_secs: Option<u64>,
}

impl ElevenLabsConfig {
    /// Default ElevenLabs API base URL.
    pub const DEFAULT_BASE_URL: &'static str = "https://api.elevenlabs.io/v1";
    /// Default speech model.
    pub const DEFAULT_MODEL_ID: &'static str = "eleven_monolingual_v1";
    /// Default voice stability.
    pub const DEFAULT_STABILITY: f32 = 0.75;
    /// Default similarity boost.
    pub const DEFAULT_SIMILARITY_BOOST: f32 = 0.75;
    /// Default speech rate.
    pub const DEFAULT_SPEECH_RATE: f32 = 1.0;

    /// Creates a new configuration with the given API key.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    /// Creates configuration from environment variables.
    ///
    /// Reads from:
    /// - `ELEVENLABS_API_KEY` - Required API key
    /// - `ELEVENLABS_VOICE_ID` - Optional default voice
    /// - `ELEVENLABS_BASE_URL` - Optional base URL
    ///
    /// # Errors
    ///
    /// Returns an auth error if `ELEVENLABS_API_KEY` is not set.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("ELEVENLABS_API_KEY").map_err(|_| {
            LlmError::auth("elevenlabs", "ELEVENLABS_API_KEY environment variable not set")
        })?;

        let base_url = std::env::var("ELEVENLABS_BASE_URL")
            .unwrap_or_else(|_| Self::DEFAULT_BASE_URL.to_owned());

        Ok(Self {
            api_key,
            base_url,
            voice_id: std::env::var("ELEVENLABS_VOICE_ID").ok(),
            ..Self::default()
        })
    }

    /// Sets the base URL.
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sets the default voice.
    #[must_use]
    pub fn with_voice_id(mut self, voice_id: impl Into<String>) -> Self {
        self.voice_id = Some(voice_id.into());
        self
    }

    /// Sets the default model.
    #[must_use]
    pub fn with_model_id(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = model_id.into();
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }
}

impl Default for ElevenLabsConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: Self::DEFAULT_BASE_URL.to_owned(),
            voice_id: None,
            model_id: Self::DEFAULT_MODEL_ID.to_owned(),
            timeout_secs: Some(120),
        }
    }
}
