//! Settings for the OpenAI chat and speech endpoints.

use crate::error::{LlmError, Result};

/// Connection and model defaults for [`OpenAI`](super::OpenAI).
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    /// Secret key sent as a bearer token.
    pub api_key: String,
    /// API root, e.g. a proxy or compatible server.
    pub base_url: String,
    /// Model used when a chat request leaves `model` empty.
    pub model: String,
    /// Model used when a speech request leaves `model` empty.
    pub speech_model: String,
    /// Sent as `OpenAI-Organization` when set.
    pub organization: Option<String>,
    /// Whole-request timeout; `None` leaves reqwest's default.
    pub timeout_secs: Option<u64>,
}

impl OpenAIConfig {
    /// Public API root.
    pub const DEFAULT_BASE_URL: &'static str = "https://api.openai.com/v1";
    /// Storytelling model.
    pub const DEFAULT_MODEL: &'static str = "gpt-4o";
    /// Narration model; accepts `instructions`.
    pub const DEFAULT_SPEECH_MODEL: &'static str = "gpt-4o-mini-tts";
    /// Narrator voice used when none is chosen.
    pub const DEFAULT_VOICE: &'static str = "coral";
    const DEFAULT_TIMEOUT_SECS: u64 = 120;

    /// Defaults plus the given key.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    /// Reads `OPENAI_API_KEY` (required), `OPENAI_BASE_URL`, `OPENAI_MODEL`
    /// and `OPENAI_ORGANIZATION`.
    ///
    /// # Errors
    ///
    /// Auth error when the key is missing or blank.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    ///
    /// # Errors
    ///
    /// Auth error when `OPENAI_API_KEY` is missing or blank.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let present = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let api_key = present("OPENAI_API_KEY")
            .ok_or_else(|| LlmError::auth("openai", "OPENAI_API_KEY is not set"))?;

        let mut config = Self::new(api_key);
        if let Some(url) = present("OPENAI_BASE_URL") {
            config.base_url = url;
        }
        if let Some(model) = present("OPENAI_MODEL") {
            config.model = model;
        }
        config.organization = present("OPENAI_ORGANIZATION");
        Ok(config)
    }

    /// Points the client at another API root.
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Replaces the storytelling model.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Replaces the narration model.
    #[must_use]
    pub fn with_speech_model(mut self, model: impl Into<String>) -> Self {
        self.speech_model = model.into();
        self
    }

    /// Bills requests to an organization.
    #[must_use]
    pub fn with_organization(mut self, org: impl Into<String>) -> Self {
        self.organization = Some(org.into());
        self
    }

    /// Request timeout in seconds.
    #[must_use]
    pub const fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: Self::DEFAULT_BASE_URL.to_owned(),
            model: Self::DEFAULT_MODEL.to_owned(),
            speech_model: Self::DEFAULT_SPEECH_MODEL.to_owned(),
            organization: None,
            timeout_secs: Some(Self::DEFAULT_TIMEOUT_SECS),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::error::{Error, LlmErrorKind};

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn new_keeps_story_defaults() {
        let config = OpenAIConfig::new("test-key");
        assert_eq!(config.api_key, "test-key");
        assert_eq!(config.base_url, OpenAIConfig::DEFAULT_BASE_URL);
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.speech_model, "gpt-4o-mini-tts");
        assert_eq!(config.timeout_secs, Some(120));
    }

    #[test]
    fn builders_override() {
        let config = OpenAIConfig::new("key")
            .with_model("gpt-4")
            .with_speech_model("tts-1")
            .with_organization("org-1")
            .with_timeout(60);

        assert_eq!(config.model, "gpt-4");
        assert_eq!(config.speech_model, "tts-1");
        assert_eq!(config.organization.as_deref(), Some("org-1"));
        assert_eq!(config.timeout_secs, Some(60));
    }

    #[test]
    fn lookup_reads_overrides() {
        let env = vars(&[
            ("OPENAI_API_KEY", "sk-env"),
            ("OPENAI_MODEL", "gpt-4o-mini"),
            ("OPENAI_BASE_URL", ""),
        ]);
        let config = OpenAIConfig::from_lookup(|k| env.get(k).cloned()).unwrap();

        assert_eq!(config.api_key, "sk-env");
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.base_url, OpenAIConfig::DEFAULT_BASE_URL);
        assert!(config.organization.is_none());
    }

    #[test]
    fn blank_key_is_auth_error() {
        let env = vars(&[("OPENAI_API_KEY", "  ")]);
        let err = OpenAIConfig::from_lookup(|k| env.get(k).cloned()).unwrap_err();
        assert!(matches!(err, Error::Llm(ref e) if e.kind == LlmErrorKind::Auth));
    }
}
