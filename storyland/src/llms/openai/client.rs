//! HTTP plumbing shared by the OpenAI chat and speech impls.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Response};
use serde::Serialize;

use crate::chat::ChatRequest;
use crate::error::{LlmError, Result};

use super::config::OpenAIConfig;
use super::types::{OpenAIChatRequest, OpenAIErrorResponse};

const PROVIDER: &str = "openai";

/// Client for the OpenAI REST API, usable as a story writer and a narrator.
///
/// Cloning is cheap; the config is shared and `reqwest` pools connections.
#[derive(Debug, Clone)]
pub struct OpenAI {
    pub(crate) config: Arc<OpenAIConfig>,
    pub(crate) client: Client,
}

impl OpenAI {
    /// Builds a client from `config`.
    ///
    /// # Errors
    ///
    /// Auth error for an empty key; internal error if TLS setup fails.
    pub fn new(config: OpenAIConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(LlmError::auth(PROVIDER, "an API key is required").into());
        }

        let mut builder = Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| LlmError::internal(format!("building HTTP client: {e}")))?;

        Ok(Self {
            config: Arc::new(config),
            client,
        })
    }

    /// [`OpenAIConfig::from_env`] followed by [`new`](Self::new).
    ///
    /// # Errors
    ///
    /// Auth error when `OPENAI_API_KEY` is unset.
    pub fn from_env() -> Result<Self> {
        Self::new(OpenAIConfig::from_env()?)
    }

    /// API root in use.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Storytelling model used for requests without one.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Narration model used for requests without one.
    #[must_use]
    pub fn speech_model(&self) -> &str {
        &self.config.speech_model
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.config.base_url.trim_end_matches('/'))
    }

    pub(crate) fn chat_url(&self) -> String {
        self.endpoint("chat/completions")
    }

    pub(crate) fn speech_url(&self) -> String {
        self.endpoint("audio/speech")
    }

    /// POSTs `body` as JSON and turns a non-2xx reply into an [`LlmError`].
    pub(crate) async fn post_json<B: Serialize + Sync>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<Response> {
        let mut request = self.client.post(url).bearer_auth(&self.config.api_key);
        if let Some(org) = &self.config.organization {
            request = request.header("OpenAI-Organization", org);
        }

        let response = request.json(body).send().await.map_err(LlmError::from)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        Err(Self::parse_error(status.as_u16(), &text).into())
    }

    pub(crate) fn build_body(&self, request: &ChatRequest) -> OpenAIChatRequest {
        let model = Some(request.model.as_str())
            .filter(|m| !m.is_empty())
            .unwrap_or(self.config.model.as_str());

        OpenAIChatRequest {
            model: model.to_owned(),
            messages: request.messages.iter().map(Into::into).collect(),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            user: request.user.clone(),
        }
    }

    /// Maps an error reply. Bodies that are not OpenAI's `{"error": ...}`
    /// shape become a plain HTTP status error.
    pub(crate) fn parse_error(status: u16, body: &str) -> LlmError {
        let parsed = serde_json::from_str::<OpenAIErrorResponse>(body);
        let Ok(OpenAIErrorResponse { error }) = parsed else {
            return LlmError::http_status(status, body).with_provider(PROVIDER);
        };

        match status {
            401 => LlmError::auth(PROVIDER, error.message),
            429 => LlmError::rate_limited(PROVIDER),
            _ => {
                let code = error.code.unwrap_or(error.error_type);
                LlmError::provider_code(PROVIDER, code, error.message)
            }
        }
    }
}
