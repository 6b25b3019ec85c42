//! ElevenLabs API client implementation.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::audio::{
    AudioFormat, AudioStream, SpeechRequest, SpeechResponse, TextToSpeechProvider, Voice,
};
use crate::error::{Error, LlmError, Result};

use super::config::ElevenLabsConfig;

/// ElevenLabs text-to-speech request body.
#[derive(Debug, Clone, Serialize)]
struct ElevenLabsSpeechRequest {
    text: String,
    model_id: String,
    voice_settings: ElevenLabsVoiceSettings,
}

/// ElevenLabs voice settings.
#[derive(Debug, Clone, Copy, Serialize)]
struct ElevenLabsVoiceSettings {
    stability: f32,
    similarity_boost: f32,
    speech_rate: f32,
}

/// ElevenLabs error body.
#[derive(Debug, Clone, Deserialize)]
struct ElevenLabsErrorResponse {
    detail: Value,
}

/// ElevenLabs API client.
#[derive(Debug, Clone)]
pub struct ElevenLabs {
    config: Arc<ElevenLabsConfig>,
    client: Client,
}

impl ElevenLabs {
    /// Create a new ElevenLabs client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an auth error if the API key is empty, or an internal error if
    /// the HTTP client cannot be built.
    pub fn new(config: ElevenLabsConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(LlmError::auth("elevenlabs", "API key is required").into());
        }

        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(timeout));
        }

        let client = builder
            .build()
            .map_err(|e| LlmError::internal(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            config: Arc::new(config),
            client,
        })
    }

    /// Create a client from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an auth error if `ELEVENLABS_API_KEY` is not set.
    pub fn from_env() -> Result<Self> {
        Self::new(ElevenLabsConfig::from_env()?)
    }

    /// Resolve the voice for a request, falling back to the configured one.
    fn voice_id<'a>(&'a self, request: &'a SpeechRequest) -> Result<&'a str> {
        if !request.voice.id.is_empty() {
            return Ok(&request.voice.id);
        }
        self.config.voice_id.as_deref().ok_or_else(|| {
            LlmError::provider(
                "elevenlabs",
                "no voice id given; pass a voice or set ELEVENLABS_VOICE_ID",
            )
            .into()
        })
    }

    fn speech_url(&self, voice_id: &str, stream: bool) -> String {
        let suffix = if stream { "/stream" } else { "" };
        format!(
            "{}/text-to-speech/{voice_id}{suffix}?optimize_streaming=true",
            self.config.base_url.trim_end_matches('/')
        )
    }

    fn build_body(&self, request: &SpeechRequest) -> ElevenLabsSpeechRequest {
        let model_id = if request.model.is_empty() {
            self.config.model_id.clone()
        } else {
            request.model.clone()
        };

        ElevenLabsSpeechRequest {
            text: request.input.clone(),
            model_id,
            voice_settings: ElevenLabsVoiceSettings {
                stability: request
                    .stability
                    .unwrap_or(ElevenLabsConfig::DEFAULT_STABILITY),
                similarity_boost: request
                    .similarity_boost
                    .unwrap_or(ElevenLabsConfig::DEFAULT_SIMILARITY_BOOST),
                speech_rate: request
                    .speed
                    .unwrap_or(ElevenLabsConfig::DEFAULT_SPEECH_RATE),
            },
        }
    }

    /// Parse an error response from ElevenLabs.
    fn parse_error(status: u16, body: &str) -> LlmError {
        let detail = serde_json::from_str::<ElevenLabsErrorResponse>(body)
            .ok()
            .and_then(|e| match e.detail {
                Value::String(message) => Some((None, message)),
                Value::Object(map) => {
                    let message = map.get("message").and_then(Value::as_str)?.to_owned();
                    let code = map.get("status").and_then(Value::as_str).map(str::to_owned);
                    Some((code, message))
                }
                _ => None,
            });

        match (status, detail) {
            (401, Some((_, message))) => LlmError::auth("elevenlabs", message),
            (429, _) => LlmError::rate_limited("elevenlabs"),
            (_, Some((Some(code), message))) => {
                LlmError::provider_code("elevenlabs", code, message)
            }
            _ => LlmError::http_status(status, body.to_owned()).with_provider("elevenlabs"),
        }
    }

    async fn send(&self, request: &SpeechRequest, stream: bool) -> Result<reqwest::Response> {
        let voice_id = self.voice_id(request)?;
        let url = self.speech_url(voice_id, stream);
        let body = self.build_body(request);
        debug!(
            voice_id,
            model = %body.model_id,
            stability = body.voice_settings.stability,
            similarity_boost = body.voice_settings.similarity_boost,
            "requesting elevenlabs speech"
        );

        let response = self
            .client
            .post(&url)
            .header("xi-api-key", &self.config.api_key)
            .header("Content-Type", "application/json")
            .header("Accept", AudioFormat::Mp3.mime_type())
            .json(&body)
            .send()
            .await
            .map_err(LlmError::from)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(Self::parse_error(status.as_u16(), &error_text).into());
        }

        Ok(response)
    }
}

#[async_trait]
impl TextToSpeechProvider for ElevenLabs {
    async fn speech(&self, request: &SpeechRequest) -> Result<SpeechResponse> {
        let response = self.send(request, false).await?;
        let audio = response.bytes().await.map_err(LlmError::from)?.to_vec();

        Ok(SpeechResponse::new(audio, AudioFormat::Mp3))
    }

    async fn speech_stream(&self, request: &SpeechRequest) -> Result<AudioStream> {
        let response = self.send(request, true).await?;
        let stream = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| Error::from(LlmError::stream(e.to_string()))));

        Ok(Box::pin(stream))
    }

    fn provider_name(&self) -> &'static str {
        "elevenlabs"
    }

    fn available_voices(&self) -> Vec<Voice> {
        self.config
            .voice_id
            .iter()
            .map(|id| Voice::new(id.clone()).description("Configured ElevenLabs voice"))
            .collect()
    }
}
