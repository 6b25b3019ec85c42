//! Narration through `/audio/speech`.

use async_trait::async_trait;
use futures::StreamExt;
use tracing::debug;

use crate::audio::{AudioStream, SpeechRequest, SpeechResponse, TextToSpeechProvider, Voice};
use crate::error::{Error, LlmError, Result};

use super::client::OpenAI;
use super::config::OpenAIConfig;
use super::types::OpenAISpeechRequest;

impl OpenAI {
    fn speech_body(&self, request: &SpeechRequest) -> OpenAISpeechRequest {
        let model = if request.model.is_empty() {
            self.config.speech_model.clone()
        } else {
            request.model.clone()
        };

        let voice = if request.voice.id.is_empty() {
            OpenAIConfig::DEFAULT_VOICE.to_owned()
        } else {
            request.voice.id.clone()
        };

        OpenAISpeechRequest {
            model,
            input: request.input.clone(),
            voice,
            response_format: Some(request.response_format.as_str().to_owned()),
            speed: request.speed,
            instructions: request.instructions.clone(),
        }
    }

    async fn send_speech(&self, request: &SpeechRequest) -> Result<reqwest::Response> {
        let body = self.speech_body(request);
        debug!(
            model = %body.model,
            voice = %body.voice,
            chars = body.input.len(),
            "requesting narration"
        );

        self.post_json(&self.speech_url(), &body).await
    }
}

#[async_trait]
impl TextToSpeechProvider for OpenAI {
    async fn speech(&self, request: &SpeechRequest) -> Result<SpeechResponse> {
        let response = self.send_speech(request).await?;
        let audio = response.bytes().await.map_err(LlmError::from)?.to_vec();

        Ok(SpeechResponse::new(audio, request.response_format))
    }

    async fn speech_stream(&self, request: &SpeechRequest) -> Result<AudioStream> {
        let response = self.send_speech(request).await?;
        let stream = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| Error::from(LlmError::stream(e.to_string()))));

        Ok(Box::pin(stream))
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }

    fn available_voices(&self) -> Vec<Voice> {
        vec![
            Voice::new("alloy").description("A neutral, balanced voice"),
            Voice::new("ash").description("A warm, gentle voice"),
            Voice::new("ballad").description("A soft, melodic voice"),
            Voice::new("coral").description("A clear, friendly narrator"),
            Voice::new("echo").description("A crisp, energetic voice"),
            Voice::new("fable").description("An expressive, storytelling voice"),
            Voice::new("onyx").description("A deep, authoritative voice"),
            Voice::new("nova").description("A friendly, conversational voice"),
            Voice::new("sage").description("A calm, wise voice"),
            Voice::new("shimmer").description("A bright, optimistic voice"),
        ]
    }
}
