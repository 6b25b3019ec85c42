//! Story generation through `/chat/completions`.

use async_trait::async_trait;
use tracing::debug;

use crate::chat::{ChatProvider, ChatRequest, ChatResponse, StopReason};
use crate::error::{LlmError, Result};
use crate::message::{Message, Role};

use super::client::OpenAI;
use super::types::OpenAIChatResponse;

impl OpenAI {
    /// Decodes a raw completion body. Malformed JSON surfaces as
    /// [`Error::Json`](crate::Error::Json).
    pub(crate) fn decode_response(raw: &str) -> Result<ChatResponse> {
        let parsed = serde_json::from_str::<OpenAIChatResponse>(raw).inspect_err(|e| {
            debug!(error = %e, body = raw, "undecodable chat completion");
        })?;
        Self::parse_response(parsed)
    }

    /// Takes the first choice; a reply with no choices is a format error.
    pub(crate) fn parse_response(response: OpenAIChatResponse) -> Result<ChatResponse> {
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::response_format("at least one choice", "empty choices"))?;

        let stop_reason = choice
            .finish_reason
            .as_deref()
            .map_or(StopReason::Stop, StopReason::parse);

        let message = Message {
            role: Role::Assistant,
            content: choice.message.content,
            refusal: choice.message.refusal,
        };

        Ok(ChatResponse {
            message,
            stop_reason,
            usage: response.usage,
            model: Some(response.model),
            id: Some(response.id),
        })
    }
}

#[async_trait]
impl ChatProvider for OpenAI {
    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let body = self.build_body(request);
        debug!(model = %body.model, max_tokens = ?body.max_tokens, "requesting story completion");

        let raw = self
            .post_json(&self.chat_url(), &body)
            .await?
            .text()
            .await
            .map_err(LlmError::from)?;

        Self::decode_response(&raw)
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }

    fn default_model(&self) -> &str {
        self.model()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Result<ChatResponse> {
        OpenAI::parse_response(serde_json::from_str(json).unwrap())
    }

    #[test]
    fn parses_story_completion() {
        let json = r#"{
            "id": "chatcmpl-123",
            "object": "chat.completion",
            "created": 1700000000,
            "model": "gpt-4o-2024-08-06",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "Once upon a time, a monkey..."},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 700, "completion_tokens": 380, "total_tokens": 1080}
        }"#;

        let response = parse(json).unwrap();

        assert_eq!(response.text(), Some("Once upon a time, a monkey..."));
        assert_eq!(response.stop_reason, StopReason::Stop);
        assert_eq!(response.usage.unwrap().output_tokens, 380);
        assert_eq!(response.model.as_deref(), Some("gpt-4o-2024-08-06"));
    }

    #[test]
    fn flags_length_stop() {
        let json = r#"{
            "id": "x", "model": "gpt-4",
            "choices": [{"message": {"content": "The robot"}, "finish_reason": "length"}]
        }"#;
        assert!(parse(json).unwrap().is_truncated());
    }

    #[test]
    fn keeps_refusal() {
        let json = r#"{
            "id": "x", "model": "gpt-4o",
            "choices": [{"message": {"content": null, "refusal": "I can't help"}, "finish_reason": "stop"}]
        }"#;
        let response = parse(json).unwrap();
        assert!(response.text().is_none());
        assert_eq!(response.message.refusal.as_deref(), Some("I can't help"));
    }

    #[test]
    fn malformed_body_is_json_error() {
        let err = OpenAI::decode_response("<html>Bad Gateway</html>").unwrap_err();
        assert!(matches!(err, crate::Error::Json(_)));

        let ok = OpenAI::decode_response(
            r#"{"id": "x", "model": "gpt-4o", "choices": [{"message": {"content": "Hi"}, "finish_reason": "stop"}]}"#,
        )
        .unwrap();
        assert_eq!(ok.text(), Some("Hi"));
    }

    #[test]
    fn rejects_empty_choices() {
        let json = r#"{"id": "x", "model": "gpt-4o", "choices": []}"#;
        assert!(parse(json).is_err());
    }
}
