//! Mock providers for testing.
//!
//! These return predefined responses and record every request they receive,
//! so orchestration code can be tested without making real API calls.
//!
//! # Example
//!
//! ```rust,ignore
//! use storyland::mock::MockChatProvider;
//!
//! let provider = Arc::new(MockChatProvider::new(vec!["Once upon a time...".into()]));
//! let storyteller = Storyteller::new(Arc::clone(&provider));
//! let story = storyteller.generate(&StoryRequest::default()).await?;
//! assert_eq!(provider.requests()[0].max_tokens, Some(400));
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use crate::audio::{SpeechRequest, SpeechResponse, TextToSpeechProvider, Voice};
use crate::chat::{ChatProvider, ChatRequest, ChatResponse};
use crate::error::{LlmError, Result};

/// A chat provider that replays canned responses in sequence.
#[derive(Debug)]
pub struct MockChatProvider {
    model_id: String,
    responses: Vec<ChatResponse>,
    failure: Option<LlmError>,
    index: AtomicUsize,
    requests: Mutex<Vec<ChatRequest>>,
}

impl MockChatProvider {
    /// Create a mock that cycles through the given texts.
    #[must_use]
    pub fn new(responses: Vec<String>) -> Self {
        Self::with_responses(responses.into_iter().map(ChatResponse::from_text).collect())
    }

    /// Create a mock that cycles through full responses.
    #[must_use]
    pub fn with_responses(responses: Vec<ChatResponse>) -> Self {
        Self {
            model_id: "mock-model".to_owned(),
            responses,
            failure: None,
            index: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Create a mock whose every call fails with `error`.
    #[must_use]
    pub fn failing(error: LlmError) -> Self {
        Self {
            failure: Some(error),
            ..Self::with_responses(Vec::new())
        }
    }

    /// Set the model id reported as the default.
    #[must_use]
    pub fn with_model_id(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = model_id.into();
        self
    }

    /// Requests received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl ChatProvider for MockChatProvider {
    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());

        if let Some(error) = &self.failure {
            return Err(error.clone().into());
        }

        let index = self.index.fetch_add(1, Ordering::SeqCst);
        let response = self
            .responses
            .get(index % self.responses.len().max(1))
            .cloned()
            .unwrap_or_default();

        Ok(response)
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }

    fn default_model(&self) -> &str {
        &self.model_id
    }
}

/// A speech provider that returns fixed audio and records requests.
#[derive(Debug)]
pub struct MockSpeechProvider {
    audio: Vec<u8>,
    requests: Mutex<Vec<SpeechRequest>>,
}

impl MockSpeechProvider {
    /// Create a mock that answers every request with `audio`.
    #[must_use]
    pub fn new(audio: impl Into<Vec<u8>>) -> Self {
        Self {
            audio: audio.into(),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Requests received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<SpeechRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl TextToSpeechProvider for MockSpeechProvider {
    async fn speech(&self, request: &SpeechRequest) -> Result<SpeechResponse> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());
        Ok(SpeechResponse::new(self.audio.clone(), request.response_format))
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }

    fn available_voices(&self) -> Vec<Voice> {
        vec![Voice::new("mock-voice")]
    }
}
