//! Errors raised while composing, generating and narrating stories.
//!
//! [`Error`] is what every public operation returns. Failures reported by a
//! remote completion or speech service are carried as [`LlmError`] so callers
//! can branch on [`LlmErrorKind`] without parsing messages.

use std::fmt;

/// Shorthand used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Any failure from the library.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A completion or speech service failed.
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    /// A story parameter was rejected before any request was made.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A provider reply was not the JSON it should be.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Writing audio or reading a saved story failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Shorthand for [`Error::InvalidInput`].
    #[must_use]
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}

/// A failure reported by (or while talking to) a remote provider.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct LlmError {
    /// Category used for matching.
    pub kind: LlmErrorKind,
    /// `"openai"`, `"elevenlabs"`, `"google"`, or `None` when unknown.
    pub provider: Option<String>,
    /// Human readable detail.
    pub message: String,
    /// Provider error code or HTTP status.
    pub code: Option<String>,
}

/// What went wrong with a provider call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum LlmErrorKind {
    /// Missing or rejected API key.
    Auth,
    /// Quota or request rate exhausted.
    RateLimited,
    /// The body did not contain what we asked for.
    ResponseFormat,
    /// Could not reach the service.
    Network,
    /// An audio stream broke mid-way.
    Stream,
    /// Non-success status without a better category.
    HttpStatus,
    /// Error body parsed from the provider.
    Provider,
    /// Bug or unexpected state on our side.
    Internal,
    /// The provider cannot do what was requested.
    NotSupported,
}

impl LlmError {
    const fn bare(kind: LlmErrorKind, message: String) -> Self {
        Self {
            kind,
            provider: None,
            message,
            code: None,
        }
    }

    /// Credentials are missing or were refused.
    #[must_use]
    pub fn auth(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            provider: Some(provider.into()),
            ..Self::bare(LlmErrorKind::Auth, message.into())
        }
    }

    /// The provider throttled us.
    #[must_use]
    pub fn rate_limited(provider: impl Into<String>) -> Self {
        Self {
            provider: Some(provider.into()),
            ..Self::bare(
                LlmErrorKind::RateLimited,
                "rate limit reached, try again later".into(),
            )
        }
    }

    /// Got `got` where `expected` was needed.
    #[must_use]
    pub fn response_format(expected: impl Into<String>, got: impl Into<String>) -> Self {
        Self::bare(
            LlmErrorKind::ResponseFormat,
            format!("Expected {}, got {}", expected.into(), got.into()),
        )
    }

    /// Connection or timeout failure.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::bare(LlmErrorKind::Network, message.into())
    }

    /// Failure while reading a chunked body.
    #[must_use]
    pub fn stream(message: impl Into<String>) -> Self {
        Self::bare(LlmErrorKind::Stream, message.into())
    }

    /// Unmapped non-2xx status; the status doubles as the code.
    #[must_use]
    pub fn http_status(status: u16, body: impl Into<String>) -> Self {
        Self {
            code: Some(status.to_string()),
            ..Self::bare(
                LlmErrorKind::HttpStatus,
                format!("HTTP {status}: {}", body.into()),
            )
        }
    }

    /// Message from a provider error body.
    #[must_use]
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            provider: Some(provider.into()),
            ..Self::bare(LlmErrorKind::Provider, message.into())
        }
    }

    /// Like [`provider`](Self::provider) with the provider's own code.
    #[must_use]
    pub fn provider_code(
        provider: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            provider: Some(provider.into()),
            code: Some(code.into()),
            ..Self::bare(LlmErrorKind::Provider, message.into())
        }
    }

    /// Unexpected state inside the crate.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::bare(LlmErrorKind::Internal, message.into())
    }

    /// Unsupported option for this provider.
    #[must_use]
    pub fn not_supported(feature: impl Into<String>) -> Self {
        Self::bare(
            LlmErrorKind::NotSupported,
            format!("not supported: {}", feature.into()),
        )
    }

    /// Tags the error with the provider that produced it.
    #[must_use]
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }
}

impl fmt::Display for LlmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(provider) = &self.provider {
            write!(f, "[{provider}] ")?;
        }
        write!(f, "{}", self.message)?;
        if let Some(code) = &self.code {
            write!(f, " (code: {code})")?;
        }
        Ok(())
    }
}

impl std::error::Error for LlmError {}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::network("request timed out")
        } else if err.is_connect() {
            Self::network(format!("connection failed: {err}"))
        } else {
            Self::network(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_provider_and_code() {
        let err = LlmError::provider_code("openai", "invalid_api_key", "Incorrect API key");
        assert_eq!(
            err.to_string(),
            "[openai] Incorrect API key (code: invalid_api_key)"
        );
    }

    #[test]
    fn http_status_keeps_status_as_code() {
        let err = LlmError::http_status(422, "bad voice settings");
        assert_eq!(err.kind, LlmErrorKind::HttpStatus);
        assert_eq!(err.code.as_deref(), Some("422"));
        assert!(err.message.contains("bad voice settings"));
    }

    #[test]
    fn with_provider_tags_error() {
        let err = LlmError::http_status(500, "boom").with_provider("elevenlabs");
        assert!(err.to_string().starts_with("[elevenlabs] HTTP 500"));
    }

    #[test]
    fn llm_error_converts_into_error() {
        let err: Error = LlmError::auth("elevenlabs", "ELEVENLABS_API_KEY not set").into();
        assert!(matches!(err, Error::Llm(ref e) if e.kind == LlmErrorKind::Auth));
        assert!(err.to_string().contains("ELEVENLABS_API_KEY"));
    }
}
