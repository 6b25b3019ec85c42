//! Error types for the storyland CLI.

use crate::config::ConfigError;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// The main error type for the CLI.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Error from story generation or narration.
    #[error(transparent)]
    Storyland(#[from] storyland::Error),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// I/O error outside of the library, e.g. reading a saved story.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Create an error for an unusable argument or config value.
    #[must_use]
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::Config(ConfigError::InvalidValue(msg.into()))
    }
}

impl From<storyland::LlmError> for CliError {
    fn from(err: storyland::LlmError) -> Self {
        Self::Storyland(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn library_errors_display_transparently() {
        let err: CliError = storyland::LlmError::auth("openai", "OPENAI_API_KEY not set").into();
        assert_eq!(
            err.to_string(),
            "LLM error: [openai] OPENAI_API_KEY not set"
        );
    }

    #[test]
    fn invalid_wraps_config_error() {
        let err = CliError::invalid("--words 5");
        assert!(matches!(err, CliError::Config(ConfigError::InvalidValue(_))));
        assert_eq!(err.to_string(), "config error: invalid config value: --words 5");
    }
}
