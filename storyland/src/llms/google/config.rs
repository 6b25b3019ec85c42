//! Google speech configuration.

/// Configuration for the Google Translate speech client.
#[derive(Debug, Clone)]
pub struct GoogleTtsConfig {
    /// Base URL of the translate service.
    pub base_url: String,
    /// Language used when a request does not name one.
    pub lang: String,
    /// Maximum characters sent per request.
    pub max_chunk_chars: usize,
    /// Request timeout in seconds.
    pub timeout_secs: Option<u64>,
}

impl GoogleTtsConfig {
    /// Default translate service URL.
    pub const DEFAULT_BASE_URL: &'static str = "https://translate.google.com";
    /// Default language.
    pub const DEFAULT_LANG: &'static str = "en";
    /// Longest input the endpoint accepts in one request.
    pub const MAX_CHUNK_CHARS: usize = 100;

    /// Creates a configuration for the given language.
    #[must_use]
    pub fn new(lang: impl Into<String>) -> Self {
        Self {
            lang: lang.into(),
            ..Self::default()
        }
    }

    /// Sets the base URL.
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }
}

impl Default for GoogleTtsConfig {
    fn default() -> Self {
        Self {
            base_url: Self::DEFAULT_BASE_URL.to_owned(),
            lang: Self::DEFAULT_LANG.to_owned(),
            max_chunk_chars: Self::MAX_CHUNK_CHARS,
            timeout_secs: Some(60),
        }
    }
}
