//! Google Translate speech client.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::{StreamExt, TryStreamExt};
use reqwest::Client;
use tracing::debug;
use url::Url;

use crate::audio::{
    AudioFormat, AudioStream, SpeechRequest, SpeechResponse, TextToSpeechProvider, Voice,
};
use crate::error::{Error, LlmError, Result};

use super::config::GoogleTtsConfig;

const NORMAL_SPEED: &str = "1";
const SLOW_SPEED: &str = "0.24";

/// Google Translate speech client.
#[derive(Debug, Clone)]
pub struct GoogleTts {
    config: Arc<GoogleTtsConfig>,
    client: Client,
}

impl GoogleTts {
    /// Create a new client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an internal error if the HTTP client cannot be built.
    pub fn new(config: GoogleTtsConfig) -> Result<Self> {
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

    fn lang<'a>(&'a self, request: &'a SpeechRequest) -> &'a str {
        if request.voice.id.is_empty() {
            &self.config.lang
        } else {
            &request.voice.id
        }
    }

    /// Build one request URL per text chunk.
    fn chunk_urls(&self, request: &SpeechRequest) -> Result<Vec<Url>> {
        if request.response_format != AudioFormat::Mp3 {
            return Err(LlmError::not_supported(format!(
                "google speech in {} format",
                request.response_format.as_str()
            ))
            .with_provider("google")
            .into());
        }

        let chunks = split_text(&request.input, self.config.max_chunk_chars);
        if chunks.is_empty() {
            return Err(Error::invalid_input("nothing to narrate"));
        }

        let endpoint = format!("{}/translate_tts", self.config.base_url.trim_end_matches('/'));
        let lang = self.lang(request);
        let speed = if request.speed.is_some_and(|s| s < 1.0) {
            SLOW_SPEED
        } else {
            NORMAL_SPEED
        };

        chunks
            .iter()
            .map(|chunk| {
                Url::parse_with_params(
                    &endpoint,
                    &[
                        ("ie", "UTF-8"),
                        ("q", chunk.as_str()),
                        ("tl", lang),
                        ("client", "tw-ob"),
                        ("ttsspeed", speed),
                    ],
                )
                .map_err(|e| LlmError::internal(format!("invalid speech URL: {e}")).into())
            })
            .collect()
    }
}

async fn fetch_chunk(client: Client, url: Url) -> Result<Bytes> {
    let response = client.get(url).send().await.map_err(LlmError::from)?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(LlmError::http_status(status.as_u16(), body)
            .with_provider("google")
            .into());
    }

    Ok(response.bytes().await.map_err(LlmError::from)?)
}

#[async_trait]
impl TextToSpeechProvider for GoogleTts {
    async fn speech(&self, request: &SpeechRequest) -> Result<SpeechResponse> {
        let audio: Vec<u8> = self
            .speech_stream(request)
            .await?
            .try_fold(Vec::new(), |mut audio, chunk| async move {
                audio.extend_from_slice(&chunk);
                Ok(audio)
            })
            .await?;

        Ok(SpeechResponse::new(audio, AudioFormat::Mp3))
    }

    async fn speech_stream(&self, request: &SpeechRequest) -> Result<AudioStream> {
        let urls = self.chunk_urls(request)?;
        debug!(lang = self.lang(request), chunks = urls.len(), "requesting google speech");

        let client = self.client.clone();
        let stream = futures::stream::iter(urls).then(move |url| fetch_chunk(client.clone(), url));

        Ok(Box::pin(stream))
    }

    fn provider_name(&self) -> &'static str {
        "google"
    }

    fn available_voices(&self) -> Vec<Voice> {
        vec![
            Voice::new("en").description("English"),
            Voice::new("es").description("Spanish"),
            Voice::new("fr").description("French"),
            Voice::new("de").description("German"),
            Voice::new("it").description("Italian"),
            Voice::new("pt").description("Portuguese"),
            Voice::new("hi").description("Hindi"),
            Voice::new("ja").description("Japanese"),
        ]
    }
}

/// Split text into chunks of at most `max_chars` characters.
///
/// Sentences are kept whole where they fit and packed together; longer
/// sentences break on whitespace, and a single word longer than the limit is
/// cut at character boundaries.
pub(crate) fn split_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();

    let sentences = text
        .split_inclusive(['.', '!', '?', '\n'])
        .map(str::trim)
        .filter(|s| !s.is_empty());

    for sentence in sentences {
        if sentence.chars().count() <= max_chars {
            push_piece(&mut chunks, &mut current, sentence, max_chars);
            continue;
        }
        for word in sentence.split_whitespace() {
            if word.chars().count() <= max_chars {
                push_piece(&mut chunks, &mut current, word, max_chars);
                continue;
            }
            let chars: Vec<char> = word.chars().collect();
            for piece in chars.chunks(max_chars) {
                let piece: String = piece.iter().collect();
                push_piece(&mut chunks, &mut current, &piece, max_chars);
            }
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

fn push_piece(chunks: &mut Vec<String>, current: &mut String, piece: &str, max_chars: usize) {
    let joined = current.chars().count() + 1 + piece.chars().count();
    if !current.is_empty() && joined > max_chars {
        chunks.push(std::mem::take(current));
    }
    if !current.is_empty() {
        current.push(' ');
    }
    current.push_str(piece);
}
