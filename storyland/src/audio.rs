//! Narration: speech requests, audio containers and the speech provider seam.
//!
//! Narration turns a generated story into audio through one of several
//! hosted speech services. Each service understands a different subset of
//! the voice settings on [`SpeechRequest`]; settings a provider does not
//! support are ignored by that provider.
//!
//! # Example
//!
//! ```rust,ignore
//! use storyland::prelude::*;
//!
//! let request = SpeechRequest::new("gpt-4o-mini-tts", story.text(), "coral")
//!     .format(AudioFormat::Mp3)
//!     .instructions(NARRATION_INSTRUCTIONS);
//! let response = provider.speech(&request).await?;
//! response.save("story.mp3")?;
//! ```

use std::path::Path;
use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tracing::warn;

use crate::error::Result;

/// Container of the narrated audio.
///
/// ElevenLabs and Google only produce MP3; OpenAI can produce all of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    /// `audio/mpeg`
    #[default]
    Mp3,
    /// Ogg Opus
    Opus,
    /// `audio/aac`
    Aac,
    /// Lossless FLAC
    Flac,
    /// RIFF WAV
    Wav,
    /// Headerless 24 kHz samples
    Pcm,
}

impl AudioFormat {
    const ALL: [Self; 6] = [
        Self::Mp3,
        Self::Opus,
        Self::Aac,
        Self::Flac,
        Self::Wav,
        Self::Pcm,
    ];

    /// File extension, also the name providers expect in requests.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::Opus => "opus",
            Self::Aac => "aac",
            Self::Flac => "flac",
            Self::Wav => "wav",
            Self::Pcm => "pcm",
        }
    }

    /// Same as [`as_str`](Self::as_str).
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        self.as_str()
    }

    /// Value for `Content-Type` and `Accept` headers.
    #[must_use]
    pub const fn mime_type(&self) -> &'static str {
        match self {
            Self::Mp3 => "audio/mpeg",
            Self::Opus => "audio/ogg",
            Self::Aac => "audio/aac",
            Self::Flac => "audio/flac",
            Self::Wav => "audio/wav",
            Self::Pcm => "audio/L16",
        }
    }

    /// Case-insensitive lookup by extension.
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|format| format.as_str().eq_ignore_ascii_case(ext))
    }

    /// Format implied by an output path; unknown or missing extensions give MP3.
    #[must_use]
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
            .unwrap_or_default()
    }
}

/// Voice selection for text-to-speech.
///
/// The identifier means different things per provider: an OpenAI voice name,
/// an ElevenLabs voice id, or a language code for Google.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voice {
    /// Provider-specific id; empty means the provider default.
    pub id: String,
    /// Shown by `voices`; never sent.
    #[serde(skip)]
    pub description: Option<String>,
}

impl Voice {
    /// Voice by id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: None,
        }
    }

    /// Adds a display description.
    #[must_use]
    pub fn description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }
}

impl<S: Into<String>> From<S> for Voice {
    fn from(s: S) -> Self {
        Self::new(s)
    }
}

/// Text to narrate plus how it should sound.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechRequest {
    /// `gpt-4o-mini-tts`, `eleven_monolingual_v1`, ...; empty means the
    /// provider default.
    pub model: String,
    /// Story text.
    pub input: String,
    /// Narrator.
    pub voice: Voice,
    /// Container to produce.
    pub response_format: AudioFormat,
    /// Speaking rate, 1.0 is normal speed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<f32>,
    /// Voice stability (0.0 to 1.0). Lower values sound more expressive.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stability: Option<f32>,
    /// How closely output matches the target voice (0.0 to 1.0).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity_boost: Option<f32>,
    /// Free-form tone instructions, for models that accept them.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

impl SpeechRequest {
    /// MP3 narration of `input` with no voice settings.
    #[must_use]
    pub fn new(
        model: impl Into<String>,
        input: impl Into<String>,
        voice: impl Into<Voice>,
    ) -> Self {
        Self {
            model: model.into(),
            input: input.into(),
            voice: voice.into(),
            response_format: AudioFormat::Mp3,
            speed: None,
            stability: None,
            similarity_boost: None,
            instructions: None,
        }
    }

    /// Output container.
    #[must_use]
    pub const fn format(mut self, format: AudioFormat) -> Self {
        self.response_format = format;
        self
    }

    /// Speaking rate.
    #[must_use]
    pub const fn speed(mut self, speed: f32) -> Self {
        self.speed = Some(speed);
        self
    }

    /// ElevenLabs stability.
    #[must_use]
    pub const fn stability(mut self, stability: f32) -> Self {
        self.stability = Some(stability);
        self
    }

    /// ElevenLabs similarity boost.
    #[must_use]
    pub const fn similarity_boost(mut self, similarity: f32) -> Self {
        self.similarity_boost = Some(similarity);
        self
    }

    /// Tone guidance for instruction-following models.
    #[must_use]
    pub fn instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }
}

/// Narration returned in one piece.
#[derive(Debug, Clone)]
pub struct SpeechResponse {
    /// Encoded audio.
    pub audio: Vec<u8>,
    /// Container of `audio`.
    pub format: AudioFormat,
}

impl SpeechResponse {
    /// Wraps encoded audio.
    #[must_use]
    pub const fn new(audio: Vec<u8>, format: AudioFormat) -> Self {
        Self { audio, format }
    }

    /// Writes the audio to `path`.
    ///
    /// # Errors
    ///
    /// Any I/O error from writing.
    pub fn save(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        std::fs::write(path, &self.audio)
    }

    /// Extension matching [`format`](Self::format).
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        self.format.extension()
    }

    /// No bytes came back.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.audio.is_empty()
    }
}

/// Audio bytes in arrival order.
pub type AudioStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

/// Copies `stream` into a new file at `path` and returns the byte count.
///
/// A failed copy removes the partial file.
///
/// # Errors
///
/// The first chunk error, or an I/O error from the file.
pub async fn write_stream(stream: AudioStream, path: impl AsRef<Path>) -> Result<u64> {
    let path = path.as_ref();
    let file = tokio::fs::File::create(path).await?;

    match copy_into(stream, file).await {
        Ok(written) => Ok(written),
        Err(e) => {
            if let Err(cleanup) = tokio::fs::remove_file(path).await {
                warn!(path = %path.display(), error = %cleanup, "could not remove partial audio");
            }
            Err(e)
        }
    }
}

async fn copy_into(mut stream: AudioStream, mut file: tokio::fs::File) -> Result<u64> {
    let mut written = 0_u64;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;
    Ok(written)
}

/// A hosted voice that can read a story aloud.
#[async_trait]
pub trait TextToSpeechProvider: Send + Sync {
    /// Narrates the whole request and returns the audio at once.
    async fn speech(&self, request: &SpeechRequest) -> Result<SpeechResponse>;

    /// Narrates the request as a byte stream.
    ///
    /// The default buffers through [`speech`](Self::speech) and yields one chunk.
    async fn speech_stream(&self, request: &SpeechRequest) -> Result<AudioStream> {
        let response = self.speech(request).await?;
        let chunk: Result<Bytes> = Ok(Bytes::from(response.audio));
        Ok(Box::pin(futures::stream::once(async move { chunk })))
    }

    /// Short name for logs and errors.
    fn provider_name(&self) -> &'static str;

    /// Voices to offer in `voices`.
    fn available_voices(&self) -> Vec<Voice> {
        Vec::new()
    }
}
