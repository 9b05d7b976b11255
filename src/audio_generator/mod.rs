//! Text-to-audio generation backends.

mod stability;

pub use stability::{StableAudioClient, DEFAULT_STABLE_AUDIO_MODEL, DEFAULT_STABLE_AUDIO_URL};

use async_trait::async_trait;
use thiserror::Error;

/// Container format requested from the generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    Mp3,
    Wav,
}

impl AudioFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "mp3",
            AudioFormat::Wav => "wav",
        }
    }

    pub fn extension(&self) -> &'static str {
        self.as_str()
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "audio/mpeg",
            AudioFormat::Wav => "audio/wav",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationOptions {
    pub duration_secs: u32,
    pub output_format: AudioFormat,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            duration_secs: 30,
            output_format: AudioFormat::Mp3,
        }
    }
}

/// Errors that can occur when asking a backend for audio.
#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Rate limited")]
    RateLimited,

    #[error("Request timeout")]
    Timeout,

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// A service that turns a prompt into encoded audio.
#[async_trait]
pub trait AudioGenerator: Send + Sync {
    fn name(&self) -> &str;

    async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<Vec<u8>, GeneratorError>;
}
