//! Speech generation
//!
//! [`SpeechGenerator`] is the seam between the session and the remote API;
//! [`GeminiClient`] is the HTTP implementation.

pub mod client;
pub mod voices;

use crate::audio::{AudioFormat, EncodedAudio};
use crate::error::Result;
use async_trait::async_trait;

pub use client::GeminiClient;
pub use voices::{find_voice, Voice, VoiceStyle, VOICES};

/// Audio returned by a generator
#[derive(Debug, Clone)]
pub struct GeneratedSpeech {
    pub audio: EncodedAudio,
    /// MIME type reported by the API, if any
    pub mime_type: Option<String>,
}

impl GeneratedSpeech {
    pub fn new(audio: EncodedAudio, mime_type: Option<String>) -> Self {
        Self { audio, mime_type }
    }

    /// Describe how the reported MIME type contradicts `expected`
    ///
    /// None when it agrees or when no MIME type was reported.
    pub fn format_mismatch(&self, expected: AudioFormat) -> Option<String> {
        let mime = self.mime_type.as_deref()?;
        match AudioFormat::from_mime_type(mime, expected) {
            None => Some(format!("unexpected audio encoding '{}'", mime)),
            Some(actual) if actual != expected => {
                Some(format!("payload is {} but {} is assumed", actual, expected))
            }
            Some(_) => None,
        }
    }
}

/// Turns a prompt and voice into base64 PCM audio
#[async_trait]
pub trait SpeechGenerator: Send + Sync {
    /// Generate speech for `prompt` using the prebuilt voice `voice_name`
    ///
    /// Fails with `Error::Generation` (or `Error::Config`), never retries.
    async fn generate(&self, prompt: &str, voice_name: &str) -> Result<GeneratedSpeech>;
}
