//! Error types for speakr-tts
//!
//! One variant per failure kind of the speech pipeline. Every failure is
//! terminal for the operation that raised it; nothing retries.

use thiserror::Error;

/// Main error type for speakr-tts
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or invalid configuration (API key, channel count, sample rate)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Remote speech generation failed, was blocked, or returned no audio
    #[error("Speech generation failed: {0}")]
    Generation(String),

    /// Payload is not valid base64
    #[error("Audio decode error: {0}")]
    Decode(String),

    /// Malformed PCM stream
    #[error("PCM format error: {0}")]
    Format(String),

    /// Audio output device unavailable or playback interrupted
    #[error("Playback error: {0}")]
    Playback(String),

    /// WAV artifact could not be built or written
    #[error("Download error: {0}")]
    Download(String),
}

impl From<speakr_common::Error> for Error {
    fn from(err: speakr_common::Error) -> Self {
        match err {
            speakr_common::Error::Config(msg) => Error::Config(msg),
        }
    }
}

/// Convenience Result type using speakr-tts Error
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_message_prefix() {
        let err = Error::Generation("quota exceeded".to_string());
        assert_eq!(err.to_string(), "Speech generation failed: quota exceeded");
    }

    #[test]
    fn test_common_config_error_maps_to_config() {
        let err: Error = speakr_common::Error::Config("no key".to_string()).into();
        assert!(matches!(err, Error::Config(msg) if msg == "no key"));
    }
}
