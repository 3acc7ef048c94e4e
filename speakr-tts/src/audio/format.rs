//! Fixed PCM format of the speech API payload
//!
//! The API returns headerless PCM, so nothing in the payload says how to
//! interpret it. These parameters are a contract with the upstream service;
//! the response MIME type (`audio/L16;codec=pcm;rate=24000`) is the only
//! place they can be cross-checked.

use crate::error::{Error, Result};
use std::time::Duration;

/// Bytes per 16-bit sample
pub const BYTES_PER_SAMPLE: usize = 2;

/// Sample layout of a raw PCM stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioFormat {
    /// Samples per second per channel
    pub sample_rate: u32,

    /// Interleaved channel count
    pub channels: u16,

    /// Always 16 (signed little-endian)
    pub bits_per_sample: u16,
}

impl AudioFormat {
    /// 24 kHz mono 16-bit PCM, as produced by the Gemini speech models
    pub const GEMINI_TTS: AudioFormat = AudioFormat {
        sample_rate: 24_000,
        channels: 1,
        bits_per_sample: 16,
    };

    /// Create a 16-bit format with the given rate and channel count
    pub const fn pcm16(sample_rate: u32, channels: u16) -> Self {
        Self {
            sample_rate,
            channels,
            bits_per_sample: 16,
        }
    }

    /// Bytes per frame (one sample for every channel)
    pub fn block_align(&self) -> usize {
        self.channels as usize * BYTES_PER_SAMPLE
    }

    /// Bytes per second of audio
    pub fn byte_rate(&self) -> u64 {
        self.sample_rate as u64 * self.block_align() as u64
    }

    /// Playback duration of a payload of `byte_len` bytes
    pub fn duration_of(&self, byte_len: usize) -> Duration {
        let byte_rate = self.byte_rate();
        if byte_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(byte_len as f64 / byte_rate as f64)
    }

    /// Check that a payload can be 16-bit PCM at all
    ///
    /// Only the even byte count is checked; a trailing partial frame is
    /// tolerated and dropped by the buffer converter.
    pub fn validate_payload(&self, bytes: &[u8]) -> Result<()> {
        if bytes.len() % BYTES_PER_SAMPLE != 0 {
            return Err(Error::Format(format!(
                "{} bytes is not a whole number of 16-bit samples",
                bytes.len()
            )));
        }
        Ok(())
    }

    /// Parse a PCM MIME type such as `audio/L16;codec=pcm;rate=24000`
    ///
    /// Returns None for anything that is not 16-bit linear PCM. A missing
    /// `rate` or `channels` parameter falls back to this format's values.
    pub fn from_mime_type(mime: &str, fallback: AudioFormat) -> Option<AudioFormat> {
        let mut parts = mime.split(';').map(str::trim);
        let essence = parts.next()?.to_ascii_lowercase();
        if essence != "audio/l16" && essence != "audio/pcm" {
            return None;
        }

        let mut format = fallback;
        for param in parts {
            let Some((key, value)) = param.split_once('=') else {
                continue;
            };
            match key.trim().to_ascii_lowercase().as_str() {
                "rate" => format.sample_rate = value.trim().parse().ok()?,
                "channels" => format.channels = value.trim().parse().ok()?,
                "codec" if !value.trim().eq_ignore_ascii_case("pcm") => return None,
                _ => {}
            }
        }
        Some(format)
    }
}

impl Default for AudioFormat {
    fn default() -> Self {
        Self::GEMINI_TTS
    }
}

impl std::fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} Hz, {} ch, {}-bit PCM",
            self.sample_rate, self.channels, self.bits_per_sample
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gemini_format_constants() {
        let format = AudioFormat::GEMINI_TTS;
        assert_eq!(format.sample_rate, 24_000);
        assert_eq!(format.channels, 1);
        assert_eq!(format.bits_per_sample, 16);
        assert_eq!(format.block_align(), 2);
        assert_eq!(format.byte_rate(), 48_000);
    }

    #[test]
    fn test_duration_of_one_second() {
        let format = AudioFormat::GEMINI_TTS;
        assert_eq!(format.duration_of(48_000), Duration::from_secs(1));
    }

    #[test]
    fn test_validate_payload_odd_length() {
        let format = AudioFormat::GEMINI_TTS;
        assert!(format.validate_payload(&[0, 0]).is_ok());
        assert!(matches!(
            format.validate_payload(&[0, 0, 0]),
            Err(Error::Format(_))
        ));
    }

    #[test]
    fn test_from_mime_type() {
        let fallback = AudioFormat::GEMINI_TTS;

        let parsed = AudioFormat::from_mime_type("audio/L16;codec=pcm;rate=24000", fallback);
        assert_eq!(parsed, Some(AudioFormat::GEMINI_TTS));

        let parsed = AudioFormat::from_mime_type("audio/L16; rate=16000", fallback);
        assert_eq!(parsed, Some(AudioFormat::pcm16(16_000, 1)));

        assert_eq!(AudioFormat::from_mime_type("audio/mpeg", fallback), None);
        assert_eq!(
            AudioFormat::from_mime_type("audio/L16;codec=mulaw", fallback),
            None
        );
        assert_eq!(
            AudioFormat::from_mime_type("audio/L16;rate=fast", fallback),
            None
        );
    }
}
