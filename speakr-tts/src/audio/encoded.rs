//! Base64 audio payloads
//!
//! The speech API returns audio as a base64 string. [`EncodedAudio`] keeps
//! that string immutable and cheap to clone so the latest payload can be
//! replaced as a whole while an earlier one is still playing.

use crate::error::{Error, Result};
use base64::{engine::general_purpose, Engine as _};
use std::sync::Arc;

/// Opaque base64 payload as received from the speech API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedAudio(Arc<str>);

impl EncodedAudio {
    pub fn new(base64: impl Into<Arc<str>>) -> Self {
        Self(base64.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Decode to raw PCM bytes
    pub fn decode(&self) -> Result<Vec<u8>> {
        decode(&self.0)
    }
}

impl From<String> for EncodedAudio {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for EncodedAudio {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Decode a standard (padded) base64 string into bytes
///
/// Surrounding whitespace is ignored; anything else outside the alphabet
/// is an error.
pub fn decode(base64: &str) -> Result<Vec<u8>> {
    general_purpose::STANDARD
        .decode(base64.trim())
        .map_err(|e| Error::Decode(format!("invalid base64 payload: {}", e)))
}

/// Encode bytes as standard base64
pub fn encode(bytes: &[u8]) -> String {
    general_purpose::STANDARD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_known_value() {
        assert_eq!(decode("AAD/fw==").unwrap(), vec![0x00, 0x00, 0xFF, 0x7F]);
    }

    #[test]
    fn test_decode_empty() {
        assert!(decode("").unwrap().is_empty());
    }

    #[test]
    fn test_round_trip_all_byte_values() {
        let bytes: Vec<u8> = (0..=255u8).collect();
        for len in [0, 1, 2, 3, 4, 255, 256] {
            let slice = &bytes[..len];
            assert_eq!(decode(&encode(slice)).unwrap(), slice);
        }
    }

    #[test]
    fn test_decode_trims_trailing_newline() {
        assert_eq!(decode("AAD/fw==\n").unwrap(), vec![0x00, 0x00, 0xFF, 0x7F]);
    }

    #[test]
    fn test_decode_rejects_invalid_characters() {
        assert!(matches!(decode("AA*D"), Err(Error::Decode(_))));
        assert!(matches!(decode("AA D/fw=="), Err(Error::Decode(_))));
    }

    #[test]
    fn test_decode_rejects_bad_length() {
        assert!(matches!(decode("AAD/f"), Err(Error::Decode(_))));
    }

    #[test]
    fn test_encoded_audio_shares_payload() {
        let audio = EncodedAudio::from("AAD/fw==");
        let copy = audio.clone();
        assert_eq!(copy.as_str(), "AAD/fw==");
        assert_eq!(audio.decode().unwrap(), copy.decode().unwrap());
    }
}
