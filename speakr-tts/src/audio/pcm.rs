//! 16-bit PCM to playable buffer conversion
//!
//! Interprets raw bytes as interleaved signed little-endian samples,
//! splits them per channel and scales each by 1/32768.

use crate::audio::format::BYTES_PER_SAMPLE;
use crate::audio::types::AudioBuffer;
use crate::error::{Error, Result};
use tracing::debug;

/// Scale factor mapping i16 onto [-1.0, 1.0)
const I16_SCALE: f32 = 32768.0;

/// Normalize one 16-bit sample
#[inline]
pub fn normalize(sample: i16) -> f32 {
    sample as f32 / I16_SCALE
}

/// Convert raw interleaved 16-bit PCM into an [`AudioBuffer`]
///
/// Sample `c` of frame `i` is read from byte offset `2 * (i * channels + c)`.
/// A trailing partial frame is dropped.
///
/// # Errors
/// - `Error::Config` if `channels` or `sample_rate` is zero
/// - `Error::Format` if the byte count is odd
pub fn to_audio_buffer(bytes: &[u8], sample_rate: u32, channels: u16) -> Result<AudioBuffer> {
    if channels == 0 {
        return Err(Error::Config("channel count must be at least 1".to_string()));
    }
    if sample_rate == 0 {
        return Err(Error::Config("sample rate must be positive".to_string()));
    }
    if bytes.len() % BYTES_PER_SAMPLE != 0 {
        return Err(Error::Format(format!(
            "malformed PCM stream: odd byte length {}",
            bytes.len()
        )));
    }

    let channel_count = channels as usize;
    let frame_bytes = channel_count * BYTES_PER_SAMPLE;
    let frame_count = bytes.len() / frame_bytes;

    let mut planes: Vec<Vec<f32>> = (0..channel_count)
        .map(|_| Vec::with_capacity(frame_count))
        .collect();

    // chunks_exact skips the trailing partial frame
    for frame in bytes.chunks_exact(frame_bytes) {
        for (plane, sample) in planes.iter_mut().zip(frame.chunks_exact(BYTES_PER_SAMPLE)) {
            plane.push(normalize(i16::from_le_bytes([sample[0], sample[1]])));
        }
    }

    let dropped = bytes.len() - frame_count * frame_bytes;
    debug!(
        frames = frame_count,
        channels = channel_count,
        dropped_bytes = dropped,
        "Converted PCM to audio buffer"
    );

    Ok(AudioBuffer::new(sample_rate, planes))
}
