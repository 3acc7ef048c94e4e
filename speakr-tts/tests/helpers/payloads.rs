//! Deterministic PCM payloads

use speakr_tts::audio::encoded::encode;
use speakr_tts::audio::EncodedAudio;
use std::f32::consts::PI;

/// Interleaved i16 samples as little-endian bytes
pub fn pcm_bytes(samples: &[i16]) -> Vec<u8> {
    samples.iter().flat_map(|s| s.to_le_bytes()).collect()
}

/// Base64 payload of the given samples
pub fn payload_from_samples(samples: &[i16]) -> EncodedAudio {
    EncodedAudio::from(encode(&pcm_bytes(samples)))
}

/// Mono sine wave at half amplitude
pub fn sine_samples(frames: usize, frequency_hz: f32, sample_rate: u32) -> Vec<i16> {
    (0..frames)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            ((2.0 * PI * frequency_hz * t).sin() * 0.5 * i16::MAX as f32) as i16
        })
        .collect()
}
