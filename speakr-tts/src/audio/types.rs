//! Core audio data types
//!
//! Defines the playable buffer handed to the output device.

/// AudioBuffer holds deinterleaved, normalized audio ready for playback.
///
/// **Format:**
/// - Samples are f32 in [-1.0, 1.0)
/// - One Vec per channel, all of equal length (`frame_count`)
/// - Sample rate is whatever the source PCM declared; never resampled
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    /// Samples per second per channel
    pub sample_rate: u32,

    /// Per-channel samples, index = channel
    channels: Vec<Vec<f32>>,

    /// Frames per channel
    frame_count: usize,
}

impl AudioBuffer {
    /// Create a buffer from per-channel sample vectors
    ///
    /// Channels longer than the shortest one are truncated so every channel
    /// holds the same number of frames.
    pub fn new(sample_rate: u32, mut channels: Vec<Vec<f32>>) -> Self {
        let frame_count = channels.iter().map(Vec::len).min().unwrap_or(0);
        for channel in &mut channels {
            channel.truncate(frame_count);
        }

        Self {
            sample_rate,
            channels,
            frame_count,
        }
    }

    /// Number of channels
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Frames per channel
    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    pub fn is_empty(&self) -> bool {
        self.frame_count == 0
    }

    /// Samples of one channel
    pub fn channel(&self, index: usize) -> Option<&[f32]> {
        self.channels.get(index).map(Vec::as_slice)
    }

    /// Sample at a frame for a device output channel
    ///
    /// Output channels beyond the buffer's channel count repeat the last
    /// buffer channel, so mono plays on every speaker.
    pub fn sample_for_output(&self, output_channel: usize, frame_index: usize) -> f32 {
        let Some(last) = self.channels.len().checked_sub(1) else {
            return 0.0;
        };
        let channel = &self.channels[output_channel.min(last)];
        channel.get(frame_index).copied().unwrap_or(0.0)
    }

    /// Get duration in milliseconds
    pub fn duration_ms(&self) -> u64 {
        if self.sample_rate == 0 {
            return 0;
        }
        (self.frame_count as u64 * 1000) / self.sample_rate as u64
    }

    /// Get duration in seconds
    pub fn duration_seconds(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frame_count as f32 / self.sample_rate as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_buffer_creation() {
        let buffer = AudioBuffer::new(24_000, vec![vec![0.5, -0.5], vec![0.25, -0.25]]);

        assert_eq!(buffer.sample_rate, 24_000);
        assert_eq!(buffer.channel_count(), 2);
        assert_eq!(buffer.frame_count(), 2);
        assert_eq!(buffer.channel(1), Some(&[0.25, -0.25][..]));
        assert!(buffer.channel(2).is_none());
    }

    #[test]
    fn test_audio_buffer_equalizes_channel_lengths() {
        let buffer = AudioBuffer::new(24_000, vec![vec![0.1, 0.2, 0.3], vec![0.4, 0.5]]);

        assert_eq!(buffer.frame_count(), 2);
        assert_eq!(buffer.channel(0), Some(&[0.1, 0.2][..]));
    }

    #[test]
    fn test_audio_buffer_duration() {
        // 24000 frames = 1 second at 24 kHz
        let buffer = AudioBuffer::new(24_000, vec![vec![0.0; 24_000]]);

        assert_eq!(buffer.duration_ms(), 1000);
        assert_eq!(buffer.duration_seconds(), 1.0);
    }

    #[test]
    fn test_sample_for_output_mono_fans_out() {
        let buffer = AudioBuffer::new(24_000, vec![vec![0.1, 0.2]]);

        assert_eq!(buffer.sample_for_output(0, 1), 0.2);
        assert_eq!(buffer.sample_for_output(1, 1), 0.2);
        assert_eq!(buffer.sample_for_output(0, 2), 0.0);
    }

    #[test]
    fn test_empty_buffer() {
        let buffer = AudioBuffer::new(24_000, Vec::new());

        assert!(buffer.is_empty());
        assert_eq!(buffer.sample_for_output(0, 0), 0.0);
    }
}
