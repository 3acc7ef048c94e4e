//! Canonical RIFF/WAVE encoder for 16-bit PCM
//!
//! Layout (all integers little-endian):
//!
//! | Offset | Field          | Value                         |
//! |--------|----------------|-------------------------------|
//! | 0      | ChunkID        | "RIFF"                        |
//! | 4      | ChunkSize      | 36 + data size                |
//! | 8      | Format         | "WAVE"                        |
//! | 12     | Subchunk1ID    | "fmt "                        |
//! | 16     | Subchunk1Size  | 16                            |
//! | 20     | AudioFormat    | 1 (PCM)                       |
//! | 22     | NumChannels    | channels                      |
//! | 24     | SampleRate     | sample rate                   |
//! | 28     | ByteRate       | sample rate × channels × 2    |
//! | 32     | BlockAlign     | channels × 2                  |
//! | 34     | BitsPerSample  | 16                            |
//! | 36     | Subchunk2ID    | "data"                        |
//! | 40     | Subchunk2Size  | data size                     |
//! | 44     | data           | PCM bytes, verbatim           |

use crate::error::{Error, Result};

/// Size of the canonical header
pub const WAV_HEADER_LEN: usize = 44;

/// MIME type of the produced file
pub const WAV_MIME_TYPE: &str = "audio/wav";

/// File extension of the produced file
pub const WAV_EXTENSION: &str = "wav";

const BITS_PER_SAMPLE: u16 = 16;
const PCM_FORMAT_TAG: u16 = 1;
const FMT_CHUNK_LEN: u32 = 16;

/// Build the 44-byte header describing `data_len` bytes of 16-bit PCM
///
/// # Errors
/// `Error::Download` if a size or rate does not fit its 32-bit field.
pub fn wav_header(data_len: usize, sample_rate: u32, channels: u16) -> Result<[u8; WAV_HEADER_LEN]> {
    let data_size = u32::try_from(data_len)
        .ok()
        .filter(|size| size.checked_add(36).is_some())
        .ok_or_else(|| Error::Download(format!("{} bytes is too large for a WAV file", data_len)))?;

    let block_align = channels
        .checked_mul(BITS_PER_SAMPLE / 8)
        .ok_or_else(|| Error::Download(format!("{} channels is too many for a WAV file", channels)))?;

    let byte_rate = sample_rate
        .checked_mul(block_align as u32)
        .ok_or_else(|| {
            Error::Download(format!(
                "byte rate of {} Hz × {} channels overflows the WAV header",
                sample_rate, channels
            ))
        })?;

    let mut header = [0u8; WAV_HEADER_LEN];

    // RIFF chunk descriptor
    header[0..4].copy_from_slice(b"RIFF");
    header[4..8].copy_from_slice(&(36 + data_size).to_le_bytes());
    header[8..12].copy_from_slice(b"WAVE");

    // fmt sub-chunk
    header[12..16].copy_from_slice(b"fmt ");
    header[16..20].copy_from_slice(&FMT_CHUNK_LEN.to_le_bytes());
    header[20..22].copy_from_slice(&PCM_FORMAT_TAG.to_le_bytes());
    header[22..24].copy_from_slice(&channels.to_le_bytes());
    header[24..28].copy_from_slice(&sample_rate.to_le_bytes());
    header[28..32].copy_from_slice(&byte_rate.to_le_bytes());
    header[32..34].copy_from_slice(&block_align.to_le_bytes());
    header[34..36].copy_from_slice(&BITS_PER_SAMPLE.to_le_bytes());

    // data sub-chunk
    header[36..40].copy_from_slice(b"data");
    header[40..44].copy_from_slice(&data_size.to_le_bytes());

    Ok(header)
}

/// Wrap raw 16-bit PCM in a WAV container
///
/// The PCM content is not inspected; any byte sequence is copied verbatim
/// after the header.
pub fn to_wav(pcm: &[u8], sample_rate: u32, channels: u16) -> Result<Vec<u8>> {
    let header = wav_header(pcm.len(), sample_rate, channels)?;

    let mut wav = Vec::with_capacity(WAV_HEADER_LEN + pcm.len());
    wav.extend_from_slice(&header);
    wav.extend_from_slice(pcm);
    Ok(wav)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn u32_at(bytes: &[u8], offset: usize) -> u32 {
        u32::from_le_bytes(bytes[offset..offset + 4].try_into().unwrap())
    }

    fn u16_at(bytes: &[u8], offset: usize) -> u16 {
        u16::from_le_bytes(bytes[offset..offset + 2].try_into().unwrap())
    }

    #[test]
    fn test_two_sample_mono_file() {
        let pcm = [0x00, 0x00, 0xFF, 0x7F];
        let wav = to_wav(&pcm, 24_000, 1).unwrap();

        assert_eq!(wav.len(), 48);
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(u32_at(&wav, 4), 40);
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(&wav[12..16], b"fmt ");
        assert_eq!(u32_at(&wav, 16), 16);
        assert_eq!(u16_at(&wav, 20), 1);
        assert_eq!(u16_at(&wav, 22), 1);
        assert_eq!(u32_at(&wav, 24), 24_000);
        assert_eq!(u32_at(&wav, 28), 48_000);
        assert_eq!(u16_at(&wav, 32), 2);
        assert_eq!(u16_at(&wav, 34), 16);
        assert_eq!(&wav[36..40], b"data");
        assert_eq!(u32_at(&wav, 40), 4);
        assert_eq!(&wav[44..], &pcm);
    }

    #[test]
    fn test_size_fields_track_data_length() {
        for (len, channels) in [(0usize, 1u16), (1, 1), (7, 2), (1000, 2), (4096, 6)] {
            let pcm = vec![0xAB; len];
            let wav = to_wav(&pcm, 24_000, channels).unwrap();

            assert_eq!(wav.len(), 44 + len);
            assert_eq!(u32_at(&wav, 4), 36 + len as u32);
            assert_eq!(u32_at(&wav, 40), len as u32);
            assert_eq!(u16_at(&wav, 22), channels);
            assert_eq!(u16_at(&wav, 32), channels * 2);
            assert_eq!(u32_at(&wav, 28), 24_000 * channels as u32 * 2);
        }
    }

    #[test]
    fn test_input_not_modified() {
        let pcm = vec![1u8, 2, 3, 4, 5];
        let before = pcm.clone();
        let wav = to_wav(&pcm, 44_100, 1).unwrap();

        assert_eq!(pcm, before);
        assert_eq!(&wav[44..], &before[..]);
    }

    #[test]
    fn test_byte_rate_overflow_is_error() {
        assert!(matches!(
            wav_header(0, u32::MAX, 2),
            Err(Error::Download(_))
        ));
    }

    #[test]
    fn test_channel_overflow_is_error() {
        assert!(matches!(
            wav_header(0, 24_000, u16::MAX),
            Err(Error::Download(_))
        ));
    }
}
