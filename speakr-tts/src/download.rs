//! WAV download artifact
//!
//! The whole file is built in memory before anything touches the disk, and
//! is written to a sibling temp file that is renamed into place, so a
//! failed download never leaves a truncated `.wav` behind.

use crate::audio::wav::{WAV_EXTENSION, WAV_HEADER_LEN};
use crate::audio::{to_wav, AudioFormat, EncodedAudio};
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// File name used when no explicit path is given
pub const DEFAULT_FILENAME: &str = "gemini-speech.wav";

/// `<dir>/gemini-speech.wav`
pub fn default_download_path(dir: &Path) -> PathBuf {
    dir.join(DEFAULT_FILENAME)
}

/// Decode a payload and wrap it in a WAV container
pub fn build_wav(audio: &EncodedAudio, format: AudioFormat) -> Result<Vec<u8>> {
    let pcm = audio.decode()?;
    to_wav(&pcm, format.sample_rate, format.channels)
}

/// Write a payload as a WAV file at `path`
///
/// A path without an extension gets `.wav`. Returns the path written.
pub fn save_wav(audio: &EncodedAudio, format: AudioFormat, path: &Path) -> Result<PathBuf> {
    let wav = build_wav(audio, format)?;

    let mut target = path.to_path_buf();
    if target.extension().is_none() {
        target.set_extension(WAV_EXTENSION);
    }

    write_atomically(&target, &wav)?;

    info!(
        path = %target.display(),
        bytes = wav.len(),
        duration_ms = format.duration_of(wav.len().saturating_sub(WAV_HEADER_LEN)).as_millis() as u64,
        "Saved WAV file"
    );
    Ok(target)
}

fn write_atomically(target: &Path, bytes: &[u8]) -> Result<()> {
    let file_name = target
        .file_name()
        .ok_or_else(|| Error::Download(format!("{} is not a file path", target.display())))?;

    if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| {
            Error::Download(format!("Failed to create {}: {}", parent.display(), e))
        })?;
    }

    let mut temp_name = file_name.to_os_string();
    temp_name.push(".part");
    let temp = target.with_file_name(temp_name);

    debug!(temp = %temp.display(), "Writing WAV data");
    if let Err(e) = std::fs::write(&temp, bytes) {
        let _ = std::fs::remove_file(&temp);
        return Err(Error::Download(format!(
            "Failed to write {}: {}",
            temp.display(),
            e
        )));
    }

    std::fs::rename(&temp, target).map_err(|e| {
        let _ = std::fs::remove_file(&temp);
        Error::Download(format!("Failed to move file into {}: {}", target.display(), e))
    })
}
