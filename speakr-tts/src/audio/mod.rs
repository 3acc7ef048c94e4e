//! Audio pipeline: base64 payload → PCM bytes → playable buffer or WAV file

pub mod encoded;
pub mod format;
pub mod output;
pub mod pcm;
pub mod types;
pub mod wav;

pub use encoded::{decode, EncodedAudio};
pub use format::AudioFormat;
pub use output::{CpalOutputFactory, OutputDevice, OutputDeviceFactory, PlaybackEnd};
pub use pcm::to_audio_buffer;
pub use types::AudioBuffer;
pub use wav::to_wav;
