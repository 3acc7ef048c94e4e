//! # speakr text-to-speech client
//!
//! Generates speech with the Gemini API and turns the returned base64 PCM
//! into something usable: a playable [`audio::AudioBuffer`] driven through
//! an output device, or a standard WAV file.
//!
//! **Architecture:** [`generation`] talks to the API, [`audio`] holds the
//! pure decode/convert/encode pipeline and the cpal output, [`playback`]
//! sequences one playback session at a time, and [`session`] ties them
//! together behind user-facing errors.

pub mod audio;
pub mod download;
pub mod error;
pub mod generation;
pub mod playback;
pub mod session;

pub use error::{Error, Result};
