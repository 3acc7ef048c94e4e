//! Session controller
//!
//! Owns everything the user interacts with: the text, the voice and style
//! selection, the most recent payload and the last user-facing error.
//! Errors from generate/play/download never escape; they are logged and
//! stored as an [`AppError`] for display.

use crate::audio::EncodedAudio;
use crate::download::{default_download_path, save_wav};
use crate::error::{Error, Result};
use crate::generation::voices::{default_voice, find_voice};
use crate::generation::{SpeechGenerator, Voice, VoiceStyle};
use crate::playback::{PlayOutcome, PlaybackHandle, PlaybackOrchestrator};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Title and message shown to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppError {
    pub title: String,
    pub message: String,
}

impl AppError {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn input_required() -> Self {
        Self::new(
            "Input Required",
            "Please enter some text to generate speech.",
        )
    }

    pub fn generation_failed(err: &Error) -> Self {
        Self::new("Generation Failed", err.to_string())
    }

    pub fn playback() -> Self {
        Self::new(
            "Playback Error",
            "Could not play audio. The data may be invalid or your audio device does not support the required audio features.",
        )
    }

    pub fn download() -> Self {
        Self::new(
            "Download Error",
            "Could not create the download file. Please try generating the speech again.",
        )
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.title, self.message)
    }
}

/// Interactive text-to-speech session
pub struct Session {
    generator: Arc<dyn SpeechGenerator>,
    orchestrator: PlaybackOrchestrator,
    output_dir: PathBuf,
    text: String,
    voice: &'static Voice,
    style: &'static VoiceStyle,
    is_loading: bool,
    audio: Option<EncodedAudio>,
    error: Option<AppError>,
}

impl Session {
    pub fn new(
        generator: Arc<dyn SpeechGenerator>,
        orchestrator: PlaybackOrchestrator,
        output_dir: PathBuf,
    ) -> Self {
        let voice = default_voice();
        Self {
            generator,
            orchestrator,
            output_dir,
            text: String::new(),
            voice,
            style: voice.default_style(),
            is_loading: false,
            audio: None,
            error: None,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn voice(&self) -> &'static Voice {
        self.voice
    }

    pub fn style(&self) -> &'static VoiceStyle {
        self.style
    }

    /// Select a voice by API value; resets the style to the voice's default
    pub fn select_voice(&mut self, value: &str) -> Result<()> {
        let voice = find_voice(value)
            .ok_or_else(|| Error::Config(format!("Unknown voice '{}'", value)))?;
        self.voice = voice;
        self.style = voice.default_style();
        Ok(())
    }

    /// Select a style of the current voice by key or display name
    pub fn select_style(&mut self, name: &str) -> Result<()> {
        self.style = self.voice.find_style(name).ok_or_else(|| {
            Error::Config(format!("Unknown style '{}' for voice {}", name, self.voice.value))
        })?;
        Ok(())
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn is_playing(&self) -> bool {
        self.orchestrator.is_busy()
    }

    pub fn orchestrator(&self) -> &PlaybackOrchestrator {
        &self.orchestrator
    }

    /// Most recent payload
    pub fn audio(&self) -> Option<&EncodedAudio> {
        self.audio.as_ref()
    }

    /// Replace the latest payload with one obtained elsewhere
    pub fn load_audio(&mut self, audio: EncodedAudio) {
        self.audio = Some(audio);
    }

    pub fn error(&self) -> Option<&AppError> {
        self.error.as_ref()
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    /// Generate speech for the current text, voice and style
    ///
    /// Returns true when a new payload was stored.
    pub async fn generate(&mut self) -> bool {
        if self.text.trim().is_empty() {
            self.error = Some(AppError::input_required());
            return false;
        }

        self.is_loading = true;
        self.error = None;
        self.audio = None;

        let prompt = self.style.compose_prompt(&self.text);
        info!(
            voice = self.voice.value,
            style = self.style.key,
            "Generating speech"
        );

        let result = self.generator.generate(&prompt, self.voice.value).await;
        self.is_loading = false;

        match result {
            Ok(speech) => {
                if let Some(mismatch) = speech.format_mismatch(self.orchestrator.format()) {
                    warn!("Generated audio format mismatch: {}", mismatch);
                }
                self.audio = Some(speech.audio);
                true
            }
            Err(e) => {
                error!("Error generating speech: {}", e);
                self.error = Some(AppError::generation_failed(&e));
                false
            }
        }
    }

    /// Start playing the latest payload
    ///
    /// No-op (None) without a payload or while a playback is in flight.
    pub async fn play(&mut self) -> Option<PlaybackHandle> {
        let audio = self.audio.clone()?;
        if self.orchestrator.is_busy() {
            return None;
        }

        self.error = None;
        match self.orchestrator.play(&audio).await {
            Ok(PlayOutcome::Started(handle)) => Some(handle),
            Ok(PlayOutcome::Busy) => None,
            Err(e) => {
                error!("Error playing audio: {}", e);
                self.error = Some(AppError::playback());
                None
            }
        }
    }

    /// Wait for a playback to end, recording a failure as the session error
    pub async fn finish_playback(&mut self, handle: PlaybackHandle) -> bool {
        match handle.finished().await {
            Ok(()) => true,
            Err(e) => {
                error!("Error playing audio: {}", e);
                self.error = Some(AppError::playback());
                false
            }
        }
    }

    /// Save the latest payload as `<output_dir>/gemini-speech.wav`
    pub fn download(&mut self) -> Option<PathBuf> {
        let path = default_download_path(&self.output_dir);
        self.download_to(&path)
    }

    /// Save the latest payload as a WAV file at `path`
    pub fn download_to(&mut self, path: &Path) -> Option<PathBuf> {
        let audio = self.audio.clone()?;

        self.error = None;
        match save_wav(&audio, self.orchestrator.format(), path) {
            Ok(written) => Some(written),
            Err(e) => {
                error!("Error creating download: {}", e);
                self.error = Some(AppError::download());
                None
            }
        }
    }
}
