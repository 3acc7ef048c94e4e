//! Playback orchestrator
//!
//! Drives one playback session at a time: decode the base64 payload,
//! convert it to an [`AudioBuffer`], acquire an output device from the
//! injected factory, start playback and release the device when the
//! device reports the end (or anything fails).
//!
//! The idle check and the move to `Decoding` happen in a single
//! `watch::Sender::send_if_modified` call, so two concurrent play requests
//! can never both acquire a device. Everything after that runs on a spawned
//! start task: a caller that stops waiting does not end the session, which
//! then plays out and releases its device as usual.

use crate::audio::output::{EndNotifier, OutputDevice, OutputDeviceFactory, PlaybackEnd};
use crate::audio::{to_audio_buffer, AudioBuffer, AudioFormat, EncodedAudio};
use crate::error::{Error, Result};
use crate::playback::state::PlaybackState;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, watch};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Result of a play request
#[derive(Debug)]
pub enum PlayOutcome {
    /// Playback has started; the handle resolves when it stops
    Started(PlaybackHandle),
    /// Another session is in flight; nothing was done
    Busy,
}

/// A running playback session
#[derive(Debug)]
pub struct PlaybackHandle {
    session_id: Uuid,
    device_name: String,
    duration: Duration,
    finished: oneshot::Receiver<Result<()>>,
}

impl PlaybackHandle {
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    /// Length of the scheduled audio
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Wait until the device has finished (or failed) and been released
    pub async fn finished(self) -> Result<()> {
        self.finished
            .await
            .unwrap_or_else(|_| Err(Error::Playback("playback session was dropped".to_string())))
    }
}

/// Sequences decode → buffer conversion → device playback → release.
pub struct PlaybackOrchestrator {
    factory: Arc<dyn OutputDeviceFactory>,
    format: AudioFormat,
    state: Arc<watch::Sender<PlaybackState>>,
}

impl PlaybackOrchestrator {
    /// Create an orchestrator using `factory` for every session
    ///
    /// `format` is the assumed layout of decoded payloads.
    pub fn new(factory: Arc<dyn OutputDeviceFactory>, format: AudioFormat) -> Self {
        let (state, _) = watch::channel(PlaybackState::Idle);
        Self {
            factory,
            format,
            state: Arc::new(state),
        }
    }

    pub fn state(&self) -> PlaybackState {
        *self.state.borrow()
    }

    pub fn is_busy(&self) -> bool {
        self.state().is_active()
    }

    pub fn format(&self) -> AudioFormat {
        self.format
    }

    /// Observe state transitions
    pub fn subscribe(&self) -> watch::Receiver<PlaybackState> {
        self.state.subscribe()
    }

    /// Play a payload unless a session is already in flight
    ///
    /// Returns once playback has started. Errors from decoding, conversion
    /// or device acquisition are returned here; errors after the start are
    /// reported through [`PlaybackHandle::finished`]. Either way the device
    /// is closed and the state returns to `Idle`.
    pub async fn play(&self, audio: &EncodedAudio) -> Result<PlayOutcome> {
        let acquired = self.state.send_if_modified(|state| {
            if state.is_active() {
                false
            } else {
                *state = PlaybackState::Decoding;
                true
            }
        });
        if !acquired {
            debug!("Playback already in progress, ignoring play request");
            return Ok(PlayOutcome::Busy);
        }

        let session_id = Uuid::new_v4();
        let guard = SessionGuard::new(Arc::clone(&self.state), session_id);
        info!(%session_id, "Playback session decoding");

        // The start task owns the session until the device is playing or
        // released, so dropping this future cannot free the slot early.
        let start = tokio::spawn(start_session(
            Arc::clone(&self.factory),
            self.format,
            audio.clone(),
            guard,
        ));

        let handle = start
            .await
            .map_err(|e| Error::Playback(format!("Playback start task failed: {}", e)))??;
        Ok(PlayOutcome::Started(handle))
    }
}

/// Decode, acquire and start a device, then hand the session to a supervisor.
///
/// On any error the guard drops here, after the lease has been released.
async fn start_session(
    factory: Arc<dyn OutputDeviceFactory>,
    format: AudioFormat,
    audio: EncodedAudio,
    mut guard: SessionGuard,
) -> Result<PlaybackHandle> {
    let session_id = guard.session_id;

    let (lease, ended, duration) = match acquire_device(factory, format, &audio, session_id).await {
        Ok(started) => started,
        Err(e) => {
            error!(%session_id, error = %e, "Error playing audio");
            return Err(e);
        }
    };

    guard.state.send_replace(PlaybackState::Playing);
    guard.disarm();

    let device_name = lease.name().to_string();
    info!(
        %session_id,
        device = %device_name,
        duration_ms = duration.as_millis() as u64,
        "Playback session playing"
    );

    let (finished_tx, finished_rx) = oneshot::channel();
    tokio::spawn(supervise(
        Arc::clone(&guard.state),
        session_id,
        lease,
        ended,
        finished_tx,
    ));

    Ok(PlaybackHandle {
        session_id,
        device_name,
        duration,
        finished: finished_rx,
    })
}

async fn acquire_device(
    factory: Arc<dyn OutputDeviceFactory>,
    format: AudioFormat,
    audio: &EncodedAudio,
    session_id: Uuid,
) -> Result<(DeviceLease, EndNotifier, Duration)> {
    let bytes = audio.decode()?;
    format.validate_payload(&bytes)?;
    let buffer: AudioBuffer = to_audio_buffer(&bytes, format.sample_rate, format.channels)?;
    let duration = Duration::from_millis(buffer.duration_ms());

    debug!(
        %session_id,
        bytes = bytes.len(),
        frames = buffer.frame_count(),
        "Decoded playback buffer"
    );

    let buffer = Arc::new(buffer);

    // Device acquisition may block on the audio thread's setup
    let (lease, ended) = tokio::task::spawn_blocking(move || -> Result<_> {
        let mut lease = DeviceLease::new(factory.open(buffer.sample_rate)?);
        let ended = lease.start(buffer)?;
        Ok((lease, ended))
    })
    .await
    .map_err(|e| Error::Playback(format!("Audio device task failed: {}", e)))??;

    Ok((lease, ended, duration))
}

/// Wait for the device to finish, release it, publish the terminal state.
async fn supervise(
    state: Arc<watch::Sender<PlaybackState>>,
    session_id: Uuid,
    lease: DeviceLease,
    ended: EndNotifier,
    finished: oneshot::Sender<Result<()>>,
) {
    let outcome = match ended.await {
        Ok(PlaybackEnd::Completed) => Ok(()),
        Ok(PlaybackEnd::Interrupted(reason)) => Err(Error::Playback(reason)),
        Err(_) => Err(Error::Playback(
            "audio device stopped before playback finished".to_string(),
        )),
    };

    let released = tokio::task::spawn_blocking(move || {
        let mut lease = lease;
        lease.release()
    })
    .await;
    match released {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!(%session_id, error = %e, "Failed to release audio device"),
        Err(e) => warn!(%session_id, error = %e, "Audio device release task failed"),
    }

    match &outcome {
        Ok(()) => {
            info!(%session_id, "Playback session ended");
            state.send_replace(PlaybackState::Ended);
        }
        Err(e) => {
            error!(%session_id, error = %e, "Playback session failed");
            state.send_replace(PlaybackState::Failed);
        }
    }
    state.send_replace(PlaybackState::Idle);

    let _ = finished.send(outcome);
}

/// Returns the state to Idle (via Failed) unless the session started.
///
/// Owned by the start task, so it only fires once device acquisition has
/// finished one way or the other.
struct SessionGuard {
    state: Arc<watch::Sender<PlaybackState>>,
    session_id: Uuid,
    armed: bool,
}

impl SessionGuard {
    fn new(state: Arc<watch::Sender<PlaybackState>>, session_id: Uuid) -> Self {
        Self {
            state,
            session_id,
            armed: true,
        }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        if self.armed {
            debug!(session_id = %self.session_id, "Playback session failed before start");
            self.state.send_replace(PlaybackState::Failed);
            self.state.send_replace(PlaybackState::Idle);
        }
    }
}

/// Scoped ownership of an acquired device; closed on release or drop.
struct DeviceLease {
    device: Box<dyn OutputDevice>,
    released: bool,
}

impl DeviceLease {
    fn new(device: Box<dyn OutputDevice>) -> Self {
        Self {
            device,
            released: false,
        }
    }

    fn name(&self) -> &str {
        self.device.name()
    }

    fn start(&mut self, buffer: Arc<AudioBuffer>) -> Result<EndNotifier> {
        self.device.start(buffer)
    }

    fn release(&mut self) -> Result<()> {
        if self.released {
            return Ok(());
        }
        self.released = true;
        self.device.close()
    }
}

impl Drop for DeviceLease {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            warn!("Failed to close audio device: {}", e);
        }
    }
}
