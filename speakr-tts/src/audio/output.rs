//! Audio output devices
//!
//! The playback orchestrator only sees [`OutputDeviceFactory`] and
//! [`OutputDevice`]; [`CpalOutputFactory`] is the real implementation.
//!
//! `cpal::Stream` is not `Send`, so each [`CpalOutputDevice`] owns a
//! dedicated thread that creates the stream, keeps it alive and drops it on
//! close. The async side talks to that thread over channels.

use crate::audio::types::AudioBuffer;
use crate::error::{Error, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, FromSample, Sample, SampleFormat, SizedSample, Stream, StreamConfig};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};

/// Time left for the device to drain its last callback buffer before the
/// stream is paused
const DRAIN_TAIL: Duration = Duration::from_millis(150);

/// How a scheduled buffer stopped playing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackEnd {
    /// Every frame was handed to the device
    Completed,
    /// The stream reported an error
    Interrupted(String),
}

/// Resolves once when the scheduled buffer stops playing
pub type EndNotifier = oneshot::Receiver<PlaybackEnd>;

/// An acquired audio output, fixed to one sample rate.
pub trait OutputDevice: Send {
    /// Human-readable device name
    fn name(&self) -> &str;

    /// Sample rate the device was opened with
    fn sample_rate(&self) -> u32;

    /// Schedule a buffer and start playback immediately
    fn start(&mut self, buffer: Arc<AudioBuffer>) -> Result<EndNotifier>;

    /// Stop playback and release the device. Idempotent.
    fn close(&mut self) -> Result<()>;
}

/// Acquires output devices at a requested sample rate.
pub trait OutputDeviceFactory: Send + Sync {
    fn open(&self, sample_rate: u32) -> Result<Box<dyn OutputDevice>>;
}

/// List available audio output devices.
pub fn list_devices() -> Result<Vec<String>> {
    let host = cpal::default_host();

    let devices: Vec<String> = host
        .output_devices()
        .map_err(|e| Error::Playback(format!("Failed to enumerate devices: {}", e)))?
        .filter_map(|device| device.name().ok())
        .filter(|name| !name.trim().is_empty())
        .collect();

    debug!("Found {} output devices", devices.len());
    Ok(devices)
}

/// Opens cpal devices by name (None = system default).
#[derive(Debug, Clone, Default)]
pub struct CpalOutputFactory {
    device_name: Option<String>,
}

impl CpalOutputFactory {
    pub fn new(device_name: Option<String>) -> Self {
        Self { device_name }
    }
}

impl OutputDeviceFactory for CpalOutputFactory {
    fn open(&self, sample_rate: u32) -> Result<Box<dyn OutputDevice>> {
        let device = CpalOutputDevice::open(self.device_name.clone(), sample_rate)?;
        Ok(Box::new(device))
    }
}

enum DeviceCommand {
    Start {
        buffer: Arc<AudioBuffer>,
        ended: oneshot::Sender<PlaybackEnd>,
        started: mpsc::SyncSender<Result<()>>,
    },
    Close,
}

/// Handle to a cpal stream living on its own thread.
pub struct CpalOutputDevice {
    name: String,
    sample_rate: u32,
    commands: mpsc::Sender<DeviceCommand>,
    worker: Option<JoinHandle<()>>,
}

impl CpalOutputDevice {
    /// Open the device on a new audio thread.
    ///
    /// Blocks until the thread has found the device and a stream
    /// configuration at `sample_rate`, or failed to.
    pub fn open(device_name: Option<String>, sample_rate: u32) -> Result<Self> {
        let (ready_tx, ready_rx) = mpsc::sync_channel::<Result<String>>(1);
        let (commands, command_rx) = mpsc::channel();

        let worker = std::thread::Builder::new()
            .name("speakr-audio".to_string())
            .spawn(move || {
                // AudioOutput must be created and dropped on this thread
                let output = match AudioOutput::open(device_name.as_deref(), sample_rate) {
                    Ok(output) => {
                        let _ = ready_tx.send(Ok(output.device_name()));
                        output
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                run_device_thread(output, command_rx);
            })
            .map_err(|e| Error::Playback(format!("Failed to spawn audio thread: {}", e)))?;

        let name = ready_rx
            .recv()
            .map_err(|_| Error::Playback("Audio thread exited during device setup".to_string()))??;

        Ok(Self {
            name,
            sample_rate,
            commands,
            worker: Some(worker),
        })
    }
}

impl OutputDevice for CpalOutputDevice {
    fn name(&self) -> &str {
        &self.name
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn start(&mut self, buffer: Arc<AudioBuffer>) -> Result<EndNotifier> {
        let (ended, notifier) = oneshot::channel();
        let (started, started_rx) = mpsc::sync_channel(1);

        self.commands
            .send(DeviceCommand::Start {
                buffer,
                ended,
                started,
            })
            .map_err(|_| Error::Playback("Audio device is closed".to_string()))?;

        started_rx
            .recv()
            .map_err(|_| Error::Playback("Audio thread exited before playback started".to_string()))??;

        Ok(notifier)
    }

    fn close(&mut self) -> Result<()> {
        let Some(worker) = self.worker.take() else {
            return Ok(());
        };

        // The thread may already be gone after a setup failure
        let _ = self.commands.send(DeviceCommand::Close);

        worker
            .join()
            .map_err(|_| Error::Playback("Audio thread panicked".to_string()))?;
        debug!("Closed audio device {}", self.name);
        Ok(())
    }
}

impl Drop for CpalOutputDevice {
    fn drop(&mut self) {
        // Ensure the audio thread is stopped on drop
        let _ = self.close();
    }
}

fn run_device_thread(mut output: AudioOutput, commands: mpsc::Receiver<DeviceCommand>) {
    // A dropped handle disconnects the channel, which also ends the loop
    while let Ok(command) = commands.recv() {
        match command {
            DeviceCommand::Start {
                buffer,
                ended,
                started,
            } => {
                let _ = started.send(output.start(buffer, ended));
            }
            DeviceCommand::Close => break,
        }
    }

    if output.is_finished() {
        std::thread::sleep(DRAIN_TAIL);
    }
    if let Err(e) = output.stop() {
        warn!("Failed to stop audio stream: {}", e);
    }
}

type Completion = Arc<Mutex<Option<oneshot::Sender<PlaybackEnd>>>>;

fn notify(completion: &Completion, end: PlaybackEnd) {
    if let Ok(mut slot) = completion.lock() {
        if let Some(tx) = slot.take() {
            let _ = tx.send(end);
        }
    }
}

/// cpal device and stream. Not `Send`; lives on the audio thread.
struct AudioOutput {
    device: Device,
    config: StreamConfig,
    sample_format: SampleFormat,
    stream: Option<Stream>,
    /// Set once the last frame has been written to the device
    finished: Arc<AtomicBool>,
    /// Set by the stream error callback
    error_flag: Arc<AtomicBool>,
}

impl AudioOutput {
    /// Open the named device (falling back to the default) at `sample_rate`.
    fn open(device_name: Option<&str>, sample_rate: u32) -> Result<Self> {
        let host = cpal::default_host();

        // Try to get requested device, with fallback to default
        let device = if let Some(name) = device_name {
            let mut devices = host
                .output_devices()
                .map_err(|e| Error::Playback(format!("Failed to enumerate devices: {}", e)))?;

            match devices.find(|d| d.name().ok().as_deref() == Some(name)) {
                Some(dev) => {
                    info!("Found requested audio device: {}", name);
                    dev
                }
                None => {
                    warn!("Requested device '{}' not found, falling back to default device", name);
                    host.default_output_device().ok_or_else(|| {
                        Error::Playback(format!(
                            "Device '{}' not found and no default device available",
                            name
                        ))
                    })?
                }
            }
        } else {
            host.default_output_device()
                .ok_or_else(|| Error::Playback("No default output device found".to_string()))?
        };

        let (config, sample_format) = Self::select_config(&device, sample_rate)?;

        debug!(
            "Audio config: sample_rate={}, channels={}, format={:?}",
            config.sample_rate.0, config.channels, sample_format
        );

        Ok(Self {
            device,
            config,
            sample_format,
            stream: None,
            finished: Arc::new(AtomicBool::new(false)),
            error_flag: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Pick a configuration that runs at exactly `sample_rate`.
    ///
    /// Prefers f32, then i16, then u16, and the fewest channels.
    fn select_config(device: &Device, sample_rate: u32) -> Result<(StreamConfig, SampleFormat)> {
        let format_rank = |format: SampleFormat| match format {
            SampleFormat::F32 => Some(0u8),
            SampleFormat::I16 => Some(1),
            SampleFormat::U16 => Some(2),
            _ => None,
        };

        let best = device
            .supported_output_configs()
            .map_err(|e| Error::Playback(format!("Failed to get device configs: {}", e)))?
            .filter(|range| {
                range.min_sample_rate().0 <= sample_rate && range.max_sample_rate().0 >= sample_rate
            })
            .filter_map(|range| format_rank(range.sample_format()).map(|rank| (rank, range)))
            .min_by_key(|(rank, range)| (*rank, range.channels()))
            .map(|(_, range)| range);

        let range = best.ok_or_else(|| {
            Error::Playback(format!(
                "Audio device does not support {} Hz output",
                sample_rate
            ))
        })?;

        let sample_format = range.sample_format();
        let config = range.with_sample_rate(cpal::SampleRate(sample_rate)).config();
        Ok((config, sample_format))
    }

    fn device_name(&self) -> String {
        self.device
            .name()
            .unwrap_or_else(|_| "Unknown".to_string())
    }

    fn is_finished(&self) -> bool {
        self.finished.load(Ordering::SeqCst)
    }

    /// Start streaming `buffer`; `ended` fires when it has been consumed.
    fn start(&mut self, buffer: Arc<AudioBuffer>, ended: oneshot::Sender<PlaybackEnd>) -> Result<()> {
        if self.stream.is_some() {
            return Err(Error::Playback("Audio stream already started".to_string()));
        }

        info!(
            frames = buffer.frame_count(),
            channels = buffer.channel_count(),
            "Starting audio stream"
        );

        let completion: Completion = Arc::new(Mutex::new(Some(ended)));

        let stream = match self.sample_format {
            SampleFormat::F32 => self.build_stream::<f32>(buffer, completion)?,
            SampleFormat::I16 => self.build_stream::<i16>(buffer, completion)?,
            SampleFormat::U16 => self.build_stream::<u16>(buffer, completion)?,
            sample_format => {
                return Err(Error::Playback(format!(
                    "Unsupported sample format: {:?}",
                    sample_format
                )));
            }
        };

        stream
            .play()
            .map_err(|e| Error::Playback(format!("Failed to start stream: {}", e)))?;

        self.stream = Some(stream);
        Ok(())
    }

    fn build_stream<T>(&self, buffer: Arc<AudioBuffer>, completion: Completion) -> Result<Stream>
    where
        T: SizedSample + FromSample<f32>,
    {
        let channels = self.config.channels as usize;
        let finished = Arc::clone(&self.finished);
        let error_flag = Arc::clone(&self.error_flag);
        let data_completion = Arc::clone(&completion);
        let mut position = 0usize;

        self.device
            .build_output_stream(
                &self.config,
                move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                    let frame_count = buffer.frame_count();

                    for frame in data.chunks_mut(channels) {
                        for (channel, sample) in frame.iter_mut().enumerate() {
                            let value = if position < frame_count {
                                buffer.sample_for_output(channel, position)
                            } else {
                                0.0
                            };
                            *sample = <T as Sample>::from_sample(value);
                        }
                        if position < frame_count {
                            position += 1;
                        }
                    }

                    if position >= frame_count && !finished.swap(true, Ordering::SeqCst) {
                        notify(&data_completion, PlaybackEnd::Completed);
                    }
                },
                move |err| {
                    error!("Audio stream error: {}", err);
                    error_flag.store(true, Ordering::SeqCst);
                    notify(&completion, PlaybackEnd::Interrupted(err.to_string()));
                },
                None, // No timeout
            )
            .map_err(|e| Error::Playback(format!("Failed to build stream: {}", e)))
    }

    /// Pause the stream and drop it.
    fn stop(&mut self) -> Result<()> {
        if let Some(stream) = self.stream.take() {
            debug!("Stopping audio stream");
            stream
                .pause()
                .map_err(|e| Error::Playback(format!("Failed to pause stream: {}", e)))?;
            drop(stream);
        }

        if self.error_flag.load(Ordering::SeqCst) {
            warn!("Audio stream reported errors during playback");
        }
        Ok(())
    }
}

impl Drop for AudioOutput {
    fn drop(&mut self) {
        // Ensure stream is stopped on drop
        let _ = self.stop();
    }
}
