//! In-memory output device
//!
//! Records every open, start and close, and hands the end-of-playback
//! sender to the test so it decides when (and how) playback stops.

use speakr_tts::audio::output::EndNotifier;
use speakr_tts::audio::{AudioBuffer, OutputDevice, OutputDeviceFactory, PlaybackEnd};
use speakr_tts::{Error, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Behavior {
    Normal,
    FailOpen,
    FailStart,
}

#[derive(Default)]
struct Shared {
    opens: AtomicUsize,
    closes: AtomicUsize,
    live: AtomicUsize,
    max_live: AtomicUsize,
    open_rates: Mutex<Vec<u32>>,
    buffers: Mutex<Vec<Arc<AudioBuffer>>>,
    pending: Mutex<Vec<oneshot::Sender<PlaybackEnd>>>,
}

/// Cloneable handle; all clones share the same accounting
#[derive(Clone)]
pub struct FakeDeviceFactory {
    shared: Arc<Shared>,
    behavior: Behavior,
    open_delay: Duration,
}

impl FakeDeviceFactory {
    pub fn new() -> Self {
        Self::with_behavior(Behavior::Normal)
    }

    /// Every open fails as if no device were available
    pub fn failing_open() -> Self {
        Self::with_behavior(Behavior::FailOpen)
    }

    /// Devices open but refuse to start
    pub fn failing_start() -> Self {
        Self::with_behavior(Behavior::FailStart)
    }

    fn with_behavior(behavior: Behavior) -> Self {
        Self {
            shared: Arc::new(Shared::default()),
            behavior,
            open_delay: Duration::ZERO,
        }
    }

    /// Block every open for `delay`, like a slow audio backend
    pub fn with_open_delay(mut self, delay: Duration) -> Self {
        self.open_delay = delay;
        self
    }

    pub fn as_factory(&self) -> Arc<dyn OutputDeviceFactory> {
        Arc::new(self.clone())
    }

    pub fn opens(&self) -> usize {
        self.shared.opens.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.shared.closes.load(Ordering::SeqCst)
    }

    /// Most devices that were open at the same time
    pub fn max_live(&self) -> usize {
        self.shared.max_live.load(Ordering::SeqCst)
    }

    pub fn open_rates(&self) -> Vec<u32> {
        self.shared.open_rates.lock().unwrap().clone()
    }

    /// Buffers handed to `start`, in order
    pub fn started_buffers(&self) -> Vec<Arc<AudioBuffer>> {
        self.shared.buffers.lock().unwrap().clone()
    }

    /// End the oldest running playback; false if none is running
    pub fn finish(&self, end: PlaybackEnd) -> bool {
        let sender = {
            let mut pending = self.shared.pending.lock().unwrap();
            if pending.is_empty() {
                return false;
            }
            pending.remove(0)
        };
        sender.send(end).is_ok()
    }

    /// Drop every end sender without reporting, like a device thread dying
    pub fn vanish(&self) {
        self.shared.pending.lock().unwrap().clear();
    }
}

impl OutputDeviceFactory for FakeDeviceFactory {
    fn open(&self, sample_rate: u32) -> Result<Box<dyn OutputDevice>> {
        if self.behavior == Behavior::FailOpen {
            return Err(Error::Playback("no output device available".to_string()));
        }

        if !self.open_delay.is_zero() {
            std::thread::sleep(self.open_delay);
        }

        self.shared.opens.fetch_add(1, Ordering::SeqCst);
        let live = self.shared.live.fetch_add(1, Ordering::SeqCst) + 1;
        self.shared.max_live.fetch_max(live, Ordering::SeqCst);
        self.shared.open_rates.lock().unwrap().push(sample_rate);

        Ok(Box::new(FakeDevice {
            shared: Arc::clone(&self.shared),
            behavior: self.behavior,
            sample_rate,
            closed: false,
        }))
    }
}

struct FakeDevice {
    shared: Arc<Shared>,
    behavior: Behavior,
    sample_rate: u32,
    closed: bool,
}

impl OutputDevice for FakeDevice {
    fn name(&self) -> &str {
        "fake-device"
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn start(&mut self, buffer: Arc<AudioBuffer>) -> Result<EndNotifier> {
        if self.behavior == Behavior::FailStart {
            return Err(Error::Playback("stream refused to start".to_string()));
        }

        let (tx, rx) = oneshot::channel();
        self.shared.buffers.lock().unwrap().push(buffer);
        self.shared.pending.lock().unwrap().push(tx);
        Ok(rx)
    }

    fn close(&mut self) -> Result<()> {
        if !self.closed {
            self.closed = true;
            self.shared.closes.fetch_add(1, Ordering::SeqCst);
            self.shared.live.fetch_sub(1, Ordering::SeqCst);
        }
        Ok(())
    }
}
