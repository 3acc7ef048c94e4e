//! Playback session orchestration

pub mod orchestrator;
pub mod state;

pub use orchestrator::{PlayOutcome, PlaybackHandle, PlaybackOrchestrator};
pub use state::PlaybackState;
