//! Playback state management

/// Playback session state
///
/// `Idle → Decoding → Playing → (Ended | Failed) → Idle`. The terminal
/// states are published for observers and immediately followed by `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Idle,
    Decoding,
    Playing,
    Ended,
    Failed,
}

impl PlaybackState {
    /// A session is in flight; new play requests are rejected
    pub fn is_active(&self) -> bool {
        matches!(self, PlaybackState::Decoding | PlaybackState::Playing)
    }
}

impl std::fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaybackState::Idle => write!(f, "idle"),
            PlaybackState::Decoding => write!(f, "decoding"),
            PlaybackState::Playing => write!(f, "playing"),
            PlaybackState::Ended => write!(f, "ended"),
            PlaybackState::Failed => write!(f, "failed"),
        }
    }
}
