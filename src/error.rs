//! Error types shared across the timer core, cue services and HTTP layer

use thiserror::Error;

use crate::state::Phase;

/// Errors raised by timer operations
///
/// `tick()` never produces one of these; only user-driven transitions can fail.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimerError {
    /// Interval duration must be at least one second
    #[error("interval must be at least 1 second, got {0}")]
    InvalidInterval(i64),

    /// Operation is not allowed from the current phase
    #[error("cannot {action} while {phase}")]
    InvalidTransition { action: &'static str, phase: Phase },

    /// Request body could not be read as an interval
    #[error("invalid request body: {0}")]
    InvalidRequest(String),

    /// A paused session can only resume with the interval it was started with
    #[error("paused session uses a {current}s interval, got {requested}s")]
    IntervalMismatch { current: u64, requested: u64 },

    /// The timer lock was poisoned by a panicking holder
    #[error("timer state unavailable: {0}")]
    StatePoisoned(String),
}

/// Errors from the voice cue provider
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VoiceError {
    /// No provider endpoint is configured
    #[error("voice provider unavailable")]
    Unavailable,

    /// The request could not be sent or the response could not be read
    #[error("voice request failed: {0}")]
    Request(String),

    /// The provider answered with a non-success status
    #[error("voice provider returned status {0}")]
    Status(u16),

    /// The provider answered with no audio
    #[error("voice provider returned an empty asset for {0:?}")]
    EmptyAsset(String),
}

/// Errors from the audio output handle
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SoundError {
    /// Asset could not be decoded or played
    #[error("playback failed: {0}")]
    PlaybackFailed(String),

    /// No audio output device available
    #[error("audio device not available: {0}")]
    DeviceNotAvailable(String),
}

impl From<reqwest::Error> for VoiceError {
    fn from(e: reqwest::Error) -> Self {
        VoiceError::Request(e.to_string())
    }
}
