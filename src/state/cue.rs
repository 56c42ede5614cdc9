//! Countdown cue vocabulary

use serde::{Deserialize, Serialize};

/// Cue fired when the remaining time in an interval hits a threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cue {
    Five,
    Four,
    Three,
    Two,
    One,
    /// Interval boundary reached, next interval begins
    Next,
}

/// Fallback tone shape used when no voice asset is available
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToneKind {
    /// Short high beep for the 5..1 countdown
    Countdown,
    /// Longer, higher beep for the interval boundary
    IntervalComplete,
}

impl Cue {
    /// Every cue, in the order they fire within an interval
    pub const ALL: [Cue; 6] = [Cue::Five, Cue::Four, Cue::Three, Cue::Two, Cue::One, Cue::Next];

    /// Map seconds remaining in the interval to its cue, if it is a threshold
    pub fn from_remaining(seconds: u64) -> Option<Self> {
        match seconds {
            5 => Some(Cue::Five),
            4 => Some(Cue::Four),
            3 => Some(Cue::Three),
            2 => Some(Cue::Two),
            1 => Some(Cue::One),
            0 => Some(Cue::Next),
            _ => None,
        }
    }

    /// Text handed to the voice provider
    pub fn label(&self) -> &'static str {
        match self {
            Cue::Five => "Five",
            Cue::Four => "Four",
            Cue::Three => "Three",
            Cue::Two => "Two",
            Cue::One => "One",
            Cue::Next => "Next",
        }
    }

    pub fn tone(&self) -> ToneKind {
        match self {
            Cue::Next => ToneKind::IntervalComplete,
            _ => ToneKind::Countdown,
        }
    }
}
