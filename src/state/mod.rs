//! State management module
//! 
//! This module contains the interval timer state machine and the shared
//! application state that serializes access to it.

pub mod app_state;
pub mod cue;
pub mod timer_state;

// Re-export main types
pub use app_state::{AppState, CueReceiver, RunSignal};
pub use cue::{Cue, ToneKind};
pub use timer_state::{
    effective_time_in_cycle, Phase, TickOutcome, TimerConfiguration, TimerSnapshot, TimerState,
};
