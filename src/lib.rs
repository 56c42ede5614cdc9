//! Interval Coach - a headless interval-workout timer server
//! 
//! This library provides the interval timer state machine, the background
//! tasks that drive it once per second and play countdown cues, and the HTTP
//! API used to control it.

pub mod api;
pub mod clock;
pub mod config;
pub mod error;
pub mod services;
pub mod state;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use api::create_router;
pub use config::Config;
pub use error::{SoundError, TimerError, VoiceError};
pub use state::AppState;
pub use utils::signals::shutdown_signal;
