//! Background tasks module
//! 
//! This module contains background tasks that run alongside the HTTP server.

pub mod cue_dispatch;
pub mod tick_driver;
pub mod voice_prefetch;

// Re-export main functions
pub use cue_dispatch::cue_dispatch_task;
pub use tick_driver::tick_driver_task;
pub use voice_prefetch::voice_prefetch_task;
