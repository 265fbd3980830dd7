//! State management module
//!
//! This module contains the countdown state machine and the session state
//! built around it.

pub mod app_state;
pub mod controller;
pub mod presets;
pub mod timer_state;

// Re-export main types
pub use app_state::AppState;
pub use controller::{TimerController, DEFAULT_TICK_PERIOD};
pub use presets::{preset_ms, PRESET_SECONDS};
pub use timer_state::{TimerSnapshot, TimerState, DEFAULT_DURATION_MS};
