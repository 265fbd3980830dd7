//! Countdown Timer - a countdown state machine with an HTTP control surface
//!
//! This library provides a timer controller that counts down a chosen
//! duration on a cancellable periodic scheduler, publishes its state to
//! watchers, and broadcasts a one-shot event when a countdown runs out.

pub mod config;
pub mod error;
pub mod events;
pub mod state;
pub mod api;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use error::TimerError;
pub use events::{FinishedEvent, FinishedEvents, Subscription};
pub use state::{AppState, TimerController, TimerSnapshot, TimerState};
pub use api::create_router;
pub use tasks::{Scheduler, TokioScheduler};
pub use utils::signals::shutdown_signal;
