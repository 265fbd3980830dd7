//! Background tasks module
//!
//! This module contains the countdown scheduler and the tasks that run
//! alongside the HTTP server.

pub mod countdown_ticker;
pub mod finished_notifier;
pub mod scheduler;

// Re-export main types and functions
pub use countdown_ticker::{countdown_ticker_task, TokioScheduler};
pub use finished_notifier::finished_notifier_task;
pub use scheduler::{CancelHandle, DoneCallback, Scheduler, TickCallback};
