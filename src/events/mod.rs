//! Event publishing module
//!
//! This module contains the one-shot "finished" notification machinery.

pub mod finished;

// Re-export main types
pub use finished::{FinishedEvent, FinishedEvents, FinishedListener, Subscription};
