//! Timer state and the observable snapshot published to watchers

use serde::{Deserialize, Serialize};

/// Default countdown length for a fresh session
pub const DEFAULT_DURATION_MS: u64 = 10_000;

/// Mode the countdown is in. Exactly one holds at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    /// A preset duration is being picked; nothing is counting down
    Edit,
    /// Idle, holding a remaining-time value
    Stopped,
    /// Counting down
    Running,
}

impl TimerState {
    pub fn is_running(&self) -> bool {
        matches!(self, TimerState::Running)
    }
}

/// Point-in-time view of a countdown, pushed to watchers on every change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    pub state: TimerState,
    pub duration_ms: u64,
    pub remaining_ms: u64,
}

impl TimerSnapshot {
    /// Create the initial snapshot of a session
    pub fn new(duration_ms: u64) -> Self {
        Self {
            state: TimerState::Stopped,
            duration_ms,
            remaining_ms: duration_ms,
        }
    }

    /// Fraction of the duration still left, in `[0, 1]`
    pub fn progress(&self) -> f64 {
        if self.duration_ms == 0 {
            return 0.0;
        }
        self.remaining_ms.min(self.duration_ms) as f64 / self.duration_ms as f64
    }

    /// Remaining time as `seconds.millis`, e.g. `7.250`
    pub fn label(&self) -> String {
        format!("{}.{:03}", self.remaining_ms / 1000, self.remaining_ms % 1000)
    }
}

impl Default for TimerSnapshot {
    fn default() -> Self {
        Self::new(DEFAULT_DURATION_MS)
    }
}
