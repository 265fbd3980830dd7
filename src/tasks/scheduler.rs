//! Cancellable periodic scheduling capability
//!
//! The controller only ever talks to a [`Scheduler`]. The production
//! implementation lives in [`super::countdown_ticker`]; tests can supply
//! their own to drive callbacks by hand.

use std::{fmt, time::Duration};

/// Called on every tick with the time left until the deadline
pub type TickCallback = Box<dyn FnMut(Duration) + Send + 'static>;

/// Called once when the deadline is reached
pub type DoneCallback = Box<dyn FnOnce() + Send + 'static>;

/// A source of periodic callbacks ending in a final completion callback
pub trait Scheduler: Send + Sync {
    /// Schedule `on_tick` every `period` until `total` has elapsed, then
    /// call `on_done`. No callback may run after the returned handle is
    /// cancelled or dropped.
    fn schedule(
        &self,
        period: Duration,
        total: Duration,
        on_tick: TickCallback,
        on_done: DoneCallback,
    ) -> CancelHandle;
}

/// Ownership of one scheduled tick source. Cancels it on drop.
pub struct CancelHandle {
    cancel: Option<Box<dyn FnOnce() + Send + 'static>>,
}

impl CancelHandle {
    /// `cancel` may run while the owner holds its own locks, so it must
    /// not call back into whoever scheduled the source.
    pub fn new<F>(cancel: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Stop the tick source
    pub fn cancel(mut self) {
        self.run_cancel();
    }

    fn run_cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for CancelHandle {
    fn drop(&mut self) {
        self.run_cancel();
    }
}

impl fmt::Debug for CancelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelHandle")
            .field("armed", &self.cancel.is_some())
            .finish()
    }
}
