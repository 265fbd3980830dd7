//! Countdown ticker background task backed by tokio timers

use std::time::Duration;
use tokio::{
    runtime::{Handle, TryCurrentError},
    time::{interval_at, sleep_until, Instant, MissedTickBehavior},
};
use tracing::debug;

use super::scheduler::{CancelHandle, DoneCallback, Scheduler, TickCallback};

/// [`Scheduler`] that runs each countdown as a task on a tokio runtime
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    runtime: Handle,
}

impl TokioScheduler {
    pub fn new(runtime: Handle) -> Self {
        Self { runtime }
    }

    /// Use the runtime the caller is running on
    pub fn try_current() -> Result<Self, TryCurrentError> {
        Handle::try_current().map(Self::new)
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(
        &self,
        period: Duration,
        total: Duration,
        on_tick: TickCallback,
        on_done: DoneCallback,
    ) -> CancelHandle {
        let task = self
            .runtime
            .spawn(countdown_ticker_task(period, total, on_tick, on_done));
        CancelHandle::new(move || task.abort())
    }
}

/// Tick every `period` until `total` has elapsed, then finish.
///
/// The deadline wins over a tick that becomes ready at the same instant so
/// the last observed remaining time before completion is never zero.
pub async fn countdown_ticker_task(
    period: Duration,
    total: Duration,
    mut on_tick: TickCallback,
    on_done: DoneCallback,
) {
    // A zero period would make the interval panic
    let period = period.max(Duration::from_millis(1));
    let start = Instant::now();
    let deadline = start + total;
    debug!("Countdown ticker started: total={:?}, period={:?}", total, period);

    let mut ticks = interval_at(start + period, period);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let expiry = sleep_until(deadline);
    tokio::pin!(expiry);

    loop {
        tokio::select! {
            biased;

            _ = &mut expiry => {
                debug!("Countdown ticker reached its deadline");
                on_done();
                break;
            }

            _ = ticks.tick() => {
                let remaining = deadline.saturating_duration_since(Instant::now());
                on_tick(remaining);
            }
        }
    }
}
