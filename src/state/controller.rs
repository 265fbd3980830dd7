//! Countdown controller: the timer state machine
//!
//! ```text
//! Edit --exit_edit_mode--> Stopped
//! Stopped --enter_edit_mode--> Edit
//! Stopped --set_countdown--> Stopped
//! Stopped --start_timer--> Running
//! Running --pause_timer--> Stopped
//! Running --stop_timer--> Stopped            (silent)
//! Running --(deadline reached)--> Stopped    (emits finished event)
//! ```
//!
//! Every tick source is tagged with the generation that was current when it
//! was scheduled. Any cancellation bumps the generation, so a callback that
//! was already in flight when its source got cancelled is recognised as
//! stale and dropped.

use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError, Weak},
    time::Duration,
};
use tokio::sync::watch;
use tracing::{debug, info};

use super::timer_state::{TimerSnapshot, TimerState, DEFAULT_DURATION_MS};
use crate::{
    events::{FinishedEvents, Subscription},
    tasks::scheduler::{CancelHandle, Scheduler},
};

/// Display refresh period while a countdown is running
pub const DEFAULT_TICK_PERIOD: Duration = Duration::from_millis(1000);

#[derive(Debug)]
struct Countdown {
    state: TimerState,
    duration_ms: u64,
    remaining_ms: u64,
    active_tick: Option<CancelHandle>,
    generation: u64,
}

impl Countdown {
    fn new(duration_ms: u64) -> Self {
        Self {
            state: TimerState::Stopped,
            duration_ms,
            remaining_ms: duration_ms,
            active_tick: None,
            generation: 0,
        }
    }

    fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            state: self.state,
            duration_ms: self.duration_ms,
            remaining_ms: self.remaining_ms,
        }
    }

    /// Invalidate the current tick source, live or still being scheduled
    fn cancel_tick(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        if let Some(tick) = self.active_tick.take() {
            tick.cancel();
        }
    }

    /// Leave `Running` (if needed) and enter `state`, keeping remaining time
    fn settle(&mut self, state: TimerState) {
        if self.state.is_running() {
            self.cancel_tick();
        }
        self.state = state;
    }
}

struct Shared {
    countdown: Mutex<Countdown>,
    scheduler: Arc<dyn Scheduler>,
    tick_period: Duration,
    finished: FinishedEvents,
    snapshot_tx: watch::Sender<TimerSnapshot>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Countdown> {
        self.countdown.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Push the current countdown to watchers. Done under the lock so
    /// watchers observe changes in the order they were made.
    fn publish(&self, countdown: &Countdown) -> TimerSnapshot {
        let snapshot = countdown.snapshot();
        self.snapshot_tx.send_replace(snapshot);
        snapshot
    }

    /// Shared end of a countdown: remaining drops to zero and the timer
    /// stops. Listeners only hear about it when `notify` is set.
    fn finish(&self, mut countdown: MutexGuard<'_, Countdown>, notify: bool) -> TimerSnapshot {
        let duration_ms = countdown.duration_ms;
        countdown.cancel_tick();
        countdown.remaining_ms = 0;
        countdown.state = TimerState::Stopped;
        let snapshot = self.publish(&countdown);
        drop(countdown);

        if notify {
            info!("Countdown of {}ms finished", duration_ms);
            self.finished.emit(duration_ms);
        } else {
            info!("Countdown stopped manually");
        }
        snapshot
    }
}

/// Owner of one countdown session. Clones share the same countdown.
#[derive(Clone)]
pub struct TimerController {
    shared: Arc<Shared>,
}

impl TimerController {
    /// Create a controller with the default duration and tick period
    pub fn new(scheduler: Arc<dyn Scheduler>) -> Self {
        Self::with_options(scheduler, DEFAULT_DURATION_MS, DEFAULT_TICK_PERIOD)
    }

    pub fn with_options(scheduler: Arc<dyn Scheduler>, duration_ms: u64, tick_period: Duration) -> Self {
        let countdown = Countdown::new(duration_ms);
        let (snapshot_tx, _) = watch::channel(countdown.snapshot());

        Self {
            shared: Arc::new(Shared {
                countdown: Mutex::new(countdown),
                scheduler,
                tick_period,
                finished: FinishedEvents::new(),
                snapshot_tx,
            }),
        }
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        self.shared.lock().snapshot()
    }

    pub fn state(&self) -> TimerState {
        self.shared.lock().state
    }

    pub fn duration_ms(&self) -> u64 {
        self.shared.lock().duration_ms
    }

    pub fn remaining_ms(&self) -> u64 {
        self.shared.lock().remaining_ms
    }

    pub fn tick_period(&self) -> Duration {
        self.shared.tick_period
    }

    /// Receiver that is pushed a new snapshot on every change
    pub fn watch(&self) -> watch::Receiver<TimerSnapshot> {
        self.shared.snapshot_tx.subscribe()
    }

    /// Listen for natural expiries. The listener receives the duration that
    /// just elapsed.
    ///
    /// A listener that captures a clone of this controller keeps it alive
    /// through a reference cycle until [`shutdown`](Self::shutdown) clears
    /// the listeners.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(u64) + Send + Sync + 'static,
    {
        self.shared.finished.subscribe(listener)
    }

    /// Replace the duration and reset the countdown to it. Silent.
    pub fn set_countdown(&self, ms: u64) -> TimerSnapshot {
        let mut countdown = self.shared.lock();
        countdown.cancel_tick();
        countdown.duration_ms = ms;
        countdown.remaining_ms = ms;
        countdown.state = TimerState::Stopped;
        info!("Countdown set to {}ms", ms);
        self.shared.publish(&countdown)
    }

    /// Start counting down from the remaining time, or from the full
    /// duration if nothing is left. Returns immediately.
    pub fn start_timer(&self) -> TimerSnapshot {
        let (generation, total) = {
            let mut countdown = self.shared.lock();
            if countdown.state.is_running() {
                debug!("Start ignored: countdown already running");
                return countdown.snapshot();
            }
            if countdown.remaining_ms == 0 {
                countdown.remaining_ms = countdown.duration_ms;
            }
            countdown.cancel_tick();
            countdown.state = TimerState::Running;
            self.shared.publish(&countdown);
            info!("Countdown started with {}ms remaining", countdown.remaining_ms);
            (countdown.generation, Duration::from_millis(countdown.remaining_ms))
        };

        // Scheduled without the lock held so a scheduler that fires right
        // away cannot deadlock against us.
        let tick_shared = Arc::downgrade(&self.shared);
        let done_shared = Arc::downgrade(&self.shared);
        let handle = self.shared.scheduler.schedule(
            self.shared.tick_period,
            total,
            Box::new(move |remaining| on_tick(&tick_shared, generation, remaining)),
            Box::new(move || on_done(&done_shared, generation)),
        );

        let mut countdown = self.shared.lock();
        let snapshot = countdown.snapshot();
        if countdown.generation == generation && countdown.state.is_running() {
            countdown.active_tick = Some(handle);
        } else {
            drop(countdown);
            debug!("Countdown superseded while scheduling, cancelling its ticker");
            handle.cancel();
        }
        snapshot
    }

    /// Freeze the countdown at its last observed remaining time. Silent.
    pub fn pause_timer(&self) -> TimerSnapshot {
        let mut countdown = self.shared.lock();
        if !countdown.state.is_running() {
            debug!("Pause ignored: countdown is {:?}", countdown.state);
            return countdown.snapshot();
        }
        countdown.settle(TimerState::Stopped);
        info!("Countdown paused with {}ms remaining", countdown.remaining_ms);
        self.shared.publish(&countdown)
    }

    /// Abort the countdown: remaining drops to zero, no finished event.
    /// Nothing happens when no countdown is running.
    pub fn stop_timer(&self) -> TimerSnapshot {
        let countdown = self.shared.lock();
        if !countdown.state.is_running() {
            debug!("Stop ignored: countdown is {:?}", countdown.state);
            return countdown.snapshot();
        }
        self.shared.finish(countdown, false)
    }

    pub fn enter_edit_mode(&self) -> TimerSnapshot {
        let mut countdown = self.shared.lock();
        countdown.settle(TimerState::Edit);
        info!("Entered edit mode");
        self.shared.publish(&countdown)
    }

    pub fn exit_edit_mode(&self) -> TimerSnapshot {
        let mut countdown = self.shared.lock();
        countdown.settle(TimerState::Stopped);
        info!("Exited edit mode");
        self.shared.publish(&countdown)
    }

    /// Session teardown: cancel any running countdown and drop every
    /// finished-event listener.
    pub fn shutdown(&self) {
        {
            let mut countdown = self.shared.lock();
            if countdown.state.is_running() {
                countdown.settle(TimerState::Stopped);
                self.shared.publish(&countdown);
            }
        }
        self.shared.finished.clear();
        info!("Timer controller shut down");
    }
}

impl std::fmt::Debug for TimerController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerController")
            .field("countdown", &*self.shared.lock())
            .field("tick_period", &self.shared.tick_period)
            .finish()
    }
}

fn on_tick(shared: &Weak<Shared>, generation: u64, remaining: Duration) {
    let Some(shared) = shared.upgrade() else {
        return;
    };
    let mut countdown = shared.lock();
    if countdown.generation != generation || !countdown.state.is_running() {
        debug!("Discarding tick from a cancelled countdown");
        return;
    }

    let remaining_ms = u64::try_from(remaining.as_millis()).unwrap_or(u64::MAX);
    countdown.remaining_ms = remaining_ms.min(countdown.duration_ms);
    debug!("Countdown tick: {}ms remaining", countdown.remaining_ms);
    shared.publish(&countdown);
}

fn on_done(shared: &Weak<Shared>, generation: u64) {
    let Some(shared) = shared.upgrade() else {
        return;
    };
    let countdown = shared.lock();
    if countdown.generation != generation || !countdown.state.is_running() {
        debug!("Discarding completion from a cancelled countdown");
        return;
    }
    shared.finish(countdown, true);
}
