//! Session state shared by the HTTP handlers and background tasks

use std::{
    sync::{Arc, Mutex},
    time::Instant,
};
use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use tracing::{debug, info};

use super::{preset_ms, TimerController, TimerSnapshot, TimerState};
use crate::{
    error::{Result, TimerError},
    events::{FinishedEvent, Subscription},
};

/// One countdown session plus the metadata reported by `/status`
#[derive(Debug)]
pub struct AppState {
    /// The countdown itself
    pub controller: TimerController,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    /// Last action tracking
    pub last_action: Arc<Mutex<Option<String>>>,
    pub last_action_time: Arc<Mutex<Option<DateTime<Utc>>>>,
    /// Most recent natural expiry
    pub last_finished: Arc<Mutex<Option<FinishedEvent>>>,
    /// Finished events re-published for async consumers
    pub finished_tx: broadcast::Sender<FinishedEvent>,
    finished_bridge: Mutex<Option<Subscription>>,
}

impl AppState {
    /// Wrap `controller` and start forwarding its finished events
    pub fn new(controller: TimerController, port: u16, host: String) -> Self {
        let (finished_tx, _) = broadcast::channel(16);
        let last_finished = Arc::new(Mutex::new(None));

        let bridge_tx = finished_tx.clone();
        let bridge_last = Arc::clone(&last_finished);
        let bridge = controller.subscribe(move |duration_ms| {
            let event = FinishedEvent::now(duration_ms);
            if let Ok(mut last) = bridge_last.lock() {
                *last = Some(event);
            }
            // No receivers just means nobody is listening right now
            if bridge_tx.send(event).is_err() {
                debug!("No receivers for finished event");
            }
        });

        Self {
            controller,
            start_time: Instant::now(),
            port,
            host,
            last_action: Arc::new(Mutex::new(None)),
            last_action_time: Arc::new(Mutex::new(None)),
            last_finished,
            finished_tx,
            finished_bridge: Mutex::new(Some(bridge)),
        }
    }

    fn record_action(&self, action: &str) {
        if let Ok(mut last_action) = self.last_action.lock() {
            *last_action = Some(action.to_string());
        }
        if let Ok(mut last_time) = self.last_action_time.lock() {
            *last_time = Some(Utc::now());
        }
    }

    pub fn set_countdown(&self, ms: u64) -> TimerSnapshot {
        self.record_action("countdown");
        self.controller.set_countdown(ms)
    }

    /// Apply one of the preset durations, given in seconds
    pub fn apply_preset(&self, seconds: u64) -> Result<TimerSnapshot> {
        let ms = preset_ms(seconds).ok_or(TimerError::NotAPreset(seconds))?;
        info!("Applying {}s preset", seconds);
        self.record_action("preset");
        Ok(self.controller.set_countdown(ms))
    }

    pub fn start(&self) -> TimerSnapshot {
        self.record_action("start");
        self.controller.start_timer()
    }

    pub fn pause(&self) -> TimerSnapshot {
        self.record_action("pause");
        self.controller.pause_timer()
    }

    pub fn stop(&self) -> TimerSnapshot {
        self.record_action("stop");
        self.controller.stop_timer()
    }

    pub fn enter_edit_mode(&self) -> TimerSnapshot {
        self.record_action("edit-enter");
        self.controller.enter_edit_mode()
    }

    pub fn exit_edit_mode(&self) -> TimerSnapshot {
        self.record_action("edit-exit");
        self.controller.exit_edit_mode()
    }

    /// Start/pause button: pauses a running countdown, starts an idle one.
    /// Unavailable while a duration is being picked.
    pub fn toggle_running(&self) -> Result<TimerSnapshot> {
        match self.controller.state() {
            TimerState::Edit => Err(TimerError::Conflict {
                action: "start or pause",
                state: TimerState::Edit,
            }),
            TimerState::Running => Ok(self.pause()),
            TimerState::Stopped => Ok(self.start()),
        }
    }

    /// Edit button: switches between edit mode and stopped.
    /// Unavailable while the countdown runs.
    pub fn toggle_edit_mode(&self) -> Result<TimerSnapshot> {
        match self.controller.state() {
            TimerState::Running => Err(TimerError::Conflict {
                action: "toggle edit mode",
                state: TimerState::Running,
            }),
            TimerState::Edit => Ok(self.exit_edit_mode()),
            TimerState::Stopped => Ok(self.enter_edit_mode()),
        }
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }

    /// Get last action information
    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        let last_action = self.last_action.lock().ok().and_then(|a| a.clone());
        let last_action_time = self.last_action_time.lock().ok().and_then(|t| *t);
        (last_action, last_action_time)
    }

    pub fn get_last_finished(&self) -> Option<FinishedEvent> {
        self.last_finished.lock().ok().and_then(|f| *f)
    }

    /// Session teardown
    pub fn shutdown(&self) {
        if let Some(bridge) = self.finished_bridge.lock().ok().and_then(|mut b| b.take()) {
            bridge.unsubscribe();
        }
        self.controller.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::TokioScheduler;
    use std::time::Duration;

    fn app_state() -> AppState {
        let scheduler = Arc::new(TokioScheduler::try_current().unwrap());
        AppState::new(TimerController::new(scheduler), 0, "127.0.0.1".to_string())
    }

    #[tokio::test]
    async fn preset_sets_duration() {
        let state = app_state();
        let snapshot = state.apply_preset(30).unwrap();
        assert_eq!(snapshot.duration_ms, 30_000);
        assert_eq!(state.get_last_action().0.as_deref(), Some("preset"));
    }

    #[tokio::test]
    async fn unknown_preset_is_rejected() {
        let state = app_state();
        assert_eq!(state.apply_preset(7), Err(TimerError::NotAPreset(7)));
        assert_eq!(state.controller.duration_ms(), 10_000);
    }

    #[tokio::test]
    async fn toggle_running_alternates() {
        let state = app_state();
        assert_eq!(state.toggle_running().unwrap().state, TimerState::Running);
        assert_eq!(state.toggle_running().unwrap().state, TimerState::Stopped);
    }

    #[tokio::test]
    async fn toggles_respect_each_other() {
        let state = app_state();
        assert_eq!(state.toggle_edit_mode().unwrap().state, TimerState::Edit);
        assert!(matches!(state.toggle_running(), Err(TimerError::Conflict { .. })));

        state.toggle_edit_mode().unwrap();
        state.toggle_running().unwrap();
        assert!(matches!(state.toggle_edit_mode(), Err(TimerError::Conflict { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn finished_events_reach_broadcast_and_status() {
        let state = app_state();
        let mut rx = state.finished_tx.subscribe();

        state.apply_preset(5).unwrap();
        state.start();
        tokio::time::sleep(Duration::from_millis(5_001)).await;

        assert_eq!(rx.recv().await.unwrap().duration_ms, 5_000);
        assert_eq!(state.get_last_finished().map(|f| f.duration_ms), Some(5_000));
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_stops_forwarding() {
        let state = app_state();
        let mut rx = state.finished_tx.subscribe();

        state.apply_preset(5).unwrap();
        state.start();
        state.shutdown();
        tokio::time::sleep(Duration::from_millis(10_000)).await;

        assert!(rx.try_recv().is_err());
        assert_eq!(state.get_last_finished(), None);
    }
}
