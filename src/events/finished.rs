//! Finished-event broadcasting
//!
//! Listeners are keyed by a monotonically increasing id, so iterating the
//! map visits them in registration order. Emission works on a copy of the
//! listener list, which lets a listener unsubscribe itself (or others)
//! while an emission is in flight.

use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError, Weak},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Callback receiving the duration (ms) of the countdown that just finished
pub type FinishedListener = Arc<dyn Fn(u64) + Send + Sync + 'static>;

/// A countdown that ran to its natural end
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinishedEvent {
    pub duration_ms: u64,
    pub finished_at: DateTime<Utc>,
}

impl FinishedEvent {
    pub fn now(duration_ms: u64) -> Self {
        Self {
            duration_ms,
            finished_at: Utc::now(),
        }
    }

    /// Text shown to the user when the countdown is over
    pub fn message(&self) -> String {
        format!("Duration: {} seconds", self.duration_ms / 1000)
    }
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    listeners: BTreeMap<u64, FinishedListener>,
}

/// Subscriber list for finished events
#[derive(Clone, Default)]
pub struct FinishedEvents {
    registry: Arc<Mutex<Registry>>,
}

impl FinishedEvents {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener. It stays registered until the returned
    /// [`Subscription`] is explicitly unsubscribed or [`clear`](Self::clear)
    /// is called.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(u64) + Send + Sync + 'static,
    {
        let mut registry = lock(&self.registry);
        let id = registry.next_id;
        registry.next_id += 1;
        registry.listeners.insert(id, Arc::new(listener));
        debug!("Finished listener {} subscribed", id);

        Subscription {
            id,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Deliver `duration_ms` to every current listener, in registration order
    pub fn emit(&self, duration_ms: u64) {
        let listeners: Vec<FinishedListener> = lock(&self.registry)
            .listeners
            .values()
            .cloned()
            .collect();
        debug!("Emitting finished event to {} listeners", listeners.len());

        for listener in listeners {
            listener(duration_ms);
        }
    }

    /// Drop every listener
    pub fn clear(&self) {
        lock(&self.registry).listeners.clear();
    }
}

/// Handle to a registered listener
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    registry: Weak<Mutex<Registry>>,
}

impl Subscription {
    /// Remove the listener. Returns false if it was already gone.
    pub fn unsubscribe(self) -> bool {
        match self.registry.upgrade() {
            Some(registry) => {
                let removed = lock(&registry).listeners.remove(&self.id).is_some();
                debug!("Finished listener {} unsubscribed", self.id);
                removed
            }
            None => false,
        }
    }
}

fn lock(registry: &Mutex<Registry>) -> MutexGuard<'_, Registry> {
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recording(events: &FinishedEvents, tag: &'static str, log: &Arc<Mutex<Vec<String>>>) -> Subscription {
        let log = Arc::clone(log);
        events.subscribe(move |ms| log.lock().unwrap().push(format!("{tag}:{ms}")))
    }

    #[test]
    fn emits_in_registration_order() {
        let events = FinishedEvents::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let _a = recording(&events, "a", &log);
        let _b = recording(&events, "b", &log);
        let _c = recording(&events, "c", &log);

        events.emit(5000);

        assert_eq!(*log.lock().unwrap(), vec!["a:5000", "b:5000", "c:5000"]);
    }

    #[test]
    fn unsubscribed_listener_is_not_called() {
        let events = FinishedEvents::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let a = recording(&events, "a", &log);
        let _b = recording(&events, "b", &log);

        assert!(a.unsubscribe());
        events.emit(30_000);

        assert_eq!(*log.lock().unwrap(), vec!["b:30000"]);
    }

    #[test]
    fn dropping_subscription_keeps_listener() {
        let events = FinishedEvents::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        drop(recording(&events, "a", &log));

        events.emit(1000);
        assert_eq!(*log.lock().unwrap(), vec!["a:1000"]);
    }

    #[test]
    fn listener_can_unsubscribe_during_emission() {
        let events = FinishedEvents::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));

        let own = Arc::clone(&slot);
        let first_log = Arc::clone(&log);
        let first = events.subscribe(move |ms| {
            first_log.lock().unwrap().push(format!("once:{ms}"));
            if let Some(subscription) = own.lock().unwrap().take() {
                subscription.unsubscribe();
            }
        });
        *slot.lock().unwrap() = Some(first);
        let _second = recording(&events, "always", &log);

        events.emit(5000);
        events.emit(60_000);

        assert_eq!(
            *log.lock().unwrap(),
            vec!["once:5000", "always:5000", "always:60000"]
        );
    }

    #[test]
    fn late_subscriber_sees_no_past_events() {
        let events = FinishedEvents::new();
        events.emit(5000);

        let log = Arc::new(Mutex::new(Vec::new()));
        let _late = recording(&events, "late", &log);
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn clear_removes_everyone() {
        let events = FinishedEvents::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let a = recording(&events, "a", &log);

        events.clear();
        events.emit(5000);

        assert!(log.lock().unwrap().is_empty());
        assert!(!a.unsubscribe());
    }

    #[test]
    fn message_reports_whole_seconds() {
        assert_eq!(FinishedEvent::now(100_000).message(), "Duration: 100 seconds");
    }
}
