//! Session events and the publish/subscribe bus.
//!
//! Three events exist: `stateChange`, `scoreUpdate` and `gameOver`. Delivery is
//! synchronous: `emit` calls every listener currently subscribed to the event's
//! kind, in subscription order, before returning.
//!
//! ## Callback identity
//!
//! Listeners are shared handles (`Arc`). Unsubscribing requires the same
//! handle that was subscribed; two closures with identical bodies are
//! different listeners.
//!
//! ```
//! use std::sync::atomic::{AtomicU64, Ordering};
//! use std::sync::Arc;
//! use arcade_hub::adapter::{listener, EventBus, EventKind, GameEvent};
//!
//! let seen = Arc::new(AtomicU64::new(0));
//! let sink = seen.clone();
//! let on_score = listener(move |event| {
//!     if let GameEvent::ScoreUpdate(score) = event {
//!         sink.store(*score, Ordering::SeqCst);
//!     }
//! });
//!
//! let mut bus = EventBus::new();
//! bus.subscribe(EventKind::ScoreUpdate, on_score.clone());
//! bus.emit(&GameEvent::ScoreUpdate(30));
//! assert_eq!(seen.load(Ordering::SeqCst), 30);
//!
//! assert!(bus.unsubscribe(EventKind::ScoreUpdate, &on_score));
//! bus.emit(&GameEvent::ScoreUpdate(40));
//! assert_eq!(seen.load(Ordering::SeqCst), 30);
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::lifecycle::GameState;
use super::stats::GameStats;

/// Event names a listener can subscribe to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventKind {
    StateChange,
    ScoreUpdate,
    GameOver,
}

/// An event emitted by a game session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum GameEvent {
    /// The session moved to a new lifecycle state.
    StateChange(GameState),
    /// The score changed; carries the new total.
    ScoreUpdate(u64),
    /// The session reached its terminal outcome; carries final stats.
    GameOver(GameStats),
}

impl GameEvent {
    /// The kind this event is delivered under.
    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self {
            GameEvent::StateChange(_) => EventKind::StateChange,
            GameEvent::ScoreUpdate(_) => EventKind::ScoreUpdate,
            GameEvent::GameOver(_) => EventKind::GameOver,
        }
    }
}

/// A subscribed callback.
pub type Listener = Arc<dyn Fn(&GameEvent) + Send + Sync>;

/// Wrap a closure as a [`Listener`] handle.
pub fn listener<F>(f: F) -> Listener
where
    F: Fn(&GameEvent) + Send + Sync + 'static,
{
    Arc::new(f)
}

fn same_listener(a: &Listener, b: &Listener) -> bool {
    // Compare data pointers only; vtable pointers are not guaranteed unique.
    std::ptr::eq(Arc::as_ptr(a).cast::<()>(), Arc::as_ptr(b).cast::<()>())
}

/// Minimal typed publish/subscribe bus owned by one session.
#[derive(Default)]
pub struct EventBus {
    listeners: Vec<(EventKind, Listener)>,
}

impl EventBus {
    /// Create an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe a listener to an event kind.
    ///
    /// Subscribing the same handle twice to the same kind has no effect.
    pub fn subscribe(&mut self, kind: EventKind, listener: Listener) {
        let already = self
            .listeners
            .iter()
            .any(|(k, l)| *k == kind && same_listener(l, &listener));
        if !already {
            self.listeners.push((kind, listener));
        }
    }

    /// Remove a listener. Returns `false` if that exact handle was not subscribed.
    pub fn unsubscribe(&mut self, kind: EventKind, listener: &Listener) -> bool {
        let before = self.listeners.len();
        self.listeners
            .retain(|(k, l)| !(*k == kind && same_listener(l, listener)));
        self.listeners.len() != before
    }

    /// Deliver an event to every listener of its kind, in subscription order.
    pub fn emit(&self, event: &GameEvent) {
        let kind = event.kind();
        for (_, listener) in self.listeners.iter().filter(|(k, _)| *k == kind) {
            listener(event);
        }
    }

    /// Number of listeners subscribed to a kind.
    #[must_use]
    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.listeners.iter().filter(|(k, _)| *k == kind).count()
    }

    /// Drop every listener.
    pub fn clear(&mut self) {
        self.listeners.clear();
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn recorder(log: &Arc<Mutex<Vec<String>>>, tag: &'static str) -> Listener {
        let log = log.clone();
        listener(move |event| {
            log.lock().unwrap().push(format!("{tag}:{:?}", event.kind()));
        })
    }

    #[test]
    fn test_delivery_in_subscription_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut bus = EventBus::new();
        bus.subscribe(EventKind::StateChange, recorder(&log, "a"));
        bus.subscribe(EventKind::StateChange, recorder(&log, "b"));
        bus.subscribe(EventKind::ScoreUpdate, recorder(&log, "c"));

        bus.emit(&GameEvent::StateChange(GameState::Ready));

        assert_eq!(
            *log.lock().unwrap(),
            vec!["a:StateChange".to_string(), "b:StateChange".to_string()]
        );
    }

    #[test]
    fn test_unsubscribe_requires_same_handle() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut bus = EventBus::new();
        let first = recorder(&log, "x");
        let lookalike = recorder(&log, "x");

        bus.subscribe(EventKind::ScoreUpdate, first.clone());
        assert!(!bus.unsubscribe(EventKind::ScoreUpdate, &lookalike));
        assert!(!bus.unsubscribe(EventKind::GameOver, &first));
        assert_eq!(bus.listener_count(EventKind::ScoreUpdate), 1);

        assert!(bus.unsubscribe(EventKind::ScoreUpdate, &first));
        assert_eq!(bus.listener_count(EventKind::ScoreUpdate), 0);
    }

    #[test]
    fn test_duplicate_subscription_ignored() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut bus = EventBus::new();
        let handle = recorder(&log, "dup");

        bus.subscribe(EventKind::ScoreUpdate, handle.clone());
        bus.subscribe(EventKind::ScoreUpdate, handle);
        bus.emit(&GameEvent::ScoreUpdate(1));

        assert_eq!(log.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_event_kind() {
        assert_eq!(GameEvent::ScoreUpdate(3).kind(), EventKind::ScoreUpdate);
        assert_eq!(
            GameEvent::StateChange(GameState::Exit).kind(),
            EventKind::StateChange
        );
    }
}
