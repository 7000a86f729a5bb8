//! Shared lifecycle bookkeeping embedded by every game.
//!
//! `SessionCore` owns the lifecycle state, score, event bus, play-time
//! accounting and (for time-driven games) the tick loop. Games embed one and
//! expose it through [`GameAdapter::session`](super::GameAdapter::session);
//! the trait's provided methods implement the contract on top of it.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::core::{Clock, SessionConfig, SystemClock};

use super::events::{EventBus, EventKind, GameEvent, Listener};
use super::lifecycle::GameState;
use super::snapshot::CoreSnapshot;
use super::tick::TickLoop;

/// Lifecycle state machine plus score and events for one session.
#[derive(Debug)]
pub struct SessionCore {
    game_id: &'static str,
    state: GameState,
    score: u64,
    config: SessionConfig,
    events: EventBus,
    clock: Arc<dyn Clock>,
    ticks: Option<TickLoop>,
    played: Duration,
    segment_start: Option<DateTime<Utc>>,
}

impl SessionCore {
    /// Create a session in `Init` using the system clock.
    #[must_use]
    pub fn new(game_id: &'static str) -> Self {
        Self {
            game_id,
            state: GameState::Init,
            score: 0,
            config: SessionConfig::default(),
            events: EventBus::new(),
            clock: Arc::new(SystemClock),
            ticks: None,
            played: Duration::ZERO,
            segment_start: None,
        }
    }

    /// Use a different clock (tests drive a `ManualClock`).
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Attach a tick loop; it is armed only while `Playing`.
    #[must_use]
    pub fn with_ticks(mut self, interval: Duration) -> Self {
        self.ticks = Some(TickLoop::new(interval));
        self
    }

    // === Accessors ===

    #[must_use]
    pub fn game_id(&self) -> &'static str {
        self.game_id
    }

    #[must_use]
    pub fn state(&self) -> GameState {
        self.state
    }

    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.state == GameState::Playing
    }

    #[must_use]
    pub fn score(&self) -> u64 {
        self.score
    }

    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The tick loop, for time-driven games.
    #[must_use]
    pub fn ticks(&self) -> Option<&TickLoop> {
        self.ticks.as_ref()
    }

    pub fn ticks_mut(&mut self) -> Option<&mut TickLoop> {
        self.ticks.as_mut()
    }

    /// Seconds of play since `start()`, frozen while not playing.
    #[must_use]
    pub fn time_elapsed(&self) -> f64 {
        self.played_total().as_secs_f64()
    }

    fn played_total(&self) -> Duration {
        let running = self
            .segment_start
            .and_then(|since| (self.clock.now() - since).to_std().ok())
            .unwrap_or(Duration::ZERO);
        self.played + running
    }

    // === Events ===

    pub fn subscribe(&mut self, kind: EventKind, listener: Listener) {
        self.events.subscribe(kind, listener);
    }

    pub fn unsubscribe(&mut self, kind: EventKind, listener: &Listener) -> bool {
        self.events.unsubscribe(kind, listener)
    }

    pub fn emit(&self, event: &GameEvent) {
        self.events.emit(event);
    }

    // === Transitions ===

    /// `init` step one: apply configuration and enter `Loading`.
    ///
    /// Returns `false` (no change) when the current state does not accept init.
    pub fn begin_loading(&mut self, config: SessionConfig) -> bool {
        if !self.state.accepts_init() {
            return false;
        }

        self.config = config;
        self.score = 0;
        self.played = Duration::ZERO;
        self.segment_start = None;
        if let Some(ticks) = self.ticks.as_mut() {
            ticks.teardown();
        }
        self.transition(GameState::Loading);
        true
    }

    /// `init` step two: setup finished, enter `Ready`.
    pub fn finish_loading(&mut self) {
        if self.state == GameState::Loading {
            self.transition(GameState::Ready);
        }
    }

    /// `Ready → Playing`. Arms the tick loop.
    pub fn start(&mut self) -> bool {
        if self.state != GameState::Ready {
            return false;
        }
        self.transition(GameState::Playing);
        if let Some(ticks) = self.ticks.as_mut() {
            ticks.arm();
        }
        true
    }

    /// `Playing → Paused`. Disarms the tick loop before the state changes.
    pub fn pause(&mut self) -> bool {
        if self.state != GameState::Playing {
            return false;
        }
        if let Some(ticks) = self.ticks.as_mut() {
            ticks.disarm();
        }
        self.transition(GameState::Paused);
        true
    }

    /// `Paused → Playing`. Re-arms the tick loop.
    pub fn resume(&mut self) -> bool {
        if self.state != GameState::Paused {
            return false;
        }
        self.transition(GameState::Playing);
        if let Some(ticks) = self.ticks.as_mut() {
            ticks.arm();
        }
        true
    }

    /// `Playing → Ready` without ending the session (Pong after a point).
    pub fn back_to_ready(&mut self) -> bool {
        if self.state != GameState::Playing {
            return false;
        }
        if let Some(ticks) = self.ticks.as_mut() {
            ticks.teardown();
        }
        self.transition(GameState::Ready);
        true
    }

    /// Enter `Finished`. Returns `false` if the session was already over,
    /// in which case the caller must not emit `gameOver`.
    pub fn conclude(&mut self) -> bool {
        if self.state.is_over() {
            return false;
        }
        if let Some(ticks) = self.ticks.as_mut() {
            ticks.teardown();
        }
        self.transition(GameState::Finished);
        true
    }

    /// Enter `Exit` from any state.
    pub fn destroy(&mut self) {
        if self.state == GameState::Exit {
            return;
        }
        if let Some(ticks) = self.ticks.as_mut() {
            ticks.teardown();
        }
        self.transition(GameState::Exit);
    }

    fn transition(&mut self, next: GameState) {
        let now = self.clock.now();
        if self.state == GameState::Playing && next != GameState::Playing {
            if let Some(since) = self.segment_start.take() {
                self.played += (now - since).to_std().unwrap_or(Duration::ZERO);
            }
        }
        if next == GameState::Playing && self.state != GameState::Playing {
            self.segment_start = Some(now);
        }

        tracing::debug!(game = self.game_id, from = %self.state, to = %next, "state change");
        self.state = next;
        self.events.emit(&GameEvent::StateChange(next));
    }

    // === Score ===

    /// Add points and emit `scoreUpdate` with the new total.
    pub fn add_score(&mut self, points: u64) {
        self.score = self.score.saturating_add(points);
        self.events.emit(&GameEvent::ScoreUpdate(self.score));
    }

    // === Snapshots ===

    /// Capture the shared fields.
    #[must_use]
    pub fn snapshot(&self) -> CoreSnapshot {
        let played_ms = u64::try_from(self.played_total().as_millis()).unwrap_or(u64::MAX);

        CoreSnapshot {
            state: Some(self.state),
            score: Some(self.score),
            played_ms: Some(played_ms),
            difficulty: Some(self.config.difficulty),
        }
    }

    /// Overlay the shared fields present in `snapshot`.
    ///
    /// A restored `Playing` state becomes `Paused`; see [`GameState::restorable`].
    pub fn restore(&mut self, snapshot: &CoreSnapshot) {
        if let Some(score) = snapshot.score {
            self.score = score;
        }
        if let Some(difficulty) = snapshot.difficulty {
            self.config.difficulty = difficulty;
        }
        if let Some(ms) = snapshot.played_ms {
            self.played = Duration::from_millis(ms);
            self.segment_start = self.is_playing().then(|| self.clock.now());
        }
        if let Some(next) = snapshot.state.and_then(GameState::restorable) {
            if next != self.state {
                if let Some(ticks) = self.ticks.as_mut() {
                    ticks.disarm();
                }
                self.transition(next);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ManualClock;
    use std::sync::Mutex;

    fn recorded_states(core: &mut SessionCore) -> Arc<Mutex<Vec<GameState>>> {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = log.clone();
        core.subscribe(
            EventKind::StateChange,
            super::super::events::listener(move |event| {
                if let GameEvent::StateChange(state) = event {
                    sink.lock().unwrap().push(*state);
                }
            }),
        );
        log
    }

    #[test]
    fn test_full_lifecycle_emits_each_transition() {
        let mut core = SessionCore::new("test");
        let log = recorded_states(&mut core);

        assert!(core.begin_loading(SessionConfig::default()));
        core.finish_loading();
        assert!(core.start());
        assert!(core.pause());
        assert!(core.resume());
        assert!(core.conclude());
        core.destroy();

        assert_eq!(
            *log.lock().unwrap(),
            vec![
                GameState::Loading,
                GameState::Ready,
                GameState::Playing,
                GameState::Paused,
                GameState::Playing,
                GameState::Finished,
                GameState::Exit,
            ]
        );
    }

    #[test]
    fn test_illegal_transitions_are_silent() {
        let mut core = SessionCore::new("test");
        let log = recorded_states(&mut core);

        assert!(!core.start());
        assert!(!core.pause());
        assert!(!core.resume());
        assert_eq!(core.state(), GameState::Init);
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn test_conclude_is_idempotent() {
        let mut core = SessionCore::new("test");
        core.begin_loading(SessionConfig::default());
        core.finish_loading();
        core.start();

        assert!(core.conclude());
        assert!(!core.conclude());
        core.destroy();
        assert!(!core.conclude());
    }

    #[test]
    fn test_play_time_freezes_while_paused() {
        let clock = Arc::new(ManualClock::starting_now());
        let mut core = SessionCore::new("test").with_clock(clock.clone());
        core.begin_loading(SessionConfig::default());
        core.finish_loading();

        clock.advance(chrono::Duration::seconds(5));
        assert_eq!(core.time_elapsed(), 0.0);

        core.start();
        clock.advance(chrono::Duration::seconds(2));
        assert_eq!(core.time_elapsed(), 2.0);

        core.pause();
        clock.advance(chrono::Duration::seconds(30));
        assert_eq!(core.time_elapsed(), 2.0);

        core.resume();
        clock.advance(chrono::Duration::seconds(1));
        assert_eq!(core.time_elapsed(), 3.0);
    }

    #[test]
    fn test_ticks_armed_only_while_playing() {
        let mut core = SessionCore::new("test").with_ticks(Duration::from_millis(100));
        core.begin_loading(SessionConfig::default());
        core.finish_loading();
        assert!(!core.ticks().unwrap().is_armed());

        core.start();
        assert!(core.ticks().unwrap().is_armed());
        core.pause();
        assert!(!core.ticks().unwrap().is_armed());
        core.resume();
        core.destroy();
        assert!(!core.ticks().unwrap().is_armed());
    }

    #[test]
    fn test_restore_playing_becomes_paused() {
        let mut core = SessionCore::new("test");
        core.restore(&CoreSnapshot {
            state: Some(GameState::Playing),
            score: Some(70),
            played_ms: Some(4000),
            difficulty: None,
        });

        assert_eq!(core.state(), GameState::Paused);
        assert_eq!(core.score(), 70);
        assert_eq!(core.time_elapsed(), 4.0);
    }
}
