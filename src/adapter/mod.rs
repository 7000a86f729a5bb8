//! The uniform contract every mini-game implements.
//!
//! ## Lifecycle
//!
//! ```text
//! Init → Loading → Ready → Playing ⇄ Paused → Finished → Exit
//! ```
//!
//! - `init` applies the session configuration (`Loading`), runs the game's
//!   setup and lands in `Ready`.
//! - `start` is only legal from `Ready`; `pause`/`resume` only toggle
//!   `Playing ⇄ Paused`. Calls from any other state are silently ignored.
//! - A terminal condition (or `end`) reaches `Finished` exactly once and
//!   emits one `gameOver`.
//! - `destroy` reaches `Exit` from anywhere and stops scheduled ticks.
//!
//! ## Time
//!
//! Adapters never spawn timers. The host calls [`GameAdapter::advance`] with
//! the wall time that passed; scheduled work (Snake and Pong ticks, Memory's
//! reveal delay) only runs while the session is `Playing`.

mod events;
mod input;
mod lifecycle;
mod session;
mod snapshot;
mod stats;
mod tick;

pub use events::{listener, EventBus, EventKind, GameEvent, Listener};
pub use input::{Direction, GameInput};
pub use lifecycle::GameState;
pub use session::SessionCore;
pub use snapshot::{decode, encode, CoreSnapshot, Snapshot};
pub use stats::{BoardOutcome, GameStats, StatDetails};
pub use tick::{Countdown, TickLoop};

use std::time::Duration;

use crate::core::SessionConfig;

/// Capability set shared by all game engines.
///
/// Implementors embed a [`SessionCore`] and provide the game-specific parts:
/// setup, stats details, snapshots, input handling and (for time-driven
/// games) `advance`. Every lifecycle method has a provided implementation on
/// top of the session core.
///
/// ## Implementation Notes
///
/// - `setup`: runs between `Loading` and `Ready`; must leave a playable board
/// - `handle_input`: return `false` for rejected or unsupported input, with no
///   mutation
/// - `load_state`: never panic on untrusted input; ignore what does not decode
/// - After `Exit`, every mutating method must be a no-op
pub trait GameAdapter: Send {
    /// Embedded lifecycle state.
    fn session(&self) -> &SessionCore;

    /// Embedded lifecycle state (mutable).
    fn session_mut(&mut self) -> &mut SessionCore;

    /// Allocate the board, shuffle, spawn initial entities.
    fn setup(&mut self);

    /// Game-specific statistics.
    fn details(&self) -> StatDetails;

    /// Capture everything needed to resume this session exactly.
    fn save_state(&self) -> Snapshot;

    /// Overlay a snapshot produced by `save_state`.
    fn load_state(&mut self, snapshot: &Snapshot);

    /// Apply a game-specific command.
    fn handle_input(&mut self, input: GameInput) -> bool;

    /// Let `elapsed` wall time pass. Turn-based games without timers ignore it.
    fn advance(&mut self, _elapsed: Duration) {}

    // === Provided lifecycle ===

    /// Stable catalog identifier.
    fn game_id(&self) -> &'static str {
        self.session().game_id()
    }

    /// Configure the session and run setup: `Loading → Ready`.
    fn init(&mut self, config: SessionConfig) {
        if self.session_mut().begin_loading(config) {
            self.setup();
            self.session_mut().finish_loading();
        }
    }

    /// `Ready → Playing`.
    fn start(&mut self) {
        self.session_mut().start();
    }

    /// `Playing → Paused`; stops scheduled ticks before returning.
    fn pause(&mut self) {
        self.session_mut().pause();
    }

    /// `Paused → Playing`.
    fn resume(&mut self) {
        self.session_mut().resume();
    }

    /// Reach `Finished` and emit `gameOver` once.
    fn end(&mut self) {
        if self.session_mut().conclude() {
            let stats = self.stats();
            tracing::info!(
                game = self.game_id(),
                score = stats.score,
                seconds = stats.time_elapsed,
                "session finished"
            );
            self.session().emit(&GameEvent::GameOver(stats));
        }
    }

    /// Reach `Exit` from any state.
    fn destroy(&mut self) {
        self.session_mut().destroy();
    }

    // === Provided getters ===

    fn state(&self) -> GameState {
        self.session().state()
    }

    fn score(&self) -> u64 {
        self.session().score()
    }

    fn stats(&self) -> GameStats {
        GameStats {
            score: self.session().score(),
            time_elapsed: self.session().time_elapsed(),
            details: self.details(),
        }
    }

    // === Provided events ===

    fn subscribe(&mut self, kind: EventKind, listener: Listener) {
        self.session_mut().subscribe(kind, listener);
    }

    fn unsubscribe(&mut self, kind: EventKind, listener: &Listener) -> bool {
        self.session_mut().unsubscribe(kind, listener)
    }
}
