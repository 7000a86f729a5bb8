//! Session lifecycle states.

use serde::{Deserialize, Serialize};

/// Lifecycle state of a game session.
///
/// ```text
/// Init → Loading → Ready → Playing ⇄ Paused → Finished → Exit
/// ```
///
/// `Exit` is reachable from every state through `destroy()`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GameState {
    /// Constructed, not configured.
    #[default]
    Init,
    /// Configuration applied, game-specific setup running.
    Loading,
    /// Setup complete, waiting for `start()`.
    Ready,
    /// Simulation running.
    Playing,
    /// Simulation suspended by the player.
    Paused,
    /// Terminal outcome reached.
    Finished,
    /// Torn down; no further mutation is legal.
    Exit,
}

impl GameState {
    /// Is the session over (finished or torn down)?
    #[must_use]
    pub const fn is_over(self) -> bool {
        matches!(self, GameState::Finished | GameState::Exit)
    }

    /// Can `init` (re)configure the session from this state?
    ///
    /// A running or paused session must be ended first.
    #[must_use]
    pub const fn accepts_init(self) -> bool {
        matches!(self, GameState::Init | GameState::Ready | GameState::Finished)
    }

    /// States a snapshot may restore into.
    ///
    /// `Playing` is restored as `Paused` so the caller decides when time
    /// starts flowing again; transient and torn-down states are never restored.
    #[must_use]
    pub const fn restorable(self) -> Option<GameState> {
        match self {
            GameState::Ready => Some(GameState::Ready),
            GameState::Playing | GameState::Paused => Some(GameState::Paused),
            GameState::Finished => Some(GameState::Finished),
            GameState::Init | GameState::Loading | GameState::Exit => None,
        }
    }
}

impl std::fmt::Display for GameState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            GameState::Init => "INIT",
            GameState::Loading => "LOADING",
            GameState::Ready => "READY",
            GameState::Playing => "PLAYING",
            GameState::Paused => "PAUSED",
            GameState::Finished => "FINISHED",
            GameState::Exit => "EXIT",
        };
        f.write_str(name)
    }
}
