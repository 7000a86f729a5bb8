//! # arcade-hub
//!
//! Mini-game engines plus the economy and progression core of a
//! play-and-earn game hub.
//!
//! ## Design Principles
//!
//! 1. **One Contract**: Every game is a [`GameAdapter`] with the same
//!    lifecycle, events and snapshot format. Hosts never see a game's
//!    internal state.
//!
//! 2. **Host-Driven Time**: Games never spawn timers. The host feeds elapsed
//!    time through `advance`, so pausing or destroying a session stops it
//!    synchronously.
//!
//! 3. **Ledger First**: Balances change only by appending wallet movements.
//!    A debit that would overdraw fails before anything is written.
//!
//! ## Modules
//!
//! - `core`: user ids, RNG, clock, session configuration, errors
//! - `adapter`: lifecycle state machine, events, ticks, snapshots
//! - `games`: Snake, 2048, Pong, Memory, TicTacToe, ConnectFour and the
//!   catalog that creates them by id
//! - `economy`: wallets, movements and the reward formula
//! - `gamification`: levels, streaks, achievements, missions, daily reward
//! - `platform`: session orchestration and the persistence record

pub mod core;
pub mod adapter;
pub mod games;
pub mod economy;
pub mod gamification;
pub mod platform;

// Re-export commonly used types
pub use crate::core::{
    Clock, ManualClock, SystemClock,
    Difficulty, PerDifficulty, SessionConfig,
    GameRng, GameRngState,
    PlatformError, Result, UserId,
};

pub use crate::adapter::{
    GameAdapter, GameState, GameEvent, EventKind, Listener,
    GameInput, Direction, GameStats, StatDetails, Snapshot,
};

pub use crate::games::GameCatalog;

pub use crate::economy::{
    EconomyEngine, EconomyConfig, RewardCalculation,
    TokenType, MovementKind, Wallet, WalletMovement,
};

pub use crate::gamification::{
    GamificationEngine, ProgressionConfig, UserProgress,
    Achievement, Mission, LevelUp, DailyReward,
};

pub use crate::platform::{
    PlatformEngine, PlatformConfig, PlatformUserState, PlatformUserSeed,
    GameFinishInput, GameFinishOutput,
};
