//! Session-level orchestration and the persistence boundary.
//!
//! A session runs as:
//!
//! 1. [`PlatformEngine::start_game`] charges the entry fee
//! 2. the caller drives an adapter from [`PlatformEngine::create_game`]
//! 3. [`PlatformEngine::finish_game`] pays the reward and records progress
//!
//! [`PlatformUserState`] is the only record exchanged with outside storage.

pub mod config;
pub mod engine;
pub mod snapshot;

pub use config::{PlatformConfig, RewardPolicy};
pub use engine::{GameFinishInput, GameFinishOutput, PlatformEngine, PlatformUserSeed};
pub use snapshot::{PlatformUserState, WalletBalances};
