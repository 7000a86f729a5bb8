//! Core building blocks shared by games and the reward engines:
//! user ids, RNG, clock, session configuration and the error type.

pub mod clock;
pub mod config;
pub mod error;
pub mod rng;
pub mod user;

pub use clock::{next_local_midnight, Clock, ManualClock, SystemClock};
pub use config::{Difficulty, PerDifficulty, SessionConfig};
pub use error::{PlatformError, Result};
pub use rng::{GameRng, GameRngState};
pub use user::UserId;
