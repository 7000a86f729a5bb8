//! Levels, streaks, achievements, missions and the daily reward.
//!
//! ## Level curve
//!
//! Leaving level `L` costs `floor(1000 × L^1.5)` XP. Surplus XP carries over,
//! so one large award can cross several levels.
//!
//! ## Daily cycle
//!
//! Daily missions expire at the next local midnight and stop advancing once
//! expired. [`GamificationEngine::roll_over_day`] reopens the daily claim and
//! replaces expired missions; missing a day resets the claim streak.

pub mod achievement;
pub mod engine;
pub mod mission;
pub mod progress;
pub mod store;

pub use achievement::{default_achievements, Achievement, AchievementKind, AchievementRequirement, Totals};
pub use engine::GamificationEngine;
pub use mission::{daily_missions, Mission, MissionGoal, MissionKind, MissionRequirement, MissionReward};
pub use progress::{DailyReward, GameProgress, LevelUp, ProgressPatch, ProgressionConfig, UserProgress};
pub use store::{InMemoryProgressRepository, ProgressHandle, ProgressRepository};
