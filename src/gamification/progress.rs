//! Per-user progression record and the level curve.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::core::UserId;

use super::achievement::{default_achievements, Achievement, Totals};
use super::mission::{daily_missions, Mission};

/// Level curve and daily reward tuning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressionConfig {
    /// XP needed at level 1.
    pub xp_base: f64,
    /// Growth of the requirement per level.
    pub xp_exponent: f64,
    /// Daily reward XP per streak day.
    pub daily_xp_base: u64,
    /// Daily reward tokens per streak day.
    pub daily_token_base: u64,
    /// Streak days that still raise the daily reward.
    pub daily_streak_cap: u32,
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        Self {
            xp_base: 1000.0,
            xp_exponent: 1.5,
            daily_xp_base: 100,
            daily_token_base: 50,
            daily_streak_cap: 7,
        }
    }
}

impl ProgressionConfig {
    #[must_use]
    pub fn with_curve(mut self, base: f64, exponent: f64) -> Self {
        self.xp_base = base;
        self.xp_exponent = exponent;
        self
    }

    /// `floor(base × level^exponent)`, never below 1.
    #[must_use]
    pub fn xp_needed(&self, level: u32) -> u64 {
        let raw = (self.xp_base * f64::from(level).powf(self.xp_exponent)).floor();
        // `as` saturates and maps NaN to 0
        (raw as u64).max(1)
    }

    /// Reward for a daily claim at `streak`.
    #[must_use]
    pub fn daily_reward(&self, streak: u32) -> (u64, u64) {
        let days = u64::from(streak.min(self.daily_streak_cap));
        (self.daily_xp_base * days, self.daily_token_base * days)
    }
}

/// Level, XP, lifetime totals, achievements and missions of one user.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProgress {
    pub user_id: UserId,
    pub level: u32,
    pub xp: u64,
    pub xp_to_next_level: u64,
    pub total_games_played: u64,
    pub total_score: u64,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub achievements: Vec<Achievement>,
    pub missions: Vec<Mission>,
    pub daily_reward_claimed: bool,
    pub daily_reward_streak: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_daily_claim: Option<NaiveDate>,
}

impl UserProgress {
    /// Level 1, no XP, default achievements and fresh daily missions.
    #[must_use]
    pub fn new(user_id: UserId, config: &ProgressionConfig, missions_expire_at: DateTime<Utc>) -> Self {
        Self {
            user_id,
            level: 1,
            xp: 0,
            xp_to_next_level: config.xp_needed(1),
            total_games_played: 0,
            total_score: 0,
            current_streak: 0,
            longest_streak: 0,
            achievements: default_achievements(),
            missions: daily_missions(missions_expire_at),
            daily_reward_claimed: false,
            daily_reward_streak: 0,
            last_daily_claim: None,
        }
    }

    #[must_use]
    pub fn totals(&self) -> Totals {
        Totals {
            games_played: self.total_games_played,
            total_score: self.total_score,
            longest_streak: self.longest_streak,
            level: self.level,
        }
    }

    /// Add XP and level up while the requirement is met.
    pub fn add_xp(&mut self, amount: u64, config: &ProgressionConfig) -> LevelUp {
        self.xp = self.xp.saturating_add(amount);
        let mut levels_gained = 0;
        // A zero requirement (bad import) would never terminate
        self.xp_to_next_level = self.xp_to_next_level.max(1);
        while self.xp >= self.xp_to_next_level {
            self.xp -= self.xp_to_next_level;
            self.level = self.level.saturating_add(1);
            levels_gained += 1;
            self.xp_to_next_level = config.xp_needed(self.level);
        }
        LevelUp {
            levels_gained,
            new_level: self.level,
        }
    }

    /// Result of a win or loss on the streak counters.
    pub fn apply_result(&mut self, won: bool) {
        if won {
            self.current_streak = self.current_streak.saturating_add(1);
            self.longest_streak = self.longest_streak.max(self.current_streak);
        } else {
            self.current_streak = 0;
        }
    }

    #[must_use]
    pub fn unlocked_achievements(&self) -> impl Iterator<Item = &Achievement> {
        self.achievements.iter().filter(|a| a.unlocked)
    }

    /// Overlay present fields of `patch`.
    pub fn apply_patch(&mut self, patch: &ProgressPatch) {
        if let Some(level) = patch.level {
            self.level = level.max(1);
        }
        if let Some(xp) = patch.xp {
            self.xp = xp;
        }
        if let Some(next) = patch.xp_to_next_level {
            self.xp_to_next_level = next.max(1);
        }
        if let Some(games) = patch.total_games_played {
            self.total_games_played = games;
        }
        if let Some(score) = patch.total_score {
            self.total_score = score;
        }
        if let Some(streak) = patch.current_streak {
            self.current_streak = streak;
        }
        if let Some(longest) = patch.longest_streak {
            self.longest_streak = longest;
        }
        if let Some(claimed) = patch.daily_reward_claimed {
            self.daily_reward_claimed = claimed;
        }
        if let Some(streak) = patch.daily_reward_streak {
            self.daily_reward_streak = streak;
        }
        if let Some(date) = patch.last_daily_claim {
            self.last_daily_claim = Some(date);
        }
    }
}

/// Levels crossed by one XP award.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelUp {
    pub levels_gained: u32,
    pub new_level: u32,
}

impl LevelUp {
    #[must_use]
    pub fn leveled(&self) -> bool {
        self.levels_gained > 0
    }
}

/// Everything one recorded game changed.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameProgress {
    pub unlocked_achievements: Vec<Achievement>,
    pub completed_missions: Vec<Mission>,
    pub levels_gained: u32,
    pub new_level: u32,
}

impl GameProgress {
    /// Token bonus of the unlocked achievements.
    #[must_use]
    pub fn achievement_tokens(&self) -> u64 {
        self.unlocked_achievements.iter().map(|a| a.token_reward).sum()
    }

    /// Soft-token bonus of the completed missions.
    #[must_use]
    pub fn mission_tokens(&self) -> u64 {
        self.completed_missions.iter().map(|m| m.reward.soft_tokens).sum()
    }
}

/// A successful daily claim.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyReward {
    pub xp: u64,
    pub soft_tokens: u64,
    pub streak: u32,
    pub level_up: LevelUp,
}

/// Progress scalars for persistence; absent fields keep their current value.
///
/// Every field is always written so the positional bincode form decodes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProgressPatch {
    pub level: Option<u32>,
    pub xp: Option<u64>,
    pub xp_to_next_level: Option<u64>,
    pub total_games_played: Option<u64>,
    pub total_score: Option<u64>,
    pub current_streak: Option<u32>,
    pub longest_streak: Option<u32>,
    pub daily_reward_claimed: Option<bool>,
    pub daily_reward_streak: Option<u32>,
    pub last_daily_claim: Option<NaiveDate>,
}

impl From<&UserProgress> for ProgressPatch {
    fn from(progress: &UserProgress) -> Self {
        Self {
            level: Some(progress.level),
            xp: Some(progress.xp),
            xp_to_next_level: Some(progress.xp_to_next_level),
            total_games_played: Some(progress.total_games_played),
            total_score: Some(progress.total_score),
            current_streak: Some(progress.current_streak),
            longest_streak: Some(progress.longest_streak),
            daily_reward_claimed: Some(progress.daily_reward_claimed),
            daily_reward_streak: Some(progress.daily_reward_streak),
            last_daily_claim: progress.last_daily_claim,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh() -> (UserProgress, ProgressionConfig) {
        let config = ProgressionConfig::default();
        (UserProgress::new(UserId::new("u"), &config, Utc::now()), config)
    }

    #[test]
    fn test_xp_curve() {
        let config = ProgressionConfig::default();
        assert_eq!(config.xp_needed(1), 1000);
        assert_eq!(config.xp_needed(2), 2828);
    }

    #[test]
    fn test_exact_requirement_levels_once() {
        let (mut progress, config) = fresh();
        let up = progress.add_xp(1000, &config);
        assert_eq!(up, LevelUp { levels_gained: 1, new_level: 2 });
        assert_eq!(progress.xp, 0);
        assert_eq!(progress.xp_to_next_level, 2828);
    }

    #[test]
    fn test_multi_level_gain() {
        let (mut progress, config) = fresh();
        let up = progress.add_xp(1000 + 2828 + 10, &config);
        assert_eq!(up.new_level, 3);
        assert_eq!(up.levels_gained, 2);
        assert_eq!(progress.xp, 10);
    }

    #[test]
    fn test_zero_requirement_patch_is_clamped() {
        let (mut progress, config) = fresh();
        progress.apply_patch(&ProgressPatch {
            xp_to_next_level: Some(0),
            level: Some(0),
            ..ProgressPatch::default()
        });
        assert_eq!(progress.level, 1);
        assert!(progress.add_xp(5, &config).levels_gained <= 5);
    }

    #[test]
    fn test_streaks() {
        let (mut progress, _) = fresh();
        progress.apply_result(true);
        progress.apply_result(true);
        progress.apply_result(false);
        progress.apply_result(true);
        assert_eq!(progress.current_streak, 1);
        assert_eq!(progress.longest_streak, 2);
    }

    #[test]
    fn test_daily_reward_is_capped() {
        let config = ProgressionConfig::default();
        assert_eq!(config.daily_reward(1), (100, 50));
        assert_eq!(config.daily_reward(30), (700, 350));
    }

    #[test]
    fn test_patch_overlays_only_present_fields() {
        let (mut progress, _) = fresh();
        progress.total_score = 77;
        let patch: ProgressPatch = serde_json::from_str(r#"{"level": 4, "xp": 12}"#).unwrap();
        progress.apply_patch(&patch);
        assert_eq!((progress.level, progress.xp, progress.total_score), (4, 12, 77));
    }
}
