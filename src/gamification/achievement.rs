//! Achievements: one-shot unlocks against lifetime totals.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which lifetime total an achievement watches.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AchievementKind {
    GamesPlayed,
    Score,
    Streak,
    Level,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AchievementRequirement {
    #[serde(rename = "type")]
    pub kind: AchievementKind,
    pub value: u64,
}

/// The lifetime totals achievements are checked against.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Totals {
    pub games_played: u64,
    pub total_score: u64,
    pub longest_streak: u32,
    pub level: u32,
}

/// Catalog entry plus the user's unlock state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Achievement {
    pub id: String,
    pub title: String,
    pub description: String,
    pub xp_reward: u64,
    pub token_reward: u64,
    pub requirement: AchievementRequirement,
    pub unlocked: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unlocked_at: Option<DateTime<Utc>>,
}

impl Achievement {
    /// Locked achievement.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        requirement: AchievementRequirement,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: description.into(),
            xp_reward: 0,
            token_reward: 0,
            requirement,
            unlocked: false,
            unlocked_at: None,
        }
    }

    #[must_use]
    pub fn with_rewards(mut self, xp: u64, tokens: u64) -> Self {
        self.xp_reward = xp;
        self.token_reward = tokens;
        self
    }

    /// Is the threshold met or exceeded?
    #[must_use]
    pub fn is_met(&self, totals: &Totals) -> bool {
        let current = match self.requirement.kind {
            AchievementKind::GamesPlayed => totals.games_played,
            AchievementKind::Score => totals.total_score,
            AchievementKind::Streak => u64::from(totals.longest_streak),
            AchievementKind::Level => u64::from(totals.level),
        };
        current >= self.requirement.value
    }

    /// Unlock if locked and met. Returns `true` only on the transition.
    pub fn try_unlock(&mut self, totals: &Totals, now: DateTime<Utc>) -> bool {
        if self.unlocked || !self.is_met(totals) {
            return false;
        }
        self.unlocked = true;
        self.unlocked_at = Some(now);
        true
    }
}

/// The catalog every new user starts with, all locked.
#[must_use]
pub fn default_achievements() -> Vec<Achievement> {
    let req = |kind, value| AchievementRequirement { kind, value };
    vec![
        Achievement::new("first_game", "First Steps", "Play your first game", req(AchievementKind::GamesPlayed, 1))
            .with_rewards(100, 50),
        Achievement::new("veteran", "Veteran Player", "Play 100 games", req(AchievementKind::GamesPlayed, 100))
            .with_rewards(1000, 500),
        Achievement::new(
            "score_master",
            "Score Master",
            "Earn 1,000,000 total score",
            req(AchievementKind::Score, 1_000_000),
        )
        .with_rewards(2000, 1000),
        Achievement::new("streak_10", "Winning Streak", "Win 10 games in a row", req(AchievementKind::Streak, 10))
            .with_rewards(1500, 750),
        Achievement::new("level_10", "Expert", "Reach level 10", req(AchievementKind::Level, 10))
            .with_rewards(500, 250),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_catalog() {
        let catalog = default_achievements();
        let ids: Vec<&str> = catalog.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["first_game", "veteran", "score_master", "streak_10", "level_10"]);
        assert!(catalog.iter().all(|a| !a.unlocked));
    }

    #[test]
    fn test_unlocks_once() {
        let mut first = default_achievements().remove(0);
        let totals = Totals {
            games_played: 1,
            ..Totals::default()
        };
        let now = Utc::now();

        assert!(first.try_unlock(&totals, now));
        assert_eq!(first.unlocked_at, Some(now));
        assert!(!first.try_unlock(&totals, now));
    }

    #[test]
    fn test_threshold_exceeded_counts() {
        let streak = default_achievements().remove(3);
        let totals = Totals {
            longest_streak: 12,
            ..Totals::default()
        };
        assert!(streak.is_met(&totals));
    }
}
