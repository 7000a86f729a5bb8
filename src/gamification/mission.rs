//! Missions: time-limited goals that accumulate progress until completed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissionKind {
    Daily,
    Weekly,
    Special,
}

/// What a mission counts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissionGoal {
    PlayGames,
    EarnScore,
    WinStreak,
    SpendTokens,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissionRequirement {
    #[serde(rename = "type")]
    pub goal: MissionGoal,
    pub target: u64,
    pub current: u64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissionReward {
    pub xp: u64,
    pub soft_tokens: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hard_tokens: Option<u64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mission {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: MissionKind,
    pub reward: MissionReward,
    pub requirement: MissionRequirement,
    pub expires_at: DateTime<Utc>,
    pub completed: bool,
}

impl Mission {
    /// Can the mission still make progress at `now`?
    #[must_use]
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        !self.completed && self.expires_at > now
    }

    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Add progress towards `goal`.
    ///
    /// Returns `true` when this call completes the mission. Completed,
    /// expired and non-matching missions are left untouched.
    pub fn advance(&mut self, goal: MissionGoal, amount: u64, now: DateTime<Utc>) -> bool {
        if self.requirement.goal != goal || !self.is_active(now) {
            return false;
        }
        self.requirement.current = self.requirement.current.saturating_add(amount);
        if self.requirement.current >= self.requirement.target {
            self.completed = true;
        }
        self.completed
    }
}

/// Fresh daily missions expiring at `expires_at`.
#[must_use]
pub fn daily_missions(expires_at: DateTime<Utc>) -> Vec<Mission> {
    vec![
        Mission {
            id: "daily_play_3".into(),
            title: "Daily Player".into(),
            description: "Play 3 games today".into(),
            kind: MissionKind::Daily,
            reward: MissionReward {
                xp: 200,
                soft_tokens: 100,
                hard_tokens: None,
            },
            requirement: MissionRequirement {
                goal: MissionGoal::PlayGames,
                target: 3,
                current: 0,
            },
            expires_at,
            completed: false,
        },
        Mission {
            id: "daily_score".into(),
            title: "Score Hunter".into(),
            description: "Earn 10,000 points today".into(),
            kind: MissionKind::Daily,
            reward: MissionReward {
                xp: 300,
                soft_tokens: 150,
                hard_tokens: None,
            },
            requirement: MissionRequirement {
                goal: MissionGoal::EarnScore,
                target: 10_000,
                current: 0,
            },
            expires_at,
            completed: false,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_advance_completes_and_freezes() {
        let now = Utc::now();
        let mut play = daily_missions(now + Duration::hours(1)).remove(0);

        assert!(!play.advance(MissionGoal::PlayGames, 1, now));
        assert!(!play.advance(MissionGoal::EarnScore, 500, now));
        assert!(!play.advance(MissionGoal::PlayGames, 1, now));
        assert!(play.advance(MissionGoal::PlayGames, 1, now));
        assert!(play.completed);

        assert!(!play.advance(MissionGoal::PlayGames, 1, now));
        assert_eq!(play.requirement.current, 3);
    }

    #[test]
    fn test_expired_missions_do_not_advance() {
        let now = Utc::now();
        let mut score = daily_missions(now).remove(1);
        assert!(score.is_expired(now));
        assert!(!score.advance(MissionGoal::EarnScore, 50_000, now));
        assert_eq!(score.requirement.current, 0);
    }
}
