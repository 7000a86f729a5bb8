//! Reward formula and economy tuning.

use serde::{Deserialize, Serialize};

use crate::core::{Difficulty, PerDifficulty};

/// Economy tuning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomyConfig {
    /// Reward multiplier by difficulty.
    pub difficulty_factors: PerDifficulty<f64>,
    /// Extra multiplier per streak step.
    pub streak_step: f64,
    /// Ceiling of the streak multiplier.
    pub streak_cap: f64,
    /// Soft tokens per hard token when no rate is given.
    pub exchange_rate: u64,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            difficulty_factors: PerDifficulty::new(1.0, 1.5, 2.0, 3.0),
            streak_step: 0.1,
            streak_cap: 3.0,
            exchange_rate: 100,
        }
    }
}

impl EconomyConfig {
    #[must_use]
    pub fn with_exchange_rate(mut self, rate: u64) -> Self {
        self.exchange_rate = rate;
        self
    }

    #[must_use]
    pub fn with_streak_cap(mut self, cap: f64) -> Self {
        self.streak_cap = cap;
        self
    }

    /// `min(1 + streak × step, cap)`.
    #[must_use]
    pub fn streak_multiplier(&self, streak: u32) -> f64 {
        (1.0 + f64::from(streak) * self.streak_step).min(self.streak_cap)
    }

    /// Full reward breakdown for a finished session.
    ///
    /// `final_reward = floor(score × difficulty × streak × event)`. Negative
    /// or non-finite event multipliers count as zero.
    #[must_use]
    pub fn calculate(
        &self,
        score: u64,
        difficulty: Difficulty,
        streak: u32,
        event_multiplier: f64,
    ) -> RewardCalculation {
        let difficulty_factor = difficulty.select(&self.difficulty_factors);
        let streak_multiplier = self.streak_multiplier(streak);
        let event_multiplier = if event_multiplier.is_finite() {
            event_multiplier.max(0.0)
        } else {
            0.0
        };

        let raw = score as f64 * difficulty_factor * streak_multiplier * event_multiplier;
        // `as` saturates; NaN maps to 0
        let final_reward = raw.floor() as u64;

        RewardCalculation {
            base_score: score,
            difficulty_factor,
            streak_multiplier,
            event_multiplier,
            final_reward,
        }
    }
}

/// Breakdown returned by `calculate_reward`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardCalculation {
    pub base_score: u64,
    pub difficulty_factor: f64,
    pub streak_multiplier: f64,
    pub event_multiplier: f64,
    pub final_reward: u64,
}
