//! Platform-wide tuning.

use serde::{Deserialize, Serialize};

use crate::economy::EconomyConfig;
use crate::gamification::ProgressionConfig;

/// How a finished session turns into coins and XP.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardPolicy {
    /// Floor of the XP granted per finished game.
    pub min_xp: u64,
    /// Score points per XP point.
    pub xp_score_divisor: u64,
    /// Event multiplier applied to every game reward.
    pub event_multiplier: f64,
}

impl Default for RewardPolicy {
    fn default() -> Self {
        Self {
            min_xp: 50,
            xp_score_divisor: 20,
            event_multiplier: 1.0,
        }
    }
}

impl RewardPolicy {
    #[must_use]
    pub fn with_event_multiplier(mut self, multiplier: f64) -> Self {
        self.event_multiplier = multiplier;
        self
    }

    /// `max(min_xp, score / divisor)`.
    #[must_use]
    pub fn xp_for(&self, score: u64) -> u64 {
        let earned = score.checked_div(self.xp_score_divisor).unwrap_or(0);
        earned.max(self.min_xp)
    }
}

/// Everything the platform can be tuned with.
///
/// ```
/// use arcade_hub::platform::PlatformConfig;
///
/// let config = PlatformConfig::from_toml_str(
///     r#"
///     [economy]
///     exchange_rate = 250
///
///     [rewards]
///     event_multiplier = 2.0
///     "#,
/// )
/// .unwrap();
/// assert_eq!(config.economy.exchange_rate, 250);
/// assert_eq!(config.rewards.min_xp, 50);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    pub economy: EconomyConfig,
    pub progression: ProgressionConfig,
    pub rewards: RewardPolicy,
}

impl PlatformConfig {
    /// Parse a TOML document; missing tables and keys take their defaults.
    ///
    /// # Errors
    ///
    /// The TOML parse error for malformed input.
    pub fn from_toml_str(source: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(source)
    }

    #[must_use]
    pub fn with_economy(mut self, economy: EconomyConfig) -> Self {
        self.economy = economy;
        self
    }

    #[must_use]
    pub fn with_progression(mut self, progression: ProgressionConfig) -> Self {
        self.progression = progression;
        self
    }

    #[must_use]
    pub fn with_rewards(mut self, rewards: RewardPolicy) -> Self {
        self.rewards = rewards;
        self
    }
}
