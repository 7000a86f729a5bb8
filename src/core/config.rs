//! Session configuration.
//!
//! Every adapter receives a `SessionConfig` in `init`. Only `difficulty`
//! changes the simulation (tick speed, card counts); sound, music and fps
//! are passed through for the presentation layer.

use serde::{Deserialize, Serialize};

/// Difficulty tier selected for a session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
    Expert,
}

impl Difficulty {
    /// All tiers, easiest first.
    pub const ALL: [Difficulty; 4] = [
        Difficulty::Easy,
        Difficulty::Medium,
        Difficulty::Hard,
        Difficulty::Expert,
    ];

    /// Pick the value for this tier from a per-tier table.
    #[must_use]
    pub fn select<T: Copy>(self, table: &PerDifficulty<T>) -> T {
        match self {
            Difficulty::Easy => table.easy,
            Difficulty::Medium => table.medium,
            Difficulty::Hard => table.hard,
            Difficulty::Expert => table.expert,
        }
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Difficulty::Easy => "EASY",
            Difficulty::Medium => "MEDIUM",
            Difficulty::Hard => "HARD",
            Difficulty::Expert => "EXPERT",
        };
        f.write_str(name)
    }
}

/// A value tuned per difficulty tier.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PerDifficulty<T> {
    pub easy: T,
    pub medium: T,
    pub hard: T,
    pub expert: T,
}

impl<T> PerDifficulty<T> {
    /// Build a table from the four tier values, easiest first.
    pub const fn new(easy: T, medium: T, hard: T, expert: T) -> Self {
        Self {
            easy,
            medium,
            hard,
            expert,
        }
    }
}

/// Configuration applied to an adapter when a session is initialised.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SessionConfig {
    /// Difficulty tier; the only field the simulation reads.
    pub difficulty: Difficulty,

    /// Presentation-only.
    pub sound_enabled: bool,

    /// Presentation-only.
    pub music_enabled: bool,

    /// Presentation-only target frame rate.
    pub fps: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::Medium,
            sound_enabled: true,
            music_enabled: true,
            fps: 60,
        }
    }
}

impl SessionConfig {
    /// Create a config for the given difficulty with default presentation flags.
    #[must_use]
    pub fn new(difficulty: Difficulty) -> Self {
        Self {
            difficulty,
            ..Self::default()
        }
    }

    /// Set sound and music flags.
    #[must_use]
    pub fn with_audio(mut self, sound: bool, music: bool) -> Self {
        self.sound_enabled = sound;
        self.music_enabled = music;
        self
    }

    /// Set the target frame rate.
    #[must_use]
    pub fn with_fps(mut self, fps: u32) -> Self {
        self.fps = fps;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_per_difficulty() {
        let table = PerDifficulty::new(160u64, 120, 90, 70);
        assert_eq!(Difficulty::Easy.select(&table), 160);
        assert_eq!(Difficulty::Medium.select(&table), 120);
        assert_eq!(Difficulty::Hard.select(&table), 90);
        assert_eq!(Difficulty::Expert.select(&table), 70);
    }

    #[test]
    fn test_difficulty_serde_uses_uppercase() {
        let json = serde_json::to_string(&Difficulty::Expert).unwrap();
        assert_eq!(json, "\"EXPERT\"");

        let parsed: Difficulty = serde_json::from_str("\"EASY\"").unwrap();
        assert_eq!(parsed, Difficulty::Easy);
    }

    #[test]
    fn test_session_config_builder() {
        let config = SessionConfig::new(Difficulty::Hard)
            .with_audio(false, true)
            .with_fps(30);

        assert_eq!(config.difficulty, Difficulty::Hard);
        assert!(!config.sound_enabled);
        assert!(config.music_enabled);
        assert_eq!(config.fps, 30);
    }

    #[test]
    fn test_session_config_missing_fields_default() {
        let config: SessionConfig = serde_json::from_str(r#"{"difficulty":"EASY"}"#).unwrap();
        assert_eq!(config.difficulty, Difficulty::Easy);
        assert_eq!(config.fps, 60);
    }
}
