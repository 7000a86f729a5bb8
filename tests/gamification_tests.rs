//! Gamification integration tests.
//!
//! Level curve, achievement idempotence, mission expiry and the daily
//! rollover rule, driven with a manual clock.

use std::sync::Arc;

use arcade_hub::core::{Clock, ManualClock, UserId};
use arcade_hub::gamification::{GamificationEngine, ProgressPatch, ProgressionConfig};
use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;

fn engine() -> (GamificationEngine, Arc<ManualClock>, UserId) {
    let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2026, 9, 1, 10, 0, 0).unwrap()));
    let engine = GamificationEngine::new().with_clock(clock.clone());
    let user = UserId::new("kim");
    engine.create_user_progress(&user);
    (engine, clock, user)
}

// =============================================================================
// Level Curve
// =============================================================================

proptest! {
    /// Awarding exactly the requirement gains one level and leaves no XP.
    #[test]
    fn prop_exact_requirement_levels_once(level in 1u32..60) {
        let (engine, _, user) = engine();
        engine.restore_progress(&user, &ProgressPatch {
            level: Some(level),
            xp: Some(0),
            xp_to_next_level: Some(engine.xp_needed(level)),
            ..ProgressPatch::default()
        });

        let up = engine.award_xp(&user, engine.xp_needed(level)).unwrap();
        prop_assert_eq!(up.levels_gained, 1);
        prop_assert_eq!(up.new_level, level + 1);
        prop_assert_eq!(engine.progress(&user).unwrap().xp, 0);
    }

    /// Twice the requirement gains at least one level.
    #[test]
    fn prop_double_requirement(level in 1u32..60) {
        let (engine, _, user) = engine();
        engine.restore_progress(&user, &ProgressPatch {
            level: Some(level),
            xp: Some(0),
            xp_to_next_level: Some(engine.xp_needed(level)),
            ..ProgressPatch::default()
        });

        let up = engine.award_xp(&user, 2 * engine.xp_needed(level)).unwrap();
        prop_assert!(up.new_level >= level + 1);
        prop_assert!(up.new_level <= level + 2);
    }
}

#[test]
fn test_custom_curve() {
    let engine = GamificationEngine::new().with_config(ProgressionConfig::default().with_curve(100.0, 1.0));
    assert_eq!(engine.xp_needed(1), 100);
    assert_eq!(engine.xp_needed(7), 700);
}

// =============================================================================
// Achievements
// =============================================================================

/// Re-recording after a threshold is met never pays again.
#[test]
fn test_achievements_unlock_once() {
    let (engine, _, user) = engine();
    let mut unlocked = Vec::new();
    for _ in 0..12 {
        let outcome = engine.record_game_played(&user, 5, true, 0).unwrap();
        unlocked.extend(outcome.unlocked_achievements.into_iter().map(|a| a.id));
    }

    assert_eq!(unlocked, vec!["first_game".to_string(), "streak_10".to_string()]);
    let progress = engine.progress(&user).unwrap();
    assert_eq!(progress.unlocked_achievements().count(), 2);
    assert_eq!(progress.longest_streak, 12);
}

/// Unlock XP that crosses level 10 unlocks the level achievement in the same call.
#[test]
fn test_chained_unlock() {
    let (engine, _, user) = engine();
    engine.restore_progress(
        &user,
        &ProgressPatch {
            level: Some(9),
            xp: Some(0),
            xp_to_next_level: Some(50),
            ..ProgressPatch::default()
        },
    );

    let outcome = engine.record_game_played(&user, 1, false, 0).unwrap();
    let ids: Vec<&str> = outcome.unlocked_achievements.iter().map(|a| a.id.as_str()).collect();
    assert_eq!(ids, vec!["first_game", "level_10"]);
    assert!(outcome.levels_gained >= 1);
}

/// A loss resets the current streak but not the longest.
#[test]
fn test_loss_resets_streak() {
    let (engine, _, user) = engine();
    engine.record_game_played(&user, 1, true, 0).unwrap();
    engine.record_game_played(&user, 1, true, 0).unwrap();
    engine.record_game_played(&user, 1, false, 0).unwrap();

    let progress = engine.progress(&user).unwrap();
    assert_eq!(progress.current_streak, 0);
    assert_eq!(progress.longest_streak, 2);
    assert_eq!(progress.total_games_played, 3);
}

// =============================================================================
// Missions
// =============================================================================

/// One big game completes the score mission and pays its XP once.
#[test]
fn test_score_mission() {
    let (engine, _, user) = engine();
    let before = engine.progress(&user).unwrap();

    let outcome = engine.record_game_played(&user, 12_000, false, 0).unwrap();
    let ids: Vec<&str> = outcome.completed_missions.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec!["daily_score"]);
    assert_eq!(outcome.mission_tokens(), 150);

    let after = engine.progress(&user).unwrap();
    // first_game 100 + daily_score 300
    assert_eq!(after.xp, before.xp + 400);
}

/// Missions stop advancing at midnight and come back fresh after rollover.
#[test]
fn test_missions_expire_and_refresh() {
    let (engine, clock, user) = engine();
    engine.record_game_played(&user, 1, false, 0).unwrap();
    engine.record_game_played(&user, 1, false, 0).unwrap();

    clock.advance(Duration::days(1));
    let outcome = engine.record_game_played(&user, 1, false, 0).unwrap();
    assert!(outcome.completed_missions.is_empty());

    engine.roll_over_day(&user, clock.today()).unwrap();
    for _ in 0..2 {
        engine.record_game_played(&user, 1, false, 0).unwrap();
    }
    let outcome = engine.record_game_played(&user, 1, false, 0).unwrap();
    assert_eq!(outcome.completed_missions.len(), 1);
}

// =============================================================================
// Daily Reward
// =============================================================================

/// The daily streak grows on consecutive days and the reward caps at 7.
#[test]
fn test_daily_streak_caps() {
    let (engine, clock, user) = engine();
    let mut last = None;
    for _ in 0..9 {
        engine.roll_over_day(&user, clock.today()).unwrap();
        last = engine.claim_daily_reward(&user).unwrap();
        clock.advance(Duration::days(1));
    }
    let last = last.unwrap();
    assert_eq!(last.streak, 9);
    assert_eq!((last.xp, last.soft_tokens), (700, 350));
}

/// Skipping a day starts the streak over.
#[test]
fn test_missed_day_resets_streak() {
    let (engine, clock, user) = engine();
    engine.claim_daily_reward(&user).unwrap();
    clock.advance(Duration::days(1));
    engine.roll_over_day(&user, clock.today()).unwrap();
    engine.claim_daily_reward(&user).unwrap();

    clock.advance(Duration::days(2));
    engine.roll_over_day(&user, clock.today()).unwrap();
    assert_eq!(engine.progress(&user).unwrap().daily_reward_streak, 0);
    assert_eq!(engine.claim_daily_reward(&user).unwrap().unwrap().streak, 1);
}

/// Without a rollover the claim stays closed.
#[test]
fn test_claim_stays_closed_without_rollover() {
    let (engine, clock, user) = engine();
    engine.claim_daily_reward(&user).unwrap();
    clock.advance(Duration::days(3));
    assert_eq!(engine.claim_daily_reward(&user).unwrap(), None);
}
