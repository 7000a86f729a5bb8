//! The gamification engine: levels, streaks, achievements and missions.

use std::sync::Arc;

use chrono::NaiveDate;
use rustc_hash::FxHashSet;

use crate::core::{next_local_midnight, Clock, PlatformError, Result, SystemClock, UserId};

use super::mission::{daily_missions, MissionGoal, MissionKind};
use super::progress::{DailyReward, GameProgress, LevelUp, ProgressPatch, ProgressionConfig, UserProgress};
use super::store::{lock_progress, InMemoryProgressRepository, ProgressHandle, ProgressRepository};

/// Owns every user's [`UserProgress`].
///
/// ## Example
///
/// ```
/// use arcade_hub::core::UserId;
/// use arcade_hub::gamification::GamificationEngine;
///
/// let gamification = GamificationEngine::new();
/// let kim = UserId::new("kim");
/// gamification.create_user_progress(&kim);
///
/// let outcome = gamification.record_game_played(&kim, 400, true, 50).unwrap();
/// assert_eq!(outcome.unlocked_achievements[0].id, "first_game");
///
/// let progress = gamification.progress(&kim).unwrap();
/// assert_eq!(progress.current_streak, 1);
/// assert_eq!(progress.xp, 150);
/// ```
#[derive(Debug, Clone)]
pub struct GamificationEngine {
    repository: Arc<dyn ProgressRepository>,
    clock: Arc<dyn Clock>,
    config: ProgressionConfig,
}

impl GamificationEngine {
    #[must_use]
    pub fn new() -> Self {
        Self {
            repository: Arc::new(InMemoryProgressRepository::new()),
            clock: Arc::new(SystemClock),
            config: ProgressionConfig::default(),
        }
    }

    #[must_use]
    pub fn with_repository(mut self, repository: Arc<dyn ProgressRepository>) -> Self {
        self.repository = repository;
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn with_config(mut self, config: ProgressionConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn config(&self) -> &ProgressionConfig {
        &self.config
    }

    #[must_use]
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    fn handle(&self, user_id: &UserId) -> Result<ProgressHandle> {
        self.repository
            .get(user_id)
            .ok_or_else(|| PlatformError::ProgressNotFound(user_id.clone()))
    }

    fn fresh(&self, user_id: &UserId) -> UserProgress {
        let now = self.clock.now();
        UserProgress::new(user_id.clone(), &self.config, next_local_midnight(now))
    }

    #[must_use]
    pub fn has_progress(&self, user_id: &UserId) -> bool {
        self.repository.contains(user_id)
    }

    /// XP required to leave `level`.
    #[must_use]
    pub fn xp_needed(&self, level: u32) -> u64 {
        self.config.xp_needed(level)
    }

    /// Start a user at level 1. An existing record is returned unchanged.
    pub fn create_user_progress(&self, user_id: &UserId) -> UserProgress {
        let handle = self.repository.insert_if_absent(self.fresh(user_id));
        let progress = lock_progress(&handle).clone();
        tracing::debug!(user = %user_id, level = progress.level, "progress ready");
        progress
    }

    /// Copy of the user's progress.
    ///
    /// # Errors
    ///
    /// `ProgressNotFound`.
    pub fn progress(&self, user_id: &UserId) -> Result<UserProgress> {
        let handle = self.handle(user_id)?;
        let progress = lock_progress(&handle).clone();
        Ok(progress)
    }

    /// Add XP, levelling up as many times as it pays for.
    ///
    /// # Errors
    ///
    /// `ProgressNotFound`.
    pub fn award_xp(&self, user_id: &UserId, amount: u64) -> Result<LevelUp> {
        let handle = self.handle(user_id)?;
        let mut progress = lock_progress(&handle);
        let level_up = progress.add_xp(amount, &self.config);
        if level_up.leveled() {
            tracing::info!(user = %user_id, level = level_up.new_level, gained = level_up.levels_gained, "level up");
        }
        Ok(level_up)
    }

    /// Fold one finished game into the user's progress.
    ///
    /// Totals and streak first, then `xp_earned`, then achievements, then
    /// missions. Unlock and completion XP is paid on the spot and can unlock
    /// further achievements. Each mission appears at most once in the result.
    ///
    /// # Errors
    ///
    /// `ProgressNotFound`.
    pub fn record_game_played(&self, user_id: &UserId, score: u64, won: bool, xp_earned: u64) -> Result<GameProgress> {
        let handle = self.handle(user_id)?;
        let mut progress = lock_progress(&handle);
        let now = self.clock.now();
        let start_level = progress.level;
        let mut outcome = GameProgress::default();

        progress.total_games_played = progress.total_games_played.saturating_add(1);
        progress.total_score = progress.total_score.saturating_add(score);
        progress.apply_result(won);
        if xp_earned > 0 {
            progress.add_xp(xp_earned, &self.config);
        }

        self.unlock_achievements(&mut progress, &mut outcome);

        let mut completed = FxHashSet::default();
        for i in 0..progress.missions.len() {
            let mission = &mut progress.missions[i];
            let mut done = mission.advance(MissionGoal::PlayGames, 1, now);
            done |= mission.advance(MissionGoal::EarnScore, score, now);
            if won {
                done |= mission.advance(MissionGoal::WinStreak, 1, now);
            }
            if done && completed.insert(mission.id.clone()) {
                let mission = mission.clone();
                progress.add_xp(mission.reward.xp, &self.config);
                tracing::debug!(user = %user_id, mission = %mission.id, "mission completed");
                outcome.completed_missions.push(mission);
            }
        }

        if !outcome.completed_missions.is_empty() {
            self.unlock_achievements(&mut progress, &mut outcome);
        }

        outcome.new_level = progress.level;
        outcome.levels_gained = progress.level.saturating_sub(start_level);
        if outcome.levels_gained > 0 {
            tracing::info!(user = %user_id, level = progress.level, gained = outcome.levels_gained, "level up");
        }
        Ok(outcome)
    }

    /// Unlock achievements until none is left to unlock.
    fn unlock_achievements(&self, progress: &mut UserProgress, outcome: &mut GameProgress) {
        let now = self.clock.now();
        loop {
            let totals = progress.totals();
            let Some(achievement) = progress
                .achievements
                .iter_mut()
                .find(|a| !a.unlocked && a.is_met(&totals))
            else {
                break;
            };
            achievement.try_unlock(&totals, now);
            let achievement = achievement.clone();
            progress.add_xp(achievement.xp_reward, &self.config);
            tracing::info!(user = %progress.user_id, achievement = %achievement.id, "achievement unlocked");
            outcome.unlocked_achievements.push(achievement);
        }
    }

    /// Claim today's reward.
    ///
    /// Returns `None` when already claimed. Otherwise the streak grows by one
    /// and the XP part is applied; the token part is for the caller to pay.
    ///
    /// # Errors
    ///
    /// `ProgressNotFound`.
    pub fn claim_daily_reward(&self, user_id: &UserId) -> Result<Option<DailyReward>> {
        let handle = self.handle(user_id)?;
        let mut progress = lock_progress(&handle);
        if progress.daily_reward_claimed {
            return Ok(None);
        }

        progress.daily_reward_streak = progress.daily_reward_streak.saturating_add(1);
        let streak = progress.daily_reward_streak;
        let (xp, soft_tokens) = self.config.daily_reward(streak);
        let level_up = progress.add_xp(xp, &self.config);
        progress.daily_reward_claimed = true;
        progress.last_daily_claim = Some(self.clock.today());

        tracing::info!(user = %user_id, streak, xp, soft_tokens, "daily reward claimed");
        Ok(Some(DailyReward {
            xp,
            soft_tokens,
            streak,
            level_up,
        }))
    }

    /// Move the user into `today`.
    ///
    /// - claimed today (or later): nothing
    /// - last claim yesterday: claim reopens, streak kept
    /// - last claim older: claim reopens, streak back to 0
    /// - never claimed: claim reopens, streak kept
    ///
    /// Expired daily missions are replaced with fresh ones.
    ///
    /// # Errors
    ///
    /// `ProgressNotFound`.
    pub fn roll_over_day(&self, user_id: &UserId, today: NaiveDate) -> Result<()> {
        let handle = self.handle(user_id)?;
        let mut progress = lock_progress(&handle);

        match progress.last_daily_claim {
            Some(last) if last >= today => {}
            Some(last) if last.succ_opt() == Some(today) => progress.daily_reward_claimed = false,
            Some(_) => {
                progress.daily_reward_claimed = false;
                if progress.daily_reward_streak > 0 {
                    tracing::debug!(user = %user_id, lost = progress.daily_reward_streak, "daily streak broken");
                }
                progress.daily_reward_streak = 0;
            }
            None => progress.daily_reward_claimed = false,
        }

        let now = self.clock.now();
        progress
            .missions
            .retain(|m| m.kind != MissionKind::Daily || !m.is_expired(now));
        if !progress.missions.iter().any(|m| m.kind == MissionKind::Daily) {
            progress.missions.extend(daily_missions(next_local_midnight(now)));
        }
        Ok(())
    }

    /// Overlay persisted scalars, creating the record if needed.
    pub fn restore_progress(&self, user_id: &UserId, patch: &ProgressPatch) -> UserProgress {
        let handle = self.repository.insert_if_absent(self.fresh(user_id));
        let mut progress = lock_progress(&handle);
        progress.apply_patch(patch);
        tracing::debug!(user = %user_id, level = progress.level, xp = progress.xp, "progress restored");
        progress.clone()
    }
}

impl Default for GamificationEngine {
    fn default() -> Self {
        Self::new()
    }
}
