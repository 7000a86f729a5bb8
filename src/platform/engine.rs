//! The platform engine: session-level operations across economy and
//! gamification.

use std::sync::{Arc, Mutex, PoisonError, RwLock};

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::adapter::GameAdapter;
use crate::core::{Clock, Difficulty, PlatformError, Result, UserId};
use crate::economy::{EconomyEngine, MovementKind, RewardCalculation, TokenType, Wallet, WalletMovement};
use crate::gamification::{
    Achievement, DailyReward, GamificationEngine, Mission, ProgressPatch, UserProgress,
};
use crate::games::GameCatalog;

use super::config::{PlatformConfig, RewardPolicy};
use super::snapshot::{PlatformUserState, WalletBalances};

/// Starting values for a user.
///
/// `coins` and `gems` only apply when the wallet is created; `level`, `xp`
/// and `max_xp` are reapplied on every [`PlatformEngine::init_user`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlatformUserSeed {
    pub coins: Option<u64>,
    pub gems: Option<u64>,
    pub level: Option<u32>,
    pub xp: Option<u64>,
    pub max_xp: Option<u64>,
}

impl PlatformUserSeed {
    #[must_use]
    pub fn coins(coins: u64) -> Self {
        Self {
            coins: Some(coins),
            ..Self::default()
        }
    }
}

/// A finished session as reported by the caller.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameFinishInput {
    pub game_id: String,
    pub score: u64,
    pub difficulty: Difficulty,
    pub won: bool,
}

/// What a finished session paid out.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameFinishOutput {
    pub base_reward: u64,
    pub bonus_from_achievements: u64,
    pub bonus_from_missions: u64,
    /// Hard tokens from missions that carry them.
    pub gems_from_missions: u64,
    pub total_coins_awarded: u64,
    pub xp_earned: u64,
    pub calculation: RewardCalculation,
    pub unlocked_achievements: Vec<Achievement>,
    pub completed_missions: Vec<Mission>,
    pub progress: UserProgress,
}

/// One mutex per user, held for a whole platform operation.
#[derive(Debug, Default)]
struct UserLocks {
    locks: RwLock<FxHashMap<UserId, Arc<Mutex<()>>>>,
}

impl UserLocks {
    fn for_user(&self, user_id: &UserId) -> Arc<Mutex<()>> {
        if let Some(lock) = self.locks.read().unwrap_or_else(PoisonError::into_inner).get(user_id) {
            return lock.clone();
        }
        self.locks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(user_id.clone())
            .or_default()
            .clone()
    }
}

/// Composes the economy and gamification engines into session operations.
///
/// Owns neither store. Every operation on a user runs under that user's
/// lock, so an entry fee check and its debit are never interleaved with
/// another session of the same user.
///
/// ## Example
///
/// ```
/// use arcade_hub::core::{Difficulty, UserId};
/// use arcade_hub::platform::{GameFinishInput, PlatformEngine, PlatformUserSeed};
///
/// let platform = PlatformEngine::new();
/// let ana = UserId::new("ana");
/// platform.init_user(&ana, Some(&PlatformUserSeed::coins(100))).unwrap();
///
/// platform.start_game(&ana, "snake", 10).unwrap();
/// let out = platform
///     .finish_game(
///         &ana,
///         &GameFinishInput {
///             game_id: "snake".into(),
///             score: 200,
///             difficulty: Difficulty::Medium,
///             won: false,
///         },
///     )
///     .unwrap();
///
/// assert_eq!(out.base_reward, 330);
/// assert_eq!(out.bonus_from_achievements, 50);
/// assert_eq!(platform.coins(&ana).unwrap(), 100 - 10 + 330 + 50);
/// ```
#[derive(Debug)]
pub struct PlatformEngine {
    economy: EconomyEngine,
    gamification: GamificationEngine,
    catalog: GameCatalog,
    rewards: RewardPolicy,
    locks: UserLocks,
}

impl PlatformEngine {
    /// Default engines, the full game catalog, system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(PlatformConfig::default())
    }

    #[must_use]
    pub fn with_config(config: PlatformConfig) -> Self {
        Self {
            economy: EconomyEngine::new().with_config(config.economy),
            gamification: GamificationEngine::new().with_config(config.progression),
            catalog: GameCatalog::new(),
            rewards: config.rewards,
            locks: UserLocks::default(),
        }
    }

    /// Assemble from existing engines.
    #[must_use]
    pub fn from_parts(economy: EconomyEngine, gamification: GamificationEngine, catalog: GameCatalog) -> Self {
        Self {
            economy,
            gamification,
            catalog,
            rewards: RewardPolicy::default(),
            locks: UserLocks::default(),
        }
    }

    /// Use `clock` in both engines.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.economy = self.economy.with_clock(clock.clone());
        self.gamification = self.gamification.with_clock(clock);
        self
    }

    #[must_use]
    pub fn with_rewards(mut self, rewards: RewardPolicy) -> Self {
        self.rewards = rewards;
        self
    }

    #[must_use]
    pub fn economy(&self) -> &EconomyEngine {
        &self.economy
    }

    #[must_use]
    pub fn gamification(&self) -> &GamificationEngine {
        &self.gamification
    }

    #[must_use]
    pub fn catalog(&self) -> &GameCatalog {
        &self.catalog
    }

    fn lock_user(&self, user_id: &UserId) -> Arc<Mutex<()>> {
        self.locks.for_user(user_id)
    }

    // === Users ===

    /// Create the wallet and progress record if absent, then reapply the
    /// seed's progression fields.
    ///
    /// # Errors
    ///
    /// `InvalidAmount` if a seeded balance does not fit the ledger.
    pub fn init_user(&self, user_id: &UserId, seed: Option<&PlatformUserSeed>) -> Result<()> {
        let lock = self.lock_user(user_id);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        let seed = seed.copied().unwrap_or_default();

        if !self.economy.has_wallet(user_id) {
            self.economy
                .create_wallet(user_id, seed.coins.unwrap_or(0), seed.gems.unwrap_or(0))?;
        }
        self.gamification.create_user_progress(user_id);

        if seed.level.is_some() || seed.xp.is_some() || seed.max_xp.is_some() {
            self.gamification.restore_progress(
                user_id,
                &ProgressPatch {
                    level: seed.level,
                    xp: seed.xp,
                    xp_to_next_level: seed.max_xp,
                    ..ProgressPatch::default()
                },
            );
        }
        Ok(())
    }

    // === Sessions ===

    /// Charge the entry fee for a session of `game_id`.
    ///
    /// A zero fee charges nothing. Unknown games are rejected before any
    /// debit.
    ///
    /// # Errors
    ///
    /// `GameNotRegistered`, `WalletNotFound`, or `InsufficientFunds` (the
    /// session must not start).
    pub fn start_game(&self, user_id: &UserId, game_id: &str, min_bet: u64) -> Result<Option<WalletMovement>> {
        if !self.catalog.contains(game_id) {
            return Err(PlatformError::GameNotRegistered(game_id.to_string()));
        }
        let lock = self.lock_user(user_id);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        if min_bet == 0 {
            self.economy.wallet(user_id)?;
            return Ok(None);
        }
        let entry = self
            .economy
            .deduct_tokens(user_id, min_bet, TokenType::Soft, &format!("entry:{game_id}"))?;
        tracing::info!(user = %user_id, game = game_id, fee = min_bet, "session paid");
        Ok(Some(entry))
    }

    /// New adapter for `game_id`.
    ///
    /// # Errors
    ///
    /// `GameNotRegistered`.
    pub fn create_game(&self, game_id: &str) -> Result<Box<dyn GameAdapter>> {
        self.catalog.create(game_id)
    }

    /// Pay out a finished session and fold it into the user's progress.
    ///
    /// The reward uses the user's streak before this game, with a streak of
    /// zero counted as one. Base reward, achievement bonus and mission bonus
    /// are separate movements, each skipped when zero.
    ///
    /// # Errors
    ///
    /// `WalletNotFound` or `ProgressNotFound` when the user was never
    /// initialized.
    pub fn finish_game(&self, user_id: &UserId, input: &GameFinishInput) -> Result<GameFinishOutput> {
        let lock = self.lock_user(user_id);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        self.economy.wallet(user_id)?;
        let streak = self.gamification.progress(user_id)?.current_streak.max(1);

        let calculation = self.economy.calculate_reward(
            input.score,
            input.difficulty,
            streak,
            self.rewards.event_multiplier,
        );
        let base_reward = calculation.final_reward;
        if base_reward > 0 {
            self.economy.reward_user(
                user_id,
                base_reward,
                MovementKind::Reward,
                Some(format!("game:{}", input.game_id).as_str()),
            )?;
        }

        let xp_earned = self.rewards.xp_for(input.score);
        let outcome = self
            .gamification
            .record_game_played(user_id, input.score, input.won, xp_earned)?;

        let bonus_from_achievements = outcome.achievement_tokens();
        if bonus_from_achievements > 0 {
            self.economy.reward_user(
                user_id,
                bonus_from_achievements,
                MovementKind::Achievement,
                Some(format!("achievements:{}", input.game_id).as_str()),
            )?;
        }

        let mission_reference = format!("missions:{}", input.game_id);
        let bonus_from_missions = outcome.mission_tokens();
        if bonus_from_missions > 0 {
            self.economy.reward_user(
                user_id,
                bonus_from_missions,
                MovementKind::Reward,
                Some(mission_reference.as_str()),
            )?;
        }
        let gems_from_missions: u64 = outcome
            .completed_missions
            .iter()
            .filter_map(|m| m.reward.hard_tokens)
            .sum();
        if gems_from_missions > 0 {
            self.economy.credit(
                user_id,
                gems_from_missions,
                TokenType::Hard,
                MovementKind::Reward,
                Some(mission_reference.as_str()),
            )?;
        }

        let total_coins_awarded = base_reward
            .saturating_add(bonus_from_achievements)
            .saturating_add(bonus_from_missions);
        tracing::info!(
            user = %user_id,
            game = %input.game_id,
            score = input.score,
            won = input.won,
            coins = total_coins_awarded,
            xp = xp_earned,
            "session finished"
        );

        Ok(GameFinishOutput {
            base_reward,
            bonus_from_achievements,
            bonus_from_missions,
            gems_from_missions,
            total_coins_awarded,
            xp_earned,
            calculation,
            unlocked_achievements: outcome.unlocked_achievements,
            completed_missions: outcome.completed_missions,
            progress: self.gamification.progress(user_id)?,
        })
    }

    /// Roll the user into today, claim the daily reward and pay its tokens
    /// as a `DailyBonus`.
    ///
    /// # Errors
    ///
    /// `ProgressNotFound` or `WalletNotFound`.
    pub fn claim_daily_reward(&self, user_id: &UserId) -> Result<Option<DailyReward>> {
        let lock = self.lock_user(user_id);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        self.economy.wallet(user_id)?;
        let today = self.gamification.clock().today();
        self.gamification.roll_over_day(user_id, today)?;
        let Some(reward) = self.gamification.claim_daily_reward(user_id)? else {
            return Ok(None);
        };
        if reward.soft_tokens > 0 {
            self.economy.reward_user(
                user_id,
                reward.soft_tokens,
                MovementKind::DailyBonus,
                Some(format!("daily:{}", reward.streak).as_str()),
            )?;
        }
        Ok(Some(reward))
    }

    // === Queries ===

    /// Soft-token balance.
    ///
    /// # Errors
    ///
    /// `WalletNotFound`.
    pub fn coins(&self, user_id: &UserId) -> Result<u64> {
        self.economy.balance(user_id, TokenType::Soft)
    }

    /// Hard-token balance.
    ///
    /// # Errors
    ///
    /// `WalletNotFound`.
    pub fn gems(&self, user_id: &UserId) -> Result<u64> {
        self.economy.balance(user_id, TokenType::Hard)
    }

    /// # Errors
    ///
    /// `WalletNotFound`.
    pub fn wallet(&self, user_id: &UserId) -> Result<Wallet> {
        self.economy.wallet(user_id)
    }

    /// # Errors
    ///
    /// `ProgressNotFound`.
    pub fn progress(&self, user_id: &UserId) -> Result<UserProgress> {
        self.gamification.progress(user_id)
    }

    /// Most recent movements first.
    ///
    /// # Errors
    ///
    /// `WalletNotFound`.
    pub fn movements(&self, user_id: &UserId, limit: usize) -> Result<Vec<WalletMovement>> {
        self.economy.movements(user_id, limit)
    }

    // === Persistence ===

    /// Balances and progress scalars of an initialized user.
    ///
    /// # Errors
    ///
    /// `WalletNotFound` or `ProgressNotFound`.
    pub fn export_user_state(&self, user_id: &UserId) -> Result<PlatformUserState> {
        let lock = self.lock_user(user_id);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let wallet = self.economy.wallet(user_id)?;
        let progress = self.gamification.progress(user_id)?;
        Ok(PlatformUserState {
            wallet: WalletBalances {
                soft_tokens: Some(wallet.soft_tokens),
                hard_tokens: Some(wallet.hard_tokens),
            },
            progress: ProgressPatch::from(&progress),
        })
    }

    /// Overlay a persisted state, creating the user if needed.
    ///
    /// Balances are set directly; absent fields keep their current value.
    pub fn import_user_state(&self, user_id: &UserId, state: &PlatformUserState) {
        let lock = self.lock_user(user_id);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let current = self.economy.wallet(user_id).ok();
        let soft = state
            .wallet
            .soft_tokens
            .or(current.as_ref().map(|w| w.soft_tokens))
            .unwrap_or(0);
        let hard = state
            .wallet
            .hard_tokens
            .or(current.as_ref().map(|w| w.hard_tokens))
            .unwrap_or(0);
        self.economy.restore_wallet(user_id, soft, hard);
        self.gamification.restore_progress(user_id, &state.progress);
        tracing::info!(user = %user_id, soft, hard, "user state imported");
    }
}

impl Default for PlatformEngine {
    fn default() -> Self {
        Self::new()
    }
}
