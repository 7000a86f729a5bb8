//! The economy engine: wallet operations on top of a [`WalletRepository`].

use std::sync::Arc;

use serde_json::json;

use crate::core::{Clock, Difficulty, PlatformError, Result, SystemClock, UserId};

use super::reward::{EconomyConfig, RewardCalculation};
use super::store::{
    lock_account, AccountHandle, InMemoryWalletRepository, MovementRequest, WalletAccount,
    WalletRepository,
};
use super::wallet::{MovementId, MovementKind, TokenType, Wallet, WalletMovement};

/// Owns wallets and the movement ledger.
///
/// Every balance change is a [`WalletMovement`] appended under the wallet's
/// lock; the only exception is [`restore_wallet`](Self::restore_wallet),
/// reserved for reloading persisted state.
///
/// ## Example
///
/// ```
/// use arcade_hub::core::UserId;
/// use arcade_hub::economy::{EconomyEngine, MovementKind, TokenType};
///
/// let economy = EconomyEngine::new();
/// let ana = UserId::new("ana");
/// economy.create_wallet(&ana, 100, 0).unwrap();
///
/// economy.deduct_tokens(&ana, 30, TokenType::Soft, "entry:snake").unwrap();
/// economy.reward_user(&ana, 45, MovementKind::Reward, Some("game:snake")).unwrap();
/// assert_eq!(economy.wallet(&ana).unwrap().soft_tokens, 115);
///
/// assert!(economy.deduct_tokens(&ana, 1, TokenType::Hard, "shop").is_err());
/// ```
#[derive(Debug, Clone)]
pub struct EconomyEngine {
    repository: Arc<dyn WalletRepository>,
    clock: Arc<dyn Clock>,
    config: EconomyConfig,
}

impl EconomyEngine {
    /// In-memory storage, system clock, default tuning.
    #[must_use]
    pub fn new() -> Self {
        Self {
            repository: Arc::new(InMemoryWalletRepository::new()),
            clock: Arc::new(SystemClock),
            config: EconomyConfig::default(),
        }
    }

    #[must_use]
    pub fn with_repository(mut self, repository: Arc<dyn WalletRepository>) -> Self {
        self.repository = repository;
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn with_config(mut self, config: EconomyConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn config(&self) -> &EconomyConfig {
        &self.config
    }

    fn account(&self, user_id: &UserId) -> Result<AccountHandle> {
        self.repository
            .get(user_id)
            .ok_or_else(|| PlatformError::WalletNotFound(user_id.clone()))
    }

    fn signed(amount: u64) -> Result<i64> {
        i64::try_from(amount).map_err(|_| PlatformError::InvalidAmount(format!("{amount} is too large")))
    }

    /// Commit one movement on the user's wallet.
    fn commit(&self, user_id: &UserId, request: MovementRequest) -> Result<WalletMovement> {
        let handle = self.account(user_id)?;
        let mut account = lock_account(&handle);
        account.apply(request, self.clock.now())
    }

    // === Wallets ===

    /// Does the user have a wallet?
    #[must_use]
    pub fn has_wallet(&self, user_id: &UserId) -> bool {
        self.repository.contains(user_id)
    }

    /// Create a wallet whose opening balances are recorded as `AdminAdjust`
    /// movements.
    ///
    /// An existing wallet is returned unchanged.
    ///
    /// # Errors
    ///
    /// `InvalidAmount` if an opening balance does not fit a signed movement.
    pub fn create_wallet(&self, user_id: &UserId, initial_soft: u64, initial_hard: u64) -> Result<Wallet> {
        let soft = Self::signed(initial_soft)?;
        let hard = Self::signed(initial_hard)?;

        if let Some(existing) = self.repository.get(user_id) {
            return Ok(lock_account(&existing).wallet().clone());
        }

        let now = self.clock.now();
        let mut account = WalletAccount::new(user_id.clone(), now);
        if soft != 0 {
            account.apply(
                MovementRequest::new(MovementKind::AdminAdjust, TokenType::Soft, soft)
                    .with_reference("initial_soft_tokens"),
                now,
            )?;
        }
        if hard != 0 {
            account.apply(
                MovementRequest::new(MovementKind::AdminAdjust, TokenType::Hard, hard)
                    .with_reference("initial_hard_tokens"),
                now,
            )?;
        }

        // A concurrent creator may have won; report whatever is stored
        let handle = self.repository.insert_if_absent(account);
        let wallet = lock_account(&handle).wallet().clone();
        tracing::info!(user = %user_id, soft = wallet.soft_tokens, hard = wallet.hard_tokens, "wallet created");
        Ok(wallet)
    }

    /// Set both balances directly, creating the wallet if needed.
    ///
    /// Only for reloading persisted state: no movement is recorded.
    pub fn restore_wallet(&self, user_id: &UserId, soft: u64, hard: u64) -> Wallet {
        let now = self.clock.now();
        let handle = self
            .repository
            .insert_if_absent(WalletAccount::new(user_id.clone(), now));
        let mut account = lock_account(&handle);
        account.restore(soft, hard, now);
        tracing::debug!(user = %user_id, soft, hard, "wallet restored");
        account.wallet().clone()
    }

    /// Copy of the user's wallet.
    ///
    /// # Errors
    ///
    /// `WalletNotFound`.
    pub fn wallet(&self, user_id: &UserId) -> Result<Wallet> {
        let handle = self.account(user_id)?;
        let wallet = lock_account(&handle).wallet().clone();
        Ok(wallet)
    }

    /// One balance of the user's wallet.
    ///
    /// # Errors
    ///
    /// `WalletNotFound`.
    pub fn balance(&self, user_id: &UserId, token_type: TokenType) -> Result<u64> {
        Ok(self.wallet(user_id)?.balance(token_type))
    }

    // === Movements ===

    /// Debit `amount` as a `Purchase`.
    ///
    /// # Errors
    ///
    /// `WalletNotFound`, `InvalidAmount` for zero, `InsufficientFunds` when
    /// the balance is lower than `amount` (the wallet is left untouched).
    pub fn deduct_tokens(
        &self,
        user_id: &UserId,
        amount: u64,
        token_type: TokenType,
        reference: &str,
    ) -> Result<WalletMovement> {
        if amount == 0 {
            return Err(PlatformError::InvalidAmount("cannot deduct zero tokens".into()));
        }
        let debit = -Self::signed(amount)?;

        let result = self.commit(
            user_id,
            MovementRequest::new(MovementKind::Purchase, token_type, debit).with_reference(reference),
        );
        if let Err(PlatformError::InsufficientFunds { required, available, .. }) = &result {
            tracing::warn!(user = %user_id, token = %token_type, required, available, reference, "insufficient funds");
        }
        result
    }

    /// Credit soft tokens.
    ///
    /// # Errors
    ///
    /// `WalletNotFound`, or `InvalidAmount` on overflow.
    pub fn reward_user(
        &self,
        user_id: &UserId,
        amount: u64,
        kind: MovementKind,
        reference: Option<&str>,
    ) -> Result<WalletMovement> {
        self.credit(user_id, amount, TokenType::Soft, kind, reference)
    }

    /// Credit either currency with an arbitrary movement kind.
    ///
    /// # Errors
    ///
    /// `WalletNotFound`, or `InvalidAmount` on overflow.
    pub fn credit(
        &self,
        user_id: &UserId,
        amount: u64,
        token_type: TokenType,
        kind: MovementKind,
        reference: Option<&str>,
    ) -> Result<WalletMovement> {
        let mut request = MovementRequest::new(kind, token_type, Self::signed(amount)?);
        if let Some(reference) = reference {
            request = request.with_reference(reference);
        }
        self.commit(user_id, request)
    }

    /// Credit purchased hard tokens.
    ///
    /// # Errors
    ///
    /// `WalletNotFound`, or `InvalidAmount` on overflow.
    pub fn add_hard_tokens(&self, user_id: &UserId, amount: u64, transaction_id: &str) -> Result<WalletMovement> {
        self.commit(
            user_id,
            MovementRequest::new(MovementKind::Purchase, TokenType::Hard, Self::signed(amount)?)
                .with_reference(transaction_id),
        )
    }

    /// Compensate an earlier debit with a `Refund` of the same size.
    ///
    /// # Errors
    ///
    /// - `MovementNotFound` if the wallet has no such movement
    /// - `InvalidAmount` if the movement is not a debit
    /// - `AlreadyRefunded` on a second refund of the same movement
    pub fn refund(&self, user_id: &UserId, movement_id: MovementId) -> Result<WalletMovement> {
        let handle = self.account(user_id)?;
        let mut account = lock_account(&handle);

        let original = account
            .find(movement_id)
            .cloned()
            .ok_or_else(|| PlatformError::MovementNotFound(movement_id.to_string()))?;
        if !original.is_debit() {
            return Err(PlatformError::InvalidAmount(format!(
                "movement {movement_id} is not a debit"
            )));
        }
        if account.is_refunded(movement_id) {
            return Err(PlatformError::AlreadyRefunded(movement_id.to_string()));
        }

        let refund = account.apply(
            MovementRequest::new(MovementKind::Refund, original.token_type, -original.amount)
                .with_reference(movement_id.to_string()),
            self.clock.now(),
        )?;
        account.mark_refunded(movement_id);
        tracing::info!(user = %user_id, refunded = %movement_id, amount = refund.amount, "movement refunded");
        Ok(refund)
    }

    /// Swap hard tokens for `hard_amount × rate` soft tokens.
    ///
    /// Both movements commit together or not at all.
    ///
    /// # Errors
    ///
    /// `WalletNotFound`, `InvalidAmount` for zero amounts or overflow,
    /// `InsufficientFunds` when the hard balance is too low.
    pub fn exchange_tokens(
        &self,
        user_id: &UserId,
        hard_amount: u64,
        rate: u64,
    ) -> Result<(WalletMovement, WalletMovement)> {
        if hard_amount == 0 || rate == 0 {
            return Err(PlatformError::InvalidAmount("exchange needs a positive amount and rate".into()));
        }
        let soft_amount = hard_amount
            .checked_mul(rate)
            .ok_or_else(|| PlatformError::InvalidAmount(format!("{hard_amount} × {rate} overflows")))?;
        let debit = -Self::signed(hard_amount)?;
        let credit = Self::signed(soft_amount)?;

        let handle = self.account(user_id)?;
        let mut account = lock_account(&handle);
        let now = self.clock.now();

        // Work on a copy; the ledger clone is cheap
        let mut draft = account.clone();
        let deduction = draft.apply(
            MovementRequest::new(MovementKind::Purchase, TokenType::Hard, debit)
                .with_reference("token_exchange"),
            now,
        )?;
        let addition = draft.apply(
            MovementRequest::new(MovementKind::Reward, TokenType::Soft, credit)
                .with_reference("token_exchange")
                .with_metadata(json!({ "linked": deduction.id, "rate": rate })),
            now,
        )?;
        *account = draft;

        Ok((deduction, addition))
    }

    /// Exchange at the configured default rate.
    ///
    /// # Errors
    ///
    /// As [`exchange_tokens`](Self::exchange_tokens).
    pub fn exchange_at_default_rate(
        &self,
        user_id: &UserId,
        hard_amount: u64,
    ) -> Result<(WalletMovement, WalletMovement)> {
        self.exchange_tokens(user_id, hard_amount, self.config.exchange_rate)
    }

    /// Most recent movements first, at most `limit`.
    ///
    /// # Errors
    ///
    /// `WalletNotFound`.
    pub fn movements(&self, user_id: &UserId, limit: usize) -> Result<Vec<WalletMovement>> {
        let handle = self.account(user_id)?;
        let account = lock_account(&handle);
        Ok(account.ledger().iter().rev().take(limit).cloned().collect())
    }

    /// Recompute balances from the ledger.
    ///
    /// # Errors
    ///
    /// `WalletNotFound`, or `LedgerInvariant` on any discrepancy.
    pub fn verify_ledger(&self, user_id: &UserId) -> Result<()> {
        let handle = self.account(user_id)?;
        let account = lock_account(&handle);
        account.verify()
    }

    // === Rewards ===

    /// Reward breakdown for a finished session.
    #[must_use]
    pub fn calculate_reward(
        &self,
        score: u64,
        difficulty: Difficulty,
        streak: u32,
        event_multiplier: f64,
    ) -> RewardCalculation {
        self.config.calculate(score, difficulty, streak, event_multiplier)
    }
}

impl Default for EconomyEngine {
    fn default() -> Self {
        Self::new()
    }
}
