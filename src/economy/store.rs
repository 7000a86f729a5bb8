//! Wallet storage.
//!
//! Every wallet lives with its ledger in a [`WalletAccount`] behind its own
//! mutex, so balance checks and the debit that follows happen under one
//! lock. Repositories only hand out those per-wallet handles.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::core::{PlatformError, Result, UserId};

use super::wallet::{MovementId, MovementKind, TokenType, Wallet, WalletMovement};

/// A wallet together with its append-only ledger.
#[derive(Clone, Debug)]
pub struct WalletAccount {
    wallet: Wallet,
    ledger: im::Vector<WalletMovement>,
    refunded: FxHashSet<MovementId>,
    /// Balances at the last direct restore; the ledger after `baseline_len`
    /// must sum from here to the current balances.
    baseline: (u64, u64),
    baseline_len: usize,
}

/// One movement to append.
#[derive(Clone, Debug)]
pub struct MovementRequest {
    pub kind: MovementKind,
    pub token_type: TokenType,
    pub amount: i64,
    pub reference: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

impl MovementRequest {
    #[must_use]
    pub fn new(kind: MovementKind, token_type: TokenType, amount: i64) -> Self {
        Self {
            kind,
            token_type,
            amount,
            reference: None,
            metadata: None,
        }
    }

    #[must_use]
    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    #[must_use]
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

impl WalletAccount {
    /// Empty wallet with an empty ledger.
    #[must_use]
    pub fn new(user_id: UserId, now: DateTime<Utc>) -> Self {
        Self {
            wallet: Wallet::new(user_id, now),
            ledger: im::Vector::new(),
            refunded: FxHashSet::default(),
            baseline: (0, 0),
            baseline_len: 0,
        }
    }

    #[must_use]
    pub fn wallet(&self) -> &Wallet {
        &self.wallet
    }

    #[must_use]
    pub fn ledger(&self) -> &im::Vector<WalletMovement> {
        &self.ledger
    }

    #[must_use]
    pub fn find(&self, id: MovementId) -> Option<&WalletMovement> {
        self.ledger.iter().find(|m| m.id == id)
    }

    #[must_use]
    pub fn is_refunded(&self, id: MovementId) -> bool {
        self.refunded.contains(&id)
    }

    pub(crate) fn mark_refunded(&mut self, id: MovementId) {
        self.refunded.insert(id);
    }

    /// Append a movement and update the balance.
    ///
    /// # Errors
    ///
    /// - `InsufficientFunds` when a debit exceeds the balance
    /// - `InvalidAmount` when a credit would overflow the balance
    /// - `LedgerInvariant` when the entry fails its structural check
    ///
    /// Nothing changes on error.
    pub fn apply(&mut self, request: MovementRequest, now: DateTime<Utc>) -> Result<WalletMovement> {
        let before = self.wallet.balance(request.token_type);
        let after = i128::from(before) + i128::from(request.amount);

        if after < 0 {
            return Err(PlatformError::InsufficientFunds {
                token_type: request.token_type,
                required: request.amount.unsigned_abs(),
                available: before,
            });
        }
        let after = u64::try_from(after)
            .map_err(|_| PlatformError::InvalidAmount(format!("balance overflow: {after}")))?;

        let movement = WalletMovement {
            id: MovementId::new(),
            wallet_id: self.wallet.user_id.clone(),
            kind: request.kind,
            token_type: request.token_type,
            amount: request.amount,
            balance_before: before,
            balance_after: after,
            reference: request.reference,
            metadata: request.metadata,
            created_at: now,
        };
        if !movement.is_balanced() {
            return Err(PlatformError::LedgerInvariant(format!(
                "movement {} does not balance",
                movement.id
            )));
        }

        self.wallet.set_balance(request.token_type, after);
        self.wallet.updated_at = now;
        self.ledger.push_back(movement.clone());

        tracing::debug!(
            user = %self.wallet.user_id,
            kind = ?movement.kind,
            token = %movement.token_type,
            amount = movement.amount,
            balance = after,
            "movement committed"
        );
        Ok(movement)
    }

    /// Overwrite both balances without a movement.
    ///
    /// Bootstrap path for reloading persisted state; the ledger audit starts
    /// over from these balances.
    pub fn restore(&mut self, soft: u64, hard: u64, now: DateTime<Utc>) {
        self.wallet.soft_tokens = soft;
        self.wallet.hard_tokens = hard;
        self.wallet.updated_at = now;
        self.baseline = (soft, hard);
        self.baseline_len = self.ledger.len();
    }

    /// Recompute balances from the ledger and check every entry.
    ///
    /// # Errors
    ///
    /// `LedgerInvariant` naming the first discrepancy.
    pub fn verify(&self) -> Result<()> {
        let (mut soft, mut hard) = (i128::from(self.baseline.0), i128::from(self.baseline.1));

        for movement in self.ledger.iter().skip(self.baseline_len) {
            let running = match movement.token_type {
                TokenType::Soft => &mut soft,
                TokenType::Hard => &mut hard,
            };
            if !movement.is_balanced() || i128::from(movement.balance_before) != *running {
                return Err(PlatformError::LedgerInvariant(format!(
                    "movement {} breaks the running {} balance",
                    movement.id, movement.token_type
                )));
            }
            *running += i128::from(movement.amount);
        }

        let expected = (i128::from(self.wallet.soft_tokens), i128::from(self.wallet.hard_tokens));
        if (soft, hard) != expected {
            return Err(PlatformError::LedgerInvariant(format!(
                "ledger sums to ({soft}, {hard}) but wallet holds ({}, {})",
                expected.0, expected.1
            )));
        }
        Ok(())
    }
}

/// Shared handle to one wallet.
pub type AccountHandle = Arc<Mutex<WalletAccount>>;

/// Lock a wallet handle, recovering from a poisoned lock.
pub(crate) fn lock_account(handle: &AccountHandle) -> std::sync::MutexGuard<'_, WalletAccount> {
    handle.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Keyed storage for wallets.
pub trait WalletRepository: Send + Sync + fmt::Debug {
    /// Store a new account. Returns the existing handle if the user already
    /// has one.
    fn insert_if_absent(&self, account: WalletAccount) -> AccountHandle;

    /// Handle for the user's wallet.
    fn get(&self, user_id: &UserId) -> Option<AccountHandle>;

    fn contains(&self, user_id: &UserId) -> bool {
        self.get(user_id).is_some()
    }

    /// All stored users.
    fn user_ids(&self) -> Vec<UserId>;
}

/// Process-local wallet storage.
#[derive(Default)]
pub struct InMemoryWalletRepository {
    accounts: RwLock<FxHashMap<UserId, AccountHandle>>,
}

impl InMemoryWalletRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl fmt::Debug for InMemoryWalletRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = self
            .accounts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len();
        f.debug_struct("InMemoryWalletRepository")
            .field("wallets", &count)
            .finish()
    }
}

impl WalletRepository for InMemoryWalletRepository {
    fn insert_if_absent(&self, account: WalletAccount) -> AccountHandle {
        let mut accounts = self.accounts.write().unwrap_or_else(PoisonError::into_inner);
        accounts
            .entry(account.wallet().user_id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(account)))
            .clone()
    }

    fn get(&self, user_id: &UserId) -> Option<AccountHandle> {
        self.accounts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(user_id)
            .cloned()
    }

    fn user_ids(&self) -> Vec<UserId> {
        self.accounts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account() -> WalletAccount {
        WalletAccount::new(UserId::new("u"), Utc::now())
    }

    #[test]
    fn test_apply_updates_balance_and_ledger() {
        let mut acc = account();
        let m = acc
            .apply(MovementRequest::new(MovementKind::Reward, TokenType::Soft, 50), Utc::now())
            .unwrap();
        assert_eq!(m.balance_before, 0);
        assert_eq!(m.balance_after, 50);
        assert_eq!(acc.wallet().soft_tokens, 50);
        assert_eq!(acc.ledger().len(), 1);
        acc.verify().unwrap();
    }

    #[test]
    fn test_overdraft_changes_nothing() {
        let mut acc = account();
        let err = acc
            .apply(MovementRequest::new(MovementKind::Purchase, TokenType::Hard, -1), Utc::now())
            .unwrap_err();
        assert_eq!(
            err,
            PlatformError::InsufficientFunds {
                token_type: TokenType::Hard,
                required: 1,
                available: 0
            }
        );
        assert!(acc.ledger().is_empty());
    }

    #[test]
    fn test_restore_resets_audit_baseline() {
        let mut acc = account();
        acc.apply(MovementRequest::new(MovementKind::Reward, TokenType::Soft, 10), Utc::now())
            .unwrap();
        acc.restore(500, 7, Utc::now());
        acc.verify().unwrap();

        acc.apply(MovementRequest::new(MovementKind::Purchase, TokenType::Soft, -20), Utc::now())
            .unwrap();
        acc.verify().unwrap();
        assert_eq!(acc.wallet().soft_tokens, 480);
    }

    #[test]
    fn test_repository_insert_is_idempotent() {
        let repo = InMemoryWalletRepository::new();
        let first = repo.insert_if_absent(account());
        lock_account(&first).restore(99, 0, Utc::now());

        let second = repo.insert_if_absent(account());
        assert_eq!(lock_account(&second).wallet().soft_tokens, 99);
        assert_eq!(repo.user_ids(), vec![UserId::new("u")]);
    }
}
