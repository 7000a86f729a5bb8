//! Wallets, token types and ledger movements.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::UserId;

/// The two currencies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TokenType {
    /// Earned through play.
    Soft,
    /// Premium, bought with real money.
    Hard,
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenType::Soft => write!(f, "SOFT"),
            TokenType::Hard => write!(f, "HARD"),
        }
    }
}

/// Why a movement happened.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MovementKind {
    Purchase,
    Reward,
    Refund,
    AdminAdjust,
    DailyBonus,
    Achievement,
    Referral,
}

/// Unique ledger entry id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MovementId(Uuid);

impl MovementId {
    /// Fresh random id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    #[must_use]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for MovementId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MovementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mov_{}", self.0.simple())
    }
}

/// A user's balances. One per user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wallet {
    pub user_id: UserId,
    pub soft_tokens: u64,
    pub hard_tokens: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Wallet {
    /// Empty wallet.
    #[must_use]
    pub fn new(user_id: UserId, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            soft_tokens: 0,
            hard_tokens: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Balance of one currency.
    #[must_use]
    pub fn balance(&self, token_type: TokenType) -> u64 {
        match token_type {
            TokenType::Soft => self.soft_tokens,
            TokenType::Hard => self.hard_tokens,
        }
    }

    pub(crate) fn set_balance(&mut self, token_type: TokenType, value: u64) {
        match token_type {
            TokenType::Soft => self.soft_tokens = value,
            TokenType::Hard => self.hard_tokens = value,
        }
    }
}

/// Immutable ledger entry.
///
/// `balance_after == balance_before + amount` holds for every committed
/// movement.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletMovement {
    pub id: MovementId,
    pub wallet_id: UserId,
    #[serde(rename = "type")]
    pub kind: MovementKind,
    pub token_type: TokenType,
    /// Signed change: negative for debits.
    pub amount: i64,
    pub balance_before: u64,
    pub balance_after: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl WalletMovement {
    /// Does the entry satisfy its structural check?
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        i128::from(self.balance_before) + i128::from(self.amount) == i128::from(self.balance_after)
    }

    #[must_use]
    pub fn is_debit(&self) -> bool {
        self.amount < 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_type_serde_and_display() {
        assert_eq!(TokenType::Soft.to_string(), "SOFT");
        assert_eq!(serde_json::to_string(&TokenType::Hard).unwrap(), "\"HARD\"");
        assert_eq!(
            serde_json::to_string(&MovementKind::AdminAdjust).unwrap(),
            "\"ADMIN_ADJUST\""
        );
    }

    #[test]
    fn test_movement_ids_are_unique() {
        let a = MovementId::new();
        let b = MovementId::new();
        assert_ne!(a, b);
        assert!(a.to_string().starts_with("mov_"));
    }

    #[test]
    fn test_balanced_check() {
        let movement = WalletMovement {
            id: MovementId::new(),
            wallet_id: UserId::new("u"),
            kind: MovementKind::Purchase,
            token_type: TokenType::Soft,
            amount: -10,
            balance_before: 50,
            balance_after: 40,
            reference: None,
            metadata: None,
            created_at: Utc::now(),
        };
        assert!(movement.is_balanced());
        assert!(movement.is_debit());

        let broken = WalletMovement {
            balance_after: 41,
            ..movement
        };
        assert!(!broken.is_balanced());
    }
}
