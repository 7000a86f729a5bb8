//! Error types for resource violations.
//!
//! Lifecycle precondition violations (e.g. `start()` outside `Ready`) are not
//! errors: adapters ignore them. Malformed snapshots are not errors either:
//! they are rejected with a warning and the current state is kept. What
//! remains are caller contract breaches and the insufficient-funds rule.

use super::user::UserId;
use crate::economy::TokenType;

/// Failure of a wallet, progress or catalog operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlatformError {
    /// No wallet exists for the user; call `init_user` first.
    #[error("wallet not found for user {0}")]
    WalletNotFound(UserId),

    /// No progress record exists for the user; call `init_user` first.
    #[error("progress not found for user {0}")]
    ProgressNotFound(UserId),

    /// The balance is lower than the requested debit.
    #[error("insufficient {token_type} tokens: required {required}, available {available}")]
    InsufficientFunds {
        token_type: TokenType,
        required: u64,
        available: u64,
    },

    /// The catalog has no constructor for this game id.
    #[error("game not registered: {0}")]
    GameNotRegistered(String),

    /// Amount outside the accepted range (zero debit, overflow, bad rate).
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// The referenced ledger movement does not exist for this wallet.
    #[error("movement {0} not found")]
    MovementNotFound(String),

    /// The referenced movement was already compensated.
    #[error("movement {0} already refunded")]
    AlreadyRefunded(String),

    /// A ledger entry failed its structural check.
    #[error("ledger invariant violated: {0}")]
    LedgerInvariant(String),
}

/// Result alias used across the economy, progression and platform engines.
pub type Result<T> = std::result::Result<T, PlatformError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = PlatformError::InsufficientFunds {
            token_type: TokenType::Soft,
            required: 10,
            available: 0,
        };
        assert_eq!(
            err.to_string(),
            "insufficient SOFT tokens: required 10, available 0"
        );

        let err = PlatformError::GameNotRegistered("chess".into());
        assert_eq!(err.to_string(), "game not registered: chess");
    }
}
