//! Wallets, the movement ledger and reward computation.
//!
//! ## Ledger rules
//!
//! - Balances only change by appending a [`WalletMovement`]
//! - A movement that would drive a balance negative fails before anything
//!   is written
//! - Movements are never edited; mistakes are compensated with `Refund`s
//! - Multi-movement operations (exchange) commit all entries or none

pub mod engine;
pub mod reward;
pub mod store;
pub mod wallet;

pub use engine::EconomyEngine;
pub use reward::{EconomyConfig, RewardCalculation};
pub use store::{AccountHandle, InMemoryWalletRepository, MovementRequest, WalletAccount, WalletRepository};
pub use wallet::{MovementId, MovementKind, TokenType, Wallet, WalletMovement};
