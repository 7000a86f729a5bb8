//! Economy integration tests.
//!
//! Ledger invariants under arbitrary operation sequences, plus the reward
//! formula and exchange rules.

use std::sync::Arc;

use arcade_hub::core::{Difficulty, PlatformError, UserId};
use arcade_hub::economy::{
    EconomyConfig, EconomyEngine, InMemoryWalletRepository, MovementKind, TokenType,
};
use proptest::prelude::*;

#[derive(Clone, Debug)]
enum Op {
    Deduct(u64, TokenType),
    Reward(u64),
    Hard(u64),
    Exchange(u64),
    RefundLatest,
}

fn op() -> impl Strategy<Value = Op> {
    let token = prop_oneof![Just(TokenType::Soft), Just(TokenType::Hard)];
    prop_oneof![
        (1u64..500, token).prop_map(|(n, t)| Op::Deduct(n, t)),
        (0u64..500).prop_map(Op::Reward),
        (0u64..20).prop_map(Op::Hard),
        (0u64..10).prop_map(Op::Exchange),
        Just(Op::RefundLatest),
    ]
}

fn sum_of(economy: &EconomyEngine, user: &UserId, token_type: TokenType) -> i64 {
    economy
        .movements(user, usize::MAX)
        .unwrap()
        .iter()
        .filter(|m| m.token_type == token_type)
        .map(|m| m.amount)
        .sum()
}

proptest! {
    /// Balances always equal the sum of their movements and never go negative.
    #[test]
    fn prop_ledger_matches_balances(start in 0u64..300, ops in prop::collection::vec(op(), 0..40)) {
        let economy = EconomyEngine::new();
        let user = UserId::new("p");
        economy.create_wallet(&user, start, 0).unwrap();

        for op in ops {
            let before = economy.wallet(&user).unwrap();
            let result = match op {
                Op::Deduct(n, t) => economy.deduct_tokens(&user, n, t, "shop").map(|_| ()),
                Op::Reward(n) => economy.reward_user(&user, n, MovementKind::Reward, None).map(|_| ()),
                Op::Hard(n) => economy.add_hard_tokens(&user, n, "txn").map(|_| ()),
                Op::Exchange(n) => economy.exchange_tokens(&user, n, 100).map(|_| ()),
                Op::RefundLatest => match economy.movements(&user, 1).unwrap().first() {
                    Some(latest) => economy.refund(&user, latest.id).map(|_| ()),
                    None => Ok(()),
                },
            };

            let after = economy.wallet(&user).unwrap();
            if result.is_err() {
                prop_assert_eq!(before.soft_tokens, after.soft_tokens);
                prop_assert_eq!(before.hard_tokens, after.hard_tokens);
            }
            prop_assert_eq!(sum_of(&economy, &user, TokenType::Soft), after.soft_tokens as i64);
            prop_assert_eq!(sum_of(&economy, &user, TokenType::Hard), after.hard_tokens as i64);
            prop_assert!(economy.verify_ledger(&user).is_ok());
        }
    }

    /// An overdraft is rejected with the exact shortfall and changes nothing.
    #[test]
    fn prop_overdraft_is_atomic(balance in 0u64..1000, extra in 1u64..1000) {
        let economy = EconomyEngine::new();
        let user = UserId::new("p");
        economy.create_wallet(&user, balance, 0).unwrap();
        let movements = economy.movements(&user, 10).unwrap().len();

        let err = economy
            .deduct_tokens(&user, balance + extra, TokenType::Soft, "shop")
            .unwrap_err();
        prop_assert_eq!(err, PlatformError::InsufficientFunds {
            token_type: TokenType::Soft,
            required: balance + extra,
            available: balance,
        });
        prop_assert_eq!(economy.wallet(&user).unwrap().soft_tokens, balance);
        prop_assert_eq!(economy.movements(&user, 10).unwrap().len(), movements);
    }
}

// =============================================================================
// Rewards
// =============================================================================

#[test]
fn test_reward_scenario_medium_streak_one() {
    let economy = EconomyEngine::new();
    let calc = economy.calculate_reward(200, Difficulty::Medium, 1, 1.0);
    assert_eq!(calc.final_reward, 330);
    assert!((calc.streak_multiplier - 1.1).abs() < 1e-9);
}

#[test]
fn test_streak_bonus_caps_at_three() {
    let economy = EconomyEngine::new();
    assert_eq!(economy.calculate_reward(100, Difficulty::Expert, 100, 1.0).final_reward, 900);
}

#[test]
fn test_custom_config() {
    let economy = EconomyEngine::new().with_config(EconomyConfig::default().with_streak_cap(1.0));
    assert_eq!(economy.calculate_reward(100, Difficulty::Easy, 9, 1.0).final_reward, 100);
}

// =============================================================================
// Exchange
// =============================================================================

#[test]
fn test_exchange_links_two_movements() {
    let economy = EconomyEngine::new();
    let user = UserId::new("ana");
    economy.create_wallet(&user, 0, 5).unwrap();

    let (debit, credit) = economy.exchange_tokens(&user, 3, 100).unwrap();
    assert_eq!((debit.token_type, debit.amount), (TokenType::Hard, -3));
    assert_eq!((credit.token_type, credit.amount), (TokenType::Soft, 300));
    assert_eq!(economy.wallet(&user).unwrap().hard_tokens, 2);

    let err = economy.exchange_tokens(&user, 3, 100).unwrap_err();
    assert!(matches!(err, PlatformError::InsufficientFunds { .. }));
    assert_eq!(economy.wallet(&user).unwrap().soft_tokens, 300);
}

#[test]
fn test_default_rate_comes_from_config() {
    let economy = EconomyEngine::new().with_config(EconomyConfig::default().with_exchange_rate(40));
    let user = UserId::new("ana");
    economy.create_wallet(&user, 0, 2).unwrap();
    economy.exchange_at_default_rate(&user, 2).unwrap();
    assert_eq!(economy.balance(&user, TokenType::Soft).unwrap(), 80);
}

// =============================================================================
// Storage
// =============================================================================

#[test]
fn test_engines_share_an_injected_repository() {
    let repository = Arc::new(InMemoryWalletRepository::new());
    let a = EconomyEngine::new().with_repository(repository.clone());
    let b = EconomyEngine::new().with_repository(repository);
    let user = UserId::new("ana");

    a.create_wallet(&user, 70, 0).unwrap();
    b.deduct_tokens(&user, 20, TokenType::Soft, "shop").unwrap();
    assert_eq!(a.balance(&user, TokenType::Soft).unwrap(), 50);
}

#[test]
fn test_restore_is_not_a_movement() {
    let economy = EconomyEngine::new();
    let user = UserId::new("ana");
    economy.create_wallet(&user, 10, 0).unwrap();
    economy.restore_wallet(&user, 999, 9);

    assert_eq!(economy.movements(&user, 10).unwrap().len(), 1);
    assert_eq!(economy.wallet(&user).unwrap().soft_tokens, 999);
    economy.verify_ledger(&user).unwrap();
}
