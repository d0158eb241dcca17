use chrono::Utc;
use std::collections::HashMap;
use uuid::Uuid;

use crate::core::ledger;
use crate::core::models::{Transaction, TransactionType};

fn tx(group_id: Uuid, user_id: Uuid, amount: f64, kind: TransactionType) -> Transaction {
    Transaction {
        id: Uuid::new_v4(),
        group_id,
        user_id,
        amount,
        kind,
        description: None,
        contribution_period: None,
        created_at: Utc::now(),
    }
}

#[test]
fn balance_is_contributions_minus_payouts() {
    let group = Uuid::new_v4();
    let user = Uuid::new_v4();
    let txs = vec![
        tx(group, user, 100.0, TransactionType::Contribution),
        tx(group, user, 50.0, TransactionType::Contribution),
        tx(group, user, 30.0, TransactionType::Payout),
    ];
    assert_eq!(ledger::balance(&txs), 120.0);
}

#[test]
fn balance_of_empty_set_is_zero() {
    assert_eq!(ledger::balance(&[]), 0.0);
}

#[test]
fn balance_is_order_independent() {
    let group = Uuid::new_v4();
    let user = Uuid::new_v4();
    let mut txs = vec![
        tx(group, user, 75.0, TransactionType::Contribution),
        tx(group, user, 25.0, TransactionType::Payout),
        tx(group, user, 10.0, TransactionType::Contribution),
        tx(group, user, 5.0, TransactionType::Payout),
    ];
    let forward = ledger::balance(&txs);
    txs.reverse();
    assert_eq!(ledger::balance(&txs), forward);
    assert_eq!(forward, 55.0);
}

#[test]
fn equal_split_divides_pool_evenly() {
    assert_eq!(ledger::equal_split(100.0, 4), 25.0);
    assert_eq!(ledger::equal_split(0.0, 3), 0.0);
    assert_eq!(ledger::equal_split(100.0, 0), 0.0);
    assert!((ledger::equal_split(100.0, 3) - 100.0 / 3.0).abs() < 1e-12);
}

#[test]
fn contribution_pool_sums_member_totals() {
    let sums: HashMap<Uuid, f64> = [
        (Uuid::new_v4(), 100.0),
        (Uuid::new_v4(), 50.0),
        (Uuid::new_v4(), 25.0),
    ]
    .into_iter()
    .collect();
    assert_eq!(ledger::contribution_pool(&sums), 175.0);
}

#[test]
fn aggregate_buckets_per_member_and_sums_totals() {
    let group = Uuid::new_v4();
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();
    let txs = vec![
        tx(group, alice, 100.0, TransactionType::Contribution),
        tx(group, bob, 50.0, TransactionType::Contribution),
        tx(group, alice, 40.0, TransactionType::Payout),
    ];

    let analytics = ledger::aggregate(group, &txs, &HashMap::new());
    assert_eq!(analytics.total_contributions, 150.0);
    assert_eq!(analytics.total_payouts, 40.0);
    assert_eq!(analytics.balance, 110.0);
    assert_eq!(analytics.total_members, 2);
    assert_eq!(analytics.total_transactions, 3);

    let alice_stats = analytics
        .member_stats
        .iter()
        .find(|s| s.user_id == alice)
        .unwrap();
    assert_eq!(alice_stats.contributions, 100.0);
    assert_eq!(alice_stats.payouts, 40.0);
    assert_eq!(alice_stats.balance, 60.0);
    assert_eq!(alice_stats.transaction_count, 2);

    // Group totals equal the sum over per-member records.
    let sum_contrib: f64 = analytics.member_stats.iter().map(|s| s.contributions).sum();
    let sum_payout: f64 = analytics.member_stats.iter().map(|s| s.payouts).sum();
    assert_eq!(sum_contrib, analytics.total_contributions);
    assert_eq!(sum_payout, analytics.total_payouts);
}

#[test]
fn aggregate_falls_back_to_unknown_for_missing_users() {
    let group = Uuid::new_v4();
    let ghost = Uuid::new_v4();
    let txs = vec![tx(group, ghost, 10.0, TransactionType::Contribution)];
    let analytics = ledger::aggregate(group, &txs, &HashMap::new());
    assert_eq!(analytics.member_stats[0].name, "Unknown");
}
