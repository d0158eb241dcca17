//! Pure ledger arithmetic: the balance fold, equal-split division, and the
//! per-member analytics aggregation. No I/O here; everything is deterministic
//! and order-independent.

use serde::Serialize;
use std::collections::HashMap;
use utoipa::ToSchema;
use uuid::Uuid;

use super::models::{Transaction, TransactionType, User};

/// Running balance of a transaction set: contributions add, payouts subtract.
/// The only place a balance is ever computed.
pub fn balance(transactions: &[Transaction]) -> f64 {
    transactions.iter().fold(0.0, |total, tx| match tx.kind {
        TransactionType::Contribution => total + tx.amount,
        TransactionType::Payout => total - tx.amount,
    })
}

/// Gross contribution pool: the sum of all CONTRIBUTION amounts, ignoring
/// prior payouts. Kept separate from [`balance`] because the payout allocator
/// divides this figure, not the net balance (observed source behavior).
pub fn contribution_pool(sums_by_member: &HashMap<Uuid, f64>) -> f64 {
    sums_by_member.values().sum()
}

/// Equal-split share for a pool of `n` recipients. Plain division; any
/// fractional remainder stays in the f64 representation and is not
/// redistributed.
pub fn equal_split(pool: f64, n: usize) -> f64 {
    if n == 0 { 0.0 } else { pool / n as f64 }
}

#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct MemberSummary {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub contributions: f64,
    pub payouts: f64,
    pub balance: f64,
    pub transaction_count: usize,
}

#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct GroupAnalytics {
    pub group_id: Uuid,
    pub total_contributions: f64,
    pub total_payouts: f64,
    pub balance: f64,
    /// Distinct members appearing in the transaction log. A member with no
    /// transactions does not show up here.
    pub total_members: usize,
    pub total_transactions: usize,
    pub member_stats: Vec<MemberSummary>,
}

/// Single pass over a group's transactions, bucketing amounts per member and
/// summing group totals independently. Member name/email come from the joined
/// user; a missing user falls back to "Unknown".
pub fn aggregate(
    group_id: Uuid,
    transactions: &[Transaction],
    users: &HashMap<Uuid, User>,
) -> GroupAnalytics {
    let mut total_contributions = 0.0;
    let mut total_payouts = 0.0;
    let mut stats: HashMap<Uuid, MemberSummary> = HashMap::new();
    let mut order: Vec<Uuid> = Vec::new();

    for tx in transactions {
        match tx.kind {
            TransactionType::Contribution => total_contributions += tx.amount,
            TransactionType::Payout => total_payouts += tx.amount,
        }

        let entry = stats.entry(tx.user_id).or_insert_with(|| {
            order.push(tx.user_id);
            let (name, email) = users
                .get(&tx.user_id)
                .map(|u| (u.name.clone(), u.email.clone()))
                .unwrap_or_else(|| ("Unknown".to_string(), String::new()));
            MemberSummary {
                user_id: tx.user_id,
                name,
                email,
                contributions: 0.0,
                payouts: 0.0,
                balance: 0.0,
                transaction_count: 0,
            }
        });
        match tx.kind {
            TransactionType::Contribution => entry.contributions += tx.amount,
            TransactionType::Payout => entry.payouts += tx.amount,
        }
        entry.balance = entry.contributions - entry.payouts;
        entry.transaction_count += 1;
    }

    let member_stats: Vec<MemberSummary> = order
        .iter()
        .filter_map(|id| stats.get(id).cloned())
        .collect();

    GroupAnalytics {
        group_id,
        total_contributions,
        total_payouts,
        balance: total_contributions - total_payouts,
        total_members: member_stats.len(),
        total_transactions: transactions.len(),
        member_stats,
    }
}
