use super::{admin_with_group, service};
use crate::core::errors::LedgerError;
use crate::core::models::{MemberWithUser, TransactionType};
use crate::core::service::LedgerService;
use crate::infrastructure::storage::in_memory::InMemoryStorage;
use uuid::Uuid;

async fn add_member_with_contribution(
    service: &LedgerService<InMemoryStorage>,
    admin: &crate::core::models::User,
    group_id: Uuid,
    email: &str,
    amount: f64,
) -> MemberWithUser {
    let added = service
        .add_member(admin, group_id, email.to_string(), None, None)
        .await
        .unwrap();
    service
        .record_transaction(admin, group_id, added.member.id, amount, None, None, None)
        .await
        .unwrap();
    added
}

#[tokio::test]
async fn payout_splits_pool_equally_across_selected_members() {
    let service = service();
    let (admin, group) = admin_with_group(&service, "Ajo").await;
    let group_id = group.group.id;

    let m1 = add_member_with_contribution(&service, &admin, group_id, "a@example.com", 100.0).await;
    let m2 = add_member_with_contribution(&service, &admin, group_id, "b@example.com", 50.0).await;

    let outcome = service
        .run_payout(&admin, group_id, Some(vec![m1.member.id, m2.member.id]))
        .await
        .unwrap();

    assert_eq!(outcome.total_pool, 150.0);
    assert_eq!(outcome.payout_per_member, 75.0);
    assert_eq!(outcome.payouts.len(), 2);
    for payout in &outcome.payouts {
        assert_eq!(payout.kind, TransactionType::Payout);
        assert_eq!(payout.amount, 75.0);
        assert_eq!(payout.description.as_deref(), Some("Payout from Ajo"));
    }
}

#[tokio::test]
async fn payout_defaults_to_all_members_including_the_admin() {
    let service = service();
    let (admin, group) = admin_with_group(&service, "Ajo").await;
    let group_id = group.group.id;

    add_member_with_contribution(&service, &admin, group_id, "a@example.com", 90.0).await;
    add_member_with_contribution(&service, &admin, group_id, "b@example.com", 30.0).await;

    // No selection: admin + two members.
    let outcome = service.run_payout(&admin, group_id, None).await.unwrap();
    assert_eq!(outcome.total_pool, 120.0);
    assert_eq!(outcome.payout_per_member, 40.0);
    assert_eq!(outcome.payouts.len(), 3);
}

#[tokio::test]
async fn payout_with_empty_selection_fails_and_writes_nothing() {
    let service = service();
    let (admin, group) = admin_with_group(&service, "Ajo").await;
    let group_id = group.group.id;
    add_member_with_contribution(&service, &admin, group_id, "a@example.com", 100.0).await;

    let result = service.run_payout(&admin, group_id, Some(vec![])).await;
    assert!(matches!(result, Err(LedgerError::NoMembersSelected)));

    let txs = service.list_transactions(&admin, group_id).await.unwrap();
    assert!(txs.iter().all(|t| t.transaction.kind == TransactionType::Contribution));
}

#[tokio::test]
async fn selection_ignores_member_ids_from_other_groups() {
    let service = service();
    let (admin, group) = admin_with_group(&service, "Ajo").await;
    let group_id = group.group.id;
    add_member_with_contribution(&service, &admin, group_id, "a@example.com", 100.0).await;

    let result = service
        .run_payout(&admin, group_id, Some(vec![Uuid::new_v4()]))
        .await;
    assert!(matches!(result, Err(LedgerError::NoMembersSelected)));
}

/// The divisible pool is the gross contribution total: prior payouts are not
/// subtracted, so a second run re-divides the same pool. This pins the
/// observed behavior of the source system; changing it is a product
/// decision, not a refactor.
#[tokio::test]
async fn repeated_payout_runs_redivide_the_gross_pool() {
    let service = service();
    let (admin, group) = admin_with_group(&service, "Ajo").await;
    let group_id = group.group.id;

    let m = add_member_with_contribution(&service, &admin, group_id, "a@example.com", 100.0).await;

    let first = service
        .run_payout(&admin, group_id, Some(vec![m.member.id]))
        .await
        .unwrap();
    assert_eq!(first.total_pool, 100.0);

    let second = service
        .run_payout(&admin, group_id, Some(vec![m.member.id]))
        .await
        .unwrap();
    assert_eq!(second.total_pool, 100.0);
    assert_eq!(second.payout_per_member, 100.0);

    // The group is now over-distributed: balance has gone negative.
    let txs = service.list_transactions(&admin, group_id).await.unwrap();
    let raw: Vec<_> = txs.iter().map(|t| t.transaction.clone()).collect();
    assert_eq!(crate::core::ledger::balance(&raw), -100.0);
}

#[tokio::test]
async fn end_to_end_contribution_then_full_payout_zeroes_the_balance() {
    let service = service();
    let (admin, group) = admin_with_group(&service, "Ajo").await;
    let group_id = group.group.id;

    let m = service
        .add_member(&admin, group_id, "m@example.com".to_string(), None, None)
        .await
        .unwrap();

    service
        .record_transaction(&admin, group_id, m.member.id, 100.0, None, None, None)
        .await
        .unwrap();

    let txs = service.list_transactions(&admin, group_id).await.unwrap();
    let raw: Vec<_> = txs.iter().map(|t| t.transaction.clone()).collect();
    assert_eq!(crate::core::ledger::balance(&raw), 100.0);

    let outcome = service
        .run_payout(&admin, group_id, Some(vec![m.member.id]))
        .await
        .unwrap();
    assert_eq!(outcome.payout_per_member, 100.0);
    assert_eq!(outcome.payouts.len(), 1);

    let txs = service.list_transactions(&admin, group_id).await.unwrap();
    let raw: Vec<_> = txs.iter().map(|t| t.transaction.clone()).collect();
    assert_eq!(crate::core::ledger::balance(&raw), 0.0);
}
