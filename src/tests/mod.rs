mod ledger_tests;
mod payout_tests;
mod policy_tests;
mod proof_tests;

use crate::core::models::{GroupWithStats, User};
use crate::core::service::LedgerService;
use crate::infrastructure::storage::in_memory::InMemoryStorage;

fn service() -> LedgerService<InMemoryStorage> {
    LedgerService::new(InMemoryStorage::new(), "test-secret".to_string())
}

async fn sign_in(service: &LedgerService<InMemoryStorage>, email: &str, name: &str) -> User {
    service
        .login(email, Some(name.to_string()), "password")
        .await
        .unwrap()
        .user
}

async fn admin_with_group(
    service: &LedgerService<InMemoryStorage>,
    group_name: &str,
) -> (User, GroupWithStats) {
    let admin = sign_in(service, "admin@example.com", "admin").await;
    let group = service
        .create_group(&admin, group_name.to_string(), None, None, None)
        .await
        .unwrap();
    (admin, group)
}
