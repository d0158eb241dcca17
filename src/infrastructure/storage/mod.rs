use async_trait::async_trait;
use std::collections::HashMap;
use uuid::Uuid;

use crate::core::errors::LedgerError;
use crate::core::models::{GroupMember, SavingsGroup, Transaction, User};

/// The ledger store. Each call is atomic; multi-row mutations (the deletion
/// cascade, the payout batch) are single calls so an interruption cannot
/// leave orphaned rows.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn create_user(&self, user: User) -> Result<User, LedgerError>;
    async fn update_user(&self, user: User) -> Result<User, LedgerError>;
    async fn get_user(&self, user_id: Uuid) -> Result<Option<User>, LedgerError>;
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, LedgerError>;

    async fn create_group(&self, group: SavingsGroup) -> Result<SavingsGroup, LedgerError>;
    async fn update_group(&self, group: SavingsGroup) -> Result<SavingsGroup, LedgerError>;
    async fn get_group(&self, group_id: Uuid) -> Result<Option<SavingsGroup>, LedgerError>;
    async fn get_group_by_invite_code(
        &self,
        code: &str,
    ) -> Result<Option<SavingsGroup>, LedgerError>;
    /// Groups created by the given admin, newest first.
    async fn list_groups_by_creator(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<SavingsGroup>, LedgerError>;
    /// Groups the given user belongs to, newest first.
    async fn list_groups_with_member(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<SavingsGroup>, LedgerError>;
    /// Deletes the group's transactions, memberships, and the group itself
    /// as one unit.
    async fn delete_group(&self, group_id: Uuid) -> Result<(), LedgerError>;

    async fn add_member(&self, member: GroupMember) -> Result<GroupMember, LedgerError>;
    async fn get_member(&self, member_id: Uuid) -> Result<Option<GroupMember>, LedgerError>;
    async fn get_membership(
        &self,
        group_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<GroupMember>, LedgerError>;
    async fn list_members(&self, group_id: Uuid) -> Result<Vec<GroupMember>, LedgerError>;
    async fn remove_member(&self, member_id: Uuid) -> Result<(), LedgerError>;

    async fn create_transaction(&self, tx: Transaction) -> Result<Transaction, LedgerError>;
    /// All-or-nothing batch insert, used by the payout allocator.
    async fn create_transactions(
        &self,
        txs: Vec<Transaction>,
    ) -> Result<Vec<Transaction>, LedgerError>;
    /// A group's transactions, newest first.
    async fn list_transactions(&self, group_id: Uuid) -> Result<Vec<Transaction>, LedgerError>;
    /// CONTRIBUTION amounts summed per user, the grouped aggregate behind
    /// the payout pool.
    async fn sum_contributions_by_member(
        &self,
        group_id: Uuid,
    ) -> Result<HashMap<Uuid, f64>, LedgerError>;
}

pub mod in_memory;
