use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::core::errors::LedgerError;
use crate::core::models::{GroupMember, SavingsGroup, Transaction, TransactionType, User};
use crate::infrastructure::storage::Storage;

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    emails: HashMap<String, Uuid>, // email -> user_id
    groups: HashMap<Uuid, SavingsGroup>,
    invite_codes: HashMap<String, Uuid>, // code -> group_id
    members: HashMap<Uuid, GroupMember>,
    transactions: HashMap<Uuid, Transaction>,
}

/// Ledger store backed by in-process tables. One lock over all tables keeps
/// every call atomic, including the deletion cascade and the payout batch.
pub struct InMemoryStorage {
    tables: Mutex<Tables>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        InMemoryStorage {
            tables: Mutex::new(Tables::default()),
        }
    }
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

fn newest_first<T, F: Fn(&T) -> chrono::DateTime<chrono::Utc>>(mut rows: Vec<T>, key: F) -> Vec<T> {
    rows.sort_by(|a, b| key(b).cmp(&key(a)));
    rows
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn create_user(&self, user: User) -> Result<User, LedgerError> {
        let mut t = self.tables.lock().await;
        if t.emails.contains_key(&user.email) {
            return Err(LedgerError::EmailAlreadyRegistered(user.email));
        }
        t.emails.insert(user.email.clone(), user.id);
        t.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_user(&self, user: User) -> Result<User, LedgerError> {
        let mut t = self.tables.lock().await;
        if !t.users.contains_key(&user.id) {
            return Err(LedgerError::UserNotFound(user.id.to_string()));
        }
        t.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_user(&self, user_id: Uuid) -> Result<Option<User>, LedgerError> {
        Ok(self.tables.lock().await.users.get(&user_id).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, LedgerError> {
        let t = self.tables.lock().await;
        Ok(t.emails.get(email).and_then(|id| t.users.get(id)).cloned())
    }

    async fn create_group(&self, group: SavingsGroup) -> Result<SavingsGroup, LedgerError> {
        let mut t = self.tables.lock().await;
        if t.invite_codes.contains_key(&group.invite_code) {
            return Err(LedgerError::DuplicateInviteCode(group.invite_code));
        }
        t.invite_codes.insert(group.invite_code.clone(), group.id);
        t.groups.insert(group.id, group.clone());
        Ok(group)
    }

    async fn update_group(&self, group: SavingsGroup) -> Result<SavingsGroup, LedgerError> {
        let mut t = self.tables.lock().await;
        if !t.groups.contains_key(&group.id) {
            return Err(LedgerError::GroupNotFound(group.id.to_string()));
        }
        t.groups.insert(group.id, group.clone());
        Ok(group)
    }

    async fn get_group(&self, group_id: Uuid) -> Result<Option<SavingsGroup>, LedgerError> {
        Ok(self.tables.lock().await.groups.get(&group_id).cloned())
    }

    async fn get_group_by_invite_code(
        &self,
        code: &str,
    ) -> Result<Option<SavingsGroup>, LedgerError> {
        let t = self.tables.lock().await;
        Ok(t.invite_codes
            .get(code)
            .and_then(|id| t.groups.get(id))
            .cloned())
    }

    async fn list_groups_by_creator(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<SavingsGroup>, LedgerError> {
        let t = self.tables.lock().await;
        let rows: Vec<SavingsGroup> = t
            .groups
            .values()
            .filter(|g| g.created_by == user_id)
            .cloned()
            .collect();
        Ok(newest_first(rows, |g| g.created_at))
    }

    async fn list_groups_with_member(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<SavingsGroup>, LedgerError> {
        let t = self.tables.lock().await;
        let rows: Vec<SavingsGroup> = t
            .members
            .values()
            .filter(|m| m.user_id == user_id)
            .filter_map(|m| t.groups.get(&m.group_id))
            .cloned()
            .collect();
        Ok(newest_first(rows, |g| g.created_at))
    }

    async fn delete_group(&self, group_id: Uuid) -> Result<(), LedgerError> {
        let mut t = self.tables.lock().await;
        let group = t
            .groups
            .remove(&group_id)
            .ok_or_else(|| LedgerError::GroupNotFound(group_id.to_string()))?;
        t.invite_codes.remove(&group.invite_code);
        t.transactions.retain(|_, tx| tx.group_id != group_id);
        t.members.retain(|_, m| m.group_id != group_id);
        Ok(())
    }

    async fn add_member(&self, member: GroupMember) -> Result<GroupMember, LedgerError> {
        let mut t = self.tables.lock().await;
        if t.members
            .values()
            .any(|m| m.group_id == member.group_id && m.user_id == member.user_id)
        {
            return Err(LedgerError::AlreadyGroupMember);
        }
        t.members.insert(member.id, member.clone());
        Ok(member)
    }

    async fn get_member(&self, member_id: Uuid) -> Result<Option<GroupMember>, LedgerError> {
        Ok(self.tables.lock().await.members.get(&member_id).cloned())
    }

    async fn get_membership(
        &self,
        group_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<GroupMember>, LedgerError> {
        Ok(self
            .tables
            .lock()
            .await
            .members
            .values()
            .find(|m| m.group_id == group_id && m.user_id == user_id)
            .cloned())
    }

    async fn list_members(&self, group_id: Uuid) -> Result<Vec<GroupMember>, LedgerError> {
        let t = self.tables.lock().await;
        let mut rows: Vec<GroupMember> = t
            .members
            .values()
            .filter(|m| m.group_id == group_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.joined_at.cmp(&b.joined_at));
        Ok(rows)
    }

    async fn remove_member(&self, member_id: Uuid) -> Result<(), LedgerError> {
        let mut t = self.tables.lock().await;
        t.members
            .remove(&member_id)
            .map(|_| ())
            .ok_or_else(|| LedgerError::MemberNotFound(member_id.to_string()))
    }

    async fn create_transaction(&self, tx: Transaction) -> Result<Transaction, LedgerError> {
        self.tables
            .lock()
            .await
            .transactions
            .insert(tx.id, tx.clone());
        Ok(tx)
    }

    async fn create_transactions(
        &self,
        txs: Vec<Transaction>,
    ) -> Result<Vec<Transaction>, LedgerError> {
        // Inserted under one lock hold: either every row lands or none do.
        let mut t = self.tables.lock().await;
        for tx in &txs {
            t.transactions.insert(tx.id, tx.clone());
        }
        Ok(txs)
    }

    async fn list_transactions(&self, group_id: Uuid) -> Result<Vec<Transaction>, LedgerError> {
        let t = self.tables.lock().await;
        let rows: Vec<Transaction> = t
            .transactions
            .values()
            .filter(|tx| tx.group_id == group_id)
            .cloned()
            .collect();
        Ok(newest_first(rows, |tx| tx.created_at))
    }

    async fn sum_contributions_by_member(
        &self,
        group_id: Uuid,
    ) -> Result<HashMap<Uuid, f64>, LedgerError> {
        let t = self.tables.lock().await;
        let mut sums: HashMap<Uuid, f64> = HashMap::new();
        for tx in t
            .transactions
            .values()
            .filter(|tx| tx.group_id == group_id && tx.kind == TransactionType::Contribution)
        {
            *sums.entry(tx.user_id).or_insert(0.0) += tx.amount;
        }
        Ok(sums)
    }
}
