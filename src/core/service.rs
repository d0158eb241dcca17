use chrono::Utc;
use rand::Rng;
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::jwt::{Claims, JwtService, password};
use crate::core::errors::LedgerError;
use crate::core::ledger;
use crate::core::models::{
    ContributionFrequency, GroupMember, GroupWithStats, INVITE_CODE_LEN, MemberRole,
    MemberWithUser, SavingsGroup, Transaction, TransactionType, TransactionWithUser, User,
    UserInfo, UserRole,
};
use crate::core::policy;
use crate::infrastructure::storage::Storage;

const INVITE_CODE_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const INVITE_CODE_ATTEMPTS: usize = 8;

#[derive(Serialize, Debug, ToSchema)]
pub struct LoginOutcome {
    pub token: String,
    pub user: User,
}

#[derive(Serialize, Debug, ToSchema)]
pub struct PayoutOutcome {
    pub total_pool: f64,
    pub payout_per_member: f64,
    pub payouts: Vec<Transaction>,
}

#[derive(Serialize, Debug, ToSchema)]
pub struct JoinOutcome {
    pub message: String,
    pub group: GroupWithStats,
}

pub struct LedgerService<S: Storage> {
    storage: S,
    jwt: JwtService,
}

impl<S: Storage> LedgerService<S> {
    pub fn new(storage: S, jwt_secret: String) -> Self {
        info!("Initializing LedgerService");
        LedgerService {
            storage,
            jwt: JwtService::new(jwt_secret),
        }
    }

    // AUTH

    pub fn validate_token(&self, token: &str) -> Result<Claims, LedgerError> {
        self.jwt.validate_token(token)
    }

    /// Credentials sign-in with lazy user creation: an unknown email creates
    /// the user on the spot; the global role is ADMIN when the email or the
    /// supplied name contains "admin". Existing users must present the
    /// password they first signed in with.
    pub async fn login(
        &self,
        email: &str,
        name: Option<String>,
        plain_password: &str,
    ) -> Result<LoginOutcome, LedgerError> {
        let email = email.trim().to_lowercase();
        if email.is_empty() {
            return Err(LedgerError::InvalidInput(
                "email".into(),
                "Email is required".into(),
            ));
        }

        let user = match self.storage.get_user_by_email(&email).await? {
            Some(user) => {
                if !password::verify(plain_password, &user.password_hash)? {
                    warn!("Failed login attempt for {}", email);
                    return Err(LedgerError::InvalidCredentials);
                }
                user
            }
            None => {
                let is_admin = email.contains("admin")
                    || name.as_deref().is_some_and(|n| n.contains("admin"));
                let now = Utc::now();
                let user = User {
                    id: Uuid::new_v4(),
                    name: name
                        .filter(|n| !n.trim().is_empty())
                        .unwrap_or_else(|| email.split('@').next().unwrap_or("").to_string()),
                    email: email.clone(),
                    phone: None,
                    password_hash: password::hash(plain_password)?,
                    role: if is_admin {
                        UserRole::Admin
                    } else {
                        UserRole::Member
                    },
                    created_at: now,
                    updated_at: now,
                };
                info!("Creating user {} on first sign-in (role {})", email, user.role);
                self.storage.create_user(user).await?
            }
        };

        let token = self.jwt.generate_token(&user.id.to_string(), user.role)?;
        Ok(LoginOutcome { token, user })
    }

    pub async fn current_user(&self, claims: &Claims) -> Result<User, LedgerError> {
        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| LedgerError::Unauthorized("Malformed subject claim".into()))?;
        self.storage
            .get_user(user_id)
            .await?
            .ok_or_else(|| LedgerError::Unauthorized(format!("Unknown user {}", user_id)))
    }

    // ACCESS POLICY

    /// Owner gate for admin mutations: the group must exist and be owned by
    /// the caller. A foreign admin's group surfaces as NotFound from the
    /// owner-scoped fetch endpoints and Forbidden from everything else;
    /// both come from this one check.
    async fn require_owned_group(
        &self,
        caller: &User,
        group_id: Uuid,
    ) -> Result<SavingsGroup, LedgerError> {
        let group = self
            .storage
            .get_group(group_id)
            .await?
            .ok_or_else(|| LedgerError::GroupNotFound(group_id.to_string()))?;
        policy::check_group_owner(caller, &group)?;
        Ok(group)
    }

    /// Shared read gate: owning admin, or member of the group.
    async fn require_group_access(
        &self,
        caller: &User,
        group_id: Uuid,
    ) -> Result<SavingsGroup, LedgerError> {
        let group = self
            .storage
            .get_group(group_id)
            .await?
            .ok_or_else(|| LedgerError::GroupNotFound(group_id.to_string()))?;
        let membership = self.storage.get_membership(group_id, caller.id).await?;
        policy::check_group_access(caller, &group, membership.as_ref())?;
        Ok(group)
    }

    fn require_admin(&self, caller: &User) -> Result<(), LedgerError> {
        if !caller.is_admin() {
            warn!("User {} called an admin surface without the role", caller.id);
            return Err(LedgerError::Unauthorized(format!(
                "user {} is not an admin",
                caller.id
            )));
        }
        Ok(())
    }

    // GROUP MANAGEMENT

    pub async fn create_group(
        &self,
        caller: &User,
        name: String,
        description: Option<String>,
        contribution_frequency: Option<ContributionFrequency>,
        contribution_amount: Option<f64>,
    ) -> Result<GroupWithStats, LedgerError> {
        self.require_admin(caller)?;
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(LedgerError::InvalidInput(
                "name".into(),
                "Group name is required".into(),
            ));
        }
        info!("Creating group '{}' for admin {}", name, caller.id);

        let now = Utc::now();
        let group_id = Uuid::new_v4();
        let invite_code = self.generate_invite_code().await?;
        let group = SavingsGroup {
            id: group_id,
            name,
            description: description.map(|d| d.trim().to_string()).filter(|d| !d.is_empty()),
            invite_code,
            created_by: caller.id,
            contribution_frequency: contribution_frequency.unwrap_or_default(),
            contribution_amount,
            created_at: now,
            updated_at: now,
        };
        let created = self.storage.create_group(group).await?;

        // The creator is a member of their own group, with the group-scoped
        // admin role.
        self.storage
            .add_member(GroupMember {
                id: Uuid::new_v4(),
                group_id,
                user_id: caller.id,
                role: MemberRole::Admin,
                joined_at: now,
            })
            .await?;

        debug!("Group created with ID: {}", created.id);
        Ok(GroupWithStats {
            group: created,
            member_count: 1,
            transaction_count: 0,
            balance: Some(0.0),
        })
    }

    pub async fn list_admin_groups(&self, caller: &User) -> Result<Vec<GroupWithStats>, LedgerError> {
        self.require_admin(caller)?;
        let groups = self.storage.list_groups_by_creator(caller.id).await?;
        let mut out = Vec::with_capacity(groups.len());
        for group in groups {
            out.push(self.group_stats(group, false).await?);
        }
        Ok(out)
    }

    pub async fn get_group(&self, caller: &User, group_id: Uuid) -> Result<GroupWithStats, LedgerError> {
        let group = self.require_owned_group(caller, group_id).await?;
        self.group_stats(group, false).await
    }

    pub async fn update_group(
        &self,
        caller: &User,
        group_id: Uuid,
        name: String,
        description: Option<String>,
    ) -> Result<SavingsGroup, LedgerError> {
        let group = self.require_owned_group(caller, group_id).await?;
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(LedgerError::InvalidInput(
                "name".into(),
                "Group name is required".into(),
            ));
        }
        info!("Updating group {} by admin {}", group_id, caller.id);

        let updated = SavingsGroup {
            name,
            description: description.map(|d| d.trim().to_string()).filter(|d| !d.is_empty()),
            updated_at: Utc::now(),
            ..group
        };
        self.storage.update_group(updated).await
    }

    pub async fn delete_group(&self, caller: &User, group_id: Uuid) -> Result<(), LedgerError> {
        self.require_owned_group(caller, group_id).await?;
        info!("Deleting group {} with cascade by admin {}", group_id, caller.id);
        self.storage.delete_group(group_id).await
    }

    pub async fn list_member_groups(&self, caller: &User) -> Result<Vec<GroupWithStats>, LedgerError> {
        let groups = self.storage.list_groups_with_member(caller.id).await?;
        let mut out = Vec::with_capacity(groups.len());
        for group in groups {
            out.push(self.group_stats(group, true).await?);
        }
        Ok(out)
    }

    pub async fn join_group(&self, caller: &User, invite_code: &str) -> Result<JoinOutcome, LedgerError> {
        let code = invite_code.trim().to_uppercase();
        if code.is_empty() {
            return Err(LedgerError::InvalidInput(
                "invite_code".into(),
                "Invite code is required".into(),
            ));
        }
        info!("User {} redeeming invite code {}", caller.id, code);

        let group = self
            .storage
            .get_group_by_invite_code(&code)
            .await?
            .ok_or(LedgerError::InvalidInviteCode)?;

        if self
            .storage
            .get_membership(group.id, caller.id)
            .await?
            .is_some()
        {
            warn!("User {} already in group {}", caller.id, group.id);
            return Err(LedgerError::AlreadyGroupMember);
        }

        self.storage
            .add_member(GroupMember {
                id: Uuid::new_v4(),
                group_id: group.id,
                user_id: caller.id,
                role: MemberRole::Member,
                joined_at: Utc::now(),
            })
            .await?;

        debug!("User {} joined group {}", caller.id, group.id);
        let message = format!("Successfully joined {}", group.name);
        Ok(JoinOutcome {
            message,
            group: self.group_stats(group, true).await?,
        })
    }

    // MEMBER MANAGEMENT

    pub async fn list_members(
        &self,
        caller: &User,
        group_id: Uuid,
    ) -> Result<Vec<MemberWithUser>, LedgerError> {
        self.require_group_access(caller, group_id).await?;
        let members = self.storage.list_members(group_id).await?;
        let mut out = Vec::with_capacity(members.len());
        for member in members {
            let user = self.user_info(member.user_id).await?;
            out.push(MemberWithUser { member, user });
        }
        Ok(out)
    }

    /// Adds a member by email, creating the user lazily if the email is new.
    /// Name and phone, when supplied, are written through to an existing
    /// user record.
    pub async fn add_member(
        &self,
        caller: &User,
        group_id: Uuid,
        email: String,
        name: Option<String>,
        phone: Option<String>,
    ) -> Result<MemberWithUser, LedgerError> {
        self.require_owned_group(caller, group_id).await?;
        let email = email.trim().to_lowercase();
        if email.is_empty() {
            return Err(LedgerError::InvalidInput(
                "email".into(),
                "Email is required".into(),
            ));
        }
        info!("Adding member {} to group {} by admin {}", email, group_id, caller.id);

        let user = match self.storage.get_user_by_email(&email).await? {
            Some(mut user) => {
                if name.is_some() || phone.is_some() {
                    if let Some(name) = name {
                        user.name = name;
                    }
                    if let Some(phone) = phone {
                        user.phone = Some(phone);
                    }
                    user.updated_at = Utc::now();
                    self.storage.update_user(user.clone()).await?;
                }
                user
            }
            None => {
                let now = Utc::now();
                let user = User {
                    id: Uuid::new_v4(),
                    name: name.unwrap_or_else(|| {
                        email.split('@').next().unwrap_or("").to_string()
                    }),
                    email: email.clone(),
                    phone,
                    // Lazily created members have no password yet; the hash
                    // of an empty string never verifies a real sign-in.
                    password_hash: password::hash("")?,
                    role: UserRole::Member,
                    created_at: now,
                    updated_at: now,
                };
                self.storage.create_user(user).await?
            }
        };

        let member = self
            .storage
            .add_member(GroupMember {
                id: Uuid::new_v4(),
                group_id,
                user_id: user.id,
                role: MemberRole::Member,
                joined_at: Utc::now(),
            })
            .await?;

        debug!("Member {} added to group {}", member.id, group_id);
        Ok(MemberWithUser {
            member,
            user: UserInfo::from(&user),
        })
    }

    pub async fn remove_member(
        &self,
        caller: &User,
        group_id: Uuid,
        member_id: Uuid,
    ) -> Result<(), LedgerError> {
        self.require_owned_group(caller, group_id).await?;
        let member = self
            .storage
            .get_member(member_id)
            .await?
            .filter(|m| m.group_id == group_id)
            .ok_or_else(|| LedgerError::MemberNotFound(member_id.to_string()))?;
        info!("Removing member {} from group {} by admin {}", member_id, group_id, caller.id);
        self.storage.remove_member(member.id).await
    }

    // TRANSACTIONS

    pub async fn list_transactions(
        &self,
        caller: &User,
        group_id: Uuid,
    ) -> Result<Vec<TransactionWithUser>, LedgerError> {
        self.require_group_access(caller, group_id).await?;
        let transactions = self.storage.list_transactions(group_id).await?;
        let mut out = Vec::with_capacity(transactions.len());
        for transaction in transactions {
            let user = self.user_info(transaction.user_id).await?;
            out.push(TransactionWithUser { transaction, user });
        }
        Ok(out)
    }

    /// Admin path: records a transaction on behalf of a group member,
    /// addressed by membership row id.
    pub async fn record_transaction(
        &self,
        caller: &User,
        group_id: Uuid,
        member_id: Uuid,
        amount: f64,
        kind: Option<TransactionType>,
        description: Option<String>,
        contribution_period: Option<String>,
    ) -> Result<TransactionWithUser, LedgerError> {
        self.require_owned_group(caller, group_id).await?;
        validate_amount(amount)?;

        let member = self
            .storage
            .get_member(member_id)
            .await?
            .filter(|m| m.group_id == group_id)
            .ok_or_else(|| LedgerError::MemberNotFound(member_id.to_string()))?;

        let tx = Transaction {
            id: Uuid::new_v4(),
            group_id,
            user_id: member.user_id,
            amount,
            kind: kind.unwrap_or(TransactionType::Contribution),
            description: description.filter(|d| !d.trim().is_empty()),
            contribution_period,
            created_at: Utc::now(),
        };
        info!(
            "Recording {:?} of {} for user {} in group {}",
            tx.kind, tx.amount, tx.user_id, group_id
        );
        let created = self.storage.create_transaction(tx).await?;
        let user = self.user_info(created.user_id).await?;
        Ok(TransactionWithUser {
            transaction: created,
            user,
        })
    }

    /// Member self-service path: the caller records against their own id,
    /// and payouts must fit inside the current fold balance.
    pub async fn record_own_transaction(
        &self,
        caller: &User,
        group_id: Uuid,
        amount: f64,
        kind: TransactionType,
        description: Option<String>,
    ) -> Result<TransactionWithUser, LedgerError> {
        validate_amount(amount)?;
        let membership = self
            .storage
            .get_membership(group_id, caller.id)
            .await?
            .ok_or_else(|| {
                LedgerError::Forbidden(format!(
                    "user {} is not a member of group {}",
                    caller.id, group_id
                ))
            })?;

        if kind == TransactionType::Payout {
            let transactions = self.storage.list_transactions(group_id).await?;
            let available = ledger::balance(&transactions);
            if amount > available {
                warn!(
                    "Payout of {} rejected for user {}: balance is {}",
                    amount, caller.id, available
                );
                return Err(LedgerError::InsufficientFunds {
                    requested: amount,
                    available,
                });
            }
        }

        let tx = Transaction {
            id: Uuid::new_v4(),
            group_id,
            user_id: membership.user_id,
            amount,
            kind,
            description: description.filter(|d| !d.trim().is_empty()),
            contribution_period: None,
            created_at: Utc::now(),
        };
        info!(
            "Recording self-service {:?} of {} for user {} in group {}",
            tx.kind, tx.amount, caller.id, group_id
        );
        let created = self.storage.create_transaction(tx).await?;
        Ok(TransactionWithUser {
            transaction: created,
            user: UserInfo::from(caller),
        })
    }

    // PAYOUT ALLOCATION

    /// Equal-split payout over the selected members (all members when no
    /// selection is given). The divisible pool is the gross contribution
    /// total, not the net balance: prior payouts are not subtracted, so a
    /// second run re-divides the same pool. Observed source behavior, kept
    /// deliberately (see DESIGN.md). The N payout rows are written as one
    /// atomic batch, but concurrent runs against the same group are not
    /// mutually excluded.
    pub async fn run_payout(
        &self,
        caller: &User,
        group_id: Uuid,
        member_ids: Option<Vec<Uuid>>,
    ) -> Result<PayoutOutcome, LedgerError> {
        let group = self.require_owned_group(caller, group_id).await?;

        let mut members = self.storage.list_members(group_id).await?;
        if let Some(selected) = member_ids {
            members.retain(|m| selected.contains(&m.id));
        }
        if members.is_empty() {
            warn!("Payout for group {} with no members selected", group_id);
            return Err(LedgerError::NoMembersSelected);
        }

        let sums = self.storage.sum_contributions_by_member(group_id).await?;
        let total_pool = ledger::contribution_pool(&sums);
        let payout_per_member = ledger::equal_split(total_pool, members.len());
        info!(
            "Payout for group {}: pool {} across {} members ({} each)",
            group_id,
            total_pool,
            members.len(),
            payout_per_member
        );

        let now = Utc::now();
        let payouts: Vec<Transaction> = members
            .iter()
            .map(|member| Transaction {
                id: Uuid::new_v4(),
                group_id,
                user_id: member.user_id,
                amount: payout_per_member,
                kind: TransactionType::Payout,
                description: Some(format!("Payout from {}", group.name)),
                contribution_period: None,
                created_at: now,
            })
            .collect();

        let payouts = self.storage.create_transactions(payouts).await?;
        Ok(PayoutOutcome {
            total_pool,
            payout_per_member,
            payouts,
        })
    }

    // ANALYTICS

    pub async fn group_analytics(
        &self,
        caller: &User,
        group_id: Uuid,
    ) -> Result<ledger::GroupAnalytics, LedgerError> {
        self.require_owned_group(caller, group_id).await?;
        let transactions = self.storage.list_transactions(group_id).await?;

        let mut users: HashMap<Uuid, User> = HashMap::new();
        for tx in &transactions {
            if !users.contains_key(&tx.user_id) {
                if let Some(user) = self.storage.get_user(tx.user_id).await? {
                    users.insert(tx.user_id, user);
                }
            }
        }

        Ok(ledger::aggregate(group_id, &transactions, &users))
    }

    // UTILITIES

    async fn group_stats(
        &self,
        group: SavingsGroup,
        with_balance: bool,
    ) -> Result<GroupWithStats, LedgerError> {
        let member_count = self.storage.list_members(group.id).await?.len();
        let transactions = self.storage.list_transactions(group.id).await?;
        let balance = with_balance.then(|| ledger::balance(&transactions));
        Ok(GroupWithStats {
            group,
            member_count,
            transaction_count: transactions.len(),
            balance,
        })
    }

    async fn user_info(&self, user_id: Uuid) -> Result<UserInfo, LedgerError> {
        Ok(self
            .storage
            .get_user(user_id)
            .await?
            .as_ref()
            .map(UserInfo::from)
            .unwrap_or(UserInfo {
                id: user_id,
                name: "Unknown".to_string(),
                email: String::new(),
                phone: None,
            }))
    }

    async fn generate_invite_code(&self) -> Result<String, LedgerError> {
        for _ in 0..INVITE_CODE_ATTEMPTS {
            let code: String = {
                let mut rng = rand::thread_rng();
                (0..INVITE_CODE_LEN)
                    .map(|_| {
                        let idx = rng.gen_range(0..INVITE_CODE_CHARSET.len());
                        INVITE_CODE_CHARSET[idx] as char
                    })
                    .collect()
            };
            if self.storage.get_group_by_invite_code(&code).await?.is_none() {
                debug!("Generated invite code: {}", code);
                return Ok(code);
            }
        }
        Err(LedgerError::InternalServerError(
            "Could not generate a unique invite code".to_string(),
        ))
    }
}

fn validate_amount(amount: f64) -> Result<(), LedgerError> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(LedgerError::InvalidInput(
            "amount".into(),
            "Valid amount is required".into(),
        ));
    }
    Ok(())
}
