use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

pub const INVITE_CODE_LEN: usize = 6;

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct SavingsGroup {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    /// 6 uppercase alphanumeric characters, unique across all groups.
    pub invite_code: String,
    /// Owning admin's user id.
    pub created_by: Uuid,
    pub contribution_frequency: ContributionFrequency,
    pub contribution_amount: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum ContributionFrequency {
    Daily,
    Weekly,
    Monthly,
}

impl Default for ContributionFrequency {
    fn default() -> Self {
        ContributionFrequency::Monthly
    }
}

/// A group plus the counts the listing endpoints attach to it. `balance` is
/// populated on the member-facing listings only.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct GroupWithStats {
    #[serde(flatten)]
    pub group: SavingsGroup,
    pub member_count: usize,
    pub transaction_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance: Option<f64>,
}
