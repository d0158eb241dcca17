use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::user::UserInfo;

/// Group-scoped role, stored on the membership row. Deliberately separate
/// from `UserRole`: the two can diverge.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum MemberRole {
    Admin,
    Member,
}

/// Join record linking a user to a savings group. At most one row per
/// (user_id, group_id) pair.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct GroupMember {
    pub id: Uuid,
    pub group_id: Uuid,
    pub user_id: Uuid,
    pub role: MemberRole,
    pub joined_at: DateTime<Utc>,
}

/// Membership row with the joined user, as returned by the member listings.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct MemberWithUser {
    #[serde(flatten)]
    pub member: GroupMember,
    pub user: UserInfo,
}
