//! The single access policy check, invoked by every group-scoped operation.
//! Admins reach only groups they created; members reach only groups they
//! belong to. Centralizing the check here keeps the endpoints from drifting
//! apart in what they enforce.

use super::errors::LedgerError;
use super::models::{GroupMember, SavingsGroup, User};

/// Read/write access to group-scoped data.
pub fn check_group_access(
    caller: &User,
    group: &SavingsGroup,
    membership: Option<&GroupMember>,
) -> Result<(), LedgerError> {
    if caller.is_admin() {
        if group.created_by == caller.id {
            Ok(())
        } else {
            Err(LedgerError::Forbidden(format!(
                "admin {} does not own group {}",
                caller.id, group.id
            )))
        }
    } else if membership.is_some() {
        Ok(())
    } else {
        Err(LedgerError::Forbidden(format!(
            "user {} is not a member of group {}",
            caller.id, group.id
        )))
    }
}

/// Mutating admin operations: only the owning admin passes.
pub fn check_group_owner(caller: &User, group: &SavingsGroup) -> Result<(), LedgerError> {
    if !caller.is_admin() {
        return Err(LedgerError::Unauthorized(format!(
            "user {} is not an admin",
            caller.id
        )));
    }
    if group.created_by != caller.id {
        return Err(LedgerError::Forbidden(format!(
            "admin {} does not own group {}",
            caller.id, group.id
        )));
    }
    Ok(())
}
