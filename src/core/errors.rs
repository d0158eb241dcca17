use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, Serialize)]
pub enum LedgerError {
    /// No valid caller identity (missing or invalid token, or a member
    /// calling an admin-only surface).
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Valid identity that fails the access policy check for the resource.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("User {0} not found")]
    UserNotFound(String),

    #[error("Group {0} not found")]
    GroupNotFound(String),

    #[error("Member {0} not found")]
    MemberNotFound(String),

    #[error("Invalid invite code")]
    InvalidInviteCode,

    #[error("Email {0} already registered")]
    EmailAlreadyRegistered(String),

    #[error("Already a member of this group")]
    AlreadyGroupMember,

    #[error("Invite code {0} already in use")]
    DuplicateInviteCode(String),

    #[error("Invalid input for `{0}`: {1}")]
    InvalidInput(String, String),

    /// Payout allocation over an empty member set.
    #[error("No members selected")]
    NoMembersSelected,

    /// Member-initiated payout exceeding the current fold balance.
    #[error("Insufficient funds: requested {requested}, available {available}")]
    InsufficientFunds { requested: f64, available: f64 },

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    #[error("File too large: {0} bytes")]
    FileTooLarge(usize),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Internal server error: {0}")]
    InternalServerError(String),
}
