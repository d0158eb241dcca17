use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::core::errors::LedgerError;
use crate::core::models::{ContributionFrequency, TransactionType};

// Request structs for JSON payloads

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub name: Option<String>,
    pub password: String,
}

#[derive(Deserialize, ToSchema)]
pub struct CreateGroupRequest {
    pub name: String,
    pub description: Option<String>,
    pub contribution_frequency: Option<ContributionFrequency>,
    pub contribution_amount: Option<f64>,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateGroupRequest {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct AddMemberRequest {
    pub email: String,
    pub name: Option<String>,
    pub phone: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct JoinGroupRequest {
    pub invite_code: String,
}

#[derive(Deserialize, ToSchema)]
pub struct RecordTransactionRequest {
    /// GroupMember row id, not the user id.
    pub member_id: Uuid,
    pub amount: f64,
    #[serde(rename = "type")]
    pub kind: Option<TransactionType>,
    pub description: Option<String>,
    pub contribution_period: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct RecordOwnTransactionRequest {
    pub amount: f64,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub description: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct PayoutRequest {
    /// GroupMember row ids to pay out to; all members when omitted.
    pub member_ids: Option<Vec<Uuid>>,
}

// Response structs

#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Serialize, ToSchema)]
pub struct DeleteResponse {
    pub success: bool,
}

#[derive(Serialize, ToSchema)]
pub struct ProofUploadResponse {
    pub success: bool,
    pub file_name: String,
    pub url: String,
}

/// Newtype wrapper so `LedgerError` can cross the axum boundary as a JSON
/// error body with the mapped status.
pub struct ApiError(pub LedgerError);

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self.0 {
            LedgerError::Unauthorized(_) | LedgerError::InvalidCredentials => {
                StatusCode::UNAUTHORIZED
            }
            LedgerError::Forbidden(_) => StatusCode::FORBIDDEN,
            LedgerError::UserNotFound(_)
            | LedgerError::GroupNotFound(_)
            | LedgerError::MemberNotFound(_)
            | LedgerError::InvalidInviteCode => StatusCode::NOT_FOUND,
            LedgerError::InvalidInput(_, _)
            | LedgerError::NoMembersSelected
            | LedgerError::InsufficientFunds { .. }
            | LedgerError::UnsupportedFileType(_)
            | LedgerError::FileTooLarge(_) => StatusCode::BAD_REQUEST,
            LedgerError::EmailAlreadyRegistered(_)
            | LedgerError::AlreadyGroupMember
            | LedgerError::DuplicateInviteCode(_) => StatusCode::CONFLICT,
            LedgerError::StorageError(_) | LedgerError::InternalServerError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let body = ErrorResponse {
            error: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
