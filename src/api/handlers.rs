use axum::{
    Extension, Json, Router,
    extract::{DefaultBodyLimit, Multipart, Path, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::IntoResponse,
    routing::{get, post},
};
use http::header;
use std::sync::Arc;

use crate::{
    api::models::*,
    auth::jwt::Claims,
    core::{
        errors::LedgerError,
        ledger::GroupAnalytics,
        models::{GroupWithStats, MemberWithUser, SavingsGroup, TransactionWithUser},
        service::{JoinOutcome, LedgerService, LoginOutcome, PayoutOutcome},
    },
    infrastructure::{
        proofs::{MAX_PROOF_BYTES, ProofStore},
        storage::in_memory::InMemoryStorage,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<LedgerService<InMemoryStorage>>,
    pub proofs: Arc<ProofStore>,
}

/// Middleware validating the bearer token and stashing the claims for the
/// handlers.
async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<impl IntoResponse, ApiError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| LedgerError::Unauthorized("Missing Authorization header".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| LedgerError::Unauthorized("Invalid Authorization header".to_string()))?;

    let claims = state.service.validate_token(token)?;
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

pub fn api_routes(state: AppState) -> Router {
    let protected = Router::new()
        .route("/admin/groups", get(list_admin_groups).post(create_group))
        .route(
            "/admin/groups/{group_id}",
            get(get_group).put(update_group).delete(delete_group),
        )
        .route(
            "/admin/groups/{group_id}/members",
            get(list_members).post(add_member),
        )
        .route(
            "/admin/groups/{group_id}/members/{member_id}",
            axum::routing::delete(remove_member),
        )
        .route(
            "/admin/groups/{group_id}/transactions",
            get(list_group_transactions).post(record_transaction),
        )
        .route("/admin/groups/{group_id}/payout", post(run_payout))
        .route("/admin/groups/{group_id}/analytics", get(group_analytics))
        .route("/admin/groups/{group_id}/proofs", post(upload_proof))
        .route("/member/groups", get(list_member_groups))
        .route("/member/groups/join", post(join_group))
        .route(
            "/member/groups/{group_id}/transactions",
            get(list_member_transactions).post(record_own_transaction),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/", get(|| async { "OK" }))
        .route("/auth/login", post(login))
        .merge(protected)
        .layer(DefaultBodyLimit::max(MAX_PROOF_BYTES + 1024 * 1024))
        .with_state(state)
}

#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in, user created lazily if new", body = LoginOutcome),
        (status = 401, description = "Invalid credentials", body = ErrorResponse)
    )
)]
pub(crate) async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginOutcome>, ApiError> {
    let outcome = state
        .service
        .login(&req.email, req.name, &req.password)
        .await?;
    Ok(Json(outcome))
}

#[utoipa::path(
    get,
    path = "/admin/groups",
    responses(
        (status = 200, description = "Groups owned by the calling admin", body = [GroupWithStats]),
        (status = 401, description = "Not an admin", body = ErrorResponse)
    )
)]
pub(crate) async fn list_admin_groups(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<GroupWithStats>>, ApiError> {
    let caller = state.service.current_user(&claims).await?;
    Ok(Json(state.service.list_admin_groups(&caller).await?))
}

#[utoipa::path(
    post,
    path = "/admin/groups",
    request_body = CreateGroupRequest,
    responses(
        (status = 201, description = "Group created", body = GroupWithStats),
        (status = 400, description = "Missing name", body = ErrorResponse)
    )
)]
pub(crate) async fn create_group(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateGroupRequest>,
) -> Result<(StatusCode, Json<GroupWithStats>), ApiError> {
    let caller = state.service.current_user(&claims).await?;
    let group = state
        .service
        .create_group(
            &caller,
            req.name,
            req.description,
            req.contribution_frequency,
            req.contribution_amount,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(group)))
}

#[utoipa::path(
    get,
    path = "/admin/groups/{group_id}",
    responses(
        (status = 200, description = "Group with counts", body = GroupWithStats),
        (status = 404, description = "Unknown group", body = ErrorResponse)
    )
)]
pub(crate) async fn get_group(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(group_id): Path<uuid::Uuid>,
) -> Result<Json<GroupWithStats>, ApiError> {
    let caller = state.service.current_user(&claims).await?;
    Ok(Json(state.service.get_group(&caller, group_id).await?))
}

#[utoipa::path(
    put,
    path = "/admin/groups/{group_id}",
    request_body = UpdateGroupRequest,
    responses(
        (status = 200, description = "Group updated", body = SavingsGroup),
        (status = 403, description = "Not the owning admin", body = ErrorResponse)
    )
)]
pub(crate) async fn update_group(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(group_id): Path<uuid::Uuid>,
    Json(req): Json<UpdateGroupRequest>,
) -> Result<Json<SavingsGroup>, ApiError> {
    let caller = state.service.current_user(&claims).await?;
    let group = state
        .service
        .update_group(&caller, group_id, req.name, req.description)
        .await?;
    Ok(Json(group))
}

#[utoipa::path(
    delete,
    path = "/admin/groups/{group_id}",
    responses(
        (status = 200, description = "Group, members and transactions deleted", body = DeleteResponse),
        (status = 404, description = "Unknown group", body = ErrorResponse)
    )
)]
pub(crate) async fn delete_group(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(group_id): Path<uuid::Uuid>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let caller = state.service.current_user(&claims).await?;
    state.service.delete_group(&caller, group_id).await?;
    Ok(Json(DeleteResponse { success: true }))
}

#[utoipa::path(
    get,
    path = "/admin/groups/{group_id}/members",
    responses(
        (status = 200, description = "Members with joined user info", body = [MemberWithUser]),
        (status = 403, description = "Caller has no access to the group", body = ErrorResponse)
    )
)]
pub(crate) async fn list_members(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(group_id): Path<uuid::Uuid>,
) -> Result<Json<Vec<MemberWithUser>>, ApiError> {
    let caller = state.service.current_user(&claims).await?;
    Ok(Json(state.service.list_members(&caller, group_id).await?))
}

#[utoipa::path(
    post,
    path = "/admin/groups/{group_id}/members",
    request_body = AddMemberRequest,
    responses(
        (status = 201, description = "Member added, user created lazily if new", body = MemberWithUser),
        (status = 409, description = "Already a member", body = ErrorResponse)
    )
)]
pub(crate) async fn add_member(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(group_id): Path<uuid::Uuid>,
    Json(req): Json<AddMemberRequest>,
) -> Result<(StatusCode, Json<MemberWithUser>), ApiError> {
    let caller = state.service.current_user(&claims).await?;
    let member = state
        .service
        .add_member(&caller, group_id, req.email, req.name, req.phone)
        .await?;
    Ok((StatusCode::CREATED, Json(member)))
}

#[utoipa::path(
    delete,
    path = "/admin/groups/{group_id}/members/{member_id}",
    responses(
        (status = 200, description = "Member removed", body = DeleteResponse),
        (status = 404, description = "Member not in this group", body = ErrorResponse)
    )
)]
pub(crate) async fn remove_member(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path((group_id, member_id)): Path<(uuid::Uuid, uuid::Uuid)>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let caller = state.service.current_user(&claims).await?;
    state
        .service
        .remove_member(&caller, group_id, member_id)
        .await?;
    Ok(Json(DeleteResponse { success: true }))
}

#[utoipa::path(
    get,
    path = "/admin/groups/{group_id}/transactions",
    responses(
        (status = 200, description = "Transactions, newest first", body = [TransactionWithUser])
    )
)]
pub(crate) async fn list_group_transactions(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(group_id): Path<uuid::Uuid>,
) -> Result<Json<Vec<TransactionWithUser>>, ApiError> {
    let caller = state.service.current_user(&claims).await?;
    Ok(Json(
        state.service.list_transactions(&caller, group_id).await?,
    ))
}

#[utoipa::path(
    post,
    path = "/admin/groups/{group_id}/transactions",
    request_body = RecordTransactionRequest,
    responses(
        (status = 201, description = "Transaction recorded for the member", body = TransactionWithUser),
        (status = 400, description = "Invalid amount or type", body = ErrorResponse)
    )
)]
pub(crate) async fn record_transaction(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(group_id): Path<uuid::Uuid>,
    Json(req): Json<RecordTransactionRequest>,
) -> Result<(StatusCode, Json<TransactionWithUser>), ApiError> {
    let caller = state.service.current_user(&claims).await?;
    let tx = state
        .service
        .record_transaction(
            &caller,
            group_id,
            req.member_id,
            req.amount,
            req.kind,
            req.description,
            req.contribution_period,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(tx)))
}

#[utoipa::path(
    post,
    path = "/admin/groups/{group_id}/payout",
    request_body = PayoutRequest,
    responses(
        (status = 200, description = "Equal-split payout executed", body = PayoutOutcome),
        (status = 400, description = "No members selected", body = ErrorResponse)
    )
)]
pub(crate) async fn run_payout(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(group_id): Path<uuid::Uuid>,
    req: Option<Json<PayoutRequest>>,
) -> Result<Json<PayoutOutcome>, ApiError> {
    let caller = state.service.current_user(&claims).await?;
    let member_ids = req.and_then(|Json(r)| r.member_ids);
    let outcome = state
        .service
        .run_payout(&caller, group_id, member_ids)
        .await?;
    Ok(Json(outcome))
}

#[utoipa::path(
    get,
    path = "/admin/groups/{group_id}/analytics",
    responses(
        (status = 200, description = "Per-member and group-level summaries", body = GroupAnalytics)
    )
)]
pub(crate) async fn group_analytics(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(group_id): Path<uuid::Uuid>,
) -> Result<Json<GroupAnalytics>, ApiError> {
    let caller = state.service.current_user(&claims).await?;
    Ok(Json(
        state.service.group_analytics(&caller, group_id).await?,
    ))
}

#[utoipa::path(
    post,
    path = "/admin/groups/{group_id}/proofs",
    responses(
        (status = 200, description = "Payment proof stored", body = ProofUploadResponse),
        (status = 400, description = "Unsupported type or too large", body = ErrorResponse)
    )
)]
pub(crate) async fn upload_proof(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(group_id): Path<uuid::Uuid>,
    mut multipart: Multipart,
) -> Result<Json<ProofUploadResponse>, ApiError> {
    let caller = state.service.current_user(&claims).await?;
    // Ownership gate before any bytes hit the disk.
    state.service.get_group(&caller, group_id).await?;

    let mut stored = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| LedgerError::InvalidInput("file".into(), e.to_string()))?
    {
        if field.name() == Some("file") {
            let file_name = field.file_name().unwrap_or("upload.bin").to_string();
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| LedgerError::InvalidInput("file".into(), e.to_string()))?;
            stored = Some(
                state
                    .proofs
                    .save(group_id, &file_name, &content_type, &bytes)
                    .await?,
            );
        }
    }

    let proof = stored.ok_or_else(|| {
        LedgerError::InvalidInput("file".into(), "File is required".into())
    })?;
    Ok(Json(ProofUploadResponse {
        success: true,
        file_name: proof.file_name,
        url: proof.url,
    }))
}

#[utoipa::path(
    get,
    path = "/member/groups",
    responses(
        (status = 200, description = "Caller's groups with balances", body = [GroupWithStats])
    )
)]
pub(crate) async fn list_member_groups(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<GroupWithStats>>, ApiError> {
    let caller = state.service.current_user(&claims).await?;
    Ok(Json(state.service.list_member_groups(&caller).await?))
}

#[utoipa::path(
    post,
    path = "/member/groups/join",
    request_body = JoinGroupRequest,
    responses(
        (status = 200, description = "Joined the group", body = JoinOutcome),
        (status = 404, description = "Invalid invite code", body = ErrorResponse),
        (status = 409, description = "Already a member", body = ErrorResponse)
    )
)]
pub(crate) async fn join_group(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<JoinGroupRequest>,
) -> Result<Json<JoinOutcome>, ApiError> {
    let caller = state.service.current_user(&claims).await?;
    Ok(Json(
        state.service.join_group(&caller, &req.invite_code).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/member/groups/{group_id}/transactions",
    responses(
        (status = 200, description = "Transactions, newest first", body = [TransactionWithUser]),
        (status = 403, description = "Not a member", body = ErrorResponse)
    )
)]
pub(crate) async fn list_member_transactions(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(group_id): Path<uuid::Uuid>,
) -> Result<Json<Vec<TransactionWithUser>>, ApiError> {
    let caller = state.service.current_user(&claims).await?;
    Ok(Json(
        state.service.list_transactions(&caller, group_id).await?,
    ))
}

#[utoipa::path(
    post,
    path = "/member/groups/{group_id}/transactions",
    request_body = RecordOwnTransactionRequest,
    responses(
        (status = 201, description = "Transaction recorded for the caller", body = TransactionWithUser),
        (status = 400, description = "Invalid amount or insufficient funds", body = ErrorResponse)
    )
)]
pub(crate) async fn record_own_transaction(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(group_id): Path<uuid::Uuid>,
    Json(req): Json<RecordOwnTransactionRequest>,
) -> Result<(StatusCode, Json<TransactionWithUser>), ApiError> {
    let caller = state.service.current_user(&claims).await?;
    let tx = state
        .service
        .record_own_transaction(&caller, group_id, req.amount, req.kind, req.description)
        .await?;
    Ok((StatusCode::CREATED, Json(tx)))
}
