use utoipa::OpenApi;

use crate::{
    api::models::{
        AddMemberRequest, CreateGroupRequest, DeleteResponse, ErrorResponse, JoinGroupRequest,
        LoginRequest, PayoutRequest, ProofUploadResponse, RecordOwnTransactionRequest,
        RecordTransactionRequest, UpdateGroupRequest,
    },
    core::{
        ledger::{GroupAnalytics, MemberSummary},
        models::{
            GroupMember, GroupWithStats, MemberWithUser, SavingsGroup, Transaction,
            TransactionWithUser, User, UserInfo,
        },
        service::{JoinOutcome, LoginOutcome, PayoutOutcome},
    },
};

#[derive(OpenApi)]
#[openapi(
    paths(
        super::handlers::login,
        super::handlers::list_admin_groups,
        super::handlers::create_group,
        super::handlers::get_group,
        super::handlers::update_group,
        super::handlers::delete_group,
        super::handlers::list_members,
        super::handlers::add_member,
        super::handlers::remove_member,
        super::handlers::list_group_transactions,
        super::handlers::record_transaction,
        super::handlers::run_payout,
        super::handlers::group_analytics,
        super::handlers::upload_proof,
        super::handlers::list_member_groups,
        super::handlers::join_group,
        super::handlers::list_member_transactions,
        super::handlers::record_own_transaction
    ),
    components(schemas(
        LoginRequest,
        CreateGroupRequest,
        UpdateGroupRequest,
        AddMemberRequest,
        JoinGroupRequest,
        RecordTransactionRequest,
        RecordOwnTransactionRequest,
        PayoutRequest,
        ErrorResponse,
        DeleteResponse,
        ProofUploadResponse,
        User,
        UserInfo,
        SavingsGroup,
        GroupWithStats,
        GroupMember,
        MemberWithUser,
        Transaction,
        TransactionWithUser,
        GroupAnalytics,
        MemberSummary,
        LoginOutcome,
        JoinOutcome,
        PayoutOutcome
    )),
    info(
        title = "Ajoledger API",
        description = "API for managing group savings, contributions and payouts",
        version = "0.1.0"
    )
)]
pub struct ApiDoc;
