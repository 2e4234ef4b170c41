//! Claim, expense and approval endpoints. The caller's identity comes from
//! `CurrentUser`; ownership and role rules are enforced by the service layer.
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use models::{expense, expense_claim};
use service::claims::{self, ClaimDetail, ClaimFilter, ClaimInput, ClaimSummary};
use service::expenses::{self, ExpenseInput};
use service::pagination::Page;

use crate::errors::JsonApiError;
use crate::routes::auth::{CurrentUser, ServerState};

#[derive(Debug, Deserialize)]
pub struct ReviewInput {
    pub approve: bool,
    #[serde(default)]
    pub notes: Option<String>,
}

#[utoipa::path(
    get, path = "/claims", tag = "claims",
    params(
        ("status" = Option<String>, Query, description = "draft, submitted, approved or rejected"),
        ("from" = Option<String>, Query, description = "Claims ending on or after this date"),
        ("to" = Option<String>, Query, description = "Claims starting on or before this date"),
        ("page" = Option<u32>, Query, description = "1-based page"),
        ("per_page" = Option<u32>, Query, description = "Items per page")
    ),
    responses((status = 200, description = "Own claims with totals"))
)]
pub async fn list(
    State(state): State<ServerState>,
    Extension(current): Extension<CurrentUser>,
    Query(filter): Query<ClaimFilter>,
) -> Result<Json<Page<ClaimSummary>>, JsonApiError> {
    let page = claims::list_claims(&state.db, &current.actor(), filter).await?;
    Ok(Json(page))
}

#[utoipa::path(
    post, path = "/claims", tag = "claims",
    request_body = crate::openapi::ClaimInputDoc,
    responses((status = 200, description = "Draft created"), (status = 400, description = "Validation Error"))
)]
pub async fn create(
    State(state): State<ServerState>,
    Extension(current): Extension<CurrentUser>,
    Json(input): Json<ClaimInput>,
) -> Result<Json<expense_claim::Model>, JsonApiError> {
    let claim = claims::create_claim(&state.db, &current.actor(), input).await?;
    Ok(Json(claim))
}

#[utoipa::path(
    get, path = "/claims/{id}", tag = "claims",
    params(("id" = Uuid, Path, description = "Claim id")),
    responses((status = 200, description = "Claim with expenses"), (status = 404, description = "Not Found"))
)]
pub async fn get(
    State(state): State<ServerState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ClaimDetail>, JsonApiError> {
    let detail = claims::get_claim_detail(&state.db, &current.actor(), id).await?;
    Ok(Json(detail))
}

#[utoipa::path(
    put, path = "/claims/{id}", tag = "claims",
    params(("id" = Uuid, Path, description = "Claim id")),
    request_body = crate::openapi::ClaimInputDoc,
    responses((status = 200, description = "Updated"), (status = 422, description = "Not a draft"))
)]
pub async fn update(
    State(state): State<ServerState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(input): Json<ClaimInput>,
) -> Result<Json<expense_claim::Model>, JsonApiError> {
    let claim = claims::update_claim(&state.db, &current.actor(), id, input).await?;
    Ok(Json(claim))
}

#[utoipa::path(
    delete, path = "/claims/{id}", tag = "claims",
    params(("id" = Uuid, Path, description = "Claim id")),
    responses((status = 204, description = "Deleted"), (status = 422, description = "Not a draft"))
)]
pub async fn delete(
    State(state): State<ServerState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, JsonApiError> {
    claims::delete_claim(&state.db, &current.actor(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post, path = "/claims/{id}/submit", tag = "claims",
    params(("id" = Uuid, Path, description = "Claim id")),
    responses((status = 200, description = "Submitted"), (status = 422, description = "Invalid State"))
)]
pub async fn submit(
    State(state): State<ServerState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<expense_claim::Model>, JsonApiError> {
    let claim = claims::submit_claim(&state.db, &current.actor(), id).await?;
    state.notifications.claim_submitted(claim.id).await;
    Ok(Json(claim))
}

#[utoipa::path(
    post, path = "/claims/{id}/reopen", tag = "claims",
    params(("id" = Uuid, Path, description = "Claim id")),
    responses((status = 200, description = "Back to draft"), (status = 422, description = "Invalid State"))
)]
pub async fn reopen(
    State(state): State<ServerState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<expense_claim::Model>, JsonApiError> {
    let claim = claims::reopen_claim(&state.db, &current.actor(), id).await?;
    Ok(Json(claim))
}

#[utoipa::path(
    post, path = "/claims/{id}/expenses", tag = "claims",
    params(("id" = Uuid, Path, description = "Claim id")),
    request_body = crate::openapi::ExpenseInputDoc,
    responses((status = 200, description = "Expense added"), (status = 400, description = "Validation Error"))
)]
pub async fn add_expense(
    State(state): State<ServerState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(input): Json<ExpenseInput>,
) -> Result<Json<expense::Model>, JsonApiError> {
    let row = expenses::add_expense(&state.db, &current.actor(), id, input).await?;
    Ok(Json(row))
}

#[utoipa::path(
    put, path = "/expenses/{id}", tag = "claims",
    params(("id" = Uuid, Path, description = "Expense id")),
    request_body = crate::openapi::ExpenseInputDoc,
    responses((status = 200, description = "Expense updated"))
)]
pub async fn update_expense(
    State(state): State<ServerState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(input): Json<ExpenseInput>,
) -> Result<Json<expense::Model>, JsonApiError> {
    let row = expenses::update_expense(&state.db, &current.actor(), id, input).await?;
    Ok(Json(row))
}

#[utoipa::path(
    delete, path = "/expenses/{id}", tag = "claims",
    params(("id" = Uuid, Path, description = "Expense id")),
    responses((status = 204, description = "Expense deleted"))
)]
pub async fn delete_expense(
    State(state): State<ServerState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, JsonApiError> {
    expenses::delete_expense(&state.db, &current.actor(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get, path = "/approvals", tag = "approvals",
    responses((status = 200, description = "Submitted claims, oldest first"), (status = 403, description = "Forbidden"))
)]
pub async fn approval_queue(
    State(state): State<ServerState>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<Vec<ClaimSummary>>, JsonApiError> {
    let queue = claims::approval_queue(&state.db, current.0.oid).await?;
    Ok(Json(queue))
}

#[utoipa::path(
    post, path = "/approvals/{id}/review", tag = "approvals",
    params(("id" = Uuid, Path, description = "Claim id")),
    request_body = crate::openapi::ReviewRequest,
    responses((status = 200, description = "Reviewed"), (status = 403, description = "Forbidden"), (status = 422, description = "Invalid State"))
)]
pub async fn review(
    State(state): State<ServerState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(input): Json<ReviewInput>,
) -> Result<Json<expense_claim::Model>, JsonApiError> {
    let claim = claims::review_claim(&state.db, &current.actor(), id, input.approve, input.notes).await?;
    info!(claim_id = %id, approve = input.approve, "claim review recorded");
    state.notifications.claim_reviewed(claim.id).await;
    Ok(Json(claim))
}
