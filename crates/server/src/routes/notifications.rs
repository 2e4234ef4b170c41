use std::str::FromStr;

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;

use models::{email_log, email_template, TemplateType};
use service::notify::service::{RenderedEmail, SendRequest};
use service::pagination::{Page, Pagination};

use crate::errors::JsonApiError;
use crate::routes::auth::{CurrentUser, ServerState};

#[derive(Debug, Deserialize)]
pub struct TemplateInput {
    pub subject: String,
    pub body: String,
}

#[utoipa::path(get, path = "/admin/email-templates", tag = "notifications", responses((status = 200, description = "Email templates")))]
pub async fn list_templates(State(state): State<ServerState>) -> Result<Json<Vec<email_template::Model>>, JsonApiError> {
    Ok(Json(state.notifications.list_templates().await?))
}

#[utoipa::path(
    put, path = "/admin/email-templates/{kind}", tag = "notifications",
    params(("kind" = String, Path, description = "claim_submitted, claim_approved or claim_rejected")),
    request_body = crate::openapi::TemplateRequest,
    responses((status = 200, description = "Saved"), (status = 400, description = "Unknown template type"))
)]
pub async fn update_template(
    State(state): State<ServerState>,
    Path(kind): Path<String>,
    Json(input): Json<TemplateInput>,
) -> Result<Json<email_template::Model>, JsonApiError> {
    let kind = TemplateType::from_str(&kind)?;
    Ok(Json(state.notifications.update_template(kind, &input.subject, &input.body).await?))
}

#[utoipa::path(
    get, path = "/admin/email-logs", tag = "notifications",
    params(("page" = Option<u32>, Query, description = "1-based page"), ("per_page" = Option<u32>, Query, description = "Items per page")),
    responses((status = 200, description = "Logged emails, newest first"))
)]
pub async fn list_logs(
    State(state): State<ServerState>,
    Extension(current): Extension<CurrentUser>,
    Query(page): Query<Pagination>,
) -> Result<Json<Page<email_log::Model>>, JsonApiError> {
    Ok(Json(state.notifications.list_email_logs(current.0.oid, page).await?))
}

#[utoipa::path(
    post, path = "/notifications/send", tag = "notifications",
    request_body = crate::openapi::SendEmailRequest,
    responses((status = 200, description = "Rendered and logged"), (status = 404, description = "Template or claim missing"))
)]
pub async fn send(
    State(state): State<ServerState>,
    Extension(current): Extension<CurrentUser>,
    Json(req): Json<SendRequest>,
) -> Result<Json<RenderedEmail>, JsonApiError> {
    Ok(Json(state.notifications.send(&current.actor(), req).await?))
}
