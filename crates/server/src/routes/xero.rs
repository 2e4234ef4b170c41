use axum::{
    extract::State,
    Extension, Json,
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use service::claims::{self, SyncQueue};
use service::xero::service::{AuthorizeUrl, ConnectionTest, SaveSettingsInput, SettingsView, SyncResult};

use crate::errors::JsonApiError;
use crate::routes::auth::{CurrentUser, ServerState};

#[derive(Debug, Deserialize)]
pub struct AuthorizeInput {
    pub redirect_uri: String,
}

#[derive(Debug, Deserialize)]
pub struct CallbackInput {
    pub code: String,
    pub redirect_uri: String,
    pub state: String,
}

#[derive(Debug, Deserialize)]
pub struct SyncInput {
    pub claim_ids: Vec<Uuid>,
}

#[utoipa::path(get, path = "/admin/xero/settings", tag = "xero", responses((status = 200, description = "Settings and connection status")))]
pub async fn get_settings(State(state): State<ServerState>) -> Result<Json<SettingsView>, JsonApiError> {
    Ok(Json(state.xero.settings_view().await?))
}

#[utoipa::path(put, path = "/admin/xero/settings", tag = "xero", request_body = crate::openapi::XeroSettingsRequest, responses((status = 200, description = "Saved"), (status = 400, description = "Validation Error")))]
pub async fn save_settings(
    State(state): State<ServerState>,
    Json(input): Json<SaveSettingsInput>,
) -> Result<Json<SettingsView>, JsonApiError> {
    Ok(Json(state.xero.save_settings(input).await?))
}

#[utoipa::path(post, path = "/admin/xero/authorize-url", tag = "xero", request_body = crate::openapi::AuthorizeRequest, responses((status = 200, description = "Login URL with state")))]
pub async fn authorize_url(
    State(state): State<ServerState>,
    Json(input): Json<AuthorizeInput>,
) -> Result<Json<AuthorizeUrl>, JsonApiError> {
    Ok(Json(state.xero.authorize_url(&input.redirect_uri).await?))
}

#[utoipa::path(post, path = "/admin/xero/callback", tag = "xero", request_body = crate::openapi::CallbackRequest, responses((status = 200, description = "Connected"), (status = 400, description = "Unknown state"), (status = 502, description = "Upstream Error")))]
pub async fn callback(
    State(state): State<ServerState>,
    Json(input): Json<CallbackInput>,
) -> Result<Json<SettingsView>, JsonApiError> {
    let view = state.xero.complete_oauth(&input.code, &input.redirect_uri, &input.state).await?;
    Ok(Json(view))
}

#[utoipa::path(post, path = "/admin/xero/test", tag = "xero", responses((status = 200, description = "Token refreshed"), (status = 502, description = "Upstream Error")))]
pub async fn test_connection(State(state): State<ServerState>) -> Result<Json<ConnectionTest>, JsonApiError> {
    Ok(Json(state.xero.test_connection().await?))
}

#[utoipa::path(get, path = "/admin/xero/queue", tag = "xero", responses((status = 200, description = "Approved claims awaiting or finished sync")))]
pub async fn queue(
    State(state): State<ServerState>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<SyncQueue>, JsonApiError> {
    Ok(Json(claims::sync_queue(&state.db, current.0.oid).await?))
}

#[utoipa::path(post, path = "/admin/xero/sync", tag = "xero", request_body = crate::openapi::SyncClaimsRequest, responses((status = 200, description = "One result per claim")))]
pub async fn sync(
    State(state): State<ServerState>,
    Extension(current): Extension<CurrentUser>,
    Json(input): Json<SyncInput>,
) -> Result<Json<Vec<SyncResult>>, JsonApiError> {
    let results = state.xero.sync_claims(current.0.oid, &input.claim_ids).await?;
    let synced = results.iter().filter(|r| r.success).count();
    info!(requested = input.claim_ids.len(), synced, by = %current.0.uid, "xero sync finished");
    Ok(Json(results))
}
