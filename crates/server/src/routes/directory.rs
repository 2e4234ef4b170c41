use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;

use models::{azure_group_mapping, user_sync_log, SyncType};
use service::directory::service::{ConfigInput, ConfigView, MappingInput, SyncSummary};

use crate::errors::JsonApiError;
use crate::routes::auth::{CurrentUser, ServerState};

#[derive(Debug, Deserialize)]
pub struct EnabledInput {
    pub is_enabled: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct SyncInput {
    #[serde(default)]
    pub sync_type: Option<SyncType>,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct LogsQuery {
    /// Defaults to 20, at most 100.
    pub limit: Option<u64>,
}

#[utoipa::path(get, path = "/admin/directory/config", tag = "directory", responses((status = 200, description = "Tenant config, null when not configured")))]
pub async fn get_config(
    State(state): State<ServerState>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<Option<ConfigView>>, JsonApiError> {
    Ok(Json(state.directory.get_config(current.0.oid).await?))
}

#[utoipa::path(put, path = "/admin/directory/config", tag = "directory", request_body = crate::openapi::DirectoryConfigRequest, responses((status = 200, description = "Saved"), (status = 400, description = "Validation Error")))]
pub async fn save_config(
    State(state): State<ServerState>,
    Extension(current): Extension<CurrentUser>,
    Json(input): Json<ConfigInput>,
) -> Result<Json<ConfigView>, JsonApiError> {
    Ok(Json(state.directory.save_config(current.0.oid, input).await?))
}

#[utoipa::path(put, path = "/admin/directory/config/enabled", tag = "directory", request_body = crate::openapi::EnabledRequest, responses((status = 200, description = "Updated"), (status = 404, description = "Not configured")))]
pub async fn set_enabled(
    State(state): State<ServerState>,
    Extension(current): Extension<CurrentUser>,
    Json(input): Json<EnabledInput>,
) -> Result<Json<ConfigView>, JsonApiError> {
    Ok(Json(state.directory.set_enabled(current.0.oid, input.is_enabled).await?))
}

#[utoipa::path(get, path = "/admin/directory/mappings", tag = "directory", responses((status = 200, description = "Group to role mappings")))]
pub async fn list_mappings(
    State(state): State<ServerState>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<Vec<azure_group_mapping::Model>>, JsonApiError> {
    Ok(Json(state.directory.list_mappings(current.0.oid).await?))
}

#[utoipa::path(post, path = "/admin/directory/mappings", tag = "directory", request_body = crate::openapi::MappingRequest, responses((status = 200, description = "Created"), (status = 409, description = "Group already mapped")))]
pub async fn create_mapping(
    State(state): State<ServerState>,
    Extension(current): Extension<CurrentUser>,
    Json(input): Json<MappingInput>,
) -> Result<Json<azure_group_mapping::Model>, JsonApiError> {
    Ok(Json(state.directory.create_mapping(current.0.oid, input).await?))
}

#[utoipa::path(delete, path = "/admin/directory/mappings/{id}", tag = "directory", params(("id" = Uuid, Path, description = "Mapping id")), responses((status = 204, description = "Deleted"), (status = 404, description = "Not Found")))]
pub async fn delete_mapping(
    State(state): State<ServerState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, JsonApiError> {
    state.directory.delete_mapping(current.0.oid, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(post, path = "/admin/directory/sync", tag = "directory", request_body = crate::openapi::DirectorySyncRequest, responses((status = 200, description = "Sync summary"), (status = 404, description = "Not configured"), (status = 502, description = "Upstream Error")))]
pub async fn sync(
    State(state): State<ServerState>,
    Extension(current): Extension<CurrentUser>,
    input: Option<Json<SyncInput>>,
) -> Result<Json<SyncSummary>, JsonApiError> {
    let sync_type = input.and_then(|Json(i)| i.sync_type).unwrap_or(SyncType::Manual);
    Ok(Json(state.directory.sync_organization(current.0.oid, sync_type).await?))
}

#[utoipa::path(get, path = "/admin/directory/logs", tag = "directory", params(LogsQuery), responses((status = 200, description = "Sync runs, most recent first")))]
pub async fn list_logs(
    State(state): State<ServerState>,
    Extension(current): Extension<CurrentUser>,
    Query(q): Query<LogsQuery>,
) -> Result<Json<Vec<user_sync_log::Model>>, JsonApiError> {
    Ok(Json(state.directory.list_sync_logs(current.0.oid, q.limit.unwrap_or(20)).await?))
}
