use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use models::{client, expense_category, mileage_rate};
use service::catalog::{
    categories::{self, CategoryInput},
    clients,
    mileage_rates::{self, RateInput, RateUpdate},
};
use service::settings_service;

use crate::errors::JsonApiError;
use crate::routes::auth::ServerState;

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct ActiveQuery {
    /// Defaults to true; admins pass false to see retired entries.
    pub active_only: Option<bool>,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct RatesQuery {
    /// Only rates in effect on this date.
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct ActiveInput {
    pub is_active: bool,
}

#[derive(Debug, Deserialize)]
pub struct ClientInput {
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Disclaimer {
    pub disclaimer: String,
}

#[utoipa::path(get, path = "/categories", tag = "catalog", params(ActiveQuery), responses((status = 200, description = "Expense categories")))]
pub async fn list_categories(
    State(state): State<ServerState>,
    Query(q): Query<ActiveQuery>,
) -> Result<Json<Vec<expense_category::Model>>, JsonApiError> {
    let list = categories::list(&state.db, q.active_only.unwrap_or(true)).await?;
    Ok(Json(list))
}

#[utoipa::path(post, path = "/admin/categories", tag = "catalog", request_body = crate::openapi::CategoryInputDoc, responses((status = 200, description = "Created"), (status = 409, description = "Conflict")))]
pub async fn create_category(
    State(state): State<ServerState>,
    Json(input): Json<CategoryInput>,
) -> Result<Json<expense_category::Model>, JsonApiError> {
    Ok(Json(categories::create(&state.db, input).await?))
}

#[utoipa::path(put, path = "/admin/categories/{id}", tag = "catalog", params(("id" = Uuid, Path, description = "Category id")), request_body = crate::openapi::CategoryInputDoc, responses((status = 200, description = "Updated")))]
pub async fn update_category(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(input): Json<CategoryInput>,
) -> Result<Json<expense_category::Model>, JsonApiError> {
    Ok(Json(categories::update(&state.db, id, input).await?))
}

#[utoipa::path(put, path = "/admin/categories/{id}/active", tag = "catalog", params(("id" = Uuid, Path, description = "Category id")), request_body = crate::openapi::ActiveRequest, responses((status = 200, description = "Updated")))]
pub async fn set_category_active(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(input): Json<ActiveInput>,
) -> Result<Json<expense_category::Model>, JsonApiError> {
    Ok(Json(categories::set_active(&state.db, id, input.is_active).await?))
}

#[utoipa::path(get, path = "/clients", tag = "catalog", params(ActiveQuery), responses((status = 200, description = "Chargeable clients")))]
pub async fn list_clients(
    State(state): State<ServerState>,
    Query(q): Query<ActiveQuery>,
) -> Result<Json<Vec<client::Model>>, JsonApiError> {
    Ok(Json(clients::list(&state.db, q.active_only.unwrap_or(true)).await?))
}

#[utoipa::path(post, path = "/admin/clients", tag = "catalog", request_body = crate::openapi::ClientRequest, responses((status = 200, description = "Created"), (status = 409, description = "Conflict")))]
pub async fn create_client(
    State(state): State<ServerState>,
    Json(input): Json<ClientInput>,
) -> Result<Json<client::Model>, JsonApiError> {
    Ok(Json(clients::create(&state.db, &input.name).await?))
}

#[utoipa::path(put, path = "/admin/clients/{id}", tag = "catalog", params(("id" = Uuid, Path, description = "Client id")), request_body = crate::openapi::ActiveRequest, responses((status = 200, description = "Updated")))]
pub async fn set_client_active(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(input): Json<ActiveInput>,
) -> Result<Json<client::Model>, JsonApiError> {
    Ok(Json(clients::set_active(&state.db, id, input.is_active).await?))
}

#[utoipa::path(get, path = "/mileage-rates", tag = "catalog", params(RatesQuery), responses((status = 200, description = "Mileage rates")))]
pub async fn list_rates(
    State(state): State<ServerState>,
    Query(q): Query<RatesQuery>,
) -> Result<Json<Vec<mileage_rate::Model>>, JsonApiError> {
    let rates = match q.date {
        Some(date) => mileage_rates::current_rates(&state.db, date).await?,
        None => mileage_rates::list(&state.db).await?,
    };
    Ok(Json(rates))
}

#[utoipa::path(post, path = "/admin/mileage-rates", tag = "catalog", request_body = crate::openapi::RateInputDoc, responses((status = 200, description = "Created"), (status = 400, description = "Validation Error")))]
pub async fn create_rate(
    State(state): State<ServerState>,
    Json(input): Json<RateInput>,
) -> Result<Json<mileage_rate::Model>, JsonApiError> {
    Ok(Json(mileage_rates::create(&state.db, input).await?))
}

#[utoipa::path(put, path = "/admin/mileage-rates/{id}", tag = "catalog", params(("id" = Uuid, Path, description = "Rate id")), request_body = crate::openapi::RateUpdateDoc, responses((status = 200, description = "Updated")))]
pub async fn update_rate(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(input): Json<RateUpdate>,
) -> Result<Json<mileage_rate::Model>, JsonApiError> {
    Ok(Json(mileage_rates::update_rate(&state.db, id, input).await?))
}

#[utoipa::path(get, path = "/settings/disclaimer", tag = "catalog", responses((status = 200, description = "Expense policy disclaimer")))]
pub async fn get_disclaimer(State(state): State<ServerState>) -> Result<Json<Disclaimer>, JsonApiError> {
    let disclaimer = settings_service::disclaimer(&state.db).await?;
    Ok(Json(Disclaimer { disclaimer }))
}

#[utoipa::path(put, path = "/admin/settings/disclaimer", tag = "catalog", request_body = crate::openapi::DisclaimerRequest, responses((status = 200, description = "Saved")))]
pub async fn set_disclaimer(
    State(state): State<ServerState>,
    Json(input): Json<Disclaimer>,
) -> Result<Json<Disclaimer>, JsonApiError> {
    let disclaimer = settings_service::set_disclaimer(&state.db, &input.disclaimer).await?;
    Ok(Json(Disclaimer { disclaimer }))
}
