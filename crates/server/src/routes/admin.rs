//! Admin user management and expense history.
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use tracing::info;
use uuid::Uuid;

use models::expense;
use service::claims::{self, ExpenseFilter};
use service::pagination::{Page, Pagination};
use service::user_service::{self, CreateUserInput, UpdateUserInput, UserView};

use crate::errors::JsonApiError;
use crate::routes::auth::{CurrentUser, ServerState};

#[utoipa::path(
    get, path = "/admin/users", tag = "admin",
    params(("page" = Option<u32>, Query, description = "1-based page"), ("per_page" = Option<u32>, Query, description = "Items per page")),
    responses((status = 200, description = "Organization users"))
)]
pub async fn list_users(
    State(state): State<ServerState>,
    Extension(current): Extension<CurrentUser>,
    Query(page): Query<Pagination>,
) -> Result<Json<Page<UserView>>, JsonApiError> {
    Ok(Json(user_service::list_users(&state.db, current.0.oid, page).await?))
}

#[utoipa::path(
    post, path = "/admin/users", tag = "admin",
    request_body = crate::openapi::CreateUserDoc,
    responses((status = 200, description = "Created"), (status = 409, description = "Conflict"))
)]
pub async fn create_user(
    State(state): State<ServerState>,
    Extension(current): Extension<CurrentUser>,
    Json(input): Json<CreateUserInput>,
) -> Result<Json<UserView>, JsonApiError> {
    let user = user_service::create_user(&state.db, &current.actor(), input).await?;
    info!(user_id = %user.id, by = %current.0.uid, "admin created user");
    Ok(Json(user))
}

#[utoipa::path(
    get, path = "/admin/users/{id}", tag = "admin",
    params(("id" = Uuid, Path, description = "User id")),
    responses((status = 200, description = "User"), (status = 404, description = "Not Found"))
)]
pub async fn get_user(
    State(state): State<ServerState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<UserView>, JsonApiError> {
    Ok(Json(user_service::get_user(&state.db, current.0.oid, id).await?))
}

#[utoipa::path(
    put, path = "/admin/users/{id}", tag = "admin",
    params(("id" = Uuid, Path, description = "User id")),
    request_body = crate::openapi::UpdateUserDoc,
    responses((status = 200, description = "Updated"))
)]
pub async fn update_user(
    State(state): State<ServerState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateUserInput>,
) -> Result<Json<UserView>, JsonApiError> {
    Ok(Json(user_service::update_user(&state.db, &current.actor(), id, input).await?))
}

#[utoipa::path(
    delete, path = "/admin/users/{id}", tag = "admin",
    params(("id" = Uuid, Path, description = "User id")),
    responses((status = 204, description = "Deleted"), (status = 409, description = "User owns claims"))
)]
pub async fn delete_user(
    State(state): State<ServerState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, JsonApiError> {
    user_service::delete_user(&state.db, &current.actor(), id).await?;
    info!(user_id = %id, by = %current.0.uid, "admin deleted user");
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get, path = "/admin/expenses", tag = "admin",
    params(
        ("user_id" = Option<Uuid>, Query, description = "Claim owner"),
        ("category_id" = Option<Uuid>, Query, description = "Expense category"),
        ("from" = Option<String>, Query, description = "Earliest expense date"),
        ("to" = Option<String>, Query, description = "Latest expense date"),
        ("page" = Option<u32>, Query, description = "1-based page"),
        ("per_page" = Option<u32>, Query, description = "Items per page")
    ),
    responses((status = 200, description = "Expense history"))
)]
pub async fn list_expenses(
    State(state): State<ServerState>,
    Extension(current): Extension<CurrentUser>,
    Query(filter): Query<ExpenseFilter>,
) -> Result<Json<Page<expense::Model>>, JsonApiError> {
    Ok(Json(claims::list_all_expenses(&state.db, current.0.oid, filter).await?))
}
