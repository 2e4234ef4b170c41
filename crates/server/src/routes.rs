use axum::{
    middleware,
    routing::{get, post, put},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use common::types::Health;

use crate::openapi::ApiDoc;

pub mod admin;
pub mod auth;
pub mod catalog;
pub mod claims;
pub mod directory;
pub mod notifications;
pub mod xero;

use auth::ServerState;

#[utoipa::path(get, path = "/health", tag = "health", responses((status = 200, description = "OK", body = crate::openapi::HealthResponse)))]
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

fn admin_routes() -> Router<ServerState> {
    Router::new()
        .route("/admin/categories", post(catalog::create_category))
        .route("/admin/categories/:id", put(catalog::update_category))
        .route("/admin/categories/:id/active", put(catalog::set_category_active))
        .route("/admin/clients", post(catalog::create_client))
        .route("/admin/clients/:id", put(catalog::set_client_active))
        .route("/admin/mileage-rates", post(catalog::create_rate))
        .route("/admin/mileage-rates/:id", put(catalog::update_rate))
        .route("/admin/settings/disclaimer", put(catalog::set_disclaimer))
        .route("/admin/users", get(admin::list_users).post(admin::create_user))
        .route("/admin/users/:id", get(admin::get_user).put(admin::update_user).delete(admin::delete_user))
        .route("/admin/expenses", get(admin::list_expenses))
        .route("/admin/xero/settings", get(xero::get_settings).put(xero::save_settings))
        .route("/admin/xero/authorize-url", post(xero::authorize_url))
        .route("/admin/xero/callback", post(xero::callback))
        .route("/admin/xero/test", post(xero::test_connection))
        .route("/admin/xero/queue", get(xero::queue))
        .route("/admin/xero/sync", post(xero::sync))
        .route("/admin/directory/config", get(directory::get_config).put(directory::save_config))
        .route("/admin/directory/config/enabled", put(directory::set_enabled))
        .route("/admin/directory/mappings", get(directory::list_mappings).post(directory::create_mapping))
        .route("/admin/directory/mappings/:id", axum::routing::delete(directory::delete_mapping))
        .route("/admin/directory/sync", post(directory::sync))
        .route("/admin/directory/logs", get(directory::list_logs))
        .route("/admin/email-templates", get(notifications::list_templates))
        .route("/admin/email-templates/:kind", put(notifications::update_template))
        .route("/admin/email-logs", get(notifications::list_logs))
        .route_layer(middleware::from_fn(auth::require_admin))
}

fn reviewer_routes() -> Router<ServerState> {
    Router::new()
        .route("/approvals", get(claims::approval_queue))
        .route("/approvals/:id/review", post(claims::review))
        .route("/notifications/send", post(notifications::send))
        .route_layer(middleware::from_fn(auth::require_reviewer))
}

fn user_routes() -> Router<ServerState> {
    Router::new()
        .route("/auth/me", get(auth::me))
        .route("/claims", get(claims::list).post(claims::create))
        .route("/claims/:id", get(claims::get).put(claims::update).delete(claims::delete))
        .route("/claims/:id/submit", post(claims::submit))
        .route("/claims/:id/reopen", post(claims::reopen))
        .route("/claims/:id/expenses", post(claims::add_expense))
        .route("/expenses/:id", put(claims::update_expense).delete(claims::delete_expense))
        .route("/categories", get(catalog::list_categories))
        .route("/clients", get(catalog::list_clients))
        .route("/mileage-rates", get(catalog::list_rates))
        .route("/settings/disclaimer", get(catalog::get_disclaimer))
}

/// Build the full application router: public, authenticated, reviewer and admin routes
pub fn build_router(state: ServerState, cors: CorsLayer) -> Router {
    let public = Router::new()
        .route("/health", get(health))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout));

    public
        .merge(user_routes())
        .merge(reviewer_routes())
        .merge(admin_routes())
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(middleware::from_fn_with_state(state.clone(), auth::require_bearer_token_state))
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                // 每次请求创建 span，包含方法和路径等，日志级别为 INFO
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                // 请求到达时打点
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                // 响应返回时打点，包含状态码与耗时
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                // 失败（5xx 等）时以 ERROR 记录
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
