use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, Method, StatusCode},
    middleware::Next,
    response::Response,
    Extension, Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use sea_orm::DatabaseConnection;
use serde::Serialize;

use models::Role;
use service::auth::{
    domain::{AuthClaims, AuthUser, LoginInput, RegisterInput},
    repository::AuthRepository,
    service::AuthService,
};
use service::directory::DirectoryService;
use service::notify::NotificationService;
use service::xero::XeroService;
use service::Actor;

use crate::errors::JsonApiError;

pub const AUTH_COOKIE: &str = "auth_token";

#[derive(Clone)]
pub struct ServerState {
    pub db: DatabaseConnection,
    pub auth: Arc<AuthService<dyn AuthRepository>>,
    pub xero: XeroService,
    pub directory: DirectoryService,
    pub notifications: NotificationService,
}

/// Verified token claims of the caller, placed in request extensions.
#[derive(Clone, Debug)]
pub struct CurrentUser(pub AuthClaims);

impl CurrentUser {
    pub fn actor(&self) -> Actor {
        Actor { user_id: self.0.uid, organization_id: self.0.oid, role: self.0.role }
    }
}

#[derive(Serialize)]
pub struct LoginOutput {
    pub user: AuthUser,
    pub token: String,
    pub expires_at: i64,
}

#[utoipa::path(post, path = "/auth/register", tag = "auth", request_body = crate::openapi::RegisterRequest, responses((status = 200, description = "Registered"), (status = 400, description = "Bad Request"), (status = 409, description = "Conflict")))]
pub async fn register(State(state): State<ServerState>, Json(input): Json<RegisterInput>) -> Result<Json<AuthUser>, JsonApiError> {
    let user = state.auth.register(input).await?;
    Ok(Json(user))
}

#[utoipa::path(post, path = "/auth/login", tag = "auth", request_body = crate::openapi::LoginRequest, responses((status = 200, description = "Logged In"), (status = 401, description = "Unauthorized")))]
pub async fn login(State(state): State<ServerState>, jar: CookieJar, Json(input): Json<LoginInput>) -> Result<(CookieJar, Json<LoginOutput>), JsonApiError> {
    let session = state.auth.login(input).await?;
    let mut cookie = Cookie::new(AUTH_COOKIE, session.token.clone());
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_secure(false);
    cookie.set_same_site(SameSite::Lax);
    let jar = jar.add(cookie);
    let out = LoginOutput { user: session.user, token: session.token, expires_at: session.expires_at };
    Ok((jar, Json(out)))
}

#[utoipa::path(post, path = "/auth/logout", tag = "auth", responses((status = 204, description = "Logged Out")))]
pub async fn logout(jar: CookieJar) -> (CookieJar, StatusCode) {
    let mut cookie = Cookie::from(AUTH_COOKIE);
    cookie.set_path("/");
    (jar.remove(cookie), StatusCode::NO_CONTENT)
}

#[utoipa::path(get, path = "/auth/me", tag = "auth", responses((status = 200, description = "Current user"), (status = 401, description = "Unauthorized")))]
pub async fn me(State(state): State<ServerState>, Extension(current): Extension<CurrentUser>) -> Result<Json<AuthUser>, JsonApiError> {
    let user = state.auth.current_user(&current.0).await?;
    Ok(Json(user))
}

fn is_public(path: &str, method: &Method) -> bool {
    path == "/health"
        || path == "/auth/login"
        || path == "/auth/register"
        || path == "/auth/logout"
        || path.starts_with("/docs")
        || path.starts_with("/api-docs")
        || method == Method::OPTIONS
}

/// 全局中间件：除白名单外，校验 Authorization: Bearer <token> 或 auth_token Cookie
/// 缺失 token 返回 400，非法或过期返回 401；校验通过后注入 CurrentUser
pub async fn require_bearer_token_state(
    State(state): State<ServerState>,
    mut req: Request,
    next: Next,
) -> Result<Response, JsonApiError> {
    let path = req.uri().path().to_string();
    if is_public(&path, req.method()) {
        return Ok(next.run(req).await);
    }

    // 读取 Authorization 头；如缺失则回退从 Cookie 中解析 auth_token
    let authz = req.headers().get(header::AUTHORIZATION).and_then(|v| v.to_str().ok());
    let token = match authz {
        Some(h) => match h.strip_prefix("Bearer ") {
            Some(t) => t.trim().to_string(),
            None => {
                tracing::warn!(path = %path, "invalid Authorization format (expect Bearer)");
                return Err(JsonApiError::unauthorized("expected a Bearer token"));
            }
        },
        None => {
            let jar = CookieJar::from_headers(req.headers());
            match jar.get(AUTH_COOKIE).map(|c| c.value().to_string()) {
                Some(t) if !t.is_empty() => t,
                _ => {
                    tracing::warn!(path = %path, "missing Authorization header and auth_token cookie");
                    return Err(JsonApiError::bad_request("missing bearer token"));
                }
            }
        }
    };

    match state.auth.verify_token(&token) {
        Ok(claims) => {
            req.extensions_mut().insert(CurrentUser(claims));
            Ok(next.run(req).await)
        }
        Err(e) => {
            tracing::warn!(path = %path, err = %e, "token validation failed");
            Err(JsonApiError::unauthorized("invalid or expired token"))
        }
    }
}

fn current_role(req: &Request) -> Option<Role> {
    req.extensions().get::<CurrentUser>().map(|c| c.0.role)
}

/// Route guard for admin-only routes.
pub async fn require_admin(req: Request, next: Next) -> Result<Response, JsonApiError> {
    match current_role(&req) {
        Some(Role::Admin) => Ok(next.run(req).await),
        _ => Err(JsonApiError::forbidden("admin role required")),
    }
}

/// Route guard for approver or admin routes.
pub async fn require_reviewer(req: Request, next: Next) -> Result<Response, JsonApiError> {
    match current_role(&req) {
        Some(role) if role.can_review() => Ok(next.run(req).await),
        _ => Err(JsonApiError::forbidden("approver or admin role required")),
    }
}
