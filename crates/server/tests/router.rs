use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use sea_orm::DatabaseConnection;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use chrono::{NaiveDate, Utc};
use models::{expense_claim, ClaimStatus, Role, TemplateType};
use server::routes::{self, auth::ServerState};
use service::auth::{
    repository::{mock::MockAuthRepository, AuthRepository},
    service::{AuthConfig, AuthService},
};
use service::directory::{api::mock::MockGraphApi, repository::mock::MockDirectoryRepository, DirectoryService};
use service::notify::{
    repository::{mock::MockNotificationRepository, NotificationRepository},
    NotificationService,
};
use service::xero::{api::mock::MockXeroApi, repository::mock::MockXeroRepository, XeroService};

struct TestApp {
    router: Router,
    users: Arc<MockAuthRepository>,
    graph: Arc<MockGraphApi>,
    notify: Arc<MockNotificationRepository>,
    xero_repo: Arc<MockXeroRepository>,
}

fn test_app() -> TestApp {
    let users = Arc::new(MockAuthRepository::default());
    let auth_repo: Arc<dyn AuthRepository> = users.clone();
    let graph = Arc::new(MockGraphApi::default());
    let notify = Arc::new(MockNotificationRepository::default());
    let xero_repo = Arc::new(MockXeroRepository::default());
    let state = ServerState {
        db: DatabaseConnection::Disconnected,
        auth: Arc::new(AuthService::new(auth_repo, AuthConfig::new("test-secret"))),
        xero: XeroService::new(
            xero_repo.clone(),
            Arc::new(MockXeroApi::with_tenant("tenant-1", "Demo Company")),
            configs::XeroConfig::default(),
        ),
        directory: DirectoryService::new(Arc::new(MockDirectoryRepository::default()), graph.clone()),
        notifications: NotificationService::new(notify.clone()),
    };
    let router = routes::build_router(state, tower_http::cors::CorsLayer::very_permissive());
    TestApp { router, users, graph, notify, xero_repo }
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, axum::http::HeaderMap, Value) {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let headers = resp.headers().clone();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap_or(Value::Null) };
    (status, headers, body)
}

fn json_req(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut b = Request::builder().method(method).uri(uri).header(header::CONTENT_TYPE, "application/json");
    if let Some(t) = token {
        b = b.header(header::AUTHORIZATION, format!("Bearer {t}"));
    }
    b.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut b = Request::builder().method("GET").uri(uri);
    if let Some(t) = token {
        b = b.header(header::AUTHORIZATION, format!("Bearer {t}"));
    }
    b.body(Body::empty()).unwrap()
}

/// Register and log in; returns the bearer token.
async fn sign_in(app: &TestApp, email: &str, role: Role) -> String {
    sign_in_to(app, Uuid::new_v4(), email, role).await
}

async fn sign_in_to(app: &TestApp, organization_id: Uuid, email: &str, role: Role) -> String {
    let reg = json!({
        "organization_id": organization_id,
        "email": email,
        "full_name": "Test User",
        "password": "S3curePass!"
    });
    let (status, _, _) = send(&app.router, json_req("POST", "/auth/register", None, reg)).await;
    assert_eq!(status, StatusCode::OK);
    app.users.set_user(email, role, true);

    let login = json!({ "email": email, "password": "S3curePass!" });
    let (status, _, body) = send(&app.router, json_req("POST", "/auth/login", None, login)).await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn health_is_public() {
    let app = test_app();
    let (status, _, body) = send(&app.router, get("/health", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn missing_token_is_bad_request() {
    let app = test_app();
    let (status, _, body) = send(&app.router, get("/claims", None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Bad Request");
}

#[tokio::test]
async fn invalid_tokens_are_unauthorized() {
    let app = test_app();
    let (status, _, _) = send(&app.router, get("/claims", Some("not-a-jwt"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let req = Request::builder()
        .uri("/claims")
        .header(header::AUTHORIZATION, "Basic dXNlcjpwYXNz")
        .body(Body::empty())
        .unwrap();
    let (status, _, _) = send(&app.router, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_sets_cookie_that_authenticates() {
    let app = test_app();
    let reg = json!({ "organization_id": Uuid::new_v4(), "email": "cookie@example.com", "full_name": "Cookie", "password": "S3curePass!" });
    send(&app.router, json_req("POST", "/auth/register", None, reg)).await;

    let login = json!({ "email": "cookie@example.com", "password": "S3curePass!" });
    let (status, headers, body) = send(&app.router, json_req("POST", "/auth/login", None, login)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["email"], "cookie@example.com");
    let set_cookie = headers.get(header::SET_COOKIE).unwrap().to_str().unwrap().to_string();
    assert!(set_cookie.starts_with("auth_token="));
    assert!(set_cookie.contains("HttpOnly"));

    let pair = set_cookie.split(';').next().unwrap().to_string();
    let req = Request::builder().uri("/auth/me").header(header::COOKIE, pair).body(Body::empty()).unwrap();
    let (status, _, body) = send(&app.router, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "cookie@example.com");
    assert_eq!(body["role"], "staff");
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
    let app = test_app();
    sign_in(&app, "pw@example.com", Role::Staff).await;
    let login = json!({ "email": "pw@example.com", "password": "wrong-password" });
    let (status, _, body) = send(&app.router, json_req("POST", "/auth/login", None, login)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unauthorized");
    assert_eq!(body["code"], 1004);
}

#[tokio::test]
async fn duplicate_registration_conflicts() {
    let app = test_app();
    sign_in(&app, "dup@example.com", Role::Staff).await;
    let reg = json!({ "organization_id": Uuid::new_v4(), "email": "dup@example.com", "full_name": "Again", "password": "S3curePass!" });
    let (status, _, body) = send(&app.router, json_req("POST", "/auth/register", None, reg)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], 1002);
}

#[tokio::test]
async fn logout_clears_cookie_without_token() {
    let app = test_app();
    let req = Request::builder().method("POST").uri("/auth/logout").body(Body::empty()).unwrap();
    let (status, headers, _) = send(&app.router, req).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let set_cookie = headers.get(header::SET_COOKIE).unwrap().to_str().unwrap();
    assert!(set_cookie.starts_with("auth_token="));
}

#[tokio::test]
async fn staff_cannot_reach_admin_or_review_routes() {
    let app = test_app();
    let token = sign_in(&app, "staff@example.com", Role::Staff).await;
    for uri in ["/admin/users", "/admin/xero/settings", "/approvals"] {
        let (status, _, body) = send(&app.router, get(uri, Some(&token))).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{uri}");
        assert_eq!(body["error"], "Forbidden");
    }
}

#[tokio::test]
async fn approver_cannot_reach_admin_routes() {
    let app = test_app();
    let token = sign_in(&app, "approver@example.com", Role::Approver).await;
    let (status, _, _) = send(&app.router, get("/admin/email-templates", Some(&token))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn admin_connects_xero_through_oauth_callback() {
    let app = test_app();
    let token = sign_in(&app, "admin@example.com", Role::Admin).await;

    let (status, _, body) = send(&app.router, get("/admin/xero/settings", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "unknown");

    let settings = json!({ "client_id": "client-1", "client_secret": "secret-1" });
    let (status, _, body) = send(&app.router, json_req("PUT", "/admin/xero/settings", Some(&token), settings)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "disconnected");
    assert_eq!(body["has_client_secret"], true);

    let redirect = "https://claims.example.com/xero/callback";
    let (status, _, body) = send(
        &app.router,
        json_req("POST", "/admin/xero/authorize-url", Some(&token), json!({ "redirect_uri": redirect })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let state = body["state"].as_str().unwrap().to_string();
    assert!(body["url"].as_str().unwrap().contains(&format!("state={state}")));

    let cb = json!({ "code": "auth-code", "redirect_uri": redirect, "state": state });
    let (status, _, body) = send(&app.router, json_req("POST", "/admin/xero/callback", Some(&token), cb.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "connected");
    assert_eq!(body["tenant_name"], "Demo Company");

    // state is single use
    let (status, _, _) = send(&app.router, json_req("POST", "/admin/xero/callback", Some(&token), cb)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

async fn connect_xero(app: &TestApp, token: &str) {
    let settings = json!({ "client_id": "client-1", "client_secret": "secret-1" });
    send(&app.router, json_req("PUT", "/admin/xero/settings", Some(token), settings)).await;
    let redirect = "https://claims.example.com/xero/callback";
    let (_, _, body) = send(&app.router, json_req("POST", "/admin/xero/authorize-url", Some(token), json!({ "redirect_uri": redirect }))).await;
    let cb = json!({ "code": "auth-code", "redirect_uri": redirect, "state": body["state"] });
    let (status, _, _) = send(&app.router, json_req("POST", "/admin/xero/callback", Some(token), cb)).await;
    assert_eq!(status, StatusCode::OK);
}

fn approved_claim() -> expense_claim::Model {
    let now = Utc::now().into();
    expense_claim::Model {
        id: Uuid::new_v4(),
        user_id: Uuid::new_v4(),
        claimant_name: "Sam Green".into(),
        description: "Site visit".into(),
        start_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        end_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        is_chargeable: false,
        client_id: None,
        status: "approved".into(),
        submitted_at: None,
        reviewed_by: None,
        reviewed_at: None,
        review_notes: String::new(),
        xero_sync_status: "pending".into(),
        xero_bill_id: None,
        xero_synced_at: None,
        xero_sync_error: None,
        created_at: now,
        updated_at: now,
    }
}

#[tokio::test]
async fn xero_sync_skips_claims_of_other_organizations() {
    let app = test_app();
    let org = Uuid::new_v4();
    let token = sign_in_to(&app, org, "sync-admin@example.com", Role::Admin).await;
    connect_xero(&app, &token).await;

    let foreign = approved_claim();
    app.xero_repo.add_claim(Uuid::new_v4(), foreign.clone(), vec![]);
    let (status, _, body) = send(&app.router, json_req("POST", "/admin/xero/sync", Some(&token), json!({ "claim_ids": [foreign.id] }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["success"], false);
    assert_eq!(body[0]["error"], "claim not found");
    assert_eq!(app.xero_repo.claim(foreign.id).unwrap().xero_sync_status, "pending");
}

#[tokio::test]
async fn notification_send_is_scoped_to_the_callers_organization() {
    let app = test_app();
    let org = Uuid::new_v4();
    let token = sign_in_to(&app, org, "reviewer@example.com", Role::Approver).await;
    app.notify.save_template(TemplateType::ClaimSubmitted, "Claim from {{claimant_name}}", "£{{claim_amount}}").await.unwrap();

    let colleague = app.notify.add_user(org, "ann@example.com", "Ann", Role::Staff);
    let own = app.notify.add_claim(colleague.id, ClaimStatus::Submitted, 4_250);
    let outsider = app.notify.add_user(Uuid::new_v4(), "eve@elsewhere.test", "Eve", Role::Staff);
    let foreign = app.notify.add_claim(outsider.id, ClaimStatus::Submitted, 9_900);

    let req = |claim_id: Uuid| json!({ "template_type": "claim_submitted", "claim_id": claim_id, "recipient_email": "x@example.com" });
    let (status, _, body) = send(&app.router, json_req("POST", "/notifications/send", Some(&token), req(foreign))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Not Found");
    assert!(app.notify.logs.lock().unwrap().is_empty());

    let (status, _, body) = send(&app.router, json_req("POST", "/notifications/send", Some(&token), req(own))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["body"], "£42.50");
    assert_eq!(app.notify.logs.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn admin_manages_directory_mappings_and_sync() {
    let app = test_app();
    let token = sign_in(&app, "dir-admin@example.com", Role::Admin).await;

    let (status, _, body) = send(&app.router, get("/admin/directory/config", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.is_null());

    let cfg = json!({ "tenant_id": "contoso", "client_id": "app-1", "client_secret": "s3cret" });
    let (status, _, body) = send(&app.router, json_req("PUT", "/admin/directory/config", Some(&token), cfg)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["has_client_secret"], true);

    let mapping = json!({ "azure_group_id": "g-1", "azure_group_name": "Finance", "application_role": "approver" });
    let (status, _, body) = send(&app.router, json_req("POST", "/admin/directory/mappings", Some(&token), mapping.clone())).await;
    assert_eq!(status, StatusCode::OK);
    let mapping_id = body["id"].as_str().unwrap().to_string();

    let (status, _, _) = send(&app.router, json_req("POST", "/admin/directory/mappings", Some(&token), mapping)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    app.graph.add_user("ms-1", "Ada Lovelace", "ada@example.com", true);
    app.graph.add_membership("ms-1", "g-1");
    let (status, _, body) = send(&app.router, json_req("POST", "/admin/directory/sync", Some(&token), json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["users_created"], 1);

    let (status, _, body) = send(&app.router, get("/admin/directory/logs", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let del = Request::builder()
        .method("DELETE")
        .uri(format!("/admin/directory/mappings/{mapping_id}"))
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    let (status, _, _) = send(&app.router, del).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn directory_sync_without_config_is_not_found() {
    let app = test_app();
    let token = sign_in(&app, "nocfg@example.com", Role::Admin).await;
    let (status, _, body) = send(&app.router, json_req("POST", "/admin/directory/sync", Some(&token), json!({}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Not Found");
}

#[tokio::test]
async fn email_template_type_is_validated() {
    let app = test_app();
    let token = sign_in(&app, "tpl@example.com", Role::Admin).await;
    let body = json!({ "subject": "Claim from {{claimant_name}}", "body": "Hello {{recipient_name}}" });

    let (status, _, _) = send(&app.router, json_req("PUT", "/admin/email-templates/bogus", Some(&token), body.clone())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _, saved) = send(&app.router, json_req("PUT", "/admin/email-templates/claim_submitted", Some(&token), body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(saved["template_type"], "claim_submitted");

    let (status, _, list) = send(&app.router, get("/admin/email-templates", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn openapi_document_is_public() {
    let app = test_app();
    let (status, _, body) = send(&app.router, get("/api-docs/openapi.json", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/claims"].is_object());
    assert!(body["paths"]["/admin/xero/sync"].is_object());
}
