use std::{net::SocketAddr, sync::Arc};

use axum::Router;
use common::metrics::encode_metrics;
use common::utils::logging::init_logging_from_env;
use configs::AppConfig;
use dotenvy::dotenv;
use migration::MigratorTrait;
use sea_orm::DatabaseConnection;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use service::auth::{
    repo::seaorm::SeaOrmAuthRepository,
    repository::AuthRepository,
    service::{AuthConfig, AuthService},
};
use service::directory::{client::ReqwestGraphApi, seaorm::SeaOrmDirectoryRepository, DirectoryService};
use service::notify::{seaorm::SeaOrmNotificationRepository, NotificationService};
use service::xero::{client::ReqwestXeroApi, seaorm::SeaOrmXeroRepository, XeroService};

use crate::errors::StartupError;
use crate::routes::{self, auth::ServerState};

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// Config from `config.toml` (or `CONFIG_PATH`), falling back to defaults plus env vars.
pub fn load_config() -> Result<AppConfig, StartupError> {
    match AppConfig::load_and_validate() {
        Ok(cfg) => Ok(cfg),
        Err(e) => {
            warn!(error = %e, "config file unavailable, using environment");
            AppConfig::from_env().map_err(|e| StartupError::InvalidConfig(e.to_string()))
        }
    }
}

/// Wire repositories, HTTP clients and services over one database connection.
pub fn build_state(db: DatabaseConnection, cfg: &AppConfig) -> Result<ServerState, StartupError> {
    let http = common::http::build_http_client(cfg.http.timeout_secs, &cfg.http.user_agent)
        .map_err(|e| StartupError::InvalidConfig(e.to_string()))?;

    let mut auth_cfg = AuthConfig::new(cfg.auth.jwt_secret.clone());
    auth_cfg.token_ttl_hours = cfg.auth.token_ttl_hours;
    let auth_repo: Arc<dyn AuthRepository> = Arc::new(SeaOrmAuthRepository { db: db.clone() });

    let xero = XeroService::new(
        Arc::new(SeaOrmXeroRepository { db: db.clone() }),
        Arc::new(ReqwestXeroApi::new(http.clone(), &cfg.xero)),
        cfg.xero.clone(),
    );
    let directory = DirectoryService::new(
        Arc::new(SeaOrmDirectoryRepository { db: db.clone() }),
        Arc::new(ReqwestGraphApi::new(http, &cfg.microsoft)),
    );
    let notifications = NotificationService::new(Arc::new(SeaOrmNotificationRepository { db: db.clone() }));

    Ok(ServerState {
        db,
        auth: Arc::new(AuthService::new(auth_repo, auth_cfg)),
        xero,
        directory,
        notifications,
    })
}

pub fn build_app(state: ServerState) -> Router {
    routes::build_router(state, build_cors())
}

/// Public entry: build the app and run the HTTP server
pub async fn run() -> anyhow::Result<()> {
    dotenv().ok();
    init_logging_from_env();

    let cfg = load_config()?;

    let db = models::db::connect_with_config(&cfg.database)
        .await
        .map_err(|e| StartupError::Database(e.to_string()))?;
    migration::Migrator::up(&db, None).await?;
    info!("migrations applied");

    if let Some(admin) = cfg.auth.bootstrap_admin.as_ref() {
        match service::user_service::ensure_bootstrap_admin(&db, admin).await? {
            Some(created) => info!(user_id = %created.id, email = %created.email, "bootstrap admin ready"),
            None => info!(organization_id = %admin.organization_id, "organization already has an admin"),
        }
    }

    let state = build_state(db, &cfg)?;
    let app = build_app(state);

    // 指标端口可选：配置 server.metrics_addr 后启动 /metrics 与 /healthz
    if let Some(addr) = cfg.server.metrics_addr.as_deref() {
        common::admin_http::spawn_admin_server(addr, encode_metrics);
    }

    let addr: SocketAddr = format!("{}:{}", cfg.server.host, cfg.server.port)
        .parse()
        .map_err(|e| StartupError::InvalidConfig(format!("bind address: {e}")))?;
    info!(%addr, "starting server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
