use anyhow::Result;
use serde::Deserialize;
use anyhow::anyhow;
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub xero: XeroConfig,
    #[serde(default)]
    pub microsoft: MicrosoftConfig,
    #[serde(default)]
    pub http: HttpClientConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
    /// Side listener for `/healthz` and `/metrics`, e.g. `127.0.0.1:9091`
    #[serde(default)]
    pub metrics_addr: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".into(), port: 8080, worker_threads: Some(4), metrics_addr: None }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
    #[serde(default = "default_max_lifetime")]
    pub max_lifetime_secs: u64,
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
    #[serde(default)]
    pub sqlx_logging: bool,
}

fn default_max_connections() -> u32 { 10 }
fn default_min_connections() -> u32 { 2 }
fn default_connect_timeout() -> u64 { 30 }
fn default_idle_timeout() -> u64 { 600 }
fn default_max_lifetime() -> u64 { 3600 }
fn default_acquire_timeout() -> u64 { 30 }

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub jwt_secret: String,
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: i64,
    /// 首个管理员账号；所在组织没有管理员时在启动阶段创建
    #[serde(default)]
    pub bootstrap_admin: Option<BootstrapAdminConfig>,
}

fn default_token_ttl_hours() -> i64 { 12 }

impl Default for AuthConfig {
    fn default() -> Self {
        Self { jwt_secret: String::new(), token_ttl_hours: default_token_ttl_hours(), bootstrap_admin: None }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BootstrapAdminConfig {
    pub organization_id: Uuid,
    pub email: String,
    #[serde(default = "default_admin_name")]
    pub full_name: String,
    pub password: String,
}

fn default_admin_name() -> String { "Administrator".to_string() }

impl BootstrapAdminConfig {
    /// Read `BOOTSTRAP_ADMIN_ORG`, `BOOTSTRAP_ADMIN_EMAIL` and `BOOTSTRAP_ADMIN_PASSWORD`
    /// (plus optional `BOOTSTRAP_ADMIN_NAME`); `None` unless all three are set.
    pub fn from_env() -> Result<Option<Self>> {
        let (Ok(org), Ok(email), Ok(password)) = (
            std::env::var("BOOTSTRAP_ADMIN_ORG"),
            std::env::var("BOOTSTRAP_ADMIN_EMAIL"),
            std::env::var("BOOTSTRAP_ADMIN_PASSWORD"),
        ) else {
            return Ok(None);
        };
        let organization_id = Uuid::parse_str(org.trim()).map_err(|e| anyhow!("BOOTSTRAP_ADMIN_ORG is not a uuid: {e}"))?;
        let full_name = std::env::var("BOOTSTRAP_ADMIN_NAME").unwrap_or_else(|_| default_admin_name());
        Ok(Some(Self { organization_id, email, full_name, password }))
    }

    pub fn validate(&self) -> Result<()> {
        if !self.email.contains('@') {
            return Err(anyhow!("auth.bootstrap_admin.email is not an email address"));
        }
        if self.password.chars().count() < 8 {
            return Err(anyhow!("auth.bootstrap_admin.password must be at least 8 characters"));
        }
        if self.full_name.trim().is_empty() {
            return Err(anyhow!("auth.bootstrap_admin.full_name is empty"));
        }
        Ok(())
    }
}

/// Xero accounting endpoints and bill defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct XeroConfig {
    #[serde(default = "default_xero_identity_url")]
    pub identity_url: String,
    #[serde(default = "default_xero_api_url")]
    pub api_url: String,
    #[serde(default = "default_xero_login_url")]
    pub login_url: String,
    #[serde(default = "default_xero_scopes")]
    pub scopes: String,
    #[serde(default = "default_account_code")]
    pub default_account_code: String,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default = "default_oauth_state_ttl")]
    pub oauth_state_ttl_secs: u64,
}

fn default_xero_identity_url() -> String { "https://identity.xero.com".into() }
fn default_xero_api_url() -> String { "https://api.xero.com".into() }
fn default_xero_login_url() -> String { "https://login.xero.com".into() }
fn default_xero_scopes() -> String { "offline_access accounting.transactions accounting.contacts".into() }
fn default_account_code() -> String { "400".into() }
fn default_currency() -> String { "GBP".into() }
fn default_oauth_state_ttl() -> u64 { 600 }

impl Default for XeroConfig {
    fn default() -> Self {
        Self {
            identity_url: default_xero_identity_url(),
            api_url: default_xero_api_url(),
            login_url: default_xero_login_url(),
            scopes: default_xero_scopes(),
            default_account_code: default_account_code(),
            currency: default_currency(),
            oauth_state_ttl_secs: default_oauth_state_ttl(),
        }
    }
}

/// Microsoft identity platform and Graph endpoints used by the directory sync.
#[derive(Debug, Clone, Deserialize)]
pub struct MicrosoftConfig {
    #[serde(default = "default_ms_login_url")]
    pub login_url: String,
    #[serde(default = "default_graph_url")]
    pub graph_url: String,
}

fn default_ms_login_url() -> String { "https://login.microsoftonline.com".into() }
fn default_graph_url() -> String { "https://graph.microsoft.com/v1.0".into() }

impl Default for MicrosoftConfig {
    fn default() -> Self {
        Self { login_url: default_ms_login_url(), graph_url: default_graph_url() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpClientConfig {
    #[serde(default = "default_http_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_http_timeout() -> u64 { 30 }
fn default_user_agent() -> String { concat!("claimdesk/", env!("CARGO_PKG_VERSION")).into() }

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self { timeout_secs: default_http_timeout(), user_agent: default_user_agent() }
    }
}

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    let cfg: AppConfig = toml::from_str(&content)?;
    Ok(cfg)
}

impl AppConfig {
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = load_default()?;
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    /// Config with every section defaulted and secrets pulled from the environment.
    /// Used when no config file is present.
    pub fn from_env() -> Result<Self> {
        let mut cfg = AppConfig::default();
        if let Ok(host) = std::env::var("SERVER_HOST") {
            cfg.server.host = host;
        }
        if let Some(port) = std::env::var("SERVER_PORT").ok().and_then(|p| p.parse::<u16>().ok()) {
            cfg.server.port = port;
        }
        cfg.database.max_connections = default_max_connections();
        cfg.database.min_connections = default_min_connections();
        cfg.database.connect_timeout_secs = default_connect_timeout();
        cfg.database.idle_timeout_secs = default_idle_timeout();
        cfg.database.max_lifetime_secs = default_max_lifetime();
        cfg.database.acquire_timeout_secs = default_acquire_timeout();
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        // 归一化 server
        self.server.normalize()?;
        // 归一化 database（支持从环境变量填充 URL）
        self.database.normalize_from_env();
        self.database.validate()?;
        self.auth.normalize_from_env()?;
        self.auth.validate()?;
        self.xero.validate()?;
        self.microsoft.validate()?;
        if self.http.timeout_secs == 0 {
            return Err(anyhow!("http.timeout_secs must be a positive number of seconds"));
        }
        Ok(())
    }
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be in 1..=65535"));
        }
        if let Some(w) = self.worker_threads {
            if w == 0 { self.worker_threads = Some(4); }
        } else {
            self.worker_threads = Some(4);
        }
        if let Some(addr) = &self.metrics_addr {
            if addr.trim().is_empty() { self.metrics_addr = None; }
        }
        Ok(())
    }
}

impl DatabaseConfig {
    pub fn normalize_from_env(&mut self) {
        // 若 TOML 中未提供 URL，则尝试从环境变量填充
        if self.url.trim().is_empty() {
            if let Ok(url) = std::env::var("DATABASE_URL") {
                self.url = url;
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(anyhow!("database.url is empty; set it in config.toml or DATABASE_URL"));
        }
        let lower = self.url.to_lowercase();
        if !(lower.starts_with("postgresql://") || lower.starts_with("postgres://")) {
            return Err(anyhow!("database.url must start with postgresql:// or postgres://"));
        }
        if self.min_connections == 0 {
            return Err(anyhow!("database.min_connections must be >= 1"));
        }
        if self.max_connections < self.min_connections {
            return Err(anyhow!("database.max_connections must be >= min_connections"));
        }
        if self.connect_timeout_secs == 0 || self.acquire_timeout_secs == 0 {
            return Err(anyhow!("database timeouts must be positive seconds"));
        }
        Ok(())
    }
}

impl AuthConfig {
    pub fn normalize_from_env(&mut self) -> Result<()> {
        if self.jwt_secret.trim().is_empty() {
            if let Ok(secret) = std::env::var("JWT_SECRET") {
                self.jwt_secret = secret;
            }
        }
        if self.bootstrap_admin.is_none() {
            self.bootstrap_admin = BootstrapAdminConfig::from_env()?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.jwt_secret.trim().is_empty() {
            return Err(anyhow!("auth.jwt_secret is empty; set it in config.toml or JWT_SECRET"));
        }
        if self.token_ttl_hours <= 0 {
            return Err(anyhow!("auth.token_ttl_hours must be positive"));
        }
        if let Some(admin) = &self.bootstrap_admin {
            admin.validate()?;
        }
        Ok(())
    }
}

fn validate_base_url(name: &str, url: &str) -> Result<()> {
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(anyhow!("{name} must start with http(s)"));
    }
    if url.ends_with('/') {
        return Err(anyhow!("{name} must not end with '/'"));
    }
    Ok(())
}

impl XeroConfig {
    pub fn validate(&self) -> Result<()> {
        validate_base_url("xero.identity_url", &self.identity_url)?;
        validate_base_url("xero.api_url", &self.api_url)?;
        validate_base_url("xero.login_url", &self.login_url)?;
        if !self.scopes.split_whitespace().any(|s| s == "offline_access") {
            return Err(anyhow!("xero.scopes must include offline_access to receive a refresh token"));
        }
        if self.default_account_code.trim().is_empty() {
            return Err(anyhow!("xero.default_account_code is empty"));
        }
        if self.currency.len() != 3 {
            return Err(anyhow!("xero.currency must be an ISO 4217 code"));
        }
        if self.oauth_state_ttl_secs == 0 {
            return Err(anyhow!("xero.oauth_state_ttl_secs must be positive"));
        }
        Ok(())
    }
}

impl MicrosoftConfig {
    pub fn validate(&self) -> Result<()> {
        validate_base_url("microsoft.login_url", &self.login_url)?;
        validate_base_url("microsoft.graph_url", &self.graph_url)
    }
}
