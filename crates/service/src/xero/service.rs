use std::sync::Arc;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use moka::future::Cache;
use rand::{distributions::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use common::metrics::{XERO_BILLS_TOTAL, XERO_CONNECTIONS_TOTAL};
use models::{xero_settings, ClaimStatus, XeroSyncStatus};

use super::api::{TokenSet, XeroApi};
use super::bill::{build_bill, BillDefaults};
use super::repository::XeroRepository;
use crate::errors::ServiceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Connected,
    Disconnected,
    Unknown,
}

/// Settings as shown to admins: secrets reduced to presence flags.
#[derive(Debug, Clone, Serialize)]
pub struct SettingsView {
    pub client_id: String,
    pub has_client_secret: bool,
    pub tenant_id: String,
    pub tenant_name: Option<String>,
    pub has_refresh_token: bool,
    pub token_expires_at: Option<chrono::DateTime<chrono::FixedOffset>>,
    pub is_connected: bool,
    pub status: ConnectionStatus,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SaveSettingsInput {
    pub client_id: String,
    /// Empty or missing keeps the stored secret.
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub tenant_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthorizeUrl {
    pub url: String,
    pub state: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConnectionTest {
    pub success: bool,
    pub tenant_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SyncResult {
    pub claim_id: Uuid,
    pub success: bool,
    pub xero_bill_id: Option<String>,
    pub error: Option<String>,
}

impl SyncResult {
    fn failed(claim_id: Uuid, error: impl Into<String>) -> Self {
        Self { claim_id, success: false, xero_bill_id: None, error: Some(error.into()) }
    }
}

pub fn connection_status(s: Option<&xero_settings::Model>) -> ConnectionStatus {
    match s {
        Some(s) if s.is_complete() && s.is_connected => ConnectionStatus::Connected,
        Some(s) if s.any_configured() => ConnectionStatus::Disconnected,
        _ => ConnectionStatus::Unknown,
    }
}

fn view(s: Option<&xero_settings::Model>) -> SettingsView {
    let status = connection_status(s);
    match s {
        Some(s) => SettingsView {
            client_id: s.client_id.clone(),
            has_client_secret: !s.client_secret.trim().is_empty(),
            tenant_id: s.tenant_id.clone(),
            tenant_name: s.tenant_name.clone(),
            has_refresh_token: s.has_refresh_token(),
            token_expires_at: s.token_expires_at,
            is_connected: s.is_connected,
            status,
        },
        None => SettingsView {
            client_id: String::new(),
            has_client_secret: false,
            tenant_id: String::new(),
            tenant_name: None,
            has_refresh_token: false,
            token_expires_at: None,
            is_connected: false,
            status,
        },
    }
}

fn random_state() -> String {
    rand::thread_rng().sample_iter(&Alphanumeric).take(32).map(char::from).collect()
}

fn apply_tokens(s: &mut xero_settings::Model, tokens: &TokenSet) {
    s.access_token = Some(tokens.access_token.clone());
    // rotated refresh tokens replace the stored one
    if let Some(rt) = tokens.refresh_token.as_ref().filter(|t| !t.is_empty()) {
        s.refresh_token = Some(rt.clone());
    }
    s.token_expires_at = Some((Utc::now() + ChronoDuration::seconds(tokens.expires_in)).into());
}

/// OAuth connection management and bill sync for the accounting system.
#[derive(Clone)]
pub struct XeroService {
    repo: Arc<dyn XeroRepository>,
    api: Arc<dyn XeroApi>,
    cfg: configs::XeroConfig,
    states: Cache<String, ()>,
}

impl XeroService {
    pub fn new(repo: Arc<dyn XeroRepository>, api: Arc<dyn XeroApi>, cfg: configs::XeroConfig) -> Self {
        let states = Cache::builder()
            .max_capacity(1_000)
            .time_to_live(Duration::from_secs(cfg.oauth_state_ttl_secs.max(1)))
            .build();
        Self { repo, api, cfg, states }
    }

    pub async fn settings_view(&self) -> Result<SettingsView, ServiceError> {
        Ok(view(self.repo.load_settings().await?.as_ref()))
    }

    pub async fn connection_status(&self) -> Result<ConnectionStatus, ServiceError> {
        Ok(connection_status(self.repo.load_settings().await?.as_ref()))
    }

    #[instrument(skip_all, fields(client_id = %input.client_id))]
    pub async fn save_settings(&self, input: SaveSettingsInput) -> Result<SettingsView, ServiceError> {
        let client_id = input.client_id.trim().to_string();
        if client_id.is_empty() {
            return Err(ServiceError::Validation("client id is required".into()));
        }
        let now = Utc::now().into();
        let mut s = self.repo.load_settings().await?.unwrap_or_else(|| xero_settings::Model {
            id: Uuid::new_v4(),
            client_id: String::new(),
            client_secret: String::new(),
            tenant_id: String::new(),
            tenant_name: None,
            access_token: None,
            refresh_token: None,
            token_expires_at: None,
            is_connected: false,
            created_at: now,
            updated_at: now,
        });

        if !s.client_id.is_empty() && s.client_id != client_id {
            info!("client id changed; dropping existing connection");
            s.access_token = None;
            s.refresh_token = None;
            s.token_expires_at = None;
            s.tenant_id = String::new();
            s.tenant_name = None;
            s.is_connected = false;
        }
        s.client_id = client_id;
        if let Some(secret) = input.client_secret.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
            s.client_secret = secret;
        }
        if s.client_secret.is_empty() {
            return Err(ServiceError::Validation("client secret is required".into()));
        }
        if let Some(tenant) = input.tenant_id.map(|t| t.trim().to_string()).filter(|t| !t.is_empty()) {
            if tenant != s.tenant_id {
                s.tenant_name = None;
            }
            s.tenant_id = tenant;
        }
        let saved = self.repo.store_settings(s).await?;
        Ok(view(Some(&saved)))
    }

    /// Login URL for the consent screen. The returned `state` must come back
    /// to [`complete_oauth`](Self::complete_oauth) before it expires.
    #[instrument(skip(self))]
    pub async fn authorize_url(&self, redirect_uri: &str) -> Result<AuthorizeUrl, ServiceError> {
        if redirect_uri.trim().is_empty() {
            return Err(ServiceError::Validation("redirect uri is required".into()));
        }
        let settings = self.repo.load_settings().await?;
        let client_id = settings
            .map(|s| s.client_id)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| ServiceError::Validation("save a client id first".into()))?;

        let state = random_state();
        let mut url = reqwest::Url::parse(&format!("{}/identity/connect/authorize", self.cfg.login_url.trim_end_matches('/')))
            .map_err(|e| ServiceError::Validation(format!("bad login url: {e}")))?;
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &client_id)
            .append_pair("redirect_uri", redirect_uri)
            .append_pair("scope", &self.cfg.scopes)
            .append_pair("state", &state);
        self.states.insert(state.clone(), ()).await;
        Ok(AuthorizeUrl { url: url.to_string(), state })
    }

    #[instrument(skip(self, code, state))]
    pub async fn complete_oauth(&self, code: &str, redirect_uri: &str, state: &str) -> Result<SettingsView, ServiceError> {
        if self.states.remove(state).await.is_none() {
            return Err(ServiceError::Validation("unknown or expired oauth state".into()));
        }
        if code.trim().is_empty() {
            return Err(ServiceError::Validation("authorization code is required".into()));
        }
        let mut s = self
            .repo
            .load_settings()
            .await?
            .filter(|s| s.has_client_credentials())
            .ok_or_else(|| ServiceError::Validation("client id and secret must be saved first".into()))?;

        let tokens = self.api.exchange_code(&s.client_id, &s.client_secret, code, redirect_uri).await?;
        if tokens.refresh_token.as_deref().map_or(true, str::is_empty) {
            return Err(ServiceError::Upstream("no refresh token returned; the offline_access scope is required".into()));
        }
        let tenants = self.api.connections(&tokens.access_token).await?;
        let tenant = tenants
            .into_iter()
            .next()
            .ok_or_else(|| ServiceError::Upstream("no organisations were authorised for this app".into()))?;

        apply_tokens(&mut s, &tokens);
        s.tenant_id = tenant.tenant_id;
        s.tenant_name = tenant.tenant_name;
        s.is_connected = true;
        let saved = self.repo.store_settings(s).await?;
        XERO_CONNECTIONS_TOTAL.inc();
        info!(tenant = %saved.tenant_id, "xero connected");
        Ok(view(Some(&saved)))
    }

    /// Refresh the access token and persist whatever came back.
    async fn refresh(&self, mut s: xero_settings::Model) -> Result<xero_settings::Model, ServiceError> {
        let refresh_token = s.refresh_token.clone().unwrap_or_default();
        let tokens = self.api.refresh(&s.client_id, &s.client_secret, &refresh_token).await?;
        apply_tokens(&mut s, &tokens);
        self.repo.store_settings(s).await
    }

    #[instrument(skip(self))]
    pub async fn test_connection(&self) -> Result<ConnectionTest, ServiceError> {
        let s = self
            .repo
            .load_settings()
            .await?
            .filter(|s| s.has_client_credentials() && s.has_refresh_token())
            .ok_or_else(|| ServiceError::Validation("xero is not connected".into()))?;
        match self.refresh(s).await {
            Ok(s) => Ok(ConnectionTest { success: true, tenant_name: s.tenant_name }),
            Err(e) => {
                warn!(error = %e, "xero connection test failed");
                Err(e)
            }
        }
    }

    /// Push each claim of the organization as a draft bill, in the given order.
    #[instrument(skip(self, claim_ids), fields(count = claim_ids.len()))]
    pub async fn sync_claims(&self, organization_id: Uuid, claim_ids: &[Uuid]) -> Result<Vec<SyncResult>, ServiceError> {
        if claim_ids.is_empty() {
            return Err(ServiceError::Validation("no claims selected".into()));
        }
        let s = self
            .repo
            .load_settings()
            .await?
            .filter(|s| s.is_complete())
            .ok_or_else(|| ServiceError::Validation("xero is not connected".into()))?;
        let s = self.refresh(s).await?;
        let access_token = s.access_token.clone().unwrap_or_default();
        let defaults = BillDefaults { currency: self.cfg.currency.clone(), default_account_code: self.cfg.default_account_code.clone() };

        let mut results = Vec::with_capacity(claim_ids.len());
        for &id in claim_ids {
            let result = self.sync_one(organization_id, id, &access_token, &s.tenant_id, &defaults).await;
            XERO_BILLS_TOTAL.with_label_values(&[if result.success { "success" } else { "failure" }]).inc();
            results.push(result);
        }
        let ok = results.iter().filter(|r| r.success).count();
        info!(synced = ok, failed = results.len() - ok, "xero sync finished");
        Ok(results)
    }

    async fn sync_one(&self, organization_id: Uuid, id: Uuid, access_token: &str, tenant_id: &str, defaults: &BillDefaults) -> SyncResult {
        let claim = match self.repo.load_claim(organization_id, id).await {
            Ok(Some(c)) => c,
            Ok(None) => return SyncResult::failed(id, "claim not found"),
            Err(e) => return SyncResult::failed(id, e.to_string()),
        };
        if claim.status() != ClaimStatus::Approved {
            return SyncResult::failed(id, format!("claim is {}, not approved", claim.status()));
        }
        if claim.sync_status() == XeroSyncStatus::Synced {
            return SyncResult::failed(id, "claim is already synced");
        }
        match self.repo.begin_sync(id).await {
            Ok(true) => {}
            Ok(false) => return SyncResult::failed(id, "claim is already being synced"),
            Err(e) => return SyncResult::failed(id, e.to_string()),
        }

        let posted = async {
            let lines = self.repo.load_bill_lines(id).await?;
            let bill = build_bill(&claim, &lines, defaults)?;
            self.api.create_bill(access_token, tenant_id, &bill).await
        }
        .await;

        match posted {
            Ok(bill_id) => {
                if let Err(e) = self.repo.mark_synced(id, &bill_id).await {
                    warn!(claim_id = %id, error = %e, "bill created but claim update failed");
                    return SyncResult { claim_id: id, success: false, xero_bill_id: Some(bill_id), error: Some(e.to_string()) };
                }
                info!(claim_id = %id, bill_id = %bill_id, "claim synced");
                SyncResult { claim_id: id, success: true, xero_bill_id: Some(bill_id), error: None }
            }
            Err(e) => {
                let msg = e.to_string();
                warn!(claim_id = %id, error = %msg, "claim sync failed");
                if let Err(e) = self.repo.mark_failed(id, &msg).await {
                    warn!(claim_id = %id, error = %e, "could not record sync failure");
                }
                SyncResult::failed(id, msg)
            }
        }
    }
}
