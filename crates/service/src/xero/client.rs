//! `reqwest` implementation of [`XeroApi`].
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, instrument};

use common::http::error_body;

use super::api::{TokenSet, XeroApi, XeroTenant};
use super::bill::Bill;
use crate::errors::ServiceError;

#[derive(Clone)]
pub struct ReqwestXeroApi {
    http: reqwest::Client,
    identity_url: String,
    api_url: String,
}

impl ReqwestXeroApi {
    pub fn new(http: reqwest::Client, cfg: &configs::XeroConfig) -> Self {
        Self { http, identity_url: cfg.identity_url.clone(), api_url: cfg.api_url.clone() }
    }

    async fn token(&self, client_id: &str, client_secret: &str, form: &[(&str, &str)]) -> Result<TokenSet, ServiceError> {
        let resp = self
            .http
            .post(format!("{}/connect/token", self.identity_url))
            .basic_auth(client_id, Some(client_secret))
            .form(form)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(ServiceError::Upstream(error_body("xero token request failed", resp).await));
        }
        resp.json::<TokenSet>().await.map_err(|e| ServiceError::Upstream(format!("xero token response: {e}")))
    }
}

#[async_trait]
impl XeroApi for ReqwestXeroApi {
    #[instrument(skip_all)]
    async fn exchange_code(&self, client_id: &str, client_secret: &str, code: &str, redirect_uri: &str) -> Result<TokenSet, ServiceError> {
        self.token(client_id, client_secret, &[("grant_type", "authorization_code"), ("code", code), ("redirect_uri", redirect_uri)])
            .await
    }

    #[instrument(skip_all)]
    async fn refresh(&self, client_id: &str, client_secret: &str, refresh_token: &str) -> Result<TokenSet, ServiceError> {
        self.token(client_id, client_secret, &[("grant_type", "refresh_token"), ("refresh_token", refresh_token)]).await
    }

    #[instrument(skip_all)]
    async fn connections(&self, access_token: &str) -> Result<Vec<XeroTenant>, ServiceError> {
        let resp = self
            .http
            .get(format!("{}/connections", self.api_url))
            .bearer_auth(access_token)
            .header("Accept", "application/json")
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(ServiceError::Upstream(error_body("xero connections request failed", resp).await));
        }
        resp.json().await.map_err(|e| ServiceError::Upstream(format!("xero connections response: {e}")))
    }

    #[instrument(skip(self, access_token, bill), fields(reference = %bill.reference))]
    async fn create_bill(&self, access_token: &str, tenant_id: &str, bill: &Bill) -> Result<String, ServiceError> {
        let resp = self
            .http
            .post(format!("{}/api.xro/2.0/Invoices", self.api_url))
            .bearer_auth(access_token)
            .header("xero-tenant-id", tenant_id)
            .header("Accept", "application/json")
            .json(&json!({ "Invoices": [bill] }))
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(ServiceError::Upstream(error_body("xero bill creation failed", resp).await));
        }
        let body: Value = resp.json().await.map_err(|e| ServiceError::Upstream(format!("xero bill response: {e}")))?;
        let id = body["Invoices"][0]["InvoiceID"]
            .as_str()
            .ok_or_else(|| ServiceError::Upstream("xero bill response has no InvoiceID".into()))?;
        debug!(invoice_id = id, "bill created");
        Ok(id.to_string())
    }
}
