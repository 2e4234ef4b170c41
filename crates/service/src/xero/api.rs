use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::bill::Bill;
use crate::errors::ServiceError;

/// Token endpoint response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenSet {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Lifetime in seconds.
    #[serde(default = "default_expires_in")]
    pub expires_in: i64,
}

fn default_expires_in() -> i64 { 1800 }

/// One organisation the app was granted access to.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct XeroTenant {
    pub tenant_id: String,
    #[serde(default)]
    pub tenant_name: Option<String>,
    #[serde(default)]
    pub tenant_type: Option<String>,
}

#[async_trait]
pub trait XeroApi: Send + Sync {
    async fn exchange_code(&self, client_id: &str, client_secret: &str, code: &str, redirect_uri: &str) -> Result<TokenSet, ServiceError>;
    async fn refresh(&self, client_id: &str, client_secret: &str, refresh_token: &str) -> Result<TokenSet, ServiceError>;
    async fn connections(&self, access_token: &str) -> Result<Vec<XeroTenant>, ServiceError>;
    /// Returns the created invoice id.
    async fn create_bill(&self, access_token: &str, tenant_id: &str, bill: &Bill) -> Result<String, ServiceError>;
}

pub mod mock {
    use super::*;
    use std::sync::Mutex;

    /// Scripted API double; records posted bills.
    #[derive(Default)]
    pub struct MockXeroApi {
        pub fail_refresh: Mutex<Option<String>>,
        pub fail_bill: Mutex<Option<String>>,
        pub tenants: Mutex<Vec<XeroTenant>>,
        pub omit_refresh_token: Mutex<bool>,
        pub bills: Mutex<Vec<(String, Bill)>>,
        pub refresh_calls: Mutex<u32>,
    }

    impl MockXeroApi {
        pub fn with_tenant(id: &str, name: &str) -> Self {
            let api = Self::default();
            api.tenants.lock().unwrap().push(XeroTenant { tenant_id: id.into(), tenant_name: Some(name.into()), tenant_type: Some("ORGANISATION".into()) });
            api
        }

        fn tokens(&self, n: u32) -> TokenSet {
            let refresh = if *self.omit_refresh_token.lock().unwrap() { None } else { Some(format!("refresh-{n}")) };
            TokenSet { access_token: format!("access-{n}"), refresh_token: refresh, expires_in: 1800 }
        }
    }

    #[async_trait]
    impl XeroApi for MockXeroApi {
        async fn exchange_code(&self, _client_id: &str, _client_secret: &str, code: &str, _redirect_uri: &str) -> Result<TokenSet, ServiceError> {
            if code == "bad-code" {
                return Err(ServiceError::Upstream("token exchange: HTTP 400 Bad Request: invalid_grant".into()));
            }
            Ok(self.tokens(0))
        }

        async fn refresh(&self, _client_id: &str, _client_secret: &str, _refresh_token: &str) -> Result<TokenSet, ServiceError> {
            if let Some(msg) = self.fail_refresh.lock().unwrap().clone() {
                return Err(ServiceError::Upstream(msg));
            }
            let mut calls = self.refresh_calls.lock().unwrap();
            *calls += 1;
            Ok(self.tokens(*calls))
        }

        async fn connections(&self, _access_token: &str) -> Result<Vec<XeroTenant>, ServiceError> {
            Ok(self.tenants.lock().unwrap().clone())
        }

        async fn create_bill(&self, _access_token: &str, tenant_id: &str, bill: &Bill) -> Result<String, ServiceError> {
            if let Some(msg) = self.fail_bill.lock().unwrap().clone() {
                return Err(ServiceError::Upstream(msg));
            }
            let mut bills = self.bills.lock().unwrap();
            bills.push((tenant_id.to_string(), bill.clone()));
            Ok(format!("inv-{}", bills.len()))
        }
    }
}
