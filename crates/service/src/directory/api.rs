use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::ServiceError;

/// App-only token from the client credentials grant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphToken {
    pub access_token: String,
    #[serde(default = "default_expires_in")]
    pub expires_in: i64,
}

fn default_expires_in() -> i64 { 3600 }

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GraphUser {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub mail: Option<String>,
    #[serde(default)]
    pub user_principal_name: Option<String>,
    #[serde(default)]
    pub job_title: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default = "enabled")]
    pub account_enabled: bool,
}

fn enabled() -> bool { true }

fn non_empty(v: &Option<String>) -> Option<&str> {
    v.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl GraphUser {
    /// `mail`, falling back to the principal name.
    pub fn email(&self) -> Option<String> {
        non_empty(&self.mail).or_else(|| non_empty(&self.user_principal_name)).map(str::to_lowercase)
    }

    pub fn name(&self) -> String {
        non_empty(&self.display_name)
            .map(str::to_string)
            .or_else(|| self.email())
            .unwrap_or_else(|| self.id.clone())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphGroup {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

#[async_trait]
pub trait GraphApi: Send + Sync {
    async fn client_credentials_token(&self, tenant_id: &str, client_id: &str, client_secret: &str) -> Result<GraphToken, ServiceError>;
    /// Every user in the tenant, following paging links.
    async fn list_users(&self, access_token: &str) -> Result<Vec<GraphUser>, ServiceError>;
    async fn user_groups(&self, access_token: &str, user_id: &str) -> Result<Vec<GraphGroup>, ServiceError>;
}

pub mod mock {
    use super::*;
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct MockGraphApi {
        pub users: Mutex<Vec<GraphUser>>,
        /// user id -> group ids
        pub groups: Mutex<HashMap<String, Vec<String>>>,
        pub fail_token: Mutex<Option<String>>,
        pub fail_users: Mutex<Option<String>>,
        pub fail_groups_for: Mutex<HashSet<String>>,
        pub group_calls: Mutex<u32>,
    }

    impl MockGraphApi {
        pub fn add_user(&self, id: &str, name: &str, mail: &str, enabled: bool) {
            self.users.lock().unwrap().push(GraphUser {
                id: id.into(),
                display_name: Some(name.into()),
                mail: Some(mail.into()),
                user_principal_name: Some(mail.into()),
                job_title: None,
                department: None,
                account_enabled: enabled,
            });
        }

        pub fn add_membership(&self, user_id: &str, group_id: &str) {
            self.groups.lock().unwrap().entry(user_id.into()).or_default().push(group_id.into());
        }
    }

    #[async_trait]
    impl GraphApi for MockGraphApi {
        async fn client_credentials_token(&self, _tenant_id: &str, _client_id: &str, _client_secret: &str) -> Result<GraphToken, ServiceError> {
            if let Some(msg) = self.fail_token.lock().unwrap().clone() {
                return Err(ServiceError::Upstream(msg));
            }
            Ok(GraphToken { access_token: "graph-token".into(), expires_in: 3600 })
        }

        async fn list_users(&self, _access_token: &str) -> Result<Vec<GraphUser>, ServiceError> {
            if let Some(msg) = self.fail_users.lock().unwrap().clone() {
                return Err(ServiceError::Upstream(msg));
            }
            Ok(self.users.lock().unwrap().clone())
        }

        async fn user_groups(&self, _access_token: &str, user_id: &str) -> Result<Vec<GraphGroup>, ServiceError> {
            *self.group_calls.lock().unwrap() += 1;
            if self.fail_groups_for.lock().unwrap().contains(user_id) {
                return Err(ServiceError::Upstream("memberOf failed".into()));
            }
            let ids = self.groups.lock().unwrap().get(user_id).cloned().unwrap_or_default();
            Ok(ids.into_iter().map(|id| GraphGroup { id, display_name: None }).collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_prefers_mail_then_principal_name() {
        let mut u: GraphUser = serde_json::from_value(serde_json::json!({
            "id": "u1",
            "displayName": "Kim Park",
            "mail": null,
            "userPrincipalName": "Kim.Park@contoso.onmicrosoft.com"
        }))
        .unwrap();
        assert!(u.account_enabled);
        assert_eq!(u.email().as_deref(), Some("kim.park@contoso.onmicrosoft.com"));
        u.mail = Some("kim@contoso.com".into());
        assert_eq!(u.email().as_deref(), Some("kim@contoso.com"));
        assert_eq!(u.name(), "Kim Park");

        u.display_name = Some("  ".into());
        assert_eq!(u.name(), "kim@contoso.com");
    }
}
