//! Microsoft Graph over `reqwest`.
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument};

use common::http::error_body;

use super::api::{GraphApi, GraphGroup, GraphToken, GraphUser};
use crate::errors::ServiceError;

const GRAPH_SCOPE: &str = "https://graph.microsoft.com/.default";
const USER_FIELDS: &str = "id,displayName,mail,userPrincipalName,jobTitle,department,accountEnabled";

#[derive(Deserialize)]
struct ListPage<T> {
    #[serde(default = "Vec::new")]
    value: Vec<T>,
    #[serde(rename = "@odata.nextLink", default)]
    next_link: Option<String>,
}

#[derive(Clone)]
pub struct ReqwestGraphApi {
    http: reqwest::Client,
    login_url: String,
    graph_url: String,
}

impl ReqwestGraphApi {
    pub fn new(http: reqwest::Client, cfg: &configs::MicrosoftConfig) -> Self {
        Self {
            http,
            login_url: cfg.login_url.trim_end_matches('/').to_string(),
            graph_url: cfg.graph_url.trim_end_matches('/').to_string(),
        }
    }

    async fn get_page<T: serde::de::DeserializeOwned>(&self, url: &str, token: &str, context: &str) -> Result<ListPage<T>, ServiceError> {
        let resp = self.http.get(url).bearer_auth(token).header("Accept", "application/json").send().await?;
        if !resp.status().is_success() {
            return Err(ServiceError::Upstream(error_body(context, resp).await));
        }
        resp.json().await.map_err(|e| ServiceError::Upstream(format!("{context}: {e}")))
    }
}

#[async_trait]
impl GraphApi for ReqwestGraphApi {
    #[instrument(skip(self, client_secret))]
    async fn client_credentials_token(&self, tenant_id: &str, client_id: &str, client_secret: &str) -> Result<GraphToken, ServiceError> {
        let resp = self
            .http
            .post(format!("{}/{}/oauth2/v2.0/token", self.login_url, tenant_id))
            .form(&[
                ("grant_type", "client_credentials"),
                ("scope", GRAPH_SCOPE),
                ("client_id", client_id),
                ("client_secret", client_secret),
            ])
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(ServiceError::Upstream(error_body("graph token request failed", resp).await));
        }
        resp.json().await.map_err(|e| ServiceError::Upstream(format!("graph token response: {e}")))
    }

    #[instrument(skip_all)]
    async fn list_users(&self, access_token: &str) -> Result<Vec<GraphUser>, ServiceError> {
        let mut users = Vec::new();
        let mut next = Some(format!("{}/users?$select={}", self.graph_url, USER_FIELDS));
        while let Some(url) = next {
            let page: ListPage<GraphUser> = self.get_page(&url, access_token, "graph user listing failed").await?;
            debug!(count = page.value.len(), "fetched user page");
            users.extend(page.value);
            next = page.next_link;
        }
        Ok(users)
    }

    #[instrument(skip(self, access_token))]
    async fn user_groups(&self, access_token: &str, user_id: &str) -> Result<Vec<GraphGroup>, ServiceError> {
        let url = format!("{}/users/{}/memberOf?$select=id,displayName", self.graph_url, user_id);
        let page: ListPage<GraphGroup> = self.get_page(&url, access_token, "graph group lookup failed").await?;
        Ok(page.value)
    }
}
