use std::time::Duration;

use crate::CoreError;

/// Shared outbound client for the accounting and directory integrations.
pub fn build_http_client(timeout_secs: u64, user_agent: &str) -> Result<reqwest::Client, CoreError> {
    reqwest::Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| CoreError::Network(e.to_string()))
}

/// Read a non-2xx response into an error message carrying status and body.
pub async fn error_body(context: &str, resp: reqwest::Response) -> String {
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    format!("{context}: HTTP {status}: {body}")
}
