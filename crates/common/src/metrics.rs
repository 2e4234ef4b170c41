//! Prometheus counters for the integration paths (default registry).

use once_cell::sync::Lazy;
use prometheus::{register_int_counter, register_int_counter_vec, Encoder, IntCounter, IntCounterVec, TextEncoder};

pub static XERO_BILLS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "claimdesk_xero_bills_total",
        "Draft bills pushed to Xero, by outcome",
        &["outcome"]
    )
    .expect("register xero_bills_total")
});

pub static XERO_CONNECTIONS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "claimdesk_xero_connections_total",
        "Completed Xero OAuth connections"
    )
    .expect("register xero_connections_total")
});

pub static DIRECTORY_USERS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "claimdesk_directory_users_total",
        "Users touched by directory sync, by action",
        &["action"]
    )
    .expect("register directory_users_total")
});

pub static DIRECTORY_SYNC_RUNS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "claimdesk_directory_sync_runs_total",
        "Directory sync runs, by final status",
        &["status"]
    )
    .expect("register directory_sync_runs_total")
});

pub static EMAILS_LOGGED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "claimdesk_emails_logged_total",
        "Rendered notification emails, by template",
        &["template"]
    )
    .expect("register emails_logged_total")
});

pub fn encode_metrics() -> (axum::http::StatusCode, String) {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        return (
            axum::http::StatusCode::INTERNAL_SERVER_ERROR,
            format!("metrics encode error: {e}"),
        );
    }
    (
        axum::http::StatusCode::OK,
        String::from_utf8(buffer).unwrap_or_default(),
    )
}
