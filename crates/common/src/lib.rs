use thiserror::Error;

pub mod types;
pub mod utils;
pub mod pagination;
pub mod admin_http;
pub mod metrics;
pub mod http;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("network error: {0}")]
    Network(String),
    #[error("parse error: {0}")]
    Parse(String),
}
