//! Service layer: claim workflow and administration on top of `models`.
//! - Plain functions over a `DatabaseConnection` for CRUD and workflow.
//! - Integrations (auth, accounting, directory, notifications) sit behind
//!   repository and API traits with in-memory doubles for tests.

pub mod errors;
pub mod actor;
pub mod pagination;
pub mod auth;
pub mod organization_service;
pub mod user_service;
pub mod settings_service;
pub mod catalog;
pub mod mileage;
pub mod claims;
pub mod expenses;
pub mod xero;
pub mod directory;
pub mod notify;
#[cfg(test)]
pub mod test_support;

pub use actor::Actor;
pub use errors::ServiceError;
