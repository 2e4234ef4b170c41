//! Xero accounting integration: OAuth connection and draft bill sync.
//!
//! HTTP and persistence sit behind traits so the workflow can be tested
//! with in-memory doubles.

pub mod api;
pub mod bill;
pub mod client;
pub mod repository;
pub mod seaorm;
pub mod service;

pub use service::XeroService;
