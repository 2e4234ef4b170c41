//! Claim notification emails. Messages are rendered from stored templates,
//! written to the log and recorded in `email_log`; nothing is delivered.

pub mod repository;
pub mod seaorm;
pub mod service;
pub mod template;

pub use service::NotificationService;
