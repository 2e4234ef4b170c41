//! Microsoft 365 directory sync: tenant config, group-to-role mappings and
//! the user import run.

pub mod api;
pub mod client;
pub mod repository;
pub mod roles;
pub mod seaorm;
pub mod service;

pub use service::DirectoryService;
