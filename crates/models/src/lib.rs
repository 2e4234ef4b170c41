pub mod errors;
pub mod db;
pub mod enums;
pub mod validate;

pub mod organization;
pub mod user;
pub mod user_credentials;
pub mod client;
pub mod expense_category;
pub mod mileage_rate;
pub mod expense_claim;
pub mod expense;
pub mod mileage_expense;
pub mod xero_settings;
pub mod microsoft_tenant_config;
pub mod azure_group_mapping;
pub mod user_sync_log;
pub mod email_template;
pub mod email_log;
pub mod app_setting;

pub use enums::{
    ChargerType, ClaimStatus, Role, SyncLogStatus, SyncSource, SyncType, TemplateType, TenantSyncStatus,
    UserStatus, VehicleType, XeroSyncStatus,
};

#[cfg(test)]
mod tests;
