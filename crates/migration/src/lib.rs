//! Migrator registering entity-specific migrations in dependency order.
//! Seed data follows the tables; indexes are applied last.
pub use sea_orm_migration::prelude::*;

mod m20240601_000001_create_organization;
mod m20240601_000002_create_user;
mod m20240601_000003_create_user_credentials;
mod m20240601_000004_create_client;
mod m20240601_000005_create_expense_category;
mod m20240601_000006_create_mileage_rate;
mod m20240601_000007_create_expense_claim;
mod m20240601_000008_create_expense;
mod m20240601_000009_create_mileage_expense;
mod m20240601_000010_create_xero_settings;
mod m20240601_000011_create_microsoft_tenant_config;
mod m20240601_000012_create_azure_group_mapping;
mod m20240601_000013_create_user_sync_log;
mod m20240601_000014_create_email_template;
mod m20240601_000015_create_email_log;
mod m20240601_000016_create_app_setting;
mod m20240601_000017_seed_defaults;
mod m20240601_000090_add_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240601_000001_create_organization::Migration),
            Box::new(m20240601_000002_create_user::Migration),
            Box::new(m20240601_000003_create_user_credentials::Migration),
            Box::new(m20240601_000004_create_client::Migration),
            Box::new(m20240601_000005_create_expense_category::Migration),
            Box::new(m20240601_000006_create_mileage_rate::Migration),
            Box::new(m20240601_000007_create_expense_claim::Migration),
            Box::new(m20240601_000008_create_expense::Migration),
            Box::new(m20240601_000009_create_mileage_expense::Migration),
            Box::new(m20240601_000010_create_xero_settings::Migration),
            Box::new(m20240601_000011_create_microsoft_tenant_config::Migration),
            Box::new(m20240601_000012_create_azure_group_mapping::Migration),
            Box::new(m20240601_000013_create_user_sync_log::Migration),
            Box::new(m20240601_000014_create_email_template::Migration),
            Box::new(m20240601_000015_create_email_log::Migration),
            Box::new(m20240601_000016_create_app_setting::Migration),
            Box::new(m20240601_000017_seed_defaults::Migration),
            // Indexes should always be applied last
            Box::new(m20240601_000090_add_indexes::Migration),
        ]
    }
}
