//! Create `microsoft_tenant_config` table: one app registration per organization.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(MicrosoftTenantConfig::Table)
                    .if_not_exists()
                    .col(uuid(MicrosoftTenantConfig::Id).primary_key())
                    .col(uuid(MicrosoftTenantConfig::OrganizationId).unique_key().not_null())
                    .col(string_len(MicrosoftTenantConfig::TenantId, 64).not_null())
                    .col(string_len(MicrosoftTenantConfig::ClientId, 128).not_null())
                    .col(string_len(MicrosoftTenantConfig::ClientSecret, 255).not_null())
                    .col(ColumnDef::new(MicrosoftTenantConfig::AccessToken).text().null())
                    .col(ColumnDef::new(MicrosoftTenantConfig::TokenExpiresAt).timestamp_with_time_zone().null())
                    .col(ColumnDef::new(MicrosoftTenantConfig::LastSyncAt).timestamp_with_time_zone().null())
                    .col(string_len(MicrosoftTenantConfig::SyncStatus, 16).not_null())
                    .col(boolean(MicrosoftTenantConfig::IsEnabled).not_null().default(true))
                    .col(timestamp_with_time_zone(MicrosoftTenantConfig::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(MicrosoftTenantConfig::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ms_config_organization")
                            .from(MicrosoftTenantConfig::Table, MicrosoftTenantConfig::OrganizationId)
                            .to(Organization::Table, Organization::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(MicrosoftTenantConfig::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum MicrosoftTenantConfig {
    Table,
    Id,
    OrganizationId,
    TenantId,
    ClientId,
    ClientSecret,
    AccessToken,
    TokenExpiresAt,
    LastSyncAt,
    SyncStatus,
    IsEnabled,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Organization { Table, Id }
