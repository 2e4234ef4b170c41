//! Create `xero_settings` table.
//! Single row holding app credentials, the connected tenant and OAuth tokens.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(XeroSettings::Table)
                    .if_not_exists()
                    .col(uuid(XeroSettings::Id).primary_key())
                    .col(string_len(XeroSettings::ClientId, 128).not_null().default(""))
                    .col(string_len(XeroSettings::ClientSecret, 255).not_null().default(""))
                    .col(string_len(XeroSettings::TenantId, 64).not_null().default(""))
                    .col(ColumnDef::new(XeroSettings::TenantName).string_len(255).null())
                    .col(ColumnDef::new(XeroSettings::AccessToken).text().null())
                    .col(ColumnDef::new(XeroSettings::RefreshToken).text().null())
                    .col(ColumnDef::new(XeroSettings::TokenExpiresAt).timestamp_with_time_zone().null())
                    .col(boolean(XeroSettings::IsConnected).not_null().default(false))
                    .col(timestamp_with_time_zone(XeroSettings::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(XeroSettings::UpdatedAt).not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(XeroSettings::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum XeroSettings {
    Table,
    Id,
    ClientId,
    ClientSecret,
    TenantId,
    TenantName,
    AccessToken,
    RefreshToken,
    TokenExpiresAt,
    IsConnected,
    CreatedAt,
    UpdatedAt,
}
