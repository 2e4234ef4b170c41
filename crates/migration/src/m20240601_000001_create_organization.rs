//! Create `organization` table.
//!
//! Users, directory configs and sync logs hang off an organization.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Organization::Table)
                    .if_not_exists()
                    .col(uuid(Organization::Id).primary_key())
                    .col(string_len(Organization::Name, 128).not_null())
                    .col(ColumnDef::new(Organization::Domain).string_len(255).null())
                    .col(boolean(Organization::IsActive).not_null().default(true))
                    .col(timestamp_with_time_zone(Organization::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Organization::UpdatedAt).not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Organization::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Organization { Table, Id, Name, Domain, IsActive, CreatedAt, UpdatedAt }
