//! Create `user` table with FK to `organization`.
//!
//! Holds employee profiles, both local and directory-synced; includes soft-delete timestamp.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(User::Table)
                    .if_not_exists()
                    .col(uuid(User::Id).primary_key())
                    .col(uuid(User::OrganizationId).not_null())
                    .col(string_len(User::Email, 255).unique_key().not_null())
                    .col(string_len(User::FullName, 128).not_null())
                    .col(string_len(User::Role, 16).not_null())
                    .col(string_len(User::VehicleType, 16).not_null())
                    .col(ColumnDef::new(User::ChargerType).string_len(16).null())
                    .col(string_len(User::Status, 32).not_null())
                    .col(ColumnDef::new(User::MicrosoftUserId).string_len(64).null())
                    .col(ColumnDef::new(User::AzureUpn).string_len(255).null())
                    .col(string_len(User::SyncSource, 16).not_null())
                    .col(ColumnDef::new(User::Department).string_len(128).null())
                    .col(ColumnDef::new(User::JobTitle).string_len(128).null())
                    .col(ColumnDef::new(User::LastSyncedAt).timestamp_with_time_zone().null())
                    .col(timestamp_with_time_zone(User::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(User::UpdatedAt).not_null())
                    .col(ColumnDef::new(User::DeletedAt).timestamp_with_time_zone().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_organization")
                            .from(User::Table, User::OrganizationId)
                            .to(Organization::Table, Organization::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(User::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum User {
    Table,
    Id,
    OrganizationId,
    Email,
    FullName,
    Role,
    VehicleType,
    ChargerType,
    Status,
    MicrosoftUserId,
    AzureUpn,
    SyncSource,
    Department,
    JobTitle,
    LastSyncedAt,
    CreatedAt,
    UpdatedAt,
    DeletedAt,
}

#[derive(DeriveIden)]
enum Organization { Table, Id }
