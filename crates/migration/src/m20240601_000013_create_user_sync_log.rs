//! Create `user_sync_log` table: one row per directory sync run.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(UserSyncLog::Table)
                    .if_not_exists()
                    .col(uuid(UserSyncLog::Id).primary_key())
                    .col(uuid(UserSyncLog::OrganizationId).not_null())
                    .col(string_len(UserSyncLog::SyncType, 16).not_null())
                    .col(string_len(UserSyncLog::Status, 16).not_null())
                    .col(integer(UserSyncLog::UsersCreated).not_null().default(0))
                    .col(integer(UserSyncLog::UsersUpdated).not_null().default(0))
                    .col(integer(UserSyncLog::UsersDeactivated).not_null().default(0))
                    .col(ColumnDef::new(UserSyncLog::Errors).json_binary().null())
                    .col(timestamp_with_time_zone(UserSyncLog::StartedAt).not_null())
                    .col(ColumnDef::new(UserSyncLog::CompletedAt).timestamp_with_time_zone().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_sync_log_organization")
                            .from(UserSyncLog::Table, UserSyncLog::OrganizationId)
                            .to(Organization::Table, Organization::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(UserSyncLog::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum UserSyncLog {
    Table,
    Id,
    OrganizationId,
    SyncType,
    Status,
    UsersCreated,
    UsersUpdated,
    UsersDeactivated,
    Errors,
    StartedAt,
    CompletedAt,
}

#[derive(DeriveIden)]
enum Organization { Table, Id }
