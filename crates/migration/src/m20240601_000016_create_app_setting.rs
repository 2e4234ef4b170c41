//! Create `app_setting` key/value table.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AppSetting::Table)
                    .if_not_exists()
                    .col(string_len(AppSetting::Key, 64).primary_key())
                    .col(text(AppSetting::Value).not_null())
                    .col(timestamp_with_time_zone(AppSetting::UpdatedAt).not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(AppSetting::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum AppSetting { Table, Key, Value, UpdatedAt }
