//! Create `email_template` table, one row per notification type.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(EmailTemplate::Table)
                    .if_not_exists()
                    .col(uuid(EmailTemplate::Id).primary_key())
                    .col(string_len(EmailTemplate::TemplateType, 32).unique_key().not_null())
                    .col(string_len(EmailTemplate::Subject, 255).not_null())
                    .col(text(EmailTemplate::Body).not_null())
                    .col(timestamp_with_time_zone(EmailTemplate::UpdatedAt).not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(EmailTemplate::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum EmailTemplate { Table, Id, TemplateType, Subject, Body, UpdatedAt }
