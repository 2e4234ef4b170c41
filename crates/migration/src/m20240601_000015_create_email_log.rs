//! Create `email_log` table: rendered notifications, kept after the claim is gone.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(EmailLog::Table)
                    .if_not_exists()
                    .col(uuid(EmailLog::Id).primary_key())
                    .col(string_len(EmailLog::RecipientEmail, 255).not_null())
                    .col(string_len(EmailLog::TemplateType, 32).not_null())
                    .col(text(EmailLog::Subject).not_null())
                    .col(text(EmailLog::Body).not_null())
                    .col(ColumnDef::new(EmailLog::ClaimId).uuid().null())
                    .col(string_len(EmailLog::Status, 16).not_null())
                    .col(timestamp_with_time_zone(EmailLog::CreatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_email_log_claim")
                            .from(EmailLog::Table, EmailLog::ClaimId)
                            .to(ExpenseClaim::Table, ExpenseClaim::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(EmailLog::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum EmailLog { Table, Id, RecipientEmail, TemplateType, Subject, Body, ClaimId, Status, CreatedAt }

#[derive(DeriveIden)]
enum ExpenseClaim { Table, Id }
