//! Create `expense_claim` table.
//!
//! A claim groups expenses for a date range and carries both the review
//! workflow status and the Xero sync status.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ExpenseClaim::Table)
                    .if_not_exists()
                    .col(uuid(ExpenseClaim::Id).primary_key())
                    .col(uuid(ExpenseClaim::UserId).not_null())
                    .col(string_len(ExpenseClaim::ClaimantName, 128).not_null())
                    .col(text(ExpenseClaim::Description).not_null().default(""))
                    .col(date(ExpenseClaim::StartDate).not_null())
                    .col(date(ExpenseClaim::EndDate).not_null())
                    .col(boolean(ExpenseClaim::IsChargeable).not_null().default(false))
                    .col(ColumnDef::new(ExpenseClaim::ClientId).uuid().null())
                    .col(string_len(ExpenseClaim::Status, 16).not_null())
                    .col(ColumnDef::new(ExpenseClaim::SubmittedAt).timestamp_with_time_zone().null())
                    .col(ColumnDef::new(ExpenseClaim::ReviewedBy).uuid().null())
                    .col(ColumnDef::new(ExpenseClaim::ReviewedAt).timestamp_with_time_zone().null())
                    .col(text(ExpenseClaim::ReviewNotes).not_null().default(""))
                    .col(string_len(ExpenseClaim::XeroSyncStatus, 16).not_null())
                    .col(ColumnDef::new(ExpenseClaim::XeroBillId).string_len(64).null())
                    .col(ColumnDef::new(ExpenseClaim::XeroSyncedAt).timestamp_with_time_zone().null())
                    .col(ColumnDef::new(ExpenseClaim::XeroSyncError).text().null())
                    .col(timestamp_with_time_zone(ExpenseClaim::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(ExpenseClaim::UpdatedAt).not_null())
                    // Users with claims cannot be removed
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_expense_claim_user")
                            .from(ExpenseClaim::Table, ExpenseClaim::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_expense_claim_client")
                            .from(ExpenseClaim::Table, ExpenseClaim::ClientId)
                            .to(Client::Table, Client::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_expense_claim_reviewer")
                            .from(ExpenseClaim::Table, ExpenseClaim::ReviewedBy)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(ExpenseClaim::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum ExpenseClaim {
    Table,
    Id,
    UserId,
    ClaimantName,
    Description,
    StartDate,
    EndDate,
    IsChargeable,
    ClientId,
    Status,
    SubmittedAt,
    ReviewedBy,
    ReviewedAt,
    ReviewNotes,
    XeroSyncStatus,
    XeroBillId,
    XeroSyncedAt,
    XeroSyncError,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum User { Table, Id }

#[derive(DeriveIden)]
enum Client { Table, Id }
