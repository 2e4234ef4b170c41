//! Create `expense_category` table.
//! `xero_account_code` maps a category onto a ledger account when bills are pushed.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ExpenseCategory::Table)
                    .if_not_exists()
                    .col(uuid(ExpenseCategory::Id).primary_key())
                    .col(string_len(ExpenseCategory::Name, 64).unique_key().not_null())
                    .col(text(ExpenseCategory::Description).not_null().default(""))
                    .col(ColumnDef::new(ExpenseCategory::XeroAccountCode).string_len(16).null())
                    .col(boolean(ExpenseCategory::IsActive).not_null().default(true))
                    .col(timestamp_with_time_zone(ExpenseCategory::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(ExpenseCategory::UpdatedAt).not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(ExpenseCategory::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum ExpenseCategory { Table, Id, Name, Description, XeroAccountCode, IsActive, CreatedAt, UpdatedAt }
