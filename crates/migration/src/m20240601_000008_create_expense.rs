//! Create `expense` table; rows are deleted with their claim.
//! Amounts are integer pence.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Expense::Table)
                    .if_not_exists()
                    .col(uuid(Expense::Id).primary_key())
                    .col(uuid(Expense::ClaimId).not_null())
                    .col(uuid(Expense::UserId).not_null())
                    .col(ColumnDef::new(Expense::CategoryId).uuid().null())
                    .col(string_len(Expense::Title, 255).not_null())
                    .col(text(Expense::Description).not_null().default(""))
                    .col(big_integer(Expense::AmountBeforeVatPence).not_null())
                    .col(big_integer(Expense::VatPence).not_null())
                    .col(big_integer(Expense::AmountPence).not_null())
                    .col(date(Expense::ExpenseDate).not_null())
                    .col(ColumnDef::new(Expense::ReceiptUrl).text().null())
                    .col(text(Expense::Notes).not_null().default(""))
                    .col(timestamp_with_time_zone(Expense::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Expense::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_expense_claim")
                            .from(Expense::Table, Expense::ClaimId)
                            .to(ExpenseClaim::Table, ExpenseClaim::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_expense_category")
                            .from(Expense::Table, Expense::CategoryId)
                            .to(ExpenseCategory::Table, ExpenseCategory::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Expense::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Expense {
    Table,
    Id,
    ClaimId,
    UserId,
    CategoryId,
    Title,
    Description,
    AmountBeforeVatPence,
    VatPence,
    AmountPence,
    ExpenseDate,
    ReceiptUrl,
    Notes,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum ExpenseClaim { Table, Id }

#[derive(DeriveIden)]
enum ExpenseCategory { Table, Id }
