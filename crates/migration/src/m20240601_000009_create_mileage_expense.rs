//! Create `mileage_expense` table: journey detail for a mileage expense (1:1 with `expense`).
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(MileageExpense::Table)
                    .if_not_exists()
                    .col(uuid(MileageExpense::Id).primary_key())
                    .col(uuid(MileageExpense::ExpenseId).unique_key().not_null())
                    .col(string_len(MileageExpense::StartLocation, 255).not_null())
                    .col(string_len(MileageExpense::EndLocation, 255).not_null())
                    .col(double(MileageExpense::DistanceMiles).not_null())
                    .col(string_len(MileageExpense::VehicleType, 16).not_null())
                    .col(ColumnDef::new(MileageExpense::ChargerType).string_len(16).null())
                    .col(big_integer(MileageExpense::RateAppliedPence).not_null())
                    .col(timestamp_with_time_zone(MileageExpense::CreatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_mileage_expense_expense")
                            .from(MileageExpense::Table, MileageExpense::ExpenseId)
                            .to(Expense::Table, Expense::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(MileageExpense::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum MileageExpense {
    Table,
    Id,
    ExpenseId,
    StartLocation,
    EndLocation,
    DistanceMiles,
    VehicleType,
    ChargerType,
    RateAppliedPence,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Expense { Table, Id }
