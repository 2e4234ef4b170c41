//! Create `mileage_rate` table.
//! Rates are pence per mile, scoped by vehicle/charger type and an effective date window.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(MileageRate::Table)
                    .if_not_exists()
                    .col(uuid(MileageRate::Id).primary_key())
                    .col(string_len(MileageRate::VehicleType, 16).not_null())
                    .col(ColumnDef::new(MileageRate::ChargerType).string_len(16).null())
                    .col(big_integer(MileageRate::RatePencePerMile).not_null())
                    .col(date(MileageRate::EffectiveFrom).not_null())
                    .col(ColumnDef::new(MileageRate::EffectiveTo).date().null())
                    .col(timestamp_with_time_zone(MileageRate::CreatedAt).not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(MileageRate::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum MileageRate { Table, Id, VehicleType, ChargerType, RatePencePerMile, EffectiveFrom, EffectiveTo, CreatedAt }
