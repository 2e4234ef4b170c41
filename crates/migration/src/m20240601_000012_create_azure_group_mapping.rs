//! Create `azure_group_mapping` table: directory group -> application role.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AzureGroupMapping::Table)
                    .if_not_exists()
                    .col(uuid(AzureGroupMapping::Id).primary_key())
                    .col(uuid(AzureGroupMapping::OrganizationId).not_null())
                    .col(string_len(AzureGroupMapping::AzureGroupId, 64).not_null())
                    .col(string_len(AzureGroupMapping::AzureGroupName, 255).not_null())
                    .col(string_len(AzureGroupMapping::ApplicationRole, 16).not_null())
                    .col(boolean(AzureGroupMapping::IsActive).not_null().default(true))
                    .col(timestamp_with_time_zone(AzureGroupMapping::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(AzureGroupMapping::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_group_mapping_organization")
                            .from(AzureGroupMapping::Table, AzureGroupMapping::OrganizationId)
                            .to(Organization::Table, Organization::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One mapping per group within an organization
        manager
            .create_index(
                Index::create()
                    .name("uniq_group_mapping_org_group")
                    .table(AzureGroupMapping::Table)
                    .col(AzureGroupMapping::OrganizationId)
                    .col(AzureGroupMapping::AzureGroupId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(AzureGroupMapping::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum AzureGroupMapping {
    Table,
    Id,
    OrganizationId,
    AzureGroupId,
    AzureGroupName,
    ApplicationRole,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Organization { Table, Id }
