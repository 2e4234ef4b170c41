use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Users: index on organization_id
        manager
            .create_index(
                Index::create()
                    .name("idx_user_organization")
                    .table(User::Table)
                    .col(User::OrganizationId)
                    .to_owned(),
            )
            .await?;

        // Users: directory id lookups during sync
        manager
            .create_index(
                Index::create()
                    .name("idx_user_microsoft_id")
                    .table(User::Table)
                    .col(User::MicrosoftUserId)
                    .to_owned(),
            )
            .await?;

        // Claims: owner listing and status queues
        manager
            .create_index(
                Index::create()
                    .name("idx_claim_user")
                    .table(ExpenseClaim::Table)
                    .col(ExpenseClaim::UserId)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_claim_status")
                    .table(ExpenseClaim::Table)
                    .col(ExpenseClaim::Status)
                    .to_owned(),
            )
            .await?;

        // Expenses: by claim
        manager
            .create_index(
                Index::create()
                    .name("idx_expense_claim")
                    .table(Expense::Table)
                    .col(Expense::ClaimId)
                    .to_owned(),
            )
            .await?;

        // Sync log: by organization
        manager
            .create_index(
                Index::create()
                    .name("idx_sync_log_organization")
                    .table(UserSyncLog::Table)
                    .col(UserSyncLog::OrganizationId)
                    .to_owned(),
            )
            .await?;

        // Email log: by claim
        manager
            .create_index(
                Index::create()
                    .name("idx_email_log_claim")
                    .table(EmailLog::Table)
                    .col(EmailLog::ClaimId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_user_organization").table(User::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_user_microsoft_id").table(User::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_claim_user").table(ExpenseClaim::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_claim_status").table(ExpenseClaim::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_expense_claim").table(Expense::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_sync_log_organization").table(UserSyncLog::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_email_log_claim").table(EmailLog::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum User { Table, OrganizationId, MicrosoftUserId }

#[derive(DeriveIden)]
enum ExpenseClaim { Table, UserId, Status }

#[derive(DeriveIden)]
enum Expense { Table, ClaimId }

#[derive(DeriveIden)]
enum UserSyncLog { Table, OrganizationId }

#[derive(DeriveIden)]
enum EmailLog { Table, ClaimId }
