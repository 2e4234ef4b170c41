use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::{
    sea_query::{Expr, OnConflict},
    ColumnTrait, DatabaseConnection, EntityTrait, JoinType, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set,
};
use uuid::Uuid;

use models::{expense, expense_category, expense_claim, user, xero_settings, ClaimStatus, XeroSyncStatus};

use super::bill::BillSource;
use super::repository::XeroRepository;
use crate::errors::ServiceError;

pub struct SeaOrmXeroRepository {
    pub db: DatabaseConnection,
}

fn now() -> DateTime<FixedOffset> {
    Utc::now().into()
}

#[async_trait::async_trait]
impl XeroRepository for SeaOrmXeroRepository {
    async fn load_settings(&self) -> Result<Option<xero_settings::Model>, ServiceError> {
        Ok(xero_settings::Entity::find().order_by_asc(xero_settings::Column::CreatedAt).one(&self.db).await?)
    }

    async fn store_settings(&self, s: xero_settings::Model) -> Result<xero_settings::Model, ServiceError> {
        use xero_settings::Column as C;
        let id = s.id;
        let am = xero_settings::ActiveModel {
            id: Set(s.id),
            client_id: Set(s.client_id),
            client_secret: Set(s.client_secret),
            tenant_id: Set(s.tenant_id),
            tenant_name: Set(s.tenant_name),
            access_token: Set(s.access_token),
            refresh_token: Set(s.refresh_token),
            token_expires_at: Set(s.token_expires_at),
            is_connected: Set(s.is_connected),
            created_at: Set(s.created_at),
            updated_at: Set(now()),
        };
        xero_settings::Entity::insert(am)
            .on_conflict(
                OnConflict::column(C::Id)
                    .update_columns([
                        C::ClientId,
                        C::ClientSecret,
                        C::TenantId,
                        C::TenantName,
                        C::AccessToken,
                        C::RefreshToken,
                        C::TokenExpiresAt,
                        C::IsConnected,
                        C::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;
        xero_settings::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("xero settings"))
    }

    async fn load_claim(&self, organization_id: Uuid, claim_id: Uuid) -> Result<Option<expense_claim::Model>, ServiceError> {
        Ok(expense_claim::Entity::find_by_id(claim_id)
            .join(JoinType::InnerJoin, expense_claim::Relation::User.def())
            .filter(user::Column::OrganizationId.eq(organization_id))
            .one(&self.db)
            .await?)
    }

    async fn load_bill_lines(&self, claim_id: Uuid) -> Result<Vec<BillSource>, ServiceError> {
        let rows = expense::Entity::find()
            .filter(expense::Column::ClaimId.eq(claim_id))
            .order_by_asc(expense::Column::ExpenseDate)
            .order_by_asc(expense::Column::CreatedAt)
            .find_also_related(expense_category::Entity)
            .all(&self.db)
            .await?;
        Ok(rows
            .into_iter()
            .map(|(expense, category)| BillSource { expense, account_code: category.and_then(|c| c.xero_account_code) })
            .collect())
    }

    async fn begin_sync(&self, claim_id: Uuid) -> Result<bool, ServiceError> {
        let res = expense_claim::Entity::update_many()
            .col_expr(expense_claim::Column::XeroSyncStatus, Expr::value(XeroSyncStatus::Syncing.as_str()))
            .col_expr(expense_claim::Column::UpdatedAt, Expr::value(now()))
            .filter(expense_claim::Column::Id.eq(claim_id))
            .filter(expense_claim::Column::Status.eq(ClaimStatus::Approved.as_str()))
            .filter(
                expense_claim::Column::XeroSyncStatus
                    .is_not_in([XeroSyncStatus::Synced.as_str(), XeroSyncStatus::Syncing.as_str()]),
            )
            .exec(&self.db)
            .await?;
        Ok(res.rows_affected == 1)
    }

    async fn mark_synced(&self, claim_id: Uuid, bill_id: &str) -> Result<(), ServiceError> {
        let ts = now();
        expense_claim::Entity::update_many()
            .col_expr(expense_claim::Column::XeroSyncStatus, Expr::value(XeroSyncStatus::Synced.as_str()))
            .col_expr(expense_claim::Column::XeroBillId, Expr::value(bill_id))
            .col_expr(expense_claim::Column::XeroSyncedAt, Expr::value(ts))
            .col_expr(expense_claim::Column::XeroSyncError, Expr::value(Option::<String>::None))
            .col_expr(expense_claim::Column::UpdatedAt, Expr::value(ts))
            .filter(expense_claim::Column::Id.eq(claim_id))
            .exec(&self.db)
            .await?;
        Ok(())
    }

    async fn mark_failed(&self, claim_id: Uuid, error: &str) -> Result<(), ServiceError> {
        expense_claim::Entity::update_many()
            .col_expr(expense_claim::Column::XeroSyncStatus, Expr::value(XeroSyncStatus::Failed.as_str()))
            .col_expr(expense_claim::Column::XeroSyncError, Expr::value(error))
            .col_expr(expense_claim::Column::UpdatedAt, Expr::value(now()))
            .filter(expense_claim::Column::Id.eq(claim_id))
            .exec(&self.db)
            .await?;
        Ok(())
    }
}
