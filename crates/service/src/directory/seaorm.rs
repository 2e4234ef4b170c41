use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::{
    sea_query::{Expr, OnConflict},
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter, QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use models::{azure_group_mapping, microsoft_tenant_config, user, user_sync_log, TenantSyncStatus, UserStatus};

use super::repository::DirectoryRepository;
use crate::errors::ServiceError;

pub struct SeaOrmDirectoryRepository {
    pub db: DatabaseConnection,
}

fn now() -> DateTime<FixedOffset> {
    Utc::now().into()
}

#[async_trait::async_trait]
impl DirectoryRepository for SeaOrmDirectoryRepository {
    async fn get_config(&self, organization_id: Uuid) -> Result<Option<microsoft_tenant_config::Model>, ServiceError> {
        Ok(microsoft_tenant_config::Entity::find()
            .filter(microsoft_tenant_config::Column::OrganizationId.eq(organization_id))
            .one(&self.db)
            .await?)
    }

    async fn save_config(&self, c: microsoft_tenant_config::Model) -> Result<microsoft_tenant_config::Model, ServiceError> {
        use microsoft_tenant_config::Column as C;
        let id = c.id;
        let am = microsoft_tenant_config::ActiveModel {
            id: Set(c.id),
            organization_id: Set(c.organization_id),
            tenant_id: Set(c.tenant_id),
            client_id: Set(c.client_id),
            client_secret: Set(c.client_secret),
            access_token: Set(c.access_token),
            token_expires_at: Set(c.token_expires_at),
            last_sync_at: Set(c.last_sync_at),
            sync_status: Set(c.sync_status),
            is_enabled: Set(c.is_enabled),
            created_at: Set(c.created_at),
            updated_at: Set(now()),
        };
        microsoft_tenant_config::Entity::insert(am)
            .on_conflict(
                OnConflict::column(C::Id)
                    .update_columns([
                        C::TenantId,
                        C::ClientId,
                        C::ClientSecret,
                        C::AccessToken,
                        C::TokenExpiresAt,
                        C::SyncStatus,
                        C::IsEnabled,
                        C::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;
        microsoft_tenant_config::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("directory config"))
    }

    async fn store_token(&self, config_id: Uuid, access_token: &str, expires_at: DateTime<FixedOffset>) -> Result<(), ServiceError> {
        microsoft_tenant_config::Entity::update_many()
            .col_expr(microsoft_tenant_config::Column::AccessToken, Expr::value(access_token))
            .col_expr(microsoft_tenant_config::Column::TokenExpiresAt, Expr::value(expires_at))
            .col_expr(microsoft_tenant_config::Column::UpdatedAt, Expr::value(now()))
            .filter(microsoft_tenant_config::Column::Id.eq(config_id))
            .exec(&self.db)
            .await?;
        Ok(())
    }

    async fn finish_config_sync(&self, config_id: Uuid, status: TenantSyncStatus, at: DateTime<FixedOffset>) -> Result<(), ServiceError> {
        microsoft_tenant_config::Entity::update_many()
            .col_expr(microsoft_tenant_config::Column::SyncStatus, Expr::value(status.as_str()))
            .col_expr(microsoft_tenant_config::Column::LastSyncAt, Expr::value(at))
            .col_expr(microsoft_tenant_config::Column::UpdatedAt, Expr::value(now()))
            .filter(microsoft_tenant_config::Column::Id.eq(config_id))
            .exec(&self.db)
            .await?;
        Ok(())
    }

    async fn list_mappings(&self, organization_id: Uuid) -> Result<Vec<azure_group_mapping::Model>, ServiceError> {
        Ok(azure_group_mapping::Entity::find()
            .filter(azure_group_mapping::Column::OrganizationId.eq(organization_id))
            .order_by_asc(azure_group_mapping::Column::CreatedAt)
            .all(&self.db)
            .await?)
    }

    async fn create_mapping(&self, m: azure_group_mapping::Model) -> Result<azure_group_mapping::Model, ServiceError> {
        Ok(m.into_active_model().reset_all().insert(&self.db).await?)
    }

    async fn delete_mapping(&self, organization_id: Uuid, id: Uuid) -> Result<bool, ServiceError> {
        let res = azure_group_mapping::Entity::delete_many()
            .filter(azure_group_mapping::Column::Id.eq(id))
            .filter(azure_group_mapping::Column::OrganizationId.eq(organization_id))
            .exec(&self.db)
            .await?;
        Ok(res.rows_affected > 0)
    }

    async fn organization_users(&self, organization_id: Uuid) -> Result<Vec<user::Model>, ServiceError> {
        Ok(user::Entity::find()
            .filter(user::Column::OrganizationId.eq(organization_id))
            .filter(user::Column::DeletedAt.is_null())
            .all(&self.db)
            .await?)
    }

    async fn create_user(&self, input: user::NewUser) -> Result<user::Model, ServiceError> {
        Ok(user::create(&self.db, input).await?)
    }

    async fn update_user(&self, u: user::Model) -> Result<(), ServiceError> {
        let mut am: user::ActiveModel = u.clone().into();
        am.email = Set(u.email);
        am.full_name = Set(u.full_name);
        am.role = Set(u.role);
        am.status = Set(u.status);
        am.microsoft_user_id = Set(u.microsoft_user_id);
        am.azure_upn = Set(u.azure_upn);
        am.sync_source = Set(u.sync_source);
        am.department = Set(u.department);
        am.job_title = Set(u.job_title);
        am.last_synced_at = Set(u.last_synced_at);
        am.updated_at = Set(now());
        am.update(&self.db).await?;
        Ok(())
    }

    async fn set_user_status(&self, user_id: Uuid, status: UserStatus) -> Result<(), ServiceError> {
        user::Entity::update_many()
            .col_expr(user::Column::Status, Expr::value(status.as_str()))
            .col_expr(user::Column::UpdatedAt, Expr::value(now()))
            .filter(user::Column::Id.eq(user_id))
            .exec(&self.db)
            .await?;
        Ok(())
    }

    async fn insert_log(&self, log: user_sync_log::Model) -> Result<user_sync_log::Model, ServiceError> {
        Ok(log.into_active_model().reset_all().insert(&self.db).await?)
    }

    async fn update_log(&self, log: user_sync_log::Model) -> Result<(), ServiceError> {
        log.into_active_model().reset_all().update(&self.db).await?;
        Ok(())
    }

    async fn list_logs(&self, organization_id: Uuid, limit: u64) -> Result<Vec<user_sync_log::Model>, ServiceError> {
        Ok(user_sync_log::Entity::find()
            .filter(user_sync_log::Column::OrganizationId.eq(organization_id))
            .order_by_desc(user_sync_log::Column::StartedAt)
            .limit(limit)
            .all(&self.db)
            .await?)
    }
}
