use chrono::Utc;
use sea_orm::{
    sea_query::OnConflict, ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, IntoActiveModel,
    JoinType, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set,
};
use uuid::Uuid;

use models::{email_log, email_template, expense_claim, user, Role, TemplateType, UserStatus};

use super::repository::{ClaimWithTotal, NotificationRepository};
use crate::errors::ServiceError;
use crate::pagination::{Page, Pagination};

pub struct SeaOrmNotificationRepository {
    pub db: DatabaseConnection,
}

#[async_trait::async_trait]
impl NotificationRepository for SeaOrmNotificationRepository {
    async fn find_template(&self, kind: TemplateType) -> Result<Option<email_template::Model>, ServiceError> {
        Ok(email_template::Entity::find()
            .filter(email_template::Column::TemplateType.eq(kind.as_str()))
            .one(&self.db)
            .await?)
    }

    async fn list_templates(&self) -> Result<Vec<email_template::Model>, ServiceError> {
        Ok(email_template::Entity::find()
            .order_by_asc(email_template::Column::TemplateType)
            .all(&self.db)
            .await?)
    }

    async fn save_template(&self, kind: TemplateType, subject: &str, body: &str) -> Result<email_template::Model, ServiceError> {
        let am = email_template::ActiveModel {
            id: Set(Uuid::new_v4()),
            template_type: Set(kind.as_str().to_string()),
            subject: Set(subject.to_string()),
            body: Set(body.to_string()),
            updated_at: Set(Utc::now().into()),
        };
        email_template::Entity::insert(am)
            .on_conflict(
                OnConflict::column(email_template::Column::TemplateType)
                    .update_columns([
                        email_template::Column::Subject,
                        email_template::Column::Body,
                        email_template::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;
        self.find_template(kind).await?.ok_or_else(|| ServiceError::not_found("email template"))
    }

    async fn load_claim(&self, claim_id: Uuid) -> Result<Option<ClaimWithTotal>, ServiceError> {
        let Some(claim) = expense_claim::Entity::find_by_id(claim_id).one(&self.db).await? else {
            return Ok(None);
        };
        let total_pence = crate::claims::claim_total(&self.db, claim_id).await?;
        Ok(Some(ClaimWithTotal { claim, total_pence }))
    }

    async fn find_user(&self, user_id: Uuid) -> Result<Option<user::Model>, ServiceError> {
        Ok(user::Entity::find_by_id(user_id).one(&self.db).await?)
    }

    async fn reviewers(&self, organization_id: Uuid) -> Result<Vec<user::Model>, ServiceError> {
        Ok(user::Entity::find()
            .filter(user::Column::OrganizationId.eq(organization_id))
            .filter(user::Column::Status.eq(UserStatus::Active.as_str()))
            .filter(user::Column::DeletedAt.is_null())
            .filter(
                Condition::any()
                    .add(user::Column::Role.eq(Role::Approver.as_str()))
                    .add(user::Column::Role.eq(Role::Admin.as_str())),
            )
            .order_by_asc(user::Column::FullName)
            .all(&self.db)
            .await?)
    }

    async fn insert_log(&self, log: email_log::Model) -> Result<(), ServiceError> {
        log.into_active_model().reset_all().insert(&self.db).await?;
        Ok(())
    }

    async fn list_logs(&self, organization_id: Uuid, page: Pagination) -> Result<Page<email_log::Model>, ServiceError> {
        let (idx, per) = page.normalize();
        let items = email_log::Entity::find()
            .join(JoinType::InnerJoin, email_log::Relation::Claim.def())
            .join(JoinType::InnerJoin, expense_claim::Relation::User.def())
            .filter(user::Column::OrganizationId.eq(organization_id))
            .order_by_desc(email_log::Column::CreatedAt)
            .paginate(&self.db, per)
            .fetch_page(idx)
            .await?;
        Ok(Page { page: idx as u32 + 1, per_page: per as u32, items })
    }
}
