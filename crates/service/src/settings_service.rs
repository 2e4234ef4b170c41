use chrono::Utc;
use sea_orm::{sea_query::OnConflict, DatabaseConnection, EntityTrait, Set};

use models::app_setting::{self, EXPENSE_POLICY_DISCLAIMER};
use crate::errors::ServiceError;

pub async fn get_setting(db: &DatabaseConnection, key: &str) -> Result<Option<app_setting::Model>, ServiceError> {
    Ok(app_setting::Entity::find_by_id(key.to_string()).one(db).await?)
}

/// Insert or overwrite a setting.
pub async fn set_setting(db: &DatabaseConnection, key: &str, value: &str) -> Result<app_setting::Model, ServiceError> {
    if key.trim().is_empty() {
        return Err(ServiceError::Validation("setting key required".into()));
    }
    let am = app_setting::ActiveModel {
        key: Set(key.to_string()),
        value: Set(value.to_string()),
        updated_at: Set(Utc::now().into()),
    };
    app_setting::Entity::insert(am)
        .on_conflict(
            OnConflict::column(app_setting::Column::Key)
                .update_columns([app_setting::Column::Value, app_setting::Column::UpdatedAt])
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;
    get_setting(db, key).await?.ok_or_else(|| ServiceError::not_found("setting"))
}

/// Policy text shown when submitting a claim; empty when unset.
pub async fn disclaimer(db: &DatabaseConnection) -> Result<String, ServiceError> {
    Ok(get_setting(db, EXPENSE_POLICY_DISCLAIMER).await?.map(|s| s.value).unwrap_or_default())
}

pub async fn set_disclaimer(db: &DatabaseConnection, text: &str) -> Result<String, ServiceError> {
    Ok(set_setting(db, EXPENSE_POLICY_DISCLAIMER, text).await?.value)
}
