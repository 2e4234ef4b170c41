use uuid::Uuid;
use chrono::Utc;
use serde::Deserialize;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set};
use sea_orm::sea_query::{Expr, Func};
use tracing::info;

use models::expense_category;
use crate::errors::ServiceError;

#[derive(Debug, Clone, Deserialize)]
pub struct CategoryInput {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Falls back to the configured default account code when syncing bills.
    #[serde(default)]
    pub xero_account_code: Option<String>,
}

pub async fn list(db: &DatabaseConnection, active_only: bool) -> Result<Vec<expense_category::Model>, ServiceError> {
    let mut q = expense_category::Entity::find().order_by_asc(expense_category::Column::Name);
    if active_only {
        q = q.filter(expense_category::Column::IsActive.eq(true));
    }
    Ok(q.all(db).await?)
}

pub async fn get(db: &DatabaseConnection, id: Uuid) -> Result<expense_category::Model, ServiceError> {
    expense_category::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("category"))
}

/// Case-insensitive name lookup, used for uniqueness checks.
async fn find_by_name(db: &DatabaseConnection, name: &str) -> Result<Option<expense_category::Model>, ServiceError> {
    Ok(expense_category::Entity::find()
        .filter(Expr::expr(Func::lower(Expr::col(expense_category::Column::Name))).eq(name.trim().to_lowercase()))
        .one(db)
        .await?)
}

fn clean(input: &CategoryInput) -> Result<(String, Option<String>), ServiceError> {
    let name = input.name.trim();
    if name.is_empty() {
        return Err(ServiceError::Validation("category name required".into()));
    }
    let code = input.xero_account_code.as_deref().map(str::trim).filter(|c| !c.is_empty()).map(str::to_string);
    Ok((name.to_string(), code))
}

pub async fn create(db: &DatabaseConnection, input: CategoryInput) -> Result<expense_category::Model, ServiceError> {
    let (name, code) = clean(&input)?;
    if find_by_name(db, &name).await?.is_some() {
        return Err(ServiceError::Conflict(format!("category '{name}' already exists")));
    }
    let now = Utc::now().into();
    let created = expense_category::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name),
        description: Set(input.description),
        xero_account_code: Set(code),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await?;
    info!(category_id = %created.id, name = %created.name, "category_created");
    Ok(created)
}

pub async fn update(db: &DatabaseConnection, id: Uuid, input: CategoryInput) -> Result<expense_category::Model, ServiceError> {
    let (name, code) = clean(&input)?;
    let found = get(db, id).await?;
    if let Some(other) = find_by_name(db, &name).await? {
        if other.id != id {
            return Err(ServiceError::Conflict(format!("category '{name}' already exists")));
        }
    }
    // Renaming away from "Mileage" would orphan mileage pricing
    if found.is_mileage() && !expense_category::is_mileage_name(&name) {
        return Err(ServiceError::Validation("the mileage category cannot be renamed".into()));
    }
    let mut am: expense_category::ActiveModel = found.into();
    am.name = Set(name);
    am.description = Set(input.description);
    am.xero_account_code = Set(code);
    am.updated_at = Set(Utc::now().into());
    Ok(am.update(db).await?)
}

pub async fn set_active(db: &DatabaseConnection, id: Uuid, active: bool) -> Result<expense_category::Model, ServiceError> {
    let mut am: expense_category::ActiveModel = get(db, id).await?.into();
    am.is_active = Set(active);
    am.updated_at = Set(Utc::now().into());
    Ok(am.update(db).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::get_db;

    #[tokio::test]
    async fn category_crud_and_uniqueness() -> Result<(), anyhow::Error> {
        let Some(db) = get_db().await else { return Ok(()) };
        let name = format!("Travel {}", Uuid::new_v4().simple());
        let created = create(&db, CategoryInput { name: name.clone(), description: "trains".into(), xero_account_code: Some(" 420 ".into()) }).await?;
        assert_eq!(created.xero_account_code.as_deref(), Some("420"));

        let dup = create(&db, CategoryInput { name: name.to_uppercase(), description: String::new(), xero_account_code: None }).await;
        assert!(matches!(dup, Err(ServiceError::Conflict(_))));

        let off = set_active(&db, created.id, false).await?;
        assert!(!off.is_active);
        assert!(!list(&db, true).await?.iter().any(|c| c.id == created.id));
        assert!(list(&db, false).await?.iter().any(|c| c.id == created.id));

        let mileage = list(&db, false).await?.into_iter().find(|c| c.is_mileage()).expect("seeded mileage category");
        let rename = update(&db, mileage.id, CategoryInput { name: "Car".into(), description: String::new(), xero_account_code: None }).await;
        assert!(matches!(rename, Err(ServiceError::Validation(_))));

        expense_category::Entity::delete_by_id(created.id).exec(&db).await?;
        Ok(())
    }
}
