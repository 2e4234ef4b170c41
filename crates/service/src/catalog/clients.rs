use uuid::Uuid;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set};

use models::client;
use crate::errors::ServiceError;

pub async fn list(db: &DatabaseConnection, active_only: bool) -> Result<Vec<client::Model>, ServiceError> {
    let mut q = client::Entity::find().order_by_asc(client::Column::Name);
    if active_only {
        q = q.filter(client::Column::IsActive.eq(true));
    }
    Ok(q.all(db).await?)
}

pub async fn get(db: &DatabaseConnection, id: Uuid) -> Result<client::Model, ServiceError> {
    client::Entity::find_by_id(id).one(db).await?.ok_or_else(|| ServiceError::not_found("client"))
}

pub async fn create(db: &DatabaseConnection, name: &str) -> Result<client::Model, ServiceError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ServiceError::Validation("client name required".into()));
    }
    let exists = client::Entity::find().filter(client::Column::Name.eq(name)).one(db).await?;
    if exists.is_some() {
        return Err(ServiceError::Conflict(format!("client '{name}' already exists")));
    }
    let created = client::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        is_active: Set(true),
        created_at: Set(Utc::now().into()),
    }
    .insert(db)
    .await?;
    Ok(created)
}

pub async fn set_active(db: &DatabaseConnection, id: Uuid, active: bool) -> Result<client::Model, ServiceError> {
    let mut am: client::ActiveModel = get(db, id).await?.into();
    am.is_active = Set(active);
    Ok(am.update(db).await?)
}

/// A chargeable claim must name an active client.
pub async fn require_active(db: &DatabaseConnection, id: Uuid) -> Result<client::Model, ServiceError> {
    let found = get(db, id).await?;
    if !found.is_active {
        return Err(ServiceError::Validation(format!("client '{}' is inactive", found.name)));
    }
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::get_db;

    #[tokio::test]
    async fn client_lifecycle() -> Result<(), anyhow::Error> {
        let Some(db) = get_db().await else { return Ok(()) };
        let name = format!("Acme {}", Uuid::new_v4().simple());
        let c = create(&db, &name).await?;
        assert!(matches!(create(&db, &name).await, Err(ServiceError::Conflict(_))));
        assert!(require_active(&db, c.id).await.is_ok());
        set_active(&db, c.id, false).await?;
        assert!(matches!(require_active(&db, c.id).await, Err(ServiceError::Validation(_))));
        client::Entity::delete_by_id(c.id).exec(&db).await?;
        Ok(())
    }
}
