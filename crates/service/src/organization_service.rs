use uuid::Uuid;
use sea_orm::{DatabaseConnection, EntityTrait};
use tracing::info;

use models::organization;
use crate::errors::ServiceError;

/// Create an organization.
pub async fn create(db: &DatabaseConnection, name: &str, domain: Option<&str>) -> Result<organization::Model, ServiceError> {
    Ok(organization::create(db, name, domain).await?)
}

/// Get an organization by id.
pub async fn get(db: &DatabaseConnection, id: Uuid) -> Result<organization::Model, ServiceError> {
    organization::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("organization"))
}

/// Return the organization, creating a placeholder row when the id is unknown.
pub async fn ensure_exists(db: &DatabaseConnection, id: Uuid) -> Result<organization::Model, ServiceError> {
    if let Some(found) = organization::Entity::find_by_id(id).one(db).await? {
        return Ok(found);
    }
    let name = format!("Organization {}", &id.simple().to_string()[..8]);
    let created = organization::create_with_id(db, id, &name, None).await?;
    info!(organization_id = %id, "organization auto-created");
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::get_db;

    #[tokio::test]
    async fn ensure_exists_is_idempotent() -> Result<(), anyhow::Error> {
        let Some(db) = get_db().await else { return Ok(()) };
        let id = Uuid::new_v4();
        let first = ensure_exists(&db, id).await?;
        let second = ensure_exists(&db, id).await?;
        assert_eq!(first.id, second.id);
        assert!(first.name.starts_with("Organization "));
        assert_eq!(get(&db, id).await?.id, id);
        organization::Entity::delete_by_id(id).exec(&db).await?;
        assert!(matches!(get(&db, id).await, Err(ServiceError::NotFound(_))));
        Ok(())
    }
}
