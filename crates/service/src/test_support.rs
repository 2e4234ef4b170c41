#![cfg(test)]
use tokio::sync::OnceCell;
use sea_orm::DatabaseConnection;
use migration::MigratorTrait;
use models::db::connect;
use uuid::Uuid;

use crate::actor::Actor;

// Ensure migrations run only once across the entire test process
static MIGRATED: OnceCell<bool> = OnceCell::const_new();

/// Fresh connection with migrations applied, or `None` when DB tests are
/// disabled or no database is reachable.
pub async fn get_db() -> Option<DatabaseConnection> {
    if std::env::var("SKIP_DB_TESTS").is_ok() {
        return None;
    }
    let migrated = *MIGRATED
        .get_or_init(|| async {
            let db = match connect().await {
                Ok(db) => db,
                Err(e) => {
                    eprintln!("skip: cannot connect to db: {}", e);
                    return false;
                }
            };
            match migration::Migrator::up(&db, None).await {
                Ok(()) => true,
                Err(e) => {
                    eprintln!("skip: migrate up failed: {}", e);
                    false
                }
            }
        })
        .await;
    if !migrated {
        return None;
    }
    // Return a fresh connection for the current test's runtime
    connect().await.ok()
}

/// A throwaway organization with one user per role.
pub struct Fixture {
    pub organization_id: Uuid,
    pub staff: Actor,
    pub approver: Actor,
    pub admin: Actor,
}

pub async fn fixture(db: &DatabaseConnection) -> anyhow::Result<Fixture> {
    use models::{organization, user, Role, VehicleType};

    let org = organization::create(db, &format!("fixture_{}", Uuid::new_v4()), None).await?;
    let make = |role: Role| {
        let mut input = user::NewUser::local(org.id, &format!("{}_{}@example.com", role, Uuid::new_v4().simple()), &format!("{} user", role));
        input.role = role;
        input.vehicle_type = VehicleType::Standard;
        input
    };
    let staff = user::create(db, make(Role::Staff)).await?;
    let approver = user::create(db, make(Role::Approver)).await?;
    let admin = user::create(db, make(Role::Admin)).await?;
    let actor = |u: &user::Model| Actor { user_id: u.id, organization_id: org.id, role: u.role() };
    Ok(Fixture { organization_id: org.id, staff: actor(&staff), approver: actor(&approver), admin: actor(&admin) })
}

/// Remove the fixture organization; claims go first because they restrict user deletion.
pub async fn cleanup(db: &DatabaseConnection, fx: &Fixture) -> anyhow::Result<()> {
    use models::{expense_claim, organization};
    use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

    let owners = [fx.staff.user_id, fx.approver.user_id, fx.admin.user_id];
    expense_claim::Entity::delete_many()
        .filter(expense_claim::Column::UserId.is_in(owners))
        .exec(db)
        .await?;
    organization::Entity::delete_by_id(fx.organization_id).exec(db).await?;
    Ok(())
}
