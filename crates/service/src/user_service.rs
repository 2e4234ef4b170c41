//! Admin user management within the caller's organization.
use uuid::Uuid;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait};
use tracing::{info, instrument};

use models::{expense_claim, user, user_credentials, ChargerType, Role, UserStatus, VehicleType};
use crate::actor::Actor;
use crate::organization_service;
use crate::auth::service::hash_password;
use crate::errors::ServiceError;
use crate::pagination::{Page, Pagination};

#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserInput {
    pub email: String,
    pub full_name: String,
    #[serde(default = "default_role")]
    pub role: Role,
    #[serde(default = "default_vehicle")]
    pub vehicle_type: VehicleType,
    #[serde(default)]
    pub charger_type: Option<ChargerType>,
    /// Without a password the user can only sign in once one is set.
    #[serde(default)]
    pub password: Option<String>,
}

fn default_role() -> Role { Role::Staff }
fn default_vehicle() -> VehicleType { VehicleType::Standard }

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUserInput {
    pub full_name: Option<String>,
    pub role: Option<Role>,
    pub vehicle_type: Option<VehicleType>,
    pub charger_type: Option<ChargerType>,
    /// `inactive` blocks sign-in while keeping the user's claims.
    pub status: Option<UserStatus>,
    /// Sets or replaces the local password.
    pub password: Option<String>,
}

/// User profile without internal bookkeeping columns.
#[derive(Debug, Clone, Serialize)]
pub struct UserView {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub email: String,
    pub full_name: String,
    pub role: String,
    pub vehicle_type: String,
    pub charger_type: Option<String>,
    pub status: String,
    pub sync_source: String,
    pub department: Option<String>,
    pub job_title: Option<String>,
}

impl From<user::Model> for UserView {
    fn from(u: user::Model) -> Self {
        Self {
            id: u.id,
            organization_id: u.organization_id,
            email: u.email,
            full_name: u.full_name,
            role: u.role,
            vehicle_type: u.vehicle_type,
            charger_type: u.charger_type,
            status: u.status,
            sync_source: u.sync_source,
            department: u.department,
            job_title: u.job_title,
        }
    }
}

async fn find_in_org(db: &DatabaseConnection, organization_id: Uuid, id: Uuid) -> Result<user::Model, ServiceError> {
    user::Entity::find_by_id(id)
        .filter(user::Column::OrganizationId.eq(organization_id))
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("user"))
}

/// Create a profile (and credentials when a password is given).
#[instrument(skip(db, actor, input), fields(admin = %actor.user_id, email = %input.email))]
pub async fn create_user(db: &DatabaseConnection, actor: &Actor, input: CreateUserInput) -> Result<UserView, ServiceError> {
    actor.require_admin()?;
    if user::find_by_email(db, &input.email).await?.is_some() {
        return Err(ServiceError::Conflict("a user with this email already exists".into()));
    }
    let password_hash = input.password.as_deref().map(hash).transpose()?;

    let mut new_user = user::NewUser::local(actor.organization_id, &input.email, &input.full_name);
    new_user.role = input.role;
    new_user.vehicle_type = input.vehicle_type;
    new_user.charger_type = input.charger_type;

    let txn = db.begin().await?;
    let created = user::create(&txn, new_user).await?;
    if let Some(hash) = password_hash {
        user_credentials::upsert_password(&txn, created.id, hash, "argon2").await?;
    }
    txn.commit().await?;
    info!(user_id = %created.id, role = %created.role, "user_created");
    Ok(created.into())
}

/// Users of the organization ordered by name.
pub async fn list_users(db: &DatabaseConnection, organization_id: Uuid, opts: Pagination) -> Result<Page<UserView>, ServiceError> {
    let (page_idx, per_page) = opts.normalize();
    // SeaORM's paginate uses 0-based page index internally via fetch_page
    let users = user::Entity::find()
        .filter(user::Column::OrganizationId.eq(organization_id))
        .order_by_asc(user::Column::FullName)
        .paginate(db, per_page)
        .fetch_page(page_idx)
        .await?;
    Ok(Page { page: page_idx as u32 + 1, per_page: per_page as u32, items: users.into_iter().map(Into::into).collect() })
}

pub async fn get_user(db: &DatabaseConnection, organization_id: Uuid, id: Uuid) -> Result<UserView, ServiceError> {
    Ok(find_in_org(db, organization_id, id).await?.into())
}

fn hash(password: &str) -> Result<String, ServiceError> {
    hash_password(password).map_err(|e| ServiceError::Validation(e.to_string()))
}

/// Update name, role, status, vehicle details and password.
#[instrument(skip(db, actor, input), fields(admin = %actor.user_id, user_id = %id))]
pub async fn update_user(db: &DatabaseConnection, actor: &Actor, id: Uuid, input: UpdateUserInput) -> Result<UserView, ServiceError> {
    actor.require_admin()?;
    let found = find_in_org(db, actor.organization_id, id).await?;
    if id == actor.user_id && input.role.is_some_and(|r| r != Role::Admin) {
        return Err(ServiceError::Conflict("admins cannot remove their own admin role".into()));
    }
    if id == actor.user_id && input.status == Some(UserStatus::Inactive) {
        return Err(ServiceError::Conflict("admins cannot deactivate themselves".into()));
    }
    let password_hash = input.password.as_deref().map(hash).transpose()?;
    let vehicle = input.vehicle_type.unwrap_or_else(|| found.vehicle_type());
    let charger = user::normalize_charger(vehicle, input.charger_type.or_else(|| found.charger_type()))?;

    let mut am: user::ActiveModel = found.into();
    if let Some(name) = input.full_name {
        user::validate_name(&name)?;
        am.full_name = Set(name.trim().to_string());
    }
    if let Some(role) = input.role {
        am.role = Set(role.as_str().to_string());
    }
    if let Some(status) = input.status {
        am.status = Set(status.as_str().to_string());
    }
    am.vehicle_type = Set(vehicle.as_str().to_string());
    am.charger_type = Set(charger.map(|c| c.as_str().to_string()));
    am.updated_at = Set(Utc::now().into());

    let txn = db.begin().await?;
    let updated = am.update(&txn).await?;
    if let Some(hash) = password_hash {
        user_credentials::upsert_password(&txn, updated.id, hash, "argon2").await?;
        info!("user_password_set");
    }
    txn.commit().await?;
    Ok(updated.into())
}

/// Give the configured organization its first admin. Returns `None` when it
/// already has an active admin. An existing account with the configured email
/// is promoted and reactivated; otherwise a local admin is created.
#[instrument(skip(db, cfg), fields(organization_id = %cfg.organization_id, email = %cfg.email))]
pub async fn ensure_bootstrap_admin(db: &DatabaseConnection, cfg: &configs::BootstrapAdminConfig) -> Result<Option<UserView>, ServiceError> {
    organization_service::ensure_exists(db, cfg.organization_id).await?;
    let admins = user::Entity::find()
        .filter(user::Column::OrganizationId.eq(cfg.organization_id))
        .filter(user::Column::Role.eq(Role::Admin.as_str()))
        .filter(user::Column::Status.eq(UserStatus::Active.as_str()))
        .count(db)
        .await?;
    if admins > 0 {
        return Ok(None);
    }
    let password_hash = hash(&cfg.password)?;
    let existing = user::find_by_email(db, &cfg.email).await?;
    if existing.as_ref().is_some_and(|u| u.organization_id != cfg.organization_id) {
        return Err(ServiceError::Conflict("bootstrap admin email belongs to another organization".into()));
    }

    let txn = db.begin().await?;
    let admin = match existing {
        Some(found) => {
            let mut am: user::ActiveModel = found.into();
            am.role = Set(Role::Admin.as_str().to_string());
            am.status = Set(UserStatus::Active.as_str().to_string());
            am.updated_at = Set(Utc::now().into());
            am.update(&txn).await?
        }
        None => {
            let mut new_user = user::NewUser::local(cfg.organization_id, &cfg.email, &cfg.full_name);
            new_user.role = Role::Admin;
            user::create(&txn, new_user).await?
        }
    };
    user_credentials::upsert_password(&txn, admin.id, password_hash, "argon2").await?;
    txn.commit().await?;
    info!(user_id = %admin.id, "bootstrap_admin_ready");
    Ok(Some(admin.into()))
}

/// Hard-delete a user; credentials cascade. Users that own claims are kept.
#[instrument(skip(db, actor), fields(admin = %actor.user_id, user_id = %id))]
pub async fn delete_user(db: &DatabaseConnection, actor: &Actor, id: Uuid) -> Result<(), ServiceError> {
    actor.require_admin()?;
    if id == actor.user_id {
        return Err(ServiceError::Conflict("admins cannot delete themselves".into()));
    }
    let found = find_in_org(db, actor.organization_id, id).await?;
    let claims = expense_claim::Entity::find()
        .filter(expense_claim::Column::UserId.eq(found.id))
        .count(db)
        .await?;
    if claims > 0 {
        return Err(ServiceError::Conflict(format!("user owns {claims} claim(s); deactivate instead")));
    }
    user::hard_delete(db, found.id).await?;
    info!("user_deleted");
    Ok(())
}
