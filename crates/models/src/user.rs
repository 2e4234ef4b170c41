use sea_orm::{entity::prelude::*, Set, DatabaseConnection};
use uuid::Uuid;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::enums::{ChargerType, Role, SyncSource, UserStatus, VehicleType};
use crate::errors;
use crate::organization;

pub use crate::validate::{validate_email, validate_name};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub organization_id: Uuid,
    pub email: String,
    pub full_name: String,
    pub role: String,
    pub vehicle_type: String,
    pub charger_type: Option<String>,
    pub status: String,
    pub microsoft_user_id: Option<String>,
    pub azure_upn: Option<String>,
    pub sync_source: String,
    pub department: Option<String>,
    pub job_title: Option<String>,
    pub last_synced_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
    pub deleted_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Organization,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Organization => Entity::belongs_to(organization::Entity)
                .from(Column::OrganizationId)
                .to(organization::Column::Id)
                .into(),
        }
    }
}

impl Related<organization::Entity> for Entity {
    fn to() -> RelationDef { Relation::Organization.def() }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Unknown stored values fall back to the least privileged role.
    pub fn role(&self) -> Role {
        self.role.parse().unwrap_or(Role::Staff)
    }

    pub fn vehicle_type(&self) -> VehicleType {
        self.vehicle_type.parse().unwrap_or(VehicleType::Standard)
    }

    pub fn charger_type(&self) -> Option<ChargerType> {
        self.charger_type.as_deref().and_then(|c| c.parse().ok())
    }

    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Active.as_str() && self.deleted_at.is_none()
    }
}

/// Fields for a new user row; directory fields are filled by the sync.
#[derive(Clone, Debug)]
pub struct NewUser {
    pub organization_id: Uuid,
    pub email: String,
    pub full_name: String,
    pub role: Role,
    pub vehicle_type: VehicleType,
    pub charger_type: Option<ChargerType>,
    pub sync_source: SyncSource,
    pub microsoft_user_id: Option<String>,
    pub azure_upn: Option<String>,
    pub department: Option<String>,
    pub job_title: Option<String>,
}

impl NewUser {
    pub fn local(organization_id: Uuid, email: &str, full_name: &str) -> Self {
        Self {
            organization_id,
            email: email.to_string(),
            full_name: full_name.to_string(),
            role: Role::Staff,
            vehicle_type: VehicleType::Standard,
            charger_type: None,
            sync_source: SyncSource::Local,
            microsoft_user_id: None,
            azure_upn: None,
            department: None,
            job_title: None,
        }
    }
}

/// Electric vehicles need a charger type; standard vehicles never carry one.
pub fn normalize_charger(vehicle: VehicleType, charger: Option<ChargerType>) -> Result<Option<ChargerType>, errors::ModelError> {
    match (vehicle, charger) {
        (VehicleType::Standard, _) => Ok(None),
        (VehicleType::Electric, Some(c)) => Ok(Some(c)),
        (VehicleType::Electric, None) => Err(errors::ModelError::Validation("charger_type required for electric vehicles".into())),
    }
}

pub async fn create<C: ConnectionTrait>(db: &C, input: NewUser) -> Result<Model, errors::ModelError> {
    validate_email(&input.email)?;
    validate_name(&input.full_name)?;
    let charger = normalize_charger(input.vehicle_type, input.charger_type)?;
    let now = Utc::now().into();
    let synced = if input.sync_source == SyncSource::Local { None } else { Some(now) };
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        organization_id: Set(input.organization_id),
        email: Set(input.email.trim().to_lowercase()),
        full_name: Set(input.full_name.trim().to_string()),
        role: Set(input.role.as_str().to_string()),
        vehicle_type: Set(input.vehicle_type.as_str().to_string()),
        charger_type: Set(charger.map(|c| c.as_str().to_string())),
        status: Set(UserStatus::Active.as_str().to_string()),
        microsoft_user_id: Set(input.microsoft_user_id),
        azure_upn: Set(input.azure_upn),
        sync_source: Set(input.sync_source.as_str().to_string()),
        department: Set(input.department),
        job_title: Set(input.job_title),
        last_synced_at: Set(synced),
        created_at: Set(now),
        updated_at: Set(now),
        deleted_at: Set(None),
    };
    am.insert(db).await.map_err(|e| errors::ModelError::Db(e.to_string()))
}

pub async fn find_by_email(db: &DatabaseConnection, email: &str) -> Result<Option<Model>, errors::ModelError> {
    Entity::find()
        .filter(Column::Email.eq(email.trim().to_lowercase()))
        .one(db)
        .await
        .map_err(|e| errors::ModelError::Db(e.to_string()))
}

pub async fn soft_delete(db: &DatabaseConnection, id: Uuid) -> Result<(), errors::ModelError> {
    let mut found: ActiveModel = Entity::find_by_id(id).one(db).await.map_err(|e| errors::ModelError::Db(e.to_string()))?.ok_or_else(|| errors::ModelError::Validation("user not found".into()))?.into();
    found.status = Set(UserStatus::Inactive.as_str().to_string());
    found.deleted_at = Set(Some(Utc::now().into()));
    found.updated_at = Set(Utc::now().into());
    found.update(db).await.map_err(|e| errors::ModelError::Db(e.to_string()))?;
    Ok(())
}

pub async fn hard_delete(db: &DatabaseConnection, id: Uuid) -> Result<(), errors::ModelError> {
    Entity::delete_by_id(id).exec(db).await.map_err(|e| errors::ModelError::Db(e.to_string()))?;
    Ok(())
}
