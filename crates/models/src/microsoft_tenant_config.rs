use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::enums::TenantSyncStatus;
use crate::organization;

/// App registration used to read an organization's Microsoft 365 directory.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "microsoft_tenant_config")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub organization_id: Uuid,
    pub tenant_id: String,
    pub client_id: String,
    #[serde(skip_serializing)]
    pub client_secret: String,
    #[serde(skip_serializing)]
    pub access_token: Option<String>,
    pub token_expires_at: Option<DateTimeWithTimeZone>,
    pub last_sync_at: Option<DateTimeWithTimeZone>,
    pub sync_status: String,
    pub is_enabled: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
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

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn sync_status(&self) -> TenantSyncStatus {
        self.sync_status.parse().unwrap_or(TenantSyncStatus::Pending)
    }
}
