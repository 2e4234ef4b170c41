use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Single-row store for the accounting connection. Secrets and tokens are
/// never serialised.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "xero_settings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub client_id: String,
    #[serde(skip_serializing)]
    pub client_secret: String,
    pub tenant_id: String,
    pub tenant_name: Option<String>,
    #[serde(skip_serializing)]
    pub access_token: Option<String>,
    #[serde(skip_serializing)]
    pub refresh_token: Option<String>,
    pub token_expires_at: Option<DateTimeWithTimeZone>,
    pub is_connected: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

fn present(v: &str) -> bool {
    !v.trim().is_empty()
}

impl Model {
    pub fn has_client_credentials(&self) -> bool {
        present(&self.client_id) && present(&self.client_secret)
    }

    pub fn has_refresh_token(&self) -> bool {
        self.refresh_token.as_deref().map_or(false, present)
    }

    /// Everything a bill sync needs.
    pub fn is_complete(&self) -> bool {
        self.has_client_credentials() && present(&self.tenant_id) && self.has_refresh_token()
    }

    pub fn any_configured(&self) -> bool {
        present(&self.client_id) || present(&self.client_secret) || present(&self.tenant_id) || self.has_refresh_token()
    }
}
