use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Name of the category whose expenses are priced by distance.
pub const MILEAGE_CATEGORY: &str = "mileage";

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "expense_category")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub xero_account_code: Option<String>,
    pub is_active: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn is_mileage(&self) -> bool {
        is_mileage_name(&self.name)
    }
}

pub fn is_mileage_name(name: &str) -> bool {
    name.trim().eq_ignore_ascii_case(MILEAGE_CATEGORY)
}
