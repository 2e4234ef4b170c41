use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

pub const EXPENSE_POLICY_DISCLAIMER: &str = "expense_policy_disclaimer";

/// Free-form key/value settings edited by admins.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "app_setting")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub key: String,
    pub value: String,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
