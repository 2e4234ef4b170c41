use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{expense_category, expense_claim};

/// A single line on a claim. Money is integer pence; `amount_pence` is
/// always `amount_before_vat_pence + vat_pence`.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "expense")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub claim_id: Uuid,
    pub user_id: Uuid,
    pub category_id: Option<Uuid>,
    pub title: String,
    pub description: String,
    pub amount_before_vat_pence: i64,
    pub vat_pence: i64,
    pub amount_pence: i64,
    pub expense_date: Date,
    pub receipt_url: Option<String>,
    pub notes: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Claim,
    Category,
    Mileage,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Claim => Entity::belongs_to(expense_claim::Entity)
                .from(Column::ClaimId)
                .to(expense_claim::Column::Id)
                .into(),
            Relation::Category => Entity::belongs_to(expense_category::Entity)
                .from(Column::CategoryId)
                .to(expense_category::Column::Id)
                .into(),
            Relation::Mileage => Entity::has_one(crate::mileage_expense::Entity).into(),
        }
    }
}

impl Related<expense_claim::Entity> for Entity {
    fn to() -> RelationDef { Relation::Claim.def() }
}

impl Related<expense_category::Entity> for Entity {
    fn to() -> RelationDef { Relation::Category.def() }
}

impl Related<crate::mileage_expense::Entity> for Entity {
    fn to() -> RelationDef { Relation::Mileage.def() }
}

impl ActiveModelBehavior for ActiveModel {}
