use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::expense;

/// Journey detail for an expense in the mileage category.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "mileage_expense")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub expense_id: Uuid,
    pub start_location: String,
    pub end_location: String,
    pub distance_miles: f64,
    pub vehicle_type: String,
    pub charger_type: Option<String>,
    pub rate_applied_pence: i64,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Expense,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Expense => Entity::belongs_to(expense::Entity)
                .from(Column::ExpenseId)
                .to(expense::Column::Id)
                .into(),
        }
    }
}

impl Related<expense::Entity> for Entity {
    fn to() -> RelationDef { Relation::Expense.def() }
}

impl ActiveModelBehavior for ActiveModel {}
