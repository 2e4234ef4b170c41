use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::expense_claim;

pub const STATUS_SENT: &str = "sent";

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "email_log")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub recipient_email: String,
    pub template_type: String,
    pub subject: String,
    pub body: String,
    pub claim_id: Option<Uuid>,
    pub status: String,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Claim,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Claim => Entity::belongs_to(expense_claim::Entity)
                .from(Column::ClaimId)
                .to(expense_claim::Column::Id)
                .into(),
        }
    }
}

impl ActiveModelBehavior for ActiveModel {}
