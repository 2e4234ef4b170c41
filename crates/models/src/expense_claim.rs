use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::enums::{ClaimStatus, XeroSyncStatus};
use crate::{client, user};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "expense_claim")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub claimant_name: String,
    pub description: String,
    pub start_date: Date,
    pub end_date: Date,
    pub is_chargeable: bool,
    pub client_id: Option<Uuid>,
    pub status: String,
    pub submitted_at: Option<DateTimeWithTimeZone>,
    pub reviewed_by: Option<Uuid>,
    pub reviewed_at: Option<DateTimeWithTimeZone>,
    pub review_notes: String,
    pub xero_sync_status: String,
    pub xero_bill_id: Option<String>,
    pub xero_synced_at: Option<DateTimeWithTimeZone>,
    pub xero_sync_error: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    User,
    Reviewer,
    Client,
    Expense,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::User => Entity::belongs_to(user::Entity).from(Column::UserId).to(user::Column::Id).into(),
            Relation::Reviewer => Entity::belongs_to(user::Entity).from(Column::ReviewedBy).to(user::Column::Id).into(),
            Relation::Client => Entity::belongs_to(client::Entity).from(Column::ClientId).to(client::Column::Id).into(),
            Relation::Expense => Entity::has_many(crate::expense::Entity).into(),
        }
    }
}

impl Related<user::Entity> for Entity {
    fn to() -> RelationDef { Relation::User.def() }
}

impl Related<crate::expense::Entity> for Entity {
    fn to() -> RelationDef { Relation::Expense.def() }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Rows with an unrecognised status are treated as drafts.
    pub fn status(&self) -> ClaimStatus {
        self.status.parse().unwrap_or(ClaimStatus::Draft)
    }

    pub fn sync_status(&self) -> XeroSyncStatus {
        self.xero_sync_status.parse().unwrap_or(XeroSyncStatus::Pending)
    }

    /// `Claim-` plus the first eight characters of the id.
    pub fn bill_reference(&self) -> String {
        let id = self.id.to_string();
        format!("Claim-{}", &id[..8])
    }
}
