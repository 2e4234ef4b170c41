//! Expense lines on draft claims, including mileage pricing.
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use models::{
    expense, expense_claim, mileage_expense, user,
    validate::{validate_distance, validate_pence, validate_title},
    ChargerType,
};
use crate::actor::Actor;
use crate::catalog::{categories, mileage_rates};
use crate::claims::{load_claim, require_draft, require_owner};
use crate::errors::ServiceError;
use crate::mileage::calculate_amount_pence;

#[derive(Debug, Clone, Deserialize)]
pub struct MileageInput {
    pub start_location: String,
    pub end_location: String,
    pub distance_miles: f64,
    /// Overrides the owner's charger type for this journey.
    #[serde(default)]
    pub charger_type: Option<ChargerType>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExpenseInput {
    #[serde(default)]
    pub category_id: Option<Uuid>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub amount_before_vat_pence: i64,
    #[serde(default)]
    pub vat_pence: i64,
    pub expense_date: NaiveDate,
    #[serde(default)]
    pub receipt_url: Option<String>,
    #[serde(default)]
    pub notes: String,
    /// Required when the category is the mileage category.
    #[serde(default)]
    pub mileage: Option<MileageInput>,
}

/// Amounts for one line, plus journey detail for mileage lines.
struct Priced {
    before_vat: i64,
    vat: i64,
    mileage: Option<JourneyRow>,
}

impl Priced {
    fn total(&self) -> Result<i64, ServiceError> {
        let total = self
            .before_vat
            .checked_add(self.vat)
            .ok_or_else(|| ServiceError::Validation("expense total is out of range".into()))?;
        validate_pence("amount_pence", total)?;
        Ok(total)
    }
}

struct JourneyRow {
    input: MileageInput,
    vehicle: String,
    charger: Option<String>,
    rate_pence: i64,
}

async fn price(db: &DatabaseConnection, owner: &user::Model, input: &ExpenseInput) -> Result<Priced, ServiceError> {
    validate_title(&input.title)?;
    let category = match input.category_id {
        Some(id) => Some(categories::get(db, id).await?),
        None => None,
    };

    if !category.as_ref().is_some_and(|c| c.is_mileage()) {
        validate_pence("amount_before_vat_pence", input.amount_before_vat_pence)?;
        validate_pence("vat_pence", input.vat_pence)?;
        return Ok(Priced { before_vat: input.amount_before_vat_pence, vat: input.vat_pence, mileage: None });
    }

    let journey = input
        .mileage
        .clone()
        .ok_or_else(|| ServiceError::Validation("mileage expenses need start, end and distance".into()))?;
    validate_distance(journey.distance_miles)?;
    if journey.start_location.trim().is_empty() || journey.end_location.trim().is_empty() {
        return Err(ServiceError::Validation("start_location and end_location are required".into()));
    }
    let vehicle = owner.vehicle_type();
    let charger = journey.charger_type.or_else(|| owner.charger_type());
    let rate = mileage_rates::resolve_rate(db, vehicle, charger, input.expense_date).await?;
    let amount = calculate_amount_pence(journey.distance_miles, rate.rate_pence_per_mile)
        .ok_or_else(|| ServiceError::Validation("mileage amount is out of range".into()))?;
    validate_pence("amount_before_vat_pence", amount)?;
    debug!(miles = journey.distance_miles, rate = rate.rate_pence_per_mile, amount, "mileage priced");
    Ok(Priced {
        before_vat: amount,
        vat: 0,
        mileage: Some(JourneyRow {
            input: journey,
            vehicle: vehicle.as_str().to_string(),
            charger: rate.charger_type.clone(),
            rate_pence: rate.rate_pence_per_mile,
        }),
    })
}

/// Keep the mileage row in step with the expense: upsert or remove.
async fn sync_journey(txn: &DatabaseTransaction, expense_id: Uuid, journey: Option<JourneyRow>) -> Result<(), ServiceError> {
    let existing = mileage_expense::Entity::find()
        .filter(mileage_expense::Column::ExpenseId.eq(expense_id))
        .one(txn)
        .await?;
    match (existing, journey) {
        (None, None) => {}
        (Some(row), None) => {
            mileage_expense::Entity::delete_by_id(row.id).exec(txn).await?;
        }
        (existing, Some(j)) => {
            let is_new = existing.is_none();
            let mut am = match existing {
                Some(row) => row.into(),
                None => mileage_expense::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    expense_id: Set(expense_id),
                    created_at: Set(Utc::now().into()),
                    ..Default::default()
                },
            };
            am.start_location = Set(j.input.start_location.trim().to_string());
            am.end_location = Set(j.input.end_location.trim().to_string());
            am.distance_miles = Set(j.input.distance_miles);
            am.vehicle_type = Set(j.vehicle);
            am.charger_type = Set(j.charger);
            am.rate_applied_pence = Set(j.rate_pence);
            if is_new {
                am.insert(txn).await?;
            } else {
                am.update(txn).await?;
            }
        }
    }
    Ok(())
}

/// Load the claim and its owner, checking the caller may edit it.
async fn editable_claim(db: &DatabaseConnection, actor: &Actor, claim_id: Uuid) -> Result<(expense_claim::Model, user::Model), ServiceError> {
    let claim = load_claim(db, claim_id).await?;
    require_owner(actor, &claim)?;
    require_draft(&claim)?;
    let owner = user::Entity::find_by_id(claim.user_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("claim owner"))?;
    Ok((claim, owner))
}

async fn load_expense(db: &DatabaseConnection, id: Uuid) -> Result<expense::Model, ServiceError> {
    expense::Entity::find_by_id(id).one(db).await?.ok_or_else(|| ServiceError::not_found("expense"))
}

#[instrument(skip(db, actor, input), fields(user_id = %actor.user_id, claim_id = %claim_id))]
pub async fn add_expense(db: &DatabaseConnection, actor: &Actor, claim_id: Uuid, input: ExpenseInput) -> Result<expense::Model, ServiceError> {
    let (claim, owner) = editable_claim(db, actor, claim_id).await?;
    let priced = price(db, &owner, &input).await?;
    let total = priced.total()?;

    let now = Utc::now().into();
    let txn = db.begin().await?;
    let created = expense::ActiveModel {
        id: Set(Uuid::new_v4()),
        claim_id: Set(claim.id),
        user_id: Set(owner.id),
        category_id: Set(input.category_id),
        title: Set(input.title.trim().to_string()),
        description: Set(input.description),
        amount_before_vat_pence: Set(priced.before_vat),
        vat_pence: Set(priced.vat),
        amount_pence: Set(total),
        expense_date: Set(input.expense_date),
        receipt_url: Set(input.receipt_url.filter(|u| !u.trim().is_empty())),
        notes: Set(input.notes),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&txn)
    .await?;
    sync_journey(&txn, created.id, priced.mileage).await?;
    txn.commit().await?;
    info!(expense_id = %created.id, amount_pence = created.amount_pence, "expense_added");
    Ok(created)
}

#[instrument(skip(db, actor, input), fields(user_id = %actor.user_id, expense_id = %id))]
pub async fn update_expense(db: &DatabaseConnection, actor: &Actor, id: Uuid, input: ExpenseInput) -> Result<expense::Model, ServiceError> {
    let found = load_expense(db, id).await?;
    let (_, owner) = editable_claim(db, actor, found.claim_id).await?;
    let priced = price(db, &owner, &input).await?;
    let total = priced.total()?;

    let txn = db.begin().await?;
    let mut am: expense::ActiveModel = found.into();
    am.category_id = Set(input.category_id);
    am.title = Set(input.title.trim().to_string());
    am.description = Set(input.description);
    am.amount_before_vat_pence = Set(priced.before_vat);
    am.vat_pence = Set(priced.vat);
    am.amount_pence = Set(total);
    am.expense_date = Set(input.expense_date);
    am.receipt_url = Set(input.receipt_url.filter(|u| !u.trim().is_empty()));
    am.notes = Set(input.notes);
    am.updated_at = Set(Utc::now().into());
    let updated = am.update(&txn).await?;
    sync_journey(&txn, updated.id, priced.mileage).await?;
    txn.commit().await?;
    Ok(updated)
}

#[instrument(skip(db, actor), fields(user_id = %actor.user_id, expense_id = %id))]
pub async fn delete_expense(db: &DatabaseConnection, actor: &Actor, id: Uuid) -> Result<(), ServiceError> {
    let found = load_expense(db, id).await?;
    editable_claim(db, actor, found.claim_id).await?;
    // mileage_expense cascades
    expense::Entity::delete_by_id(found.id).exec(db).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::claims::{self, ClaimFilter, ClaimInput};
    use crate::test_support::{cleanup, fixture, get_db};
    use models::ClaimStatus;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 4, d).unwrap()
    }

    fn line(title: &str, before: i64, vat: i64) -> ExpenseInput {
        ExpenseInput {
            category_id: None,
            title: title.into(),
            description: String::new(),
            amount_before_vat_pence: before,
            vat_pence: vat,
            expense_date: day(2),
            receipt_url: Some("https://files.example.com/receipt.png".into()),
            notes: String::new(),
            mileage: None,
        }
    }

    fn claim_input() -> ClaimInput {
        ClaimInput { claimant_name: None, description: "April visit".into(), start_date: day(1), end_date: day(3), is_chargeable: false, client_id: None }
    }

    #[test]
    fn line_total_is_bounded() {
        let priced = |before_vat, vat| Priced { before_vat, vat, mileage: None };
        assert_eq!(priced(10_000, 2_000).total().unwrap(), 12_000);
        assert!(matches!(priced(i64::MAX, 1).total(), Err(ServiceError::Validation(_))));
        assert!(matches!(priced(models::validate::MAX_PENCE, 1).total(), Err(ServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn oversized_amounts_are_rejected() -> Result<(), anyhow::Error> {
        let Some(db) = get_db().await else { return Ok(()) };
        let fx = fixture(&db).await?;
        let claim = claims::create_claim(&db, &fx.staff, claim_input()).await?;

        let err = add_expense(&db, &fx.staff, claim.id, line("Yacht", i64::MAX, 1)).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        let max = models::validate::MAX_PENCE;
        assert!(matches!(add_expense(&db, &fx.staff, claim.id, line("Split", max, 1)).await, Err(ServiceError::Validation(_))));
        assert_eq!(add_expense(&db, &fx.staff, claim.id, line("Cap", max - 1, 1)).await?.amount_pence, max);

        cleanup(&db, &fx).await?;
        Ok(())
    }

    #[tokio::test]
    async fn claim_workflow_end_to_end() -> Result<(), anyhow::Error> {
        let Some(db) = get_db().await else { return Ok(()) };
        let fx = fixture(&db).await?;

        let claim = claims::create_claim(&db, &fx.staff, claim_input()).await?;
        assert_eq!(claim.status(), ClaimStatus::Draft);
        assert_eq!(claim.claimant_name, "staff user");

        // Empty claims cannot be submitted
        assert!(matches!(claims::submit_claim(&db, &fx.staff, claim.id).await, Err(ServiceError::Validation(_))));

        let e = add_expense(&db, &fx.staff, claim.id, line("Hotel", 10_000, 2_000)).await?;
        assert_eq!(e.amount_pence, 12_000);
        // Someone else's claim is off limits
        assert!(matches!(add_expense(&db, &fx.approver, claim.id, line("x", 1, 0)).await, Err(ServiceError::Forbidden(_))));

        let submitted = claims::submit_claim(&db, &fx.staff, claim.id).await?;
        assert_eq!(submitted.status(), ClaimStatus::Submitted);
        assert!(submitted.submitted_at.is_some());
        // Locked once submitted
        assert!(matches!(update_expense(&db, &fx.staff, e.id, line("Hotel", 1, 0)).await, Err(ServiceError::InvalidState(_))));

        let queue = claims::approval_queue(&db, fx.organization_id).await?;
        assert_eq!(queue.len(), 1);
        assert_eq!(queue[0].total_pence, 12_000);

        // Staff cannot review, owners cannot review their own claims
        assert!(matches!(claims::review_claim(&db, &fx.staff, claim.id, true, None).await, Err(ServiceError::Forbidden(_))));

        let rejected = claims::review_claim(&db, &fx.approver, claim.id, false, Some("missing receipt".into())).await?;
        assert_eq!(rejected.status(), ClaimStatus::Rejected);
        assert_eq!(rejected.reviewed_by, Some(fx.approver.user_id));
        assert_eq!(rejected.review_notes, "missing receipt");

        // A second review of the same claim loses
        assert!(matches!(claims::review_claim(&db, &fx.admin, claim.id, true, None).await, Err(ServiceError::InvalidState(_))));

        let reopened = claims::reopen_claim(&db, &fx.staff, claim.id).await?;
        assert_eq!(reopened.status(), ClaimStatus::Draft);
        update_expense(&db, &fx.staff, e.id, line("Hotel", 9_000, 1_800)).await?;
        claims::submit_claim(&db, &fx.staff, claim.id).await?;
        let approved = claims::review_claim(&db, &fx.admin, claim.id, true, None).await?;
        assert_eq!(approved.status(), ClaimStatus::Approved);
        assert_eq!(approved.xero_sync_status, "pending");

        let sync = claims::sync_queue(&db, fx.organization_id).await?;
        assert_eq!(sync.pending.len(), 1);
        assert_eq!(sync.pending[0].total_pence, 10_800);

        // Approved claims are immutable
        assert!(matches!(claims::delete_claim(&db, &fx.staff, claim.id).await, Err(ServiceError::InvalidState(_))));

        let mine = claims::list_claims(&db, &fx.staff, ClaimFilter { status: Some(ClaimStatus::Approved), ..Default::default() }).await?;
        assert_eq!(mine.items.len(), 1);
        let detail = claims::get_claim_detail(&db, &fx.approver, claim.id).await?;
        assert_eq!(detail.expenses.len(), 1);
        assert_eq!(detail.total_pence, 10_800);

        cleanup(&db, &fx).await?;
        Ok(())
    }

    #[tokio::test]
    async fn mileage_lines_are_priced_from_rates() -> Result<(), anyhow::Error> {
        let Some(db) = get_db().await else { return Ok(()) };
        let fx = fixture(&db).await?;
        let mileage = categories::list(&db, false).await?.into_iter().find(|c| c.is_mileage()).expect("seeded mileage category");
        let claim = claims::create_claim(&db, &fx.staff, claim_input()).await?;

        let mut input = line("Client visit", 99_999, 500);
        input.category_id = Some(mileage.id);
        // Missing journey details
        assert!(matches!(add_expense(&db, &fx.staff, claim.id, input.clone()).await, Err(ServiceError::Validation(_))));

        input.mileage = Some(MileageInput {
            start_location: "Leeds".into(),
            end_location: "York".into(),
            distance_miles: 25.5,
            charger_type: None,
        });
        let e = add_expense(&db, &fx.staff, claim.id, input.clone()).await?;
        let rate = mileage_rates::resolve_rate(&db, models::VehicleType::Standard, None, day(2)).await?;
        assert_eq!(e.vat_pence, 0);
        assert_eq!(e.amount_pence, calculate_amount_pence(25.5, rate.rate_pence_per_mile).unwrap());

        let journey = mileage_expense::Entity::find()
            .filter(mileage_expense::Column::ExpenseId.eq(e.id))
            .one(&db)
            .await?
            .expect("journey row");
        assert_eq!(journey.rate_applied_pence, rate.rate_pence_per_mile);
        assert_eq!(journey.end_location, "York");

        // Switching to a plain category drops the journey row
        input.category_id = None;
        input.mileage = None;
        update_expense(&db, &fx.staff, e.id, input).await?;
        let gone = mileage_expense::Entity::find()
            .filter(mileage_expense::Column::ExpenseId.eq(e.id))
            .one(&db)
            .await?;
        assert!(gone.is_none());

        cleanup(&db, &fx).await?;
        Ok(())
    }

    #[tokio::test]
    async fn chargeable_claims_need_active_client() -> Result<(), anyhow::Error> {
        let Some(db) = get_db().await else { return Ok(()) };
        let fx = fixture(&db).await?;
        let mut input = claim_input();
        input.is_chargeable = true;
        assert!(matches!(claims::create_claim(&db, &fx.staff, input.clone()).await, Err(ServiceError::Validation(_))));

        let client = crate::catalog::clients::create(&db, &format!("Client {}", Uuid::new_v4().simple())).await?;
        input.client_id = Some(client.id);
        let claim = claims::create_claim(&db, &fx.staff, input.clone()).await?;
        assert_eq!(claim.client_id, Some(client.id));

        input.start_date = day(5);
        assert!(claims::update_claim(&db, &fx.staff, claim.id, input).await.is_err());

        cleanup(&db, &fx).await?;
        models::client::Entity::delete_by_id(client.id).exec(&db).await?;
        Ok(())
    }
}
