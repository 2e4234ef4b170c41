//! Claim workflow: draft -> submitted -> approved | rejected, with
//! rejected claims reopened as drafts.
use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, JoinType,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set,
};
use tracing::{info, instrument};
use uuid::Uuid;

use models::{
    expense, expense_category, expense_claim, mileage_expense, user, validate::validate_date_range, ClaimStatus,
    XeroSyncStatus,
};
use crate::actor::Actor;
use crate::catalog::clients;
use crate::errors::ServiceError;
use crate::pagination::{Page, Pagination};

#[derive(Debug, Clone, Deserialize)]
pub struct ClaimInput {
    /// Defaults to the owner's full name.
    #[serde(default)]
    pub claimant_name: Option<String>,
    #[serde(default)]
    pub description: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub is_chargeable: bool,
    #[serde(default)]
    pub client_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClaimFilter {
    pub status: Option<ClaimStatus>,
    /// Claims whose range ends on or after this date.
    pub from: Option<NaiveDate>,
    /// Claims whose range starts on or before this date.
    pub to: Option<NaiveDate>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl ClaimFilter {
    pub fn pagination(&self) -> Pagination {
        let d = Pagination::default();
        Pagination { page: self.page.unwrap_or(d.page), per_page: self.per_page.unwrap_or(d.per_page) }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ClaimSummary {
    #[serde(flatten)]
    pub claim: expense_claim::Model,
    pub total_pence: i64,
    pub expense_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExpenseLine {
    #[serde(flatten)]
    pub expense: expense::Model,
    pub category_name: Option<String>,
    pub mileage: Option<mileage_expense::Model>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClaimDetail {
    #[serde(flatten)]
    pub claim: expense_claim::Model,
    pub expenses: Vec<ExpenseLine>,
    pub total_pence: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncQueue {
    pub pending: Vec<ClaimSummary>,
    pub synced: Vec<ClaimSummary>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExpenseFilter {
    pub user_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

pub(crate) async fn load_claim(db: &DatabaseConnection, id: Uuid) -> Result<expense_claim::Model, ServiceError> {
    expense_claim::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("claim"))
}

pub(crate) fn require_owner(actor: &Actor, claim: &expense_claim::Model) -> Result<(), ServiceError> {
    if claim.user_id != actor.user_id {
        return Err(ServiceError::Forbidden("only the claim owner may do this".into()));
    }
    Ok(())
}

pub(crate) fn require_draft(claim: &expense_claim::Model) -> Result<(), ServiceError> {
    if !claim.status().is_editable() {
        return Err(ServiceError::InvalidState(format!("claim is {}; only draft claims can be changed", claim.status)));
    }
    Ok(())
}

async fn owner_of(db: &DatabaseConnection, claim: &expense_claim::Model) -> Result<user::Model, ServiceError> {
    user::Entity::find_by_id(claim.user_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("claim owner"))
}

/// Validate input and resolve the client for chargeable claims.
async fn checked_client(db: &DatabaseConnection, input: &ClaimInput) -> Result<Option<Uuid>, ServiceError> {
    validate_date_range(input.start_date, input.end_date)?;
    if !input.is_chargeable {
        return Ok(None);
    }
    let client_id = input
        .client_id
        .ok_or_else(|| ServiceError::Validation("chargeable claims must reference a client".into()))?;
    Ok(Some(clients::require_active(db, client_id).await?.id))
}

/// Totals and line counts for a set of claims.
async fn totals(db: &DatabaseConnection, claim_ids: &[Uuid]) -> Result<HashMap<Uuid, (i64, usize)>, ServiceError> {
    let mut out: HashMap<Uuid, (i64, usize)> = HashMap::new();
    if claim_ids.is_empty() {
        return Ok(out);
    }
    let lines = expense::Entity::find()
        .filter(expense::Column::ClaimId.is_in(claim_ids.iter().copied()))
        .all(db)
        .await?;
    for line in lines {
        let entry = out.entry(line.claim_id).or_default();
        entry.0 += line.amount_pence;
        entry.1 += 1;
    }
    Ok(out)
}

async fn summarize(db: &DatabaseConnection, claims: Vec<expense_claim::Model>) -> Result<Vec<ClaimSummary>, ServiceError> {
    let ids: Vec<Uuid> = claims.iter().map(|c| c.id).collect();
    let totals = totals(db, &ids).await?;
    Ok(claims
        .into_iter()
        .map(|claim| {
            let (total_pence, expense_count) = totals.get(&claim.id).copied().unwrap_or_default();
            ClaimSummary { claim, total_pence, expense_count }
        })
        .collect())
}

/// Sum of a claim's expenses in pence.
pub async fn claim_total(db: &DatabaseConnection, claim_id: Uuid) -> Result<i64, ServiceError> {
    Ok(totals(db, &[claim_id]).await?.get(&claim_id).map(|t| t.0).unwrap_or(0))
}

#[instrument(skip(db, actor, input), fields(user_id = %actor.user_id))]
pub async fn create_claim(db: &DatabaseConnection, actor: &Actor, input: ClaimInput) -> Result<expense_claim::Model, ServiceError> {
    let client_id = checked_client(db, &input).await?;
    let owner = user::Entity::find_by_id(actor.user_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("user"))?;
    let claimant = input
        .claimant_name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| owner.full_name.clone());

    let now = Utc::now().into();
    let created = expense_claim::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(owner.id),
        claimant_name: Set(claimant),
        description: Set(input.description),
        start_date: Set(input.start_date),
        end_date: Set(input.end_date),
        is_chargeable: Set(input.is_chargeable),
        client_id: Set(client_id),
        status: Set(ClaimStatus::Draft.as_str().to_string()),
        submitted_at: Set(None),
        reviewed_by: Set(None),
        reviewed_at: Set(None),
        review_notes: Set(String::new()),
        xero_sync_status: Set(XeroSyncStatus::Pending.as_str().to_string()),
        xero_bill_id: Set(None),
        xero_synced_at: Set(None),
        xero_sync_error: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await?;
    info!(claim_id = %created.id, "claim_created");
    Ok(created)
}

/// The caller's own claims, newest first.
pub async fn list_claims(db: &DatabaseConnection, actor: &Actor, filter: ClaimFilter) -> Result<Page<ClaimSummary>, ServiceError> {
    let (page_idx, per_page) = filter.pagination().normalize();
    let mut q = expense_claim::Entity::find()
        .filter(expense_claim::Column::UserId.eq(actor.user_id))
        .order_by_desc(expense_claim::Column::StartDate)
        .order_by_desc(expense_claim::Column::CreatedAt);
    if let Some(status) = filter.status {
        q = q.filter(expense_claim::Column::Status.eq(status.as_str()));
    }
    if let Some(from) = filter.from {
        q = q.filter(expense_claim::Column::EndDate.gte(from));
    }
    if let Some(to) = filter.to {
        q = q.filter(expense_claim::Column::StartDate.lte(to));
    }
    let claims = q.paginate(db, per_page).fetch_page(page_idx).await?;
    Ok(Page { page: page_idx as u32 + 1, per_page: per_page as u32, items: summarize(db, claims).await? })
}

/// Claim with its lines. Visible to the owner and to reviewers of the
/// owner's organization.
pub async fn get_claim_detail(db: &DatabaseConnection, actor: &Actor, id: Uuid) -> Result<ClaimDetail, ServiceError> {
    let claim = load_claim(db, id).await?;
    if claim.user_id != actor.user_id {
        actor.require_reviewer()?;
        if owner_of(db, &claim).await?.organization_id != actor.organization_id {
            return Err(ServiceError::not_found("claim"));
        }
    }

    let rows = expense::Entity::find()
        .filter(expense::Column::ClaimId.eq(claim.id))
        .order_by_asc(expense::Column::ExpenseDate)
        .order_by_asc(expense::Column::CreatedAt)
        .find_also_related(expense_category::Entity)
        .all(db)
        .await?;
    let ids: Vec<Uuid> = rows.iter().map(|(e, _)| e.id).collect();
    let mut mileage: HashMap<Uuid, mileage_expense::Model> = mileage_expense::Entity::find()
        .filter(mileage_expense::Column::ExpenseId.is_in(ids))
        .all(db)
        .await?
        .into_iter()
        .map(|m| (m.expense_id, m))
        .collect();

    let expenses: Vec<ExpenseLine> = rows
        .into_iter()
        .map(|(e, cat)| ExpenseLine { mileage: mileage.remove(&e.id), category_name: cat.map(|c| c.name), expense: e })
        .collect();
    let total_pence = expenses.iter().map(|l| l.expense.amount_pence).sum();
    Ok(ClaimDetail { claim, expenses, total_pence })
}

#[instrument(skip(db, actor, input), fields(user_id = %actor.user_id, claim_id = %id))]
pub async fn update_claim(db: &DatabaseConnection, actor: &Actor, id: Uuid, input: ClaimInput) -> Result<expense_claim::Model, ServiceError> {
    let claim = load_claim(db, id).await?;
    require_owner(actor, &claim)?;
    require_draft(&claim)?;
    let client_id = checked_client(db, &input).await?;

    let mut am: expense_claim::ActiveModel = claim.into();
    if let Some(name) = input.claimant_name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
        am.claimant_name = Set(name.to_string());
    }
    am.description = Set(input.description);
    am.start_date = Set(input.start_date);
    am.end_date = Set(input.end_date);
    am.is_chargeable = Set(input.is_chargeable);
    am.client_id = Set(client_id);
    am.updated_at = Set(Utc::now().into());
    Ok(am.update(db).await?)
}

#[instrument(skip(db, actor), fields(user_id = %actor.user_id, claim_id = %id))]
pub async fn delete_claim(db: &DatabaseConnection, actor: &Actor, id: Uuid) -> Result<(), ServiceError> {
    let claim = load_claim(db, id).await?;
    require_owner(actor, &claim)?;
    require_draft(&claim)?;
    expense_claim::Entity::delete_by_id(claim.id).exec(db).await?;
    info!("claim_deleted");
    Ok(())
}

/// Move a claim between statuses only if it is still in `from`; concurrent
/// transitions of the same claim lose with `InvalidState`.
async fn transition(
    db: &DatabaseConnection,
    id: Uuid,
    from: ClaimStatus,
    to: ClaimStatus,
    extra: impl FnOnce(sea_orm::UpdateMany<expense_claim::Entity>) -> sea_orm::UpdateMany<expense_claim::Entity>,
) -> Result<expense_claim::Model, ServiceError> {
    if !from.can_transition_to(to) {
        return Err(ServiceError::InvalidState(format!("cannot move a claim from {from} to {to}")));
    }
    let update = expense_claim::Entity::update_many()
        .col_expr(expense_claim::Column::Status, Expr::value(to.as_str()))
        .col_expr(expense_claim::Column::UpdatedAt, Expr::value(chrono::DateTime::<chrono::FixedOffset>::from(Utc::now())))
        .filter(expense_claim::Column::Id.eq(id))
        .filter(expense_claim::Column::Status.eq(from.as_str()));
    let res = extra(update).exec(db).await?;
    if res.rows_affected == 0 {
        return Err(ServiceError::InvalidState(format!("claim is no longer {from}")));
    }
    load_claim(db, id).await
}

#[instrument(skip(db, actor), fields(user_id = %actor.user_id, claim_id = %id))]
pub async fn submit_claim(db: &DatabaseConnection, actor: &Actor, id: Uuid) -> Result<expense_claim::Model, ServiceError> {
    let claim = load_claim(db, id).await?;
    require_owner(actor, &claim)?;
    let status = claim.status();
    if !status.can_transition_to(ClaimStatus::Submitted) {
        return Err(ServiceError::InvalidState(format!("claim is {status}; only drafts can be submitted")));
    }
    let lines = expense::Entity::find().filter(expense::Column::ClaimId.eq(id)).count(db).await?;
    if lines == 0 {
        return Err(ServiceError::Validation("a claim needs at least one expense before submission".into()));
    }
    let now = chrono::DateTime::<chrono::FixedOffset>::from(Utc::now());
    let submitted = transition(db, id, ClaimStatus::Draft, ClaimStatus::Submitted, |u| {
        u.col_expr(expense_claim::Column::SubmittedAt, Expr::value(now))
    })
    .await?;
    info!(expenses = lines, "claim_submitted");
    Ok(submitted)
}

/// Approve or reject a submitted claim. Approval queues it for the accounting sync.
#[instrument(skip(db, reviewer, notes), fields(reviewer = %reviewer.user_id, claim_id = %id))]
pub async fn review_claim(
    db: &DatabaseConnection,
    reviewer: &Actor,
    id: Uuid,
    approve: bool,
    notes: Option<String>,
) -> Result<expense_claim::Model, ServiceError> {
    reviewer.require_reviewer()?;
    let claim = load_claim(db, id).await?;
    if claim.user_id == reviewer.user_id {
        return Err(ServiceError::Forbidden("reviewers cannot review their own claims".into()));
    }
    if owner_of(db, &claim).await?.organization_id != reviewer.organization_id {
        return Err(ServiceError::not_found("claim"));
    }
    let to = if approve { ClaimStatus::Approved } else { ClaimStatus::Rejected };
    let now = chrono::DateTime::<chrono::FixedOffset>::from(Utc::now());
    let reviewer_id = reviewer.user_id;
    let notes = notes.unwrap_or_default();
    let reviewed = transition(db, id, ClaimStatus::Submitted, to, move |u| {
        let u = u
            .col_expr(expense_claim::Column::ReviewedBy, Expr::value(reviewer_id))
            .col_expr(expense_claim::Column::ReviewedAt, Expr::value(now))
            .col_expr(expense_claim::Column::ReviewNotes, Expr::value(notes));
        if approve {
            u.col_expr(expense_claim::Column::XeroSyncStatus, Expr::value(XeroSyncStatus::Pending.as_str()))
                .col_expr(expense_claim::Column::XeroSyncError, Expr::value(Option::<String>::None))
        } else {
            u
        }
    })
    .await?;
    info!(status = %reviewed.status, "claim_reviewed");
    Ok(reviewed)
}

/// Owner turns a rejected claim back into an editable draft.
#[instrument(skip(db, actor), fields(user_id = %actor.user_id, claim_id = %id))]
pub async fn reopen_claim(db: &DatabaseConnection, actor: &Actor, id: Uuid) -> Result<expense_claim::Model, ServiceError> {
    let claim = load_claim(db, id).await?;
    require_owner(actor, &claim)?;
    transition(db, id, ClaimStatus::Rejected, ClaimStatus::Draft, |u| {
        u.col_expr(expense_claim::Column::SubmittedAt, Expr::value(Option::<chrono::DateTime<chrono::FixedOffset>>::None))
    })
    .await
}

fn org_claims(organization_id: Uuid) -> sea_orm::Select<expense_claim::Entity> {
    expense_claim::Entity::find()
        .join(JoinType::InnerJoin, expense_claim::Relation::User.def())
        .filter(user::Column::OrganizationId.eq(organization_id))
}

/// Submitted claims of the organization, oldest submission first.
pub async fn approval_queue(db: &DatabaseConnection, organization_id: Uuid) -> Result<Vec<ClaimSummary>, ServiceError> {
    let claims = org_claims(organization_id)
        .filter(expense_claim::Column::Status.eq(ClaimStatus::Submitted.as_str()))
        .order_by_asc(expense_claim::Column::SubmittedAt)
        .all(db)
        .await?;
    summarize(db, claims).await
}

/// Approved claims split into those awaiting a bill and those already synced.
pub async fn sync_queue(db: &DatabaseConnection, organization_id: Uuid) -> Result<SyncQueue, ServiceError> {
    let claims = org_claims(organization_id)
        .filter(expense_claim::Column::Status.eq(ClaimStatus::Approved.as_str()))
        .order_by_asc(expense_claim::Column::ReviewedAt)
        .all(db)
        .await?;
    let (synced, pending): (Vec<_>, Vec<_>) = claims
        .into_iter()
        .partition(|c| c.sync_status() == XeroSyncStatus::Synced && c.xero_bill_id.is_some());
    Ok(SyncQueue { pending: summarize(db, pending).await?, synced: summarize(db, synced).await? })
}

/// Every expense in the organization, newest first (admin history view).
pub async fn list_all_expenses(db: &DatabaseConnection, organization_id: Uuid, filter: ExpenseFilter) -> Result<Page<expense::Model>, ServiceError> {
    let d = Pagination::default();
    let (page_idx, per_page) = Pagination { page: filter.page.unwrap_or(d.page), per_page: filter.per_page.unwrap_or(d.per_page) }.normalize();
    let mut cond = Condition::all().add(user::Column::OrganizationId.eq(organization_id));
    if let Some(uid) = filter.user_id {
        cond = cond.add(expense::Column::UserId.eq(uid));
    }
    if let Some(cid) = filter.category_id {
        cond = cond.add(expense::Column::CategoryId.eq(cid));
    }
    if let Some(from) = filter.from {
        cond = cond.add(expense::Column::ExpenseDate.gte(from));
    }
    if let Some(to) = filter.to {
        cond = cond.add(expense::Column::ExpenseDate.lte(to));
    }
    let items = expense::Entity::find()
        .join(JoinType::InnerJoin, expense::Relation::Claim.def())
        .join(JoinType::InnerJoin, expense_claim::Relation::User.def())
        .filter(cond)
        .order_by_desc(expense::Column::ExpenseDate)
        .paginate(db, per_page)
        .fetch_page(page_idx)
        .await?;
    Ok(Page { page: page_idx as u32 + 1, per_page: per_page as u32, items })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expenses::{add_expense, ExpenseInput};
    use crate::test_support::{cleanup, fixture, get_db, Fixture};

    fn day(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    fn input(start: NaiveDate, end: NaiveDate) -> ClaimInput {
        ClaimInput { claimant_name: None, description: "Trip".into(), start_date: start, end_date: end, is_chargeable: false, client_id: None }
    }

    fn line(date: NaiveDate) -> ExpenseInput {
        ExpenseInput {
            category_id: None,
            title: "Taxi".into(),
            description: String::new(),
            amount_before_vat_pence: 2_000,
            vat_pence: 400,
            expense_date: date,
            receipt_url: None,
            notes: String::new(),
            mileage: None,
        }
    }

    /// Draft with one line, submitted and then reviewed.
    async fn reviewed_claim(db: &DatabaseConnection, fx: &Fixture, approve: bool) -> anyhow::Result<expense_claim::Model> {
        let claim = create_claim(db, &fx.staff, input(day(6, 1), day(6, 2))).await?;
        add_expense(db, &fx.staff, claim.id, line(day(6, 1))).await?;
        submit_claim(db, &fx.staff, claim.id).await?;
        Ok(review_claim(db, &fx.approver, claim.id, approve, None).await?)
    }

    async fn set_sync(db: &DatabaseConnection, id: Uuid, status: XeroSyncStatus, bill_id: Option<&str>) -> anyhow::Result<()> {
        expense_claim::Entity::update_many()
            .col_expr(expense_claim::Column::XeroSyncStatus, Expr::value(status.as_str()))
            .col_expr(expense_claim::Column::XeroBillId, Expr::value(bill_id.map(str::to_string)))
            .filter(expense_claim::Column::Id.eq(id))
            .exec(db)
            .await?;
        Ok(())
    }

    #[tokio::test]
    async fn failed_sync_returns_to_pending_queue() -> Result<(), anyhow::Error> {
        let Some(db) = get_db().await else { return Ok(()) };
        let fx = fixture(&db).await?;

        let failed = reviewed_claim(&db, &fx, true).await?;
        let synced = reviewed_claim(&db, &fx, true).await?;
        let rejected = reviewed_claim(&db, &fx, false).await?;
        set_sync(&db, failed.id, XeroSyncStatus::Failed, None).await?;
        set_sync(&db, synced.id, XeroSyncStatus::Synced, Some("inv-9")).await?;

        let queue = sync_queue(&db, fx.organization_id).await?;
        let pending: Vec<Uuid> = queue.pending.iter().map(|c| c.claim.id).collect();
        let done: Vec<Uuid> = queue.synced.iter().map(|c| c.claim.id).collect();
        assert_eq!(pending, [failed.id]);
        assert_eq!(done, [synced.id]);
        assert!(!pending.contains(&rejected.id));
        assert_eq!(queue.pending[0].total_pence, 2_400);
        assert_eq!(queue.pending[0].expense_count, 1);

        cleanup(&db, &fx).await?;
        Ok(())
    }

    #[tokio::test]
    async fn reopen_clears_submission_time() -> Result<(), anyhow::Error> {
        let Some(db) = get_db().await else { return Ok(()) };
        let fx = fixture(&db).await?;

        let rejected = reviewed_claim(&db, &fx, false).await?;
        assert!(rejected.submitted_at.is_some());
        assert!(matches!(reopen_claim(&db, &fx.approver, rejected.id).await, Err(ServiceError::Forbidden(_))));

        let reopened = reopen_claim(&db, &fx.staff, rejected.id).await?;
        assert_eq!(reopened.status(), ClaimStatus::Draft);
        assert!(reopened.submitted_at.is_none());
        // only rejected claims reopen
        assert!(matches!(reopen_claim(&db, &fx.staff, rejected.id).await, Err(ServiceError::InvalidState(_))));

        cleanup(&db, &fx).await?;
        Ok(())
    }

    #[tokio::test]
    async fn list_filters_by_date_overlap_and_status() -> Result<(), anyhow::Error> {
        let Some(db) = get_db().await else { return Ok(()) };
        let fx = fixture(&db).await?;

        let march = create_claim(&db, &fx.staff, input(day(3, 1), day(3, 5))).await?;
        let april = create_claim(&db, &fx.staff, input(day(4, 10), day(4, 12))).await?;
        let spanning = create_claim(&db, &fx.staff, input(day(3, 28), day(4, 2))).await?;
        create_claim(&db, &fx.approver, input(day(4, 1), day(4, 1))).await?;

        let ids = |page: Page<ClaimSummary>| page.items.into_iter().map(|c| c.claim.id).collect::<Vec<_>>();
        let all = ids(list_claims(&db, &fx.staff, ClaimFilter::default()).await?);
        assert_eq!(all, [april.id, spanning.id, march.id]);

        let from_april = ClaimFilter { from: Some(day(4, 1)), ..Default::default() };
        assert_eq!(ids(list_claims(&db, &fx.staff, from_april).await?), [april.id, spanning.id]);

        let until_march = ClaimFilter { to: Some(day(3, 31)), ..Default::default() };
        assert_eq!(ids(list_claims(&db, &fx.staff, until_march).await?), [spanning.id, march.id]);

        let window = ClaimFilter { from: Some(day(3, 6)), to: Some(day(4, 9)), ..Default::default() };
        assert_eq!(ids(list_claims(&db, &fx.staff, window).await?), [spanning.id]);

        let submitted = ClaimFilter { status: Some(ClaimStatus::Submitted), ..Default::default() };
        assert!(ids(list_claims(&db, &fx.staff, submitted).await?).is_empty());

        cleanup(&db, &fx).await?;
        Ok(())
    }

    #[tokio::test]
    async fn only_owner_edits_and_other_orgs_see_nothing() -> Result<(), anyhow::Error> {
        let Some(db) = get_db().await else { return Ok(()) };
        let fx = fixture(&db).await?;
        let other = fixture(&db).await?;

        let claim = create_claim(&db, &fx.staff, input(day(5, 1), day(5, 2))).await?;
        let edit = input(day(5, 1), day(5, 3));
        assert!(matches!(update_claim(&db, &fx.approver, claim.id, edit.clone()).await, Err(ServiceError::Forbidden(_))));
        assert!(matches!(update_claim(&db, &fx.admin, claim.id, edit.clone()).await, Err(ServiceError::Forbidden(_))));
        assert!(matches!(delete_claim(&db, &fx.approver, claim.id).await, Err(ServiceError::Forbidden(_))));
        assert_eq!(update_claim(&db, &fx.staff, claim.id, edit).await?.end_date, day(5, 3));

        // reviewers of the same organization may read it
        assert_eq!(get_claim_detail(&db, &fx.approver, claim.id).await?.claim.id, claim.id);
        assert!(matches!(get_claim_detail(&db, &other.approver, claim.id).await, Err(ServiceError::NotFound(_))));
        assert!(matches!(get_claim_detail(&db, &other.admin, claim.id).await, Err(ServiceError::NotFound(_))));
        assert!(matches!(get_claim_detail(&db, &other.staff, claim.id).await, Err(ServiceError::Forbidden(_))));

        delete_claim(&db, &fx.staff, claim.id).await?;
        assert!(matches!(get_claim_detail(&db, &fx.staff, claim.id).await, Err(ServiceError::NotFound(_))));

        cleanup(&db, &other).await?;
        cleanup(&db, &fx).await?;
        Ok(())
    }
}
