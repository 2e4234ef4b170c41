use super::setup_test_db;
use crate::enums::{ChargerType, ClaimStatus, Role, VehicleType, XeroSyncStatus};
use crate::{expense, expense_claim, organization, user, user_credentials};
use sea_orm::{ActiveModelTrait, EntityTrait, ModelTrait, Set};
use anyhow::Result;
use chrono::{NaiveDate, Utc};
use uuid::Uuid;

/// Test organization and user CRUD operations
#[tokio::test]
async fn test_organization_user_crud() -> Result<()> {
    let Some(db) = setup_test_db().await else { return Ok(()) };

    let org = organization::create(&db, &format!("org_{}", Uuid::new_v4()), Some("Example.COM")).await?;
    assert_eq!(org.domain.as_deref(), Some("example.com"));

    let email = format!("Test_{}@Example.com", Uuid::new_v4());
    let mut input = user::NewUser::local(org.id, &email, "Test User");
    input.role = Role::Approver;
    input.vehicle_type = VehicleType::Electric;
    input.charger_type = Some(ChargerType::Home);
    let created = user::create(&db, input).await?;
    assert_eq!(created.email, email.to_lowercase());
    assert_eq!(created.role(), Role::Approver);
    assert_eq!(created.charger_type(), Some(ChargerType::Home));
    assert!(created.is_active());

    let found = user::find_by_email(&db, &email).await?.expect("user by email");
    assert_eq!(found.id, created.id);

    // Electric without charger is refused before touching the DB
    let mut bad = user::NewUser::local(org.id, "ev@example.com", "EV");
    bad.vehicle_type = VehicleType::Electric;
    assert!(user::create(&db, bad).await.is_err());

    user_credentials::upsert_password(&db, created.id, "hash-1".into(), "argon2").await?;
    let updated = user_credentials::upsert_password(&db, created.id, "hash-2".into(), "argon2").await?;
    assert_eq!(updated.password_hash, "hash-2");

    user::soft_delete(&db, created.id).await?;
    let soft = user::Entity::find_by_id(created.id).one(&db).await?.expect("still present");
    assert!(!soft.is_active());

    // Credentials cascade with the user, users cascade with the organization
    organization::Entity::delete_by_id(org.id).exec(&db).await?;
    assert!(user::Entity::find_by_id(created.id).one(&db).await?.is_none());
    Ok(())
}

/// Test claim and expense rows with their relations
#[tokio::test]
async fn test_claim_expense_crud() -> Result<()> {
    let Some(db) = setup_test_db().await else { return Ok(()) };

    let org = organization::create(&db, &format!("claims_org_{}", Uuid::new_v4()), None).await?;
    let owner = user::create(&db, user::NewUser::local(org.id, &format!("c_{}@example.com", Uuid::new_v4()), "Claimant")).await?;

    let now = Utc::now();
    let claim = expense_claim::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(owner.id),
        claimant_name: Set(owner.full_name.clone()),
        description: Set("Client visit".into()),
        start_date: Set(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()),
        end_date: Set(NaiveDate::from_ymd_opt(2024, 5, 3).unwrap()),
        is_chargeable: Set(false),
        client_id: Set(None),
        status: Set(ClaimStatus::Draft.as_str().into()),
        submitted_at: Set(None),
        reviewed_by: Set(None),
        reviewed_at: Set(None),
        review_notes: Set(String::new()),
        xero_sync_status: Set(XeroSyncStatus::Pending.as_str().into()),
        xero_bill_id: Set(None),
        xero_synced_at: Set(None),
        xero_sync_error: Set(None),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&db)
    .await?;
    assert_eq!(claim.status(), ClaimStatus::Draft);
    assert!(claim.bill_reference().starts_with("Claim-"));
    assert_eq!(claim.bill_reference().len(), "Claim-".len() + 8);

    let line = expense::ActiveModel {
        id: Set(Uuid::new_v4()),
        claim_id: Set(claim.id),
        user_id: Set(owner.id),
        category_id: Set(None),
        title: Set("Train".into()),
        description: Set(String::new()),
        amount_before_vat_pence: Set(1000),
        vat_pence: Set(200),
        amount_pence: Set(1200),
        expense_date: Set(NaiveDate::from_ymd_opt(2024, 5, 2).unwrap()),
        receipt_url: Set(Some("https://files.example.com/r/1.jpg".into())),
        notes: Set(String::new()),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&db)
    .await?;

    let lines = claim.find_related(expense::Entity).all(&db).await?;
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].id, line.id);

    // Expenses cascade with their claim; the owner can then be removed
    expense_claim::Entity::delete_by_id(claim.id).exec(&db).await?;
    assert!(expense::Entity::find_by_id(line.id).one(&db).await?.is_none());
    organization::Entity::delete_by_id(org.id).exec(&db).await?;
    Ok(())
}
