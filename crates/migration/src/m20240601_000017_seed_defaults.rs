//! Seed reference data: notification templates, the mileage category,
//! the policy disclaimer and default mileage rates.
//!
//! Every insert is `ON CONFLICT DO NOTHING` so re-running against an
//! edited database keeps local changes.
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

const SEED: &str = r#"
INSERT INTO "email_template" ("id", "template_type", "subject", "body", "updated_at") VALUES
  (gen_random_uuid(), 'claim_submitted', 'Expense claim submitted by {{claimant_name}}',
   'Hi {{recipient_name}},

{{claimant_name}} has submitted an expense claim for {{claim_start_date}} to {{claim_end_date}}.

Description: {{claim_description}}
Total: £{{claim_amount}}

Please review it in the approvals queue.', now()),
  (gen_random_uuid(), 'claim_approved', 'Your expense claim has been approved',
   'Hi {{recipient_name}},

Your expense claim for {{claim_start_date}} to {{claim_end_date}} (£{{claim_amount}}) was approved by {{reviewer_name}}.

Notes: {{review_notes}}', now()),
  (gen_random_uuid(), 'claim_rejected', 'Your expense claim has been rejected',
   'Hi {{recipient_name}},

Your expense claim for {{claim_start_date}} to {{claim_end_date}} (£{{claim_amount}}) was rejected by {{reviewer_name}}.

Notes: {{review_notes}}

You can reopen the claim, amend it and submit it again.', now())
ON CONFLICT ("template_type") DO NOTHING;

INSERT INTO "expense_category" ("id", "name", "description", "xero_account_code", "is_active", "created_at", "updated_at") VALUES
  (gen_random_uuid(), 'Mileage', 'Business journeys in a personal vehicle', '493', true, now(), now())
ON CONFLICT ("name") DO NOTHING;

INSERT INTO "app_setting" ("key", "value", "updated_at") VALUES
  ('expense_policy_disclaimer', 'By submitting this claim I confirm the expenses were incurred wholly and exclusively for business purposes.', now())
ON CONFLICT ("key") DO NOTHING;

INSERT INTO "mileage_rate" ("id", "vehicle_type", "charger_type", "rate_pence_per_mile", "effective_from", "effective_to", "created_at")
SELECT gen_random_uuid(), v.vehicle_type, v.charger_type, v.rate, DATE '2024-01-01', NULL, now()
FROM (VALUES ('standard', NULL, 45), ('electric', 'home', 7), ('electric', 'public', 14))
  AS v(vehicle_type, charger_type, rate)
WHERE NOT EXISTS (SELECT 1 FROM "mileage_rate");
"#;

const UNSEED: &str = r#"
DELETE FROM "email_template" WHERE "template_type" IN ('claim_submitted', 'claim_approved', 'claim_rejected');
DELETE FROM "app_setting" WHERE "key" = 'expense_policy_disclaimer';
"#;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.get_connection().execute_unprepared(SEED).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.get_connection().execute_unprepared(UNSEED).await?;
        Ok(())
    }
}
