use async_trait::async_trait;
use uuid::Uuid;

use models::{expense_claim, xero_settings};

use super::bill::BillSource;
use crate::errors::ServiceError;

/// Persistence used by the accounting sync.
#[async_trait]
pub trait XeroRepository: Send + Sync {
    /// The single settings row, if one was ever saved.
    async fn load_settings(&self) -> Result<Option<xero_settings::Model>, ServiceError>;
    /// Insert or replace the settings row keyed by its id.
    async fn store_settings(&self, settings: xero_settings::Model) -> Result<xero_settings::Model, ServiceError>;
    /// The claim, only when its owner belongs to `organization_id`.
    async fn load_claim(&self, organization_id: Uuid, claim_id: Uuid) -> Result<Option<expense_claim::Model>, ServiceError>;
    /// Expenses of a claim with their category account codes, oldest first.
    async fn load_bill_lines(&self, claim_id: Uuid) -> Result<Vec<BillSource>, ServiceError>;
    /// `approved` and not `synced`/`syncing` -> `syncing`. Returns false when
    /// another caller won or the claim is not eligible.
    async fn begin_sync(&self, claim_id: Uuid) -> Result<bool, ServiceError>;
    async fn mark_synced(&self, claim_id: Uuid, bill_id: &str) -> Result<(), ServiceError>;
    async fn mark_failed(&self, claim_id: Uuid, error: &str) -> Result<(), ServiceError>;
}

pub mod mock {
    use super::*;
    use chrono::Utc;
    use std::collections::HashMap;
    use std::sync::Mutex;

    use models::{ClaimStatus, XeroSyncStatus};

    #[derive(Default)]
    pub struct MockXeroRepository {
        pub settings: Mutex<Option<xero_settings::Model>>,
        pub claims: Mutex<HashMap<Uuid, expense_claim::Model>>,
        pub lines: Mutex<HashMap<Uuid, Vec<BillSource>>>,
        /// claim id -> owner's organization
        pub claim_orgs: Mutex<HashMap<Uuid, Uuid>>,
    }

    impl MockXeroRepository {
        pub fn add_claim(&self, organization_id: Uuid, claim: expense_claim::Model, lines: Vec<BillSource>) {
            self.claim_orgs.lock().unwrap().insert(claim.id, organization_id);
            self.lines.lock().unwrap().insert(claim.id, lines);
            self.claims.lock().unwrap().insert(claim.id, claim);
        }

        pub fn claim(&self, id: Uuid) -> Option<expense_claim::Model> {
            self.claims.lock().unwrap().get(&id).cloned()
        }
    }

    #[async_trait]
    impl XeroRepository for MockXeroRepository {
        async fn load_settings(&self) -> Result<Option<xero_settings::Model>, ServiceError> {
            Ok(self.settings.lock().unwrap().clone())
        }

        async fn store_settings(&self, settings: xero_settings::Model) -> Result<xero_settings::Model, ServiceError> {
            *self.settings.lock().unwrap() = Some(settings.clone());
            Ok(settings)
        }

        async fn load_claim(&self, organization_id: Uuid, claim_id: Uuid) -> Result<Option<expense_claim::Model>, ServiceError> {
            let in_org = self.claim_orgs.lock().unwrap().get(&claim_id) == Some(&organization_id);
            Ok(self.claim(claim_id).filter(|_| in_org))
        }

        async fn load_bill_lines(&self, claim_id: Uuid) -> Result<Vec<BillSource>, ServiceError> {
            Ok(self.lines.lock().unwrap().get(&claim_id).cloned().unwrap_or_default())
        }

        async fn begin_sync(&self, claim_id: Uuid) -> Result<bool, ServiceError> {
            let mut claims = self.claims.lock().unwrap();
            let Some(c) = claims.get_mut(&claim_id) else { return Ok(false) };
            let eligible = c.status() == ClaimStatus::Approved
                && !matches!(c.sync_status(), XeroSyncStatus::Synced | XeroSyncStatus::Syncing);
            if eligible {
                c.xero_sync_status = XeroSyncStatus::Syncing.as_str().to_string();
            }
            Ok(eligible)
        }

        async fn mark_synced(&self, claim_id: Uuid, bill_id: &str) -> Result<(), ServiceError> {
            if let Some(c) = self.claims.lock().unwrap().get_mut(&claim_id) {
                c.xero_sync_status = XeroSyncStatus::Synced.as_str().to_string();
                c.xero_bill_id = Some(bill_id.to_string());
                c.xero_synced_at = Some(Utc::now().into());
                c.xero_sync_error = None;
            }
            Ok(())
        }

        async fn mark_failed(&self, claim_id: Uuid, error: &str) -> Result<(), ServiceError> {
            if let Some(c) = self.claims.lock().unwrap().get_mut(&claim_id) {
                c.xero_sync_status = XeroSyncStatus::Failed.as_str().to_string();
                c.xero_sync_error = Some(error.to_string());
            }
            Ok(())
        }
    }
}
