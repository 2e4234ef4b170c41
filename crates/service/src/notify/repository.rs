use async_trait::async_trait;
use uuid::Uuid;

use models::{email_log, email_template, expense_claim, user, TemplateType};

use crate::errors::ServiceError;
use crate::pagination::{Page, Pagination};

/// A claim with the sum of its expenses.
#[derive(Debug, Clone)]
pub struct ClaimWithTotal {
    pub claim: expense_claim::Model,
    pub total_pence: i64,
}

#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn find_template(&self, kind: TemplateType) -> Result<Option<email_template::Model>, ServiceError>;
    async fn list_templates(&self) -> Result<Vec<email_template::Model>, ServiceError>;
    /// Insert or replace the template of the given type.
    async fn save_template(&self, kind: TemplateType, subject: &str, body: &str) -> Result<email_template::Model, ServiceError>;
    async fn load_claim(&self, claim_id: Uuid) -> Result<Option<ClaimWithTotal>, ServiceError>;
    async fn find_user(&self, user_id: Uuid) -> Result<Option<user::Model>, ServiceError>;
    /// Active approvers and admins of the organization.
    async fn reviewers(&self, organization_id: Uuid) -> Result<Vec<user::Model>, ServiceError>;
    async fn insert_log(&self, log: email_log::Model) -> Result<(), ServiceError>;
    /// Logs for claims of the organization, newest first.
    async fn list_logs(&self, organization_id: Uuid, page: Pagination) -> Result<Page<email_log::Model>, ServiceError>;
}

pub mod mock {
    use super::*;
    use chrono::Utc;
    use std::collections::HashMap;
    use std::sync::Mutex;

    use models::{ClaimStatus, Role};

    #[derive(Default)]
    pub struct MockNotificationRepository {
        pub templates: Mutex<HashMap<String, email_template::Model>>,
        pub claims: Mutex<HashMap<Uuid, ClaimWithTotal>>,
        pub users: Mutex<Vec<user::Model>>,
        pub logs: Mutex<Vec<email_log::Model>>,
        pub fail_log_insert: Mutex<bool>,
    }

    #[async_trait]
    impl NotificationRepository for MockNotificationRepository {
        async fn find_template(&self, kind: TemplateType) -> Result<Option<email_template::Model>, ServiceError> {
            Ok(self.templates.lock().unwrap().get(kind.as_str()).cloned())
        }

        async fn list_templates(&self) -> Result<Vec<email_template::Model>, ServiceError> {
            let mut all: Vec<_> = self.templates.lock().unwrap().values().cloned().collect();
            all.sort_by(|a, b| a.template_type.cmp(&b.template_type));
            Ok(all)
        }

        async fn save_template(&self, kind: TemplateType, subject: &str, body: &str) -> Result<email_template::Model, ServiceError> {
            let mut templates = self.templates.lock().unwrap();
            let t = templates.entry(kind.as_str().to_string()).or_insert_with(|| email_template::Model {
                id: Uuid::new_v4(),
                template_type: kind.as_str().into(),
                subject: String::new(),
                body: String::new(),
                updated_at: Utc::now().into(),
            });
            t.subject = subject.into();
            t.body = body.into();
            t.updated_at = Utc::now().into();
            Ok(t.clone())
        }

        async fn load_claim(&self, claim_id: Uuid) -> Result<Option<ClaimWithTotal>, ServiceError> {
            Ok(self.claims.lock().unwrap().get(&claim_id).cloned())
        }

        async fn find_user(&self, user_id: Uuid) -> Result<Option<user::Model>, ServiceError> {
            Ok(self.users.lock().unwrap().iter().find(|u| u.id == user_id).cloned())
        }

        async fn reviewers(&self, organization_id: Uuid) -> Result<Vec<user::Model>, ServiceError> {
            Ok(self
                .users
                .lock()
                .unwrap()
                .iter()
                .filter(|u| u.organization_id == organization_id && u.is_active() && u.role().can_review())
                .cloned()
                .collect())
        }

        async fn insert_log(&self, log: email_log::Model) -> Result<(), ServiceError> {
            if *self.fail_log_insert.lock().unwrap() {
                return Err(ServiceError::Db("email_log unavailable".into()));
            }
            self.logs.lock().unwrap().push(log);
            Ok(())
        }

        async fn list_logs(&self, organization_id: Uuid, page: Pagination) -> Result<Page<email_log::Model>, ServiceError> {
            let (idx, per) = page.normalize();
            let claims = self.claims.lock().unwrap();
            let users = self.users.lock().unwrap();
            let in_org = |claim_id: Option<Uuid>| {
                claim_id
                    .and_then(|id| claims.get(&id))
                    .and_then(|c| users.iter().find(|u| u.id == c.claim.user_id))
                    .map_or(false, |u| u.organization_id == organization_id)
            };
            let mut logs: Vec<_> = self.logs.lock().unwrap().iter().filter(|l| in_org(l.claim_id)).cloned().collect();
            logs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            let items = logs.into_iter().skip((idx * per) as usize).take(per as usize).collect();
            Ok(Page { page: idx as u32 + 1, per_page: per as u32, items })
        }
    }

    impl MockNotificationRepository {
        /// Store a claim owned by `user_id` with a fixed total.
        pub fn add_claim(&self, user_id: Uuid, status: ClaimStatus, total_pence: i64) -> Uuid {
            let now = Utc::now().into();
            let day = chrono::NaiveDate::from_ymd_opt(2024, 5, 1).unwrap_or_default();
            let claim = expense_claim::Model {
                id: Uuid::new_v4(),
                user_id,
                claimant_name: "Claimant".into(),
                description: "Travel".into(),
                start_date: day,
                end_date: day,
                is_chargeable: false,
                client_id: None,
                status: status.as_str().into(),
                submitted_at: None,
                reviewed_by: None,
                reviewed_at: None,
                review_notes: String::new(),
                xero_sync_status: "pending".into(),
                xero_bill_id: None,
                xero_synced_at: None,
                xero_sync_error: None,
                created_at: now,
                updated_at: now,
            };
            let id = claim.id;
            self.claims.lock().unwrap().insert(id, ClaimWithTotal { claim, total_pence });
            id
        }

        pub fn add_user(&self, organization_id: Uuid, email: &str, name: &str, role: Role) -> user::Model {
            let now = Utc::now().into();
            let u = user::Model {
                id: Uuid::new_v4(),
                organization_id,
                email: email.into(),
                full_name: name.into(),
                role: role.as_str().into(),
                vehicle_type: "standard".into(),
                charger_type: None,
                status: "active".into(),
                microsoft_user_id: None,
                azure_upn: None,
                sync_source: "local".into(),
                department: None,
                job_title: None,
                last_synced_at: None,
                created_at: now,
                updated_at: now,
                deleted_at: None,
            };
            self.users.lock().unwrap().push(u.clone());
            u
        }
    }
}
