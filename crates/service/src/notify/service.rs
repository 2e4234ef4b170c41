use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use common::metrics::EMAILS_LOGGED_TOTAL;
use models::{email_log, email_template, ClaimStatus, TemplateType};

use super::repository::NotificationRepository;
use super::template::{render, RenderContext};
use crate::actor::Actor;
use crate::errors::ServiceError;
use crate::pagination::{Page, Pagination};

#[derive(Debug, Clone, Deserialize)]
pub struct SendRequest {
    pub template_type: TemplateType,
    pub claim_id: Uuid,
    pub recipient_email: String,
    #[serde(default)]
    pub recipient_name: Option<String>,
    #[serde(default)]
    pub reviewer_name: Option<String>,
    #[serde(default)]
    pub review_notes: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RenderedEmail {
    pub recipient_email: String,
    pub template_type: TemplateType,
    pub subject: String,
    pub body: String,
}

#[derive(Clone)]
pub struct NotificationService {
    repo: Arc<dyn NotificationRepository>,
}

impl NotificationService {
    pub fn new(repo: Arc<dyn NotificationRepository>) -> Self {
        Self { repo }
    }

    /// Render a template for a claim of the caller's organization and record it as sent.
    #[instrument(skip(self, actor, req), fields(template = %req.template_type, claim_id = %req.claim_id))]
    pub async fn send(&self, actor: &Actor, req: SendRequest) -> Result<RenderedEmail, ServiceError> {
        actor.require_reviewer()?;
        let found = self.repo.load_claim(req.claim_id).await?.ok_or_else(|| ServiceError::not_found("claim"))?;
        let owner = self.repo.find_user(found.claim.user_id).await?;
        // 跨组织的报销单一律视为不存在
        if owner.map(|u| u.organization_id) != Some(actor.organization_id) {
            return Err(ServiceError::not_found("claim"));
        }
        self.deliver(req).await
    }

    async fn deliver(&self, req: SendRequest) -> Result<RenderedEmail, ServiceError> {
        let recipient = req.recipient_email.trim().to_string();
        if recipient.is_empty() {
            return Err(ServiceError::Validation("recipient email is required".into()));
        }
        let template = self
            .repo
            .find_template(req.template_type)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("template not found: {}", req.template_type)))?;
        let found = self.repo.load_claim(req.claim_id).await?.ok_or_else(|| ServiceError::not_found("claim"))?;

        let ctx = RenderContext {
            claimant_name: found.claim.claimant_name.clone(),
            claim_description: found.claim.description.clone(),
            claim_amount_pence: found.total_pence,
            claim_start_date: Some(found.claim.start_date),
            claim_end_date: Some(found.claim.end_date),
            claim_status: found.claim.status.clone(),
            recipient_name: req.recipient_name,
            reviewer_name: req.reviewer_name,
            review_notes: req.review_notes,
        };
        let rendered = render(&template.subject, &template.body, &ctx);
        info!(to = %recipient, subject = %rendered.subject, body = %rendered.body, "email notification");

        let log = email_log::Model {
            id: Uuid::new_v4(),
            recipient_email: recipient.clone(),
            template_type: req.template_type.as_str().into(),
            subject: rendered.subject.clone(),
            body: rendered.body.clone(),
            claim_id: Some(req.claim_id),
            status: email_log::STATUS_SENT.into(),
            created_at: Utc::now().into(),
        };
        if let Err(e) = self.repo.insert_log(log).await {
            warn!(error = %e, "failed to record email log");
        }
        EMAILS_LOGGED_TOTAL.with_label_values(&[req.template_type.as_str()]).inc();

        Ok(RenderedEmail { recipient_email: recipient, template_type: req.template_type, subject: rendered.subject, body: rendered.body })
    }

    pub async fn list_templates(&self) -> Result<Vec<email_template::Model>, ServiceError> {
        self.repo.list_templates().await
    }

    pub async fn update_template(&self, kind: TemplateType, subject: &str, body: &str) -> Result<email_template::Model, ServiceError> {
        if subject.trim().is_empty() || body.trim().is_empty() {
            return Err(ServiceError::Validation("subject and body are required".into()));
        }
        self.repo.save_template(kind, subject.trim(), body).await
    }

    pub async fn list_email_logs(&self, organization_id: Uuid, page: Pagination) -> Result<Page<email_log::Model>, ServiceError> {
        self.repo.list_logs(organization_id, page).await
    }

    /// Tell the organization's reviewers that a claim is waiting.
    pub async fn claim_submitted(&self, claim_id: Uuid) {
        if let Err(e) = self.notify_reviewers(claim_id).await {
            warn!(%claim_id, error = %e, "submission notification failed");
        }
    }

    /// Tell the claimant how their claim was reviewed.
    pub async fn claim_reviewed(&self, claim_id: Uuid) {
        if let Err(e) = self.notify_claimant(claim_id).await {
            warn!(%claim_id, error = %e, "review notification failed");
        }
    }

    async fn notify_reviewers(&self, claim_id: Uuid) -> Result<(), ServiceError> {
        let found = self.repo.load_claim(claim_id).await?.ok_or_else(|| ServiceError::not_found("claim"))?;
        let owner = self.repo.find_user(found.claim.user_id).await?.ok_or_else(|| ServiceError::not_found("user"))?;
        for reviewer in self.repo.reviewers(owner.organization_id).await?.into_iter().filter(|r| r.id != owner.id) {
            self.deliver(SendRequest {
                template_type: TemplateType::ClaimSubmitted,
                claim_id,
                recipient_email: reviewer.email,
                recipient_name: Some(reviewer.full_name),
                reviewer_name: None,
                review_notes: None,
            })
            .await?;
        }
        Ok(())
    }

    async fn notify_claimant(&self, claim_id: Uuid) -> Result<(), ServiceError> {
        let found = self.repo.load_claim(claim_id).await?.ok_or_else(|| ServiceError::not_found("claim"))?;
        let template_type = match found.claim.status() {
            ClaimStatus::Approved => TemplateType::ClaimApproved,
            ClaimStatus::Rejected => TemplateType::ClaimRejected,
            other => return Err(ServiceError::InvalidState(format!("claim is {other}, not reviewed"))),
        };
        let owner = self.repo.find_user(found.claim.user_id).await?.ok_or_else(|| ServiceError::not_found("user"))?;
        let reviewer_name = match found.claim.reviewed_by {
            Some(id) => self.repo.find_user(id).await?.map(|u| u.full_name),
            None => None,
        };
        self.deliver(SendRequest {
            template_type,
            claim_id,
            recipient_email: owner.email,
            recipient_name: Some(owner.full_name),
            reviewer_name,
            review_notes: Some(found.claim.review_notes.clone()).filter(|n| !n.is_empty()),
        })
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::repository::mock::MockNotificationRepository;
    use crate::notify::repository::ClaimWithTotal;
    use chrono::NaiveDate;
    use models::{expense_claim, Role};

    struct Harness {
        svc: NotificationService,
        repo: Arc<MockNotificationRepository>,
        org: Uuid,
    }

    async fn harness() -> Harness {
        let repo = Arc::new(MockNotificationRepository::default());
        let svc = NotificationService::new(repo.clone());
        svc.update_template(TemplateType::ClaimSubmitted, "New claim from {{claimant_name}}", "Hi {{recipient_name}}, £{{claim_amount}} awaits review.")
            .await
            .unwrap();
        svc.update_template(TemplateType::ClaimApproved, "Claim approved", "Hi {{recipient_name}}, {{reviewer_name}} approved {{claim_start_date}}. {{review_notes}}")
            .await
            .unwrap();
        svc.update_template(TemplateType::ClaimRejected, "Claim rejected", "Reason: {{review_notes}}").await.unwrap();
        Harness { svc, repo, org: Uuid::new_v4() }
    }

    fn reviewer_of(org: Uuid) -> Actor {
        Actor { user_id: Uuid::new_v4(), organization_id: org, role: Role::Approver }
    }

    fn add_claim(h: &Harness, owner: Uuid, status: ClaimStatus, reviewer: Option<Uuid>, notes: &str) -> Uuid {
        let now = Utc::now().into();
        let claim = expense_claim::Model {
            id: Uuid::new_v4(),
            user_id: owner,
            claimant_name: "Ann Lee".into(),
            description: "Conference".into(),
            start_date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 5, 2).unwrap(),
            is_chargeable: false,
            client_id: None,
            status: status.as_str().into(),
            submitted_at: None,
            reviewed_by: reviewer,
            reviewed_at: None,
            review_notes: notes.into(),
            xero_sync_status: "pending".into(),
            xero_bill_id: None,
            xero_synced_at: None,
            xero_sync_error: None,
            created_at: now,
            updated_at: now,
        };
        let id = claim.id;
        h.repo.claims.lock().unwrap().insert(id, ClaimWithTotal { claim, total_pence: 4_250 });
        id
    }

    #[tokio::test]
    async fn send_renders_and_logs() {
        let h = harness().await;
        let owner = h.repo.add_user(h.org, "ann@acme.test", "Ann Lee", Role::Staff);
        let claim_id = add_claim(&h, owner.id, ClaimStatus::Submitted, None, "");

        let sent = h
            .svc
            .send(&reviewer_of(h.org), SendRequest {
                template_type: TemplateType::ClaimSubmitted,
                claim_id,
                recipient_email: "boss@acme.test".into(),
                recipient_name: None,
                reviewer_name: None,
                review_notes: None,
            })
            .await
            .unwrap();
        assert_eq!(sent.subject, "New claim from Ann Lee");
        assert_eq!(sent.body, "Hi there, £42.50 awaits review.");

        let logs = h.svc.list_email_logs(h.org, Pagination::default()).await.unwrap();
        assert_eq!(logs.items.len(), 1);
        assert_eq!(logs.items[0].status, "sent");
        assert_eq!(logs.items[0].recipient_email, "boss@acme.test");
        assert!(h.svc.list_email_logs(Uuid::new_v4(), Pagination::default()).await.unwrap().items.is_empty());
    }

    #[tokio::test]
    async fn send_requires_template_and_claim() {
        let h = harness().await;
        let owner = h.repo.add_user(h.org, "ann@acme.test", "Ann Lee", Role::Staff);
        let claim_id = add_claim(&h, owner.id, ClaimStatus::Rejected, None, "");
        h.repo.templates.lock().unwrap().remove("claim_rejected");
        let req = |template_type, claim_id| SendRequest {
            template_type,
            claim_id,
            recipient_email: "x@acme.test".into(),
            recipient_name: None,
            reviewer_name: None,
            review_notes: None,
        };
        let actor = reviewer_of(h.org);
        let missing = h.svc.send(&actor, req(TemplateType::ClaimRejected, claim_id)).await.unwrap_err();
        assert!(missing.to_string().contains("template not found: claim_rejected"));
        assert!(matches!(h.svc.send(&actor, req(TemplateType::ClaimApproved, Uuid::new_v4())).await, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn send_hides_claims_of_other_organizations() {
        let h = harness().await;
        let outsider_org = Uuid::new_v4();
        let owner = h.repo.add_user(outsider_org, "ann@other.test", "Ann Lee", Role::Staff);
        let claim_id = add_claim(&h, owner.id, ClaimStatus::Submitted, None, "");
        let req = SendRequest {
            template_type: TemplateType::ClaimSubmitted,
            claim_id,
            recipient_email: "someone@acme.test".into(),
            recipient_name: None,
            reviewer_name: None,
            review_notes: None,
        };

        let err = h.svc.send(&reviewer_of(h.org), req.clone()).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
        assert!(h.repo.logs.lock().unwrap().is_empty());

        let staff = Actor { user_id: owner.id, organization_id: outsider_org, role: Role::Staff };
        assert!(matches!(h.svc.send(&staff, req.clone()).await, Err(ServiceError::Forbidden(_))));
        assert!(h.svc.send(&reviewer_of(outsider_org), req).await.is_ok());
    }

    #[tokio::test]
    async fn log_failure_does_not_fail_send() {
        let h = harness().await;
        let owner = h.repo.add_user(h.org, "ann@acme.test", "Ann Lee", Role::Staff);
        let claim_id = add_claim(&h, owner.id, ClaimStatus::Submitted, None, "");
        *h.repo.fail_log_insert.lock().unwrap() = true;
        let req = SendRequest {
            template_type: TemplateType::ClaimSubmitted,
            claim_id,
            recipient_email: "boss@acme.test".into(),
            recipient_name: Some("Boss".into()),
            reviewer_name: None,
            review_notes: None,
        };
        assert!(h.svc.send(&reviewer_of(h.org), req).await.is_ok());
        assert!(h.repo.logs.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn submission_notifies_reviewers_only() {
        let h = harness().await;
        let owner = h.repo.add_user(h.org, "ann@acme.test", "Ann Lee", Role::Approver);
        h.repo.add_user(h.org, "raj@acme.test", "Raj", Role::Approver);
        h.repo.add_user(h.org, "admin@acme.test", "Ada", Role::Admin);
        h.repo.add_user(h.org, "sam@acme.test", "Sam", Role::Staff);
        h.repo.add_user(Uuid::new_v4(), "other@else.test", "Other", Role::Admin);
        let claim_id = add_claim(&h, owner.id, ClaimStatus::Submitted, None, "");

        h.svc.claim_submitted(claim_id).await;
        let mut to: Vec<_> = h.repo.logs.lock().unwrap().iter().map(|l| l.recipient_email.clone()).collect();
        to.sort();
        assert_eq!(to, ["admin@acme.test", "raj@acme.test"]);
        assert!(h.repo.logs.lock().unwrap().iter().all(|l| l.template_type == "claim_submitted"));
    }

    #[tokio::test]
    async fn review_notifies_claimant_with_reviewer_details() {
        let h = harness().await;
        let owner = h.repo.add_user(h.org, "ann@acme.test", "Ann Lee", Role::Staff);
        let raj = h.repo.add_user(h.org, "raj@acme.test", "Raj", Role::Approver);
        let approved = add_claim(&h, owner.id, ClaimStatus::Approved, Some(raj.id), "Thanks");
        let rejected = add_claim(&h, owner.id, ClaimStatus::Rejected, Some(raj.id), "No receipt");
        let draft = add_claim(&h, owner.id, ClaimStatus::Draft, None, "");

        h.svc.claim_reviewed(approved).await;
        h.svc.claim_reviewed(rejected).await;
        h.svc.claim_reviewed(draft).await;

        let logs = h.repo.logs.lock().unwrap();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].recipient_email, "ann@acme.test");
        assert_eq!(logs[0].template_type, "claim_approved");
        assert_eq!(logs[0].body, "Hi Ann Lee, Raj approved 01/05/2024. Thanks");
        assert_eq!(logs[1].body, "Reason: No receipt");
    }

    #[tokio::test]
    async fn template_update_validates() {
        let h = harness().await;
        assert!(h.svc.update_template(TemplateType::ClaimApproved, " ", "body").await.is_err());
        let t = h.svc.update_template(TemplateType::ClaimApproved, "Approved!", "ok").await.unwrap();
        assert_eq!(t.subject, "Approved!");
        assert_eq!(h.svc.list_templates().await.unwrap().len(), 3);
    }
}
