use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use common::metrics::{DIRECTORY_SYNC_RUNS_TOTAL, DIRECTORY_USERS_TOTAL};
use models::{
    azure_group_mapping, microsoft_tenant_config, user, user_sync_log, Role, SyncLogStatus, SyncSource, SyncType,
    TenantSyncStatus, UserStatus, VehicleType,
};

use super::api::{GraphApi, GraphUser};
use super::repository::DirectoryRepository;
use super::roles::resolve_role;
use crate::errors::ServiceError;

#[derive(Debug, Clone, Deserialize)]
pub struct ConfigInput {
    pub tenant_id: String,
    pub client_id: String,
    /// Empty or missing keeps the stored secret.
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub is_enabled: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConfigView {
    #[serde(flatten)]
    pub config: microsoft_tenant_config::Model,
    pub has_client_secret: bool,
}

impl From<microsoft_tenant_config::Model> for ConfigView {
    fn from(config: microsoft_tenant_config::Model) -> Self {
        let has_client_secret = !config.client_secret.is_empty();
        Self { config, has_client_secret }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MappingInput {
    pub azure_group_id: String,
    pub azure_group_name: String,
    pub application_role: Role,
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncSummary {
    pub log_id: Uuid,
    pub status: SyncLogStatus,
    pub users_created: i32,
    pub users_updated: i32,
    pub users_deactivated: i32,
    pub errors: Vec<String>,
}

enum Outcome {
    Created,
    Updated,
    Deactivated,
    Skipped,
}

#[derive(Clone)]
pub struct DirectoryService {
    repo: Arc<dyn DirectoryRepository>,
    api: Arc<dyn GraphApi>,
}

impl DirectoryService {
    pub fn new(repo: Arc<dyn DirectoryRepository>, api: Arc<dyn GraphApi>) -> Self {
        Self { repo, api }
    }

    pub async fn get_config(&self, organization_id: Uuid) -> Result<Option<ConfigView>, ServiceError> {
        Ok(self.repo.get_config(organization_id).await?.map(ConfigView::from))
    }

    #[instrument(skip(self, input), fields(tenant = %input.tenant_id))]
    pub async fn save_config(&self, organization_id: Uuid, input: ConfigInput) -> Result<ConfigView, ServiceError> {
        let tenant_id = input.tenant_id.trim().to_string();
        let client_id = input.client_id.trim().to_string();
        if tenant_id.is_empty() || client_id.is_empty() {
            return Err(ServiceError::Validation("tenant id and client id are required".into()));
        }
        let now = Utc::now().into();
        let mut c = self.repo.get_config(organization_id).await?.unwrap_or_else(|| microsoft_tenant_config::Model {
            id: Uuid::new_v4(),
            organization_id,
            tenant_id: String::new(),
            client_id: String::new(),
            client_secret: String::new(),
            access_token: None,
            token_expires_at: None,
            last_sync_at: None,
            sync_status: TenantSyncStatus::Pending.as_str().into(),
            is_enabled: true,
            created_at: now,
            updated_at: now,
        });
        if c.tenant_id != tenant_id || c.client_id != client_id {
            c.access_token = None;
            c.token_expires_at = None;
        }
        c.tenant_id = tenant_id;
        c.client_id = client_id;
        if let Some(secret) = input.client_secret.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()) {
            c.client_secret = secret;
        }
        if c.client_secret.is_empty() {
            return Err(ServiceError::Validation("client secret is required".into()));
        }
        if let Some(enabled) = input.is_enabled {
            c.is_enabled = enabled;
        }
        Ok(self.repo.save_config(c).await?.into())
    }

    pub async fn set_enabled(&self, organization_id: Uuid, enabled: bool) -> Result<ConfigView, ServiceError> {
        let mut c = self
            .repo
            .get_config(organization_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("directory config"))?;
        c.is_enabled = enabled;
        Ok(self.repo.save_config(c).await?.into())
    }

    pub async fn list_mappings(&self, organization_id: Uuid) -> Result<Vec<azure_group_mapping::Model>, ServiceError> {
        self.repo.list_mappings(organization_id).await
    }

    pub async fn create_mapping(&self, organization_id: Uuid, input: MappingInput) -> Result<azure_group_mapping::Model, ServiceError> {
        let group_id = input.azure_group_id.trim().to_string();
        if group_id.is_empty() {
            return Err(ServiceError::Validation("group id is required".into()));
        }
        let existing = self.repo.list_mappings(organization_id).await?;
        if existing.iter().any(|m| m.azure_group_id == group_id) {
            return Err(ServiceError::Conflict("group is already mapped".into()));
        }
        let now = Utc::now().into();
        self.repo
            .create_mapping(azure_group_mapping::Model {
                id: Uuid::new_v4(),
                organization_id,
                azure_group_id: group_id,
                azure_group_name: input.azure_group_name.trim().to_string(),
                application_role: input.application_role.as_str().into(),
                is_active: true,
                created_at: now,
                updated_at: now,
            })
            .await
    }

    pub async fn delete_mapping(&self, organization_id: Uuid, id: Uuid) -> Result<(), ServiceError> {
        if self.repo.delete_mapping(organization_id, id).await? {
            Ok(())
        } else {
            Err(ServiceError::not_found("group mapping"))
        }
    }

    pub async fn list_sync_logs(&self, organization_id: Uuid, limit: u64) -> Result<Vec<user_sync_log::Model>, ServiceError> {
        self.repo.list_logs(organization_id, limit.clamp(1, 100)).await
    }

    /// Import the tenant's users into the organization. Every run leaves a
    /// closed log row behind, whatever the outcome.
    #[instrument(skip(self))]
    pub async fn sync_organization(&self, organization_id: Uuid, sync_type: SyncType) -> Result<SyncSummary, ServiceError> {
        let mut log = self
            .repo
            .insert_log(user_sync_log::Model {
                id: Uuid::new_v4(),
                organization_id,
                sync_type: sync_type.as_str().into(),
                status: SyncLogStatus::Running.as_str().into(),
                users_created: 0,
                users_updated: 0,
                users_deactivated: 0,
                errors: None,
                started_at: Utc::now().into(),
                completed_at: None,
            })
            .await?;

        let config = match self.repo.get_config(organization_id).await? {
            Some(c) if c.is_enabled => c,
            _ => {
                self.fail_log(&mut log, "directory configuration not found or disabled").await;
                return Err(ServiceError::not_found("directory config"));
            }
        };

        match self.run(organization_id, &config, &mut log).await {
            Ok(summary) => Ok(summary),
            Err(e) => {
                warn!(error = %e, "directory sync aborted");
                self.fail_log(&mut log, &e.to_string()).await;
                if let Err(e) = self.repo.finish_config_sync(config.id, TenantSyncStatus::Failed, Utc::now().into()).await {
                    warn!(error = %e, "could not record tenant sync status");
                }
                Err(e)
            }
        }
    }

    async fn fail_log(&self, log: &mut user_sync_log::Model, message: &str) {
        log.status = SyncLogStatus::Failed.as_str().into();
        log.completed_at = Some(Utc::now().into());
        log.errors = Some(json!([{ "message": message }]));
        DIRECTORY_SYNC_RUNS_TOTAL.with_label_values(&[SyncLogStatus::Failed.as_str()]).inc();
        if let Err(e) = self.repo.update_log(log.clone()).await {
            warn!(error = %e, "could not close sync log");
        }
    }

    async fn run(
        &self,
        organization_id: Uuid,
        config: &microsoft_tenant_config::Model,
        log: &mut user_sync_log::Model,
    ) -> Result<SyncSummary, ServiceError> {
        let token = self
            .api
            .client_credentials_token(&config.tenant_id, &config.client_id, &config.client_secret)
            .await?;
        let expires_at = (Utc::now() + Duration::seconds(token.expires_in)).into();
        self.repo.store_token(config.id, &token.access_token, expires_at).await?;

        let remote = self.api.list_users(&token.access_token).await?;
        let existing = self.repo.organization_users(organization_id).await?;
        let mappings: Vec<_> = self.repo.list_mappings(organization_id).await?.into_iter().filter(|m| m.is_active).collect();
        info!(remote = remote.len(), local = existing.len(), mappings = mappings.len(), "directory sync started");

        let mut by_ms_id = HashMap::new();
        let mut by_email = HashMap::new();
        for u in existing {
            if let Some(ms) = u.microsoft_user_id.clone() {
                by_ms_id.insert(ms, u.clone());
            }
            by_email.insert(u.email.clone(), u);
        }

        let (mut created, mut updated, mut deactivated) = (0, 0, 0);
        let mut errors = Vec::new();
        for remote_user in &remote {
            let found = by_ms_id
                .get(&remote_user.id)
                .or_else(|| remote_user.email().and_then(|e| by_email.get(&e)))
                .cloned();
            match self.sync_user(organization_id, &token.access_token, remote_user, found, &mappings).await {
                Ok(Outcome::Created) => created += 1,
                Ok(Outcome::Updated) => updated += 1,
                Ok(Outcome::Deactivated) => deactivated += 1,
                Ok(Outcome::Skipped) => {}
                Err(e) => errors.push(format!("{}: {}", remote_user.name(), e)),
            }
        }
        DIRECTORY_USERS_TOTAL.with_label_values(&["created"]).inc_by(created as u64);
        DIRECTORY_USERS_TOTAL.with_label_values(&["updated"]).inc_by(updated as u64);
        DIRECTORY_USERS_TOTAL.with_label_values(&["deactivated"]).inc_by(deactivated as u64);

        let finished = Utc::now().into();
        let tenant_status = if errors.is_empty() { TenantSyncStatus::Active } else { TenantSyncStatus::Failed };
        self.repo.finish_config_sync(config.id, tenant_status, finished).await?;

        let status = if errors.is_empty() { SyncLogStatus::Success } else { SyncLogStatus::Partial };
        log.status = status.as_str().into();
        log.users_created = created;
        log.users_updated = updated;
        log.users_deactivated = deactivated;
        log.completed_at = Some(finished);
        log.errors = if errors.is_empty() {
            None
        } else {
            Some(serde_json::Value::Array(errors.iter().map(|m| json!({ "message": m })).collect()))
        };
        self.repo.update_log(log.clone()).await?;
        DIRECTORY_SYNC_RUNS_TOTAL.with_label_values(&[status.as_str()]).inc();
        info!(created, updated, deactivated, failed = errors.len(), "directory sync finished");

        Ok(SyncSummary {
            log_id: log.id,
            status,
            users_created: created,
            users_updated: updated,
            users_deactivated: deactivated,
            errors,
        })
    }

    async fn sync_user(
        &self,
        organization_id: Uuid,
        token: &str,
        remote: &GraphUser,
        local: Option<user::Model>,
        mappings: &[azure_group_mapping::Model],
    ) -> Result<Outcome, ServiceError> {
        if !remote.account_enabled {
            return match local {
                Some(u) if u.status != UserStatus::Inactive.as_str() => {
                    self.repo.set_user_status(u.id, UserStatus::Inactive).await?;
                    Ok(Outcome::Deactivated)
                }
                _ => Ok(Outcome::Skipped),
            };
        }
        let email = remote
            .email()
            .ok_or_else(|| ServiceError::Validation("directory user has no email address".into()))?;

        let role = if mappings.is_empty() {
            Role::Staff
        } else {
            match self.api.user_groups(token, &remote.id).await {
                Ok(groups) => {
                    let ids: Vec<String> = groups.into_iter().map(|g| g.id).collect();
                    resolve_role(&ids, mappings)
                }
                Err(e) => {
                    warn!(user = %remote.id, error = %e, "group lookup failed; using staff");
                    Role::Staff
                }
            }
        };

        match local {
            Some(mut u) => {
                let linked_by_email = u.microsoft_user_id.as_deref() != Some(remote.id.as_str());
                if linked_by_email || u.sync_source == SyncSource::Local.as_str() {
                    u.sync_source = SyncSource::Both.as_str().into();
                }
                u.email = email;
                u.full_name = remote.name();
                u.role = role.as_str().into();
                u.status = UserStatus::Active.as_str().into();
                u.microsoft_user_id = Some(remote.id.clone());
                u.azure_upn = remote.user_principal_name.clone();
                u.department = remote.department.clone();
                u.job_title = remote.job_title.clone();
                u.last_synced_at = Some(Utc::now().into());
                self.repo.update_user(u).await?;
                Ok(Outcome::Updated)
            }
            None => {
                self.repo
                    .create_user(user::NewUser {
                        organization_id,
                        email,
                        full_name: remote.name(),
                        role,
                        vehicle_type: VehicleType::Standard,
                        charger_type: None,
                        sync_source: SyncSource::Microsoft,
                        microsoft_user_id: Some(remote.id.clone()),
                        azure_upn: remote.user_principal_name.clone(),
                        department: remote.department.clone(),
                        job_title: remote.job_title.clone(),
                    })
                    .await?;
                Ok(Outcome::Created)
            }
        }
    }
}
