use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use uuid::Uuid;

use models::{azure_group_mapping, microsoft_tenant_config, user, user_sync_log, TenantSyncStatus, UserStatus};

use crate::errors::ServiceError;

/// Persistence used by directory administration and sync runs.
#[async_trait]
pub trait DirectoryRepository: Send + Sync {
    async fn get_config(&self, organization_id: Uuid) -> Result<Option<microsoft_tenant_config::Model>, ServiceError>;
    /// Insert or replace the organization's config row.
    async fn save_config(&self, config: microsoft_tenant_config::Model) -> Result<microsoft_tenant_config::Model, ServiceError>;
    async fn store_token(&self, config_id: Uuid, access_token: &str, expires_at: DateTime<FixedOffset>) -> Result<(), ServiceError>;
    async fn finish_config_sync(&self, config_id: Uuid, status: TenantSyncStatus, at: DateTime<FixedOffset>) -> Result<(), ServiceError>;

    async fn list_mappings(&self, organization_id: Uuid) -> Result<Vec<azure_group_mapping::Model>, ServiceError>;
    async fn create_mapping(&self, mapping: azure_group_mapping::Model) -> Result<azure_group_mapping::Model, ServiceError>;
    /// Returns false when nothing matched.
    async fn delete_mapping(&self, organization_id: Uuid, id: Uuid) -> Result<bool, ServiceError>;

    async fn organization_users(&self, organization_id: Uuid) -> Result<Vec<user::Model>, ServiceError>;
    async fn create_user(&self, input: user::NewUser) -> Result<user::Model, ServiceError>;
    /// Persist directory-owned fields of an existing user.
    async fn update_user(&self, user: user::Model) -> Result<(), ServiceError>;
    async fn set_user_status(&self, user_id: Uuid, status: UserStatus) -> Result<(), ServiceError>;

    async fn insert_log(&self, log: user_sync_log::Model) -> Result<user_sync_log::Model, ServiceError>;
    async fn update_log(&self, log: user_sync_log::Model) -> Result<(), ServiceError>;
    /// Most recent first.
    async fn list_logs(&self, organization_id: Uuid, limit: u64) -> Result<Vec<user_sync_log::Model>, ServiceError>;
}

pub mod mock {
    use super::*;
    use chrono::Utc;
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct MockDirectoryRepository {
        pub configs: Mutex<HashMap<Uuid, microsoft_tenant_config::Model>>,
        pub mappings: Mutex<Vec<azure_group_mapping::Model>>,
        pub users: Mutex<Vec<user::Model>>,
        pub logs: Mutex<Vec<user_sync_log::Model>>,
        /// Emails whose insert or update fails.
        pub failing_emails: Mutex<HashSet<String>>,
    }

    impl MockDirectoryRepository {
        pub fn user_by_email(&self, email: &str) -> Option<user::Model> {
            self.users.lock().unwrap().iter().find(|u| u.email == email).cloned()
        }

        pub fn config(&self, organization_id: Uuid) -> Option<microsoft_tenant_config::Model> {
            self.configs.lock().unwrap().get(&organization_id).cloned()
        }

        fn check(&self, email: &str) -> Result<(), ServiceError> {
            if self.failing_emails.lock().unwrap().contains(email) {
                return Err(ServiceError::Db(format!("write rejected for {email}")));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl DirectoryRepository for MockDirectoryRepository {
        async fn get_config(&self, organization_id: Uuid) -> Result<Option<microsoft_tenant_config::Model>, ServiceError> {
            Ok(self.config(organization_id))
        }

        async fn save_config(&self, config: microsoft_tenant_config::Model) -> Result<microsoft_tenant_config::Model, ServiceError> {
            self.configs.lock().unwrap().insert(config.organization_id, config.clone());
            Ok(config)
        }

        async fn store_token(&self, config_id: Uuid, access_token: &str, expires_at: DateTime<FixedOffset>) -> Result<(), ServiceError> {
            for c in self.configs.lock().unwrap().values_mut().filter(|c| c.id == config_id) {
                c.access_token = Some(access_token.to_string());
                c.token_expires_at = Some(expires_at);
            }
            Ok(())
        }

        async fn finish_config_sync(&self, config_id: Uuid, status: TenantSyncStatus, at: DateTime<FixedOffset>) -> Result<(), ServiceError> {
            for c in self.configs.lock().unwrap().values_mut().filter(|c| c.id == config_id) {
                c.sync_status = status.as_str().to_string();
                c.last_sync_at = Some(at);
            }
            Ok(())
        }

        async fn list_mappings(&self, organization_id: Uuid) -> Result<Vec<azure_group_mapping::Model>, ServiceError> {
            Ok(self.mappings.lock().unwrap().iter().filter(|m| m.organization_id == organization_id).cloned().collect())
        }

        async fn create_mapping(&self, mapping: azure_group_mapping::Model) -> Result<azure_group_mapping::Model, ServiceError> {
            self.mappings.lock().unwrap().push(mapping.clone());
            Ok(mapping)
        }

        async fn delete_mapping(&self, organization_id: Uuid, id: Uuid) -> Result<bool, ServiceError> {
            let mut maps = self.mappings.lock().unwrap();
            let before = maps.len();
            maps.retain(|m| !(m.id == id && m.organization_id == organization_id));
            Ok(maps.len() != before)
        }

        async fn organization_users(&self, organization_id: Uuid) -> Result<Vec<user::Model>, ServiceError> {
            Ok(self.users.lock().unwrap().iter().filter(|u| u.organization_id == organization_id).cloned().collect())
        }

        async fn create_user(&self, input: user::NewUser) -> Result<user::Model, ServiceError> {
            let email = input.email.trim().to_lowercase();
            self.check(&email)?;
            let now = Utc::now().into();
            let u = user::Model {
                id: Uuid::new_v4(),
                organization_id: input.organization_id,
                email,
                full_name: input.full_name,
                role: input.role.as_str().into(),
                vehicle_type: input.vehicle_type.as_str().into(),
                charger_type: input.charger_type.map(|c| c.as_str().into()),
                status: UserStatus::Active.as_str().into(),
                microsoft_user_id: input.microsoft_user_id,
                azure_upn: input.azure_upn,
                sync_source: input.sync_source.as_str().into(),
                department: input.department,
                job_title: input.job_title,
                last_synced_at: Some(now),
                created_at: now,
                updated_at: now,
                deleted_at: None,
            };
            self.users.lock().unwrap().push(u.clone());
            Ok(u)
        }

        async fn update_user(&self, user: user::Model) -> Result<(), ServiceError> {
            self.check(&user.email)?;
            let mut users = self.users.lock().unwrap();
            match users.iter_mut().find(|u| u.id == user.id) {
                Some(slot) => {
                    *slot = user;
                    Ok(())
                }
                None => Err(ServiceError::not_found("user")),
            }
        }

        async fn set_user_status(&self, user_id: Uuid, status: UserStatus) -> Result<(), ServiceError> {
            if let Some(u) = self.users.lock().unwrap().iter_mut().find(|u| u.id == user_id) {
                u.status = status.as_str().into();
            }
            Ok(())
        }

        async fn insert_log(&self, log: user_sync_log::Model) -> Result<user_sync_log::Model, ServiceError> {
            self.logs.lock().unwrap().push(log.clone());
            Ok(log)
        }

        async fn update_log(&self, log: user_sync_log::Model) -> Result<(), ServiceError> {
            if let Some(slot) = self.logs.lock().unwrap().iter_mut().find(|l| l.id == log.id) {
                *slot = log;
            }
            Ok(())
        }

        async fn list_logs(&self, organization_id: Uuid, limit: u64) -> Result<Vec<user_sync_log::Model>, ServiceError> {
            let mut logs: Vec<_> = self.logs.lock().unwrap().iter().filter(|l| l.organization_id == organization_id).cloned().collect();
            logs.sort_by(|a, b| b.started_at.cmp(&a.started_at));
            logs.truncate(limit as usize);
            Ok(logs)
        }
    }
}
