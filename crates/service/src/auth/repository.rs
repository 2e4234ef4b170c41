use async_trait::async_trait;
use uuid::Uuid;

use super::domain::{AuthUser, Credentials};
use super::errors::AuthError;

/// Repository abstraction for auth-related persistence.
#[async_trait]
pub trait AuthRepository: Send + Sync {
    /// Emails are unique across organizations and compared lowercased.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<AuthUser>, AuthError>;
    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<AuthUser>, AuthError>;
    /// Create the organization row when registering against an unknown id.
    async fn ensure_organization(&self, organization_id: Uuid) -> Result<(), AuthError>;
    async fn create_user(&self, organization_id: Uuid, email: &str, full_name: &str) -> Result<AuthUser, AuthError>;

    async fn get_credentials(&self, user_id: Uuid) -> Result<Option<Credentials>, AuthError>;
    async fn upsert_password(&self, user_id: Uuid, password_hash: String, password_algorithm: String) -> Result<Credentials, AuthError>;
}

/// Simple in-memory mock repository for tests and doc examples
pub mod mock {
    use super::*;
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    use models::Role;

    #[derive(Default)]
    pub struct MockAuthRepository {
        users: Mutex<HashMap<String, AuthUser>>, // key: lowercased email
        creds: Mutex<HashMap<Uuid, Credentials>>, // key: user_id
        orgs: Mutex<HashSet<Uuid>>,
    }

    impl MockAuthRepository {
        /// Change a stored user's role or active flag.
        pub fn set_user(&self, email: &str, role: Role, active: bool) {
            if let Some(u) = self.users.lock().unwrap().get_mut(&email.to_lowercase()) {
                u.role = role;
                u.active = active;
            }
        }

        pub fn has_organization(&self, id: Uuid) -> bool {
            self.orgs.lock().unwrap().contains(&id)
        }
    }

    #[async_trait]
    impl AuthRepository for MockAuthRepository {
        async fn find_user_by_email(&self, email: &str) -> Result<Option<AuthUser>, AuthError> {
            let users = self.users.lock().unwrap();
            Ok(users.get(&email.trim().to_lowercase()).cloned())
        }

        async fn find_user_by_id(&self, id: Uuid) -> Result<Option<AuthUser>, AuthError> {
            let users = self.users.lock().unwrap();
            Ok(users.values().find(|u| u.id == id).cloned())
        }

        async fn ensure_organization(&self, organization_id: Uuid) -> Result<(), AuthError> {
            self.orgs.lock().unwrap().insert(organization_id);
            Ok(())
        }

        async fn create_user(&self, organization_id: Uuid, email: &str, full_name: &str) -> Result<AuthUser, AuthError> {
            let key = email.trim().to_lowercase();
            let mut users = self.users.lock().unwrap();
            if users.contains_key(&key) {
                return Err(AuthError::Conflict);
            }
            let user = AuthUser {
                id: Uuid::new_v4(),
                organization_id,
                email: key.clone(),
                full_name: full_name.to_string(),
                role: Role::Staff,
                active: true,
            };
            users.insert(key, user.clone());
            Ok(user)
        }

        async fn get_credentials(&self, user_id: Uuid) -> Result<Option<Credentials>, AuthError> {
            let creds = self.creds.lock().unwrap();
            Ok(creds.get(&user_id).cloned())
        }

        async fn upsert_password(&self, user_id: Uuid, password_hash: String, password_algorithm: String) -> Result<Credentials, AuthError> {
            let mut creds = self.creds.lock().unwrap();
            let c = Credentials { user_id, password_hash, password_algorithm };
            creds.insert(user_id, c.clone());
            Ok(c)
        }
    }
}
