use std::sync::Arc;

use argon2::{Argon2, password_hash::{PasswordHasher, PasswordVerifier, SaltString}, PasswordHash};
use jsonwebtoken::{decode, encode, DecodingKey, Header as JwtHeader, EncodingKey, Validation};
use rand::rngs::OsRng;
use tracing::{info, debug, instrument};

use super::domain::{RegisterInput, LoginInput, AuthUser, AuthSession, AuthClaims};
use super::errors::AuthError;
use super::repository::AuthRepository;

pub const MIN_PASSWORD_LEN: usize = 8;

/// Auth service configuration
#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub password_algorithm: String,
    pub token_ttl_hours: i64,
}

impl AuthConfig {
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self { jwt_secret: jwt_secret.into(), password_algorithm: "argon2".into(), token_ttl_hours: 12 }
    }
}

/// Hash a plaintext password with a fresh salt.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    if password.len() < MIN_PASSWORD_LEN {
        return Err(AuthError::Validation(format!("password too short (>={MIN_PASSWORD_LEN})")));
    }
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AuthError::HashError(e.to_string()))
}

/// Auth business service independent of web framework
pub struct AuthService<R: AuthRepository + ?Sized> {
    repo: Arc<R>,
    cfg: AuthConfig,
}

impl<R: AuthRepository + ?Sized> AuthService<R> {
    pub fn new(repo: Arc<R>, cfg: AuthConfig) -> Self { Self { repo, cfg } }

    /// Register a new user with a hashed password.
    ///
    /// # Examples
    /// ```
    /// use service::auth::{service::{AuthService, AuthConfig}, repository::mock::MockAuthRepository};
    /// use service::auth::domain::RegisterInput;
    /// use std::sync::Arc;
    /// let repo = Arc::new(MockAuthRepository::default());
    /// let svc = AuthService::new(repo, AuthConfig::new("secret"));
    /// let input = RegisterInput { organization_id: uuid::Uuid::new_v4(), email: "user@example.com".into(), full_name: "Test".into(), password: "Secret123".into() };
    /// let user = tokio_test::block_on(svc.register(input)).unwrap();
    /// assert_eq!(user.email, "user@example.com");
    /// ```
    #[instrument(skip(self, input), fields(email = %input.email, organization_id = %input.organization_id))]
    pub async fn register(&self, input: RegisterInput) -> Result<AuthUser, AuthError> {
        models::user::validate_email(&input.email).map_err(|e| AuthError::Validation(e.to_string()))?;
        models::user::validate_name(&input.full_name).map_err(|e| AuthError::Validation(e.to_string()))?;
        let hash = hash_password(&input.password)?;
        if let Some(existing) = self.repo.find_user_by_email(&input.email).await? {
            debug!("user exists: {}", existing.email);
            return Err(AuthError::Conflict);
        }

        self.repo.ensure_organization(input.organization_id).await?;
        let user = self.repo.create_user(input.organization_id, &input.email, &input.full_name).await?;
        let _cred = self.repo.upsert_password(user.id, hash, self.cfg.password_algorithm.clone()).await?;
        info!(user_id = %user.id, organization_id = %user.organization_id, email = %user.email, "user_registered");
        Ok(user)
    }

    /// Authenticate a user and issue a token.
    ///
    /// # Examples
    /// ```
    /// use service::auth::{service::{AuthService, AuthConfig}, repository::mock::MockAuthRepository};
    /// use service::auth::domain::{RegisterInput, LoginInput};
    /// use std::sync::Arc;
    /// let repo = Arc::new(MockAuthRepository::default());
    /// let svc = AuthService::new(repo.clone(), AuthConfig::new("secret"));
    /// let oid = uuid::Uuid::new_v4();
    /// let _ = tokio_test::block_on(svc.register(RegisterInput { organization_id: oid, email: "u@e.com".into(), full_name: "N".into(), password: "Passw0rd".into() }));
    /// let session = tokio_test::block_on(svc.login(LoginInput { email: "u@e.com".into(), password: "Passw0rd".into() })).unwrap();
    /// assert_eq!(session.user.email, "u@e.com");
    /// assert!(!session.token.is_empty());
    /// ```
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn login(&self, input: LoginInput) -> Result<AuthSession, AuthError> {
        let user = self.repo
            .find_user_by_email(&input.email)
            .await?
            .ok_or(AuthError::Unauthorized)?;
        if !user.active {
            debug!(user_id = %user.id, "inactive user refused");
            return Err(AuthError::Unauthorized);
        }

        // Directory-synced users have no local password
        let cred = self.repo
            .get_credentials(user.id)
            .await?
            .ok_or(AuthError::Unauthorized)?;

        let parsed = PasswordHash::new(&cred.password_hash).map_err(|e| AuthError::HashError(e.to_string()))?;
        if Argon2::default().verify_password(input.password.as_bytes(), &parsed).is_err() {
            return Err(AuthError::Unauthorized);
        }

        let (token, expires_at) = self.issue_token(&user)?;
        info!(user_id = %user.id, role = %user.role, "user_logged_in");
        Ok(AuthSession { user, token, expires_at })
    }

    /// Sign an HS256 token for the user.
    pub fn issue_token(&self, user: &AuthUser) -> Result<(String, i64), AuthError> {
        if self.cfg.jwt_secret.is_empty() {
            return Err(AuthError::TokenError("jwt secret not configured".into()));
        }
        let exp = (chrono::Utc::now() + chrono::Duration::hours(self.cfg.token_ttl_hours)).timestamp();
        let claims = AuthClaims {
            sub: user.email.clone(),
            uid: user.id,
            oid: user.organization_id,
            role: user.role,
            exp: exp as usize,
        };
        let token = encode(&JwtHeader::default(), &claims, &EncodingKey::from_secret(self.cfg.jwt_secret.as_bytes()))
            .map_err(|e| AuthError::TokenError(e.to_string()))?;
        Ok((token, exp))
    }

    /// Decode and validate a token (signature and expiry).
    pub fn verify_token(&self, token: &str) -> Result<AuthClaims, AuthError> {
        let data = decode::<AuthClaims>(
            token,
            &DecodingKey::from_secret(self.cfg.jwt_secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| AuthError::TokenError(e.to_string()))?;
        Ok(data.claims)
    }

    /// Current profile for a verified token.
    pub async fn current_user(&self, claims: &AuthClaims) -> Result<AuthUser, AuthError> {
        let user = self.repo.find_user_by_id(claims.uid).await?.ok_or(AuthError::NotFound)?;
        if !user.active {
            return Err(AuthError::Unauthorized);
        }
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::repository::mock::MockAuthRepository;
    use models::Role;
    use uuid::Uuid;

    fn svc() -> (Arc<MockAuthRepository>, AuthService<MockAuthRepository>) {
        let repo = Arc::new(MockAuthRepository::default());
        (repo.clone(), AuthService::new(repo, AuthConfig::new("test-secret")))
    }

    fn register_input(org: Uuid, email: &str) -> RegisterInput {
        RegisterInput { organization_id: org, email: email.into(), full_name: "Ann Lee".into(), password: "Passw0rd!".into() }
    }

    #[tokio::test]
    async fn register_creates_org_and_rejects_duplicates() {
        let (repo, svc) = svc();
        let org = Uuid::new_v4();
        svc.register(register_input(org, "ann@example.com")).await.unwrap();
        assert!(repo.has_organization(org));

        let dup = svc.register(register_input(org, "ANN@example.com")).await;
        assert!(matches!(dup, Err(AuthError::Conflict)));
    }

    #[tokio::test]
    async fn register_validates_input() {
        let (_, svc) = svc();
        let mut input = register_input(Uuid::new_v4(), "ann@example.com");
        input.password = "short".into();
        assert!(matches!(svc.register(input).await, Err(AuthError::Validation(_))));

        let input = register_input(Uuid::new_v4(), "not-an-email");
        assert!(matches!(svc.register(input).await, Err(AuthError::Validation(_))));
    }

    #[tokio::test]
    async fn login_issues_verifiable_token() {
        let (_, svc) = svc();
        let org = Uuid::new_v4();
        let user = svc.register(register_input(org, "ann@example.com")).await.unwrap();

        let session = svc.login(LoginInput { email: "ann@example.com".into(), password: "Passw0rd!".into() }).await.unwrap();
        let claims = svc.verify_token(&session.token).unwrap();
        assert_eq!(claims.uid, user.id);
        assert_eq!(claims.oid, org);
        assert_eq!(claims.role, Role::Staff);
        assert_eq!(claims.sub, "ann@example.com");
        assert_eq!(claims.exp as i64, session.expires_at);
    }

    #[tokio::test]
    async fn login_rejects_bad_password_and_inactive_users() {
        let (repo, svc) = svc();
        svc.register(register_input(Uuid::new_v4(), "ann@example.com")).await.unwrap();

        let wrong = svc.login(LoginInput { email: "ann@example.com".into(), password: "nope-nope".into() }).await;
        assert!(matches!(wrong, Err(AuthError::Unauthorized)));

        repo.set_user("ann@example.com", Role::Staff, false);
        let inactive = svc.login(LoginInput { email: "ann@example.com".into(), password: "Passw0rd!".into() }).await;
        assert!(matches!(inactive, Err(AuthError::Unauthorized)));
    }

    #[test]
    fn verify_rejects_foreign_and_expired_tokens() {
        let (_, svc) = svc();
        let other = AuthService::new(Arc::new(MockAuthRepository::default()), AuthConfig::new("other-secret"));
        let user = AuthUser {
            id: Uuid::new_v4(),
            organization_id: Uuid::new_v4(),
            email: "a@b.com".into(),
            full_name: "A".into(),
            role: Role::Admin,
            active: true,
        };
        let (token, _) = other.issue_token(&user).unwrap();
        assert!(svc.verify_token(&token).is_err());

        let mut cfg = AuthConfig::new("test-secret");
        cfg.token_ttl_hours = -1;
        let expired = AuthService::new(Arc::new(MockAuthRepository::default()), cfg);
        let (token, _) = expired.issue_token(&user).unwrap();
        assert!(svc.verify_token(&token).is_err());
    }
}
