//! Admin authentication
//!
//! Signup, email verification, login, password reset and session checks.
//!
//! - The first admin ever created becomes a verified and approved super admin.
//! - Later admins must verify their email and, when the platform settings
//!   require it, wait for approval before they can sign in.
//! - Verification and reset links carry a random secret; only its SHA-256 is
//!   stored, and a secret is consumed on use.

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::sync::Arc;

use super::email::EmailService;
use super::jwt::SessionTokens;
use super::password::{generate_secret, hash_password, hash_secret, verify_password};
use super::rate_limiter::LoginRateLimiter;
use super::settings::SettingsService;
use super::validation::{normalize_email, require, require_email, require_password};
use super::{ServiceError, ServiceResult};
use crate::config::AuthConfig;
use crate::db::repositories::{AdminRepository, AdminTokenRepository};
use crate::models::{Admin, AdminRole, AdminToken, TokenPurpose};

const INVALID_CREDENTIALS: &str = "Invalid email or password";
const INVALID_TOKEN: &str = "Invalid or expired token";

#[derive(Debug, Clone, Deserialize)]
pub struct SignupInput {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SignupOutcome {
    pub admin: Admin,
    pub verification_required: bool,
    /// Raw verification secret; mailed, never returned over HTTP
    #[serde(skip)]
    pub verification_secret: Option<String>,
}

#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub admin: Admin,
    pub token: String,
}

pub struct AuthService {
    admins: Arc<dyn AdminRepository>,
    tokens: Arc<dyn AdminTokenRepository>,
    settings: Arc<SettingsService>,
    email: Arc<EmailService>,
    sessions: Arc<SessionTokens>,
    limiter: Arc<LoginRateLimiter>,
    verification_ttl: Duration,
    reset_ttl: Duration,
}

impl AuthService {
    pub fn new(
        admins: Arc<dyn AdminRepository>,
        tokens: Arc<dyn AdminTokenRepository>,
        settings: Arc<SettingsService>,
        email: Arc<EmailService>,
        sessions: Arc<SessionTokens>,
        limiter: Arc<LoginRateLimiter>,
        config: &AuthConfig,
    ) -> Self {
        Self {
            admins,
            tokens,
            settings,
            email,
            sessions,
            limiter,
            verification_ttl: Duration::hours(config.verification_ttl_hours.max(1)),
            reset_ttl: Duration::minutes(config.reset_ttl_minutes.max(1)),
        }
    }

    pub fn sessions(&self) -> &SessionTokens {
        &self.sessions
    }

    pub fn limiter(&self) -> &LoginRateLimiter {
        &self.limiter
    }

    pub async fn signup(&self, input: SignupInput) -> ServiceResult<SignupOutcome> {
        require("Name", &input.name)?;
        require_email(&input.email)?;
        require_password(&input.password)?;
        let email = normalize_email(&input.email);

        let is_first = self.admins.count().await? == 0;
        let settings = self.settings.get().await?;
        if !is_first && !settings.allow_signups {
            return Err(ServiceError::Forbidden("Signups are disabled".to_string()));
        }

        if self.admins.get_by_email(&email).await?.is_some() {
            return Err(ServiceError::Conflict("Email is already registered".to_string()));
        }

        let password_hash = hash_password(&input.password)?;
        let role = if is_first { AdminRole::SuperAdmin } else { AdminRole::Admin };
        let mut admin = Admin::new(input.name.trim().to_string(), email, password_hash, role);
        if is_first {
            admin.is_verified = true;
            admin.is_approved = true;
        } else {
            admin.is_approved = !settings.require_admin_approval;
        }

        let admin = self
            .admins
            .create(&admin)
            .await
            .map_err(|e| ServiceError::from_write(e, "Email is already registered"))?;
        tracing::info!(admin_id = admin.id, role = %admin.role, "Admin signed up");

        let verification_secret = if admin.is_verified {
            None
        } else {
            let secret = self
                .issue_token(admin.id, TokenPurpose::VerifyEmail, self.verification_ttl)
                .await?;
            self.email
                .deliver(self.email.verification_mail(&admin.email, &admin.name, &secret))
                .await;
            Some(secret)
        };

        Ok(SignupOutcome {
            verification_required: !admin.is_verified,
            admin,
            verification_secret,
        })
    }

    pub async fn verify_email(&self, secret: &str) -> ServiceResult<Admin> {
        let token = self.redeem(secret, TokenPurpose::VerifyEmail).await?;
        let mut admin = self
            .admins
            .get_by_id(token.admin_id)
            .await?
            .ok_or_else(|| ServiceError::validation(INVALID_TOKEN))?;

        admin.is_verified = true;
        admin.updated_at = Utc::now();
        let admin = self.admins.update(&admin).await?;
        self.tokens
            .delete_for_admin(admin.id, TokenPurpose::VerifyEmail)
            .await?;

        tracing::info!(admin_id = admin.id, "Admin email verified");
        Ok(admin)
    }

    /// Send a fresh verification link. Unknown or verified emails are ignored.
    pub async fn resend_verification(&self, email: &str) -> ServiceResult<Option<String>> {
        let Some(admin) = self.admins.get_by_email(&normalize_email(email)).await? else {
            return Ok(None);
        };
        if admin.is_verified {
            return Ok(None);
        }

        self.tokens
            .delete_for_admin(admin.id, TokenPurpose::VerifyEmail)
            .await?;
        let secret = self
            .issue_token(admin.id, TokenPurpose::VerifyEmail, self.verification_ttl)
            .await?;
        self.email
            .deliver(self.email.verification_mail(&admin.email, &admin.name, &secret))
            .await;
        Ok(Some(secret))
    }

    pub async fn login(&self, input: LoginInput, ip: Option<IpAddr>) -> ServiceResult<LoginOutcome> {
        if let Some(ip) = ip {
            if self.limiter.check_ip(ip).await {
                tracing::warn!(%ip, "Login rate limit hit for IP");
                return Err(ServiceError::RateLimited);
            }
        }

        let email = normalize_email(&input.email);
        if self.limiter.is_email_limited(&email).await {
            tracing::warn!(%email, "Login rate limit hit for email");
            return Err(ServiceError::RateLimited);
        }

        let admin = match self.admins.get_by_email(&email).await? {
            Some(admin) if verify_password(&input.password, &admin.password_hash)? => admin,
            _ => {
                self.limiter.record_failure(&email).await;
                tracing::info!(%email, "Failed admin login");
                return Err(ServiceError::Unauthorized(INVALID_CREDENTIALS.to_string()));
            }
        };

        if !admin.is_verified {
            return Err(ServiceError::Forbidden("Email address is not verified".to_string()));
        }
        if !admin.is_approved {
            return Err(ServiceError::Forbidden("Account is awaiting approval".to_string()));
        }

        self.limiter.clear_email(&email).await;
        let now = Utc::now();
        self.admins.touch_login(admin.id, now).await?;
        let token = self
            .sessions
            .issue(&admin)
            .map_err(|e| anyhow::anyhow!("Failed to sign session token: {}", e))?;

        tracing::info!(admin_id = admin.id, "Admin logged in");
        Ok(LoginOutcome {
            admin: Admin {
                last_login_at: Some(now),
                ..admin
            },
            token,
        })
    }

    /// Resolve a session token to an admin who may still sign in
    pub async fn authenticate(&self, token: &str) -> ServiceResult<Admin> {
        let unauthorized = || ServiceError::Unauthorized("Authentication required".to_string());

        let claims = self.sessions.verify(token).map_err(|_| unauthorized())?;
        let admin_id = claims.admin_id().ok_or_else(unauthorized)?;
        let admin = self
            .admins
            .get_by_id(admin_id)
            .await?
            .ok_or_else(unauthorized)?;

        if !admin.can_sign_in() {
            return Err(unauthorized());
        }
        Ok(admin)
    }

    /// Start a password reset. Returns the secret when the admin exists; callers
    /// must answer the same way either way.
    pub async fn forgot_password(&self, email: &str) -> ServiceResult<Option<String>> {
        let Some(admin) = self.admins.get_by_email(&normalize_email(email)).await? else {
            tracing::debug!("Password reset requested for unknown email");
            return Ok(None);
        };

        let secret = self
            .issue_token(admin.id, TokenPurpose::ResetPassword, self.reset_ttl)
            .await?;
        self.email
            .deliver(self.email.reset_mail(&admin.email, &admin.name, &secret))
            .await;
        tracing::info!(admin_id = admin.id, "Password reset requested");
        Ok(Some(secret))
    }

    pub async fn reset_password(&self, secret: &str, password: &str) -> ServiceResult<()> {
        require_password(password)?;
        let token = self.redeem(secret, TokenPurpose::ResetPassword).await?;
        let mut admin = self
            .admins
            .get_by_id(token.admin_id)
            .await?
            .ok_or_else(|| ServiceError::validation(INVALID_TOKEN))?;

        admin.password_hash = hash_password(password)?;
        admin.updated_at = Utc::now();
        self.admins.update(&admin).await?;
        self.tokens
            .delete_for_admin(admin.id, TokenPurpose::ResetPassword)
            .await?;
        self.limiter.clear_email(&admin.email).await;

        tracing::info!(admin_id = admin.id, "Admin password reset");
        Ok(())
    }

    /// Remove expired verification and reset tokens
    pub async fn cleanup_expired_tokens(&self) -> ServiceResult<u64> {
        Ok(self.tokens.delete_expired(Utc::now()).await?)
    }

    async fn issue_token(&self, admin_id: i64, purpose: TokenPurpose, ttl: Duration) -> ServiceResult<String> {
        let secret = generate_secret();
        let now = Utc::now();
        self.tokens
            .create(&AdminToken {
                token_hash: hash_secret(&secret),
                admin_id,
                purpose,
                expires_at: now + ttl,
                created_at: now,
            })
            .await?;
        Ok(secret)
    }

    async fn redeem(&self, secret: &str, purpose: TokenPurpose) -> ServiceResult<AdminToken> {
        if secret.trim().is_empty() {
            return Err(ServiceError::validation(INVALID_TOKEN));
        }
        match self.tokens.find(&hash_secret(secret.trim()), purpose).await? {
            Some(token) if !token.is_expired() => Ok(token),
            _ => Err(ServiceError::validation(INVALID_TOKEN)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MailConfig;
    use crate::db::repositories::{SqlxAdminRepository, SqlxAdminTokenRepository, SqlxSettingsRepository};
    use crate::db::{create_test_pool, migrations, DynDatabasePool};

    async fn setup() -> (DynDatabasePool, AuthService) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let config = AuthConfig::default();
        let service = AuthService::new(
            SqlxAdminRepository::boxed(pool.clone()),
            SqlxAdminTokenRepository::boxed(pool.clone()),
            Arc::new(SettingsService::new(SqlxSettingsRepository::boxed(pool.clone()))),
            Arc::new(EmailService::new(MailConfig::default(), "http://localhost:8080")),
            Arc::new(SessionTokens::from_config(&config)),
            Arc::new(LoginRateLimiter::new()),
            &config,
        );
        (pool, service)
    }

    fn signup(name: &str, email: &str) -> SignupInput {
        SignupInput {
            name: name.to_string(),
            email: email.to_string(),
            password: "password123".to_string(),
        }
    }

    fn login(email: &str, password: &str) -> LoginInput {
        LoginInput {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn test_first_admin_is_super_admin() {
        let (_, auth) = setup().await;
        let outcome = auth.signup(signup("Root", "Root@Example.com")).await.unwrap();

        assert_eq!(outcome.admin.role, AdminRole::SuperAdmin);
        assert!(outcome.admin.is_verified);
        assert!(outcome.admin.is_approved);
        assert!(!outcome.verification_required);
        assert_eq!(outcome.admin.email, "root@example.com");

        let session = auth.login(login("root@example.com", "password123"), None).await.unwrap();
        let admin = auth.authenticate(&session.token).await.unwrap();
        assert_eq!(admin.id, outcome.admin.id);
    }

    #[tokio::test]
    async fn test_second_admin_must_verify_and_be_approved() {
        let (_, auth) = setup().await;
        auth.signup(signup("Root", "root@example.com")).await.unwrap();
        let outcome = auth.signup(signup("Second", "second@example.com")).await.unwrap();

        assert_eq!(outcome.admin.role, AdminRole::Admin);
        assert!(outcome.verification_required);
        let secret = outcome.verification_secret.expect("verification secret issued");

        let err = auth.login(login("second@example.com", "password123"), None).await.unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));

        let verified = auth.verify_email(&secret).await.unwrap();
        assert!(verified.is_verified);
        assert!(matches!(auth.verify_email(&secret).await, Err(ServiceError::Validation(_))));

        let err = auth.login(login("second@example.com", "password123"), None).await.unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(msg) if msg.contains("approval")));
    }

    #[tokio::test]
    async fn test_signup_validation_and_duplicates() {
        let (_, auth) = setup().await;
        assert!(matches!(
            auth.signup(signup("A", "not-an-email")).await,
            Err(ServiceError::Validation(_))
        ));

        let mut short = signup("A", "a@example.com");
        short.password = "short".to_string();
        assert!(matches!(auth.signup(short).await, Err(ServiceError::Validation(_))));

        auth.signup(signup("A", "a@example.com")).await.unwrap();
        assert!(matches!(
            auth.signup(signup("B", "A@example.com")).await,
            Err(ServiceError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_login_failures_are_rate_limited() {
        let (_, auth) = setup().await;
        auth.signup(signup("Root", "root@example.com")).await.unwrap();

        for _ in 0..5 {
            let err = auth.login(login("root@example.com", "wrong-pass"), None).await.unwrap_err();
            assert!(matches!(err, ServiceError::Unauthorized(_)));
        }
        let err = auth.login(login("root@example.com", "password123"), None).await.unwrap_err();
        assert!(matches!(err, ServiceError::RateLimited));
    }

    #[tokio::test]
    async fn test_password_reset_flow() {
        let (_, auth) = setup().await;
        auth.signup(signup("Root", "root@example.com")).await.unwrap();

        assert!(auth.forgot_password("nobody@example.com").await.unwrap().is_none());
        let secret = auth.forgot_password("root@example.com").await.unwrap().unwrap();

        assert!(matches!(
            auth.reset_password(&secret, "short").await,
            Err(ServiceError::Validation(_))
        ));
        auth.reset_password(&secret, "new-password-1").await.unwrap();
        assert!(auth.reset_password(&secret, "new-password-2").await.is_err());

        assert!(auth.login(login("root@example.com", "password123"), None).await.is_err());
        assert!(auth.login(login("root@example.com", "new-password-1"), None).await.is_ok());
    }

    #[tokio::test]
    async fn test_expired_tokens_are_rejected_and_cleaned() {
        let (pool, auth) = setup().await;
        auth.signup(signup("Root", "root@example.com")).await.unwrap();
        let secret = auth.forgot_password("root@example.com").await.unwrap().unwrap();

        sqlx::query("UPDATE admin_tokens SET expires_at = '2000-01-01T00:00:00+00:00'")
            .execute(pool.as_sqlite())
            .await
            .unwrap();

        assert!(auth.reset_password(&secret, "new-password-1").await.is_err());
        assert_eq!(auth.cleanup_expired_tokens().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_authenticate_rejects_bad_tokens() {
        let (_, auth) = setup().await;
        assert!(matches!(
            auth.authenticate("garbage").await,
            Err(ServiceError::Unauthorized(_))
        ));
    }
}
