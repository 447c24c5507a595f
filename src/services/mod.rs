//! Services layer - Business logic
//!
//! Services validate input, apply the domain rules and coordinate the
//! repositories. They return [`ServiceError`], which the API layer maps onto
//! HTTP status codes.

pub mod admin;
pub mod analytics;
pub mod auth;
pub mod billing;
pub mod blog;
pub mod catalog;
pub mod contact;
pub mod counters;
pub mod email;
pub mod jwt;
pub mod notification;
pub mod password;
pub mod rate_limiter;
pub mod settings;
pub mod user;
pub mod validation;

pub use admin::AdminService;
pub use analytics::AnalyticsService;
pub use auth::{AuthService, LoginInput, LoginOutcome, SignupInput, SignupOutcome};
pub use billing::{BillingService, BillingSummary};
pub use blog::{generate_slug, BlogService};
pub use catalog::{CardSetService, CourseService, QuizService};
pub use contact::ContactService;
pub use counters::{CounterDrift, CounterService};
pub use email::EmailService;
pub use jwt::{Claims, SessionTokens};
pub use notification::NotificationService;
pub use password::{hash_password, verify_password};
pub use rate_limiter::LoginRateLimiter;
pub use settings::SettingsService;
pub use user::UserService;

use crate::db::repositories::is_unique_violation;

/// Error type shared by every service
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Invalid input
    #[error("{0}")]
    Validation(String),

    /// The named entity does not exist
    #[error("{0} not found")]
    NotFound(&'static str),

    /// A unique key is already taken, or the change would break an invariant
    #[error("{0}")]
    Conflict(String),

    /// Missing or invalid credentials
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated but not allowed
    #[error("{0}")]
    Forbidden(String),

    #[error("Too many attempts, please try again later")]
    RateLimited,

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ServiceError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Map a failed insert/update: a UNIQUE violation becomes `Conflict(msg)`
    pub fn from_write(err: anyhow::Error, msg: &str) -> Self {
        if is_unique_violation(&err) {
            Self::Conflict(msg.to_string())
        } else {
            Self::Internal(err)
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
