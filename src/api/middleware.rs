//! API middleware
//!
//! Contains:
//! - Shared application state
//! - The JSON error type every handler returns
//! - Session gatekeeping for the admin API and the admin pages
//! - Request statistics

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::config::{AuthConfig, Config};
use crate::db::repositories::{
    SqlxAdminRepository, SqlxAdminTokenRepository, SqlxAnalyticsRepository, SqlxBillingRepository,
    SqlxCardSetRepository, SqlxCommentRepository, SqlxContactRepository, SqlxCourseRepository,
    SqlxInteractionRepository, SqlxNotificationRepository, SqlxPostRepository, SqlxQuizRepository,
    SqlxSettingsRepository, SqlxUserRepository,
};
use crate::db::DynDatabasePool;
use crate::models::Admin;
use crate::services::{
    AdminService, AnalyticsService, AuthService, BillingService, BlogService, CardSetService,
    ContactService, CounterService, CourseService, EmailService, LoginRateLimiter,
    NotificationService, QuizService, ServiceError, SessionTokens, SettingsService, UserService,
};
use crate::views::ViewEngine;

// ============================================================================
// Request Statistics
// ============================================================================

/// Lock-free request counters
pub struct RequestStats {
    total_requests: AtomicU64,
    total_response_time_us: AtomicU64,
    start_time: Instant,
}

impl RequestStats {
    pub fn new() -> Self {
        Self {
            total_requests: AtomicU64::new(0),
            total_response_time_us: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record(&self, duration_us: u64) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        self.total_response_time_us
            .fetch_add(duration_us, Ordering::Relaxed);
    }

    pub fn total_requests(&self) -> u64 {
        self.total_requests.load(Ordering::Relaxed)
    }

    /// Average response time in microseconds
    pub fn avg_response_time_us(&self) -> f64 {
        let total = self.total_requests.load(Ordering::Relaxed);
        if total == 0 {
            return 0.0;
        }
        let total_time = self.total_response_time_us.load(Ordering::Relaxed);
        total_time as f64 / total as f64
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

impl Default for RequestStats {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Application State
// ============================================================================

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub pool: DynDatabasePool,
    pub auth: Arc<AuthService>,
    pub admins: Arc<AdminService>,
    pub users: Arc<UserService>,
    pub courses: Arc<CourseService>,
    pub card_sets: Arc<CardSetService>,
    pub quizzes: Arc<QuizService>,
    pub blog: Arc<BlogService>,
    pub counters: Arc<CounterService>,
    pub contacts: Arc<ContactService>,
    pub notifications: Arc<NotificationService>,
    pub billing: Arc<BillingService>,
    pub settings: Arc<SettingsService>,
    pub analytics: Arc<AnalyticsService>,
    pub views: Arc<ViewEngine>,
    pub auth_config: Arc<AuthConfig>,
    pub request_stats: Arc<RequestStats>,
}

impl AppState {
    /// Wire every repository and service onto one pool
    pub fn new(pool: DynDatabasePool, config: &Config) -> anyhow::Result<Self> {
        let admin_repo = SqlxAdminRepository::boxed(pool.clone());
        let user_repo = SqlxUserRepository::boxed(pool.clone());
        let post_repo = SqlxPostRepository::boxed(pool.clone());
        let settings = Arc::new(SettingsService::new(SqlxSettingsRepository::boxed(
            pool.clone(),
        )));

        let auth = AuthService::new(
            admin_repo.clone(),
            SqlxAdminTokenRepository::boxed(pool.clone()),
            settings.clone(),
            Arc::new(EmailService::new(
                config.mail.clone(),
                &config.server.public_url,
            )),
            Arc::new(SessionTokens::from_config(&config.auth)),
            Arc::new(LoginRateLimiter::new()),
            &config.auth,
        );

        Ok(Self {
            auth: Arc::new(auth),
            admins: Arc::new(AdminService::new(admin_repo)),
            users: Arc::new(UserService::new(user_repo.clone())),
            courses: Arc::new(CourseService::new(SqlxCourseRepository::boxed(pool.clone()))),
            card_sets: Arc::new(CardSetService::new(SqlxCardSetRepository::boxed(
                pool.clone(),
            ))),
            quizzes: Arc::new(QuizService::new(SqlxQuizRepository::boxed(pool.clone()))),
            blog: Arc::new(BlogService::new(
                post_repo.clone(),
                SqlxCommentRepository::boxed(pool.clone()),
                SqlxInteractionRepository::boxed(pool.clone()),
            )),
            counters: Arc::new(CounterService::new(post_repo)),
            contacts: Arc::new(ContactService::new(SqlxContactRepository::boxed(
                pool.clone(),
            ))),
            notifications: Arc::new(NotificationService::new(
                SqlxNotificationRepository::boxed(pool.clone()),
            )),
            billing: Arc::new(BillingService::new(
                SqlxBillingRepository::boxed(pool.clone()),
                user_repo,
            )),
            settings,
            analytics: Arc::new(AnalyticsService::new(SqlxAnalyticsRepository::boxed(
                pool.clone(),
            ))),
            views: Arc::new(ViewEngine::new()?),
            auth_config: Arc::new(config.auth.clone()),
            request_stats: Arc::new(RequestStats::new()),
            pool,
        })
    }
}

// ============================================================================
// Errors
// ============================================================================

/// JSON error response: `{ "error": "<message>" }`
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn internal_error() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        let status = match &err {
            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Conflict(_) => StatusCode::CONFLICT,
            ServiceError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ServiceError::Forbidden(_) => StatusCode::FORBIDDEN,
            ServiceError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ServiceError::Internal(e) => {
                tracing::error!("Request failed: {:#}", e);
                return Self::internal_error();
            }
        };
        Self::new(status, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                error: self.message,
            }),
        )
            .into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

// ============================================================================
// Authentication
// ============================================================================

/// Admin resolved from the session token
#[derive(Debug, Clone)]
pub struct CurrentAdmin(pub Admin);

impl<S> FromRequestParts<S> for CurrentAdmin
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentAdmin>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))
    }
}

/// Read the session token from the cookie, else from `Authorization: Bearer`
pub fn extract_session_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let from_cookie = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == cookie_name && !value.is_empty())
        .map(|(_, value)| value.to_string());
    if from_cookie.is_some() {
        return from_cookie;
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

async fn resolve_admin(state: &AppState, headers: &HeaderMap) -> Result<Admin, ServiceError> {
    let token = extract_session_token(headers, &state.auth_config.cookie_name)
        .ok_or_else(|| ServiceError::Unauthorized("Authentication required".to_string()))?;
    state.auth.authenticate(&token).await
}

/// Gate for `/api/admin/*`: 401 JSON without a valid session
pub async fn require_admin(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let admin = resolve_admin(&state, request.headers()).await?;
    request.extensions_mut().insert(CurrentAdmin(admin));
    Ok(next.run(request).await)
}

/// Gate for `/admin` pages: redirect to the login page instead of failing
pub async fn require_admin_page(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    match resolve_admin(&state, request.headers()).await {
        Ok(admin) => {
            request.extensions_mut().insert(CurrentAdmin(admin));
            next.run(request).await
        }
        Err(ServiceError::Internal(e)) => {
            tracing::error!("Session check failed: {:#}", e);
            ApiError::internal_error().into_response()
        }
        Err(_) => {
            let next_path = request
                .uri()
                .path_and_query()
                .map(|pq| pq.as_str())
                .unwrap_or("/admin");
            Redirect::to(&format!("/login?next={}", urlencoding::encode(next_path)))
                .into_response()
        }
    }
}

/// Client IP from proxy headers
pub fn client_ip(headers: &HeaderMap) -> Option<IpAddr> {
    if let Some(forwarded) = headers.get("x-forwarded-for").and_then(|h| h.to_str().ok()) {
        if let Some(ip) = forwarded.split(',').next().and_then(|ip| ip.trim().parse().ok()) {
            return Some(ip);
        }
    }
    headers
        .get("x-real-ip")
        .and_then(|h| h.to_str().ok())
        .and_then(|ip| ip.trim().parse().ok())
}

/// Record count and latency of every request
pub async fn request_stats_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let response = next.run(request).await;
    state
        .request_stats
        .record(start.elapsed().as_micros() as u64);
    response
}
