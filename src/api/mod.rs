//! API layer - HTTP handlers and routing
//!
//! - `/api/admin/auth/*` - signup, login and account recovery (public)
//! - `/api/admin/*` - resource CRUD, analytics, settings, system status
//! - `/api/*` - public event intake
//! - `/login`, `/admin/*` - server-rendered pages
//! - `/health` - liveness check

pub mod admins;
pub mod analytics;
pub mod auth;
pub mod billing;
pub mod blogs;
pub mod catalog;
pub mod common;
pub mod contacts;
pub mod middleware;
pub mod notifications;
pub mod pages;
pub mod public;
pub mod settings;
pub mod system;
pub mod users;

use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    routing::get,
    Router,
};
use tower::ServiceBuilder;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

pub use middleware::{ApiError, ApiResult, AppState, CurrentAdmin, RequestStats};

/// Routes under `/api/admin`
pub fn build_admin_router(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .nest("/auth", auth::protected_router())
        .nest("/users", users::router())
        .nest("/courses", catalog::courses_router())
        .nest("/flashcards", catalog::flashcards_router())
        .nest("/tests", catalog::tests_router())
        .nest("/blogs", blogs::router())
        .nest("/contacts", contacts::router())
        .nest("/notifications", notifications::router())
        .nest("/billing", billing::router())
        .nest("/admins", admins::router())
        .nest("/settings", settings::router())
        .nest("/analytics", analytics::router())
        .route("/system", get(system::system_status))
        .route_layer(axum_middleware::from_fn_with_state(
            state,
            middleware::require_admin,
        ));

    Router::new()
        .nest("/auth", auth::public_router())
        .merge(protected)
}

/// Build the complete router with middleware
pub fn build_router(state: AppState, cors_origin: &str) -> Router {
    let mut cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::COOKIE])
        .allow_credentials(true);
    match cors_origin.parse::<HeaderValue>() {
        Ok(origin) => cors = cors.allow_origin(origin),
        Err(_) => tracing::warn!("Ignoring invalid CORS origin: {}", cors_origin),
    }

    let admin_pages = pages::admin_router().route_layer(axum_middleware::from_fn_with_state(
        state.clone(),
        middleware::require_admin_page,
    ));

    Router::new()
        .nest("/api/admin", build_admin_router(state.clone()))
        .nest("/api", public::router())
        .nest("/admin", admin_pages)
        .merge(pages::public_router())
        .route("/health", get(system::health))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(cors),
        )
        // Request stats middleware (outermost layer, runs for all requests)
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::request_stats_middleware,
        ))
        .with_state(state)
}
