//! Admin authentication endpoints
//!
//! Public:
//! - POST /api/admin/auth/signup
//! - POST /api/admin/auth/login
//! - GET|POST /api/admin/auth/verify
//! - POST /api/admin/auth/resend-verification
//! - POST /api/admin/auth/forgot-password
//! - POST /api/admin/auth/reset-password
//!
//! Session required:
//! - POST /api/admin/auth/logout
//! - GET /api/admin/auth/me

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::common::{created, success};
use super::middleware::{client_ip, ApiError, ApiResult, AppState, CurrentAdmin};
use crate::config::AuthConfig;
use crate::models::Admin;
use crate::services::{LoginInput, SignupInput};

#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct EmailRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub admin: Admin,
    pub verification_required: bool,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub admin: Admin,
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub verified: bool,
    pub admin: Admin,
}

/// Routes reachable without a session
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/verify", get(verify_from_link).post(verify))
        .route("/resend-verification", post(resend_verification))
        .route("/forgot-password", post(forgot_password))
        .route("/reset-password", post(reset_password))
}

/// Routes behind the session gate
pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/logout", post(logout))
        .route("/me", get(me))
}

/// `Set-Cookie` value carrying the session token
fn session_cookie(config: &AuthConfig, token: &str, max_age: i64) -> String {
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        config.cookie_name, token, max_age
    );
    if config.secure_cookie {
        cookie.push_str("; Secure");
    }
    cookie
}

fn cookie_headers(cookie: &str) -> ApiResult<HeaderMap> {
    let mut headers = HeaderMap::new();
    let value = HeaderValue::from_str(cookie).map_err(|e| {
        tracing::error!("Invalid session cookie: {}", e);
        ApiError::internal_error()
    })?;
    headers.insert(header::SET_COOKIE, value);
    Ok(headers)
}

async fn signup(
    State(state): State<AppState>,
    Json(body): Json<SignupInput>,
) -> ApiResult<impl IntoResponse> {
    let outcome = state.auth.signup(body).await?;
    Ok(created(SignupResponse {
        admin: outcome.admin,
        verification_required: outcome.verification_required,
    }))
}

async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<LoginInput>,
) -> ApiResult<impl IntoResponse> {
    let outcome = state.auth.login(body, client_ip(&headers)).await?;

    let cookie = session_cookie(
        &state.auth_config,
        &outcome.token,
        state.auth.sessions().ttl_seconds(),
    );
    Ok((
        cookie_headers(&cookie)?,
        Json(LoginResponse {
            admin: outcome.admin,
            token: outcome.token,
        }),
    ))
}

async fn logout(
    State(state): State<AppState>,
    CurrentAdmin(admin): CurrentAdmin,
) -> ApiResult<impl IntoResponse> {
    tracing::info!(admin_id = admin.id, "Admin logged out");
    let cookie = session_cookie(&state.auth_config, "", 0);
    Ok((StatusCode::NO_CONTENT, cookie_headers(&cookie)?))
}

async fn me(CurrentAdmin(admin): CurrentAdmin) -> Json<Admin> {
    Json(admin)
}

async fn verify(
    State(state): State<AppState>,
    Json(body): Json<TokenRequest>,
) -> ApiResult<Json<VerifyResponse>> {
    let admin = state.auth.verify_email(&body.token).await?;
    Ok(Json(VerifyResponse {
        verified: true,
        admin,
    }))
}

async fn verify_from_link(
    State(state): State<AppState>,
    Query(query): Query<TokenRequest>,
) -> ApiResult<Json<VerifyResponse>> {
    let admin = state.auth.verify_email(&query.token).await?;
    Ok(Json(VerifyResponse {
        verified: true,
        admin,
    }))
}

async fn resend_verification(
    State(state): State<AppState>,
    Json(body): Json<EmailRequest>,
) -> ApiResult<Json<MessageResponse>> {
    state.auth.resend_verification(&body.email).await?;
    Ok(Json(MessageResponse {
        message: "If the account needs verification, a new link has been sent",
    }))
}

async fn forgot_password(
    State(state): State<AppState>,
    Json(body): Json<EmailRequest>,
) -> ApiResult<Json<MessageResponse>> {
    state.auth.forgot_password(&body.email).await?;
    Ok(Json(MessageResponse {
        message: "If the account exists, a reset link has been sent",
    }))
}

async fn reset_password(
    State(state): State<AppState>,
    Json(body): Json<ResetPasswordRequest>,
) -> ApiResult<impl IntoResponse> {
    state.auth.reset_password(&body.token, &body.password).await?;
    Ok(success())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_cookie_attributes() {
        let mut config = AuthConfig::default();
        let cookie = session_cookie(&config, "tok", 3600);
        assert!(cookie.starts_with(&format!("{}=tok;", config.cookie_name)));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Path=/"));
        assert!(cookie.contains("Max-Age=3600"));
        assert!(!cookie.contains("Secure"));

        config.secure_cookie = true;
        assert!(session_cookie(&config, "", 0).ends_with("Max-Age=0; Secure"));
    }
}
