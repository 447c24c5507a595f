//! Shared helpers for the resource handlers

use axum::{http::StatusCode, Json};
use serde::Serialize;

use super::middleware::{ApiError, ApiResult};

/// Body of a successful delete
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

pub fn success() -> Json<SuccessResponse> {
    Json(SuccessResponse { success: true })
}

/// 201 with the stored record
pub fn created<T: Serialize>(value: T) -> (StatusCode, Json<T>) {
    (StatusCode::CREATED, Json(value))
}

/// Parse a path id; anything but a positive integer is a 400
pub fn parse_id(raw: &str) -> ApiResult<i64> {
    match raw.trim().parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(ApiError::bad_request(format!("Invalid id: {}", raw))),
    }
}
