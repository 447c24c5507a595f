//! Unauthenticated event intake
//!
//! - POST /api/contact
//! - POST /api/blogs/{id}/comments
//! - POST /api/blogs/{id}/interactions

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use serde::Deserialize;

use super::common::{created, parse_id};
use super::middleware::{ApiResult, AppState};
use crate::models::{CreateCommentInput, CreateContactInput, InteractionKind};

#[derive(Debug, Deserialize)]
pub struct InteractionRequest {
    pub kind: InteractionKind,
    #[serde(default)]
    pub user_id: Option<i64>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/contact", post(submit_contact))
        .route("/blogs/{id}/comments", post(add_comment))
        .route("/blogs/{id}/interactions", post(record_interaction))
}

async fn submit_contact(
    State(state): State<AppState>,
    Json(body): Json<CreateContactInput>,
) -> ApiResult<impl IntoResponse> {
    Ok(created(state.contacts.submit(body).await?))
}

async fn add_comment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<CreateCommentInput>,
) -> ApiResult<impl IntoResponse> {
    Ok(created(state.blog.add_comment(parse_id(&id)?, body).await?))
}

async fn record_interaction(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<InteractionRequest>,
) -> ApiResult<impl IntoResponse> {
    Ok(created(
        state
            .blog
            .record_interaction(parse_id(&id)?, body.kind, body.user_id)
            .await?,
    ))
}
