//! Blog endpoints under /api/admin/blogs
//!
//! Besides post CRUD:
//! - GET /blogs/{id}/comments
//! - DELETE /blogs/{post_id}/comments/{comment_id}
//! - GET /blogs/counters - cached counters that drifted from the event tables
//! - POST /blogs/counters/reconcile

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use serde::Serialize;

use super::common::{created, parse_id, success};
use super::middleware::{ApiResult, AppState};
use crate::models::{Comment, CreatePostInput, ListParams, PagedResult, Post, UpdatePostInput};
use crate::services::CounterDrift;

#[derive(Debug, Serialize)]
pub struct ReconcileResponse {
    pub repaired: u64,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_posts).post(create_post))
        .route("/counters", get(audit_counters))
        .route("/counters/reconcile", post(reconcile_counters))
        .route(
            "/{id}",
            get(get_post)
                .put(update_post)
                .patch(update_post)
                .delete(delete_post),
        )
        .route("/{id}/comments", get(list_comments))
        .route("/{id}/comments/{comment_id}", delete(delete_comment))
}

async fn list_posts(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<PagedResult<Post>>> {
    Ok(Json(state.blog.list(params).await?))
}

async fn get_post(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Post>> {
    Ok(Json(state.blog.get(parse_id(&id)?).await?))
}

async fn create_post(
    State(state): State<AppState>,
    Json(body): Json<CreatePostInput>,
) -> ApiResult<impl IntoResponse> {
    Ok(created(state.blog.create(body).await?))
}

async fn update_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<UpdatePostInput>,
) -> ApiResult<Json<Post>> {
    Ok(Json(state.blog.update(parse_id(&id)?, body).await?))
}

async fn delete_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    state.blog.delete(parse_id(&id)?).await?;
    Ok(success())
}

async fn list_comments(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<Comment>>> {
    Ok(Json(state.blog.comments(parse_id(&id)?).await?))
}

async fn delete_comment(
    State(state): State<AppState>,
    Path((post_id, comment_id)): Path<(String, String)>,
) -> ApiResult<impl IntoResponse> {
    state
        .blog
        .delete_comment(parse_id(&post_id)?, parse_id(&comment_id)?)
        .await?;
    Ok(success())
}

async fn audit_counters(State(state): State<AppState>) -> ApiResult<Json<Vec<CounterDrift>>> {
    Ok(Json(state.counters.audit().await?))
}

async fn reconcile_counters(State(state): State<AppState>) -> ApiResult<Json<ReconcileResponse>> {
    let repaired = state.counters.reconcile().await?;
    Ok(Json(ReconcileResponse { repaired }))
}
