//! Notification endpoints under /api/admin/notifications

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use super::common::{created, parse_id, success};
use super::middleware::{ApiResult, AppState};
use crate::models::{
    CreateNotificationInput, ListParams, Notification, PagedResult, UpdateNotificationInput,
};

#[derive(Debug, Serialize)]
pub struct MarkAllReadResponse {
    pub updated: u64,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_notifications).post(create_notification))
        .route("/mark-all-read", post(mark_all_read))
        .route(
            "/{id}",
            get(get_notification)
                .put(update_notification)
                .patch(update_notification)
                .delete(delete_notification),
        )
        .route("/{id}/send", post(send_notification))
}

async fn list_notifications(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<PagedResult<Notification>>> {
    Ok(Json(state.notifications.list(params).await?))
}

async fn get_notification(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Notification>> {
    Ok(Json(state.notifications.get(parse_id(&id)?).await?))
}

async fn create_notification(
    State(state): State<AppState>,
    Json(body): Json<CreateNotificationInput>,
) -> ApiResult<impl IntoResponse> {
    Ok(created(state.notifications.create(body).await?))
}

async fn update_notification(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<UpdateNotificationInput>,
) -> ApiResult<Json<Notification>> {
    Ok(Json(state.notifications.update(parse_id(&id)?, body).await?))
}

async fn delete_notification(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    state.notifications.delete(parse_id(&id)?).await?;
    Ok(success())
}

async fn send_notification(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Notification>> {
    Ok(Json(state.notifications.send(parse_id(&id)?).await?))
}

async fn mark_all_read(State(state): State<AppState>) -> ApiResult<Json<MarkAllReadResponse>> {
    let updated = state.notifications.mark_all_read().await?;
    Ok(Json(MarkAllReadResponse { updated }))
}
