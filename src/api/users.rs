//! Platform user endpoints under /api/admin/users

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use super::common::{created, parse_id, success};
use super::middleware::{ApiResult, AppState};
use crate::models::{CreateUserInput, ListParams, PagedResult, UpdateUserInput, User};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route(
            "/{id}",
            get(get_user)
                .put(update_user)
                .patch(update_user)
                .delete(delete_user),
        )
}

async fn list_users(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<PagedResult<User>>> {
    Ok(Json(state.users.list(params).await?))
}

async fn get_user(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<User>> {
    Ok(Json(state.users.get(parse_id(&id)?).await?))
}

async fn create_user(
    State(state): State<AppState>,
    Json(body): Json<CreateUserInput>,
) -> ApiResult<impl IntoResponse> {
    Ok(created(state.users.create(body).await?))
}

async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<UpdateUserInput>,
) -> ApiResult<Json<User>> {
    Ok(Json(state.users.update(parse_id(&id)?, body).await?))
}

async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    state.users.delete(parse_id(&id)?).await?;
    Ok(success())
}
