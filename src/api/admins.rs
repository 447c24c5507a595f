//! Admin account endpoints under /api/admin/admins
//!
//! No create route: accounts come from signup.

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use super::common::{parse_id, success};
use super::middleware::{ApiResult, AppState, CurrentAdmin};
use crate::models::{Admin, ListParams, PagedResult, UpdateAdminInput};

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list_admins)).route(
        "/{id}",
        get(get_admin)
            .put(update_admin)
            .patch(update_admin)
            .delete(delete_admin),
    )
}

async fn list_admins(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<PagedResult<Admin>>> {
    Ok(Json(state.admins.list(params).await?))
}

async fn get_admin(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Admin>> {
    Ok(Json(state.admins.get(parse_id(&id)?).await?))
}

async fn update_admin(
    State(state): State<AppState>,
    CurrentAdmin(actor): CurrentAdmin,
    Path(id): Path<String>,
    Json(body): Json<UpdateAdminInput>,
) -> ApiResult<Json<Admin>> {
    Ok(Json(state.admins.update(&actor, parse_id(&id)?, body).await?))
}

async fn delete_admin(
    State(state): State<AppState>,
    CurrentAdmin(actor): CurrentAdmin,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    state.admins.delete(&actor, parse_id(&id)?).await?;
    Ok(success())
}
