//! Contact triage endpoints under /api/admin/contacts

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use super::common::{created, parse_id, success};
use super::middleware::{ApiResult, AppState};
use crate::models::{Contact, CreateContactInput, ListParams, PagedResult, UpdateContactInput};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_contacts).post(create_contact))
        .route(
            "/{id}",
            get(get_contact)
                .put(update_contact)
                .patch(update_contact)
                .delete(delete_contact),
        )
}

async fn list_contacts(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<PagedResult<Contact>>> {
    Ok(Json(state.contacts.list(params).await?))
}

async fn get_contact(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Contact>> {
    Ok(Json(state.contacts.get(parse_id(&id)?).await?))
}

async fn create_contact(
    State(state): State<AppState>,
    Json(body): Json<CreateContactInput>,
) -> ApiResult<impl IntoResponse> {
    Ok(created(state.contacts.submit(body).await?))
}

async fn update_contact(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<UpdateContactInput>,
) -> ApiResult<Json<Contact>> {
    Ok(Json(state.contacts.update(parse_id(&id)?, body).await?))
}

async fn delete_contact(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    state.contacts.delete(parse_id(&id)?).await?;
    Ok(success())
}
