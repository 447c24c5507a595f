//! Billing endpoints under /api/admin/billing

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use super::common::{created, parse_id, success};
use super::middleware::{ApiResult, AppState};
use crate::models::{
    BillingTransaction, CreateBillingInput, ListParams, PagedResult, UpdateBillingInput,
};
use crate::services::BillingSummary;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_transactions).post(create_transaction))
        .route("/summary", get(summary))
        .route(
            "/{id}",
            get(get_transaction)
                .put(update_transaction)
                .patch(update_transaction)
                .delete(delete_transaction),
        )
}

async fn list_transactions(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<PagedResult<BillingTransaction>>> {
    Ok(Json(state.billing.list(params).await?))
}

async fn get_transaction(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<BillingTransaction>> {
    Ok(Json(state.billing.get(parse_id(&id)?).await?))
}

async fn create_transaction(
    State(state): State<AppState>,
    Json(body): Json<CreateBillingInput>,
) -> ApiResult<impl IntoResponse> {
    Ok(created(state.billing.create(body).await?))
}

async fn update_transaction(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<UpdateBillingInput>,
) -> ApiResult<Json<BillingTransaction>> {
    Ok(Json(state.billing.update(parse_id(&id)?, body).await?))
}

async fn delete_transaction(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    state.billing.delete(parse_id(&id)?).await?;
    Ok(success())
}

async fn summary(State(state): State<AppState>) -> ApiResult<Json<BillingSummary>> {
    Ok(Json(state.billing.summary().await?))
}
