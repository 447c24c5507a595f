//! Analytics reports under /api/admin/analytics
//!
//! Windows are anchored to today (UTC) unless `?date=YYYY-MM-DD` is given.
//! Anchors outside the years 1970 to 9999 are rejected with 400.

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;

use super::middleware::{ApiResult, AppState};
use crate::services::analytics::{
    ContactsReport, EngagementReport, OverviewReport, PostsReport, RevenueReport, UsersReport,
};

#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

impl ReportQuery {
    fn today(&self) -> NaiveDate {
        self.date.unwrap_or_else(|| Utc::now().date_naive())
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/overview", get(overview))
        .route("/engagement", get(engagement))
        .route("/contacts", get(contacts))
        .route("/posts", get(posts))
        .route("/users", get(users))
        .route("/revenue", get(revenue))
}

async fn overview(State(state): State<AppState>) -> ApiResult<Json<OverviewReport>> {
    Ok(Json(state.analytics.overview().await?))
}

async fn engagement(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> ApiResult<Json<EngagementReport>> {
    Ok(Json(state.analytics.engagement(query.today()).await?))
}

async fn contacts(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> ApiResult<Json<ContactsReport>> {
    Ok(Json(state.analytics.contacts(query.today()).await?))
}

async fn posts(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> ApiResult<Json<PostsReport>> {
    Ok(Json(state.analytics.posts(query.today()).await?))
}

async fn users(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> ApiResult<Json<UsersReport>> {
    Ok(Json(state.analytics.users(query.today()).await?))
}

async fn revenue(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> ApiResult<Json<RevenueReport>> {
    Ok(Json(state.analytics.revenue(query.today()).await?))
}
