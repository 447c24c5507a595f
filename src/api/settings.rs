//! Platform settings under /api/admin/settings

use axum::{extract::State, routing::get, Json, Router};

use super::middleware::{ApiResult, AppState, CurrentAdmin};
use crate::models::PlatformSettings;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(get_settings).put(replace_settings))
}

async fn get_settings(State(state): State<AppState>) -> ApiResult<Json<PlatformSettings>> {
    Ok(Json(state.settings.get().await?))
}

async fn replace_settings(
    State(state): State<AppState>,
    CurrentAdmin(admin): CurrentAdmin,
    Json(body): Json<PlatformSettings>,
) -> ApiResult<Json<PlatformSettings>> {
    let saved = state.settings.replace(body).await?;
    tracing::info!(admin_id = admin.id, "Settings replaced");
    Ok(Json(saved))
}
