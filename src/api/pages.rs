//! Server-rendered admin pages
//!
//! - GET /login
//! - GET /admin
//! - GET /admin/{section}
//!
//! The `/admin` routes sit behind `require_admin_page`.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Router,
};
use serde::Deserialize;

use super::middleware::{AppState, CurrentAdmin};
use crate::views::{self, find_section};

#[derive(Debug, Default, Deserialize)]
pub struct LoginQuery {
    #[serde(default)]
    pub next: Option<String>,
    /// Password reset secret from the emailed link
    #[serde(default)]
    pub reset: Option<String>,
}

pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/", get(|| async { Redirect::to("/admin") }))
        .route("/login", get(login_page))
}

pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard_page))
        .route("/{section}", get(section_page))
}

async fn login_page(State(state): State<AppState>, Query(query): Query<LoginQuery>) -> Response {
    html_response(
        state
            .views
            .login_page(query.next.as_deref(), query.reset.as_deref()),
    )
}

async fn dashboard_page(
    State(state): State<AppState>,
    CurrentAdmin(admin): CurrentAdmin,
) -> Response {
    html_response(state.views.dashboard_page(&admin))
}

async fn section_page(
    State(state): State<AppState>,
    CurrentAdmin(admin): CurrentAdmin,
    Path(slug): Path<String>,
) -> Response {
    match find_section(&slug) {
        Some(section) => html_response(state.views.section_page(section, &admin)),
        None => (
            StatusCode::NOT_FOUND,
            Html(simple_error_page("Not found", "No such admin page.")),
        )
            .into_response(),
    }
}

fn html_response(rendered: views::Result<String>) -> Response {
    match rendered {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            tracing::error!("{}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html(simple_error_page(
                    "Something went wrong",
                    "The page could not be rendered.",
                )),
            )
                .into_response()
        }
    }
}

fn simple_error_page(title: &str, message: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="utf-8"><title>{title}</title></head>
<body style="font-family: system-ui, sans-serif; text-align: center; padding-top: 15vh;">
<h1>{title}</h1>
<p>{message}</p>
<p><a href="/admin">Back to dashboard</a></p>
</body>
</html>"#
    )
}
