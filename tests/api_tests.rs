//! Router-level tests against an in-memory database

use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use learnboard::api::{build_router, AppState};
use learnboard::config::Config;
use learnboard::db::{create_test_pool, migrations::run_migrations};

type TestResult<T = ()> = anyhow::Result<T>;

struct TestResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Value,
}

async fn test_app() -> TestResult<Router> {
    let pool = create_test_pool().await?;
    run_migrations(&pool).await?;
    let config = Config::default();
    let state = AppState::new(pool, &config)?;
    Ok(build_router(state, &config.server.cors_origin))
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    cookie: Option<&str>,
    body: Option<Value>,
) -> TestResult<TestResponse> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body)?))?,
        None => builder.body(Body::empty())?,
    };

    let response = app.clone().oneshot(request).await?;
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await?.to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    Ok(TestResponse {
        status,
        headers,
        body,
    })
}

/// Sign up the first (super) admin and return its session cookie pair
async fn login_super_admin(app: &Router) -> TestResult<String> {
    let signup = send(
        app,
        Method::POST,
        "/api/admin/auth/signup",
        None,
        Some(json!({"name": "Root", "email": "root@example.com", "password": "correct-horse"})),
    )
    .await?;
    assert_eq!(signup.status, StatusCode::CREATED);
    assert_eq!(signup.body["admin"]["role"], "super_admin");
    assert_eq!(signup.body["verification_required"], false);

    let login = send(
        app,
        Method::POST,
        "/api/admin/auth/login",
        None,
        Some(json!({"email": "root@example.com", "password": "correct-horse"})),
    )
    .await?;
    assert_eq!(login.status, StatusCode::OK);
    let set_cookie = login
        .headers
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("SameSite=Lax"));

    let pair = set_cookie.split(';').next().unwrap_or_default().to_string();
    assert!(pair.starts_with("admin_token="));
    Ok(pair)
}

#[tokio::test]
async fn test_health_is_public() -> TestResult {
    let app = test_app().await?;
    let res = send(&app, Method::GET, "/health", None, None).await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body, json!({"status": "ok"}));
    Ok(())
}

#[tokio::test]
async fn test_admin_api_requires_session() -> TestResult {
    let app = test_app().await?;
    let res = send(&app, Method::GET, "/api/admin/users", None, None).await?;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.body["error"], "Authentication required");

    let res = send(&app, Method::GET, "/api/admin/users", Some("admin_token=forged"), None).await?;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn test_admin_page_redirects_to_login() -> TestResult {
    let app = test_app().await?;
    let res = send(&app, Method::GET, "/admin/users", None, None).await?;
    assert_eq!(res.status, StatusCode::SEE_OTHER);
    assert_eq!(
        res.headers.get(header::LOCATION).and_then(|v| v.to_str().ok()),
        Some("/login?next=%2Fadmin%2Fusers")
    );

    let login = send(&app, Method::GET, "/login?next=/admin/users", None, None).await?;
    assert_eq!(login.status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn test_session_cookie_opens_pages_and_me() -> TestResult {
    let app = test_app().await?;
    let cookie = login_super_admin(&app).await?;

    let me = send(&app, Method::GET, "/api/admin/auth/me", Some(&cookie), None).await?;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.body["email"], "root@example.com");
    assert!(me.body.get("password_hash").is_none());

    let dashboard = send(&app, Method::GET, "/admin", Some(&cookie), None).await?;
    assert_eq!(dashboard.status, StatusCode::OK);

    let section = send(&app, Method::GET, "/admin/courses", Some(&cookie), None).await?;
    assert_eq!(section.status, StatusCode::OK);

    let unknown = send(&app, Method::GET, "/admin/plugins", Some(&cookie), None).await?;
    assert_eq!(unknown.status, StatusCode::NOT_FOUND);

    let logout = send(&app, Method::POST, "/api/admin/auth/logout", Some(&cookie), None).await?;
    assert_eq!(logout.status, StatusCode::NO_CONTENT);
    let cleared = logout
        .headers
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    assert!(cleared.contains("Max-Age=0"));
    Ok(())
}

#[tokio::test]
async fn test_bad_credentials_are_rejected() -> TestResult {
    let app = test_app().await?;
    login_super_admin(&app).await?;

    let res = send(
        &app,
        Method::POST,
        "/api/admin/auth/login",
        None,
        Some(json!({"email": "root@example.com", "password": "wrong-password"})),
    )
    .await?;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);

    let duplicate = send(
        &app,
        Method::POST,
        "/api/admin/auth/signup",
        None,
        Some(json!({"name": "Again", "email": "ROOT@example.com", "password": "another-pass"})),
    )
    .await?;
    assert_eq!(duplicate.status, StatusCode::CONFLICT);
    Ok(())
}

#[tokio::test]
async fn test_user_crud_lifecycle() -> TestResult {
    let app = test_app().await?;
    let cookie = login_super_admin(&app).await?;
    let c = Some(cookie.as_str());

    let created = send(
        &app,
        Method::POST,
        "/api/admin/users",
        c,
        Some(json!({"name": "Grace", "email": "grace@example.com", "plan": "pro"})),
    )
    .await?;
    assert_eq!(created.status, StatusCode::CREATED);
    let id = created.body["id"].as_i64().unwrap_or_default();
    assert!(id > 0);
    assert_eq!(created.body["plan"], "pro");

    let duplicate = send(
        &app,
        Method::POST,
        "/api/admin/users",
        c,
        Some(json!({"name": "Other", "email": "grace@example.com"})),
    )
    .await?;
    assert_eq!(duplicate.status, StatusCode::CONFLICT);

    let blank = send(
        &app,
        Method::POST,
        "/api/admin/users",
        c,
        Some(json!({"name": "  ", "email": "blank@example.com"})),
    )
    .await?;
    assert_eq!(blank.status, StatusCode::BAD_REQUEST);

    let malformed = send(&app, Method::GET, "/api/admin/users/abc", c, None).await?;
    assert_eq!(malformed.status, StatusCode::BAD_REQUEST);
    let missing = send(&app, Method::GET, "/api/admin/users/9999", c, None).await?;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);

    let patched = send(
        &app,
        Method::PATCH,
        &format!("/api/admin/users/{}", id),
        c,
        Some(json!({"name": "Grace Hopper"})),
    )
    .await?;
    assert_eq!(patched.status, StatusCode::OK);
    assert_eq!(patched.body["name"], "Grace Hopper");
    assert_eq!(patched.body["email"], "grace@example.com");

    let listed = send(&app, Method::GET, "/api/admin/users?search=hopper&limit=500", c, None).await?;
    assert_eq!(listed.status, StatusCode::OK);
    assert_eq!(listed.body["total"], 1);
    assert_eq!(listed.body["limit"], 100);
    assert_eq!(listed.body["total_pages"], 1);

    let deleted = send(&app, Method::DELETE, &format!("/api/admin/users/{}", id), c, None).await?;
    assert_eq!(deleted.status, StatusCode::OK);
    assert_eq!(deleted.body, json!({"success": true}));

    let gone = send(&app, Method::GET, &format!("/api/admin/users/{}", id), c, None).await?;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn test_public_contact_feeds_admin_list() -> TestResult {
    let app = test_app().await?;

    let invalid = send(
        &app,
        Method::POST,
        "/api/contact",
        None,
        Some(json!({"name": "Lin", "email": "not-an-email", "message": "Hi"})),
    )
    .await?;
    assert_eq!(invalid.status, StatusCode::BAD_REQUEST);

    let submitted = send(
        &app,
        Method::POST,
        "/api/contact",
        None,
        Some(json!({"name": "Lin", "email": "lin@example.com", "message": "Refund please", "category": "billing"})),
    )
    .await?;
    assert_eq!(submitted.status, StatusCode::CREATED);
    assert_eq!(submitted.body["status"], "new");

    let cookie = login_super_admin(&app).await?;
    let listed = send(&app, Method::GET, "/api/admin/contacts?status=new", Some(&cookie), None).await?;
    assert_eq!(listed.status, StatusCode::OK);
    assert_eq!(listed.body["total"], 1);

    let overview = send(&app, Method::GET, "/api/admin/analytics/overview", Some(&cookie), None).await?;
    assert_eq!(overview.status, StatusCode::OK);
    assert_eq!(overview.body["totals"]["contacts"], 1);
    assert_eq!(overview.body["totals"]["open_contacts"], 1);
    assert_eq!(overview.body["totals"]["admins"], 1);
    Ok(())
}

#[tokio::test]
async fn test_public_comments_only_reach_published_posts() -> TestResult {
    let app = test_app().await?;
    let cookie = login_super_admin(&app).await?;
    let c = Some(cookie.as_str());

    let post = send(
        &app,
        Method::POST,
        "/api/admin/blogs",
        c,
        Some(json!({"title": "Spaced Repetition 101", "content": "Review often."})),
    )
    .await?;
    assert_eq!(post.status, StatusCode::CREATED);
    assert_eq!(post.body["slug"], "spaced-repetition-101");
    let id = post.body["id"].as_i64().unwrap_or_default();

    let comment = json!({"author_name": "Sam", "content": "Nice"});
    let draft = send(&app, Method::POST, &format!("/api/blogs/{}/comments", id), None, Some(comment.clone())).await?;
    assert_eq!(draft.status, StatusCode::NOT_FOUND);

    let published = send(
        &app,
        Method::PATCH,
        &format!("/api/admin/blogs/{}", id),
        c,
        Some(json!({"status": "published"})),
    )
    .await?;
    assert_eq!(published.status, StatusCode::OK);
    assert!(!published.body["published_at"].is_null());

    let added = send(&app, Method::POST, &format!("/api/blogs/{}/comments", id), None, Some(comment)).await?;
    assert_eq!(added.status, StatusCode::CREATED);

    let liked = send(
        &app,
        Method::POST,
        &format!("/api/blogs/{}/interactions", id),
        None,
        Some(json!({"kind": "like"})),
    )
    .await?;
    assert_eq!(liked.status, StatusCode::CREATED);

    let post = send(&app, Method::GET, &format!("/api/admin/blogs/{}", id), c, None).await?;
    assert_eq!(post.body["comment_count"], 1);
    assert_eq!(post.body["like_count"], 1);

    let drift = send(&app, Method::GET, "/api/admin/blogs/counters", c, None).await?;
    assert_eq!(drift.status, StatusCode::OK);
    assert_eq!(drift.body, json!([]));
    Ok(())
}

#[tokio::test]
async fn test_settings_upsert_on_first_read() -> TestResult {
    let app = test_app().await?;
    let cookie = login_super_admin(&app).await?;

    let settings = send(&app, Method::GET, "/api/admin/settings", Some(&cookie), None).await?;
    assert_eq!(settings.status, StatusCode::OK);
    assert_eq!(settings.body["allow_signups"], true);

    let system = send(&app, Method::GET, "/api/admin/system", Some(&cookie), None).await?;
    assert_eq!(system.status, StatusCode::OK);
    assert_eq!(system.body["database"], "ok");
    assert_eq!(system.body["pending_migrations"], 0);
    Ok(())
}

/// Create one record of each kind the analytics reports read
async fn seed_report_data(app: &Router, cookie: &str) -> TestResult {
    let c = Some(cookie);
    let user = send(
        app,
        Method::POST,
        "/api/admin/users",
        c,
        Some(json!({"name": "Grace", "email": "grace@example.com", "plan": "pro", "subscription_status": "active"})),
    )
    .await?;
    assert_eq!(user.status, StatusCode::CREATED);

    let post = send(
        app,
        Method::POST,
        "/api/admin/blogs",
        c,
        Some(json!({"title": "Active Recall", "content": "Test yourself.", "category": "study-tips"})),
    )
    .await?;
    assert_eq!(post.status, StatusCode::CREATED);

    let contact = send(
        app,
        Method::POST,
        "/api/contact",
        None,
        Some(json!({"name": "Lin", "email": "lin@example.com", "message": "Where is my invoice?"})),
    )
    .await?;
    assert_eq!(contact.status, StatusCode::CREATED);

    let payment = send(
        app,
        Method::POST,
        "/api/admin/billing",
        c,
        Some(json!({"user_id": user.body["id"], "plan": "pro", "amount_cents": 1900, "status": "paid"})),
    )
    .await?;
    assert_eq!(payment.status, StatusCode::CREATED);
    Ok(())
}

async fn report(app: &Router, cookie: &str, name: &str) -> TestResult<Value> {
    let uri = format!("/api/admin/analytics/{}?date=2026-10-18", name);
    let res = send(app, Method::GET, &uri, Some(cookie), None).await?;
    assert_eq!(res.status, StatusCode::OK, "{}", name);
    Ok(res.body)
}

#[tokio::test]
async fn test_engagement_report_is_anchored() -> TestResult {
    let app = test_app().await?;
    let cookie = login_super_admin(&app).await?;
    seed_report_data(&app, &cookie).await?;

    let body = report(&app, &cookie, "engagement").await?;
    let daily = body["interactions"]["daily"].as_array().cloned().unwrap_or_default();
    assert_eq!(daily.len(), 30);
    assert_eq!(daily[0]["key"], "2026-09-19");
    assert_eq!(daily[29]["key"], "2026-10-18");
    assert_eq!(body["comments"]["monthly"][11]["key"], "2026-10");
    assert_eq!(body["comments"]["monthly"][0]["label"], "Nov 2025");
    assert!(body["interaction_kinds"].is_array());
    Ok(())
}

#[tokio::test]
async fn test_contacts_report_is_anchored() -> TestResult {
    let app = test_app().await?;
    let cookie = login_super_admin(&app).await?;
    seed_report_data(&app, &cookie).await?;

    let body = report(&app, &cookie, "contacts").await?;
    assert_eq!(body["daily"].as_array().map(Vec::len), Some(30));
    assert_eq!(body["daily"][29]["label"], "Oct 18");
    assert_eq!(body["statuses"][0]["label"], "New");
    assert_eq!(body["statuses"][0]["count"], 1);
    assert_eq!(body["categories"][0]["label"], "General");
    assert_eq!(body["resolved_count"], 0);
    assert_eq!(body["avg_resolution_hours"], 0.0);
    Ok(())
}

#[tokio::test]
async fn test_posts_report_is_anchored() -> TestResult {
    let app = test_app().await?;
    let cookie = login_super_admin(&app).await?;
    seed_report_data(&app, &cookie).await?;

    let body = report(&app, &cookie, "posts").await?;
    assert_eq!(body["monthly"].as_array().map(Vec::len), Some(12));
    assert_eq!(body["monthly"][11]["key"], "2026-10");
    assert_eq!(body["categories"][0]["label"], "Study Tips");
    assert_eq!(body["statuses"][0]["label"], "Draft");
    assert_eq!(body["top_posts"].as_array().map(Vec::len), Some(1));
    assert_eq!(body["top_posts"][0]["slug"], "active-recall");
    Ok(())
}

#[tokio::test]
async fn test_users_report_is_anchored() -> TestResult {
    let app = test_app().await?;
    let cookie = login_super_admin(&app).await?;
    seed_report_data(&app, &cookie).await?;

    let body = report(&app, &cookie, "users").await?;
    assert_eq!(body["daily"][29]["key"], "2026-10-18");
    assert_eq!(body["monthly"][11]["key"], "2026-10");
    assert_eq!(body["plans"], json!([{"key": "pro", "label": "Pro", "count": 1}]));
    assert_eq!(body["subscriptions"][0]["label"], "Active");
    Ok(())
}

#[tokio::test]
async fn test_revenue_report_is_anchored() -> TestResult {
    let app = test_app().await?;
    let cookie = login_super_admin(&app).await?;
    seed_report_data(&app, &cookie).await?;

    let body = report(&app, &cookie, "revenue").await?;
    assert_eq!(body["monthly"].as_array().map(Vec::len), Some(12));
    assert_eq!(body["monthly"][0]["key"], "2025-11");
    assert_eq!(body["monthly"][11]["key"], "2026-10");
    assert!(body["total_cents"].is_i64());
    assert_eq!(body["statuses"], json!([{"key": "paid", "label": "Paid", "count": 1}]));
    Ok(())
}

#[tokio::test]
async fn test_report_date_out_of_range_is_rejected() -> TestResult {
    let app = test_app().await?;
    let cookie = login_super_admin(&app).await?;
    let c = Some(cookie.as_str());

    for name in ["engagement", "contacts", "posts", "users", "revenue"] {
        let uri = format!("/api/admin/analytics/{}?date=0001-01-05", name);
        let res = send(&app, Method::GET, &uri, c, None).await?;
        assert_eq!(res.status, StatusCode::BAD_REQUEST, "{}", name);
        assert!(res.body["error"].as_str().unwrap_or_default().contains("1970"));
    }

    let res = send(&app, Method::GET, "/api/admin/analytics/users?date=yesterday", c, None).await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn test_reset_link_opens_new_password_form() -> TestResult {
    let app = test_app().await?;
    let res = send(&app, Method::GET, "/login?reset=0123abcd", None, None).await?;
    assert_eq!(res.status, StatusCode::OK);
    let html = res.body.as_str().unwrap_or_default();
    assert!(html.contains(r#"<form id="reset-form">"#));
    assert!(html.contains("/api/admin/auth/reset-password"));
    assert!(html.contains("\"0123abcd\""));
    Ok(())
}
