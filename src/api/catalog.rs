//! Learning content endpoints
//!
//! - /api/admin/courses
//! - /api/admin/flashcards
//! - /api/admin/tests

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use super::common::{created, parse_id, success};
use super::middleware::{ApiResult, AppState};
use crate::models::{
    CardSet, Course, CreateCardSetInput, CreateCourseInput, CreateQuizInput, ListParams,
    PagedResult, Quiz, UpdateCardSetInput, UpdateCourseInput, UpdateQuizInput,
};

pub fn courses_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_courses).post(create_course))
        .route(
            "/{id}",
            get(get_course)
                .put(update_course)
                .patch(update_course)
                .delete(delete_course),
        )
}

pub fn flashcards_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_card_sets).post(create_card_set))
        .route(
            "/{id}",
            get(get_card_set)
                .put(update_card_set)
                .patch(update_card_set)
                .delete(delete_card_set),
        )
}

pub fn tests_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_quizzes).post(create_quiz))
        .route(
            "/{id}",
            get(get_quiz)
                .put(update_quiz)
                .patch(update_quiz)
                .delete(delete_quiz),
        )
}

// ============================================================================
// Courses
// ============================================================================

async fn list_courses(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<PagedResult<Course>>> {
    Ok(Json(state.courses.list(params).await?))
}

async fn get_course(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Course>> {
    Ok(Json(state.courses.get(parse_id(&id)?).await?))
}

async fn create_course(
    State(state): State<AppState>,
    Json(body): Json<CreateCourseInput>,
) -> ApiResult<impl IntoResponse> {
    Ok(created(state.courses.create(body).await?))
}

async fn update_course(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<UpdateCourseInput>,
) -> ApiResult<Json<Course>> {
    Ok(Json(state.courses.update(parse_id(&id)?, body).await?))
}

async fn delete_course(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    state.courses.delete(parse_id(&id)?).await?;
    Ok(success())
}

// ============================================================================
// Flashcard sets
// ============================================================================

async fn list_card_sets(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<PagedResult<CardSet>>> {
    Ok(Json(state.card_sets.list(params).await?))
}

async fn get_card_set(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<CardSet>> {
    Ok(Json(state.card_sets.get(parse_id(&id)?).await?))
}

async fn create_card_set(
    State(state): State<AppState>,
    Json(body): Json<CreateCardSetInput>,
) -> ApiResult<impl IntoResponse> {
    Ok(created(state.card_sets.create(body).await?))
}

async fn update_card_set(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<UpdateCardSetInput>,
) -> ApiResult<Json<CardSet>> {
    Ok(Json(state.card_sets.update(parse_id(&id)?, body).await?))
}

async fn delete_card_set(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    state.card_sets.delete(parse_id(&id)?).await?;
    Ok(success())
}

// ============================================================================
// Tests
// ============================================================================

async fn list_quizzes(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<PagedResult<Quiz>>> {
    Ok(Json(state.quizzes.list(params).await?))
}

async fn get_quiz(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Quiz>> {
    Ok(Json(state.quizzes.get(parse_id(&id)?).await?))
}

async fn create_quiz(
    State(state): State<AppState>,
    Json(body): Json<CreateQuizInput>,
) -> ApiResult<impl IntoResponse> {
    Ok(created(state.quizzes.create(body).await?))
}

async fn update_quiz(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<UpdateQuizInput>,
) -> ApiResult<Json<Quiz>> {
    Ok(Json(state.quizzes.update(parse_id(&id)?, body).await?))
}

async fn delete_quiz(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    state.quizzes.delete(parse_id(&id)?).await?;
    Ok(success())
}
