use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

use super::query::{fetch_page, get_enum, get_json, ListQuery};
use crate::db::DynDatabasePool;
use crate::models::{ListParams, PagedResult, Quiz};

const QUIZ_COLUMNS: &str = "id, owner_id, title, description, category, difficulty, questions, attempt_count, created_at, updated_at";

#[async_trait]
pub trait QuizRepository: Send + Sync {
    async fn create(&self, quiz: &Quiz) -> Result<Quiz>;
    async fn get_by_id(&self, id: i64) -> Result<Option<Quiz>>;
    async fn update(&self, quiz: &Quiz) -> Result<Quiz>;
    async fn delete(&self, id: i64) -> Result<bool>;
    async fn list(&self, params: &ListParams) -> Result<PagedResult<Quiz>>;
}

/// Backed by the `tests` table
pub struct SqlxQuizRepository {
    pool: DynDatabasePool,
}

impl SqlxQuizRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn QuizRepository> {
        Arc::new(Self::new(pool))
    }

    fn db(&self) -> &SqlitePool {
        self.pool.as_sqlite()
    }
}

#[async_trait]
impl QuizRepository for SqlxQuizRepository {
    async fn create(&self, quiz: &Quiz) -> Result<Quiz> {
        let questions = serde_json::to_string(&quiz.questions)?;
        let result = sqlx::query(
            r#"
            INSERT INTO tests (owner_id, title, description, category, difficulty, questions,
                attempt_count, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(quiz.owner_id)
        .bind(&quiz.title)
        .bind(&quiz.description)
        .bind(&quiz.category)
        .bind(quiz.difficulty.as_str())
        .bind(questions)
        .bind(quiz.attempt_count)
        .bind(quiz.created_at)
        .bind(quiz.updated_at)
        .execute(self.db())
        .await
        .context("Failed to create test")?;

        Ok(Quiz {
            id: result.last_insert_rowid(),
            ..quiz.clone()
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Quiz>> {
        let row = sqlx::query(&format!("SELECT {} FROM tests WHERE id = ?", QUIZ_COLUMNS))
            .bind(id)
            .fetch_optional(self.db())
            .await
            .context("Failed to get test by ID")?;
        row.as_ref().map(row_to_quiz).transpose()
    }

    async fn update(&self, quiz: &Quiz) -> Result<Quiz> {
        let questions = serde_json::to_string(&quiz.questions)?;
        sqlx::query(
            r#"
            UPDATE tests
            SET title = ?, description = ?, category = ?, difficulty = ?, questions = ?,
                attempt_count = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&quiz.title)
        .bind(&quiz.description)
        .bind(&quiz.category)
        .bind(quiz.difficulty.as_str())
        .bind(questions)
        .bind(quiz.attempt_count)
        .bind(quiz.updated_at)
        .bind(quiz.id)
        .execute(self.db())
        .await
        .context("Failed to update test")?;
        Ok(quiz.clone())
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM tests WHERE id = ?")
            .bind(id)
            .execute(self.db())
            .await
            .context("Failed to delete test")?;
        Ok(result.rows_affected() > 0)
    }

    async fn list(&self, params: &ListParams) -> Result<PagedResult<Quiz>> {
        let list = ListQuery {
            table: "tests",
            columns: QUIZ_COLUMNS,
            search_columns: &["title", "description"],
            filters: vec![
                ("category", params.category.as_deref()),
                ("difficulty", params.difficulty.as_deref()),
            ],
        };
        fetch_page(self.db(), list, params, row_to_quiz).await
    }
}

fn row_to_quiz(row: &SqliteRow) -> Result<Quiz> {
    Ok(Quiz {
        id: row.try_get("id")?,
        owner_id: row.try_get("owner_id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        category: row.try_get("category")?,
        difficulty: get_enum(row, "difficulty")?,
        questions: get_json(row, "questions")?,
        attempt_count: row.try_get("attempt_count")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
