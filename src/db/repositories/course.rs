use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

use super::query::{fetch_page, get_enum, ListQuery};
use crate::db::DynDatabasePool;
use crate::models::{Course, ListParams, PagedResult};

const COURSE_COLUMNS: &str = "id, title, description, category, difficulty, status, instructor, price_cents, enrolled_count, created_at, updated_at";

#[async_trait]
pub trait CourseRepository: Send + Sync {
    async fn create(&self, course: &Course) -> Result<Course>;
    async fn get_by_id(&self, id: i64) -> Result<Option<Course>>;
    async fn update(&self, course: &Course) -> Result<Course>;
    async fn delete(&self, id: i64) -> Result<bool>;
    /// Filters: `status`, `category`, `difficulty`
    async fn list(&self, params: &ListParams) -> Result<PagedResult<Course>>;
}

pub struct SqlxCourseRepository {
    pool: DynDatabasePool,
}

impl SqlxCourseRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn CourseRepository> {
        Arc::new(Self::new(pool))
    }

    fn db(&self) -> &SqlitePool {
        self.pool.as_sqlite()
    }
}

#[async_trait]
impl CourseRepository for SqlxCourseRepository {
    async fn create(&self, course: &Course) -> Result<Course> {
        let result = sqlx::query(
            r#"
            INSERT INTO courses (title, description, category, difficulty, status, instructor,
                price_cents, enrolled_count, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&course.title)
        .bind(&course.description)
        .bind(&course.category)
        .bind(course.difficulty.as_str())
        .bind(course.status.as_str())
        .bind(&course.instructor)
        .bind(course.price_cents)
        .bind(course.enrolled_count)
        .bind(course.created_at)
        .bind(course.updated_at)
        .execute(self.db())
        .await
        .context("Failed to create course")?;

        Ok(Course {
            id: result.last_insert_rowid(),
            ..course.clone()
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Course>> {
        let row = sqlx::query(&format!("SELECT {} FROM courses WHERE id = ?", COURSE_COLUMNS))
            .bind(id)
            .fetch_optional(self.db())
            .await
            .context("Failed to get course by ID")?;
        row.as_ref().map(row_to_course).transpose()
    }

    async fn update(&self, course: &Course) -> Result<Course> {
        sqlx::query(
            r#"
            UPDATE courses
            SET title = ?, description = ?, category = ?, difficulty = ?, status = ?, instructor = ?,
                price_cents = ?, enrolled_count = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&course.title)
        .bind(&course.description)
        .bind(&course.category)
        .bind(course.difficulty.as_str())
        .bind(course.status.as_str())
        .bind(&course.instructor)
        .bind(course.price_cents)
        .bind(course.enrolled_count)
        .bind(course.updated_at)
        .bind(course.id)
        .execute(self.db())
        .await
        .context("Failed to update course")?;
        Ok(course.clone())
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM courses WHERE id = ?")
            .bind(id)
            .execute(self.db())
            .await
            .context("Failed to delete course")?;
        Ok(result.rows_affected() > 0)
    }

    async fn list(&self, params: &ListParams) -> Result<PagedResult<Course>> {
        let list = ListQuery {
            table: "courses",
            columns: COURSE_COLUMNS,
            search_columns: &["title", "description", "instructor"],
            filters: vec![
                ("status", params.status.as_deref()),
                ("category", params.category.as_deref()),
                ("difficulty", params.difficulty.as_deref()),
            ],
        };
        fetch_page(self.db(), list, params, row_to_course).await
    }
}

fn row_to_course(row: &SqliteRow) -> Result<Course> {
    Ok(Course {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        category: row.try_get("category")?,
        difficulty: get_enum(row, "difficulty")?,
        status: get_enum(row, "status")?,
        instructor: row.try_get("instructor")?,
        price_cents: row.try_get("price_cents")?,
        enrolled_count: row.try_get("enrolled_count")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
