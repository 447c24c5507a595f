//! Comment and interaction repositories
//!
//! Both tables are append-only event logs keyed by post; deleting a comment
//! is the only removal and always happens through moderation.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

use super::query::get_enum;
use crate::db::DynDatabasePool;
use crate::models::{Comment, Interaction};

#[async_trait]
pub trait CommentRepository: Send + Sync {
    async fn create(&self, comment: &Comment) -> Result<Comment>;
    async fn get_by_id(&self, id: i64) -> Result<Option<Comment>>;
    /// Oldest first
    async fn list_for_post(&self, post_id: i64) -> Result<Vec<Comment>>;
    async fn delete(&self, id: i64) -> Result<bool>;
}

pub struct SqlxCommentRepository {
    pool: DynDatabasePool,
}

impl SqlxCommentRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn CommentRepository> {
        Arc::new(Self::new(pool))
    }

    fn db(&self) -> &SqlitePool {
        self.pool.as_sqlite()
    }
}

#[async_trait]
impl CommentRepository for SqlxCommentRepository {
    async fn create(&self, comment: &Comment) -> Result<Comment> {
        let result = sqlx::query(
            "INSERT INTO comments (post_id, user_id, author_name, content, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(comment.post_id)
        .bind(comment.user_id)
        .bind(&comment.author_name)
        .bind(&comment.content)
        .bind(comment.created_at)
        .execute(self.db())
        .await
        .context("Failed to create comment")?;

        Ok(Comment {
            id: result.last_insert_rowid(),
            ..comment.clone()
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Comment>> {
        let row = sqlx::query(
            "SELECT id, post_id, user_id, author_name, content, created_at FROM comments WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.db())
        .await
        .context("Failed to get comment by ID")?;
        row.as_ref().map(row_to_comment).transpose()
    }

    async fn list_for_post(&self, post_id: i64) -> Result<Vec<Comment>> {
        let rows = sqlx::query(
            r#"
            SELECT id, post_id, user_id, author_name, content, created_at
            FROM comments WHERE post_id = ?
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(post_id)
        .fetch_all(self.db())
        .await
        .context("Failed to list comments")?;
        rows.iter().map(row_to_comment).collect()
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM comments WHERE id = ?")
            .bind(id)
            .execute(self.db())
            .await
            .context("Failed to delete comment")?;
        Ok(result.rows_affected() > 0)
    }
}

fn row_to_comment(row: &SqliteRow) -> Result<Comment> {
    Ok(Comment {
        id: row.try_get("id")?,
        post_id: row.try_get("post_id")?,
        user_id: row.try_get("user_id")?,
        author_name: row.try_get("author_name")?,
        content: row.try_get("content")?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
pub trait InteractionRepository: Send + Sync {
    async fn record(&self, interaction: &Interaction) -> Result<Interaction>;
    async fn list_for_post(&self, post_id: i64) -> Result<Vec<Interaction>>;
}

pub struct SqlxInteractionRepository {
    pool: DynDatabasePool,
}

impl SqlxInteractionRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn InteractionRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl InteractionRepository for SqlxInteractionRepository {
    async fn record(&self, interaction: &Interaction) -> Result<Interaction> {
        let result = sqlx::query(
            "INSERT INTO interactions (post_id, user_id, kind, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(interaction.post_id)
        .bind(interaction.user_id)
        .bind(interaction.kind.as_str())
        .bind(interaction.created_at)
        .execute(self.pool.as_sqlite())
        .await
        .context("Failed to record interaction")?;

        Ok(Interaction {
            id: result.last_insert_rowid(),
            ..interaction.clone()
        })
    }

    async fn list_for_post(&self, post_id: i64) -> Result<Vec<Interaction>> {
        let rows = sqlx::query(
            "SELECT id, post_id, user_id, kind, created_at FROM interactions WHERE post_id = ? ORDER BY id",
        )
        .bind(post_id)
        .fetch_all(self.pool.as_sqlite())
        .await
        .context("Failed to list interactions")?;

        rows.iter()
            .map(|row| {
                Ok(Interaction {
                    id: row.try_get("id")?,
                    post_id: row.try_get("post_id")?,
                    user_id: row.try_get("user_id")?,
                    kind: get_enum(row, "kind")?,
                    created_at: row.try_get("created_at")?,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};
    use crate::models::InteractionKind;
    use chrono::{Duration, Utc};

    async fn setup() -> DynDatabasePool {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        sqlx::query(
            "INSERT INTO posts (title, slug, content, created_at, updated_at) VALUES ('t', 't', 'c', '2026-01-01T00:00:00+00:00', '2026-01-01T00:00:00+00:00')",
        )
        .execute(pool.as_sqlite())
        .await
        .unwrap();
        pool
    }

    fn comment(content: &str, offset_minutes: i64) -> Comment {
        Comment {
            id: 0,
            post_id: 1,
            user_id: None,
            author_name: "Reader".to_string(),
            content: content.to_string(),
            created_at: Utc::now() + Duration::minutes(offset_minutes),
        }
    }

    #[tokio::test]
    async fn test_comments_listed_oldest_first() {
        let repo = SqlxCommentRepository::new(setup().await);
        repo.create(&comment("second", 5)).await.unwrap();
        let first = repo.create(&comment("first", 0)).await.unwrap();

        let comments = repo.list_for_post(1).await.unwrap();
        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0].content, "first");

        assert!(repo.delete(first.id).await.unwrap());
        assert!(repo.get_by_id(first.id).await.unwrap().is_none());
        assert!(!repo.delete(first.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_comment_on_missing_post_is_rejected() {
        let repo = SqlxCommentRepository::new(setup().await);
        let mut orphan = comment("lost", 0);
        orphan.post_id = 42;
        assert!(repo.create(&orphan).await.is_err());
    }

    #[tokio::test]
    async fn test_record_interaction() {
        let repo = SqlxInteractionRepository::new(setup().await);
        let recorded = repo
            .record(&Interaction {
                id: 0,
                post_id: 1,
                user_id: Some(3),
                kind: InteractionKind::Bookmark,
                created_at: Utc::now(),
            })
            .await
            .unwrap();
        assert!(recorded.id > 0);

        let all = repo.list_for_post(1).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].kind, InteractionKind::Bookmark);
    }
}
