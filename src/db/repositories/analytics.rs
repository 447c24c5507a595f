//! Read-only queries feeding the analytics reports
//!
//! Table and column names come from closed enums, never from request input,
//! so they are safe to splice into SQL text.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

use crate::db::DynDatabasePool;

/// Tables whose `created_at` column is bucketed into time series
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventSource {
    Interactions,
    Comments,
    Contacts,
    Posts,
    Users,
}

impl EventSource {
    fn table(self) -> &'static str {
        match self {
            EventSource::Interactions => "interactions",
            EventSource::Comments => "comments",
            EventSource::Contacts => "contacts",
            EventSource::Posts => "posts",
            EventSource::Users => "users",
        }
    }
}

/// Nominal fields that can be group-counted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    InteractionKind,
    ContactStatus,
    ContactCategory,
    PostCategory,
    PostStatus,
    UserPlan,
    SubscriptionStatus,
    BillingStatus,
    CourseCategory,
    CardSetCategory,
}

impl Dimension {
    fn source(self) -> (&'static str, &'static str) {
        match self {
            Dimension::InteractionKind => ("interactions", "kind"),
            Dimension::ContactStatus => ("contacts", "status"),
            Dimension::ContactCategory => ("contacts", "category"),
            Dimension::PostCategory => ("posts", "category"),
            Dimension::PostStatus => ("posts", "status"),
            Dimension::UserPlan => ("users", "plan"),
            Dimension::SubscriptionStatus => ("users", "subscription_status"),
            Dimension::BillingStatus => ("billing_transactions", "status"),
            Dimension::CourseCategory => ("courses", "category"),
            Dimension::CardSetCategory => ("card_sets", "category"),
        }
    }
}

/// Row counts shown on the dashboard cards
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EntityTotals {
    pub users: i64,
    pub courses: i64,
    pub card_sets: i64,
    pub tests: i64,
    pub posts: i64,
    pub contacts: i64,
    pub open_contacts: i64,
    pub admins: i64,
}

/// A post ranked by cached view count
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopPost {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub views: i64,
    pub likes: i64,
    pub comments: i64,
}

#[async_trait]
pub trait AnalyticsRepository: Send + Sync {
    /// Raw `created_at` strings of rows created at or after `since`
    async fn timestamps(&self, source: EventSource, since: &str) -> Result<Vec<String>>;

    /// One entry per row; `None` where the column is NULL
    async fn field_values(&self, dimension: Dimension) -> Result<Vec<Option<String>>>;

    /// `(created_at, updated_at)` of every resolved contact
    async fn resolved_contact_spans(&self) -> Result<Vec<(String, String)>>;

    /// `(created_at, amount_cents)` of paid transactions created at or after `since`
    async fn paid_amounts(&self, since: &str) -> Result<Vec<(String, i64)>>;

    async fn entity_totals(&self) -> Result<EntityTotals>;

    async fn top_posts(&self, limit: i64) -> Result<Vec<TopPost>>;
}

pub struct SqlxAnalyticsRepository {
    pool: DynDatabasePool,
}

impl SqlxAnalyticsRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn AnalyticsRepository> {
        Arc::new(Self::new(pool))
    }

    fn db(&self) -> &SqlitePool {
        self.pool.as_sqlite()
    }
}

#[async_trait]
impl AnalyticsRepository for SqlxAnalyticsRepository {
    async fn timestamps(&self, source: EventSource, since: &str) -> Result<Vec<String>> {
        let sql = format!(
            "SELECT created_at FROM {} WHERE created_at >= ? ORDER BY created_at",
            source.table()
        );
        sqlx::query_scalar::<_, String>(&sql)
            .bind(since)
            .fetch_all(self.db())
            .await
            .with_context(|| format!("Failed to read {} timestamps", source.table()))
    }

    async fn field_values(&self, dimension: Dimension) -> Result<Vec<Option<String>>> {
        let (table, column) = dimension.source();
        let sql = format!("SELECT {} FROM {}", column, table);
        sqlx::query_scalar::<_, Option<String>>(&sql)
            .fetch_all(self.db())
            .await
            .with_context(|| format!("Failed to read {}.{}", table, column))
    }

    async fn resolved_contact_spans(&self) -> Result<Vec<(String, String)>> {
        let rows = sqlx::query("SELECT created_at, updated_at FROM contacts WHERE status = 'resolved'")
            .fetch_all(self.db())
            .await
            .context("Failed to read resolved contacts")?;
        rows.iter()
            .map(|row| Ok((row.try_get("created_at")?, row.try_get("updated_at")?)))
            .collect()
    }

    async fn paid_amounts(&self, since: &str) -> Result<Vec<(String, i64)>> {
        let rows = sqlx::query(
            "SELECT created_at, amount_cents FROM billing_transactions WHERE status = 'paid' AND created_at >= ?",
        )
        .bind(since)
        .fetch_all(self.db())
        .await
        .context("Failed to read paid transactions")?;
        rows.iter()
            .map(|row| Ok((row.try_get("created_at")?, row.try_get("amount_cents")?)))
            .collect()
    }

    async fn entity_totals(&self) -> Result<EntityTotals> {
        let row = sqlx::query(
            r#"
            SELECT
                (SELECT COUNT(*) FROM users) AS users,
                (SELECT COUNT(*) FROM courses) AS courses,
                (SELECT COUNT(*) FROM card_sets) AS card_sets,
                (SELECT COUNT(*) FROM tests) AS tests,
                (SELECT COUNT(*) FROM posts) AS posts,
                (SELECT COUNT(*) FROM contacts) AS contacts,
                (SELECT COUNT(*) FROM contacts WHERE status IN ('new', 'in-progress')) AS open_contacts,
                (SELECT COUNT(*) FROM admins) AS admins
            "#,
        )
        .fetch_one(self.db())
        .await
        .context("Failed to count entities")?;

        Ok(EntityTotals {
            users: row.try_get("users")?,
            courses: row.try_get("courses")?,
            card_sets: row.try_get("card_sets")?,
            tests: row.try_get("tests")?,
            posts: row.try_get("posts")?,
            contacts: row.try_get("contacts")?,
            open_contacts: row.try_get("open_contacts")?,
            admins: row.try_get("admins")?,
        })
    }

    async fn top_posts(&self, limit: i64) -> Result<Vec<TopPost>> {
        let rows = sqlx::query(
            r#"
            SELECT id, title, slug, view_count, like_count, comment_count
            FROM posts
            ORDER BY view_count DESC, id ASC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(self.db())
        .await
        .context("Failed to read top posts")?;

        rows.iter()
            .map(|row| {
                Ok(TopPost {
                    id: row.try_get("id")?,
                    title: row.try_get("title")?,
                    slug: row.try_get("slug")?,
                    views: row.try_get("view_count")?,
                    likes: row.try_get("like_count")?,
                    comments: row.try_get("comment_count")?,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    async fn setup() -> (DynDatabasePool, SqlxAnalyticsRepository) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        (pool.clone(), SqlxAnalyticsRepository::new(pool))
    }

    async fn exec(pool: &DynDatabasePool, sql: &str) {
        sqlx::query(sql).execute(pool.as_sqlite()).await.unwrap();
    }

    #[tokio::test]
    async fn test_timestamps_respect_since() {
        let (pool, repo) = setup().await;
        exec(&pool, "INSERT INTO contacts (name, email, message, created_at, updated_at) VALUES ('a', 'a@x.io', 'm', '2026-09-01T08:00:00+00:00', '2026-09-01T08:00:00+00:00')").await;
        exec(&pool, "INSERT INTO contacts (name, email, message, created_at, updated_at) VALUES ('b', 'b@x.io', 'm', '2026-10-10T08:00:00+00:00', '2026-10-10T08:00:00+00:00')").await;

        let stamps = repo.timestamps(EventSource::Contacts, "2026-10-01").await.unwrap();
        assert_eq!(stamps, vec!["2026-10-10T08:00:00+00:00".to_string()]);
    }

    #[tokio::test]
    async fn test_field_values_keep_nulls() {
        let (pool, repo) = setup().await;
        exec(&pool, "INSERT INTO courses (title, category, created_at, updated_at) VALUES ('a', 'math', '2026-10-01T00:00:00+00:00', '2026-10-01T00:00:00+00:00')").await;
        exec(&pool, "INSERT INTO courses (title, created_at, updated_at) VALUES ('b', '2026-10-01T00:00:00+00:00', '2026-10-01T00:00:00+00:00')").await;

        let mut values = repo.field_values(Dimension::CourseCategory).await.unwrap();
        values.sort();
        assert_eq!(values, vec![None, Some("math".to_string())]);
    }

    #[tokio::test]
    async fn test_entity_totals_and_top_posts() {
        let (pool, repo) = setup().await;
        exec(&pool, "INSERT INTO posts (title, slug, content, view_count, created_at, updated_at) VALUES ('Low', 'low', 'c', 3, '2026-10-01T00:00:00+00:00', '2026-10-01T00:00:00+00:00')").await;
        exec(&pool, "INSERT INTO posts (title, slug, content, view_count, created_at, updated_at) VALUES ('High', 'high', 'c', 30, '2026-10-01T00:00:00+00:00', '2026-10-01T00:00:00+00:00')").await;
        exec(&pool, "INSERT INTO contacts (name, email, message, status, created_at, updated_at) VALUES ('a', 'a@x.io', 'm', 'resolved', '2026-10-01T00:00:00+00:00', '2026-10-01T02:00:00+00:00')").await;

        let totals = repo.entity_totals().await.unwrap();
        assert_eq!(totals.posts, 2);
        assert_eq!(totals.contacts, 1);
        assert_eq!(totals.open_contacts, 0);

        let top = repo.top_posts(1).await.unwrap();
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].slug, "high");

        let spans = repo.resolved_contact_spans().await.unwrap();
        assert_eq!(spans.len(), 1);
    }
}
