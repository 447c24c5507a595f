use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

use super::query::{fetch_page, get_enum, ListQuery};
use crate::db::DynDatabasePool;
use crate::models::{ListParams, Notification, PagedResult};

const NOTIFICATION_COLUMNS: &str =
    "id, title, message, audience, kind, is_read, scheduled_at, sent_at, created_at, updated_at";

#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn create(&self, notification: &Notification) -> Result<Notification>;
    async fn get_by_id(&self, id: i64) -> Result<Option<Notification>>;
    async fn update(&self, notification: &Notification) -> Result<Notification>;
    async fn delete(&self, id: i64) -> Result<bool>;
    /// Filters: `audience`, `status` (`read` / `unread`)
    async fn list(&self, params: &ListParams) -> Result<PagedResult<Notification>>;
    async fn mark_sent(&self, id: i64, at: DateTime<Utc>) -> Result<bool>;
    async fn mark_all_read(&self) -> Result<u64>;
}

pub struct SqlxNotificationRepository {
    pool: DynDatabasePool,
}

impl SqlxNotificationRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn NotificationRepository> {
        Arc::new(Self::new(pool))
    }

    fn db(&self) -> &SqlitePool {
        self.pool.as_sqlite()
    }
}

#[async_trait]
impl NotificationRepository for SqlxNotificationRepository {
    async fn create(&self, notification: &Notification) -> Result<Notification> {
        let result = sqlx::query(
            r#"
            INSERT INTO notifications (title, message, audience, kind, is_read, scheduled_at, sent_at, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(notification.audience.as_str())
        .bind(notification.kind.as_str())
        .bind(notification.is_read)
        .bind(notification.scheduled_at)
        .bind(notification.sent_at)
        .bind(notification.created_at)
        .bind(notification.updated_at)
        .execute(self.db())
        .await
        .context("Failed to create notification")?;

        Ok(Notification {
            id: result.last_insert_rowid(),
            ..notification.clone()
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Notification>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM notifications WHERE id = ?",
            NOTIFICATION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(self.db())
        .await
        .context("Failed to get notification by ID")?;
        row.as_ref().map(row_to_notification).transpose()
    }

    async fn update(&self, notification: &Notification) -> Result<Notification> {
        sqlx::query(
            r#"
            UPDATE notifications
            SET title = ?, message = ?, audience = ?, kind = ?, is_read = ?, scheduled_at = ?,
                sent_at = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(notification.audience.as_str())
        .bind(notification.kind.as_str())
        .bind(notification.is_read)
        .bind(notification.scheduled_at)
        .bind(notification.sent_at)
        .bind(notification.updated_at)
        .bind(notification.id)
        .execute(self.db())
        .await
        .context("Failed to update notification")?;
        Ok(notification.clone())
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = ?")
            .bind(id)
            .execute(self.db())
            .await
            .context("Failed to delete notification")?;
        Ok(result.rows_affected() > 0)
    }

    async fn list(&self, params: &ListParams) -> Result<PagedResult<Notification>> {
        let is_read = match params.status.as_deref() {
            Some("read") => Some("1"),
            Some("unread") => Some("0"),
            _ => None,
        };
        let list = ListQuery {
            table: "notifications",
            columns: NOTIFICATION_COLUMNS,
            search_columns: &["title", "message"],
            filters: vec![
                ("audience", params.audience.as_deref()),
                ("is_read", is_read),
            ],
        };
        fetch_page(self.db(), list, params, row_to_notification).await
    }

    async fn mark_sent(&self, id: i64, at: DateTime<Utc>) -> Result<bool> {
        let result = sqlx::query("UPDATE notifications SET sent_at = ?, updated_at = ? WHERE id = ?")
            .bind(at)
            .bind(at)
            .bind(id)
            .execute(self.db())
            .await
            .context("Failed to mark notification sent")?;
        Ok(result.rows_affected() > 0)
    }

    async fn mark_all_read(&self) -> Result<u64> {
        let result = sqlx::query("UPDATE notifications SET is_read = 1, updated_at = ? WHERE is_read = 0")
            .bind(Utc::now())
            .execute(self.db())
            .await
            .context("Failed to mark notifications read")?;
        Ok(result.rows_affected())
    }
}

fn row_to_notification(row: &SqliteRow) -> Result<Notification> {
    Ok(Notification {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        message: row.try_get("message")?,
        audience: get_enum(row, "audience")?,
        kind: get_enum(row, "kind")?,
        is_read: row.try_get("is_read")?,
        scheduled_at: row.try_get("scheduled_at")?,
        sent_at: row.try_get("sent_at")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
