//! Platform settings repository
//!
//! Settings live in a single-row table (`id = 1`) as one JSON document.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use std::sync::Arc;

use crate::db::DynDatabasePool;
use crate::models::PlatformSettings;

#[async_trait]
pub trait SettingsRepository: Send + Sync {
    /// The stored document, if one was ever written
    async fn load(&self) -> Result<Option<PlatformSettings>>;

    /// Replace the stored document, returning it with `updated_at` set
    async fn save(&self, settings: &PlatformSettings) -> Result<PlatformSettings>;
}

/// SQLx-based settings repository
pub struct SqlxSettingsRepository {
    pool: DynDatabasePool,
}

impl SqlxSettingsRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn SettingsRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl SettingsRepository for SqlxSettingsRepository {
    async fn load(&self) -> Result<Option<PlatformSettings>> {
        let row = sqlx::query("SELECT document FROM platform_settings WHERE id = 1")
            .fetch_optional(self.pool.as_sqlite())
            .await
            .context("Failed to load settings")?;

        match row {
            Some(row) => {
                let document: String = row.try_get("document")?;
                let settings = serde_json::from_str(&document)
                    .context("Stored settings document is not valid JSON")?;
                Ok(Some(settings))
            }
            None => Ok(None),
        }
    }

    async fn save(&self, settings: &PlatformSettings) -> Result<PlatformSettings> {
        let now = Utc::now();
        let saved = PlatformSettings {
            updated_at: Some(now),
            ..settings.clone()
        };
        let document = serde_json::to_string(&saved)?;

        sqlx::query(
            r#"
            INSERT INTO platform_settings (id, document, updated_at) VALUES (1, ?, ?)
            ON CONFLICT(id) DO UPDATE SET document = excluded.document, updated_at = excluded.updated_at
            "#,
        )
        .bind(document)
        .bind(now)
        .execute(self.pool.as_sqlite())
        .await
        .context("Failed to save settings")?;

        Ok(saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    async fn setup_test_repo() -> SqlxSettingsRepository {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        SqlxSettingsRepository::new(pool)
    }

    #[tokio::test]
    async fn test_load_empty() {
        let repo = setup_test_repo().await;
        assert!(repo.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_replaces_document() {
        let repo = setup_test_repo().await;

        let mut settings = PlatformSettings::default();
        settings.site_name = "Study Hub".to_string();
        repo.save(&settings).await.unwrap();

        settings.site_name = "Study Hub 2".to_string();
        settings.free_test_limit = 2;
        let saved = repo.save(&settings).await.unwrap();
        assert!(saved.updated_at.is_some());

        let loaded = repo.load().await.unwrap().unwrap();
        assert_eq!(loaded.site_name, "Study Hub 2");
        assert_eq!(loaded.free_test_limit, 2);
    }
}
