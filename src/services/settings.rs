//! Platform settings service
//!
//! The settings document is created with defaults the first time it is read.

use std::sync::Arc;

use super::validation::{require, require_email, require_non_negative};
use super::ServiceResult;
use crate::db::repositories::SettingsRepository;
use crate::models::PlatformSettings;

pub struct SettingsService {
    repo: Arc<dyn SettingsRepository>,
}

impl SettingsService {
    pub fn new(repo: Arc<dyn SettingsRepository>) -> Self {
        Self { repo }
    }

    /// Current settings, persisting the defaults on first read
    pub async fn get(&self) -> ServiceResult<PlatformSettings> {
        if let Some(settings) = self.repo.load().await? {
            return Ok(settings);
        }
        tracing::info!("Initializing platform settings with defaults");
        Ok(self.repo.save(&PlatformSettings::default()).await?)
    }

    /// Replace the whole document
    pub async fn replace(&self, settings: PlatformSettings) -> ServiceResult<PlatformSettings> {
        require("Site name", &settings.site_name)?;
        require_email(&settings.support_email)?;
        require_non_negative("Free card set limit", settings.free_card_set_limit)?;
        require_non_negative("Free test limit", settings.free_test_limit)?;

        let saved = self.repo.save(&settings).await?;
        tracing::info!("Platform settings updated");
        Ok(saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::SqlxSettingsRepository;
    use crate::db::{create_test_pool, migrations};
    use crate::services::ServiceError;

    async fn service() -> SettingsService {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        SettingsService::new(SqlxSettingsRepository::boxed(pool))
    }

    #[tokio::test]
    async fn test_first_read_persists_defaults() {
        let service = service().await;
        let first = service.get().await.unwrap();
        assert!(first.updated_at.is_some());

        let second = service.get().await.unwrap();
        assert_eq!(first.updated_at, second.updated_at);
    }

    #[tokio::test]
    async fn test_replace_validates() {
        let service = service().await;

        let mut settings = service.get().await.unwrap();
        settings.support_email = "not-an-email".to_string();
        assert!(matches!(service.replace(settings).await, Err(ServiceError::Validation(_))));

        let mut settings = service.get().await.unwrap();
        settings.maintenance_mode = true;
        let saved = service.replace(settings).await.unwrap();
        assert!(saved.maintenance_mode);
        assert!(service.get().await.unwrap().maintenance_mode);
    }
}
