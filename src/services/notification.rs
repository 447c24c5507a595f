//! Platform notifications
//!
//! Sending only stamps `sent_at`; delivery to learners happens elsewhere.

use chrono::Utc;
use std::sync::Arc;

use super::validation::require;
use super::{ServiceError, ServiceResult};
use crate::db::repositories::NotificationRepository;
use crate::models::{
    CreateNotificationInput, ListParams, Notification, PagedResult, UpdateNotificationInput,
};

pub struct NotificationService {
    repo: Arc<dyn NotificationRepository>,
}

impl NotificationService {
    pub fn new(repo: Arc<dyn NotificationRepository>) -> Self {
        Self { repo }
    }

    pub async fn list(&self, params: ListParams) -> ServiceResult<PagedResult<Notification>> {
        Ok(self.repo.list(&params.normalized()).await?)
    }

    pub async fn get(&self, id: i64) -> ServiceResult<Notification> {
        self.repo
            .get_by_id(id)
            .await?
            .ok_or(ServiceError::NotFound("Notification"))
    }

    pub async fn create(&self, input: CreateNotificationInput) -> ServiceResult<Notification> {
        require("Title", &input.title)?;
        require("Message", &input.message)?;
        Ok(self.repo.create(&Notification::from_input(input)).await?)
    }

    pub async fn update(&self, id: i64, input: UpdateNotificationInput) -> ServiceResult<Notification> {
        if let Some(title) = &input.title {
            require("Title", title)?;
        }
        if let Some(message) = &input.message {
            require("Message", message)?;
        }

        let mut notification = self.get(id).await?;
        notification.apply(input);
        Ok(self.repo.update(&notification).await?)
    }

    pub async fn delete(&self, id: i64) -> ServiceResult<()> {
        if !self.repo.delete(id).await? {
            return Err(ServiceError::NotFound("Notification"));
        }
        Ok(())
    }

    /// Stamp `sent_at` with the current time
    pub async fn send(&self, id: i64) -> ServiceResult<Notification> {
        if !self.repo.mark_sent(id, Utc::now()).await? {
            return Err(ServiceError::NotFound("Notification"));
        }
        let notification = self.get(id).await?;
        tracing::info!(notification_id = id, audience = %notification.audience, "Notification sent");
        Ok(notification)
    }

    /// Returns how many notifications changed
    pub async fn mark_all_read(&self) -> ServiceResult<u64> {
        Ok(self.repo.mark_all_read().await?)
    }
}
