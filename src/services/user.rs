//! Platform user service
//!
//! CRUD over learner accounts. Emails are unique and stored lowercase.

use std::sync::Arc;

use super::validation::{require, require_email};
use super::{ServiceError, ServiceResult};
use crate::db::repositories::UserRepository;
use crate::models::{CreateUserInput, ListParams, PagedResult, UpdateUserInput, User};

const DUPLICATE_EMAIL: &str = "A user with this email already exists";

pub struct UserService {
    repo: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(repo: Arc<dyn UserRepository>) -> Self {
        Self { repo }
    }

    pub async fn list(&self, params: ListParams) -> ServiceResult<PagedResult<User>> {
        Ok(self.repo.list(&params.normalized()).await?)
    }

    pub async fn get(&self, id: i64) -> ServiceResult<User> {
        self.repo
            .get_by_id(id)
            .await?
            .ok_or(ServiceError::NotFound("User"))
    }

    pub async fn create(&self, input: CreateUserInput) -> ServiceResult<User> {
        require("Name", &input.name)?;
        require_email(&input.email)?;

        let user = self
            .repo
            .create(&User::from_input(input))
            .await
            .map_err(|e| ServiceError::from_write(e, DUPLICATE_EMAIL))?;
        tracing::info!(user_id = user.id, "User created");
        Ok(user)
    }

    pub async fn update(&self, id: i64, input: UpdateUserInput) -> ServiceResult<User> {
        if let Some(name) = &input.name {
            require("Name", name)?;
        }
        if let Some(email) = &input.email {
            require_email(email)?;
        }

        let mut user = self.get(id).await?;
        user.apply(input);
        Ok(self
            .repo
            .update(&user)
            .await
            .map_err(|e| ServiceError::from_write(e, DUPLICATE_EMAIL))?)
    }

    pub async fn delete(&self, id: i64) -> ServiceResult<()> {
        if !self.repo.delete(id).await? {
            return Err(ServiceError::NotFound("User"));
        }
        tracing::info!(user_id = id, "User deleted");
        Ok(())
    }
}
