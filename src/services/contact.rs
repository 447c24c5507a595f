//! Contact submissions: public intake and admin triage

use std::sync::Arc;

use super::validation::{require, require_email};
use super::{ServiceError, ServiceResult};
use crate::db::repositories::ContactRepository;
use crate::models::{Contact, CreateContactInput, ListParams, PagedResult, UpdateContactInput};

pub struct ContactService {
    repo: Arc<dyn ContactRepository>,
}

impl ContactService {
    pub fn new(repo: Arc<dyn ContactRepository>) -> Self {
        Self { repo }
    }

    pub async fn list(&self, params: ListParams) -> ServiceResult<PagedResult<Contact>> {
        Ok(self.repo.list(&params.normalized()).await?)
    }

    pub async fn get(&self, id: i64) -> ServiceResult<Contact> {
        self.repo
            .get_by_id(id)
            .await?
            .ok_or(ServiceError::NotFound("Contact"))
    }

    /// Store a new submission with status `new`
    pub async fn submit(&self, input: CreateContactInput) -> ServiceResult<Contact> {
        require("Name", &input.name)?;
        require_email(&input.email)?;
        require("Message", &input.message)?;

        let contact = self.repo.create(&Contact::from_input(input)).await?;
        tracing::info!(contact_id = contact.id, category = ?contact.category, "Contact submission received");
        Ok(contact)
    }

    /// Change status and admin notes
    pub async fn update(&self, id: i64, input: UpdateContactInput) -> ServiceResult<Contact> {
        let mut contact = self.get(id).await?;
        let previous = contact.status;
        contact.apply(input);

        let contact = self.repo.update(&contact).await?;
        if contact.status != previous {
            tracing::info!(contact_id = id, from = %previous, to = %contact.status, "Contact status changed");
        }
        Ok(contact)
    }

    pub async fn delete(&self, id: i64) -> ServiceResult<()> {
        if !self.repo.delete(id).await? {
            return Err(ServiceError::NotFound("Contact"));
        }
        Ok(())
    }
}
