use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

use super::query::{fetch_page, get_enum, ListQuery};
use crate::db::DynDatabasePool;
use crate::models::{Contact, ListParams, PagedResult};

const CONTACT_COLUMNS: &str =
    "id, name, email, subject, message, category, status, admin_notes, created_at, updated_at";

#[async_trait]
pub trait ContactRepository: Send + Sync {
    async fn create(&self, contact: &Contact) -> Result<Contact>;
    async fn get_by_id(&self, id: i64) -> Result<Option<Contact>>;
    /// Only status and admin notes are writable
    async fn update(&self, contact: &Contact) -> Result<Contact>;
    async fn delete(&self, id: i64) -> Result<bool>;
    async fn list(&self, params: &ListParams) -> Result<PagedResult<Contact>>;
}

pub struct SqlxContactRepository {
    pool: DynDatabasePool,
}

impl SqlxContactRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ContactRepository> {
        Arc::new(Self::new(pool))
    }

    fn db(&self) -> &SqlitePool {
        self.pool.as_sqlite()
    }
}

#[async_trait]
impl ContactRepository for SqlxContactRepository {
    async fn create(&self, contact: &Contact) -> Result<Contact> {
        let result = sqlx::query(
            r#"
            INSERT INTO contacts (name, email, subject, message, category, status, admin_notes, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&contact.name)
        .bind(&contact.email)
        .bind(&contact.subject)
        .bind(&contact.message)
        .bind(&contact.category)
        .bind(contact.status.as_str())
        .bind(&contact.admin_notes)
        .bind(contact.created_at)
        .bind(contact.updated_at)
        .execute(self.db())
        .await
        .context("Failed to create contact")?;

        Ok(Contact {
            id: result.last_insert_rowid(),
            ..contact.clone()
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Contact>> {
        let row = sqlx::query(&format!("SELECT {} FROM contacts WHERE id = ?", CONTACT_COLUMNS))
            .bind(id)
            .fetch_optional(self.db())
            .await
            .context("Failed to get contact by ID")?;
        row.as_ref().map(row_to_contact).transpose()
    }

    async fn update(&self, contact: &Contact) -> Result<Contact> {
        sqlx::query("UPDATE contacts SET status = ?, admin_notes = ?, updated_at = ? WHERE id = ?")
            .bind(contact.status.as_str())
            .bind(&contact.admin_notes)
            .bind(contact.updated_at)
            .bind(contact.id)
            .execute(self.db())
            .await
            .context("Failed to update contact")?;
        Ok(contact.clone())
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM contacts WHERE id = ?")
            .bind(id)
            .execute(self.db())
            .await
            .context("Failed to delete contact")?;
        Ok(result.rows_affected() > 0)
    }

    async fn list(&self, params: &ListParams) -> Result<PagedResult<Contact>> {
        let list = ListQuery {
            table: "contacts",
            columns: CONTACT_COLUMNS,
            search_columns: &["name", "email", "subject"],
            filters: vec![
                ("status", params.status.as_deref()),
                ("category", params.category.as_deref()),
            ],
        };
        fetch_page(self.db(), list, params, row_to_contact).await
    }
}

fn row_to_contact(row: &SqliteRow) -> Result<Contact> {
    Ok(Contact {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        subject: row.try_get("subject")?,
        message: row.try_get("message")?,
        category: row.try_get("category")?,
        status: get_enum(row, "status")?,
        admin_notes: row.try_get("admin_notes")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};
    use crate::models::{ContactStatus, CreateContactInput, UpdateContactInput};

    #[tokio::test]
    async fn test_triage_contact() {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let repo = SqlxContactRepository::new(pool);

        let mut contact = repo
            .create(&Contact::from_input(CreateContactInput {
                name: "Sam".to_string(),
                email: "sam@example.com".to_string(),
                subject: Some("Billing question".to_string()),
                message: "Charged twice".to_string(),
                category: Some("billing".to_string()),
            }))
            .await
            .unwrap();

        contact.apply(UpdateContactInput {
            status: Some(ContactStatus::InProgress),
            admin_notes: Some("Refund issued".to_string()),
        });
        repo.update(&contact).await.unwrap();

        let found = repo.get_by_id(contact.id).await.unwrap().unwrap();
        assert_eq!(found.status, ContactStatus::InProgress);
        assert_eq!(found.admin_notes.as_deref(), Some("Refund issued"));
        assert_eq!(found.message, "Charged twice");

        let page = repo
            .list(&ListParams::default().with_status("in-progress").normalized())
            .await
            .unwrap();
        assert_eq!(page.total, 1);
    }
}
