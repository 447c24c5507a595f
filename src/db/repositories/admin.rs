//! Admin repository
//!
//! Admin accounts plus the hashed one-time tokens used for email
//! verification and password reset.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

use super::query::{fetch_page, get_enum, ListQuery};
use crate::db::DynDatabasePool;
use crate::models::{Admin, AdminRole, AdminToken, ListParams, PagedResult, TokenPurpose};

const ADMIN_COLUMNS: &str = "id, name, email, password_hash, role, is_verified, is_approved, last_login_at, created_at, updated_at";

#[async_trait]
pub trait AdminRepository: Send + Sync {
    async fn create(&self, admin: &Admin) -> Result<Admin>;
    async fn get_by_id(&self, id: i64) -> Result<Option<Admin>>;
    async fn get_by_email(&self, email: &str) -> Result<Option<Admin>>;
    async fn update(&self, admin: &Admin) -> Result<Admin>;
    async fn delete(&self, id: i64) -> Result<bool>;
    async fn count(&self) -> Result<i64>;
    async fn count_by_role(&self, role: AdminRole) -> Result<i64>;
    async fn list(&self, params: &ListParams) -> Result<PagedResult<Admin>>;
    async fn touch_login(&self, id: i64, at: DateTime<Utc>) -> Result<()>;
}

pub struct SqlxAdminRepository {
    pool: DynDatabasePool,
}

impl SqlxAdminRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn AdminRepository> {
        Arc::new(Self::new(pool))
    }

    fn db(&self) -> &SqlitePool {
        self.pool.as_sqlite()
    }
}

#[async_trait]
impl AdminRepository for SqlxAdminRepository {
    async fn create(&self, admin: &Admin) -> Result<Admin> {
        let result = sqlx::query(
            r#"
            INSERT INTO admins (name, email, password_hash, role, is_verified, is_approved, last_login_at, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&admin.name)
        .bind(&admin.email)
        .bind(&admin.password_hash)
        .bind(admin.role.as_str())
        .bind(admin.is_verified)
        .bind(admin.is_approved)
        .bind(admin.last_login_at)
        .bind(admin.created_at)
        .bind(admin.updated_at)
        .execute(self.db())
        .await
        .context("Failed to create admin")?;

        Ok(Admin {
            id: result.last_insert_rowid(),
            ..admin.clone()
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Admin>> {
        let row = sqlx::query(&format!("SELECT {} FROM admins WHERE id = ?", ADMIN_COLUMNS))
            .bind(id)
            .fetch_optional(self.db())
            .await
            .context("Failed to get admin by ID")?;
        row.as_ref().map(row_to_admin).transpose()
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<Admin>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM admins WHERE email = ? COLLATE NOCASE",
            ADMIN_COLUMNS
        ))
        .bind(email.trim())
        .fetch_optional(self.db())
        .await
        .context("Failed to get admin by email")?;
        row.as_ref().map(row_to_admin).transpose()
    }

    async fn update(&self, admin: &Admin) -> Result<Admin> {
        sqlx::query(
            r#"
            UPDATE admins
            SET name = ?, email = ?, password_hash = ?, role = ?, is_verified = ?, is_approved = ?,
                last_login_at = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&admin.name)
        .bind(&admin.email)
        .bind(&admin.password_hash)
        .bind(admin.role.as_str())
        .bind(admin.is_verified)
        .bind(admin.is_approved)
        .bind(admin.last_login_at)
        .bind(admin.updated_at)
        .bind(admin.id)
        .execute(self.db())
        .await
        .context("Failed to update admin")?;
        Ok(admin.clone())
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM admins WHERE id = ?")
            .bind(id)
            .execute(self.db())
            .await
            .context("Failed to delete admin")?;
        Ok(result.rows_affected() > 0)
    }

    async fn count(&self) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM admins")
            .fetch_one(self.db())
            .await
            .context("Failed to count admins")
    }

    async fn count_by_role(&self, role: AdminRole) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM admins WHERE role = ?")
            .bind(role.as_str())
            .fetch_one(self.db())
            .await
            .context("Failed to count admins by role")
    }

    async fn list(&self, params: &ListParams) -> Result<PagedResult<Admin>> {
        let list = ListQuery {
            table: "admins",
            columns: ADMIN_COLUMNS,
            search_columns: &["name", "email"],
            filters: vec![("role", params.status.as_deref())],
        };
        fetch_page(self.db(), list, params, row_to_admin).await
    }

    async fn touch_login(&self, id: i64, at: DateTime<Utc>) -> Result<()> {
        sqlx::query("UPDATE admins SET last_login_at = ? WHERE id = ?")
            .bind(at)
            .bind(id)
            .execute(self.db())
            .await
            .context("Failed to record admin login")?;
        Ok(())
    }
}

fn row_to_admin(row: &SqliteRow) -> Result<Admin> {
    Ok(Admin {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        role: get_enum(row, "role")?,
        is_verified: row.try_get("is_verified")?,
        is_approved: row.try_get("is_approved")?,
        last_login_at: row.try_get("last_login_at")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// One-time token storage
#[async_trait]
pub trait AdminTokenRepository: Send + Sync {
    async fn create(&self, token: &AdminToken) -> Result<()>;
    async fn find(&self, token_hash: &str, purpose: TokenPurpose) -> Result<Option<AdminToken>>;
    /// Remove every token of `purpose` belonging to an admin
    async fn delete_for_admin(&self, admin_id: i64, purpose: TokenPurpose) -> Result<u64>;
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64>;
}

pub struct SqlxAdminTokenRepository {
    pool: DynDatabasePool,
}

impl SqlxAdminTokenRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn AdminTokenRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl AdminTokenRepository for SqlxAdminTokenRepository {
    async fn create(&self, token: &AdminToken) -> Result<()> {
        sqlx::query(
            "INSERT INTO admin_tokens (token_hash, admin_id, purpose, expires_at, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&token.token_hash)
        .bind(token.admin_id)
        .bind(token.purpose.as_str())
        .bind(token.expires_at)
        .bind(token.created_at)
        .execute(self.pool.as_sqlite())
        .await
        .context("Failed to store admin token")?;
        Ok(())
    }

    async fn find(&self, token_hash: &str, purpose: TokenPurpose) -> Result<Option<AdminToken>> {
        let row = sqlx::query(
            "SELECT token_hash, admin_id, purpose, expires_at, created_at FROM admin_tokens WHERE token_hash = ? AND purpose = ?",
        )
        .bind(token_hash)
        .bind(purpose.as_str())
        .fetch_optional(self.pool.as_sqlite())
        .await
        .context("Failed to look up admin token")?;

        row.map(|row| -> Result<AdminToken> {
            Ok(AdminToken {
                token_hash: row.try_get("token_hash")?,
                admin_id: row.try_get("admin_id")?,
                purpose: get_enum(&row, "purpose")?,
                expires_at: row.try_get("expires_at")?,
                created_at: row.try_get("created_at")?,
            })
        })
        .transpose()
    }

    async fn delete_for_admin(&self, admin_id: i64, purpose: TokenPurpose) -> Result<u64> {
        let result = sqlx::query("DELETE FROM admin_tokens WHERE admin_id = ? AND purpose = ?")
            .bind(admin_id)
            .bind(purpose.as_str())
            .execute(self.pool.as_sqlite())
            .await
            .context("Failed to delete admin tokens")?;
        Ok(result.rows_affected())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query("DELETE FROM admin_tokens WHERE expires_at <= ?")
            .bind(now)
            .execute(self.pool.as_sqlite())
            .await
            .context("Failed to purge expired admin tokens")?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};
    use chrono::Duration;

    async fn setup() -> (SqlxAdminRepository, SqlxAdminTokenRepository) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        (
            SqlxAdminRepository::new(pool.clone()),
            SqlxAdminTokenRepository::new(pool),
        )
    }

    fn admin(email: &str, role: AdminRole) -> Admin {
        Admin::new("Test".to_string(), email.to_string(), "hash".to_string(), role)
    }

    #[tokio::test]
    async fn test_create_and_get_admin() {
        let (repo, _) = setup().await;
        let created = repo
            .create(&admin("a@example.com", AdminRole::SuperAdmin))
            .await
            .unwrap();
        assert!(created.id > 0);

        let found = repo.get_by_email("A@Example.com").await.unwrap().unwrap();
        assert_eq!(found.id, created.id);
        assert_eq!(found.role, AdminRole::SuperAdmin);
        assert!(!found.is_verified);
    }

    #[tokio::test]
    async fn test_duplicate_email_is_unique_violation() {
        let (repo, _) = setup().await;
        repo.create(&admin("dup@example.com", AdminRole::Admin)).await.unwrap();
        let err = repo
            .create(&admin("dup@example.com", AdminRole::Admin))
            .await
            .unwrap_err();
        assert!(super::super::query::is_unique_violation(&err));
    }

    #[tokio::test]
    async fn test_count_by_role_and_delete() {
        let (repo, _) = setup().await;
        let first = repo.create(&admin("s@example.com", AdminRole::SuperAdmin)).await.unwrap();
        repo.create(&admin("m@example.com", AdminRole::Moderator)).await.unwrap();

        assert_eq!(repo.count().await.unwrap(), 2);
        assert_eq!(repo.count_by_role(AdminRole::SuperAdmin).await.unwrap(), 1);

        assert!(repo.delete(first.id).await.unwrap());
        assert!(!repo.delete(first.id).await.unwrap());
        assert_eq!(repo.count_by_role(AdminRole::SuperAdmin).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_token_lifecycle() {
        let (repo, tokens) = setup().await;
        let created = repo.create(&admin("t@example.com", AdminRole::Admin)).await.unwrap();
        let now = Utc::now();

        tokens
            .create(&AdminToken {
                token_hash: "abc".to_string(),
                admin_id: created.id,
                purpose: TokenPurpose::ResetPassword,
                expires_at: now + Duration::minutes(30),
                created_at: now,
            })
            .await
            .unwrap();

        assert!(tokens.find("abc", TokenPurpose::VerifyEmail).await.unwrap().is_none());
        let found = tokens.find("abc", TokenPurpose::ResetPassword).await.unwrap().unwrap();
        assert_eq!(found.admin_id, created.id);
        assert!(!found.is_expired());

        assert_eq!(tokens.delete_expired(now).await.unwrap(), 0);
        assert_eq!(tokens.delete_expired(now + Duration::hours(1)).await.unwrap(), 1);
    }
}
