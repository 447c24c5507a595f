//! Platform user repository

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

use super::query::{fetch_page, get_enum, ListQuery};
use crate::db::DynDatabasePool;
use crate::models::{ListParams, PagedResult, User, UserPlan, UserStats};

const USER_COLUMNS: &str = "id, name, email, avatar, bio, plan, subscription_status, status, card_sets_count, tests_count, study_minutes, streak_days, last_active_at, created_at, updated_at";

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: &User) -> Result<User>;
    async fn get_by_id(&self, id: i64) -> Result<Option<User>>;
    async fn update(&self, user: &User) -> Result<User>;
    async fn delete(&self, id: i64) -> Result<bool>;
    /// Filters: `status`, `plan`; search covers name and email
    async fn list(&self, params: &ListParams) -> Result<PagedResult<User>>;
    /// Users with an active or trialing subscription, per plan
    async fn active_subscribers_by_plan(&self) -> Result<Vec<(UserPlan, i64)>>;
}

pub struct SqlxUserRepository {
    pool: DynDatabasePool,
}

impl SqlxUserRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn UserRepository> {
        Arc::new(Self::new(pool))
    }

    fn db(&self) -> &SqlitePool {
        self.pool.as_sqlite()
    }
}

#[async_trait]
impl UserRepository for SqlxUserRepository {
    async fn create(&self, user: &User) -> Result<User> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (name, email, avatar, bio, plan, subscription_status, status,
                card_sets_count, tests_count, study_minutes, streak_days, last_active_at, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.avatar)
        .bind(&user.bio)
        .bind(user.plan.as_str())
        .bind(user.subscription_status.as_str())
        .bind(user.status.as_str())
        .bind(user.stats.card_sets)
        .bind(user.stats.tests)
        .bind(user.stats.study_minutes)
        .bind(user.stats.streak_days)
        .bind(user.last_active_at)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(self.db())
        .await
        .context("Failed to create user")?;

        Ok(User {
            id: result.last_insert_rowid(),
            ..user.clone()
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<User>> {
        let row = sqlx::query(&format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS))
            .bind(id)
            .fetch_optional(self.db())
            .await
            .context("Failed to get user by ID")?;
        row.as_ref().map(row_to_user).transpose()
    }

    async fn update(&self, user: &User) -> Result<User> {
        sqlx::query(
            r#"
            UPDATE users
            SET name = ?, email = ?, avatar = ?, bio = ?, plan = ?, subscription_status = ?, status = ?,
                card_sets_count = ?, tests_count = ?, study_minutes = ?, streak_days = ?,
                last_active_at = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.avatar)
        .bind(&user.bio)
        .bind(user.plan.as_str())
        .bind(user.subscription_status.as_str())
        .bind(user.status.as_str())
        .bind(user.stats.card_sets)
        .bind(user.stats.tests)
        .bind(user.stats.study_minutes)
        .bind(user.stats.streak_days)
        .bind(user.last_active_at)
        .bind(user.updated_at)
        .bind(user.id)
        .execute(self.db())
        .await
        .context("Failed to update user")?;
        Ok(user.clone())
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(self.db())
            .await
            .context("Failed to delete user")?;
        Ok(result.rows_affected() > 0)
    }

    async fn list(&self, params: &ListParams) -> Result<PagedResult<User>> {
        let list = ListQuery {
            table: "users",
            columns: USER_COLUMNS,
            search_columns: &["name", "email"],
            filters: vec![
                ("status", params.status.as_deref()),
                ("plan", params.plan.as_deref()),
            ],
        };
        fetch_page(self.db(), list, params, row_to_user).await
    }

    async fn active_subscribers_by_plan(&self) -> Result<Vec<(UserPlan, i64)>> {
        let rows = sqlx::query(
            r#"
            SELECT plan, COUNT(*) AS total FROM users
            WHERE subscription_status IN ('active', 'trialing')
            GROUP BY plan
            ORDER BY plan
            "#,
        )
        .fetch_all(self.db())
        .await
        .context("Failed to count subscribers")?;

        rows.iter()
            .map(|row| Ok((get_enum(row, "plan")?, row.try_get("total")?)))
            .collect()
    }
}

fn row_to_user(row: &SqliteRow) -> Result<User> {
    Ok(User {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        avatar: row.try_get("avatar")?,
        bio: row.try_get("bio")?,
        plan: get_enum(row, "plan")?,
        subscription_status: get_enum(row, "subscription_status")?,
        status: get_enum(row, "status")?,
        stats: UserStats {
            card_sets: row.try_get("card_sets_count")?,
            tests: row.try_get("tests_count")?,
            study_minutes: row.try_get("study_minutes")?,
            streak_days: row.try_get("streak_days")?,
        },
        last_active_at: row.try_get("last_active_at")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
