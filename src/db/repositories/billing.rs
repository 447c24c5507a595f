use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

use super::query::{fetch_page, get_enum, ListQuery};
use crate::db::DynDatabasePool;
use crate::models::{BillingStatus, BillingTransaction, ListParams, PagedResult};

const BILLING_COLUMNS: &str = "id, user_id, plan, amount_cents, currency, status, provider_ref, description, created_at, updated_at";

/// Transaction count and amount for one status
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusTotal {
    pub status: BillingStatus,
    pub count: i64,
    pub amount_cents: i64,
}

#[async_trait]
pub trait BillingRepository: Send + Sync {
    async fn create(&self, transaction: &BillingTransaction) -> Result<BillingTransaction>;
    async fn get_by_id(&self, id: i64) -> Result<Option<BillingTransaction>>;
    async fn update(&self, transaction: &BillingTransaction) -> Result<BillingTransaction>;
    async fn delete(&self, id: i64) -> Result<bool>;
    /// Filters: `status`, `plan`
    async fn list(&self, params: &ListParams) -> Result<PagedResult<BillingTransaction>>;
    async fn totals_by_status(&self) -> Result<Vec<StatusTotal>>;
}

pub struct SqlxBillingRepository {
    pool: DynDatabasePool,
}

impl SqlxBillingRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn BillingRepository> {
        Arc::new(Self::new(pool))
    }

    fn db(&self) -> &SqlitePool {
        self.pool.as_sqlite()
    }
}

#[async_trait]
impl BillingRepository for SqlxBillingRepository {
    async fn create(&self, transaction: &BillingTransaction) -> Result<BillingTransaction> {
        let result = sqlx::query(
            r#"
            INSERT INTO billing_transactions (user_id, plan, amount_cents, currency, status,
                provider_ref, description, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(transaction.user_id)
        .bind(transaction.plan.as_str())
        .bind(transaction.amount_cents)
        .bind(&transaction.currency)
        .bind(transaction.status.as_str())
        .bind(&transaction.provider_ref)
        .bind(&transaction.description)
        .bind(transaction.created_at)
        .bind(transaction.updated_at)
        .execute(self.db())
        .await
        .context("Failed to create billing transaction")?;

        Ok(BillingTransaction {
            id: result.last_insert_rowid(),
            ..transaction.clone()
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<BillingTransaction>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM billing_transactions WHERE id = ?",
            BILLING_COLUMNS
        ))
        .bind(id)
        .fetch_optional(self.db())
        .await
        .context("Failed to get billing transaction by ID")?;
        row.as_ref().map(row_to_transaction).transpose()
    }

    async fn update(&self, transaction: &BillingTransaction) -> Result<BillingTransaction> {
        sqlx::query(
            r#"
            UPDATE billing_transactions
            SET plan = ?, amount_cents = ?, currency = ?, status = ?, provider_ref = ?,
                description = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(transaction.plan.as_str())
        .bind(transaction.amount_cents)
        .bind(&transaction.currency)
        .bind(transaction.status.as_str())
        .bind(&transaction.provider_ref)
        .bind(&transaction.description)
        .bind(transaction.updated_at)
        .bind(transaction.id)
        .execute(self.db())
        .await
        .context("Failed to update billing transaction")?;
        Ok(transaction.clone())
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM billing_transactions WHERE id = ?")
            .bind(id)
            .execute(self.db())
            .await
            .context("Failed to delete billing transaction")?;
        Ok(result.rows_affected() > 0)
    }

    async fn list(&self, params: &ListParams) -> Result<PagedResult<BillingTransaction>> {
        let list = ListQuery {
            table: "billing_transactions",
            columns: BILLING_COLUMNS,
            search_columns: &["description", "provider_ref", "currency"],
            filters: vec![
                ("status", params.status.as_deref()),
                ("plan", params.plan.as_deref()),
            ],
        };
        fetch_page(self.db(), list, params, row_to_transaction).await
    }

    async fn totals_by_status(&self) -> Result<Vec<StatusTotal>> {
        let rows = sqlx::query(
            r#"
            SELECT status, COUNT(*) AS total, COALESCE(SUM(amount_cents), 0) AS amount
            FROM billing_transactions
            GROUP BY status
            ORDER BY status
            "#,
        )
        .fetch_all(self.db())
        .await
        .context("Failed to summarize billing")?;

        rows.iter()
            .map(|row| {
                Ok(StatusTotal {
                    status: get_enum(row, "status")?,
                    count: row.try_get("total")?,
                    amount_cents: row.try_get("amount")?,
                })
            })
            .collect()
    }
}

fn row_to_transaction(row: &SqliteRow) -> Result<BillingTransaction> {
    Ok(BillingTransaction {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        plan: get_enum(row, "plan")?,
        amount_cents: row.try_get("amount_cents")?,
        currency: row.try_get("currency")?,
        status: get_enum(row, "status")?,
        provider_ref: row.try_get("provider_ref")?,
        description: row.try_get("description")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};
    use crate::models::{CreateBillingInput, UserPlan};

    fn transaction(amount_cents: i64, status: BillingStatus) -> BillingTransaction {
        BillingTransaction::from_input(CreateBillingInput {
            user_id: 1,
            plan: UserPlan::Pro,
            amount_cents,
            currency: "usd".to_string(),
            status,
            provider_ref: None,
            description: None,
        })
    }

    #[tokio::test]
    async fn test_totals_by_status() {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let repo = SqlxBillingRepository::new(pool);

        repo.create(&transaction(900, BillingStatus::Paid)).await.unwrap();
        repo.create(&transaction(1900, BillingStatus::Paid)).await.unwrap();
        let failed = repo.create(&transaction(900, BillingStatus::Failed)).await.unwrap();
        assert_eq!(failed.currency, "USD");

        let totals = repo.totals_by_status().await.unwrap();
        assert_eq!(
            totals,
            vec![
                StatusTotal { status: BillingStatus::Failed, count: 1, amount_cents: 900 },
                StatusTotal { status: BillingStatus::Paid, count: 2, amount_cents: 2800 },
            ]
        );
    }
}
