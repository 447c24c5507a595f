//! Database connection pool abstraction
//!
//! Repositories depend on the `DatabasePool` trait rather than on a concrete
//! sqlx pool so they can be handed an in-memory database in tests.
//!
//! The running server opens exactly one pool per process through
//! [`global_pool`]. It is created on first use, shared by every request and
//! never explicitly torn down.

use anyhow::{Context, Result};
use async_trait::async_trait;
use once_cell::sync::OnceCell;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::sync::Arc;

use crate::config::DatabaseConfig;

/// Database pool trait shared by every repository
#[async_trait]
pub trait DatabasePool: Send + Sync {
    /// Execute a raw SQL statement that doesn't return rows
    async fn execute(&self, query: &str) -> Result<u64>;

    /// Check if the database connection is healthy
    async fn ping(&self) -> Result<()>;

    /// Close the connection pool
    async fn close(&self);

    /// Underlying SQLite pool
    fn as_sqlite(&self) -> &SqlitePool;
}

/// SQLite connection pool implementation
pub struct SqliteDatabase {
    pool: SqlitePool,
}

impl SqliteDatabase {
    /// Open (and create if needed) a SQLite database
    ///
    /// Accepts a plain file path, a `sqlite:` URL or `:memory:`.
    pub async fn new(url: &str) -> Result<Self> {
        if is_memory_url(url) {
            // Every connection to `:memory:` gets its own database, so the
            // pool is pinned to a single long-lived connection.
            let options = SqliteConnectOptions::from_str("sqlite::memory:")
                .context("Invalid in-memory SQLite URL")?
                .foreign_keys(true);
            let pool = SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await
                .context("Failed to open in-memory SQLite database")?;
            return Ok(Self { pool });
        }

        let path = url.strip_prefix("sqlite://").or_else(|| url.strip_prefix("sqlite:")).unwrap_or(url);
        let path = path.split('?').next().unwrap_or(path);

        if let Some(parent) = std::path::Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create database directory: {:?}", parent))?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(20)
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to connect to SQLite database: {}", url))?;

        Ok(Self { pool })
    }

    /// Get a reference to the underlying pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn is_memory_url(url: &str) -> bool {
    matches!(url, ":memory:" | "sqlite::memory:" | "sqlite://:memory:")
}

#[async_trait]
impl DatabasePool for SqliteDatabase {
    async fn execute(&self, query: &str) -> Result<u64> {
        let result = sqlx::query(query)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to execute query: {}", query))?;
        Ok(result.rows_affected())
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("Database ping failed")?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
    }

    fn as_sqlite(&self) -> &SqlitePool {
        &self.pool
    }
}

/// Type alias for a shared database pool
pub type DynDatabasePool = Arc<dyn DatabasePool>;

static GLOBAL_POOL: OnceCell<DynDatabasePool> = OnceCell::new();

/// Create a database connection pool from configuration
pub async fn create_pool(config: &DatabaseConfig) -> Result<DynDatabasePool> {
    let db = SqliteDatabase::new(&config.url).await?;
    Ok(Arc::new(db))
}

/// Process-wide pool, opened on first call and reused afterwards
///
/// Concurrent first calls may both open a pool; only the first one stored is
/// kept and returned to every caller.
pub async fn global_pool(config: &DatabaseConfig) -> Result<DynDatabasePool> {
    if let Some(pool) = GLOBAL_POOL.get() {
        return Ok(pool.clone());
    }

    let pool = create_pool(config).await?;
    match GLOBAL_POOL.set(pool.clone()) {
        Ok(()) => {
            tracing::debug!("Global database pool initialised");
            Ok(pool)
        }
        Err(_) => {
            pool.close().await;
            GLOBAL_POOL
                .get()
                .cloned()
                .context("Global database pool vanished after initialisation")
        }
    }
}

/// Create a SQLite in-memory database pool for testing
pub async fn create_test_pool() -> Result<DynDatabasePool> {
    let config = DatabaseConfig {
        url: ":memory:".to_string(),
    };
    create_pool(&config).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_pool_ping() {
        let pool = create_test_pool().await.expect("Failed to create pool");
        pool.ping().await.expect("Ping should succeed");
    }

    #[tokio::test]
    async fn test_memory_pool_keeps_state_between_queries() {
        let pool = create_test_pool().await.expect("Failed to create pool");

        pool.execute("CREATE TABLE scratch (id INTEGER PRIMARY KEY, name TEXT)")
            .await
            .expect("Failed to create table");
        let affected = pool
            .execute("INSERT INTO scratch (name) VALUES ('one')")
            .await
            .expect("Failed to insert");
        assert_eq!(affected, 1);

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM scratch")
            .fetch_one(pool.as_sqlite())
            .await
            .expect("Failed to count");
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_file_pool_creates_nested_directories() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("nested").join("dir").join("learnboard.db");

        let config = DatabaseConfig {
            url: db_path.to_string_lossy().to_string(),
        };
        let pool = create_pool(&config).await.expect("Failed to create pool");
        pool.ping().await.expect("Ping should succeed");

        assert!(db_path.exists());
    }

    #[tokio::test]
    async fn test_sqlite_url_prefix_accepted() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("prefixed.db");

        let config = DatabaseConfig {
            url: format!("sqlite:{}", db_path.display()),
        };
        let pool = create_pool(&config).await.expect("Failed to create pool");
        pool.ping().await.expect("Ping should succeed");
        assert!(db_path.exists());
    }

    #[tokio::test]
    async fn test_global_pool_is_reused() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let config = DatabaseConfig {
            url: temp_dir.path().join("global.db").to_string_lossy().to_string(),
        };

        let first = global_pool(&config).await.expect("first init");
        let second = global_pool(&config).await.expect("second init");
        assert!(Arc::ptr_eq(&first, &second));
    }
}
