//! Database layer
//!
//! SQLite through sqlx, hidden behind the `DatabasePool` trait so services and
//! repositories share one `Arc<dyn DatabasePool>` handle.
//!
//! # Usage
//!
//! ```ignore
//! use learnboard::config::DatabaseConfig;
//! use learnboard::db::{global_pool, migrations};
//!
//! let pool = global_pool(&DatabaseConfig::default()).await?;
//! migrations::run_migrations(&pool).await?;
//! pool.ping().await?;
//! ```

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{
    create_pool, create_test_pool, global_pool, DatabasePool, DynDatabasePool, SqliteDatabase,
};
