//! Database migrations
//!
//! Migrations are embedded in the binary as SQL strings and applied in
//! version order. Applied versions are tracked in the `_migrations` table,
//! so running the migrator again is a no-op.
//!
//! Every timestamp column is TEXT holding an RFC 3339 UTC value. Analytics
//! buckets events by the `YYYY-MM-DD` / `YYYY-MM` prefix of these strings.

use anyhow::{Context, Result};
use sqlx::{Row, SqlitePool};

use super::DynDatabasePool;

/// A database migration
#[derive(Debug, Clone)]
pub struct Migration {
    /// Migration version number (must be unique and sequential)
    pub version: i32,
    /// Human-readable migration name
    pub name: &'static str,
    /// SQL statements, separated by `;`
    pub up_sqlite: &'static str,
}

/// Migration record stored in the database
#[derive(Debug, Clone)]
pub struct MigrationRecord {
    pub version: i64,
    pub name: String,
    pub applied_at: String,
}

pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "create_admins",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS admins (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name VARCHAR(100) NOT NULL,
                email VARCHAR(255) NOT NULL UNIQUE,
                password_hash VARCHAR(255) NOT NULL,
                role VARCHAR(20) NOT NULL DEFAULT 'admin',
                is_verified INTEGER NOT NULL DEFAULT 0,
                is_approved INTEGER NOT NULL DEFAULT 0,
                last_login_at TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS admin_tokens (
                token_hash VARCHAR(64) PRIMARY KEY,
                admin_id INTEGER NOT NULL,
                purpose VARCHAR(20) NOT NULL,
                expires_at TEXT NOT NULL,
                created_at TEXT NOT NULL,
                FOREIGN KEY (admin_id) REFERENCES admins(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_admin_tokens_admin ON admin_tokens(admin_id, purpose);
        "#,
    },
    Migration {
        version: 2,
        name: "create_users",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name VARCHAR(100) NOT NULL,
                email VARCHAR(255) NOT NULL UNIQUE,
                avatar TEXT,
                bio TEXT,
                plan VARCHAR(20) NOT NULL DEFAULT 'free',
                subscription_status VARCHAR(20) NOT NULL DEFAULT 'none',
                status VARCHAR(20) NOT NULL DEFAULT 'active',
                card_sets_count INTEGER NOT NULL DEFAULT 0,
                tests_count INTEGER NOT NULL DEFAULT 0,
                study_minutes INTEGER NOT NULL DEFAULT 0,
                streak_days INTEGER NOT NULL DEFAULT 0,
                last_active_at TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_users_created_at ON users(created_at);
        "#,
    },
    Migration {
        version: 3,
        name: "create_courses",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS courses (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title VARCHAR(255) NOT NULL,
                description TEXT,
                category VARCHAR(100),
                difficulty VARCHAR(20) NOT NULL DEFAULT 'beginner',
                status VARCHAR(20) NOT NULL DEFAULT 'draft',
                instructor VARCHAR(100),
                price_cents INTEGER NOT NULL DEFAULT 0,
                enrolled_count INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
        "#,
    },
    Migration {
        version: 4,
        name: "create_study_content",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS card_sets (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                owner_id INTEGER,
                title VARCHAR(255) NOT NULL,
                description TEXT,
                category VARCHAR(100),
                is_public INTEGER NOT NULL DEFAULT 0,
                cards TEXT NOT NULL DEFAULT '[]',
                view_count INTEGER NOT NULL DEFAULT 0,
                like_count INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS tests (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                owner_id INTEGER,
                title VARCHAR(255) NOT NULL,
                description TEXT,
                category VARCHAR(100),
                difficulty VARCHAR(20) NOT NULL DEFAULT 'beginner',
                questions TEXT NOT NULL DEFAULT '[]',
                attempt_count INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
        "#,
    },
    Migration {
        version: 5,
        name: "create_blog",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS posts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title VARCHAR(255) NOT NULL,
                slug VARCHAR(255) NOT NULL UNIQUE,
                excerpt TEXT,
                content TEXT NOT NULL,
                author VARCHAR(100),
                category VARCHAR(100),
                tags TEXT NOT NULL DEFAULT '[]',
                status VARCHAR(20) NOT NULL DEFAULT 'draft',
                cover_image TEXT,
                view_count INTEGER NOT NULL DEFAULT 0,
                like_count INTEGER NOT NULL DEFAULT 0,
                comment_count INTEGER NOT NULL DEFAULT 0,
                bookmark_count INTEGER NOT NULL DEFAULT 0,
                published_at TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_posts_created_at ON posts(created_at);
            CREATE TABLE IF NOT EXISTS comments (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                post_id INTEGER NOT NULL,
                user_id INTEGER,
                author_name VARCHAR(100) NOT NULL,
                content TEXT NOT NULL,
                created_at TEXT NOT NULL,
                FOREIGN KEY (post_id) REFERENCES posts(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_comments_post_id ON comments(post_id);
            CREATE INDEX IF NOT EXISTS idx_comments_created_at ON comments(created_at);
            CREATE TABLE IF NOT EXISTS interactions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                post_id INTEGER NOT NULL,
                user_id INTEGER,
                kind VARCHAR(20) NOT NULL,
                created_at TEXT NOT NULL,
                FOREIGN KEY (post_id) REFERENCES posts(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_interactions_post_kind ON interactions(post_id, kind);
            CREATE INDEX IF NOT EXISTS idx_interactions_created_at ON interactions(created_at);
        "#,
    },
    Migration {
        version: 6,
        name: "create_contacts",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS contacts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name VARCHAR(100) NOT NULL,
                email VARCHAR(255) NOT NULL,
                subject VARCHAR(255),
                message TEXT NOT NULL,
                category VARCHAR(100),
                status VARCHAR(20) NOT NULL DEFAULT 'new',
                admin_notes TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_contacts_created_at ON contacts(created_at);
        "#,
    },
    Migration {
        version: 7,
        name: "create_notifications_and_billing",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS notifications (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title VARCHAR(255) NOT NULL,
                message TEXT NOT NULL,
                audience VARCHAR(20) NOT NULL DEFAULT 'all',
                kind VARCHAR(20) NOT NULL DEFAULT 'info',
                is_read INTEGER NOT NULL DEFAULT 0,
                scheduled_at TEXT,
                sent_at TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS billing_transactions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                plan VARCHAR(20) NOT NULL,
                amount_cents INTEGER NOT NULL,
                currency VARCHAR(3) NOT NULL DEFAULT 'USD',
                status VARCHAR(20) NOT NULL DEFAULT 'pending',
                provider_ref VARCHAR(255),
                description TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_billing_created_at ON billing_transactions(created_at);
        "#,
    },
    Migration {
        version: 8,
        name: "create_platform_settings",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS platform_settings (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                document TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
        "#,
    },
];

/// Run all pending migrations, returning how many were applied
pub async fn run_migrations(pool: &DynDatabasePool) -> Result<usize> {
    create_migrations_table(pool).await?;

    let applied = get_applied_migrations(pool.as_sqlite()).await?;
    let applied_versions: Vec<i32> = applied.iter().map(|m| m.version as i32).collect();

    let mut count = 0;

    for migration in MIGRATIONS {
        if !applied_versions.contains(&migration.version) {
            tracing::info!("Applying migration {}: {}", migration.version, migration.name);
            apply_migration(pool.as_sqlite(), migration)
                .await
                .with_context(|| format!("Failed to apply migration: {}", migration.name))?;
            count += 1;
        }
    }

    if count > 0 {
        tracing::info!("Applied {} migration(s)", count);
    } else {
        tracing::debug!("No pending migrations");
    }

    Ok(count)
}

async fn create_migrations_table(pool: &DynDatabasePool) -> Result<()> {
    pool.execute(
        r#"
        CREATE TABLE IF NOT EXISTS _migrations (
            version INTEGER PRIMARY KEY,
            name VARCHAR(255) NOT NULL UNIQUE,
            applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .await?;
    Ok(())
}

async fn get_applied_migrations(pool: &SqlitePool) -> Result<Vec<MigrationRecord>> {
    let rows = sqlx::query("SELECT version, name, applied_at FROM _migrations ORDER BY version")
        .fetch_all(pool)
        .await
        .context("Failed to read applied migrations")?;

    Ok(rows
        .iter()
        .map(|row| MigrationRecord {
            version: row.get("version"),
            name: row.get("name"),
            applied_at: row.get("applied_at"),
        })
        .collect())
}

/// Apply a single migration inside a transaction
async fn apply_migration(pool: &SqlitePool, migration: &Migration) -> Result<()> {
    let mut tx = pool.begin().await.context("Failed to begin migration")?;

    for statement in split_sql_statements(migration.up_sqlite) {
        sqlx::query(statement)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Failed to execute: {}", truncate_sql(statement)))?;
    }

    sqlx::query("INSERT INTO _migrations (version, name) VALUES (?, ?)")
        .bind(migration.version)
        .bind(migration.name)
        .execute(&mut *tx)
        .await?;

    tx.commit().await.context("Failed to commit migration")?;
    Ok(())
}

fn truncate_sql(sql: &str) -> String {
    match sql.char_indices().nth(100) {
        Some((idx, _)) => format!("{}...", &sql[..idx]),
        None => sql.to_string(),
    }
}

/// Split a migration script into individual statements
fn split_sql_statements(sql: &str) -> Vec<&str> {
    sql.split(';')
        .map(str::trim)
        .filter(|stmt| !stmt.is_empty() && !is_comment_only(stmt))
        .collect()
}

fn is_comment_only(s: &str) -> bool {
    s.lines()
        .map(str::trim)
        .all(|line| line.is_empty() || line.starts_with("--"))
}

/// Number of migrations not yet applied
pub async fn pending_count(pool: &DynDatabasePool) -> Result<usize> {
    create_migrations_table(pool).await?;
    let applied = get_applied_migrations(pool.as_sqlite()).await?;
    Ok(MIGRATIONS.len().saturating_sub(applied.len()))
}
