//! Flashcard set repository
//!
//! Cards are stored as a JSON array in a TEXT column.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

use super::query::{fetch_page, get_json, ListQuery};
use crate::db::DynDatabasePool;
use crate::models::{CardSet, ListParams, PagedResult};

const CARD_SET_COLUMNS: &str = "id, owner_id, title, description, category, is_public, cards, view_count, like_count, created_at, updated_at";

#[async_trait]
pub trait CardSetRepository: Send + Sync {
    async fn create(&self, set: &CardSet) -> Result<CardSet>;
    async fn get_by_id(&self, id: i64) -> Result<Option<CardSet>>;
    async fn update(&self, set: &CardSet) -> Result<CardSet>;
    async fn delete(&self, id: i64) -> Result<bool>;
    async fn list(&self, params: &ListParams) -> Result<PagedResult<CardSet>>;
}

pub struct SqlxCardSetRepository {
    pool: DynDatabasePool,
}

impl SqlxCardSetRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn CardSetRepository> {
        Arc::new(Self::new(pool))
    }

    fn db(&self) -> &SqlitePool {
        self.pool.as_sqlite()
    }
}

#[async_trait]
impl CardSetRepository for SqlxCardSetRepository {
    async fn create(&self, set: &CardSet) -> Result<CardSet> {
        let cards = serde_json::to_string(&set.cards)?;
        let result = sqlx::query(
            r#"
            INSERT INTO card_sets (owner_id, title, description, category, is_public, cards,
                view_count, like_count, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(set.owner_id)
        .bind(&set.title)
        .bind(&set.description)
        .bind(&set.category)
        .bind(set.is_public)
        .bind(cards)
        .bind(set.view_count)
        .bind(set.like_count)
        .bind(set.created_at)
        .bind(set.updated_at)
        .execute(self.db())
        .await
        .context("Failed to create card set")?;

        Ok(CardSet {
            id: result.last_insert_rowid(),
            ..set.clone()
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<CardSet>> {
        let row = sqlx::query(&format!("SELECT {} FROM card_sets WHERE id = ?", CARD_SET_COLUMNS))
            .bind(id)
            .fetch_optional(self.db())
            .await
            .context("Failed to get card set by ID")?;
        row.as_ref().map(row_to_card_set).transpose()
    }

    async fn update(&self, set: &CardSet) -> Result<CardSet> {
        let cards = serde_json::to_string(&set.cards)?;
        sqlx::query(
            r#"
            UPDATE card_sets
            SET title = ?, description = ?, category = ?, is_public = ?, cards = ?,
                view_count = ?, like_count = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&set.title)
        .bind(&set.description)
        .bind(&set.category)
        .bind(set.is_public)
        .bind(cards)
        .bind(set.view_count)
        .bind(set.like_count)
        .bind(set.updated_at)
        .bind(set.id)
        .execute(self.db())
        .await
        .context("Failed to update card set")?;
        Ok(set.clone())
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM card_sets WHERE id = ?")
            .bind(id)
            .execute(self.db())
            .await
            .context("Failed to delete card set")?;
        Ok(result.rows_affected() > 0)
    }

    async fn list(&self, params: &ListParams) -> Result<PagedResult<CardSet>> {
        let list = ListQuery {
            table: "card_sets",
            columns: CARD_SET_COLUMNS,
            search_columns: &["title", "description"],
            filters: vec![("category", params.category.as_deref())],
        };
        fetch_page(self.db(), list, params, row_to_card_set).await
    }
}

fn row_to_card_set(row: &SqliteRow) -> Result<CardSet> {
    Ok(CardSet {
        id: row.try_get("id")?,
        owner_id: row.try_get("owner_id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        category: row.try_get("category")?,
        is_public: row.try_get("is_public")?,
        cards: get_json(row, "cards")?,
        view_count: row.try_get("view_count")?,
        like_count: row.try_get("like_count")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};
    use crate::models::{Card, CreateCardSetInput};

    async fn setup_test_repo() -> SqlxCardSetRepository {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        SqlxCardSetRepository::new(pool)
    }

    #[tokio::test]
    async fn test_cards_round_trip_through_json_column() {
        let repo = setup_test_repo().await;
        let set = CardSet::from_input(CreateCardSetInput {
            title: "Spanish verbs".to_string(),
            owner_id: Some(7),
            description: None,
            category: Some("languages".to_string()),
            is_public: true,
            cards: vec![
                Card { front: "hablar".to_string(), back: "to speak".to_string() },
                Card { front: "comer".to_string(), back: "to eat".to_string() },
            ],
        });

        let created = repo.create(&set).await.unwrap();
        let found = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(found.cards, set.cards);
        assert!(found.is_public);
        assert_eq!(found.owner_id, Some(7));

        let page = repo
            .list(&ListParams::default().with_category("languages").normalized())
            .await
            .unwrap();
        assert_eq!(page.total, 1);
    }
}
