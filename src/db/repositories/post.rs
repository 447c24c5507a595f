//! Blog post repository
//!
//! Besides CRUD this owns the engagement counter cache: the `*_count` columns
//! on `posts` are recomputed from the `interactions` and `comments` tables.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

use super::query::{fetch_page, get_enum, get_json, ListQuery};
use crate::db::DynDatabasePool;
use crate::models::{ListParams, PagedResult, Post, PostCounters};

const POST_COLUMNS: &str = "id, title, slug, excerpt, content, author, category, tags, status, cover_image, view_count, like_count, comment_count, bookmark_count, published_at, created_at, updated_at";

/// Counter values derived from the event tables, aliased like the cache columns
const ACTUAL_COUNTERS: &str = r#"
    (SELECT COUNT(*) FROM interactions i WHERE i.post_id = p.id AND i.kind = 'view') AS actual_views,
    (SELECT COUNT(*) FROM interactions i WHERE i.post_id = p.id AND i.kind = 'like') AS actual_likes,
    (SELECT COUNT(*) FROM interactions i WHERE i.post_id = p.id AND i.kind = 'bookmark') AS actual_bookmarks,
    (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id) AS actual_comments
"#;

/// Cached and recomputed counters of one post
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterSnapshot {
    pub post_id: i64,
    pub cached: PostCounters,
    pub actual: PostCounters,
}

#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn create(&self, post: &Post) -> Result<Post>;
    async fn get_by_id(&self, id: i64) -> Result<Option<Post>>;
    async fn get_by_slug(&self, slug: &str) -> Result<Option<Post>>;
    /// Persists editable fields; counters are left to [`PostRepository::recount`]
    async fn update(&self, post: &Post) -> Result<Post>;
    async fn delete(&self, id: i64) -> Result<bool>;
    /// Filters: `status`, `category`
    async fn list(&self, params: &ListParams) -> Result<PagedResult<Post>>;
    /// Rewrite the cached counters of one post from the event tables
    async fn recount(&self, post_id: i64) -> Result<Option<PostCounters>>;
    /// Rewrite the cached counters of every post, returning how many changed
    async fn recount_all(&self) -> Result<u64>;
    /// Cached next to recomputed counters for every post
    async fn counter_snapshots(&self) -> Result<Vec<CounterSnapshot>>;
}

pub struct SqlxPostRepository {
    pool: DynDatabasePool,
}

impl SqlxPostRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn PostRepository> {
        Arc::new(Self::new(pool))
    }

    fn db(&self) -> &SqlitePool {
        self.pool.as_sqlite()
    }
}

#[async_trait]
impl PostRepository for SqlxPostRepository {
    async fn create(&self, post: &Post) -> Result<Post> {
        let tags = serde_json::to_string(&post.tags)?;
        let result = sqlx::query(
            r#"
            INSERT INTO posts (title, slug, excerpt, content, author, category, tags, status,
                cover_image, published_at, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&post.title)
        .bind(&post.slug)
        .bind(&post.excerpt)
        .bind(&post.content)
        .bind(&post.author)
        .bind(&post.category)
        .bind(tags)
        .bind(post.status.as_str())
        .bind(&post.cover_image)
        .bind(post.published_at)
        .bind(post.created_at)
        .bind(post.updated_at)
        .execute(self.db())
        .await
        .context("Failed to create post")?;

        Ok(Post {
            id: result.last_insert_rowid(),
            view_count: 0,
            like_count: 0,
            comment_count: 0,
            bookmark_count: 0,
            ..post.clone()
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Post>> {
        let row = sqlx::query(&format!("SELECT {} FROM posts WHERE id = ?", POST_COLUMNS))
            .bind(id)
            .fetch_optional(self.db())
            .await
            .context("Failed to get post by ID")?;
        row.as_ref().map(row_to_post).transpose()
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Post>> {
        let row = sqlx::query(&format!("SELECT {} FROM posts WHERE slug = ?", POST_COLUMNS))
            .bind(slug)
            .fetch_optional(self.db())
            .await
            .context("Failed to get post by slug")?;
        row.as_ref().map(row_to_post).transpose()
    }

    async fn update(&self, post: &Post) -> Result<Post> {
        let tags = serde_json::to_string(&post.tags)?;
        sqlx::query(
            r#"
            UPDATE posts
            SET title = ?, slug = ?, excerpt = ?, content = ?, author = ?, category = ?, tags = ?,
                status = ?, cover_image = ?, published_at = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&post.title)
        .bind(&post.slug)
        .bind(&post.excerpt)
        .bind(&post.content)
        .bind(&post.author)
        .bind(&post.category)
        .bind(tags)
        .bind(post.status.as_str())
        .bind(&post.cover_image)
        .bind(post.published_at)
        .bind(post.updated_at)
        .bind(post.id)
        .execute(self.db())
        .await
        .context("Failed to update post")?;

        self.get_by_id(post.id)
            .await?
            .context("Post disappeared during update")
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(id)
            .execute(self.db())
            .await
            .context("Failed to delete post")?;
        Ok(result.rows_affected() > 0)
    }

    async fn list(&self, params: &ListParams) -> Result<PagedResult<Post>> {
        let list = ListQuery {
            table: "posts",
            columns: POST_COLUMNS,
            search_columns: &["title", "excerpt", "author"],
            filters: vec![
                ("status", params.status.as_deref()),
                ("category", params.category.as_deref()),
            ],
        };
        fetch_page(self.db(), list, params, row_to_post).await
    }

    async fn recount(&self, post_id: i64) -> Result<Option<PostCounters>> {
        let result = sqlx::query(
            r#"
            UPDATE posts SET
                view_count = (SELECT COUNT(*) FROM interactions WHERE post_id = posts.id AND kind = 'view'),
                like_count = (SELECT COUNT(*) FROM interactions WHERE post_id = posts.id AND kind = 'like'),
                bookmark_count = (SELECT COUNT(*) FROM interactions WHERE post_id = posts.id AND kind = 'bookmark'),
                comment_count = (SELECT COUNT(*) FROM comments WHERE post_id = posts.id)
            WHERE id = ?
            "#,
        )
        .bind(post_id)
        .execute(self.db())
        .await
        .context("Failed to recount post counters")?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        Ok(self.get_by_id(post_id).await?.map(|post| post.counters()))
    }

    async fn recount_all(&self) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE posts SET
                view_count = v, like_count = l, bookmark_count = b, comment_count = c
            FROM (
                SELECT p.id AS pid,
                    (SELECT COUNT(*) FROM interactions WHERE post_id = p.id AND kind = 'view') AS v,
                    (SELECT COUNT(*) FROM interactions WHERE post_id = p.id AND kind = 'like') AS l,
                    (SELECT COUNT(*) FROM interactions WHERE post_id = p.id AND kind = 'bookmark') AS b,
                    (SELECT COUNT(*) FROM comments WHERE post_id = p.id) AS c
                FROM posts p
            ) AS actual
            WHERE posts.id = actual.pid
              AND (view_count != v OR like_count != l OR bookmark_count != b OR comment_count != c)
            "#,
        )
        .execute(self.db())
        .await
        .context("Failed to reconcile post counters")?;
        Ok(result.rows_affected())
    }

    async fn counter_snapshots(&self) -> Result<Vec<CounterSnapshot>> {
        let rows = sqlx::query(&format!(
            "SELECT p.id, p.view_count, p.like_count, p.bookmark_count, p.comment_count, {} FROM posts p ORDER BY p.id",
            ACTUAL_COUNTERS
        ))
        .fetch_all(self.db())
        .await
        .context("Failed to read post counters")?;

        rows.iter()
            .map(|row| {
                Ok(CounterSnapshot {
                    post_id: row.try_get("id")?,
                    cached: PostCounters {
                        views: row.try_get("view_count")?,
                        likes: row.try_get("like_count")?,
                        bookmarks: row.try_get("bookmark_count")?,
                        comments: row.try_get("comment_count")?,
                    },
                    actual: PostCounters {
                        views: row.try_get("actual_views")?,
                        likes: row.try_get("actual_likes")?,
                        bookmarks: row.try_get("actual_bookmarks")?,
                        comments: row.try_get("actual_comments")?,
                    },
                })
            })
            .collect()
    }
}

fn row_to_post(row: &SqliteRow) -> Result<Post> {
    Ok(Post {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        slug: row.try_get("slug")?,
        excerpt: row.try_get("excerpt")?,
        content: row.try_get("content")?,
        author: row.try_get("author")?,
        category: row.try_get("category")?,
        tags: get_json(row, "tags")?,
        status: get_enum(row, "status")?,
        cover_image: row.try_get("cover_image")?,
        view_count: row.try_get("view_count")?,
        like_count: row.try_get("like_count")?,
        comment_count: row.try_get("comment_count")?,
        bookmark_count: row.try_get("bookmark_count")?,
        published_at: row.try_get("published_at")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
