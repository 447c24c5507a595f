//! Blog service
//!
//! Posts, their comments and reader interactions. Every change to the event
//! tables recomputes the affected post's counters from those tables.

use chrono::Utc;
use std::sync::Arc;

use super::validation::require;
use super::{ServiceError, ServiceResult};
use crate::db::repositories::{CommentRepository, InteractionRepository, PostRepository};
use crate::models::{
    Comment, CreateCommentInput, CreatePostInput, Interaction, InteractionKind, ListParams,
    PagedResult, Post, UpdatePostInput,
};

const DUPLICATE_SLUG: &str = "A post with this slug already exists";
const FALLBACK_SLUG: &str = "post";

/// Build a URL slug: lowercase, alphanumeric runs joined by single hyphens.
///
/// Non-ASCII letters are kept; everything else separates words.
pub fn generate_slug(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_hyphen = false;

    for c in title.to_lowercase().chars() {
        if c.is_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            slug.push(c);
            pending_hyphen = false;
        } else {
            pending_hyphen = true;
        }
    }

    slug
}

/// Slug from an explicit value, else from the title
fn resolve_slug(explicit: Option<&str>, title: &str) -> String {
    let slug = explicit
        .map(generate_slug)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| generate_slug(title));
    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug
    }
}

pub struct BlogService {
    posts: Arc<dyn PostRepository>,
    comments: Arc<dyn CommentRepository>,
    interactions: Arc<dyn InteractionRepository>,
}

impl BlogService {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        comments: Arc<dyn CommentRepository>,
        interactions: Arc<dyn InteractionRepository>,
    ) -> Self {
        Self {
            posts,
            comments,
            interactions,
        }
    }

    pub async fn list(&self, params: ListParams) -> ServiceResult<PagedResult<Post>> {
        Ok(self.posts.list(&params.normalized()).await?)
    }

    pub async fn get(&self, id: i64) -> ServiceResult<Post> {
        self.posts
            .get_by_id(id)
            .await?
            .ok_or(ServiceError::NotFound("Post"))
    }

    pub async fn create(&self, input: CreatePostInput) -> ServiceResult<Post> {
        require("Title", &input.title)?;

        let slug = resolve_slug(input.slug.as_deref(), &input.title);
        self.ensure_slug_free(&slug, None).await?;
        let post = self
            .posts
            .create(&Post::from_input(input, slug))
            .await
            .map_err(|e| ServiceError::from_write(e, DUPLICATE_SLUG))?;

        tracing::info!(post_id = post.id, slug = %post.slug, status = %post.status, "Post created");
        Ok(post)
    }

    pub async fn update(&self, id: i64, input: UpdatePostInput) -> ServiceResult<Post> {
        if let Some(title) = &input.title {
            require("Title", title)?;
        }

        let mut post = self.get(id).await?;
        let explicit_slug = input.slug.clone();
        post.apply(input);
        if let Some(slug) = explicit_slug {
            post.slug = resolve_slug(Some(&slug), &post.title);
            self.ensure_slug_free(&post.slug, Some(id)).await?;
        }

        Ok(self
            .posts
            .update(&post)
            .await
            .map_err(|e| ServiceError::from_write(e, DUPLICATE_SLUG))?)
    }

    /// Reject a slug already held by another post
    async fn ensure_slug_free(&self, slug: &str, own_id: Option<i64>) -> ServiceResult<()> {
        match self.posts.get_by_slug(slug).await? {
            Some(existing) if Some(existing.id) != own_id => {
                Err(ServiceError::Conflict(DUPLICATE_SLUG.to_string()))
            }
            _ => Ok(()),
        }
    }

    pub async fn delete(&self, id: i64) -> ServiceResult<()> {
        if !self.posts.delete(id).await? {
            return Err(ServiceError::NotFound("Post"));
        }
        tracing::info!(post_id = id, "Post deleted");
        Ok(())
    }

    pub async fn comments(&self, post_id: i64) -> ServiceResult<Vec<Comment>> {
        self.get(post_id).await?;
        Ok(self.comments.list_for_post(post_id).await?)
    }

    pub async fn interactions(&self, post_id: i64) -> ServiceResult<Vec<Interaction>> {
        self.get(post_id).await?;
        Ok(self.interactions.list_for_post(post_id).await?)
    }

    /// Remove a comment and recount its post
    pub async fn delete_comment(&self, post_id: i64, comment_id: i64) -> ServiceResult<()> {
        match self.comments.get_by_id(comment_id).await? {
            Some(comment) if comment.post_id == post_id => {}
            _ => return Err(ServiceError::NotFound("Comment")),
        }

        self.comments.delete(comment_id).await?;
        self.posts.recount(post_id).await?;
        tracing::info!(post_id, comment_id, "Comment deleted");
        Ok(())
    }

    /// Append a reader comment to a published post
    pub async fn add_comment(&self, post_id: i64, input: CreateCommentInput) -> ServiceResult<Comment> {
        require("Author name", &input.author_name)?;
        require("Content", &input.content)?;
        self.published(post_id).await?;

        let comment = self
            .comments
            .create(&Comment {
                id: 0,
                post_id,
                user_id: input.user_id,
                author_name: input.author_name.trim().to_string(),
                content: input.content.trim().to_string(),
                created_at: Utc::now(),
            })
            .await?;
        self.posts.recount(post_id).await?;
        Ok(comment)
    }

    /// Record a view, like, bookmark or share on a published post
    pub async fn record_interaction(
        &self,
        post_id: i64,
        kind: InteractionKind,
        user_id: Option<i64>,
    ) -> ServiceResult<Interaction> {
        self.published(post_id).await?;

        let interaction = self
            .interactions
            .record(&Interaction {
                id: 0,
                post_id,
                user_id,
                kind,
                created_at: Utc::now(),
            })
            .await?;
        self.posts.recount(post_id).await?;
        Ok(interaction)
    }

    async fn published(&self, post_id: i64) -> ServiceResult<Post> {
        match self.posts.get_by_id(post_id).await? {
            Some(post) if post.is_published() => Ok(post),
            _ => Err(ServiceError::NotFound("Post")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{SqlxCommentRepository, SqlxInteractionRepository, SqlxPostRepository};
    use crate::db::{create_test_pool, migrations};
    use crate::models::PostStatus;
    use serde_json::json;

    async fn service() -> BlogService {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        BlogService::new(
            SqlxPostRepository::boxed(pool.clone()),
            SqlxCommentRepository::boxed(pool.clone()),
            SqlxInteractionRepository::boxed(pool),
        )
    }

    fn post_input(value: serde_json::Value) -> CreatePostInput {
        serde_json::from_value(value).unwrap()
    }

    fn comment(author: &str, content: &str) -> CreateCommentInput {
        CreateCommentInput {
            user_id: None,
            author_name: author.to_string(),
            content: content.to_string(),
        }
    }

    #[test]
    fn test_generate_slug() {
        assert_eq!(generate_slug("Hello World"), "hello-world");
        assert_eq!(generate_slug("Hello, World!"), "hello-world");
        assert_eq!(generate_slug("  Rust   2024 -- Notes_ "), "rust-2024-notes");
        assert_eq!(generate_slug("Tech 技术"), "tech-技术");
        assert_eq!(generate_slug("!!!"), "");
    }

    #[test]
    fn test_resolve_slug_fallbacks() {
        assert_eq!(resolve_slug(Some("My Slug"), "Title"), "my-slug");
        assert_eq!(resolve_slug(Some("***"), "Title Here"), "title-here");
        assert_eq!(resolve_slug(None, "???"), "post");
    }

    #[tokio::test]
    async fn test_create_post_and_duplicate_slug() {
        let service = service().await;

        let post = service
            .create(post_input(json!({ "title": "First Steps", "content": "..." })))
            .await
            .unwrap();
        assert_eq!(post.slug, "first-steps");
        assert_eq!(post.status, PostStatus::Draft);
        assert!(post.published_at.is_none());

        let err = service
            .create(post_input(json!({ "title": "First steps!" })))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));

        assert!(matches!(
            service.create(post_input(json!({ "title": "  " }))).await,
            Err(ServiceError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_update_rejects_slug_of_another_post() {
        let service = service().await;
        let first = service
            .create(post_input(json!({ "title": "Alpha" })))
            .await
            .unwrap();
        let second = service
            .create(post_input(json!({ "title": "Beta" })))
            .await
            .unwrap();

        let err = service
            .update(
                second.id,
                UpdatePostInput {
                    slug: Some("alpha".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));

        // Re-saving a post under its own slug is fine
        let kept = service
            .update(
                first.id,
                UpdatePostInput {
                    slug: Some("Alpha".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(kept.slug, "alpha");
    }

    #[tokio::test]
    async fn test_first_publish_sets_published_at() {
        let service = service().await;
        let post = service
            .create(post_input(json!({ "title": "Draft" })))
            .await
            .unwrap();

        let published = service
            .update(
                post.id,
                UpdatePostInput {
                    status: Some(PostStatus::Published),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let first_published_at = published.published_at.expect("published_at set");

        let republished = service
            .update(
                post.id,
                UpdatePostInput {
                    status: Some(PostStatus::Published),
                    title: Some("Renamed".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(republished.published_at, Some(first_published_at));
        assert_eq!(republished.slug, "draft");
    }

    #[tokio::test]
    async fn test_public_events_require_published_post() {
        let service = service().await;
        let draft = service
            .create(post_input(json!({ "title": "Hidden" })))
            .await
            .unwrap();

        assert!(matches!(
            service.add_comment(draft.id, comment("Ann", "Hi")).await,
            Err(ServiceError::NotFound("Post"))
        ));
        assert!(matches!(
            service.record_interaction(draft.id, InteractionKind::Like, None).await,
            Err(ServiceError::NotFound("Post"))
        ));
        assert!(matches!(
            service.record_interaction(9999, InteractionKind::View, None).await,
            Err(ServiceError::NotFound("Post"))
        ));
    }

    #[tokio::test]
    async fn test_events_keep_counters_in_sync() {
        let service = service().await;
        let post = service
            .create(post_input(json!({ "title": "Live", "status": "published" })))
            .await
            .unwrap();

        service.record_interaction(post.id, InteractionKind::View, None).await.unwrap();
        service.record_interaction(post.id, InteractionKind::View, Some(3)).await.unwrap();
        service.record_interaction(post.id, InteractionKind::Like, None).await.unwrap();
        let first = service.add_comment(post.id, comment("Ann", "Nice")).await.unwrap();
        service.add_comment(post.id, comment("Bo", "Thanks")).await.unwrap();

        let post = service.get(post.id).await.unwrap();
        assert_eq!(post.view_count, 2);
        assert_eq!(post.like_count, 1);
        assert_eq!(post.comment_count, 2);

        service.delete_comment(post.id, first.id).await.unwrap();
        let post = service.get(post.id).await.unwrap();
        assert_eq!(post.comment_count, 1);
        assert_eq!(service.comments(post.id).await.unwrap().len(), 1);
        assert_eq!(service.interactions(post.id).await.unwrap().len(), 3);

        assert!(matches!(
            service.delete_comment(post.id + 1, first.id).await,
            Err(ServiceError::NotFound("Comment"))
        ));
    }
}
