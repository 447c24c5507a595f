//! Blog posts and their engagement events
//!
//! `comments` and `interactions` are append-only event tables and the source
//! of truth for engagement. The counters on [`Post`] are a cache of those
//! tables, refreshed whenever events change (see `services::counters`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

string_enum! {
    pub enum PostStatus {
        Draft => "draft",
        Published => "published",
    }
    default = Draft;
}

string_enum! {
    /// Kind of reader interaction recorded against a post
    pub enum InteractionKind {
        View => "view",
        Like => "like",
        Bookmark => "bookmark",
        Share => "share",
    }
    default = View;
}

/// Cached engagement counters of a post
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostCounters {
    pub views: i64,
    pub likes: i64,
    pub bookmarks: i64,
    pub comments: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub excerpt: Option<String>,
    pub content: String,
    pub author: Option<String>,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub status: PostStatus,
    pub cover_image: Option<String>,
    pub view_count: i64,
    pub like_count: i64,
    pub comment_count: i64,
    pub bookmark_count: i64,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    pub fn counters(&self) -> PostCounters {
        PostCounters {
            views: self.view_count,
            likes: self.like_count,
            bookmarks: self.bookmark_count,
            comments: self.comment_count,
        }
    }

    pub fn is_published(&self) -> bool {
        self.status == PostStatus::Published
    }

    /// Move to `status`, stamping `published_at` on the first publish
    pub fn set_status(&mut self, status: PostStatus) {
        self.status = status;
        if status == PostStatus::Published && self.published_at.is_none() {
            self.published_at = Some(Utc::now());
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePostInput {
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub status: PostStatus,
    #[serde(default)]
    pub cover_image: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePostInput {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub excerpt: Option<String>,
    pub content: Option<String>,
    pub author: Option<String>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
    pub status: Option<PostStatus>,
    pub cover_image: Option<String>,
}

impl Post {
    /// Build an unsaved post with an already-resolved slug
    pub fn from_input(input: CreatePostInput, slug: String) -> Self {
        let now = Utc::now();
        let mut post = Self {
            id: 0,
            title: input.title.trim().to_string(),
            slug,
            excerpt: input.excerpt,
            content: input.content,
            author: input.author,
            category: input.category.filter(|c| !c.trim().is_empty()),
            tags: normalize_tags(input.tags),
            status: PostStatus::Draft,
            cover_image: input.cover_image,
            view_count: 0,
            like_count: 0,
            comment_count: 0,
            bookmark_count: 0,
            published_at: None,
            created_at: now,
            updated_at: now,
        };
        post.set_status(input.status);
        post
    }

    /// Merge a partial update; the slug is handled by the caller
    pub fn apply(&mut self, input: UpdatePostInput) {
        if let Some(title) = input.title {
            self.title = title.trim().to_string();
        }
        super::merge_optional(&mut self.excerpt, input.excerpt);
        if let Some(content) = input.content {
            self.content = content;
        }
        super::merge_optional(&mut self.author, input.author);
        super::merge_optional(&mut self.category, input.category);
        super::merge_optional(&mut self.cover_image, input.cover_image);
        if let Some(tags) = input.tags {
            self.tags = normalize_tags(tags);
        }
        if let Some(status) = input.status {
            self.set_status(status);
        }
        self.updated_at = Utc::now();
    }
}

/// Trim, drop empties and de-duplicate while keeping order
fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim().to_string();
        if !tag.is_empty() && !out.contains(&tag) {
            out.push(tag);
        }
    }
    out
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub user_id: Option<i64>,
    pub author_name: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCommentInput {
    #[serde(default)]
    pub user_id: Option<i64>,
    pub author_name: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interaction {
    pub id: i64,
    pub post_id: i64,
    pub user_id: Option<i64>,
    pub kind: InteractionKind,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(status: PostStatus) -> CreatePostInput {
        CreatePostInput {
            title: " Hello ".to_string(),
            slug: None,
            excerpt: None,
            content: "Body".to_string(),
            author: None,
            category: Some("  ".to_string()),
            tags: vec!["rust".to_string(), " rust ".to_string(), "".to_string(), "web".to_string()],
            status,
            cover_image: None,
        }
    }

    #[test]
    fn test_draft_has_no_published_at() {
        let post = Post::from_input(input(PostStatus::Draft), "hello".to_string());
        assert!(post.published_at.is_none());
        assert!(post.category.is_none());
        assert_eq!(post.tags, vec!["rust".to_string(), "web".to_string()]);
        assert_eq!(post.title, "Hello");
    }

    #[test]
    fn test_first_publish_sets_published_at_once() {
        let mut post = Post::from_input(input(PostStatus::Draft), "hello".to_string());
        post.set_status(PostStatus::Published);
        let first = post.published_at.expect("published_at set");

        post.set_status(PostStatus::Draft);
        post.set_status(PostStatus::Published);
        assert_eq!(post.published_at, Some(first));
    }

    #[test]
    fn test_interaction_kind_parse() {
        use std::str::FromStr;
        assert_eq!(InteractionKind::from_str("Like").unwrap(), InteractionKind::Like);
        assert!(InteractionKind::from_str("clap").is_err());
    }
}
