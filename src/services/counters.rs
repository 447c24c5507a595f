//! Post counter audit and repair
//!
//! Post counters are a cache of the `interactions` and `comments` tables.
//! The audit compares both sides; reconcile rewrites drifted rows.

use serde::Serialize;
use std::sync::Arc;

use super::ServiceResult;
use crate::db::repositories::{CounterSnapshot, PostRepository};

/// One counter whose cached value differs from the event tables
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CounterDrift {
    pub post_id: i64,
    pub field: &'static str,
    pub cached: i64,
    pub actual: i64,
}

fn drifts(snapshot: &CounterSnapshot) -> impl Iterator<Item = CounterDrift> + '_ {
    let (cached, actual) = (snapshot.cached, snapshot.actual);
    [
        ("view_count", cached.views, actual.views),
        ("like_count", cached.likes, actual.likes),
        ("bookmark_count", cached.bookmarks, actual.bookmarks),
        ("comment_count", cached.comments, actual.comments),
    ]
    .into_iter()
    .filter(|(_, cached, actual)| cached != actual)
    .map(move |(field, cached, actual)| CounterDrift {
        post_id: snapshot.post_id,
        field,
        cached,
        actual,
    })
}

pub struct CounterService {
    posts: Arc<dyn PostRepository>,
}

impl CounterService {
    pub fn new(posts: Arc<dyn PostRepository>) -> Self {
        Self { posts }
    }

    pub async fn audit(&self) -> ServiceResult<Vec<CounterDrift>> {
        let snapshots = self.posts.counter_snapshots().await?;
        Ok(snapshots.iter().flat_map(drifts).collect())
    }

    /// Rewrite drifted counters; returns the number of posts repaired
    pub async fn reconcile(&self) -> ServiceResult<u64> {
        let repaired = self.posts.recount_all().await?;
        if repaired > 0 {
            tracing::warn!(repaired, "Repaired drifted post counters");
        }
        Ok(repaired)
    }
}
