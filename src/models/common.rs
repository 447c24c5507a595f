use serde::{Deserialize, Serialize};

/// Upper bound for `limit` on every list endpoint
pub const MAX_PAGE_SIZE: i64 = 100;

const DEFAULT_PAGE_SIZE: i64 = 20;

/// Filter and pagination parameters shared by every list query
///
/// Out-of-range `page` and `limit` values are clamped rather than rejected.
/// Empty filter strings are treated as absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListParams {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub plan: Option<String>,
    #[serde(default)]
    pub audience: Option<String>,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    DEFAULT_PAGE_SIZE
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            page: default_page(),
            limit: default_limit(),
            search: None,
            status: None,
            category: None,
            difficulty: None,
            plan: None,
            audience: None,
        }
    }
}

impl ListParams {
    pub fn new(page: i64, limit: i64) -> Self {
        Self {
            page,
            limit,
            ..Self::default()
        }
    }

    /// Clamp pagination and drop blank filters
    pub fn normalized(mut self) -> Self {
        self.page = self.page.max(1);
        self.limit = self.limit.clamp(1, MAX_PAGE_SIZE);
        for field in [
            &mut self.search,
            &mut self.status,
            &mut self.category,
            &mut self.difficulty,
            &mut self.plan,
            &mut self.audience,
        ] {
            *field = field
                .take()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty());
        }
        self
    }

    pub fn offset(&self) -> i64 {
        (self.page.max(1) - 1).saturating_mul(self.limit)
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}

/// One page of results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagedResult<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub total_pages: i64,
}

impl<T> PagedResult<T> {
    pub fn new(items: Vec<T>, total: i64, params: &ListParams) -> Self {
        Self {
            items,
            total,
            page: params.page,
            limit: params.limit,
            total_pages: total_pages(total, params.limit),
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PagedResult<U> {
        PagedResult {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            limit: self.limit,
            total_pages: self.total_pages,
        }
    }
}

/// `ceil(total / limit)`, zero for an empty result
pub fn total_pages(total: i64, limit: i64) -> i64 {
    if total <= 0 || limit <= 0 {
        return 0;
    }
    (total + limit - 1) / limit
}

/// Apply a partial update to an optional text field
///
/// `None` keeps the current value, a blank string clears it.
pub fn merge_optional(target: &mut Option<String>, value: Option<String>) {
    if let Some(value) = value {
        let trimmed = value.trim();
        *target = if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_normalized_clamps_and_drops_blank_filters() {
        let params = ListParams {
            page: 0,
            limit: 1000,
            search: Some("  ".to_string()),
            status: Some(" published ".to_string()),
            ..ListParams::default()
        }
        .normalized();

        assert_eq!(params.page, 1);
        assert_eq!(params.limit, MAX_PAGE_SIZE);
        assert!(params.search.is_none());
        assert_eq!(params.status.as_deref(), Some("published"));
    }

    #[test]
    fn test_total_pages_empty_result() {
        assert_eq!(total_pages(0, 20), 0);
        assert_eq!(total_pages(1, 20), 1);
        assert_eq!(total_pages(40, 20), 2);
        assert_eq!(total_pages(41, 20), 3);
    }

    #[test]
    fn test_merge_optional() {
        let mut value = Some("old".to_string());
        merge_optional(&mut value, None);
        assert_eq!(value.as_deref(), Some("old"));
        merge_optional(&mut value, Some(" new ".to_string()));
        assert_eq!(value.as_deref(), Some("new"));
        merge_optional(&mut value, Some("".to_string()));
        assert!(value.is_none());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(50))]

        #[test]
        fn pages_cover_every_item(total in 0i64..10_000, limit in 1i64..=100) {
            let pages = total_pages(total, limit);
            prop_assert!(pages * limit >= total);
            if total > 0 {
                prop_assert!((pages - 1) * limit < total);
            }
        }

        #[test]
        fn normalized_is_always_in_range(page in any::<i64>(), limit in any::<i64>()) {
            let params = ListParams::new(page, limit).normalized();
            prop_assert!(params.page >= 1);
            prop_assert!((1..=MAX_PAGE_SIZE).contains(&params.limit));
            prop_assert!(params.offset() >= 0);
        }
    }
}
