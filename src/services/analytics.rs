//! Analytics aggregation
//!
//! Turns raw event timestamps and nominal fields into the gap-filled time
//! series and distributions drawn by the dashboard charts.
//!
//! Timestamps are RFC 3339 strings; a day bucket is the first 10 characters
//! (`YYYY-MM-DD`) and a month bucket the first 7 (`YYYY-MM`). Every series is
//! generated from a fixed window anchored at `today`, so it always has the
//! same length, oldest bucket first, whatever the data looks like.

use chrono::{DateTime, Datelike, Duration, NaiveDate};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

use crate::db::repositories::{AnalyticsRepository, Dimension, EntityTotals, EventSource, TopPost};
use crate::services::ServiceError;

/// Days in the daily window
pub const DAILY_WINDOW: u32 = 30;
/// Months in the monthly window
pub const MONTHLY_WINDOW: u32 = 12;

const DAY_PREFIX: usize = 10;
const MONTH_PREFIX: usize = 7;

/// Fallback label for posts and contacts without a category
pub const GENERAL: &str = "general";
/// Fallback label for courses and card sets without a category
pub const UNCATEGORIZED: &str = "Uncategorized";

const TOP_POSTS: i64 = 5;

/// Report anchors outside these years are rejected
const ANCHOR_YEARS: std::ops::RangeInclusive<i32> = 1970..=9999;

const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeriesPoint {
    pub key: String,
    pub label: String,
    pub count: i64,
}

/// A bucket carrying a summed amount instead of a count
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValuePoint {
    pub key: String,
    pub label: String,
    pub value: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DistributionEntry {
    pub key: String,
    pub label: String,
    pub count: i64,
}

/// A bucket key with its display label
#[derive(Debug, Clone, PartialEq, Eq)]
struct Bucket {
    key: String,
    label: String,
}

/// The last `days` days ending at `today`, oldest first. Days before the
/// start of the calendar are left out.
fn daily_buckets(today: NaiveDate, days: u32) -> Vec<Bucket> {
    let mut buckets: Vec<Bucket> = (0..days as i64)
        .filter_map(|offset| today.checked_sub_signed(Duration::days(offset)))
        .map(|date| Bucket {
            key: date.format("%Y-%m-%d").to_string(),
            label: date.format("%b %-d").to_string(),
        })
        .collect();
    buckets.reverse();
    buckets
}

/// The last `months` calendar months ending with the month of `today`, oldest first
fn monthly_buckets(today: NaiveDate, months: u32) -> Vec<Bucket> {
    let current = today.year() as i64 * 12 + today.month0() as i64;
    let mut buckets: Vec<Bucket> = (0..months as i64)
        .map(|offset| {
            let index = current - offset;
            let year = index.div_euclid(12);
            let month0 = index.rem_euclid(12) as usize;
            Bucket {
                key: format!("{:04}-{:02}", year, month0 + 1),
                label: format!("{} {}", MONTH_NAMES[month0], year),
            }
        })
        .collect();
    buckets.reverse();
    buckets
}

/// Count timestamps per prefix and left-join the buckets against the counts
fn bucket_counts<S: AsRef<str>>(timestamps: &[S], buckets: Vec<Bucket>, prefix: usize) -> Vec<SeriesPoint> {
    let mut counts: HashMap<&str, i64> = HashMap::new();
    for ts in timestamps {
        if let Some(key) = ts.as_ref().get(..prefix) {
            *counts.entry(key).or_insert(0) += 1;
        }
    }

    buckets
        .into_iter()
        .map(|bucket| {
            let count = counts.get(bucket.key.as_str()).copied().unwrap_or(0);
            SeriesPoint {
                key: bucket.key,
                label: bucket.label,
                count,
            }
        })
        .collect()
}

/// Daily counts over the 30-day window ending at `today`
pub fn daily_series<S: AsRef<str>>(timestamps: &[S], today: NaiveDate) -> Vec<SeriesPoint> {
    bucket_counts(timestamps, daily_buckets(today, DAILY_WINDOW), DAY_PREFIX)
}

/// Monthly counts over the 12-month window ending with the month of `today`
pub fn monthly_series<S: AsRef<str>>(timestamps: &[S], today: NaiveDate) -> Vec<SeriesPoint> {
    bucket_counts(timestamps, monthly_buckets(today, MONTHLY_WINDOW), MONTH_PREFIX)
}

/// Monthly sums of `(timestamp, amount)` pairs over the 12-month window
pub fn monthly_sum(entries: &[(String, i64)], today: NaiveDate) -> Vec<ValuePoint> {
    let mut sums: HashMap<&str, i64> = HashMap::new();
    for (ts, amount) in entries {
        if let Some(key) = ts.get(..MONTH_PREFIX) {
            let sum = sums.entry(key).or_insert(0);
            *sum = sum.saturating_add(*amount);
        }
    }

    monthly_buckets(today, MONTHLY_WINDOW)
        .into_iter()
        .map(|bucket| {
            let value = sums.get(bucket.key.as_str()).copied().unwrap_or(0);
            ValuePoint {
                key: bucket.key,
                label: bucket.label,
                value,
            }
        })
        .collect()
}

/// First day of the daily window, usable as a lower bound on timestamps
pub fn daily_window_start(today: NaiveDate) -> String {
    today
        .checked_sub_signed(Duration::days(DAILY_WINDOW as i64 - 1))
        .unwrap_or(NaiveDate::MIN)
        .format("%Y-%m-%d")
        .to_string()
}

/// First month of the monthly window (`YYYY-MM`), usable as a lower bound on timestamps
pub fn monthly_window_start(today: NaiveDate) -> String {
    monthly_buckets(today, MONTHLY_WINDOW)
        .into_iter()
        .next()
        .map(|bucket| bucket.key)
        .unwrap_or_default()
}

/// Check that a report anchor falls in a supported year
pub fn check_anchor(today: NaiveDate) -> Result<NaiveDate, ServiceError> {
    if ANCHOR_YEARS.contains(&today.year()) {
        Ok(today)
    } else {
        Err(ServiceError::validation(format!(
            "Report date must fall between the years {} and {}",
            ANCHOR_YEARS.start(),
            ANCHOR_YEARS.end()
        )))
    }
}

/// `in-progress` → `In Progress`, `study_tips` → `Study Tips`
pub fn title_case(raw: &str) -> String {
    raw.split(|c: char| c == '-' || c == '_' || c.is_whitespace())
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Group-count nominal values. Missing or blank values count under `fallback`.
///
/// Sorted by count descending, then label ascending.
pub fn distribution(values: &[Option<String>], fallback: &str) -> Vec<DistributionEntry> {
    let mut counts: HashMap<String, i64> = HashMap::new();
    for value in values {
        let key = match value.as_deref().map(str::trim) {
            Some(v) if !v.is_empty() => v.to_string(),
            _ => fallback.to_string(),
        };
        *counts.entry(key).or_insert(0) += 1;
    }

    let mut entries: Vec<DistributionEntry> = counts
        .into_iter()
        .map(|(key, count)| DistributionEntry {
            label: title_case(&key),
            key,
            count,
        })
        .collect();
    entries.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
    entries
}

/// Mean of `resolved - created` in hours, rounded to one decimal; 0 when empty
pub fn average_resolution_hours(spans: &[(String, String)]) -> f64 {
    let hours: Vec<f64> = spans
        .iter()
        .filter_map(|(created, resolved)| {
            let created = DateTime::parse_from_rfc3339(created).ok()?;
            let resolved = DateTime::parse_from_rfc3339(resolved).ok()?;
            Some((resolved - created).num_seconds() as f64 / 3600.0)
        })
        .collect();

    if hours.is_empty() {
        return 0.0;
    }
    let mean = hours.iter().sum::<f64>() / hours.len() as f64;
    (mean * 10.0).round() / 10.0
}

#[derive(Debug, Clone, Serialize)]
pub struct SeriesPair {
    pub daily: Vec<SeriesPoint>,
    pub monthly: Vec<SeriesPoint>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OverviewReport {
    pub totals: EntityTotals,
    pub course_categories: Vec<DistributionEntry>,
    pub card_set_categories: Vec<DistributionEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EngagementReport {
    pub interactions: SeriesPair,
    pub comments: SeriesPair,
    pub interaction_kinds: Vec<DistributionEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContactsReport {
    pub daily: Vec<SeriesPoint>,
    pub statuses: Vec<DistributionEntry>,
    pub categories: Vec<DistributionEntry>,
    pub avg_resolution_hours: f64,
    pub resolved_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostsReport {
    pub monthly: Vec<SeriesPoint>,
    pub categories: Vec<DistributionEntry>,
    pub statuses: Vec<DistributionEntry>,
    pub top_posts: Vec<TopPost>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UsersReport {
    pub daily: Vec<SeriesPoint>,
    pub monthly: Vec<SeriesPoint>,
    pub plans: Vec<DistributionEntry>,
    pub subscriptions: Vec<DistributionEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RevenueReport {
    pub monthly: Vec<ValuePoint>,
    pub total_cents: i64,
    pub statuses: Vec<DistributionEntry>,
}

/// Builds the dashboard reports. Every report is computed whole or not at all.
pub struct AnalyticsService {
    repo: Arc<dyn AnalyticsRepository>,
}

impl AnalyticsService {
    pub fn new(repo: Arc<dyn AnalyticsRepository>) -> Self {
        Self { repo }
    }

    async fn series(&self, source: EventSource, today: NaiveDate) -> Result<SeriesPair, ServiceError> {
        let stamps = self
            .repo
            .timestamps(source, &monthly_window_start(today))
            .await?;
        Ok(SeriesPair {
            daily: daily_series(&stamps, today),
            monthly: monthly_series(&stamps, today),
        })
    }

    async fn distribution_of(
        &self,
        dimension: Dimension,
        fallback: &str,
    ) -> Result<Vec<DistributionEntry>, ServiceError> {
        let values = self.repo.field_values(dimension).await?;
        Ok(distribution(&values, fallback))
    }

    pub async fn overview(&self) -> Result<OverviewReport, ServiceError> {
        Ok(OverviewReport {
            totals: self.repo.entity_totals().await?,
            course_categories: self
                .distribution_of(Dimension::CourseCategory, UNCATEGORIZED)
                .await?,
            card_set_categories: self
                .distribution_of(Dimension::CardSetCategory, UNCATEGORIZED)
                .await?,
        })
    }

    pub async fn engagement(&self, today: NaiveDate) -> Result<EngagementReport, ServiceError> {
        let today = check_anchor(today)?;
        Ok(EngagementReport {
            interactions: self.series(EventSource::Interactions, today).await?,
            comments: self.series(EventSource::Comments, today).await?,
            interaction_kinds: self
                .distribution_of(Dimension::InteractionKind, GENERAL)
                .await?,
        })
    }

    pub async fn contacts(&self, today: NaiveDate) -> Result<ContactsReport, ServiceError> {
        let today = check_anchor(today)?;
        let stamps = self
            .repo
            .timestamps(EventSource::Contacts, &daily_window_start(today))
            .await?;
        let spans = self.repo.resolved_contact_spans().await?;

        Ok(ContactsReport {
            daily: daily_series(&stamps, today),
            statuses: self.distribution_of(Dimension::ContactStatus, GENERAL).await?,
            categories: self.distribution_of(Dimension::ContactCategory, GENERAL).await?,
            avg_resolution_hours: average_resolution_hours(&spans),
            resolved_count: spans.len(),
        })
    }

    pub async fn posts(&self, today: NaiveDate) -> Result<PostsReport, ServiceError> {
        let today = check_anchor(today)?;
        let stamps = self
            .repo
            .timestamps(EventSource::Posts, &monthly_window_start(today))
            .await?;

        Ok(PostsReport {
            monthly: monthly_series(&stamps, today),
            categories: self.distribution_of(Dimension::PostCategory, GENERAL).await?,
            statuses: self.distribution_of(Dimension::PostStatus, GENERAL).await?,
            top_posts: self.repo.top_posts(TOP_POSTS).await?,
        })
    }

    pub async fn users(&self, today: NaiveDate) -> Result<UsersReport, ServiceError> {
        let today = check_anchor(today)?;
        let signups = self.series(EventSource::Users, today).await?;
        Ok(UsersReport {
            daily: signups.daily,
            monthly: signups.monthly,
            plans: self.distribution_of(Dimension::UserPlan, GENERAL).await?,
            subscriptions: self
                .distribution_of(Dimension::SubscriptionStatus, GENERAL)
                .await?,
        })
    }

    pub async fn revenue(&self, today: NaiveDate) -> Result<RevenueReport, ServiceError> {
        let today = check_anchor(today)?;
        let paid = self.repo.paid_amounts(&monthly_window_start(today)).await?;
        let monthly = monthly_sum(&paid, today);
        let total_cents = monthly
            .iter()
            .fold(0i64, |total, point| total.saturating_add(point.value));

        Ok(RevenueReport {
            monthly,
            total_cents,
            statuses: self.distribution_of(Dimension::BillingStatus, GENERAL).await?,
        })
    }
}
