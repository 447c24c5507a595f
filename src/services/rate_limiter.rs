//! Sliding-window limiter for admin login
//!
//! - failed attempts per email: 5 per 15 minutes
//! - login requests per IP: 10 per minute

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::net::IpAddr;
use tokio::sync::RwLock;

use super::validation::normalize_email;

const EMAIL_LIMIT: usize = 5;
const EMAIL_WINDOW_MINUTES: i64 = 15;
const IP_LIMIT: usize = 10;
const IP_WINDOW_MINUTES: i64 = 1;

pub struct LoginRateLimiter {
    email_failures: RwLock<HashMap<String, Vec<DateTime<Utc>>>>,
    ip_requests: RwLock<HashMap<IpAddr, Vec<DateTime<Utc>>>>,
}

impl LoginRateLimiter {
    pub fn new() -> Self {
        Self {
            email_failures: RwLock::new(HashMap::new()),
            ip_requests: RwLock::new(HashMap::new()),
        }
    }

    /// True once an email has collected the maximum failures inside the window
    pub async fn is_email_limited(&self, email: &str) -> bool {
        let cutoff = Utc::now() - Duration::minutes(EMAIL_WINDOW_MINUTES);
        let mut failures = self.email_failures.write().await;
        match failures.get_mut(&normalize_email(email)) {
            Some(times) => {
                times.retain(|time| *time > cutoff);
                times.len() >= EMAIL_LIMIT
            }
            None => false,
        }
    }

    pub async fn record_failure(&self, email: &str) {
        self.email_failures
            .write()
            .await
            .entry(normalize_email(email))
            .or_default()
            .push(Utc::now());
    }

    /// Forget the failures of an email after a successful login
    pub async fn clear_email(&self, email: &str) {
        self.email_failures
            .write()
            .await
            .remove(&normalize_email(email));
    }

    /// Record a request from `ip` and report whether it exceeds the limit
    pub async fn check_ip(&self, ip: IpAddr) -> bool {
        let now = Utc::now();
        let cutoff = now - Duration::minutes(IP_WINDOW_MINUTES);
        let mut requests = self.ip_requests.write().await;
        let times = requests.entry(ip).or_default();
        times.retain(|time| *time > cutoff);
        if times.len() >= IP_LIMIT {
            return true;
        }
        times.push(now);
        false
    }

    /// Drop expired entries; run periodically
    pub async fn cleanup(&self) {
        let now = Utc::now();
        let email_cutoff = now - Duration::minutes(EMAIL_WINDOW_MINUTES);
        let ip_cutoff = now - Duration::minutes(IP_WINDOW_MINUTES);

        self.email_failures.write().await.retain(|_, times| {
            times.retain(|time| *time > email_cutoff);
            !times.is_empty()
        });

        self.ip_requests.write().await.retain(|_, times| {
            times.retain(|time| *time > ip_cutoff);
            !times.is_empty()
        });

        let (emails, ips) = self.tracked().await;
        tracing::debug!(emails, ips, "Login rate limiter pruned");
    }

    /// Number of tracked emails and IPs
    pub async fn tracked(&self) -> (usize, usize) {
        (
            self.email_failures.read().await.len(),
            self.ip_requests.read().await.len(),
        )
    }
}

impl Default for LoginRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[tokio::test]
    async fn test_email_limit() {
        let limiter = LoginRateLimiter::new();

        for _ in 0..4 {
            limiter.record_failure("ada@example.com").await;
        }
        assert!(!limiter.is_email_limited("ada@example.com").await);

        limiter.record_failure("ada@example.com").await;
        assert!(limiter.is_email_limited("ada@example.com").await);

        limiter.clear_email("ada@example.com").await;
        assert!(!limiter.is_email_limited("ada@example.com").await);
    }

    #[tokio::test]
    async fn test_email_is_case_insensitive() {
        let limiter = LoginRateLimiter::new();
        for email in ["Ada@Example.com", "ada@example.com", "ADA@EXAMPLE.COM", " ada@example.com", "ada@example.COM"] {
            limiter.record_failure(email).await;
        }
        assert!(limiter.is_email_limited("ada@example.com").await);
    }

    #[tokio::test]
    async fn test_ip_limit() {
        let limiter = LoginRateLimiter::new();
        let ip = IpAddr::from_str("127.0.0.1").unwrap();

        for _ in 0..10 {
            assert!(!limiter.check_ip(ip).await);
        }
        assert!(limiter.check_ip(ip).await);

        let other = IpAddr::from_str("10.0.0.1").unwrap();
        assert!(!limiter.check_ip(other).await);
    }

    #[tokio::test]
    async fn test_cleanup_keeps_fresh_entries() {
        let limiter = LoginRateLimiter::new();
        limiter.record_failure("ada@example.com").await;
        limiter.check_ip(IpAddr::from_str("127.0.0.1").unwrap()).await;

        limiter.cleanup().await;
        assert_eq!(limiter.tracked().await, (1, 1));
    }
}
