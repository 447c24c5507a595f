//! Platform user model
//!
//! Learners on the platform. The dashboard manages their profile, plan and
//! account state; they never sign in to the dashboard itself.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

string_enum! {
    /// Subscription plan
    pub enum UserPlan {
        Free => "free",
        Pro => "pro",
        Premium => "premium",
    }
    default = Free;
}

string_enum! {
    pub enum SubscriptionStatus {
        None => "none",
        Trialing => "trialing",
        Active => "active",
        PastDue => "past_due",
        Canceled => "canceled",
    }
    default = None;
}

string_enum! {
    pub enum UserStatus {
        Active => "active",
        Suspended => "suspended",
    }
    default = Active;
}

/// Learning activity summary kept on the user record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStats {
    #[serde(default)]
    pub card_sets: i64,
    #[serde(default)]
    pub tests: i64,
    #[serde(default)]
    pub study_minutes: i64,
    #[serde(default)]
    pub streak_days: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub avatar: Option<String>,
    pub bio: Option<String>,
    pub plan: UserPlan,
    pub subscription_status: SubscriptionStatus,
    pub status: UserStatus,
    pub stats: UserStats,
    pub last_active_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserInput {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub plan: UserPlan,
    #[serde(default)]
    pub subscription_status: SubscriptionStatus,
    #[serde(default)]
    pub status: UserStatus,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUserInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub avatar: Option<String>,
    pub bio: Option<String>,
    pub plan: Option<UserPlan>,
    pub subscription_status: Option<SubscriptionStatus>,
    pub status: Option<UserStatus>,
    pub stats: Option<UserStats>,
}

impl User {
    pub fn from_input(input: CreateUserInput) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            name: input.name.trim().to_string(),
            email: input.email.trim().to_lowercase(),
            avatar: input.avatar,
            bio: input.bio,
            plan: input.plan,
            subscription_status: input.subscription_status,
            status: input.status,
            stats: UserStats::default(),
            last_active_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Merge a partial update; `updated_at` is refreshed
    pub fn apply(&mut self, input: UpdateUserInput) {
        if let Some(name) = input.name {
            self.name = name.trim().to_string();
        }
        if let Some(email) = input.email {
            self.email = email.trim().to_lowercase();
        }
        super::merge_optional(&mut self.avatar, input.avatar);
        super::merge_optional(&mut self.bio, input.bio);
        if let Some(plan) = input.plan {
            self.plan = plan;
        }
        if let Some(subscription_status) = input.subscription_status {
            self.subscription_status = subscription_status;
        }
        if let Some(status) = input.status {
            self.status = status;
        }
        if let Some(stats) = input.stats {
            self.stats = stats;
        }
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_input_defaults() {
        let input: CreateUserInput =
            serde_json::from_str(r#"{"name":"Lin","email":"LIN@Example.com"}"#).unwrap();
        let user = User::from_input(input);
        assert_eq!(user.email, "lin@example.com");
        assert_eq!(user.plan, UserPlan::Free);
        assert_eq!(user.subscription_status, SubscriptionStatus::None);
        assert_eq!(user.status, UserStatus::Active);
    }

    #[test]
    fn test_apply_partial_update() {
        let input: CreateUserInput =
            serde_json::from_str(r#"{"name":"Lin","email":"lin@example.com","bio":"hi"}"#)
                .unwrap();
        let mut user = User::from_input(input);
        let before = user.updated_at;

        user.apply(UpdateUserInput {
            plan: Some(UserPlan::Pro),
            bio: Some(String::new()),
            ..Default::default()
        });

        assert_eq!(user.plan, UserPlan::Pro);
        assert_eq!(user.name, "Lin");
        assert!(user.bio.is_none());
        assert!(user.updated_at >= before);
    }

    #[test]
    fn test_past_due_wire_name() {
        let status: SubscriptionStatus = serde_json::from_str("\"past_due\"").unwrap();
        assert_eq!(status, SubscriptionStatus::PastDue);
    }
}
