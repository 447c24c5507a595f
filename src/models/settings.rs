//! Platform settings document
//!
//! A single JSON document. Every field carries a serde default so documents
//! written by older versions (or partial documents sent by the dashboard)
//! deserialize into a complete value.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::UserPlan;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformSettings {
    #[serde(default = "default_site_name")]
    pub site_name: String,
    #[serde(default = "default_support_email")]
    pub support_email: String,
    #[serde(default)]
    pub maintenance_mode: bool,
    #[serde(default = "default_true")]
    pub allow_signups: bool,
    /// New admins (after the first) wait for a super admin's approval
    #[serde(default = "default_true")]
    pub require_admin_approval: bool,
    #[serde(default)]
    pub default_plan: UserPlan,
    #[serde(default = "default_free_card_set_limit")]
    pub free_card_set_limit: i64,
    #[serde(default = "default_free_test_limit")]
    pub free_test_limit: i64,
    #[serde(default)]
    pub featured_course_ids: Vec<i64>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

fn default_site_name() -> String {
    "Learnboard".to_string()
}

fn default_support_email() -> String {
    "support@learnboard.local".to_string()
}

fn default_true() -> bool {
    true
}

fn default_free_card_set_limit() -> i64 {
    10
}

fn default_free_test_limit() -> i64 {
    5
}

impl Default for PlatformSettings {
    fn default() -> Self {
        Self {
            site_name: default_site_name(),
            support_email: default_support_email(),
            maintenance_mode: false,
            allow_signups: true,
            require_admin_approval: true,
            default_plan: UserPlan::Free,
            free_card_set_limit: default_free_card_set_limit(),
            free_test_limit: default_free_test_limit(),
            featured_course_ids: Vec::new(),
            updated_at: None,
        }
    }
}
