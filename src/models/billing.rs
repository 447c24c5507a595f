//! Billing transactions
//!
//! Records only; no payment provider is contacted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::UserPlan;

string_enum! {
    pub enum BillingStatus {
        Paid => "paid",
        Pending => "pending",
        Failed => "failed",
        Refunded => "refunded",
    }
    default = Pending;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillingTransaction {
    pub id: i64,
    pub user_id: i64,
    pub plan: UserPlan,
    pub amount_cents: i64,
    pub currency: String,
    pub status: BillingStatus,
    pub provider_ref: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_currency() -> String {
    "USD".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateBillingInput {
    pub user_id: i64,
    pub plan: UserPlan,
    pub amount_cents: i64,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub status: BillingStatus,
    #[serde(default)]
    pub provider_ref: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateBillingInput {
    pub plan: Option<UserPlan>,
    pub amount_cents: Option<i64>,
    pub currency: Option<String>,
    pub status: Option<BillingStatus>,
    pub provider_ref: Option<String>,
    pub description: Option<String>,
}

impl BillingTransaction {
    pub fn from_input(input: CreateBillingInput) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            user_id: input.user_id,
            plan: input.plan,
            amount_cents: input.amount_cents,
            currency: input.currency.trim().to_uppercase(),
            status: input.status,
            provider_ref: input.provider_ref,
            description: input.description,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, input: UpdateBillingInput) {
        if let Some(plan) = input.plan {
            self.plan = plan;
        }
        if let Some(amount_cents) = input.amount_cents {
            self.amount_cents = amount_cents;
        }
        if let Some(currency) = input.currency {
            self.currency = currency.trim().to_uppercase();
        }
        if let Some(status) = input.status {
            self.status = status;
        }
        super::merge_optional(&mut self.provider_ref, input.provider_ref);
        super::merge_optional(&mut self.description, input.description);
        self.updated_at = Utc::now();
    }
}
