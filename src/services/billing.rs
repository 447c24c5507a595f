//! Billing records and the subscription summary

use serde::Serialize;
use std::sync::Arc;

use super::validation::{require, require_non_negative};
use super::{ServiceError, ServiceResult};
use crate::db::repositories::{BillingRepository, StatusTotal, UserRepository};
use crate::models::{
    BillingStatus, BillingTransaction, CreateBillingInput, ListParams, PagedResult, UpdateBillingInput, UserPlan,
};

#[derive(Debug, Clone, Serialize)]
pub struct PlanSubscribers {
    pub plan: UserPlan,
    pub count: i64,
}

/// Totals per transaction status and active subscribers per plan
#[derive(Debug, Clone, Serialize)]
pub struct BillingSummary {
    pub statuses: Vec<StatusTotal>,
    pub active_subscribers: Vec<PlanSubscribers>,
    pub paid_cents: i64,
}

pub struct BillingService {
    repo: Arc<dyn BillingRepository>,
    users: Arc<dyn UserRepository>,
}

impl BillingService {
    pub fn new(repo: Arc<dyn BillingRepository>, users: Arc<dyn UserRepository>) -> Self {
        Self { repo, users }
    }

    pub async fn list(&self, params: ListParams) -> ServiceResult<PagedResult<BillingTransaction>> {
        Ok(self.repo.list(&params.normalized()).await?)
    }

    pub async fn get(&self, id: i64) -> ServiceResult<BillingTransaction> {
        self.repo
            .get_by_id(id)
            .await?
            .ok_or(ServiceError::NotFound("Transaction"))
    }

    pub async fn create(&self, input: CreateBillingInput) -> ServiceResult<BillingTransaction> {
        require_non_negative("Amount", input.amount_cents)?;
        require("Currency", &input.currency)?;

        let transaction = self.repo.create(&BillingTransaction::from_input(input)).await?;
        tracing::info!(
            transaction_id = transaction.id,
            user_id = transaction.user_id,
            status = %transaction.status,
            "Billing transaction recorded"
        );
        Ok(transaction)
    }

    pub async fn update(&self, id: i64, input: UpdateBillingInput) -> ServiceResult<BillingTransaction> {
        if let Some(amount) = input.amount_cents {
            require_non_negative("Amount", amount)?;
        }
        if let Some(currency) = &input.currency {
            require("Currency", currency)?;
        }

        let mut transaction = self.get(id).await?;
        transaction.apply(input);
        Ok(self.repo.update(&transaction).await?)
    }

    pub async fn delete(&self, id: i64) -> ServiceResult<()> {
        if !self.repo.delete(id).await? {
            return Err(ServiceError::NotFound("Transaction"));
        }
        Ok(())
    }

    pub async fn summary(&self) -> ServiceResult<BillingSummary> {
        let statuses = self.repo.totals_by_status().await?;
        let active_subscribers = self
            .users
            .active_subscribers_by_plan()
            .await?
            .into_iter()
            .map(|(plan, count)| PlanSubscribers { plan, count })
            .collect();
        let paid_cents = statuses
            .iter()
            .filter(|total| total.status == BillingStatus::Paid)
            .map(|total| total.amount_cents)
            .sum();

        Ok(BillingSummary {
            statuses,
            active_subscribers,
            paid_cents,
        })
    }
}
