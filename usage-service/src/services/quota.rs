//! Per-period quota enforcement.

use crate::models::{Plan, PlanCatalog, QuotaCheck, UsageQuota, UsageType, UNLIMITED};
use crate::services::metrics::{record_quota_check, record_quota_increment};
use crate::services::Database;
use chrono::{DateTime, Datelike, Utc};
use service_core::error::AppError;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Calendar-month period identifier, `YYYY-MM`.
pub fn current_period(now: DateTime<Utc>) -> String {
    format!("{:04}-{:02}", now.year(), now.month())
}

/// Tracks and enforces per-period allowances.
///
/// Unlike the ledger-append path, every persistence failure here fails
/// closed: silently admitting unlimited usage during a store outage is the
/// worse failure mode.
pub struct QuotaTracker {
    db: Arc<Database>,
    catalog: Arc<PlanCatalog>,
}

impl QuotaTracker {
    pub fn new(db: Arc<Database>, catalog: Arc<PlanCatalog>) -> Self {
        QuotaTracker { db, catalog }
    }

    /// Resolve the plan governing a user's quota. Users without a
    /// subscription row are on the free tier; a subscription pointing at a
    /// plan missing from the catalog is a configuration error, never a
    /// silent downgrade.
    pub async fn resolve_plan(&self, user_id: Uuid) -> Result<Plan, AppError> {
        match self.db.get_subscription(user_id).await? {
            Some(sub) => self.catalog.get(&sub.plan_id).cloned().ok_or_else(|| {
                AppError::ConfigError(anyhow::anyhow!(
                    "Subscribed plan '{}' is not in the catalog",
                    sub.plan_id
                ))
            }),
            None => Ok(self.catalog.free()?.clone()),
        }
    }

    /// Allow/deny check against the current period's counters.
    #[instrument(skip(self), fields(user_id = %user_id, usage_type = %usage_type.as_str()))]
    pub async fn check_limit(
        &self,
        user_id: Uuid,
        usage_type: UsageType,
    ) -> Result<QuotaCheck, AppError> {
        let plan = self.resolve_plan(user_id).await?;
        let limit = plan.allowance(usage_type);

        if limit == UNLIMITED {
            record_quota_check(usage_type.as_str(), true);
            return Ok(QuotaCheck {
                allowed: true,
                remaining: UNLIMITED,
                limit: UNLIMITED,
                plan_name: plan.name,
            });
        }

        let period = current_period(Utc::now());
        let used = self
            .db
            .get_quota(user_id, &period)
            .await?
            .map(|q| q.used(usage_type))
            .unwrap_or(0);

        let remaining = (limit - used).max(0);
        let allowed = remaining > 0;
        record_quota_check(usage_type.as_str(), allowed);

        Ok(QuotaCheck {
            allowed,
            remaining,
            limit,
            plan_name: plan.name,
        })
    }

    /// Add to the current period's counter. Callers invoke this only after
    /// the billed operation has been confirmed successful; the storage-level
    /// upsert keeps concurrent increments lossless.
    #[instrument(skip(self), fields(user_id = %user_id, usage_type = %usage_type.as_str(), amount = amount))]
    pub async fn increment(
        &self,
        user_id: Uuid,
        usage_type: UsageType,
        amount: i32,
    ) -> Result<UsageQuota, AppError> {
        if amount < 1 {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Increment amount must be at least 1 (got {})",
                amount
            )));
        }

        let plan = self.resolve_plan(user_id).await?;
        let period = current_period(Utc::now());
        let (listings_delta, videos_delta) = match usage_type {
            UsageType::Listing => (amount, 0),
            UsageType::Video => (0, amount),
        };

        let quota = self
            .db
            .increment_quota(user_id, &plan.id, &period, listings_delta, videos_delta)
            .await?;

        record_quota_increment(usage_type.as_str());
        info!(
            period = %quota.period,
            listings_used = quota.listings_used,
            videos_used = quota.videos_used,
            "Quota incremented"
        );

        Ok(quota)
    }
}
