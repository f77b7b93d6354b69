//! Usage ledger service: prices billed operations and appends them to the
//! append-only ledger.

use crate::models::{
    DailyUsage, NewUsageRecord, RecordUsageRequest, RecordUsageResponse, ServiceKind, UsagePage,
    UsageRangeFilter,
};
use crate::pricing::{CostBreakdown, PricingTable};
use crate::services::metrics::{
    record_append_failure, record_cost, record_cost_alert, record_usage_record,
};
use crate::services::Database;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use service_core::error::AppError;
use std::sync::Arc;
use tracing::{instrument, warn};

pub struct UsageLedger {
    db: Arc<Database>,
    pricing: Arc<PricingTable>,
    cost_alert_threshold: Decimal,
}

impl UsageLedger {
    pub fn new(db: Arc<Database>, pricing: Arc<PricingTable>, cost_alert_threshold: Decimal) -> Self {
        UsageLedger {
            db,
            pricing,
            cost_alert_threshold,
        }
    }

    /// Price and append a billed operation.
    ///
    /// Validation and pricing failures abort before any write. A persistence
    /// failure after pricing is swallowed: the AI call this record describes
    /// has already completed, so losing a cost-log entry is preferable to
    /// failing the user-visible action.
    #[instrument(skip(self, request), fields(service = %request.service.as_str(), operation = %request.operation))]
    pub async fn record(&self, request: RecordUsageRequest) -> Result<RecordUsageResponse, AppError> {
        let cost = self.price(&request)?;

        let record = NewUsageRecord {
            service: request.service,
            model: request.model,
            operation: request.operation,
            input_units: request.input_units,
            output_units: request.output_units,
            image_count: request.image_count,
            cost: cost.total_cost,
            success: request.success,
            error_type: request.error_type,
            user_id: request.user_id,
            session_id: request.session_id,
            recorded_at: request.recorded_at.unwrap_or_else(Utc::now),
        };

        let service = record.service.as_str();
        let model = record.model.clone().unwrap_or_default();

        match self.db.insert_usage_record(&record).await {
            Ok(persisted) => {
                record_usage_record(service, "persisted");
                record_cost(service, &model, cost.total_cost.to_f64().unwrap_or(0.0));
                Ok(RecordUsageResponse {
                    record_id: Some(persisted.record_id),
                    persisted: true,
                    cost: cost.total_cost,
                    input_cost: cost.input_cost,
                    output_cost: cost.output_cost,
                    image_cost: cost.image_cost,
                })
            }
            Err(e) => {
                // The primary operation already succeeded; report the loss on
                // the secondary channel and move on.
                warn!(error = %e, service = service, "Failed to persist usage record; swallowing");
                record_append_failure(service);
                record_usage_record(service, "dropped");
                Ok(RecordUsageResponse {
                    record_id: None,
                    persisted: false,
                    cost: cost.total_cost,
                    input_cost: cost.input_cost,
                    output_cost: cost.output_cost,
                    image_cost: cost.image_cost,
                })
            }
        }
    }

    /// Compute the write-time cost for a request, enforcing the per-service
    /// unit exclusivity rules.
    fn price(&self, request: &RecordUsageRequest) -> Result<CostBreakdown, AppError> {
        match request.service {
            ServiceKind::TextGeneration => {
                if request.image_count.is_some() {
                    return Err(AppError::BadRequest(anyhow::anyhow!(
                        "image_count is not valid for text-generation records"
                    )));
                }
                let model = request.model.as_deref().ok_or_else(|| {
                    AppError::BadRequest(anyhow::anyhow!(
                        "model is required for text-generation records"
                    ))
                })?;
                let input = request.input_units.ok_or_else(|| {
                    AppError::BadRequest(anyhow::anyhow!(
                        "input_units is required for text-generation records"
                    ))
                })?;
                let output = request.output_units.ok_or_else(|| {
                    AppError::BadRequest(anyhow::anyhow!(
                        "output_units is required for text-generation records"
                    ))
                })?;
                self.pricing
                    .text_generation_cost(model, input as i64, output as i64)
            }
            ServiceKind::VisionLabeling => {
                if request.input_units.is_some() || request.output_units.is_some() {
                    return Err(AppError::BadRequest(anyhow::anyhow!(
                        "Token counts are not valid for vision-labeling records"
                    )));
                }
                let images = request.image_count.ok_or_else(|| {
                    AppError::BadRequest(anyhow::anyhow!(
                        "image_count is required for vision-labeling records"
                    ))
                })?;
                self.pricing.image_labeling_cost(images as i64)
            }
        }
    }

    /// One page of ledger records in `[start, end)`, oldest first.
    pub async fn query_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        filter: &UsageRangeFilter,
    ) -> Result<UsagePage, AppError> {
        if start >= end {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Range start must precede end"
            )));
        }
        self.db.list_usage_range(start, end, filter).await
    }

    /// Daily cost report. Pure read; raises the cost alert when the day's
    /// spend crosses the configured threshold.
    #[instrument(skip(self))]
    pub async fn daily_total(&self, date: NaiveDate) -> Result<DailyUsage, AppError> {
        let (total_cost, request_count, success_count) = self.db.daily_usage_totals(date).await?;
        let breakdown = self.db.daily_usage_breakdown(date).await?;

        let success_rate = if request_count > 0 {
            success_count as f64 / request_count as f64
        } else {
            0.0
        };

        let threshold_exceeded = total_cost > self.cost_alert_threshold;
        if threshold_exceeded {
            warn!(
                date = %date,
                total_cost = %total_cost,
                threshold = %self.cost_alert_threshold,
                "Daily cost threshold exceeded"
            );
            record_cost_alert(&date.to_string());
        }

        Ok(DailyUsage {
            date,
            total_cost,
            request_count,
            success_rate,
            breakdown,
            threshold_exceeded,
        })
    }
}
