//! Usage ledger models.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Billed AI provider service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ServiceKind {
    TextGeneration,
    VisionLabeling,
}

impl ServiceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceKind::TextGeneration => "text-generation",
            ServiceKind::VisionLabeling => "vision-labeling",
        }
    }
}

/// A billed operation, immutable once written. The cost is computed from the
/// pricing table in force at write time and is never recomputed.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UsageRecord {
    pub record_id: Uuid,
    pub service: String,
    pub model: Option<String>,
    pub operation: String,
    pub input_units: Option<i32>,
    pub output_units: Option<i32>,
    pub image_count: Option<i32>,
    pub cost: Decimal,
    pub success: bool,
    pub error_type: Option<String>,
    pub user_id: Option<Uuid>,
    pub session_id: String,
    pub recorded_at: DateTime<Utc>,
    pub created_utc: DateTime<Utc>,
}

/// Caller-facing input for recording a billed operation.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RecordUsageRequest {
    pub service: ServiceKind,
    pub model: Option<String>,
    #[validate(length(min = 1, max = 128))]
    pub operation: String,
    #[validate(range(min = 0))]
    pub input_units: Option<i32>,
    #[validate(range(min = 0))]
    pub output_units: Option<i32>,
    pub image_count: Option<i32>,
    pub success: bool,
    pub error_type: Option<String>,
    pub user_id: Option<Uuid>,
    #[validate(length(min = 1, max = 128))]
    pub session_id: String,
    /// Defaults to "now" when omitted.
    pub recorded_at: Option<DateTime<Utc>>,
}

/// A priced record ready for the ledger insert.
#[derive(Debug, Clone)]
pub struct NewUsageRecord {
    pub service: ServiceKind,
    pub model: Option<String>,
    pub operation: String,
    pub input_units: Option<i32>,
    pub output_units: Option<i32>,
    pub image_count: Option<i32>,
    pub cost: Decimal,
    pub success: bool,
    pub error_type: Option<String>,
    pub user_id: Option<Uuid>,
    pub session_id: String,
    pub recorded_at: DateTime<Utc>,
}

/// Outcome of a record-usage call. A failed append does not fail the call:
/// the billed operation already happened, so the cost is still reported.
#[derive(Debug, Clone, Serialize)]
pub struct RecordUsageResponse {
    pub record_id: Option<Uuid>,
    pub persisted: bool,
    pub cost: Decimal,
    pub input_cost: Decimal,
    pub output_cost: Decimal,
    pub image_cost: Decimal,
}

/// Filter parameters for ledger range queries.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct UsageRangeFilter {
    pub user_id: Option<Uuid>,
    pub service: Option<ServiceKind>,
    pub success: Option<bool>,
    #[serde(default)]
    pub page_size: i32,
    /// Record id of the last row of the previous page.
    pub cursor: Option<Uuid>,
}

/// One page of ledger records. `next_cursor` is present when more rows match;
/// repeat the query with it to continue.
#[derive(Debug, Clone, Serialize)]
pub struct UsagePage {
    pub records: Vec<UsageRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<Uuid>,
}

/// Per-(service, model) slice of a daily report.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct UsageBreakdownRow {
    pub service: String,
    pub model: Option<String>,
    pub request_count: i64,
    pub total_cost: Decimal,
}

/// Daily cost report derived from the ledger; never mutates.
#[derive(Debug, Clone, Serialize)]
pub struct DailyUsage {
    pub date: NaiveDate,
    pub total_cost: Decimal,
    pub request_count: i64,
    pub success_rate: f64,
    pub breakdown: Vec<UsageBreakdownRow>,
    pub threshold_exceeded: bool,
}
