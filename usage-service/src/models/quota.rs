//! Per-period usage quota models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

/// Quota-counted operation type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UsageType {
    Listing,
    Video,
}

impl UsageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UsageType::Listing => "listing",
            UsageType::Video => "video",
        }
    }
}

impl FromStr for UsageType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "listing" => Ok(UsageType::Listing),
            "video" => Ok(UsageType::Video),
            other => Err(format!("Unknown usage type: {}", other)),
        }
    }
}

/// One row per (user, calendar-month period). Counters only ever move upward
/// within a period; rollover starts a fresh row and the old one becomes
/// read-only history.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UsageQuota {
    pub user_id: Uuid,
    pub plan_id: String,
    pub period: String,
    pub listings_used: i32,
    pub videos_used: i32,
    pub last_reset: DateTime<Utc>,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

impl UsageQuota {
    pub fn used(&self, usage_type: UsageType) -> i32 {
        match usage_type {
            UsageType::Listing => self.listings_used,
            UsageType::Video => self.videos_used,
        }
    }
}

/// Result of an allow/deny quota check. `limit == -1` marks an unlimited
/// plan; `remaining` is then also -1 and must not be read numerically.
#[derive(Debug, Clone, Serialize)]
pub struct QuotaCheck {
    pub allowed: bool,
    pub remaining: i32,
    pub limit: i32,
    pub plan_name: String,
}

/// Body for quota increment calls.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct IncrementQuotaRequest {
    #[serde(default = "default_amount")]
    #[validate(range(min = 1))]
    pub amount: i32,
}

fn default_amount() -> i32 {
    1
}
