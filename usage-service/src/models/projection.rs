//! Usage projection models (derived, never persisted).

use serde::Serialize;

/// Early-warning classification for quota exhaustion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// Counters consumed so far in the current calendar-month period.
#[derive(Debug, Clone, Serialize)]
pub struct CurrentPeriodUsage {
    pub listings: i64,
    pub videos: i64,
    pub days_elapsed: i64,
}

/// Full-period usage extrapolated from the trailing activity window.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectedUsage {
    pub listings: i64,
    pub videos: i64,
}

/// Forecast of full-period usage from a trailing activity window, used purely
/// for early warning, never for billing.
#[derive(Debug, Clone, Serialize)]
pub struct UsageProjection {
    pub current_usage: CurrentPeriodUsage,
    pub projected_monthly_usage: ProjectedUsage,
    pub risk_level: RiskLevel,
    /// None when there is no recent activity or the plan is unlimited.
    pub days_until_limit: Option<i64>,
    pub will_exceed_limit: bool,
}
