//! Plan recommendation models (derived, never persisted).

use crate::models::{Plan, UsageProjection};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

/// How urgently the user should act on the recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Low,
    Medium,
    High,
}

/// Cost-minimizing plan choice with a human-readable justification.
#[derive(Debug, Clone, Serialize)]
pub struct PlanRecommendation {
    pub current_plan: Plan,
    pub recommended_plan: Plan,
    /// Diagnostic figure: most expensive alternative minus recommended cost.
    pub potential_savings: Decimal,
    pub urgency: Urgency,
    pub reason: String,
    pub benefits: Vec<String>,
}

/// Endpoint payload. When the subscription or catalog cannot be resolved the
/// response is explicitly unavailable; a plan is never guessed.
#[derive(Debug, Clone, Serialize)]
pub struct RecommendationResponse {
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage_projection: Option<UsageProjection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan_recommendation: Option<PlanRecommendation>,
    pub generated_at: DateTime<Utc>,
}

impl RecommendationResponse {
    pub fn unavailable() -> Self {
        RecommendationResponse {
            available: false,
            usage_projection: None,
            plan_recommendation: None,
            generated_at: Utc::now(),
        }
    }
}
