//! Subscription plan catalog.
//!
//! Plans are static configuration loaded once at process start; they are not
//! user-mutable and have no database representation.

use crate::models::UsageType;
use rust_decimal::Decimal;
use serde::Serialize;
use service_core::error::AppError;

/// Reserved sentinel for "no monthly limit".
pub const UNLIMITED: i32 = -1;

/// Text-generation model tier granted by a plan, ordered by cost/quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelTier {
    Lite,
    Standard,
    Premium,
}

impl ModelTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelTier::Lite => "lite",
            ModelTier::Standard => "standard",
            ModelTier::Premium => "premium",
        }
    }
}

/// A subscription plan: monthly price, per-type allowances, capability flags,
/// and resource limits.
#[derive(Debug, Clone, Serialize)]
pub struct Plan {
    pub id: String,
    pub name: String,
    pub price: Decimal,
    pub listings_per_month: i32,
    pub videos_per_month: i32,
    pub model_tier: ModelTier,
    pub advanced_features: bool,
    pub priority_support: bool,
    pub api_access: bool,
    pub max_image_size_mb: i32,
    pub max_concurrent_jobs: i32,
    pub retention_days: i32,
}

impl Plan {
    /// Monthly allowance for a usage type; `UNLIMITED` means no limit.
    pub fn allowance(&self, usage_type: UsageType) -> i32 {
        match usage_type {
            UsageType::Listing => self.listings_per_month,
            UsageType::Video => self.videos_per_month,
        }
    }

    pub fn is_unlimited(&self, usage_type: UsageType) -> bool {
        self.allowance(usage_type) == UNLIMITED
    }
}

/// Process-wide immutable plan catalog.
#[derive(Debug, Clone)]
pub struct PlanCatalog {
    plans: Vec<Plan>,
}

impl PlanCatalog {
    pub const FREE_PLAN_ID: &'static str = "free";

    /// The built-in catalog.
    pub fn builtin() -> Self {
        PlanCatalog {
            plans: vec![
                Plan {
                    id: "free".to_string(),
                    name: "Free".to_string(),
                    price: Decimal::ZERO,
                    listings_per_month: 5,
                    videos_per_month: 2,
                    model_tier: ModelTier::Lite,
                    advanced_features: false,
                    priority_support: false,
                    api_access: false,
                    max_image_size_mb: 5,
                    max_concurrent_jobs: 1,
                    retention_days: 30,
                },
                Plan {
                    id: "starter".to_string(),
                    name: "Starter".to_string(),
                    price: Decimal::from(29),
                    listings_per_month: 50,
                    videos_per_month: 10,
                    model_tier: ModelTier::Standard,
                    advanced_features: false,
                    priority_support: false,
                    api_access: false,
                    max_image_size_mb: 10,
                    max_concurrent_jobs: 2,
                    retention_days: 90,
                },
                Plan {
                    id: "pro".to_string(),
                    name: "Pro".to_string(),
                    price: Decimal::from(79),
                    listings_per_month: UNLIMITED,
                    videos_per_month: UNLIMITED,
                    model_tier: ModelTier::Standard,
                    advanced_features: true,
                    priority_support: true,
                    api_access: false,
                    max_image_size_mb: 20,
                    max_concurrent_jobs: 5,
                    retention_days: 365,
                },
                Plan {
                    id: "enterprise".to_string(),
                    name: "Enterprise".to_string(),
                    price: Decimal::from(199),
                    listings_per_month: UNLIMITED,
                    videos_per_month: UNLIMITED,
                    model_tier: ModelTier::Premium,
                    advanced_features: true,
                    priority_support: true,
                    api_access: true,
                    max_image_size_mb: 50,
                    max_concurrent_jobs: 10,
                    retention_days: 365,
                },
            ],
        }
    }

    /// Build a catalog from an explicit plan list. Fails if the list is empty
    /// or the free tier is missing, since quota resolution depends on it.
    pub fn new(plans: Vec<Plan>) -> Result<Self, AppError> {
        if plans.is_empty() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "Plan catalog must not be empty"
            )));
        }
        if !plans.iter().any(|p| p.id == Self::FREE_PLAN_ID) {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "Plan catalog must include the '{}' plan",
                Self::FREE_PLAN_ID
            )));
        }
        Ok(PlanCatalog { plans })
    }

    pub fn get(&self, plan_id: &str) -> Option<&Plan> {
        self.plans.iter().find(|p| p.id == plan_id)
    }

    /// The free tier. The builtin catalog and `new` both guarantee presence.
    pub fn free(&self) -> Result<&Plan, AppError> {
        self.get(Self::FREE_PLAN_ID).ok_or_else(|| {
            AppError::ConfigError(anyhow::anyhow!("Plan catalog is missing the free tier"))
        })
    }

    pub fn all(&self) -> &[Plan] {
        &self.plans
    }
}
