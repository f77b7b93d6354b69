//! Domain models for usage-service.

mod plan;
mod projection;
mod quota;
mod recommendation;
mod subscription;
mod usage;

pub use plan::{ModelTier, Plan, PlanCatalog, UNLIMITED};
pub use projection::{CurrentPeriodUsage, ProjectedUsage, RiskLevel, UsageProjection};
pub use quota::{IncrementQuotaRequest, QuotaCheck, UsageQuota, UsageType};
pub use recommendation::{PlanRecommendation, RecommendationResponse, Urgency};
pub use subscription::{CreateTrialRequest, SubscriptionStatus, UserSubscription};
pub use usage::{
    DailyUsage, NewUsageRecord, RecordUsageRequest, RecordUsageResponse, ServiceKind,
    UsageBreakdownRow, UsagePage, UsageRangeFilter, UsageRecord,
};
