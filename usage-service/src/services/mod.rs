pub mod database;
pub mod ledger;
pub mod metrics;
pub mod projector;
pub mod quota;
pub mod recommender;

pub use database::Database;
pub use metrics::{get_metrics, init_metrics};
pub use ledger::UsageLedger;
pub use projector::UsageProjector;
pub use quota::QuotaTracker;
pub use recommender::PlanRecommender;
