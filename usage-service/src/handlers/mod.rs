pub mod plans;
pub mod quota;
pub mod recommendations;
pub mod subscriptions;
pub mod usage;

pub use plans::list_plans;
pub use quota::{check_quota, increment_quota};
pub use recommendations::get_recommendations;
pub use subscriptions::start_trial;
pub use usage::{daily_usage, query_usage, record_usage};
