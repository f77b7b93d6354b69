//! Monthly usage projection from a trailing activity window.

use crate::models::{
    CurrentPeriodUsage, Plan, ProjectedUsage, RiskLevel, UsageProjection, UsageType, UNLIMITED,
};
use crate::services::quota::current_period;
use crate::services::Database;
use chrono::{Datelike, Duration, Months, NaiveDate, Utc};
use service_core::error::AppError;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

/// Length of the trailing activity window the projection extrapolates from.
pub const TRAILING_WINDOW_DAYS: i64 = 7;

const HIGH_RISK_DAYS: i64 = 3;
const MEDIUM_RISK_DAYS: i64 = 7;

/// Number of days in the calendar month containing `date`.
pub fn days_in_month(date: NaiveDate) -> i64 {
    let first = date.with_day(1).unwrap_or(date);
    let next = first + Months::new(1);
    (next - first).num_days()
}

/// Per-usage-type projection outcome, folded into the overall result.
struct TypeOutlook {
    projected: i64,
    will_exceed: bool,
    days_until_limit: Option<i64>,
}

fn project_type(allowance: i32, used: i64, window_count: i64, month_days: i64) -> TypeOutlook {
    let rate = window_count as f64 / TRAILING_WINDOW_DAYS as f64;
    let projected = (rate * month_days as f64).ceil() as i64;

    if allowance == UNLIMITED {
        return TypeOutlook {
            projected,
            will_exceed: false,
            days_until_limit: None,
        };
    }

    let will_exceed = projected > allowance as i64;
    let days_until_limit = if rate > 0.0 {
        let remaining = (allowance as i64 - used).max(0);
        Some((remaining as f64 / rate).floor() as i64)
    } else {
        None
    };

    TypeOutlook {
        projected,
        will_exceed,
        days_until_limit,
    }
}

fn risk_for(days: Option<i64>) -> RiskLevel {
    match days {
        Some(d) if d <= HIGH_RISK_DAYS => RiskLevel::High,
        Some(d) if d <= MEDIUM_RISK_DAYS => RiskLevel::Medium,
        _ => RiskLevel::Low,
    }
}

/// Extrapolate a full month of usage for a plan from current-period counters
/// and a trailing-window activity sample. Pure; `today` is injected so that
/// month-boundary behavior is testable.
pub fn project(
    plan: &Plan,
    listings_used: i64,
    videos_used: i64,
    window_listings: i64,
    window_videos: i64,
    today: NaiveDate,
) -> UsageProjection {
    let month_days = days_in_month(today);

    let listings = project_type(
        plan.listings_per_month,
        listings_used,
        window_listings,
        month_days,
    );
    let videos = project_type(plan.videos_per_month, videos_used, window_videos, month_days);

    let will_exceed_limit = listings.will_exceed || videos.will_exceed;

    // The countdown and the exceed flag answer different questions. Someone
    // who burned most of an allowance early but slowed down lately can be a
    // day from the limit while the extrapolated month stays inside it, so
    // the countdown is never gated on the exceed flag.
    let days_until_limit = [listings.days_until_limit, videos.days_until_limit]
        .into_iter()
        .flatten()
        .min();

    let risk_level =
        risk_for(listings.days_until_limit).max(risk_for(videos.days_until_limit));

    UsageProjection {
        current_usage: CurrentPeriodUsage {
            listings: listings_used,
            videos: videos_used,
            days_elapsed: today.day() as i64,
        },
        projected_monthly_usage: ProjectedUsage {
            listings: listings.projected,
            videos: videos.projected,
        },
        risk_level,
        days_until_limit,
        will_exceed_limit,
    }
}

/// Loads the counters a projection needs and runs it.
pub struct UsageProjector {
    db: Arc<Database>,
}

impl UsageProjector {
    pub fn new(db: Arc<Database>) -> Self {
        UsageProjector { db }
    }

    #[instrument(skip(self, plan), fields(user_id = %user_id, plan_id = %plan.id))]
    pub async fn project_for_user(
        &self,
        user_id: Uuid,
        plan: &Plan,
    ) -> Result<UsageProjection, AppError> {
        let now = Utc::now();
        let period = current_period(now);

        let quota = self.db.get_quota(user_id, &period).await?;
        let (listings_used, videos_used) = quota
            .map(|q| {
                (
                    q.used(UsageType::Listing) as i64,
                    q.used(UsageType::Video) as i64,
                )
            })
            .unwrap_or((0, 0));

        let window_start = now - Duration::days(TRAILING_WINDOW_DAYS);
        let (window_listings, window_videos) =
            self.db.recent_usage_counts(user_id, window_start).await?;

        Ok(project(
            plan,
            listings_used,
            videos_used,
            window_listings,
            window_videos,
            now.date_naive(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PlanCatalog;

    fn plan(id: &str) -> Plan {
        PlanCatalog::builtin().get(id).unwrap().clone()
    }

    fn june(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, day).unwrap()
    }

    #[test]
    fn month_lengths() {
        assert_eq!(days_in_month(NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()), 30);
        assert_eq!(days_in_month(NaiveDate::from_ymd_opt(2025, 7, 1).unwrap()), 31);
        assert_eq!(days_in_month(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()), 29);
        assert_eq!(days_in_month(NaiveDate::from_ymd_opt(2025, 2, 1).unwrap()), 28);
    }

    #[test]
    fn heavy_starter_usage_is_high_risk() {
        // 45 of 50 listings used, 12 listings in the trailing week of a
        // 30-day month: rate 12/7, projected ceil(51.43) = 52, and the 5
        // remaining listings last floor(5 / (12/7)) = 2 more days.
        let projection = project(&plan("starter"), 45, 0, 12, 0, june(20));

        assert_eq!(projection.projected_monthly_usage.listings, 52);
        assert!(projection.will_exceed_limit);
        assert_eq!(projection.days_until_limit, Some(2));
        assert_eq!(projection.risk_level, RiskLevel::High);
    }

    #[test]
    fn moderate_pace_is_medium_risk() {
        // 40 of 50 used, 14 in the window: rate 2/day, projected 60,
        // 10 remaining lasts 5 days.
        let projection = project(&plan("starter"), 40, 0, 14, 0, june(20));

        assert_eq!(projection.days_until_limit, Some(5));
        assert_eq!(projection.risk_level, RiskLevel::Medium);
    }

    #[test]
    fn zero_window_activity_projects_zero() {
        let projection = project(&plan("free"), 3, 1, 0, 0, june(10));

        assert_eq!(projection.projected_monthly_usage.listings, 0);
        assert_eq!(projection.projected_monthly_usage.videos, 0);
        assert!(!projection.will_exceed_limit);
        assert_eq!(projection.days_until_limit, None);
        assert_eq!(projection.risk_level, RiskLevel::Low);
    }

    #[test]
    fn unlimited_plan_never_exceeds() {
        // Pro listings are unlimited; even 700 in a week projects no breach.
        let projection = project(&plan("pro"), 3000, 0, 700, 0, june(15));

        assert_eq!(projection.projected_monthly_usage.listings, 3000);
        assert!(!projection.will_exceed_limit);
        assert_eq!(projection.days_until_limit, None);
        assert_eq!(projection.risk_level, RiskLevel::Low);
    }

    #[test]
    fn exhausted_quota_counts_down_to_zero_days() {
        // Already at the limit with ongoing activity: zero days left.
        let projection = project(&plan("free"), 5, 0, 7, 0, june(10));

        assert!(projection.will_exceed_limit);
        assert_eq!(projection.days_until_limit, Some(0));
        assert_eq!(projection.risk_level, RiskLevel::High);
    }

    #[test]
    fn early_burn_with_a_modest_recent_rate_still_counts_down() {
        // 49 of 50 used but only 4 in the trailing week: the extrapolated
        // month (18) stays inside the allowance, yet the one remaining
        // listing lasts floor(1 / (4/7)) = 1 day. The countdown and risk
        // must say so even though the exceed flag stays off.
        let projection = project(&plan("starter"), 49, 0, 4, 0, june(20));

        assert!(!projection.will_exceed_limit);
        assert_eq!(projection.projected_monthly_usage.listings, 18);
        assert_eq!(projection.days_until_limit, Some(1));
        assert_eq!(projection.risk_level, RiskLevel::High);
    }

    #[test]
    fn worst_type_drives_the_risk_level() {
        // Listings are comfortably inside the allowance but videos are not.
        let projection = project(&plan("starter"), 5, 9, 2, 7, june(20));

        assert!(projection.will_exceed_limit);
        assert_eq!(projection.days_until_limit, Some(1));
        assert_eq!(projection.risk_level, RiskLevel::High);
    }

    #[test]
    fn video_projection_uses_video_allowance() {
        // Free allows 2 videos; 3 in the window projects ceil(3/7*30)=13.
        let projection = project(&plan("free"), 0, 1, 0, 3, june(10));

        assert_eq!(projection.projected_monthly_usage.videos, 13);
        assert!(projection.will_exceed_limit);
    }
}
