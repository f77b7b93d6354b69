//! Cost-minimizing plan recommendation.

use crate::models::{
    Plan, PlanCatalog, PlanRecommendation, ProjectedUsage, UsageProjection, Urgency, UNLIMITED,
};
use rust_decimal::Decimal;
use std::sync::Arc;

/// Overage rates charged when projected usage exceeds a plan's allowance.
pub const LISTING_OVERAGE_RATE: Decimal = Decimal::from_parts(50, 0, 0, false, 2);
pub const VIDEO_OVERAGE_RATE: Decimal = Decimal::from_parts(2, 0, 0, false, 0);

/// Below this monthly saving a plan switch is not worth suggesting.
const SAVINGS_SUGGESTION_FLOOR: Decimal = Decimal::from_parts(10, 0, 0, false, 0);

const MEDIUM_URGENCY_WINDOW_DAYS: i64 = 7;

/// Hypothetical monthly cost of running the projected volume on a plan:
/// base price plus per-unit overage on any projected excess.
pub fn hypothetical_monthly_cost(plan: &Plan, projected: &ProjectedUsage) -> Decimal {
    let mut cost = plan.price;

    if plan.listings_per_month != UNLIMITED {
        let excess = (projected.listings - plan.listings_per_month as i64).max(0);
        cost += Decimal::from(excess) * LISTING_OVERAGE_RATE;
    }
    if plan.videos_per_month != UNLIMITED {
        let excess = (projected.videos - plan.videos_per_month as i64).max(0);
        cost += Decimal::from(excess) * VIDEO_OVERAGE_RATE;
    }

    cost
}

pub struct PlanRecommender {
    catalog: Arc<PlanCatalog>,
}

impl PlanRecommender {
    pub fn new(catalog: Arc<PlanCatalog>) -> Self {
        PlanRecommender { catalog }
    }

    /// Pick the plan with the lowest hypothetical monthly cost for the
    /// projected volume. Ties break toward the plan whose base price is
    /// closest to the current plan's, which keeps repeated evaluations of
    /// stable usage from oscillating between equal-cost plans.
    pub fn recommend(&self, current: &Plan, projection: &UsageProjection) -> PlanRecommendation {
        let projected = &projection.projected_monthly_usage;

        let mut costs: Vec<(&Plan, Decimal)> = self
            .catalog
            .all()
            .iter()
            .map(|p| (p, hypothetical_monthly_cost(p, projected)))
            .collect();
        costs.sort_by_key(|(p, cost)| (*cost, (p.price - current.price).abs()));

        // new() guarantees a non-empty catalog.
        let (recommended, recommended_cost) = costs
            .first()
            .map(|(p, c)| ((*p).clone(), *c))
            .unwrap_or_else(|| (current.clone(), current.price));
        let worst_cost = costs
            .iter()
            .map(|(_, c)| *c)
            .max()
            .unwrap_or(recommended_cost);
        let potential_savings = worst_cost - recommended_cost;

        let (urgency, reason, benefits) = self.explain(current, &recommended, projection, potential_savings);

        PlanRecommendation {
            current_plan: current.clone(),
            recommended_plan: recommended,
            potential_savings,
            urgency,
            reason,
            benefits,
        }
    }

    fn explain(
        &self,
        current: &Plan,
        recommended: &Plan,
        projection: &UsageProjection,
        potential_savings: Decimal,
    ) -> (Urgency, String, Vec<String>) {
        let imminent = projection
            .days_until_limit
            .map(|d| d <= MEDIUM_URGENCY_WINDOW_DAYS)
            .unwrap_or(false);

        if projection.will_exceed_limit && imminent {
            let days = projection.days_until_limit.unwrap_or(0);
            return (
                Urgency::High,
                format!(
                    "You're likely to exceed your {} plan limits within {} days",
                    current.name, days
                ),
                vec![
                    "Avoid service interruptions".to_string(),
                    format!("Get {} more features", recommended.name),
                    "Better value for your usage level".to_string(),
                ],
            );
        }

        if projection.will_exceed_limit {
            return (
                Urgency::Medium,
                format!(
                    "Your projected usage ({} listings, {} videos) exceeds your current plan limits",
                    projection.projected_monthly_usage.listings,
                    projection.projected_monthly_usage.videos
                ),
                vec![
                    "Room to grow without interruptions".to_string(),
                    "Better cost efficiency at your volume".to_string(),
                ],
            );
        }

        if recommended.id != current.id && potential_savings > SAVINGS_SUGGESTION_FLOOR {
            return (
                Urgency::Low,
                format!(
                    "You could save ${}/month with the {} plan",
                    potential_savings.round_dp(2),
                    recommended.name
                ),
                vec![
                    format!("Save ${}/month", potential_savings.round_dp(2)),
                    "Keep all the features you use".to_string(),
                ],
            );
        }

        (
            Urgency::Low,
            "Your current plan fits your usage well".to_string(),
            vec!["Current plan is well-suited for your needs".to_string()],
        )
    }
}
