use crate::models::{RecommendationResponse, Urgency};
use crate::services::metrics::record_recommendation;
use crate::startup::AppState;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use service_core::error::AppError;
use tracing::warn;
use uuid::Uuid;

fn urgency_label(urgency: Urgency) -> &'static str {
    match urgency {
        Urgency::Low => "low",
        Urgency::Medium => "medium",
        Urgency::High => "high",
    }
}

/// Serve a usage projection and plan recommendation.
///
/// A user without a resolvable subscription gets an explicitly unavailable
/// response rather than a recommendation computed against a guessed plan.
/// Store errors still surface as 500s; only missing data degrades.
pub async fn get_recommendations(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let plan = match state.db.get_subscription(user_id).await? {
        Some(sub) => match state.catalog.get(&sub.plan_id) {
            Some(plan) => plan.clone(),
            None => {
                warn!(
                    user_id = %user_id,
                    plan_id = %sub.plan_id,
                    "Subscription references an unknown plan; recommendation unavailable"
                );
                record_recommendation("unavailable");
                return Ok(Json(RecommendationResponse::unavailable()));
            }
        },
        None => {
            record_recommendation("unavailable");
            return Ok(Json(RecommendationResponse::unavailable()));
        }
    };

    let projection = state.projector.project_for_user(user_id, &plan).await?;
    let recommendation = state.recommender.recommend(&plan, &projection);
    record_recommendation(urgency_label(recommendation.urgency));

    Ok(Json(RecommendationResponse {
        available: true,
        usage_projection: Some(projection),
        plan_recommendation: Some(recommendation),
        generated_at: Utc::now(),
    }))
}
