use crate::models::CreateTrialRequest;
use crate::startup::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::{Duration, Utc};
use service_core::error::AppError;
use validator::Validate;

const TRIAL_DAYS: i64 = 14;

pub async fn start_trial(
    State(state): State<AppState>,
    Json(request): Json<CreateTrialRequest>,
) -> Result<impl IntoResponse, AppError> {
    request.validate()?;

    if state.catalog.get(&request.plan_id).is_none() {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Unknown plan '{}'",
            request.plan_id
        )));
    }

    let now = Utc::now();
    let trial_end = now + Duration::days(TRIAL_DAYS);
    let subscription = state
        .db
        .upsert_trial_subscription(request.user_id, &request.plan_id, now, trial_end)
        .await?;

    Ok((StatusCode::CREATED, Json(subscription)))
}
