use crate::models::{IncrementQuotaRequest, UsageType};
use crate::startup::AppState;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

fn parse_usage_type(raw: &str) -> Result<UsageType, AppError> {
    UsageType::from_str(raw).map_err(|e| AppError::BadRequest(anyhow::anyhow!(e)))
}

pub async fn check_quota(
    State(state): State<AppState>,
    Path((user_id, usage_type)): Path<(Uuid, String)>,
) -> Result<impl IntoResponse, AppError> {
    let usage_type = parse_usage_type(&usage_type)?;
    let check = state.quota.check_limit(user_id, usage_type).await?;
    Ok(Json(check))
}

pub async fn increment_quota(
    State(state): State<AppState>,
    Path((user_id, usage_type)): Path<(Uuid, String)>,
    Json(request): Json<IncrementQuotaRequest>,
) -> Result<impl IntoResponse, AppError> {
    request.validate()?;
    let usage_type = parse_usage_type(&usage_type)?;
    let quota = state
        .quota
        .increment(user_id, usage_type, request.amount)
        .await?;
    Ok(Json(quota))
}
