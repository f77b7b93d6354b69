use crate::models::{RecordUsageRequest, ServiceKind, UsageRangeFilter};
use crate::startup::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use service_core::error::AppError;
use uuid::Uuid;
use validator::Validate;

/// Query parameters for ledger range reads.
#[derive(Debug, Deserialize)]
pub struct UsageRangeParams {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub user_id: Option<Uuid>,
    pub service: Option<ServiceKind>,
    pub success: Option<bool>,
    #[serde(default)]
    pub page_size: i32,
    pub cursor: Option<Uuid>,
}

pub async fn record_usage(
    State(state): State<AppState>,
    Json(request): Json<RecordUsageRequest>,
) -> Result<impl IntoResponse, AppError> {
    request.validate()?;
    let response = state.ledger.record(request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn query_usage(
    State(state): State<AppState>,
    Query(params): Query<UsageRangeParams>,
) -> Result<impl IntoResponse, AppError> {
    let filter = UsageRangeFilter {
        user_id: params.user_id,
        service: params.service,
        success: params.success,
        page_size: params.page_size,
        cursor: params.cursor,
    };
    let page = state
        .ledger
        .query_range(params.start, params.end, &filter)
        .await?;
    Ok(Json(page))
}

pub async fn daily_usage(
    State(state): State<AppState>,
    Path(date): Path<NaiveDate>,
) -> Result<impl IntoResponse, AppError> {
    let report = state.ledger.daily_total(date).await?;
    Ok(Json(report))
}
