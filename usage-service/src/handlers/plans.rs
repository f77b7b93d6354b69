use crate::startup::AppState;
use axum::{extract::State, response::IntoResponse, Json};

pub async fn list_plans(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.catalog.all().to_vec())
}
