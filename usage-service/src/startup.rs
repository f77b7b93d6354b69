//! Application startup and lifecycle management.

use crate::config::UsageConfig;
use crate::handlers;
use crate::models::PlanCatalog;
use crate::pricing::PricingTable;
use crate::services::{
    get_metrics, init_metrics, Database, PlanRecommender, QuotaTracker, UsageLedger, UsageProjector,
};
use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use service_core::error::AppError;
use service_core::middleware::metrics::metrics_middleware;
use service_core::middleware::tracing::request_id_middleware;
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: UsageConfig,
    pub db: Arc<Database>,
    pub catalog: Arc<PlanCatalog>,
    pub ledger: Arc<UsageLedger>,
    pub quota: Arc<QuotaTracker>,
    pub projector: Arc<UsageProjector>,
    pub recommender: Arc<PlanRecommender>,
}

/// Health check endpoint for Docker/K8s liveness probes.
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    match state.db.health_check().await {
        Ok(_) => {
            tracing::debug!("Health check passed");
            (
                StatusCode::OK,
                Json(json!({
                    "status": "ok",
                    "service": "usage-service",
                    "version": env!("CARGO_PKG_VERSION")
                })),
            )
        }
        Err(e) => {
            tracing::warn!(error = %e, "Health check failed - database unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "unhealthy",
                    "service": "usage-service",
                    "error": e.to_string()
                })),
            )
        }
    }
}

/// Readiness check endpoint for K8s readiness probes.
async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    match state.db.health_check().await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

/// Metrics endpoint for Prometheus scraping.
async fn metrics_handler() -> impl IntoResponse {
    let metrics = get_metrics();
    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        metrics,
    )
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    server: Box<dyn std::future::Future<Output = std::io::Result<()>> + Send + Unpin>,
    state: AppState,
}

impl Application {
    /// Build the application with the given configuration.
    pub async fn build(config: UsageConfig) -> Result<Self, AppError> {
        Self::build_internal(config, true).await
    }

    /// Build the application without running migrations.
    /// Use this in tests when migrations are already applied by the test harness.
    pub async fn build_without_migrations(config: UsageConfig) -> Result<Self, AppError> {
        Self::build_internal(config, false).await
    }

    async fn build_internal(config: UsageConfig, run_migrations: bool) -> Result<Self, AppError> {
        init_metrics();

        let db = Database::new(
            &config.database.url,
            config.database.max_connections,
            config.database.min_connections,
        )
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to connect to PostgreSQL");
            e
        })?;

        if run_migrations {
            db.run_migrations().await.map_err(|e| {
                tracing::error!(error = %e, "Failed to run migrations");
                e
            })?;
        }

        let db = Arc::new(db);
        let catalog = Arc::new(PlanCatalog::builtin());
        let pricing = Arc::new(PricingTable::current());

        let ledger = Arc::new(UsageLedger::new(
            db.clone(),
            pricing.clone(),
            config.daily_cost_alert_threshold,
        ));
        let quota = Arc::new(QuotaTracker::new(db.clone(), catalog.clone()));
        let projector = Arc::new(UsageProjector::new(db.clone()));
        let recommender = Arc::new(PlanRecommender::new(catalog.clone()));

        let state = AppState {
            config: config.clone(),
            db,
            catalog,
            ledger,
            quota,
            projector,
            recommender,
        };

        let app = Router::new()
            .route("/health", get(health_check))
            .route("/ready", get(readiness_check))
            .route("/metrics", get(metrics_handler))
            .route(
                "/usage",
                post(handlers::record_usage).get(handlers::query_usage),
            )
            .route("/usage/daily/:date", get(handlers::daily_usage))
            .route("/quota/:user_id/:usage_type", get(handlers::check_quota))
            .route(
                "/quota/:user_id/:usage_type/increment",
                post(handlers::increment_quota),
            )
            .route("/recommendations/:user_id", get(handlers::get_recommendations))
            .route("/plans", get(handlers::list_plans))
            .route("/subscriptions/trial", post(handlers::start_trial))
            .layer(TraceLayer::new_for_http())
            .layer(middleware::from_fn(metrics_middleware))
            .layer(middleware::from_fn(request_id_middleware))
            .with_state(state.clone());

        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!(error = %e, addr = %addr, "Failed to bind TCP listener");
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!(port = port, "Usage service listener bound");

        let server = axum::serve(listener, app);

        Ok(Self {
            port,
            server: Box::new(server.into_future()),
            state,
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Get a reference to the database.
    pub fn db(&self) -> &Database {
        &self.state.db
    }

    /// Run the application until stopped.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.server.await
    }
}
