//! HTTP API for exposing sweep metrics.

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
};
use patisserie_sweep::SweepMetrics;
use serde_json::json;

/// API state containing the sweep counters.
#[derive(Debug, Clone)]
pub struct ApiState {
    metrics: SweepMetrics,
}

impl ApiState {
    /// Creates new API state.
    pub fn new(metrics: SweepMetrics) -> Self {
        Self { metrics }
    }
}

/// Creates the metrics API router.
pub fn create_router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(get_metrics))
        .with_state(state)
}

async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({"status": "ok"})))
}

/// Current metrics snapshot.
async fn get_metrics(State(state): State<ApiState>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.metrics.snapshot()))
}
