//! # Health Check Handler

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use tracing::error;

use crate::web::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub store: String,
    pub queue_depth: Option<usize>,
    pub environment: String,
    pub timestamp: String,
}

/// GET /health
///
/// `200` when the store answers, `503` otherwise.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let store_healthy = match state.store.health_check().await {
        Ok(healthy) => healthy,
        Err(e) => {
            error!(error = %e, "Store health check failed");
            false
        }
    };
    let queue_depth = state.queue.len().await.ok();

    let (status_code, status) = if store_healthy {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
    };

    (
        status_code,
        Json(HealthResponse {
            status: status.to_string(),
            store: if store_healthy { "healthy" } else { "unhealthy" }.to_string(),
            queue_depth,
            environment: state.environment.clone(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }),
    )
}
