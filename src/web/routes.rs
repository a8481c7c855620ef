//! # Web API Route Definitions

use crate::web::handlers;
use crate::web::state::AppState;
use axum::routing::{get, post};
use axum::Router;

/// Provider-facing and operator-facing call routes:
/// - `POST /calls/start_batch` - dial the first pending contact
/// - `POST /calls/start_prompt` - dial a number found in free text
/// - `POST /calls/status` - provider status callback, always acknowledged
/// - `GET|POST /calls/twiml` - voice prompt served to the provider
pub fn call_routes() -> Router<AppState> {
    Router::new()
        .route("/calls/start_batch", post(handlers::calls::start_batch))
        .route("/calls/start_prompt", post(handlers::calls::start_prompt))
        .route("/calls/status", post(handlers::calls::status_callback))
        .route(
            "/calls/twiml",
            get(handlers::calls::voice_prompt).post(handlers::calls::voice_prompt),
        )
}

/// Read-only snapshots for dashboards.
pub fn snapshot_routes() -> Router<AppState> {
    Router::new()
        .route("/contacts", get(handlers::contacts::list_contacts))
        .route("/call_logs", get(handlers::contacts::recent_call_logs))
}

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health::health))
}
