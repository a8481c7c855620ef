//! # Web API Module
//!
//! Axum HTTP surface of the autodialer.
//!
//! - [`routes`] - route groups
//! - [`handlers`] - request handlers
//! - [`state`] - shared application state
//! - [`errors`] - API error type and its HTTP mapping

pub mod errors;
pub mod handlers;
pub mod routes;
pub mod state;

use axum::Router;
use state::AppState;

pub use errors::{ApiError, ApiResult};

/// Build the application router with all routes and shared state.
pub fn create_app(app_state: AppState) -> Router {
    Router::new()
        .merge(routes::call_routes())
        .merge(routes::snapshot_routes())
        .merge(routes::health_routes())
        .with_state(app_state)
}
