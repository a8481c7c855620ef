//! Read-only snapshots of the contact table and the call log.

use axum::extract::State;
use axum::Json;

use crate::constants::defaults::RECENT_CALL_LOG_LIMIT;
use crate::models::{CallLogEntry, Contact};
use crate::web::errors::ApiResult;
use crate::web::state::AppState;

/// GET /contacts
pub async fn list_contacts(State(state): State<AppState>) -> ApiResult<Json<Vec<Contact>>> {
    Ok(Json(state.store.list_contacts().await?))
}

/// GET /call_logs
pub async fn recent_call_logs(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<CallLogEntry>>> {
    Ok(Json(state.store.recent_call_log(RECENT_CALL_LOG_LIMIT).await?))
}
