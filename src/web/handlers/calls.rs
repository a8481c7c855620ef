//! # Call Handlers
//!
//! Trigger endpoints for operators, plus the two endpoints the telephony
//! provider calls: the status callback and the voice prompt.

use axum::extract::{Form, Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use serde::Deserialize;
use tracing::debug;

use crate::orchestration::StatusReport;
use crate::web::errors::ApiResult;
use crate::web::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct PromptForm {
    #[serde(default)]
    pub prompt: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct StatusQuery {
    pub contact_id: Option<String>,
}

/// Form body posted by the provider. Only the fields the dialer reads.
#[derive(Debug, Default, Deserialize)]
pub struct StatusForm {
    #[serde(rename = "CallSid")]
    pub call_sid: Option<String>,
    #[serde(rename = "CallStatus")]
    pub call_status: Option<String>,
    #[serde(rename = "CallDuration")]
    pub call_duration: Option<String>,
}

impl StatusForm {
    fn into_report(self, contact_id: Option<i64>) -> StatusReport {
        StatusReport {
            contact_id,
            provider_call_id: self.call_sid.filter(|sid| !sid.is_empty()),
            provider_status: self.call_status.unwrap_or_default(),
            duration_secs: self
                .call_duration
                .and_then(|d| d.trim().parse::<i32>().ok()),
        }
    }
}

/// POST /calls/start_batch
pub async fn start_batch(State(state): State<AppState>) -> ApiResult<String> {
    let outcome = state.trigger.start_batch().await?;
    Ok(outcome.message())
}

/// POST /calls/start_prompt (form field `prompt`)
pub async fn start_prompt(
    State(state): State<AppState>,
    Form(form): Form<PromptForm>,
) -> ApiResult<String> {
    let outcome = state.trigger.start_from_text(&form.prompt).await?;
    Ok(outcome.message())
}

/// POST /calls/status?contact_id=N
///
/// Always `200 OK` with an empty body, whatever happened, so the provider
/// never retries.
pub async fn status_callback(
    State(state): State<AppState>,
    query: Option<Query<StatusQuery>>,
    form: Option<Form<StatusForm>>,
) -> StatusCode {
    let contact_id = query
        .and_then(|Query(q)| q.contact_id)
        .and_then(|id| id.trim().parse::<i64>().ok());
    let form = form.map(|Form(f)| f).unwrap_or_default();

    let outcome = state.callbacks.on_status(form.into_report(contact_id)).await;
    debug!(outcome = ?outcome, "Status callback acknowledged");

    StatusCode::OK
}

/// GET|POST /calls/twiml
pub async fn voice_prompt(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/xml; charset=utf-8")],
        state.voice_prompt.to_twiml(),
    )
}
