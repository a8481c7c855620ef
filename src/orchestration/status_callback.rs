//! # Status Callback Handler
//!
//! Applies provider status reports to contacts and advances the queue.
//!
//! Reports arrive zero or more times per call, possibly duplicated or out of
//! order. The handler never fails outward: unknown contacts, malformed reports
//! and internal errors are logged and the provider is acknowledged anyway, so
//! it never retries a delivery the dialer cannot act on.
//!
//! Interim statuses (`ringing`, `in-progress`, ...) only arrive with the
//! lifecycle subscription. They leave the contact `in_progress` and do not
//! advance the queue. Every other status is stored verbatim, `last_called_at`
//! is stamped, and the next pending contact is enqueued.

use super::types::{CallbackOutcome, IgnoreReason, StatusReport};
use crate::error::{DialerError, Result};
use crate::logging::log_callback_operation;
use crate::models::{ContactTransition, NewCallAttempt};
use crate::queue::{enqueue_next_pending, DispatchQueue, DispatchReason};
use crate::state_machine::{ContactEvent, ProviderStatusKind};
use crate::store::DialerStore;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{error, instrument, warn};

pub struct StatusCallbackHandler {
    store: Arc<dyn DialerStore>,
    queue: Arc<dyn DispatchQueue>,
}

impl StatusCallbackHandler {
    pub fn new(store: Arc<dyn DialerStore>, queue: Arc<dyn DispatchQueue>) -> Self {
        Self { store, queue }
    }

    #[instrument(skip(self, report), fields(
        contact_id = report.contact_id,
        provider_status = %report.provider_status
    ))]
    pub async fn on_status(&self, report: StatusReport) -> CallbackOutcome {
        let outcome = self.handle(&report, Utc::now()).await;

        let label = match &outcome {
            CallbackOutcome::Applied { closed_call: true, .. } => "applied",
            CallbackOutcome::Applied { .. } => "applied_duplicate",
            CallbackOutcome::Ignored(IgnoreReason::MissingContactId) => "ignored_missing_contact_id",
            CallbackOutcome::Ignored(IgnoreReason::MissingStatus) => "ignored_missing_status",
            CallbackOutcome::Ignored(IgnoreReason::UnknownContact(_)) => "ignored_unknown_contact",
            CallbackOutcome::Ignored(IgnoreReason::InterimStatus(_)) => "ignored_interim",
            CallbackOutcome::Ignored(IgnoreReason::RejectedStatus(_)) => "ignored_rejected",
            CallbackOutcome::Ignored(IgnoreReason::HandlingFailed(_)) => "ignored_error",
        };
        log_callback_operation(
            report.contact_id,
            report.provider_call_id.as_deref(),
            &report.provider_status,
            label,
        );

        outcome
    }

    async fn handle(&self, report: &StatusReport, now: DateTime<Utc>) -> CallbackOutcome {
        let Some(contact_id) = report.contact_id else {
            return CallbackOutcome::Ignored(IgnoreReason::MissingContactId);
        };

        let provider_status = report.provider_status.trim();
        if provider_status.is_empty() {
            return CallbackOutcome::Ignored(IgnoreReason::MissingStatus);
        }
        if ProviderStatusKind::classify(provider_status) == ProviderStatusKind::Interim {
            return CallbackOutcome::Ignored(IgnoreReason::InterimStatus(
                provider_status.to_string(),
            ));
        }

        let event = ContactEvent::ProviderStatus(provider_status.to_string());
        let transition = match self.store.transition_contact(contact_id, &event, now).await {
            Ok(Some(transition)) => transition,
            Ok(None) => return CallbackOutcome::Ignored(IgnoreReason::UnknownContact(contact_id)),
            Err(DialerError::StateMachine(e)) => {
                warn!(contact_id = contact_id, error = %e, "Provider status rejected");
                return CallbackOutcome::Ignored(IgnoreReason::RejectedStatus(
                    provider_status.to_string(),
                ));
            }
            Err(e) => {
                error!(contact_id = contact_id, error = %e, "Failed to apply provider status");
                return CallbackOutcome::Ignored(IgnoreReason::HandlingFailed(e.to_string()));
            }
        };

        let next_contact_id = match enqueue_next_pending(
            self.store.as_ref(),
            self.queue.as_ref(),
            DispatchReason::StatusCallback,
        )
        .await
        {
            Ok(next) => next,
            Err(e) => {
                error!(contact_id = contact_id, error = %e, "Failed to enqueue next contact");
                return CallbackOutcome::Ignored(IgnoreReason::HandlingFailed(e.to_string()));
            }
        };

        let closed_call = transition.closed_in_flight_call();
        if closed_call {
            if let Err(e) = self.record_outcome(report, &transition, now).await {
                error!(contact_id = contact_id, error = %e, "Failed to record call outcome");
            }
        }

        CallbackOutcome::Applied {
            contact_id,
            status: transition.contact.status,
            closed_call,
            next_contact_id,
        }
    }

    async fn record_outcome(
        &self,
        report: &StatusReport,
        transition: &ContactTransition,
        ended_at: DateTime<Utc>,
    ) -> Result<()> {
        self.store
            .record_call_attempt(NewCallAttempt::outcome(
                transition.contact.id,
                transition.contact.status.as_str(),
                report.provider_call_id.clone(),
                ended_at,
                report.duration_secs,
            ))
            .await?;
        Ok(())
    }
}
