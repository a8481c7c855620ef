//! # Dispatch Engine
//!
//! Places the call for one contact.
//!
//! ## Flow
//!
//! 1. Claim the contact: an atomic `pending`/`retry` -> `in_progress` write.
//!    A contact in any other status is a duplicate or stale trigger and the
//!    run is a no-op. A claim refused because another contact holds the line
//!    leaves this contact `pending` for a later dispatch.
//! 2. Ask the placement client to dial, passing the voice prompt URL and a
//!    status callback URL carrying the contact id.
//! 3. On success, append a `started` audit row with the provider call id.
//! 4. On failure, mark the contact `failed`, append an `error` audit row and
//!    enqueue the next pending contact so one bad number never stalls the
//!    queue.
//!
//! Placement failures never propagate out of [`DispatchEngine::dispatch`].
//! The only error a caller sees for a bad id is
//! [`DialerError::ContactNotFound`]; storage failures surface as they are.

use super::types::{CallbackEndpoints, DispatchOutcome, SkipReason};
use crate::error::{DialerError, Result};
use crate::logging::log_dispatch_operation;
use crate::models::{ClaimOutcome, Contact, NewCallAttempt};
use crate::provider::{CallPlacementClient, ProviderPlacementError};
use crate::queue::{enqueue_next_pending, DispatchQueue, DispatchReason};
use crate::state_machine::ContactEvent;
use crate::store::DialerStore;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

pub struct DispatchEngine {
    store: Arc<dyn DialerStore>,
    client: Arc<dyn CallPlacementClient>,
    queue: Arc<dyn DispatchQueue>,
    endpoints: CallbackEndpoints,
}

impl DispatchEngine {
    pub fn new(
        store: Arc<dyn DialerStore>,
        client: Arc<dyn CallPlacementClient>,
        queue: Arc<dyn DispatchQueue>,
        endpoints: CallbackEndpoints,
    ) -> Self {
        Self {
            store,
            client,
            queue,
            endpoints,
        }
    }

    #[instrument(skip(self), fields(client = self.client.name()))]
    pub async fn dispatch(&self, contact_id: i64) -> Result<DispatchOutcome> {
        let contact = match self.store.claim_for_dispatch(contact_id).await? {
            ClaimOutcome::Claimed(contact) => contact,
            ClaimOutcome::NotFound => {
                warn!(contact_id = contact_id, "Dispatch requested for unknown contact");
                return Err(DialerError::ContactNotFound(contact_id));
            }
            ClaimOutcome::NotDispatchable(status) => {
                debug!(
                    contact_id = contact_id,
                    status = %status,
                    "Contact is not dispatchable, skipping"
                );
                return Ok(DispatchOutcome::Skipped(SkipReason::AlreadyDispatched {
                    status,
                }));
            }
            ClaimOutcome::LineBusy => {
                debug!(contact_id = contact_id, "Line busy, contact stays queued");
                return Ok(DispatchOutcome::Skipped(SkipReason::LineBusy));
            }
        };

        log_dispatch_operation("claimed", contact.id, contact.status.as_str(), None, None);

        let request = self.endpoints.place_request(&contact);
        match self.client.place(&request).await {
            Ok(provider_call_id) => self.record_placed(contact, provider_call_id).await,
            Err(error) => self.handle_placement_failure(contact, error).await,
        }
    }

    async fn record_placed(
        &self,
        contact: Contact,
        provider_call_id: String,
    ) -> Result<DispatchOutcome> {
        let attempt = self
            .store
            .record_call_attempt(NewCallAttempt::started(
                contact.id,
                provider_call_id.as_str(),
                Utc::now(),
            ))
            .await?;

        log_dispatch_operation(
            "placed",
            contact.id,
            contact.status.as_str(),
            Some(&provider_call_id),
            None,
        );

        Ok(DispatchOutcome::Placed { contact, attempt })
    }

    async fn handle_placement_failure(
        &self,
        contact: Contact,
        error: ProviderPlacementError,
    ) -> Result<DispatchOutcome> {
        let event = ContactEvent::PlacementFailed(error.cause.clone());
        match self
            .store
            .transition_contact(contact.id, &event, Utc::now())
            .await
        {
            Ok(_) => {}
            // The sweep or a late callback moved the contact first; the audit
            // row and the queue advance still apply.
            Err(DialerError::StateMachine(e)) => {
                warn!(contact_id = contact.id, error = %e, "Could not mark contact failed");
            }
            Err(e) => return Err(e),
        }

        let attempt = self
            .store
            .record_call_attempt(NewCallAttempt::error(contact.id, error.cause.as_str()))
            .await?;

        log_dispatch_operation(
            "placement_failed",
            contact.id,
            crate::constants::contact_status::FAILED,
            None,
            Some(&error.cause),
        );

        let next_contact_id = enqueue_next_pending(
            self.store.as_ref(),
            self.queue.as_ref(),
            DispatchReason::PlacementFailure,
        )
        .await?;

        Ok(DispatchOutcome::PlacementFailed {
            contact_id: contact.id,
            attempt,
            error,
            next_contact_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::attempt_status;
    use crate::provider::ScriptedCallClient;
    use crate::queue::InMemoryDispatchQueue;
    use crate::state_machine::ContactStatus;
    use crate::store::{CallLogStore, ContactStore, InMemoryDialerStore};

    struct Fixture {
        store: Arc<InMemoryDialerStore>,
        client: Arc<ScriptedCallClient>,
        queue: Arc<InMemoryDispatchQueue>,
        engine: DispatchEngine,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(InMemoryDialerStore::new());
        let client = Arc::new(ScriptedCallClient::new());
        let queue = Arc::new(InMemoryDispatchQueue::new());
        let engine = DispatchEngine::new(
            store.clone(),
            client.clone(),
            queue.clone(),
            CallbackEndpoints::default(),
        );
        Fixture {
            store,
            client,
            queue,
            engine,
        }
    }

    #[tokio::test]
    async fn test_successful_dispatch_records_started_attempt() {
        let f = fixture();
        let id = f.store.seed(["+919876543210"])[0].id;
        f.client.push_success("CA100");

        let outcome = f.engine.dispatch(id).await.unwrap();
        assert!(outcome.placed_call());

        let contact = f.store.find_contact(id).await.unwrap().unwrap();
        assert_eq!(contact.status, ContactStatus::InProgress);

        let attempts = f.store.call_attempts_for_contact(id).await.unwrap();
        assert_eq!(attempts.len(), 1);
        assert_eq!(attempts[0].status, attempt_status::STARTED);
        assert_eq!(attempts[0].provider_call_id.as_deref(), Some("CA100"));
        assert!(attempts[0].started_at.is_some());

        let requests = f.client.requests();
        assert_eq!(
            requests[0].status_callback_url,
            format!("http://localhost:3000/calls/status?contact_id={id}")
        );
    }

    #[tokio::test]
    async fn test_failed_placement_marks_failed_and_enqueues_next() {
        let f = fixture();
        let contacts = f.store.seed(["+911111111111", "+912222222222"]);
        f.client.push_failure("authentication failed");

        let outcome = f.engine.dispatch(contacts[0].id).await.unwrap();
        match outcome {
            DispatchOutcome::PlacementFailed {
                next_contact_id,
                attempt,
                ..
            } => {
                assert_eq!(next_contact_id, Some(contacts[1].id));
                assert_eq!(attempt.error_message.as_deref(), Some("authentication failed"));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }

        let failed = f.store.find_contact(contacts[0].id).await.unwrap().unwrap();
        assert_eq!(failed.status, ContactStatus::Failed);
        assert!(failed.last_called_at.is_some());

        let queued = f.queue.pending_commands();
        assert_eq!(queued.len(), 1);
        assert_eq!(queued[0].contact_id, contacts[1].id);
        assert_eq!(queued[0].reason, DispatchReason::PlacementFailure);
    }

    #[tokio::test]
    async fn test_non_dispatchable_contact_is_a_no_op() {
        let f = fixture();
        let id = f.store.seed(["+911111111111"])[0].id;
        f.store.force_status(id, ContactStatus::from("completed"));

        let outcome = f.engine.dispatch(id).await.unwrap();
        assert_eq!(
            outcome,
            DispatchOutcome::Skipped(SkipReason::AlreadyDispatched {
                status: ContactStatus::from("completed")
            })
        );
        assert!(f.client.requests().is_empty());
        assert!(f.store.call_attempts_for_contact(id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_contact_is_not_found() {
        let f = fixture();
        let err = f.engine.dispatch(404).await.unwrap_err();
        assert_eq!(err, DialerError::ContactNotFound(404));
    }

    #[tokio::test]
    async fn test_retry_contact_is_dispatchable() {
        let f = fixture();
        let id = f.store.seed(["+911111111111"])[0].id;
        f.store.force_status(id, ContactStatus::Retry);

        assert!(f.engine.dispatch(id).await.unwrap().placed_call());
    }
}
