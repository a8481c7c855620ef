//! # Orchestration Types
//!
//! Outcomes reported by the dispatch engine, the status callback handler and
//! the batch trigger.

use crate::config::{CallbackConfig, EventSubscription};
use crate::models::{CallAttempt, Contact};
use crate::provider::{PlaceCallRequest, ProviderPlacementError};
use crate::state_machine::ContactStatus;
use serde::{Deserialize, Serialize};

/// Result of one `dispatch(contact_id)` run.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// The provider accepted the call; the contact is `in_progress`
    Placed {
        contact: Contact,
        attempt: CallAttempt,
    },
    /// The provider rejected the call; the contact is `failed` and the next
    /// pending contact (if any) was enqueued
    PlacementFailed {
        contact_id: i64,
        attempt: CallAttempt,
        error: ProviderPlacementError,
        next_contact_id: Option<i64>,
    },
    /// Nothing was done
    Skipped(SkipReason),
}

impl DispatchOutcome {
    pub fn placed_call(&self) -> bool {
        matches!(self, Self::Placed { .. })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    /// The contact was not `pending`/`retry` (duplicate or stale trigger)
    AlreadyDispatched { status: ContactStatus },
    /// Another contact holds the single line; this one stays queued
    LineBusy,
}

/// A status report as delivered by the provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReport {
    /// Correlation id embedded in the callback URL
    pub contact_id: Option<i64>,
    pub provider_call_id: Option<String>,
    pub provider_status: String,
    pub duration_secs: Option<i32>,
}

impl StatusReport {
    pub fn new(contact_id: i64, provider_status: impl Into<String>) -> Self {
        Self {
            contact_id: Some(contact_id),
            provider_status: provider_status.into(),
            ..Self::default()
        }
    }

    pub fn with_call_id(mut self, provider_call_id: impl Into<String>) -> Self {
        self.provider_call_id = Some(provider_call_id.into());
        self
    }

    pub fn with_duration(mut self, duration_secs: i32) -> Self {
        self.duration_secs = Some(duration_secs);
        self
    }
}

/// What the status callback handler did with a report. The provider is
/// acknowledged in every case.
#[derive(Debug, Clone, PartialEq)]
pub enum CallbackOutcome {
    /// The contact took the reported status
    Applied {
        contact_id: i64,
        status: ContactStatus,
        /// The report closed a call that was in flight
        closed_call: bool,
        next_contact_id: Option<i64>,
    },
    Ignored(IgnoreReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoreReason {
    MissingContactId,
    MissingStatus,
    UnknownContact(i64),
    /// `queued`, `ringing` and friends: the call is still in flight
    InterimStatus(String),
    /// The status is one only the dispatcher may write
    RejectedStatus(String),
    /// Storage or queue failure while handling the report
    HandlingFailed(String),
}

/// Result of a batch trigger action, with the message shown to the user.
#[derive(Debug, Clone, PartialEq)]
pub enum TriggerOutcome {
    Started { contact: Contact },
    Prompted { contact: Contact },
    NoPendingContacts,
}

impl TriggerOutcome {
    pub fn message(&self) -> String {
        match self {
            Self::Started { contact } => format!("Dialing started with {}", contact.phone_number),
            Self::Prompted { contact } => {
                format!("Calling {} based on your prompt.", contact.phone_number)
            }
            Self::NoPendingContacts => {
                crate::constants::user_messages::NO_PENDING_CONTACTS.to_string()
            }
        }
    }
}

/// URLs and event subscription handed to the provider with every call.
#[derive(Debug, Clone, PartialEq)]
pub struct CallbackEndpoints {
    pub callbacks: CallbackConfig,
    pub event_subscription: EventSubscription,
}

impl CallbackEndpoints {
    pub fn new(callbacks: CallbackConfig, event_subscription: EventSubscription) -> Self {
        Self {
            callbacks,
            event_subscription,
        }
    }

    pub fn place_request(&self, contact: &Contact) -> PlaceCallRequest {
        PlaceCallRequest {
            to: contact.phone_number.clone(),
            prompt_url: self.callbacks.prompt_url(),
            status_callback_url: self.callbacks.status_callback_url(contact.id),
            events: self.event_subscription.event_names(),
        }
    }
}

impl Default for CallbackEndpoints {
    fn default() -> Self {
        Self::new(CallbackConfig::default(), EventSubscription::TerminalOnly)
    }
}
