//! In-memory store with the same claim and transition rules as Postgres.

use super::{CallLogStore, ContactStore};
use crate::constants::attempt_status;
use crate::error::Result;
use crate::models::{
    CallAttempt, CallLogEntry, ClaimOutcome, Contact, ContactTransition, NewCallAttempt,
};
use crate::state_machine::{ContactEvent, ContactStateMachine, ContactStatus, StateMachineError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::BTreeMap;

#[derive(Debug, Default)]
struct MemoryState {
    contacts: BTreeMap<i64, Contact>,
    attempts: Vec<CallAttempt>,
    last_contact_id: i64,
    last_attempt_id: i64,
}

impl MemoryState {
    fn line_busy_for(&self, contact_id: i64) -> bool {
        self.contacts
            .values()
            .any(|c| c.id != contact_id && c.status.is_active())
    }

    fn insert_contact(&mut self, phone_number: &str, now: DateTime<Utc>) -> Contact {
        self.last_contact_id += 1;
        let contact = Contact {
            id: self.last_contact_id,
            phone_number: phone_number.to_string(),
            status: ContactStatus::Pending,
            last_called_at: None,
            created_at: now,
            updated_at: now,
        };
        self.contacts.insert(contact.id, contact.clone());
        contact
    }
}

/// Store held entirely in process memory. Everything is lost on restart.
#[derive(Debug, Default)]
pub struct InMemoryDialerStore {
    state: Mutex<MemoryState>,
}

impl InMemoryDialerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create `pending` contacts in order, returning them.
    pub fn seed<I, S>(&self, phone_numbers: I) -> Vec<Contact>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let now = Utc::now();
        let mut state = self.state.lock();
        phone_numbers
            .into_iter()
            .map(|phone| state.insert_contact(phone.as_ref(), now))
            .collect()
    }

    /// Overwrite a contact's status directly, bypassing the state machine.
    pub fn force_status(&self, contact_id: i64, status: ContactStatus) {
        if let Some(contact) = self.state.lock().contacts.get_mut(&contact_id) {
            contact.status = status;
        }
    }

    pub fn all_call_attempts(&self) -> Vec<CallAttempt> {
        self.state.lock().attempts.clone()
    }
}

#[async_trait]
impl ContactStore for InMemoryDialerStore {
    async fn create_contact(&self, phone_number: &str) -> Result<Contact> {
        Ok(self.state.lock().insert_contact(phone_number, Utc::now()))
    }

    async fn find_contact(&self, contact_id: i64) -> Result<Option<Contact>> {
        Ok(self.state.lock().contacts.get(&contact_id).cloned())
    }

    async fn find_or_requeue_by_phone(&self, phone_number: &str) -> Result<Contact> {
        let now = Utc::now();
        let mut state = self.state.lock();

        if let Some(contact) = state
            .contacts
            .values_mut()
            .find(|c| c.phone_number == phone_number)
        {
            if !contact.status.is_active() {
                contact.status = ContactStatus::Pending;
                contact.updated_at = now;
            }
            return Ok(contact.clone());
        }

        Ok(state.insert_contact(phone_number, now))
    }

    async fn list_contacts(&self) -> Result<Vec<Contact>> {
        Ok(self.state.lock().contacts.values().cloned().collect())
    }

    async fn next_pending_contact(&self) -> Result<Option<Contact>> {
        Ok(self
            .state
            .lock()
            .contacts
            .values()
            .find(|c| c.status.is_dispatchable())
            .cloned())
    }

    async fn in_progress_contact(&self) -> Result<Option<Contact>> {
        Ok(self
            .state
            .lock()
            .contacts
            .values()
            .find(|c| c.status == ContactStatus::InProgress)
            .cloned())
    }

    async fn claim_for_dispatch(&self, contact_id: i64) -> Result<ClaimOutcome> {
        let mut state = self.state.lock();
        let line_busy = state.line_busy_for(contact_id);

        let Some(contact) = state.contacts.get_mut(&contact_id) else {
            return Ok(ClaimOutcome::NotFound);
        };
        if !contact.status.is_dispatchable() {
            return Ok(ClaimOutcome::NotDispatchable(contact.status.clone()));
        }
        if line_busy {
            return Ok(ClaimOutcome::LineBusy);
        }

        contact.status = ContactStatus::InProgress;
        contact.updated_at = Utc::now();
        Ok(ClaimOutcome::Claimed(contact.clone()))
    }

    async fn transition_contact(
        &self,
        contact_id: i64,
        event: &ContactEvent,
        at: DateTime<Utc>,
    ) -> Result<Option<ContactTransition>> {
        let mut state = self.state.lock();
        let line_busy = state.line_busy_for(contact_id);

        let Some(contact) = state.contacts.get_mut(&contact_id) else {
            return Ok(None);
        };

        let from = contact.status.clone();
        let target = ContactStateMachine::determine_target_state(&from, event)?;
        if target.is_active() && line_busy {
            return Err(StateMachineError::LineBusy.into());
        }

        contact.status = target;
        contact.updated_at = at;
        if event.stamps_last_called_at() {
            contact.last_called_at = Some(at);
        }

        Ok(Some(ContactTransition {
            contact: contact.clone(),
            from,
        }))
    }

    async fn find_stale_in_progress(&self, changed_before: DateTime<Utc>) -> Result<Vec<Contact>> {
        Ok(self
            .state
            .lock()
            .contacts
            .values()
            .filter(|c| c.status.is_active() && c.updated_at < changed_before)
            .cloned()
            .collect())
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }
}

#[async_trait]
impl CallLogStore for InMemoryDialerStore {
    async fn record_call_attempt(&self, attempt: NewCallAttempt) -> Result<CallAttempt> {
        let mut state = self.state.lock();
        state.last_attempt_id += 1;
        let record = CallAttempt {
            id: state.last_attempt_id,
            contact_id: attempt.contact_id,
            status: attempt.status,
            provider_call_id: attempt.provider_call_id,
            started_at: attempt.started_at,
            ended_at: attempt.ended_at,
            duration_secs: attempt.duration_secs,
            error_message: attempt.error_message,
            created_at: Utc::now(),
        };
        state.attempts.push(record.clone());
        Ok(record)
    }

    async fn call_attempts_for_contact(&self, contact_id: i64) -> Result<Vec<CallAttempt>> {
        Ok(self
            .state
            .lock()
            .attempts
            .iter()
            .filter(|a| a.contact_id == contact_id)
            .cloned()
            .collect())
    }

    async fn count_placements(&self, contact_id: i64) -> Result<i64> {
        let count = self
            .state
            .lock()
            .attempts
            .iter()
            .filter(|a| {
                a.contact_id == contact_id
                    && (a.status == attempt_status::STARTED || a.status == attempt_status::ERROR)
            })
            .count();
        Ok(count as i64)
    }

    async fn recent_call_log(&self, limit: i64) -> Result<Vec<CallLogEntry>> {
        let state = self.state.lock();
        Ok(state
            .attempts
            .iter()
            .rev()
            .take(limit.max(0) as usize)
            .map(|attempt| CallLogEntry {
                phone_number: state
                    .contacts
                    .get(&attempt.contact_id)
                    .map(|c| c.phone_number.clone())
                    .unwrap_or_default(),
                attempt: attempt.clone(),
            })
            .collect())
    }
}
