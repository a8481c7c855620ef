//! # Stores
//!
//! Durable contact table and call audit log. [`postgres::PgDialerStore`] is the
//! production store; [`memory::InMemoryDialerStore`] has the same semantics
//! for tests and dry runs.
//!
//! The `status` column is the only shared mutable state in the dispatcher.
//! Claims are compare-and-swap writes, and at most one contact may hold
//! `in_progress` at a time.

pub mod memory;
pub mod postgres;

use crate::error::Result;
use crate::models::{
    CallAttempt, CallLogEntry, ClaimOutcome, Contact, ContactTransition, NewCallAttempt,
};
use crate::state_machine::ContactEvent;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub use memory::InMemoryDialerStore;
pub use postgres::PgDialerStore;

#[async_trait]
pub trait ContactStore: Send + Sync {
    /// Insert a new `pending` contact. Normalization happens upstream.
    async fn create_contact(&self, phone_number: &str) -> Result<Contact>;

    async fn find_contact(&self, contact_id: i64) -> Result<Option<Contact>>;

    /// Oldest contact with this number, put back to `pending` unless a call is
    /// in flight for it; created as `pending` when absent.
    async fn find_or_requeue_by_phone(&self, phone_number: &str) -> Result<Contact>;

    /// All contacts ordered by id.
    async fn list_contacts(&self) -> Result<Vec<Contact>>;

    /// FIFO head of the queue: lowest id with status `pending` or `retry`.
    async fn next_pending_contact(&self) -> Result<Option<Contact>>;

    /// The contact holding the line, if any.
    async fn in_progress_contact(&self) -> Result<Option<Contact>>;

    /// Atomically move a `pending`/`retry` contact to `in_progress`.
    async fn claim_for_dispatch(&self, contact_id: i64) -> Result<ClaimOutcome>;

    /// Apply `event` to the contact. `Ok(None)` when the contact does not exist.
    async fn transition_contact(
        &self,
        contact_id: i64,
        event: &ContactEvent,
        at: DateTime<Utc>,
    ) -> Result<Option<ContactTransition>>;

    /// Contacts `in_progress` whose status last changed before `changed_before`.
    async fn find_stale_in_progress(&self, changed_before: DateTime<Utc>) -> Result<Vec<Contact>>;

    async fn health_check(&self) -> Result<bool>;
}

#[async_trait]
pub trait CallLogStore: Send + Sync {
    async fn record_call_attempt(&self, attempt: NewCallAttempt) -> Result<CallAttempt>;

    /// Audit rows for one contact, oldest first.
    async fn call_attempts_for_contact(&self, contact_id: i64) -> Result<Vec<CallAttempt>>;

    /// Number of placements (`started` or `error` rows) made for a contact.
    async fn count_placements(&self, contact_id: i64) -> Result<i64>;

    /// Newest audit rows across all contacts.
    async fn recent_call_log(&self, limit: i64) -> Result<Vec<CallLogEntry>>;
}

/// Contact table and audit log behind one handle.
pub trait DialerStore: ContactStore + CallLogStore {}

impl<T: ContactStore + CallLogStore + ?Sized> DialerStore for T {}
