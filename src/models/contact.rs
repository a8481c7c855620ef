//! # Contact Model
//!
//! A dialable contact and its place in the queue.
//!
//! Maps to the `contacts` table:
//! ```sql
//! CREATE TABLE contacts (
//!   id BIGSERIAL PRIMARY KEY,
//!   phone_number VARCHAR NOT NULL,
//!   status VARCHAR NOT NULL DEFAULT 'pending',
//!   last_called_at TIMESTAMPTZ,
//!   created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!   updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//! ```
//!
//! Ingestion creates contacts as `pending`. After that only the dispatch
//! engine (pending -> in_progress) and the status callback handler
//! (in_progress -> terminal) write the status. `updated_at` moves with every
//! status write, which is what the staleness sweep measures against.

use crate::state_machine::ContactStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Contact {
    pub id: i64,
    pub phone_number: String,
    #[sqlx(try_from = "String")]
    pub status: ContactStatus,
    pub last_called_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Contact {
    pub fn is_dispatchable(&self) -> bool {
        self.status.is_dispatchable()
    }
}

/// Result of a status write on a contact.
#[derive(Debug, Clone, PartialEq)]
pub struct ContactTransition {
    pub contact: Contact,
    pub from: ContactStatus,
}

impl ContactTransition {
    /// The write closed a call that was in flight.
    pub fn closed_in_flight_call(&self) -> bool {
        self.from.is_active() && !self.contact.status.is_active()
    }
}

/// Outcome of an attempt to claim a contact for dispatch.
#[derive(Debug, Clone, PartialEq)]
pub enum ClaimOutcome {
    /// The contact moved to `in_progress` and belongs to the caller
    Claimed(Contact),
    /// The contact exists but is not `pending`/`retry`
    NotDispatchable(ContactStatus),
    /// A different contact already holds the line
    LineBusy,
    NotFound,
}
