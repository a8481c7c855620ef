//! # Dispatch Queue
//!
//! Work queue between the entry points and the dispatch engine. Batch start,
//! status callbacks, placement failures and the staleness sweep only enqueue a
//! [`DispatchCommand`]; a [`crate::orchestration::DispatchWorker`] dequeues it
//! and runs the dispatch out of band.
//!
//! Delivery is at most once: a command is removed when it is dequeued. A
//! worker that dies after its claim leaves the contact `in_progress` for the
//! staleness sweep to reclaim. One that dies between the dequeue and the claim
//! loses the command, and the sweep re-enqueues the FIFO head once it finds
//! the line idle.

pub mod memory;
pub mod postgres;

use crate::error::Result;
use crate::store::ContactStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::debug;

pub use memory::InMemoryDispatchQueue;
pub use postgres::PgDispatchQueue;

/// Why a dispatch was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchReason {
    BatchStart,
    FreeText,
    StatusCallback,
    PlacementFailure,
    StalenessSweep,
}

impl DispatchReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BatchStart => "batch_start",
            Self::FreeText => "free_text",
            Self::StatusCallback => "status_callback",
            Self::PlacementFailure => "placement_failure",
            Self::StalenessSweep => "staleness_sweep",
        }
    }
}

impl fmt::Display for DispatchReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for DispatchReason {
    /// Unknown reasons read back from storage are treated as batch starts.
    fn from(value: &str) -> Self {
        match value {
            "free_text" => Self::FreeText,
            "status_callback" => Self::StatusCallback,
            "placement_failure" => Self::PlacementFailure,
            "staleness_sweep" => Self::StalenessSweep,
            _ => Self::BatchStart,
        }
    }
}

/// A request to dispatch one contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchCommand {
    pub contact_id: i64,
    pub reason: DispatchReason,
    pub enqueued_at: DateTime<Utc>,
}

impl DispatchCommand {
    pub fn new(contact_id: i64, reason: DispatchReason) -> Self {
        Self {
            contact_id,
            reason,
            enqueued_at: Utc::now(),
        }
    }
}

#[async_trait]
pub trait DispatchQueue: Send + Sync {
    async fn enqueue(&self, command: DispatchCommand) -> Result<()>;

    /// Take the oldest command, if any. Does not block.
    async fn dequeue(&self) -> Result<Option<DispatchCommand>>;

    /// Wait until work may be available, or until `timeout` elapses.
    async fn wait_for_work(&self, timeout: Duration);

    async fn len(&self) -> Result<usize>;

    async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }
}

/// Enqueue a dispatch for the FIFO head of the `pending`/`retry` contacts.
///
/// Returns the contact id enqueued, or `None` when nothing is waiting.
pub async fn enqueue_next_pending<S, Q>(
    store: &S,
    queue: &Q,
    reason: DispatchReason,
) -> Result<Option<i64>>
where
    S: ContactStore + ?Sized,
    Q: DispatchQueue + ?Sized,
{
    let Some(next) = store.next_pending_contact().await? else {
        debug!(reason = %reason, "No pending contact to enqueue");
        return Ok(None);
    };

    queue
        .enqueue(DispatchCommand::new(next.id, reason))
        .await?;
    debug!(contact_id = next.id, reason = %reason, "Enqueued next pending contact");
    Ok(Some(next.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state_machine::ContactStatus;
    use crate::store::InMemoryDialerStore;

    #[test]
    fn test_reason_round_trips_through_str() {
        for reason in [
            DispatchReason::BatchStart,
            DispatchReason::FreeText,
            DispatchReason::StatusCallback,
            DispatchReason::PlacementFailure,
            DispatchReason::StalenessSweep,
        ] {
            assert_eq!(DispatchReason::from(reason.as_str()), reason);
        }
    }

    #[tokio::test]
    async fn test_enqueue_next_pending_picks_lowest_pending_id() {
        let store = InMemoryDialerStore::new();
        let queue = InMemoryDispatchQueue::new();
        let contacts = store.seed(["+911", "+912"]);
        store.force_status(contacts[0].id, ContactStatus::from("completed"));

        let enqueued = enqueue_next_pending(&store, &queue, DispatchReason::StatusCallback)
            .await
            .unwrap();
        assert_eq!(enqueued, Some(contacts[1].id));

        let command = queue.dequeue().await.unwrap().unwrap();
        assert_eq!(command.contact_id, contacts[1].id);
        assert_eq!(command.reason, DispatchReason::StatusCallback);
    }

    #[tokio::test]
    async fn test_enqueue_next_pending_with_nothing_pending() {
        let store = InMemoryDialerStore::new();
        let queue = InMemoryDispatchQueue::new();

        let enqueued = enqueue_next_pending(&store, &queue, DispatchReason::BatchStart)
            .await
            .unwrap();
        assert_eq!(enqueued, None);
        assert!(queue.is_empty().await.unwrap());
    }
}
