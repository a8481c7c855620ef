//! # Staleness Sweeper
//!
//! A call whose terminal callback never arrives would hold the line forever.
//! The sweeper periodically reclaims contacts that have sat `in_progress`
//! longer than `sweep.stale_after_secs`:
//!
//! - outcome `failed`: the contact becomes `failed`
//! - outcome `retry`: the contact becomes `retry` and is enqueued again, as
//!   long as it has had fewer than `sweep.max_attempts` placements; after
//!   that it becomes `failed`
//!
//! Each reclaimed contact gets a `timeout` audit row and `last_called_at`.
//!
//! Every sweep also checks for an idle line. A dispatch command is removed
//! from the queue when a worker takes it, so a worker that dies between the
//! dequeue and the claim loses that command and nothing is left to advance
//! the chain. When no contact is `in_progress`, the queue is empty and a
//! `pending` or `retry` contact remains, the FIFO head is enqueued again.

use crate::config::{SweepConfig, SweepOutcome};
use crate::error::{DialerError, Result};
use crate::logging::log_dispatch_operation;
use crate::models::{Contact, NewCallAttempt};
use crate::queue::{enqueue_next_pending, DispatchCommand, DispatchQueue, DispatchReason};
use crate::state_machine::ContactEvent;
use crate::store::DialerStore;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Contacts moved to `retry` and enqueued again
    pub retried: Vec<i64>,
    /// Contacts moved to `failed`
    pub failed: Vec<i64>,
    pub next_contact_id: Option<i64>,
}

impl SweepReport {
    pub fn reclaimed(&self) -> usize {
        self.retried.len() + self.failed.len()
    }
}

#[derive(Clone)]
pub struct StalenessSweeper {
    store: Arc<dyn DialerStore>,
    queue: Arc<dyn DispatchQueue>,
    config: SweepConfig,
}

impl StalenessSweeper {
    pub fn new(
        store: Arc<dyn DialerStore>,
        queue: Arc<dyn DispatchQueue>,
        config: SweepConfig,
    ) -> Self {
        Self {
            store,
            queue,
            config,
        }
    }

    pub async fn sweep_once(&self, now: DateTime<Utc>) -> Result<SweepReport> {
        let cutoff = now - self.config.stale_after();
        let stale = self.store.find_stale_in_progress(cutoff).await?;
        let mut report = SweepReport::default();

        for contact in stale {
            let retry = self.should_retry(&contact).await?;
            let event = ContactEvent::StaleTimeout { retry };

            match self.store.transition_contact(contact.id, &event, now).await {
                Ok(Some(_)) => {}
                Ok(None) => continue,
                // A callback closed the call between the scan and the write.
                Err(DialerError::StateMachine(e)) => {
                    debug!(contact_id = contact.id, error = %e, "Stale contact already moved on");
                    continue;
                }
                Err(e) => return Err(e),
            }

            let stale_for = (now - contact.updated_at).num_seconds();
            self.store
                .record_call_attempt(NewCallAttempt::timeout(contact.id, now, stale_for))
                .await?;

            if retry {
                self.queue
                    .enqueue(DispatchCommand::new(contact.id, DispatchReason::StalenessSweep))
                    .await?;
                report.retried.push(contact.id);
            } else {
                report.failed.push(contact.id);
            }

            log_dispatch_operation(
                "stale_reclaimed",
                contact.id,
                if retry { "retry" } else { "failed" },
                None,
                Some(&format!("no terminal status after {stale_for}s")),
            );
        }

        report.next_contact_id = self.restart_idle_line().await?;
        Ok(report)
    }

    /// Enqueue the FIFO head when nothing holds the line and no command is
    /// waiting to run.
    async fn restart_idle_line(&self) -> Result<Option<i64>> {
        if !self.queue.is_empty().await? {
            return Ok(None);
        }
        if let Some(holder) = self.store.in_progress_contact().await? {
            debug!(contact_id = holder.id, "Line is busy, chain is live");
            return Ok(None);
        }

        let next = enqueue_next_pending(
            self.store.as_ref(),
            self.queue.as_ref(),
            DispatchReason::StalenessSweep,
        )
        .await?;
        if let Some(contact_id) = next {
            info!(contact_id, "Line was idle with contacts waiting, chain restarted");
        }
        Ok(next)
    }

    async fn should_retry(&self, contact: &Contact) -> Result<bool> {
        if self.config.outcome != SweepOutcome::Retry {
            return Ok(false);
        }
        let placements = self.store.count_placements(contact.id).await?;
        Ok(placements < i64::from(self.config.max_attempts))
    }

    /// Sweep every `sweep.interval_secs` until shutdown.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(
            interval_secs = self.config.interval_secs,
            stale_after_secs = self.config.stale_after_secs,
            outcome = ?self.config.outcome,
            "🧹 Staleness sweeper started"
        );

        let mut ticker = tokio::time::interval(self.config.interval());
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    match self.sweep_once(Utc::now()).await {
                        Ok(report) if report.reclaimed() > 0 => {
                            warn!(
                                retried = ?report.retried,
                                failed = ?report.failed,
                                "Reclaimed stale in-progress contacts"
                            );
                        }
                        Ok(_) => {}
                        Err(e) => error!(error = %e, "Staleness sweep failed"),
                    }
                }
            }
        }

        info!("🛑 Staleness sweeper stopped");
    }
}
