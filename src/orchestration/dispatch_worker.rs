//! # Dispatch Worker
//!
//! Drains the dispatch queue into the engine, one command at a time. A
//! command for an unknown contact is logged and dropped; any other dispatch
//! error is logged and the worker moves on to the next command.

use super::dispatch_engine::DispatchEngine;
use super::types::DispatchOutcome;
use crate::error::Result;
use crate::queue::DispatchQueue;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

#[derive(Clone)]
pub struct DispatchWorker {
    engine: Arc<DispatchEngine>,
    queue: Arc<dyn DispatchQueue>,
    poll_interval: Duration,
}

impl DispatchWorker {
    pub fn new(
        engine: Arc<DispatchEngine>,
        queue: Arc<dyn DispatchQueue>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            engine,
            queue,
            poll_interval,
        }
    }

    /// Dispatch the oldest queued command. Returns `false` when the queue was
    /// empty.
    pub async fn process_next(&self) -> Result<bool> {
        let Some(command) = self.queue.dequeue().await? else {
            return Ok(false);
        };

        debug!(
            contact_id = command.contact_id,
            reason = %command.reason,
            "Processing dispatch command"
        );

        match self.engine.dispatch(command.contact_id).await {
            Ok(DispatchOutcome::Skipped(reason)) => {
                debug!(contact_id = command.contact_id, reason = ?reason, "Dispatch skipped");
            }
            Ok(_) => {}
            Err(e) if e.is_not_found() => {
                warn!(contact_id = command.contact_id, "Dropping dispatch for unknown contact");
            }
            Err(e) => {
                error!(
                    contact_id = command.contact_id,
                    reason = %command.reason,
                    error = %e,
                    "Dispatch failed"
                );
            }
        }

        Ok(true)
    }

    /// Process commands until the queue is empty, including any enqueued
    /// along the way. Returns how many were processed.
    pub async fn drain(&self) -> Result<usize> {
        let mut processed = 0;
        while self.process_next().await? {
            processed += 1;
        }
        Ok(processed)
    }

    /// Run until `shutdown` flips to `true` or its sender is dropped.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(poll_interval_ms = self.poll_interval.as_millis() as u64, "🔄 Dispatch worker started");

        loop {
            if *shutdown.borrow() {
                break;
            }

            match self.process_next().await {
                Ok(true) => continue,
                Ok(false) => {}
                Err(e) => error!(error = %e, "Failed to read dispatch queue"),
            }

            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                _ = self.queue.wait_for_work(self.poll_interval) => {}
            }
        }

        info!("🛑 Dispatch worker stopped");
    }
}
