//! Durable dispatch queue on the `dispatch_jobs` table.
//!
//! Jobs are claimed with `FOR UPDATE SKIP LOCKED` and deleted in the same
//! statement, so several workers can poll one table without handing the same
//! job to two of them.

use super::{DispatchCommand, DispatchQueue, DispatchReason};
use crate::error::{DialerError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use std::time::Duration;
use tokio::sync::Notify;
use tracing::{debug, error};

#[derive(Debug, FromRow)]
struct DispatchJobRow {
    contact_id: i64,
    reason: String,
    enqueued_at: DateTime<Utc>,
}

impl From<DispatchJobRow> for DispatchCommand {
    fn from(row: DispatchJobRow) -> Self {
        Self {
            contact_id: row.contact_id,
            reason: DispatchReason::from(row.reason.as_str()),
            enqueued_at: row.enqueued_at,
        }
    }
}

#[derive(Debug)]
pub struct PgDispatchQueue {
    pool: PgPool,
    // Wakes workers in this process right away; other processes fall back to polling.
    local_notify: Notify,
}

impl PgDispatchQueue {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            local_notify: Notify::new(),
        }
    }
}

#[async_trait]
impl DispatchQueue for PgDispatchQueue {
    async fn enqueue(&self, command: DispatchCommand) -> Result<()> {
        sqlx::query(
            "INSERT INTO dispatch_jobs (contact_id, reason, enqueued_at) VALUES ($1, $2, $3)",
        )
        .bind(command.contact_id)
        .bind(command.reason.as_str())
        .bind(command.enqueued_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!(contact_id = command.contact_id, "Failed to enqueue dispatch job: {}", e);
            DialerError::Queue(format!("enqueue failed: {e}"))
        })?;

        debug!(
            contact_id = command.contact_id,
            reason = %command.reason,
            "Dispatch job enqueued"
        );
        self.local_notify.notify_one();
        Ok(())
    }

    async fn dequeue(&self) -> Result<Option<DispatchCommand>> {
        let row = sqlx::query_as::<_, DispatchJobRow>(
            r#"
            DELETE FROM dispatch_jobs
            WHERE id = (
                SELECT id FROM dispatch_jobs
                ORDER BY id
                FOR UPDATE SKIP LOCKED
                LIMIT 1
            )
            RETURNING contact_id, reason, enqueued_at
            "#,
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to dequeue dispatch job: {}", e);
            DialerError::Queue(format!("dequeue failed: {e}"))
        })?;

        Ok(row.map(DispatchCommand::from))
    }

    async fn wait_for_work(&self, timeout: Duration) {
        let _ = tokio::time::timeout(timeout, self.local_notify.notified()).await;
    }

    async fn len(&self) -> Result<usize> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM dispatch_jobs")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0.max(0) as usize)
    }
}
