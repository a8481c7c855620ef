//! # Postgres Store
//!
//! `contacts` and `call_attempts` tables through sqlx.
//!
//! ## Single flight
//!
//! A claim is one conditional statement:
//!
//! ```sql
//! UPDATE contacts SET status = 'in_progress', updated_at = NOW()
//! WHERE id = $1 AND status = ANY($2)
//! ```
//!
//! Two workers racing on the same contact cannot both match the `WHERE`
//! clause. Two workers racing on different contacts collide on the partial
//! unique index `index_contacts_single_in_progress`; the loser sees a
//! unique violation and reports [`ClaimOutcome::LineBusy`].
//!
//! Every other status write locks the row (`FOR UPDATE`), checks the
//! transition against [`ContactStateMachine`] and writes inside the same
//! transaction.

use super::{CallLogStore, ContactStore};
use crate::constants::{attempt_status, contact_status};
use crate::error::{DialerError, Result};
use crate::models::{
    CallAttempt, CallLogEntry, ClaimOutcome, Contact, ContactTransition, NewCallAttempt,
};
use crate::state_machine::{ContactEvent, ContactStateMachine, ContactStatus, StateMachineError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::{debug, error, info, instrument, warn};

const CONTACT_COLUMNS: &str = "id, phone_number, status, last_called_at, created_at, updated_at";
const ATTEMPT_COLUMNS: &str = "id, contact_id, status, provider_call_id, started_at, ended_at, duration_secs, error_message, created_at";

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

#[derive(Debug, Clone)]
pub struct PgDialerStore {
    pool: PgPool,
}

impl PgDialerStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| {
                error!("Failed to connect to database: {}", e);
                DialerError::Database(format!("Connection failed: {e}"))
            })?;
        info!(max_connections = max_connections, "✅ Connected to Postgres");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn run_migrations(&self) -> Result<()> {
        MIGRATOR.run(&self.pool).await?;
        info!("✅ Database migrations applied");
        Ok(())
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

#[async_trait]
impl ContactStore for PgDialerStore {
    async fn create_contact(&self, phone_number: &str) -> Result<Contact> {
        let sql = format!(
            "INSERT INTO contacts (phone_number, status) VALUES ($1, $2) RETURNING {CONTACT_COLUMNS}"
        );
        let contact = sqlx::query_as::<_, Contact>(&sql)
            .bind(phone_number)
            .bind(contact_status::PENDING)
            .fetch_one(&self.pool)
            .await?;
        Ok(contact)
    }

    async fn find_contact(&self, contact_id: i64) -> Result<Option<Contact>> {
        let sql = format!("SELECT {CONTACT_COLUMNS} FROM contacts WHERE id = $1");
        let contact = sqlx::query_as::<_, Contact>(&sql)
            .bind(contact_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(contact)
    }

    #[instrument(skip(self))]
    async fn find_or_requeue_by_phone(&self, phone_number: &str) -> Result<Contact> {
        let mut tx = self.pool.begin().await?;

        let select = format!(
            "SELECT {CONTACT_COLUMNS} FROM contacts WHERE phone_number = $1 ORDER BY id LIMIT 1 FOR UPDATE"
        );
        let existing = sqlx::query_as::<_, Contact>(&select)
            .bind(phone_number)
            .fetch_optional(&mut *tx)
            .await?;

        let contact = match existing {
            Some(contact) if contact.status.is_active() => {
                debug!(contact_id = contact.id, "Contact has a call in flight, leaving status alone");
                contact
            }
            Some(contact) => {
                let update = format!(
                    "UPDATE contacts SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING {CONTACT_COLUMNS}"
                );
                sqlx::query_as::<_, Contact>(&update)
                    .bind(contact.id)
                    .bind(contact_status::PENDING)
                    .fetch_one(&mut *tx)
                    .await?
            }
            None => {
                let insert = format!(
                    "INSERT INTO contacts (phone_number, status) VALUES ($1, $2) RETURNING {CONTACT_COLUMNS}"
                );
                sqlx::query_as::<_, Contact>(&insert)
                    .bind(phone_number)
                    .bind(contact_status::PENDING)
                    .fetch_one(&mut *tx)
                    .await?
            }
        };

        tx.commit().await?;
        Ok(contact)
    }

    async fn list_contacts(&self) -> Result<Vec<Contact>> {
        let sql = format!("SELECT {CONTACT_COLUMNS} FROM contacts ORDER BY id");
        let contacts = sqlx::query_as::<_, Contact>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(contacts)
    }

    async fn next_pending_contact(&self) -> Result<Option<Contact>> {
        let dispatchable: Vec<String> = contact_status::DISPATCHABLE
            .iter()
            .map(|s| s.to_string())
            .collect();
        let sql = format!(
            "SELECT {CONTACT_COLUMNS} FROM contacts WHERE status = ANY($1) ORDER BY id LIMIT 1"
        );
        let contact = sqlx::query_as::<_, Contact>(&sql)
            .bind(&dispatchable)
            .fetch_optional(&self.pool)
            .await?;
        Ok(contact)
    }

    async fn in_progress_contact(&self) -> Result<Option<Contact>> {
        let sql = format!(
            "SELECT {CONTACT_COLUMNS} FROM contacts WHERE status = $1 ORDER BY id LIMIT 1"
        );
        let contact = sqlx::query_as::<_, Contact>(&sql)
            .bind(ContactStatus::InProgress.as_str())
            .fetch_optional(&self.pool)
            .await?;
        Ok(contact)
    }

    #[instrument(skip(self))]
    async fn claim_for_dispatch(&self, contact_id: i64) -> Result<ClaimOutcome> {
        let dispatchable: Vec<String> = contact_status::DISPATCHABLE
            .iter()
            .map(|s| s.to_string())
            .collect();
        let sql = format!(
            r#"
            UPDATE contacts SET status = $3, updated_at = NOW()
            WHERE id = $1 AND status = ANY($2)
            RETURNING {CONTACT_COLUMNS}
            "#
        );

        let claimed = sqlx::query_as::<_, Contact>(&sql)
            .bind(contact_id)
            .bind(&dispatchable)
            .bind(contact_status::IN_PROGRESS)
            .fetch_optional(&self.pool)
            .await;

        match claimed {
            Ok(Some(contact)) => Ok(ClaimOutcome::Claimed(contact)),
            Ok(None) => match self.find_contact(contact_id).await? {
                Some(contact) => Ok(ClaimOutcome::NotDispatchable(contact.status)),
                None => Ok(ClaimOutcome::NotFound),
            },
            Err(e) if is_unique_violation(&e) => {
                debug!(contact_id = contact_id, "Claim lost to a contact already in progress");
                Ok(ClaimOutcome::LineBusy)
            }
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip(self, event), fields(event = event.event_type()))]
    async fn transition_contact(
        &self,
        contact_id: i64,
        event: &ContactEvent,
        at: DateTime<Utc>,
    ) -> Result<Option<ContactTransition>> {
        let mut tx = self.pool.begin().await?;

        let select = format!("SELECT {CONTACT_COLUMNS} FROM contacts WHERE id = $1 FOR UPDATE");
        let Some(current) = sqlx::query_as::<_, Contact>(&select)
            .bind(contact_id)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };

        let target = ContactStateMachine::determine_target_state(&current.status, event)?;
        let stamp = event.stamps_last_called_at();

        let update = format!(
            r#"
            UPDATE contacts
            SET status = $2,
                last_called_at = CASE WHEN $3 THEN $4 ELSE last_called_at END,
                updated_at = $4
            WHERE id = $1
            RETURNING {CONTACT_COLUMNS}
            "#
        );
        let updated = sqlx::query_as::<_, Contact>(&update)
            .bind(contact_id)
            .bind(target.as_str())
            .bind(stamp)
            .bind(at)
            .fetch_one(&mut *tx)
            .await;

        let contact = match updated {
            Ok(contact) => contact,
            Err(e) if is_unique_violation(&e) => {
                warn!(contact_id = contact_id, "Transition would open a second line");
                return Err(StateMachineError::LineBusy.into());
            }
            Err(e) => return Err(e.into()),
        };

        tx.commit().await?;

        Ok(Some(ContactTransition {
            contact,
            from: current.status,
        }))
    }

    async fn find_stale_in_progress(&self, changed_before: DateTime<Utc>) -> Result<Vec<Contact>> {
        let sql = format!(
            "SELECT {CONTACT_COLUMNS} FROM contacts WHERE status = $1 AND updated_at < $2 ORDER BY id"
        );
        let contacts = sqlx::query_as::<_, Contact>(&sql)
            .bind(ContactStatus::InProgress.as_str())
            .bind(changed_before)
            .fetch_all(&self.pool)
            .await?;
        Ok(contacts)
    }

    async fn health_check(&self) -> Result<bool> {
        let row: (i32,) = sqlx::query_as("SELECT 1").fetch_one(&self.pool).await?;
        Ok(row.0 == 1)
    }
}

#[async_trait]
impl CallLogStore for PgDialerStore {
    async fn record_call_attempt(&self, attempt: NewCallAttempt) -> Result<CallAttempt> {
        let sql = format!(
            r#"
            INSERT INTO call_attempts
                (contact_id, status, provider_call_id, started_at, ended_at, duration_secs, error_message)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {ATTEMPT_COLUMNS}
            "#
        );
        let record = sqlx::query_as::<_, CallAttempt>(&sql)
            .bind(attempt.contact_id)
            .bind(&attempt.status)
            .bind(&attempt.provider_call_id)
            .bind(attempt.started_at)
            .bind(attempt.ended_at)
            .bind(attempt.duration_secs)
            .bind(&attempt.error_message)
            .fetch_one(&self.pool)
            .await?;
        Ok(record)
    }

    async fn call_attempts_for_contact(&self, contact_id: i64) -> Result<Vec<CallAttempt>> {
        let sql = format!(
            "SELECT {ATTEMPT_COLUMNS} FROM call_attempts WHERE contact_id = $1 ORDER BY id"
        );
        let attempts = sqlx::query_as::<_, CallAttempt>(&sql)
            .bind(contact_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(attempts)
    }

    async fn count_placements(&self, contact_id: i64) -> Result<i64> {
        let row: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM call_attempts WHERE contact_id = $1 AND status IN ($2, $3)",
        )
        .bind(contact_id)
        .bind(attempt_status::STARTED)
        .bind(attempt_status::ERROR)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.0)
    }

    async fn recent_call_log(&self, limit: i64) -> Result<Vec<CallLogEntry>> {
        let entries = sqlx::query_as::<_, CallLogEntry>(
            r#"
            SELECT ca.id, ca.contact_id, ca.status, ca.provider_call_id, ca.started_at,
                   ca.ended_at, ca.duration_secs, ca.error_message, ca.created_at,
                   c.phone_number
            FROM call_attempts ca
            INNER JOIN contacts c ON c.id = ca.contact_id
            ORDER BY ca.created_at DESC, ca.id DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(entries)
    }
}
