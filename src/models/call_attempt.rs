//! # Call Attempt Model
//!
//! Append-only audit trail of call placements and their outcomes.
//!
//! Maps to the `call_attempts` table:
//! ```sql
//! CREATE TABLE call_attempts (
//!   id BIGSERIAL PRIMARY KEY,
//!   contact_id BIGINT NOT NULL REFERENCES contacts(id),
//!   status VARCHAR NOT NULL,
//!   provider_call_id VARCHAR,
//!   started_at TIMESTAMPTZ,
//!   ended_at TIMESTAMPTZ,
//!   duration_secs INTEGER,
//!   error_message TEXT,
//!   created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//! ```
//!
//! Rows are never updated. A placed call produces a `started` row; the
//! terminal callback appends an outcome row carrying the same
//! `provider_call_id`. A `started` row with no outcome row is a call still in
//! flight.

use crate::constants::attempt_status;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct CallAttempt {
    pub id: i64,
    pub contact_id: i64,
    pub status: String,
    pub provider_call_id: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub duration_secs: Option<i32>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// New CallAttempt for creation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCallAttempt {
    pub contact_id: i64,
    pub status: String,
    pub provider_call_id: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub duration_secs: Option<i32>,
    pub error_message: Option<String>,
}

impl NewCallAttempt {
    fn blank(contact_id: i64, status: &str) -> Self {
        Self {
            contact_id,
            status: status.to_string(),
            provider_call_id: None,
            started_at: None,
            ended_at: None,
            duration_secs: None,
            error_message: None,
        }
    }

    /// The provider accepted the call.
    pub fn started(
        contact_id: i64,
        provider_call_id: impl Into<String>,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            provider_call_id: Some(provider_call_id.into()),
            started_at: Some(started_at),
            ..Self::blank(contact_id, attempt_status::STARTED)
        }
    }

    /// The provider rejected the placement request.
    pub fn error(contact_id: i64, error_message: impl Into<String>) -> Self {
        Self {
            error_message: Some(error_message.into()),
            ..Self::blank(contact_id, attempt_status::ERROR)
        }
    }

    /// The provider reported how the call ended.
    pub fn outcome(
        contact_id: i64,
        provider_status: impl Into<String>,
        provider_call_id: Option<String>,
        ended_at: DateTime<Utc>,
        duration_secs: Option<i32>,
    ) -> Self {
        Self {
            status: provider_status.into(),
            provider_call_id,
            ended_at: Some(ended_at),
            duration_secs,
            ..Self::blank(contact_id, "")
        }
    }

    /// The call never reported back and was reclaimed by the sweep.
    pub fn timeout(contact_id: i64, ended_at: DateTime<Utc>, stale_for_secs: i64) -> Self {
        Self {
            ended_at: Some(ended_at),
            error_message: Some(format!(
                "No terminal status received after {stale_for_secs}s"
            )),
            ..Self::blank(contact_id, attempt_status::TIMEOUT)
        }
    }
}

/// Audit log row joined with its contact's phone number, newest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct CallLogEntry {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub attempt: CallAttempt,
    pub phone_number: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors_set_expected_fields() {
        let now = Utc::now();

        let started = NewCallAttempt::started(7, "CA123", now);
        assert_eq!(started.status, "started");
        assert_eq!(started.provider_call_id.as_deref(), Some("CA123"));
        assert_eq!(started.started_at, Some(now));
        assert!(started.error_message.is_none());

        let error = NewCallAttempt::error(7, "401 Unauthorized");
        assert_eq!(error.status, "error");
        assert_eq!(error.error_message.as_deref(), Some("401 Unauthorized"));
        assert!(error.provider_call_id.is_none());

        let outcome = NewCallAttempt::outcome(7, "busy", Some("CA123".into()), now, Some(0));
        assert_eq!(outcome.status, "busy");
        assert_eq!(outcome.ended_at, Some(now));
        assert_eq!(outcome.duration_secs, Some(0));

        let timeout = NewCallAttempt::timeout(7, now, 900);
        assert_eq!(timeout.status, "timeout");
        assert!(timeout.error_message.unwrap().contains("900s"));
    }
}
