use crate::constants::{contact_status, INTERIM_PROVIDER_STATUSES};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Contact status as stored in the `contacts.status` column.
///
/// The dispatcher owns `pending`, `in_progress`, `retry` and `failed`. Every
/// other string is a provider terminal status (`completed`, `busy`,
/// `no-answer`, ...) kept verbatim in [`ContactStatus::Provider`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ContactStatus {
    /// Waiting in the queue
    Pending,
    /// A call is in flight for this contact
    InProgress,
    /// Waiting to be re-dialed after a stalled call
    Retry,
    /// Placement failed or the call never reported back
    Failed,
    /// Terminal status reported by the provider, passed through untouched
    Provider(String),
}

impl ContactStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => contact_status::PENDING,
            Self::InProgress => contact_status::IN_PROGRESS,
            Self::Retry => contact_status::RETRY,
            Self::Failed => contact_status::FAILED,
            Self::Provider(status) => status.as_str(),
        }
    }

    /// Whether a dispatch may claim a contact in this status.
    pub fn is_dispatchable(&self) -> bool {
        matches!(self, Self::Pending | Self::Retry)
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Self::InProgress)
    }

    /// Anything other than `pending`, `retry` or `in_progress`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Failed | Self::Provider(_))
    }
}

impl Default for ContactStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl fmt::Display for ContactStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for ContactStatus {
    fn from(s: &str) -> Self {
        match s {
            contact_status::PENDING => Self::Pending,
            contact_status::IN_PROGRESS => Self::InProgress,
            contact_status::RETRY => Self::Retry,
            contact_status::FAILED => Self::Failed,
            other => Self::Provider(other.to_string()),
        }
    }
}

impl From<String> for ContactStatus {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl From<ContactStatus> for String {
    fn from(status: ContactStatus) -> Self {
        match status {
            ContactStatus::Provider(s) => s,
            other => other.as_str().to_string(),
        }
    }
}

/// How the dispatcher reads a status string delivered by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderStatusKind {
    /// The call is still ringing or connected
    Interim,
    /// The call is over; the string becomes the contact's status
    Terminal,
}

impl ProviderStatusKind {
    pub fn classify(provider_status: &str) -> Self {
        let normalized = provider_status.trim().to_ascii_lowercase();
        if INTERIM_PROVIDER_STATUSES.contains(&normalized.as_str()) {
            Self::Interim
        } else {
            Self::Terminal
        }
    }
}
