use serde::{Deserialize, Serialize};

/// Events that move a contact between statuses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ContactEvent {
    /// A dispatch claimed the contact and is about to place the call
    Dispatch,
    /// The provider rejected the placement request
    PlacementFailed(String),
    /// The provider reported a terminal status for the call
    ProviderStatus(String),
    /// The call never reported back; `retry` decides between re-queue and failure
    StaleTimeout { retry: bool },
    /// Put the contact back into the queue (free-text trigger)
    Requeue,
}

impl ContactEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Dispatch => "dispatch",
            Self::PlacementFailed(_) => "placement_failed",
            Self::ProviderStatus(_) => "provider_status",
            Self::StaleTimeout { .. } => "stale_timeout",
            Self::Requeue => "requeue",
        }
    }

    /// Whether applying this event records a completed or failed attempt.
    pub fn stamps_last_called_at(&self) -> bool {
        matches!(
            self,
            Self::PlacementFailed(_) | Self::ProviderStatus(_) | Self::StaleTimeout { .. }
        )
    }
}
