//! Shared constants for statuses, provider events and defaults.

/// Contact status strings owned by the dispatcher. Provider terminal statuses
/// are stored verbatim alongside these.
pub mod contact_status {
    pub const PENDING: &str = "pending";
    pub const IN_PROGRESS: &str = "in_progress";
    pub const RETRY: &str = "retry";
    pub const FAILED: &str = "failed";

    /// Statuses from which a dispatch may claim the contact.
    pub const DISPATCHABLE: &[&str] = &[PENDING, RETRY];
}

/// Audit log statuses written by the dispatcher itself.
pub mod attempt_status {
    pub const STARTED: &str = "started";
    pub const ERROR: &str = "error";
    pub const TIMEOUT: &str = "timeout";
}

/// Provider call statuses that describe a call still in flight.
///
/// These arrive only when the lifecycle event subscription is enabled, and
/// never close a call.
pub const INTERIM_PROVIDER_STATUSES: &[&str] =
    &["queued", "initiated", "ringing", "in-progress", "answered"];

/// Provider status-callback event names.
pub mod provider_events {
    pub const INITIATED: &str = "initiated";
    pub const RINGING: &str = "ringing";
    pub const ANSWERED: &str = "answered";
    pub const COMPLETED: &str = "completed";
}

pub mod defaults {
    pub const COUNTRY_CODE: &str = "91";
    pub const VOICE_PROMPT_MESSAGE: &str =
        "Hello, this is a test call from your autodialer. Have a nice day.";
    pub const VOICE: &str = "Polly.Aditi";
    pub const STATUS_PATH: &str = "/calls/status";
    pub const PROMPT_PATH: &str = "/calls/twiml";
    pub const TWILIO_API_BASE_URL: &str = "https://api.twilio.com";
    pub const RECENT_CALL_LOG_LIMIT: i64 = 20;
}

/// Messages returned to whoever pressed the button.
pub mod user_messages {
    pub const NO_PENDING_CONTACTS: &str = "No pending contacts.";
    pub const NO_PHONE_NUMBER_FOUND: &str = "Could not find a phone number in your prompt.";
}
