//! # Structured Logging Module
//!
//! Environment-aware structured logging for the dispatch chain. Console output
//! is either human readable or JSON; `RUST_LOG` overrides the configured level.

use crate::config::{LogFormat, LoggingConfig};
use chrono::Utc;
use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize structured logging once per process.
pub fn init_structured_logging(config: &LoggingConfig) {
    LOGGER_INITIALIZED.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(config.level.clone()));

        let layer = match config.format {
            LogFormat::Json => fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_level(true)
                .with_ansi(false)
                .json()
                .with_filter(filter)
                .boxed(),
            LogFormat::Pretty => fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_level(true)
                .with_ansi(true)
                .with_filter(filter)
                .boxed(),
        };

        // Embedding callers may already own the global subscriber.
        if tracing_subscriber::registry().with(layer).try_init().is_err() {
            tracing::debug!("Global tracing subscriber already initialized - continuing with existing subscriber");
        }

        tracing::info!(
            pid = std::process::id(),
            level = %config.level,
            format = ?config.format,
            "🔧 STRUCTURED LOGGING: Initialized"
        );
    });
}

/// Log one step of the dispatch chain for a contact.
pub fn log_dispatch_operation(
    operation: &str,
    contact_id: i64,
    status: &str,
    provider_call_id: Option<&str>,
    details: Option<&str>,
) {
    tracing::info!(
        operation = %operation,
        contact_id = contact_id,
        status = %status,
        provider_call_id = provider_call_id,
        details = details,
        timestamp = %Utc::now().to_rfc3339(),
        "📞 DISPATCH_OPERATION"
    );
}

/// Log a provider status callback as it was handled.
pub fn log_callback_operation(
    contact_id: Option<i64>,
    provider_call_id: Option<&str>,
    provider_status: &str,
    outcome: &str,
) {
    tracing::info!(
        contact_id = contact_id,
        provider_call_id = provider_call_id,
        provider_status = %provider_status,
        outcome = %outcome,
        timestamp = %Utc::now().to_rfc3339(),
        "📨 STATUS_CALLBACK"
    );
}
