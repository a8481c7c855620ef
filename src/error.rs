//! Error types for the autodialer.
//!
//! The dispatch chain absorbs provider failures into state transitions, so most
//! variants here only surface at the synchronous entry points or in logs.

use crate::provider::ProviderPlacementError;
use crate::state_machine::StateMachineError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DialerError {
    #[error("Contact {0} not found")]
    ContactNotFound(i64),
    #[error("Call placement failed: {0}")]
    ProviderPlacement(#[from] ProviderPlacementError),
    #[error("{0}")]
    MalformedInput(String),
    #[error("Database error: {0}")]
    Database(String),
    #[error("Queue error: {0}")]
    Queue(String),
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("State machine error: {0}")]
    StateMachine(#[from] StateMachineError),
}

impl DialerError {
    /// Whether the error is a benign "nothing to act on" condition at the boundary.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ContactNotFound(_))
    }
}

impl From<sqlx::Error> for DialerError {
    fn from(err: sqlx::Error) -> Self {
        DialerError::Database(err.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for DialerError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DialerError::Database(format!("Migration failed: {err}"))
    }
}

impl From<config::ConfigError> for DialerError {
    fn from(err: config::ConfigError) -> Self {
        DialerError::Configuration(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DialerError>;
