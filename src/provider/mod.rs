//! # Call Placement
//!
//! The telephony provider seen as a remote capability: place a call, and
//! later deliver its status to a callback URL. Clients perform no retries;
//! a failed placement is reported once and the dispatcher moves on.

pub mod scripted;
pub mod twilio;
pub mod voice_prompt;

use crate::config::{EventSubscription, ProviderConfig, ProviderKind};
use crate::constants::provider_events;
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

pub use scripted::ScriptedCallClient;
pub use twilio::TwilioCallClient;
pub use voice_prompt::VoicePrompt;

/// Everything the provider needs to place one call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceCallRequest {
    pub to: String,
    pub prompt_url: String,
    pub status_callback_url: String,
    pub events: Vec<String>,
}

/// Transport, authentication or provider-side rejection of a placement.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{cause}")]
pub struct ProviderPlacementError {
    pub cause: String,
    pub http_status: Option<u16>,
}

impl ProviderPlacementError {
    pub fn new(cause: impl Into<String>) -> Self {
        Self {
            cause: cause.into(),
            http_status: None,
        }
    }

    pub fn with_status(cause: impl Into<String>, http_status: u16) -> Self {
        Self {
            cause: cause.into(),
            http_status: Some(http_status),
        }
    }
}

#[async_trait]
pub trait CallPlacementClient: Send + Sync {
    /// Place a call and return the provider's call id.
    async fn place(
        &self,
        request: &PlaceCallRequest,
    ) -> std::result::Result<String, ProviderPlacementError>;

    fn name(&self) -> &'static str;
}

impl EventSubscription {
    /// Provider event names to subscribe to for this mode.
    pub fn event_names(&self) -> Vec<String> {
        let names: &[&str] = match self {
            Self::TerminalOnly => &[provider_events::COMPLETED],
            Self::Lifecycle => &[
                provider_events::INITIATED,
                provider_events::RINGING,
                provider_events::ANSWERED,
                provider_events::COMPLETED,
            ],
        };
        names.iter().map(|name| name.to_string()).collect()
    }
}

/// Build the client selected by configuration.
pub fn build_client(config: &ProviderConfig) -> Result<Arc<dyn CallPlacementClient>> {
    let client: Arc<dyn CallPlacementClient> = match config.kind {
        ProviderKind::Twilio => Arc::new(TwilioCallClient::new(config)?),
        ProviderKind::DryRun => Arc::new(ScriptedCallClient::dry_run()),
    };
    Ok(client)
}
