//! # Web API Application State
//!
//! Shared handles for the HTTP handlers: the trigger and callback components,
//! the store for read-only snapshots and the rendered voice prompt.

use crate::orchestration::{BatchTrigger, StatusCallbackHandler};
use crate::provider::VoicePrompt;
use crate::queue::DispatchQueue;
use crate::store::DialerStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub trigger: Arc<BatchTrigger>,
    pub callbacks: Arc<StatusCallbackHandler>,
    pub store: Arc<dyn DialerStore>,
    pub queue: Arc<dyn DispatchQueue>,
    pub voice_prompt: Arc<VoicePrompt>,
    pub environment: String,
}
