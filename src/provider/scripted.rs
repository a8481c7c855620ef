//! In-process placement client.
//!
//! Records every request and answers from a script of results. With an empty
//! script every call is accepted, which is how the `dry_run` provider works.

use super::{CallPlacementClient, PlaceCallRequest, ProviderPlacementError};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use tracing::debug;
use uuid::Uuid;

type PlacementResult = Result<String, ProviderPlacementError>;

#[derive(Debug, Default)]
pub struct ScriptedCallClient {
    script: Mutex<VecDeque<PlacementResult>>,
    requests: Mutex<Vec<PlaceCallRequest>>,
}

impl ScriptedCallClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accepts every call with a generated call id.
    pub fn dry_run() -> Self {
        Self::default()
    }

    /// Queue the result for the next unscripted placement.
    pub fn push_result(&self, result: PlacementResult) {
        self.script.lock().push_back(result);
    }

    pub fn push_success(&self, provider_call_id: impl Into<String>) {
        self.push_result(Ok(provider_call_id.into()));
    }

    pub fn push_failure(&self, cause: impl Into<String>) {
        self.push_result(Err(ProviderPlacementError::new(cause)));
    }

    /// Requests seen so far, oldest first.
    pub fn requests(&self) -> Vec<PlaceCallRequest> {
        self.requests.lock().clone()
    }

    pub fn placed_numbers(&self) -> Vec<String> {
        self.requests.lock().iter().map(|r| r.to.clone()).collect()
    }
}

#[async_trait]
impl CallPlacementClient for ScriptedCallClient {
    async fn place(&self, request: &PlaceCallRequest) -> PlacementResult {
        self.requests.lock().push(request.clone());
        let result = self
            .script
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(format!("DRY{}", Uuid::new_v4().simple())));
        debug!(to = %request.to, ok = result.is_ok(), "Scripted call placement");
        result
    }

    fn name(&self) -> &'static str {
        "dry_run"
    }
}
