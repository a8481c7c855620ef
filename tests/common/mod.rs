//! Shared harness: a fully wired dialer over the in-memory store, the
//! in-memory queue and the scripted placement client.

#![allow(dead_code)]

use autodialer::config::{DialerConfig, QueueKind};
use autodialer::models::{CallAttempt, Contact};
use autodialer::orchestration::{CallbackOutcome, DialerSystem, DispatchWorker, StatusReport};
use autodialer::provider::ScriptedCallClient;
use autodialer::queue::InMemoryDispatchQueue;
use autodialer::store::{CallLogStore, ContactStore, InMemoryDialerStore};
use std::sync::Arc;

pub const PUBLIC_HOST: &str = "https://dialer.test";

pub fn test_config() -> DialerConfig {
    let mut config = DialerConfig::default();
    config.environment = "test".to_string();
    config.dispatch.queue = QueueKind::Memory;
    config.callbacks.public_host = PUBLIC_HOST.to_string();
    config
}

pub struct TestDialer {
    pub store: Arc<InMemoryDialerStore>,
    pub queue: Arc<InMemoryDispatchQueue>,
    pub client: Arc<ScriptedCallClient>,
    pub system: DialerSystem,
}

impl TestDialer {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: DialerConfig) -> Self {
        let store = Arc::new(InMemoryDialerStore::new());
        let queue = Arc::new(InMemoryDispatchQueue::new());
        let client = Arc::new(ScriptedCallClient::new());
        let system = DialerSystem::from_parts(config, store.clone(), queue.clone(), client.clone());
        Self {
            store,
            queue,
            client,
            system,
        }
    }

    /// Seed `pending` contacts and return their ids in order.
    pub fn seed(&self, phone_numbers: &[&str]) -> Vec<i64> {
        self.store
            .seed(phone_numbers.iter().copied())
            .into_iter()
            .map(|c| c.id)
            .collect()
    }

    pub fn worker(&self) -> DispatchWorker {
        self.system.worker()
    }

    /// Run the dispatch worker until the queue is empty.
    pub async fn drain(&self) -> usize {
        self.worker().drain().await.expect("queue drains")
    }

    pub async fn contact(&self, contact_id: i64) -> Contact {
        self.store
            .find_contact(contact_id)
            .await
            .expect("store reachable")
            .expect("contact exists")
    }

    pub async fn attempts(&self, contact_id: i64) -> Vec<CallAttempt> {
        self.store
            .call_attempts_for_contact(contact_id)
            .await
            .expect("store reachable")
    }

    pub async fn callback(&self, contact_id: i64, provider_status: &str) -> CallbackOutcome {
        self.system
            .callbacks
            .on_status(StatusReport::new(contact_id, provider_status))
            .await
    }

    /// Provider call id of the most recent `started` attempt for a contact.
    pub async fn last_call_id(&self, contact_id: i64) -> Option<String> {
        self.attempts(contact_id)
            .await
            .into_iter()
            .rev()
            .find(|a| a.status == "started")
            .and_then(|a| a.provider_call_id)
    }
}
