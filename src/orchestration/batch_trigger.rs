//! Entry points that seed the dispatch chain.

use super::types::TriggerOutcome;
use crate::constants::user_messages;
use crate::error::{DialerError, Result};
use crate::phone::extract_phone_number;
use crate::queue::{DispatchCommand, DispatchQueue, DispatchReason};
use crate::store::DialerStore;
use std::sync::Arc;
use tracing::{info, instrument};

pub struct BatchTrigger {
    store: Arc<dyn DialerStore>,
    queue: Arc<dyn DispatchQueue>,
    default_country_code: String,
}

impl BatchTrigger {
    pub fn new(
        store: Arc<dyn DialerStore>,
        queue: Arc<dyn DispatchQueue>,
        default_country_code: impl Into<String>,
    ) -> Self {
        Self {
            store,
            queue,
            default_country_code: default_country_code.into(),
        }
    }

    /// Enqueue the first pending contact.
    #[instrument(skip(self))]
    pub async fn start_batch(&self) -> Result<TriggerOutcome> {
        let Some(contact) = self.store.next_pending_contact().await? else {
            info!("Batch start requested with no pending contacts");
            return Ok(TriggerOutcome::NoPendingContacts);
        };

        self.queue
            .enqueue(DispatchCommand::new(contact.id, DispatchReason::BatchStart))
            .await?;
        info!(contact_id = contact.id, phone_number = %contact.phone_number, "🚀 Batch started");
        Ok(TriggerOutcome::Started { contact })
    }

    /// Pull a phone number out of free text, find or create its contact as
    /// `pending` and enqueue it.
    #[instrument(skip(self, text))]
    pub async fn start_from_text(&self, text: &str) -> Result<TriggerOutcome> {
        let phone_number = extract_phone_number(text, &self.default_country_code).ok_or_else(
            || DialerError::MalformedInput(user_messages::NO_PHONE_NUMBER_FOUND.to_string()),
        )?;

        let contact = self.store.find_or_requeue_by_phone(&phone_number).await?;
        self.queue
            .enqueue(DispatchCommand::new(contact.id, DispatchReason::FreeText))
            .await?;
        info!(contact_id = contact.id, phone_number = %contact.phone_number, "🚀 Prompted call queued");
        Ok(TriggerOutcome::Prompted { contact })
    }
}
