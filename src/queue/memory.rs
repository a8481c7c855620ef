use super::{DispatchCommand, DispatchQueue};
use crate::error::Result;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::Notify;

/// Process-local FIFO queue. Commands are lost on restart.
#[derive(Debug, Default)]
pub struct InMemoryDispatchQueue {
    commands: Mutex<VecDeque<DispatchCommand>>,
    notify: Notify,
}

impl InMemoryDispatchQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of queued commands, oldest first.
    pub fn pending_commands(&self) -> Vec<DispatchCommand> {
        self.commands.lock().iter().cloned().collect()
    }
}

#[async_trait]
impl DispatchQueue for InMemoryDispatchQueue {
    async fn enqueue(&self, command: DispatchCommand) -> Result<()> {
        self.commands.lock().push_back(command);
        // notify_one stores a permit, so a waiter arriving later still wakes.
        self.notify.notify_one();
        Ok(())
    }

    async fn dequeue(&self) -> Result<Option<DispatchCommand>> {
        Ok(self.commands.lock().pop_front())
    }

    async fn wait_for_work(&self, timeout: Duration) {
        if !self.commands.lock().is_empty() {
            return;
        }
        let _ = tokio::time::timeout(timeout, self.notify.notified()).await;
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.commands.lock().len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::DispatchReason;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_fifo_order() {
        let queue = InMemoryDispatchQueue::new();
        queue
            .enqueue(DispatchCommand::new(1, DispatchReason::BatchStart))
            .await
            .unwrap();
        queue
            .enqueue(DispatchCommand::new(2, DispatchReason::StatusCallback))
            .await
            .unwrap();

        assert_eq!(queue.len().await.unwrap(), 2);
        assert_eq!(queue.dequeue().await.unwrap().unwrap().contact_id, 1);
        assert_eq!(queue.dequeue().await.unwrap().unwrap().contact_id, 2);
        assert!(queue.dequeue().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_wait_for_work_wakes_on_enqueue() {
        let queue = Arc::new(InMemoryDispatchQueue::new());
        let waiter = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move {
                queue.wait_for_work(Duration::from_secs(5)).await;
                queue.dequeue().await.unwrap()
            })
        };

        queue
            .enqueue(DispatchCommand::new(7, DispatchReason::FreeText))
            .await
            .unwrap();

        let command = waiter.await.unwrap().unwrap();
        assert_eq!(command.contact_id, 7);
    }

    #[tokio::test]
    async fn test_wait_for_work_times_out_when_idle() {
        let queue = InMemoryDispatchQueue::new();
        let started = std::time::Instant::now();
        queue.wait_for_work(Duration::from_millis(20)).await;
        assert!(started.elapsed() >= Duration::from_millis(20));
    }
}
