//! In-memory broker for tests and single-process runs.
//!
//! Mirrors the production semantics the harness depends on: single
//! delivery per receive, redelivery once a claimed message's visibility
//! window expires, and delete confirmations naming the removed message.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use uuid::Uuid;

use super::{DeleteConfirmation, Delivery, MessageBroker};
use crate::error::PipelineError;

#[derive(Debug, Clone)]
struct StoredMessage {
    id: String,
    body: String,
}

#[derive(Debug)]
struct InFlight {
    message: StoredMessage,
    deadline: Instant,
}

#[derive(Debug, Default)]
struct QueueState {
    ready: VecDeque<StoredMessage>,
    in_flight: HashMap<String, InFlight>,
}

#[derive(Debug)]
pub struct MemoryBroker {
    queues: Mutex<HashMap<String, QueueState>>,
    visibility_timeout: Duration,
}

impl MemoryBroker {
    pub fn new() -> Self {
        Self::with_visibility_timeout(Duration::from_secs(30))
    }

    pub fn with_visibility_timeout(visibility_timeout: Duration) -> Self {
        Self {
            queues: Mutex::new(HashMap::new()),
            visibility_timeout,
        }
    }

    /// Messages currently waiting in a queue (claimed ones excluded).
    pub fn ready_len(&self, queue: &str) -> usize {
        self.lock()
            .get(queue)
            .map(|state| state.ready.len())
            .unwrap_or(0)
    }

    /// Bodies currently waiting in a queue, in delivery order.
    pub fn ready_bodies(&self, queue: &str) -> Vec<String> {
        self.lock()
            .get(queue)
            .map(|state| state.ready.iter().map(|m| m.body.clone()).collect())
            .unwrap_or_default()
    }

    pub fn in_flight_len(&self, queue: &str) -> usize {
        self.lock()
            .get(queue)
            .map(|state| state.in_flight.len())
            .unwrap_or(0)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, QueueState>> {
        self.queues
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for MemoryBroker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageBroker for MemoryBroker {
    async fn send(&self, queue: &str, body: &str) -> Result<(), PipelineError> {
        let mut queues = self.lock();
        queues
            .entry(queue.to_string())
            .or_default()
            .ready
            .push_back(StoredMessage {
                id: Uuid::new_v4().to_string(),
                body: body.to_string(),
            });
        Ok(())
    }

    async fn receive(&self, queue: &str) -> Result<Option<Delivery>, PipelineError> {
        let mut queues = self.lock();
        let state = queues.entry(queue.to_string()).or_default();

        // Expired claims become visible again.
        let now = Instant::now();
        let expired: Vec<String> = state
            .in_flight
            .iter()
            .filter(|(_, claim)| claim.deadline <= now)
            .map(|(receipt, _)| receipt.clone())
            .collect();
        for receipt in expired {
            if let Some(claim) = state.in_flight.remove(&receipt) {
                state.ready.push_back(claim.message);
            }
        }

        let Some(message) = state.ready.pop_front() else {
            return Ok(None);
        };
        let receipt = Uuid::new_v4().to_string();
        let delivery = Delivery {
            id: message.id.clone(),
            receipt: receipt.clone(),
            body: message.body.clone(),
        };
        state.in_flight.insert(
            receipt,
            InFlight {
                message,
                deadline: now + self.visibility_timeout,
            },
        );
        Ok(Some(delivery))
    }

    async fn delete(
        &self,
        queue: &str,
        delivery: &Delivery,
    ) -> Result<DeleteConfirmation, PipelineError> {
        let mut queues = self.lock();
        let state = queues.entry(queue.to_string()).or_default();
        let claim = state.in_flight.remove(&delivery.receipt).ok_or_else(|| {
            PipelineError::Queue(format!(
                "no in-flight message for receipt {} on queue {}",
                delivery.receipt, queue
            ))
        })?;
        Ok(DeleteConfirmation {
            message_id: claim.message.id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn delivers_each_message_once_until_acked() {
        let broker = MemoryBroker::new();
        broker.send("q", "one").await.unwrap();

        let delivery = broker.receive("q").await.unwrap().unwrap();
        assert_eq!(delivery.body, "one");
        // Claimed, so a second receive sees an empty queue.
        assert!(broker.receive("q").await.unwrap().is_none());

        let confirmation = broker.delete("q", &delivery).await.unwrap();
        assert_eq!(confirmation.message_id, delivery.id);
        assert_eq!(broker.in_flight_len("q"), 0);
    }

    #[tokio::test]
    async fn unacked_messages_redeliver_after_the_visibility_window() {
        let broker = MemoryBroker::with_visibility_timeout(Duration::ZERO);
        broker.send("q", "again").await.unwrap();

        let first = broker.receive("q").await.unwrap().unwrap();
        let second = broker.receive("q").await.unwrap().unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.body, "again");
        // Receipts are per-delivery; the stale one no longer acks.
        assert!(broker.delete("q", &first).await.is_err());
        assert!(broker.delete("q", &second).await.is_ok());
    }

    #[tokio::test]
    async fn empty_queue_yields_none() {
        let broker = MemoryBroker::new();
        assert!(broker.receive("q").await.unwrap().is_none());
    }
}
