//! Message broker abstraction for the stage queues.
//!
//! Delivery is at-least-once: a claimed message that is never deleted
//! becomes visible again after the broker's ack window, so stage handlers
//! must be idempotent. The trait keeps the harness and tests off the wire
//! library.

mod jetstream;
mod memory;

pub use jetstream::JetStreamBroker;
pub use memory::MemoryBroker;

use async_trait::async_trait;

use crate::error::PipelineError;

/// A message claimed from a queue, held until acknowledged.
#[derive(Debug, Clone)]
pub struct Delivery {
    /// Broker-assigned message identifier.
    pub id: String,
    /// Opaque receipt required to acknowledge exactly this delivery.
    pub receipt: String,
    pub body: String,
}

/// Broker confirmation that a delete was applied.
///
/// The confirmed id must match the claimed message's id; the harness
/// treats a mismatch as a broker protocol violation.
#[derive(Debug, Clone)]
pub struct DeleteConfirmation {
    pub message_id: String,
}

#[async_trait]
pub trait MessageBroker: Send + Sync {
    async fn send(&self, queue: &str, body: &str) -> Result<(), PipelineError>;

    /// Claim at most one message; `None` when the queue is empty.
    async fn receive(&self, queue: &str) -> Result<Option<Delivery>, PipelineError>;

    /// Delete a claimed message, confirming which message was removed.
    async fn delete(
        &self,
        queue: &str,
        delivery: &Delivery,
    ) -> Result<DeleteConfirmation, PipelineError>;
}
