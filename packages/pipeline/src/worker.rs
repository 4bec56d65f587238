//! The generic poll/process/acknowledge loop every stage runs.
//!
//! One message at a time: claim, dispatch to the stage handler, publish
//! whatever the handler produced, then delete the inbound message. Any
//! error that survives the bounded retry ends the process; the broker's
//! ack window redelivers the message to the next worker.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::error::{FailureKind, PipelineError};
use crate::queue::{Delivery, MessageBroker};

/// A message bound for another queue, produced by a stage handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub queue: String,
    pub body: String,
}

impl OutboundMessage {
    pub fn new(queue: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            queue: queue.into(),
            body: body.into(),
        }
    }
}

/// Stage-specific message processing.
///
/// Implementations perform their own persistence; outbound messages are
/// published by the harness after the handler returns. Handlers must be
/// idempotent: redelivery after a crash means the same body can arrive
/// more than once.
#[async_trait]
pub trait StageHandler: Send + Sync {
    fn stage_name(&self) -> &'static str;

    async fn handle(&self, body: &str) -> Result<Vec<OutboundMessage>, PipelineError>;
}

/// Attempts per message before a retryable failure propagates and the
/// broker takes over redelivery.
const MAX_HANDLER_ATTEMPTS: u32 = 3;
const RETRY_BASE_DELAY: Duration = Duration::from_millis(500);

pub struct Worker {
    broker: Arc<dyn MessageBroker>,
    handler: Arc<dyn StageHandler>,
    inbound_queue: String,
    poll_interval: Duration,
}

impl Worker {
    pub fn new(
        broker: Arc<dyn MessageBroker>,
        handler: Arc<dyn StageHandler>,
        inbound_queue: impl Into<String>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            broker,
            handler,
            inbound_queue: inbound_queue.into(),
            poll_interval,
        }
    }

    /// Run until an unrecoverable error. Process exit is the retry
    /// mechanism of last resort; a supervisor restarts the worker and the
    /// broker redelivers the unacked message.
    pub async fn run(&self) -> Result<(), PipelineError> {
        info!(
            stage = self.handler.stage_name(),
            queue = %self.inbound_queue,
            "worker started"
        );
        loop {
            if !self.process_one().await? {
                debug!(queue = %self.inbound_queue, "queue empty");
                tokio::time::sleep(self.poll_interval).await;
            }
        }
    }

    /// One poll iteration: claim, process, acknowledge. Returns `false`
    /// when the queue was empty.
    pub async fn process_one(&self) -> Result<bool, PipelineError> {
        let Some(delivery) = self.broker.receive(&self.inbound_queue).await? else {
            return Ok(false);
        };

        let outbound = self.handle_with_retry(&delivery).await?;
        for message in &outbound {
            self.broker.send(&message.queue, &message.body).await?;
        }

        let confirmation = self.broker.delete(&self.inbound_queue, &delivery).await?;
        if confirmation.message_id != delivery.id {
            return Err(PipelineError::AckMismatch {
                expected: delivery.id.clone(),
                confirmed: confirmation.message_id,
            });
        }

        debug!(
            stage = self.handler.stage_name(),
            message_id = %delivery.id,
            outbound = outbound.len(),
            "message processed"
        );
        Ok(true)
    }

    async fn handle_with_retry(
        &self,
        delivery: &Delivery,
    ) -> Result<Vec<OutboundMessage>, PipelineError> {
        let mut attempt = 1;
        loop {
            match self.handler.handle(&delivery.body).await {
                Ok(outbound) => return Ok(outbound),
                Err(err)
                    if err.failure_kind() == FailureKind::Retryable
                        && attempt < MAX_HANDLER_ATTEMPTS =>
                {
                    let delay = RETRY_BASE_DELAY * 2u32.pow(attempt - 1);
                    warn!(
                        stage = self.handler.stage_name(),
                        message_id = %delivery.id,
                        attempt,
                        error = %err,
                        "retryable failure; backing off"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    error!(
                        stage = self.handler.stage_name(),
                        message_id = %delivery.id,
                        error = %err,
                        "handler failed; leaving message for redelivery"
                    );
                    return Err(err);
                }
            }
        }
    }
}
