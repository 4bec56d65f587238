//! JetStream-backed broker.
//!
//! Each queue maps to one stream with a single subject and a durable pull
//! consumer. Explicit acks with a bounded ack window supply the
//! visibility-timeout redelivery the harness relies on; a worker that
//! dies mid-message simply lets the ack window lapse.

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use std::time::Duration;

use super::{DeleteConfirmation, Delivery, MessageBroker};
use crate::error::PipelineError;

/// How long a claimed message stays invisible before redelivery.
const ACK_WAIT: Duration = Duration::from_secs(60);

/// How long one receive waits for a message before reporting empty.
const RECEIVE_TIMEOUT: Duration = Duration::from_secs(2);

pub struct JetStreamBroker {
    client: async_nats::Client,
    context: async_nats::jetstream::Context,
}

impl JetStreamBroker {
    pub async fn connect(url: &str) -> Result<Self, PipelineError> {
        let client = async_nats::connect(url)
            .await
            .map_err(|err| PipelineError::Queue(err.to_string()))?;
        let context = async_nats::jetstream::new(client.clone());
        Ok(Self { client, context })
    }

    /// Create the stream backing a queue if it does not exist yet.
    pub async fn provision(&self, queue: &str) -> Result<(), PipelineError> {
        self.context
            .get_or_create_stream(async_nats::jetstream::stream::Config {
                name: queue.to_string(),
                subjects: vec![queue.to_string()],
                ..Default::default()
            })
            .await
            .map_err(|err| PipelineError::Queue(err.to_string()))?;
        Ok(())
    }

    async fn consumer(
        &self,
        queue: &str,
    ) -> Result<
        async_nats::jetstream::consumer::Consumer<async_nats::jetstream::consumer::pull::Config>,
        PipelineError,
    > {
        let stream = self
            .context
            .get_stream(queue)
            .await
            .map_err(|err| PipelineError::Queue(err.to_string()))?;
        let durable = format!("{queue}-worker");
        stream
            .get_or_create_consumer(
                &durable,
                async_nats::jetstream::consumer::pull::Config {
                    durable_name: Some(durable.clone()),
                    ack_policy: async_nats::jetstream::consumer::AckPolicy::Explicit,
                    ack_wait: ACK_WAIT,
                    ..Default::default()
                },
            )
            .await
            .map_err(|err| PipelineError::Queue(err.to_string()))
    }
}

/// Stream sequence encoded in an ack reply subject
/// (`$JS.ACK.<stream>.<consumer>.<delivered>.<stream-seq>...`).
fn receipt_sequence(receipt: &str) -> Option<&str> {
    receipt.split('.').nth(5)
}

#[async_trait]
impl MessageBroker for JetStreamBroker {
    async fn send(&self, queue: &str, body: &str) -> Result<(), PipelineError> {
        self.context
            .publish(queue.to_string(), Bytes::from(body.to_string()))
            .await
            .map_err(|err| PipelineError::Queue(err.to_string()))?
            .await
            .map_err(|err| PipelineError::Queue(err.to_string()))?;
        Ok(())
    }

    async fn receive(&self, queue: &str) -> Result<Option<Delivery>, PipelineError> {
        let consumer = self.consumer(queue).await?;
        let mut batch = consumer
            .fetch()
            .max_messages(1)
            .expires(RECEIVE_TIMEOUT)
            .messages()
            .await
            .map_err(|err| PipelineError::Queue(err.to_string()))?;

        let Some(message) = batch.next().await else {
            return Ok(None);
        };
        let message = message.map_err(|err| PipelineError::Queue(err.to_string()))?;

        let info = message
            .info()
            .map_err(|err| PipelineError::Queue(err.to_string()))?;
        let receipt = message
            .reply
            .as_ref()
            .ok_or_else(|| PipelineError::Queue("delivery carried no reply subject".to_string()))?
            .to_string();

        Ok(Some(Delivery {
            id: info.stream_sequence.to_string(),
            receipt,
            body: String::from_utf8_lossy(&message.payload).into_owned(),
        }))
    }

    async fn delete(
        &self,
        queue: &str,
        delivery: &Delivery,
    ) -> Result<DeleteConfirmation, PipelineError> {
        // Request/reply ack so the server confirms it was applied before
        // we report the message gone.
        self.client
            .request(delivery.receipt.clone(), Bytes::from_static(b"+ACK"))
            .await
            .map_err(|err| {
                PipelineError::Queue(format!("ack failed on queue {queue}: {err}"))
            })?;

        let confirmed = receipt_sequence(&delivery.receipt).ok_or_else(|| {
            PipelineError::Queue(format!("unparseable ack receipt: {}", delivery.receipt))
        })?;
        Ok(DeleteConfirmation {
            message_id: confirmed.to_string(),
        })
    }
}
