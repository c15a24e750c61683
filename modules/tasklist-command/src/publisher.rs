//! Hands change events to the broker.

use async_trait::async_trait;
use tracing::info;

use tasklist_events::{Producer, TaskEvent, TASK_EVENTS_TOPIC};

use crate::error::PublishError;

#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Send one event, keyed by its task id.
    async fn publish(&self, event: &TaskEvent) -> Result<(), PublishError>;
}

/// Publishes to a broker topic, using the task id as the partition key.
pub struct BrokerPublisher<P> {
    producer: P,
    topic: String,
}

impl<P: Producer> BrokerPublisher<P> {
    pub fn new(producer: P) -> Self {
        Self {
            producer,
            topic: TASK_EVENTS_TOPIC.to_string(),
        }
    }
}

#[async_trait]
impl<P: Producer> EventPublisher for BrokerPublisher<P> {
    async fn publish(&self, event: &TaskEvent) -> Result<(), PublishError> {
        let id = event.id();
        let kind = event.kind();

        let payload = event
            .to_payload()
            .map_err(|source| PublishError::Encode { id, kind, source })?;

        let receipt = self
            .producer
            .send(&self.topic, &event.partition_key(), payload)
            .await
            .map_err(|e| PublishError::Rejected {
                id,
                kind,
                source: e.into(),
            })?;

        info!(
            task_id = id,
            %kind,
            topic = %self.topic,
            partition = receipt.partition,
            offset = receipt.offset,
            "Event sent"
        );
        Ok(())
    }
}
