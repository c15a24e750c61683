//! Broker seams.
//!
//! The broker is infrastructure: at-least-once, partitioned, key-ordered
//! delivery. The write side sees only [`Producer`]; the projector sees only
//! [`Consumer`]. Implemented by `PgBroker` (postgres) and `MemoryBroker` (tests).

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::event::{EventDecodeError, TaskEvent};

/// A message read back from one topic partition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Delivery {
    pub topic: String,
    pub partition: u32,
    pub offset: i64,
    pub key: String,
    pub payload: serde_json::Value,
    pub ts: DateTime<Utc>,
}

impl Delivery {
    /// Decode the payload as a task change event and check it against the key.
    pub fn decode(&self) -> Result<TaskEvent, EventDecodeError> {
        let event = TaskEvent::from_payload(&self.payload)?;
        if event.partition_key() != self.key {
            return Err(EventDecodeError::KeyMismatch {
                key: self.key.clone(),
                id: event.id(),
            });
        }
        Ok(event)
    }
}

/// Where a sent message landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendReceipt {
    pub partition: u32,
    pub offset: i64,
}

/// Sending side of the broker.
#[async_trait]
pub trait Producer: Send + Sync {
    /// Append `payload` to the partition owned by `key`. Messages sent with the
    /// same key are delivered in send order.
    async fn send(&self, topic: &str, key: &str, payload: serde_json::Value) -> Result<SendReceipt>;
}

/// Receiving side of the broker, offset-based.
///
/// Offsets are per partition, start at 0 and have no gaps. A group's committed
/// offset is the next offset it wants; uncommitted messages are redelivered.
#[async_trait]
pub trait Consumer: Send + Sync {
    async fn partitions(&self, topic: &str) -> Result<u32>;

    /// Read up to `limit` messages starting at `from_offset` (inclusive).
    async fn fetch(
        &self,
        topic: &str,
        partition: u32,
        from_offset: i64,
        limit: usize,
    ) -> Result<Vec<Delivery>>;

    /// The next offset `group` has not yet acknowledged, or 0.
    async fn committed(&self, group: &str, topic: &str, partition: u32) -> Result<i64>;

    /// Acknowledge everything before `next_offset`.
    async fn commit(&self, group: &str, topic: &str, partition: u32, next_offset: i64)
        -> Result<()>;
}

// ---------------------------------------------------------------------------
// Arc<T> blankets, so tests can keep a handle on the broker
// ---------------------------------------------------------------------------

#[async_trait]
impl<T: Producer + ?Sized> Producer for Arc<T> {
    async fn send(&self, topic: &str, key: &str, payload: serde_json::Value) -> Result<SendReceipt> {
        (**self).send(topic, key, payload).await
    }
}

#[async_trait]
impl<T: Consumer + ?Sized> Consumer for Arc<T> {
    async fn partitions(&self, topic: &str) -> Result<u32> {
        (**self).partitions(topic).await
    }

    async fn fetch(
        &self,
        topic: &str,
        partition: u32,
        from_offset: i64,
        limit: usize,
    ) -> Result<Vec<Delivery>> {
        (**self).fetch(topic, partition, from_offset, limit).await
    }

    async fn committed(&self, group: &str, topic: &str, partition: u32) -> Result<i64> {
        (**self).committed(group, topic, partition).await
    }

    async fn commit(
        &self,
        group: &str,
        topic: &str,
        partition: u32,
        next_offset: i64,
    ) -> Result<()> {
        (**self).commit(group, topic, partition, next_offset).await
    }
}
