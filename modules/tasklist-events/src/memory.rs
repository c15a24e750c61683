//! MemoryBroker: in-process partitioned log for tests. No database required.
//!
//! Same delivery model as the durable broker: per-partition offsets, committed
//! offsets per consumer group, redelivery of anything not committed. Adds knobs
//! for failure injection and for simulating a consumer that restarts from an
//! older offset.

use std::collections::HashMap;

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use crate::broker::{Consumer, Delivery, Producer, SendReceipt};
use crate::channel::partition_for;

pub struct MemoryBroker {
    partitions: u32,
    state: Mutex<BrokerState>,
}

#[derive(Default)]
struct BrokerState {
    /// topic -> one log per partition
    logs: HashMap<String, Vec<Vec<Delivery>>>,
    /// (group, topic, partition) -> next offset
    offsets: HashMap<(String, String, u32), i64>,
    failing_sends: usize,
}

impl MemoryBroker {
    pub fn new(partitions: u32) -> Self {
        Self {
            partitions: partitions.max(1),
            state: Mutex::new(BrokerState::default()),
        }
    }

    /// Reject the next `n` sends, as a broker that is down or timing out would.
    pub async fn fail_next_sends(&self, n: usize) {
        self.state.lock().await.failing_sends = n;
    }

    /// Every message on `topic`, partition by partition, in offset order.
    pub async fn messages(&self, topic: &str) -> Vec<Delivery> {
        let state = self.state.lock().await;
        state
            .logs
            .get(topic)
            .map(|logs| logs.iter().flatten().cloned().collect())
            .unwrap_or_default()
    }

    /// Move a group's committed offset backwards, as after a consumer crash
    /// that lost its acknowledgements. Everything from `offset` is redelivered.
    pub async fn rewind(&self, group: &str, topic: &str, partition: u32, offset: i64) {
        let mut state = self.state.lock().await;
        state
            .offsets
            .insert((group.to_string(), topic.to_string(), partition), offset.max(0));
    }
}

impl Default for MemoryBroker {
    fn default() -> Self {
        Self::new(crate::channel::DEFAULT_PARTITIONS)
    }
}

#[async_trait]
impl Producer for MemoryBroker {
    async fn send(&self, topic: &str, key: &str, payload: serde_json::Value) -> Result<SendReceipt> {
        let mut state = self.state.lock().await;
        if state.failing_sends > 0 {
            state.failing_sends -= 1;
            bail!("broker unavailable");
        }

        let partition = partition_for(key, self.partitions);
        let logs = state
            .logs
            .entry(topic.to_string())
            .or_insert_with(|| vec![Vec::new(); self.partitions as usize]);
        let log = &mut logs[partition as usize];
        let offset = log.len() as i64;

        log.push(Delivery {
            topic: topic.to_string(),
            partition,
            offset,
            key: key.to_string(),
            payload,
            ts: Utc::now(),
        });

        Ok(SendReceipt { partition, offset })
    }
}

#[async_trait]
impl Consumer for MemoryBroker {
    async fn partitions(&self, _topic: &str) -> Result<u32> {
        Ok(self.partitions)
    }

    async fn fetch(
        &self,
        topic: &str,
        partition: u32,
        from_offset: i64,
        limit: usize,
    ) -> Result<Vec<Delivery>> {
        let state = self.state.lock().await;
        let Some(log) = state.logs.get(topic).and_then(|logs| logs.get(partition as usize)) else {
            return Ok(Vec::new());
        };

        let start = from_offset.max(0) as usize;
        Ok(log.iter().skip(start).take(limit).cloned().collect())
    }

    async fn committed(&self, group: &str, topic: &str, partition: u32) -> Result<i64> {
        let state = self.state.lock().await;
        Ok(state
            .offsets
            .get(&(group.to_string(), topic.to_string(), partition))
            .copied()
            .unwrap_or(0))
    }

    async fn commit(
        &self,
        group: &str,
        topic: &str,
        partition: u32,
        next_offset: i64,
    ) -> Result<()> {
        let mut state = self.state.lock().await;
        state
            .offsets
            .insert((group.to_string(), topic.to_string(), partition), next_offset);
        Ok(())
    }
}
