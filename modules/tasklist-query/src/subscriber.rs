//! Subscriber: the long-lived loop that feeds the projector.
//!
//! One task per partition. Within a partition, deliveries are projected
//! strictly in offset order and the group's offset is committed only after the
//! read store accepted the write. A failed projection stops the batch without
//! committing, so the next poll starts again from the same message. That
//! gives at-least-once processing with no loss if the process dies mid-batch.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::watch;
use tracing::{info, warn};

use tasklist_events::{Consumer, TASK_EVENTS_TOPIC, TASK_PROJECTOR_GROUP};

use crate::projector::{ApplyResult, TaskProjector};

#[derive(Debug, Clone)]
pub struct SubscriberConfig {
    pub topic: String,
    pub group: String,
    /// Max deliveries fetched per poll.
    pub batch_size: usize,
    /// Wait after a poll that found nothing.
    pub idle_wait: Duration,
    /// Wait after a failed poll or projection before redelivery.
    pub retry_backoff: Duration,
}

impl Default for SubscriberConfig {
    fn default() -> Self {
        Self {
            topic: TASK_EVENTS_TOPIC.to_string(),
            group: TASK_PROJECTOR_GROUP.to_string(),
            batch_size: 100,
            idle_wait: Duration::from_millis(200),
            retry_backoff: Duration::from_secs(1),
        }
    }
}

/// What one poll of one partition did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PollOutcome {
    pub applied: usize,
    pub skipped: usize,
    /// A projection failed; its offset was left uncommitted.
    pub stalled: bool,
}

impl PollOutcome {
    pub fn is_idle(&self) -> bool {
        self.applied == 0 && self.skipped == 0 && !self.stalled
    }
}

pub struct Subscriber {
    consumer: Arc<dyn Consumer>,
    projector: TaskProjector,
    config: SubscriberConfig,
}

impl Subscriber {
    pub fn new(consumer: Arc<dyn Consumer>, projector: TaskProjector, config: SubscriberConfig) -> Self {
        Self {
            consumer,
            projector,
            config,
        }
    }

    /// Fetch from the committed offset and project one batch, in order.
    pub async fn poll_partition(&self, partition: u32) -> Result<PollOutcome> {
        let SubscriberConfig {
            topic, group, batch_size, ..
        } = &self.config;

        let from = self.consumer.committed(group, topic, partition).await?;
        let batch = self.consumer.fetch(topic, partition, from, *batch_size).await?;

        let mut outcome = PollOutcome::default();
        for delivery in batch {
            match self.projector.project(&delivery).await {
                Ok(ApplyResult::Applied) => outcome.applied += 1,
                Ok(ApplyResult::Undecodable(_)) => outcome.skipped += 1,
                Err(e) => {
                    warn!(
                        partition,
                        offset = delivery.offset,
                        error = ?e,
                        "Projection failed; offset not committed, will redeliver"
                    );
                    outcome.stalled = true;
                    break;
                }
            }
            self.consumer
                .commit(group, topic, partition, delivery.offset + 1)
                .await?;
        }

        Ok(outcome)
    }

    /// Poll every partition once. Returns the combined outcome.
    pub async fn poll_all(&self) -> Result<PollOutcome> {
        let partitions = self.consumer.partitions(&self.config.topic).await?;
        let mut total = PollOutcome::default();
        for partition in 0..partitions {
            let outcome = self.poll_partition(partition).await?;
            total.applied += outcome.applied;
            total.skipped += outcome.skipped;
            total.stalled |= outcome.stalled;
        }
        Ok(total)
    }

    /// Run until `shutdown` flips to true (or its sender is dropped).
    pub async fn run(self: Arc<Self>, shutdown: watch::Receiver<bool>) -> Result<()> {
        let partitions = self.consumer.partitions(&self.config.topic).await?;
        info!(
            topic = %self.config.topic,
            group = %self.config.group,
            partitions,
            "Subscriber started"
        );

        let tasks = (0..partitions).map(|partition| {
            let this = Arc::clone(&self);
            let shutdown = shutdown.clone();
            tokio::spawn(async move { this.run_partition(partition, shutdown).await })
        });

        for result in futures::future::join_all(tasks).await {
            if let Err(e) = result {
                warn!(error = %e, "Partition task ended abnormally");
            }
        }

        info!("Subscriber stopped");
        Ok(())
    }

    async fn run_partition(&self, partition: u32, mut shutdown: watch::Receiver<bool>) {
        loop {
            if *shutdown.borrow() {
                break;
            }

            let wait = match self.poll_partition(partition).await {
                Ok(outcome) if outcome.stalled => self.config.retry_backoff,
                Ok(outcome) if outcome.is_idle() => self.config.idle_wait,
                Ok(_) => continue,
                Err(e) => {
                    warn!(partition, error = %e, "Poll failed");
                    self.config.retry_backoff
                }
            };

            tokio::select! {
                _ = tokio::time::sleep(wait) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }
    }
}
