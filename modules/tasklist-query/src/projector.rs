//! TaskProjector: applies task change events to the read store.
//!
//! Every application is idempotent: Created and Updated are upserts of the
//! full state carried by the event, Deleted removes by id and tolerates an
//! absent row. Replaying a suffix of a task's event stream in order therefore
//! converges on the write side's state.

use std::sync::Arc;

use tracing::{debug, warn};

use tasklist_events::{Delivery, TaskEvent};

use crate::error::ProjectionError;
use crate::store::TaskReadStore;
use crate::view::TaskView;

/// Result of projecting a single delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyResult {
    /// The event was written to the read store.
    Applied,
    /// The message could not be decoded as a task event. It is acknowledged
    /// and skipped so it cannot stall its partition.
    Undecodable(String),
}

#[derive(Clone)]
pub struct TaskProjector {
    store: Arc<dyn TaskReadStore>,
}

impl TaskProjector {
    pub fn new(store: Arc<dyn TaskReadStore>) -> Self {
        Self { store }
    }

    /// Decode and apply one delivery.
    pub async fn project(&self, delivery: &Delivery) -> Result<ApplyResult, ProjectionError> {
        let event = match delivery.decode() {
            Ok(event) => event,
            Err(e) => {
                warn!(
                    partition = delivery.partition,
                    offset = delivery.offset,
                    key = %delivery.key,
                    error = %e,
                    "Skipping undecodable message"
                );
                return Ok(ApplyResult::Undecodable(e.to_string()));
            }
        };

        debug!(
            task_id = event.id(),
            kind = %event.kind(),
            partition = delivery.partition,
            offset = delivery.offset,
            "Event received"
        );

        self.apply(&event).await?;
        Ok(ApplyResult::Applied)
    }

    /// Apply one event to the read store.
    pub async fn apply(&self, event: &TaskEvent) -> Result<(), ProjectionError> {
        let result = match event {
            TaskEvent::Created {
                id,
                description,
                completed,
            }
            | TaskEvent::Updated {
                id,
                description,
                completed,
            } => {
                self.store
                    .upsert(TaskView {
                        id: *id,
                        description: description.clone(),
                        completed: *completed,
                    })
                    .await
            }
            TaskEvent::Deleted { id } => self.store.delete_by_id(*id).await,
        };

        result.map_err(|e| ProjectionError::ProjectionFailed {
            id: event.id(),
            kind: event.kind(),
            source: e.into(),
        })
    }
}
