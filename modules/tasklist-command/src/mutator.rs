//! TaskMutator: the command surface.
//!
//! Every mutation is persist-then-emit: the write store commits, and only then
//! is the change event published. A failed commit emits nothing. A failed
//! publish is logged and swallowed because the mutation has already committed;
//! that change never reaches the read view (there is no outbox).

use std::sync::Arc;

use anyhow::anyhow;
use tracing::{info, warn};

use tasklist_events::{TaskEvent, TaskId};

use crate::error::CommandError;
use crate::publisher::EventPublisher;
use crate::record::{TaskDraft, TaskRecord};
use crate::store::TaskWriteStore;

#[derive(Clone)]
pub struct TaskMutator {
    store: Arc<dyn TaskWriteStore>,
    publisher: Arc<dyn EventPublisher>,
}

impl TaskMutator {
    pub fn new(store: Arc<dyn TaskWriteStore>, publisher: Arc<dyn EventPublisher>) -> Self {
        Self { store, publisher }
    }

    /// Create an incomplete task and emit `Created` with its persisted state.
    pub async fn create(&self, description: impl Into<String>) -> Result<TaskRecord, CommandError> {
        let saved = self
            .store
            .save(TaskDraft::new(description))
            .await
            .map_err(CommandError::not_persisted)?
            .ok_or_else(|| {
                CommandError::not_persisted(anyhow!("write store returned no row for a new task"))
            })?;

        info!(task_id = saved.id, "Task created");
        self.emit(saved.created_event()).await;
        Ok(saved)
    }

    /// Overwrite a task's fields and emit `Updated` with its persisted state.
    pub async fn update(
        &self,
        id: TaskId,
        description: impl Into<String>,
        completed: bool,
    ) -> Result<TaskRecord, CommandError> {
        let current = self
            .store
            .find_by_id(id)
            .await
            .map_err(CommandError::not_persisted)?
            .ok_or(CommandError::NotFound(id))?;

        let mut draft = current.into_draft();
        draft.description = description.into();
        draft.completed = completed;

        // A concurrent delete can remove the row between the read and the write.
        let saved = self
            .store
            .save(draft)
            .await
            .map_err(CommandError::not_persisted)?
            .ok_or(CommandError::NotFound(id))?;

        info!(task_id = saved.id, completed = saved.completed, "Task updated");
        self.emit(saved.updated_event()).await;
        Ok(saved)
    }

    /// Remove a task and emit `Deleted`. Deleting an absent task still
    /// succeeds and still emits, so repeated deletes produce repeated events.
    pub async fn delete(&self, id: TaskId) -> Result<(), CommandError> {
        self.store
            .delete_by_id(id)
            .await
            .map_err(CommandError::not_persisted)?;

        info!(task_id = id, "Task deleted");
        self.emit(TaskEvent::Deleted { id }).await;
        Ok(())
    }

    async fn emit(&self, event: TaskEvent) {
        if let Err(e) = self.publisher.publish(&event).await {
            warn!(
                task_id = event.id(),
                kind = %event.kind(),
                error = ?e,
                "Publish failed after commit; read view will miss this change"
            );
        }
    }
}
