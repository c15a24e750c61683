//! Task records as the write store keeps them.

use tasklist_events::{TaskEvent, TaskId};

/// A persisted task. `id` is assigned by the write store and never reused.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct TaskRecord {
    pub id: TaskId,
    pub description: String,
    pub completed: bool,
}

/// A task about to be saved. `id` is `None` until the store assigns one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDraft {
    pub id: Option<TaskId>,
    pub description: String,
    pub completed: bool,
}

impl TaskDraft {
    /// A brand-new task. New tasks always start incomplete.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            id: None,
            description: description.into(),
            completed: false,
        }
    }
}

impl TaskRecord {
    pub fn into_draft(self) -> TaskDraft {
        TaskDraft {
            id: Some(self.id),
            description: self.description,
            completed: self.completed,
        }
    }

    pub fn created_event(&self) -> TaskEvent {
        TaskEvent::Created {
            id: self.id,
            description: self.description.clone(),
            completed: self.completed,
        }
    }

    pub fn updated_event(&self) -> TaskEvent {
        TaskEvent::Updated {
            id: self.id,
            description: self.description.clone(),
            completed: self.completed,
        }
    }
}
