//! TaskEvent: the wire contract for a task change notification.
//!
//! Events are facts about a committed mutation, not commands. The `kind` tag
//! and the remaining fields serialize to a flat JSON object:
//!
//! ```json
//! {"kind": "Created", "id": 1, "description": "buy milk", "completed": false}
//! {"kind": "Deleted", "id": 1}
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identity of a task. Assigned by the write store, copied verbatim by the read side.
pub type TaskId = i64;

/// A change to one task, emitted after the write store commits it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum TaskEvent {
    Created {
        id: TaskId,
        description: String,
        completed: bool,
    },
    Updated {
        id: TaskId,
        description: String,
        completed: bool,
    },
    /// Carries identity only. Any payload fields on the wire are ignored.
    Deleted { id: TaskId },
}

/// Discriminant of a [`TaskEvent`], handy for logging and assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    Created,
    Updated,
    Deleted,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EventKind::Created => "Created",
            EventKind::Updated => "Updated",
            EventKind::Deleted => "Deleted",
        };
        f.write_str(name)
    }
}

impl TaskEvent {
    /// The task this event is about.
    pub fn id(&self) -> TaskId {
        match self {
            TaskEvent::Created { id, .. }
            | TaskEvent::Updated { id, .. }
            | TaskEvent::Deleted { id } => *id,
        }
    }

    pub fn kind(&self) -> EventKind {
        match self {
            TaskEvent::Created { .. } => EventKind::Created,
            TaskEvent::Updated { .. } => EventKind::Updated,
            TaskEvent::Deleted { .. } => EventKind::Deleted,
        }
    }

    /// The broker key. Every event for one task shares it, which is what
    /// keeps a task's events on one partition in emission order.
    pub fn partition_key(&self) -> String {
        self.id().to_string()
    }

    pub fn to_payload(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }

    pub fn from_payload(payload: &serde_json::Value) -> Result<Self, EventDecodeError> {
        Ok(Self::deserialize(payload)?)
    }
}

/// A message on the task channel that is not a usable change event.
#[derive(Debug, Error)]
pub enum EventDecodeError {
    #[error("malformed task event: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The message key disagrees with the event identity. Such a message may
    /// have been routed to the wrong partition, so its ordering is unknown.
    #[error("message key {key:?} does not match task id {id}")]
    KeyMismatch { key: String, id: TaskId },
}
