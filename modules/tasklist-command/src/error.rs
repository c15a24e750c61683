use thiserror::Error;

use tasklist_events::{EventKind, TaskId};

/// Failures a caller of the command surface can observe.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Update target does not exist. Nothing was written, no event was sent.
    #[error("task {0} not found")]
    NotFound(TaskId),

    /// The write store rejected or failed the commit. No event was sent.
    #[error("task not persisted")]
    NotPersisted(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl CommandError {
    pub(crate) fn not_persisted(err: anyhow::Error) -> Self {
        Self::NotPersisted(err.into())
    }
}

/// A change event that could not be handed to the broker.
///
/// Raised after the mutation has committed, so it is logged rather than
/// returned to the caller.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("failed to encode {kind} event for task {id}")]
    Encode {
        id: TaskId,
        kind: EventKind,
        #[source]
        source: serde_json::Error,
    },

    #[error("broker rejected {kind} event for task {id}")]
    Rejected {
        id: TaskId,
        kind: EventKind,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}
