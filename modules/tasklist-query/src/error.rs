use thiserror::Error;

use tasklist_events::{EventKind, TaskId};

#[derive(Debug, Error)]
pub enum ProjectionError {
    /// The read store refused the write. The offset is not advanced, so the
    /// event is redelivered; applying it again is safe.
    #[error("projection of {kind} for task {id} failed")]
    ProjectionFailed {
        id: TaskId,
        kind: EventKind,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}
