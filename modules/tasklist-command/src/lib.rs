//! Write side of the task list.
//!
//! Owns the canonical task records. Every successful mutation commits to the
//! write store first and then publishes exactly one change event keyed by the
//! task id. The read side learns about changes only through those events.

pub mod config;
pub mod error;
pub mod mutator;
pub mod publisher;
pub mod record;
pub mod routes;
pub mod store;

pub use config::CommandConfig;
pub use error::{CommandError, PublishError};
pub use mutator::TaskMutator;
pub use publisher::{BrokerPublisher, EventPublisher};
pub use record::{TaskDraft, TaskRecord};
pub use store::{MemoryTaskStore, PgTaskStore, TaskWriteStore};
