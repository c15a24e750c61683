//! Read side of the task list.
//!
//! Subscribes to task change events and projects them into a denormalized
//! view. The view is possibly stale and is never consulted by the write side.

pub mod config;
pub mod error;
pub mod projector;
pub mod reader;
pub mod routes;
pub mod store;
pub mod subscriber;
pub mod view;

pub use config::QueryConfig;
pub use error::ProjectionError;
pub use projector::{ApplyResult, TaskProjector};
pub use reader::TaskReader;
pub use store::{MemoryReadStore, PgReadStore, ReadWrite, TaskReadStore};
pub use subscriber::{PollOutcome, Subscriber, SubscriberConfig};
pub use view::TaskView;
