//! Change-event contract between the task write side and the task read side.
//!
//! Both services depend on this crate and never on each other. It declares the
//! event schema, the channel events travel on, and the broker seams the
//! producer and the projector talk through.

pub mod broker;
pub mod channel;
pub mod config;
pub mod event;
pub mod memory;
pub mod store;

pub use broker::{Consumer, Delivery, Producer, SendReceipt};
pub use channel::{partition_for, DEFAULT_PARTITIONS, TASK_EVENTS_TOPIC, TASK_PROJECTOR_GROUP};
pub use config::DatabaseConfig;
pub use event::{EventDecodeError, EventKind, TaskEvent, TaskId};
pub use memory::MemoryBroker;
pub use store::PgBroker;
