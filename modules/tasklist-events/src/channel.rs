//! The channel contract: where task events travel and who consumes them.
//!
//! Producers and consumers agree on these names and on [`partition_for`].
//! Nothing else is shared between the write side and the read side.

/// The single channel all task change events are sent to.
pub const TASK_EVENTS_TOPIC: &str = "task-events";

/// The consumer group the read-side projector commits offsets under.
pub const TASK_PROJECTOR_GROUP: &str = "task-group";

/// Partition count used when a topic is created without an explicit one.
pub const DEFAULT_PARTITIONS: u32 = 4;

/// Map a message key to a partition.
///
/// FNV-1a over the key bytes: stable across processes and releases, so two
/// producers always agree on where a task's events go.
pub fn partition_for(key: &str, partitions: u32) -> u32 {
    const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    let hash = key.bytes().fold(OFFSET_BASIS, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(PRIME)
    });
    (hash % u64::from(partitions.max(1))) as u32
}
