use crate::core::types::GroupId;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// Source of fresh group ids.
///
/// Implementations must never hand out the same id twice.
pub trait GroupIdGenerator: Send + Sync {
    fn next_id(&self) -> GroupId;
}

/// Random v4 UUIDs, the default
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidGroupIds;

impl GroupIdGenerator for UuidGroupIds {
    fn next_id(&self) -> GroupId {
        GroupId::new(Uuid::new_v4().to_string())
    }
}

/// Monotonic `group-N` ids, handy when output has to be deterministic
#[derive(Debug, Default)]
pub struct SequentialGroupIds {
    next: AtomicU64,
}

impl SequentialGroupIds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start counting after `last`, e.g. when resuming a tree loaded from disk
    pub fn starting_after(last: u64) -> Self {
        Self {
            next: AtomicU64::new(last),
        }
    }
}

impl GroupIdGenerator for SequentialGroupIds {
    fn next_id(&self) -> GroupId {
        let n = self.next.fetch_add(1, Ordering::Relaxed) + 1;
        GroupId::new(format!("group-{n}"))
    }
}
