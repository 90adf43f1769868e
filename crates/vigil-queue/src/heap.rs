//! Priority heap entry ordering: keyed by `(-priority_weight, created_at)`
//! — higher priority first, FIFO within a priority.

use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use vigil_model::LogEntry;

pub struct HeapEntry {
    pub entry: LogEntry,
}

impl HeapEntry {
    fn priority_weight(&self) -> i32 {
        self.entry.priority.weight()
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.entry.created_at
    }
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.priority_weight() == other.priority_weight() && self.created_at() == other.created_at()
    }
}
impl Eq for HeapEntry {}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap: higher priority pops first; within the
        // same priority, the older (smaller created_at) entry must compare
        // greater so it pops first (FIFO within a priority).
        self.priority_weight()
            .cmp(&other.priority_weight())
            .then_with(|| other.created_at().cmp(&self.created_at()))
    }
}
