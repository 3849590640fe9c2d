//! The pending-pod priority queue.
//!
//! Backed by a `BinaryHeap` ordered by `(priority, earliest enqueue time)`.
//! Removal by identity is lazy: `remove` only updates a `HashMap` of
//! currently-live sequence numbers per identity; stale heap entries are
//! discarded on pop. This gives `insert`/`remove` without a linear heap
//! rebuild while still satisfying the queue's at-most-one-live-entry
//! contract, including the "remove, then immediately reinsert" pattern used
//! on every admission event.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use tokio::time::Instant;

use crate::models::{PodIdentity, PodRecord, QueueEntry};

struct HeapEntry {
    priority: i64,
    enqueue_time: Instant,
    seq: u64,
    pod: PodRecord,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.enqueue_time == other.enqueue_time
    }
}
impl Eq for HeapEntry {}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap: higher priority sorts first, and among
        // equal priorities the earlier enqueue time must win, so its Ordering
        // is reversed (earlier enqueue_time => "greater").
        self.priority
            .cmp(&other.priority)
            .then_with(|| other.enqueue_time.cmp(&self.enqueue_time))
    }
}
impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

pub struct SchedulingQueue {
    heap: BinaryHeap<HeapEntry>,
    current: HashMap<PodIdentity, u64>,
    next_seq: u64,
}

impl SchedulingQueue {
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            current: HashMap::new(),
            next_seq: 0,
        }
    }

    pub fn insert(&mut self, pod: PodRecord, priority: i64, enqueue_time: Instant) {
        let seq = self.next_seq;
        self.next_seq += 1;
        let identity = pod.identity.clone();
        self.current.insert(identity, seq);
        self.heap.push(HeapEntry {
            priority,
            enqueue_time,
            seq,
            pod,
        });
    }

    /// Deletes the live entry for `identity`, if any. Returns whether one existed.
    pub fn remove(&mut self, identity: &PodIdentity) -> bool {
        self.current.remove(identity).is_some()
    }

    /// Pops the highest-priority live entry, discarding any stale (tombstoned
    /// or superseded) heap entries it encounters along the way.
    pub fn pop_highest(&mut self) -> Option<QueueEntry> {
        while let Some(top) = self.heap.pop() {
            match self.current.get(&top.pod.identity) {
                Some(&live_seq) if live_seq == top.seq => {
                    self.current.remove(&top.pod.identity);
                    return Some(QueueEntry {
                        priority: top.priority,
                        enqueue_time: top.enqueue_time,
                        pod: top.pod,
                    });
                }
                _ => continue,
            }
        }
        None
    }

    pub fn drain(&mut self) -> Vec<QueueEntry> {
        let mut out = Vec::with_capacity(self.current.len());
        while let Some(entry) = self.pop_highest() {
            out.push(entry);
        }
        out
    }

    pub fn size(&self) -> usize {
        self.current.len()
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_empty()
    }
}

impl Default for SchedulingQueue {
    fn default() -> Self {
        Self::new()
    }
}
