//! Bounded FIFO of posted events

use std::collections::VecDeque;

use sys7_core::{EventMask, EventRecord, OsErr, OsResult};

use crate::config::OverflowPolicy;

/// Event pool with mask-filtered lookup.
///
/// Entries stay in post order. Removal from the middle closes the gap
/// without reordering the survivors.
#[derive(Debug, Clone)]
pub struct EventQueue {
    entries: VecDeque<EventRecord>,
    capacity: usize,
    policy: OverflowPolicy,
}

impl EventQueue {
    pub fn new(capacity: usize, policy: OverflowPolicy) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            policy,
        }
    }

    /// Appends an event. Under [`OverflowPolicy::EvictOldest`] a full queue
    /// gives up its head, which is returned.
    pub fn push(&mut self, record: EventRecord) -> OsResult<Option<EventRecord>> {
        if self.entries.len() < self.capacity {
            self.entries.push_back(record);
            return Ok(None);
        }
        match self.policy {
            OverflowPolicy::Reject => Err(OsErr::QueueFull),
            OverflowPolicy::EvictOldest => {
                let evicted = self.entries.pop_front();
                self.entries.push_back(record);
                Ok(evicted)
            }
        }
    }

    fn position(&self, mask: EventMask) -> Option<usize> {
        self.entries.iter().position(|e| mask.contains(e.what))
    }

    /// First event matching `mask`, left in place.
    pub fn peek(&self, mask: EventMask) -> Option<EventRecord> {
        self.position(mask).map(|idx| self.entries[idx])
    }

    /// Removes and returns the first event matching `mask`.
    pub fn take(&mut self, mask: EventMask) -> Option<EventRecord> {
        let idx = self.position(mask)?;
        self.entries.remove(idx)
    }

    /// Removes events matching `which` from the head up to the first event
    /// matching `stop`. Returns the number removed.
    pub fn flush(&mut self, which: EventMask, stop: EventMask) -> usize {
        let mut removed = 0;
        let mut idx = 0;
        while idx < self.entries.len() {
            let what = self.entries[idx].what;
            if stop.contains(what) {
                break;
            }
            if which.contains(what) {
                self.entries.remove(idx);
                removed += 1;
            } else {
                idx += 1;
            }
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn policy(&self) -> OverflowPolicy {
        self.policy
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Queued events, head first.
    pub fn iter(&self) -> impl Iterator<Item = &EventRecord> + '_ {
        self.entries.iter()
    }
}
