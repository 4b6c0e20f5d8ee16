//! Fixed-capacity process table
//!
//! PCBs live in an arena indexed by slot. Slot 0 is the system process and
//! is the permanent head of the scheduling queue. The queue is an intrusive
//! singly linked list threaded through [`ProcessControlBlock::next`];
//! `current` is an index into the arena, never an owner.

use sys7_core::{ProcessSerialNumber, Ticks};

use crate::pcb::{ProcessControlBlock, ProcessState};

/// Arena slot of the system process.
pub const SYSTEM_SLOT: usize = 0;

/// Generation-checked reference to a table slot.
///
/// A handle stops resolving once its process is cleaned up, even if the
/// slot has since been reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProcessHandle {
    index: usize,
    generation: u32,
}

impl ProcessHandle {
    pub const fn index(self) -> usize {
        self.index
    }

    pub const fn generation(self) -> u32 {
        self.generation
    }
}

/// PCB arena plus the scheduling queue threaded through it.
#[derive(Debug, Clone)]
pub struct ProcessTable {
    slots: Vec<ProcessControlBlock>,
    head: Option<usize>,
    tail: Option<usize>,
    size: usize,
    current: usize,
}

impl ProcessTable {
    /// Creates a table holding only the system process, linked and current.
    pub fn new(capacity: usize, system_priority: u16, now: Ticks) -> Self {
        let capacity = capacity.max(1);
        let mut slots = vec![ProcessControlBlock::default(); capacity];
        slots[SYSTEM_SLOT] = ProcessControlBlock::system(now, system_priority);
        let mut table = Self {
            slots,
            head: None,
            tail: None,
            size: 0,
            current: SYSTEM_SLOT,
        };
        table.link_tail(SYSTEM_SLOT);
        table
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Processes in the scheduling queue.
    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn head(&self) -> Option<usize> {
        self.head
    }

    pub fn tail(&self) -> Option<usize> {
        self.tail
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub(crate) fn set_current(&mut self, index: usize) {
        self.current = index;
    }

    pub fn get(&self, index: usize) -> Option<&ProcessControlBlock> {
        self.slots.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut ProcessControlBlock> {
        self.slots.get_mut(index)
    }

    pub fn current_pcb(&self) -> &ProcessControlBlock {
        &self.slots[self.current]
    }

    /// First free application slot.
    pub fn find_free_slot(&self) -> Option<usize> {
        self.slots
            .iter()
            .enumerate()
            .skip(SYSTEM_SLOT + 1)
            .find(|(_, pcb)| pcb.state == ProcessState::Terminated && !pcb.linked)
            .map(|(index, _)| index)
    }

    /// Installs a fresh PCB in a free slot, bumping the slot generation.
    pub(crate) fn install(&mut self, index: usize, mut pcb: ProcessControlBlock) -> ProcessHandle {
        let generation = self.slots[index].generation.wrapping_add(1);
        pcb.generation = generation;
        pcb.next = None;
        pcb.linked = false;
        self.slots[index] = pcb;
        ProcessHandle { index, generation }
    }

    /// Slot of the live process with this serial number.
    pub fn lookup(&self, psn: ProcessSerialNumber) -> Option<usize> {
        self.slots
            .iter()
            .position(|pcb| pcb.state.is_live() && pcb.psn == psn)
    }

    pub fn handle(&self, index: usize) -> Option<ProcessHandle> {
        self.slots
            .get(index)
            .filter(|pcb| pcb.state.is_live())
            .map(|pcb| ProcessHandle {
                index,
                generation: pcb.generation,
            })
    }

    /// Slot behind a handle, if that process is still alive.
    pub fn resolve(&self, handle: ProcessHandle) -> Option<usize> {
        self.slots
            .get(handle.index)
            .filter(|pcb| pcb.state.is_live() && pcb.generation == handle.generation)
            .map(|_| handle.index)
    }

    /// Appends a slot to the scheduling queue. Already linked slots are left
    /// in place.
    pub(crate) fn link_tail(&mut self, index: usize) {
        if self.slots[index].linked {
            return;
        }
        self.slots[index].next = None;
        self.slots[index].linked = true;
        match self.tail {
            Some(tail) => self.slots[tail].next = Some(index),
            None => self.head = Some(index),
        }
        self.tail = Some(index);
        self.size += 1;
    }

    /// Removes a slot from the scheduling queue, keeping head and tail
    /// consistent. Returns false if the slot was not linked.
    pub(crate) fn unlink(&mut self, index: usize) -> bool {
        if !self.slots[index].linked {
            return false;
        }
        let next = self.slots[index].next;
        let prev = self.iter_queue().find(|&i| self.slots[i].next == Some(index));
        match prev {
            Some(prev) => self.slots[prev].next = next,
            None => self.head = next,
        }
        if self.tail == Some(index) {
            self.tail = prev;
        }
        self.slots[index].next = None;
        self.slots[index].linked = false;
        self.size -= 1;
        true
    }

    /// Slot indices in queue order starting at the head.
    pub fn iter_queue(&self) -> QueueIter<'_> {
        QueueIter {
            table: self,
            cursor: self.head,
            remaining: self.size,
        }
    }

    /// Successor of `index` in the queue, wrapping from the tail to the head.
    pub fn next_wrapping(&self, index: usize) -> Option<usize> {
        self.slots.get(index)?.next.or(self.head)
    }

    pub fn is_linked(&self, index: usize) -> bool {
        self.slots.get(index).is_some_and(|pcb| pcb.linked)
    }

    /// Number of slots holding a live process.
    pub fn live_count(&self) -> usize {
        self.slots.iter().filter(|pcb| pcb.state.is_live()).count()
    }

    /// Number of processes in the Running state.
    pub fn running_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|pcb| pcb.state == ProcessState::Running)
            .count()
    }
}

/// Iterator over queue slots.
pub struct QueueIter<'a> {
    table: &'a ProcessTable,
    cursor: Option<usize>,
    remaining: usize,
}

impl Iterator for QueueIter<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.remaining == 0 {
            return None;
        }
        let index = self.cursor?;
        self.cursor = self.table.slots[index].next;
        self.remaining -= 1;
        Some(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pcb::ProcessState;

    fn app(low: u32) -> ProcessControlBlock {
        ProcessControlBlock {
            psn: ProcessSerialNumber::new(0, low),
            state: ProcessState::Background,
            ..ProcessControlBlock::default()
        }
    }

    fn table_with(apps: &[u32]) -> ProcessTable {
        let mut table = ProcessTable::new(8, 0, Ticks::ZERO);
        for &low in apps {
            let slot = table.find_free_slot().unwrap();
            table.install(slot, app(low));
            table.link_tail(slot);
        }
        table
    }

    #[test]
    fn test_system_process_is_head_and_current() {
        let table = ProcessTable::new(4, 0, Ticks::new(5));
        assert_eq!(table.head(), Some(SYSTEM_SLOT));
        assert_eq!(table.tail(), Some(SYSTEM_SLOT));
        assert_eq!(table.current(), SYSTEM_SLOT);
        assert_eq!(table.len(), 1);
        assert_eq!(table.running_count(), 1);
        assert_eq!(table.lookup(ProcessSerialNumber::SYSTEM), Some(SYSTEM_SLOT));
    }

    #[test]
    fn test_unlink_middle_and_tail() {
        let mut table = table_with(&[3, 4, 5]);
        assert_eq!(table.iter_queue().collect::<Vec<_>>(), vec![0, 1, 2, 3]);

        assert!(table.unlink(2));
        assert_eq!(table.iter_queue().collect::<Vec<_>>(), vec![0, 1, 3]);

        assert!(table.unlink(3));
        assert_eq!(table.tail(), Some(1));
        assert_eq!(table.iter_queue().collect::<Vec<_>>(), vec![0, 1]);
        assert!(!table.unlink(3));

        let slot = table.find_free_slot().unwrap();
        assert_eq!(slot, 2);
        table.install(slot, app(9));
        table.link_tail(slot);
        assert_eq!(table.iter_queue().collect::<Vec<_>>(), vec![0, 1, 2]);
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_next_wrapping() {
        let table = table_with(&[3, 4]);
        assert_eq!(table.next_wrapping(0), Some(1));
        assert_eq!(table.next_wrapping(2), Some(0));
    }

    #[test]
    fn test_stale_handle_does_not_resolve() {
        let mut table = table_with(&[3]);
        let handle = table.handle(1).unwrap();
        assert_eq!(table.resolve(handle), Some(1));

        table.unlink(1);
        table.get_mut(1).unwrap().state = ProcessState::Terminated;
        assert_eq!(table.resolve(handle), None);

        let fresh = table.install(1, app(7));
        assert_eq!(table.resolve(handle), None);
        assert_eq!(table.resolve(fresh), Some(1));
    }

    #[test]
    fn test_full_table_has_no_free_slot() {
        let table = table_with(&[3, 4, 5, 6, 7, 8, 9]);
        assert_eq!(table.find_free_slot(), None);
        assert_eq!(table.live_count(), 8);
    }
}
