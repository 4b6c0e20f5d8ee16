//! Serialized raw-input ingestion path.
//!
//! Drivers running in interrupt handlers or on other threads push raw
//! packets here; the Event Manager drains them at its own yield points.

use core::cell::{Cell, RefCell};
use core::convert::Infallible;

use critical_section::Mutex;
use heapless::Deque;
use sys7_core::{Modifiers, OsErr, OsResult, Ticks};

/// A raw packet as reported by an input driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawInput {
    Mouse {
        x: i16,
        y: i16,
        buttons: u16,
        modifiers: Modifiers,
        timestamp: Ticks,
    },
    Key {
        scan_code: u16,
        is_down: bool,
        modifiers: Modifiers,
        timestamp: Ticks,
    },
}

/// Bounded multi-producer queue guarded by a critical section.
pub struct RawInputQueue<const N: usize> {
    packets: Mutex<RefCell<Deque<RawInput, N>>>,
    dropped: Mutex<Cell<u32>>,
}

impl<const N: usize> RawInputQueue<N> {
    pub const fn new() -> Self {
        Self {
            packets: Mutex::new(RefCell::new(Deque::new())),
            dropped: Mutex::new(Cell::new(0)),
        }
    }

    /// Enqueues a packet; a full queue drops it and counts the loss.
    pub fn push(&self, input: RawInput) -> OsResult<()> {
        critical_section::with(|cs| {
            let pushed = self.packets.borrow_ref_mut(cs).push_back(input);
            if pushed.is_err() {
                let dropped = self.dropped.borrow(cs);
                dropped.set(dropped.get().wrapping_add(1));
                return Err(OsErr::QueueFull);
            }
            Ok(())
        })
    }

    /// Dequeues the oldest packet, or `WouldBlock` when empty.
    pub fn pop(&self) -> nb::Result<RawInput, Infallible> {
        critical_section::with(|cs| self.packets.borrow_ref_mut(cs).pop_front())
            .ok_or(nb::Error::WouldBlock)
    }

    pub fn len(&self) -> usize {
        critical_section::with(|cs| self.packets.borrow_ref(cs).len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    /// Packets lost to a full queue since creation.
    pub fn dropped(&self) -> u32 {
        critical_section::with(|cs| self.dropped.borrow(cs).get())
    }

    pub fn clear(&self) {
        critical_section::with(|cs| self.packets.borrow_ref_mut(cs).clear());
    }
}

impl<const N: usize> Default for RawInputQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}
