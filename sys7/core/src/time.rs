//! Tick counting and time sources

use core::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Logical tick rate.
pub const TICKS_PER_SECOND: u32 = 60;

/// A `TickCount` value: 60 Hz, wraps at `u32::MAX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Ticks(pub u32);

impl Ticks {
    pub const ZERO: Self = Self(0);
    pub const MAX: Self = Self(u32::MAX);

    pub const fn new(ticks: u32) -> Self {
        Self(ticks)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Ticks elapsed since `previous`, modulo wraparound.
    pub const fn elapsed_since(self, previous: Ticks) -> u32 {
        self.0.wrapping_sub(previous.0)
    }

    /// True if this tick is at or after `other`, treating the counter as a
    /// ring.
    pub const fn is_at_or_after(self, other: Ticks) -> bool {
        self.0.wrapping_sub(other.0) < u32::MAX / 2
    }

    pub const fn wrapping_add(self, ticks: u32) -> Ticks {
        Ticks(self.0.wrapping_add(ticks))
    }
}

impl fmt::Display for Ticks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tick:{}", self.0)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Ticks {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "tick:{}", self.0);
    }
}

/// Monotonic 60 Hz time source (`TickCount`).
pub trait TickSource: Send {
    /// Current tick.
    fn ticks(&self) -> Ticks;

    /// Called on every idle pass of a cooperative wait. Hosted clocks give
    /// the CPU away here; simulated clocks may advance.
    fn idle(&self) {}
}

/// Tick source shared between the event and process managers.
pub type SharedClock = Arc<dyn TickSource + Sync>;

/// Hand-driven clock for tests and simulation. Clones share the same counter.
///
/// `idle` advances the clock by one tick so that waits terminate
/// deterministically.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicU32>,
}

impl ManualClock {
    pub fn new(start: Ticks) -> Self {
        Self {
            now: Arc::new(AtomicU32::new(start.raw())),
        }
    }

    pub fn set(&self, ticks: Ticks) {
        self.now.store(ticks.raw(), Ordering::SeqCst);
    }

    pub fn advance(&self, ticks: u32) -> Ticks {
        let prev = self.now.fetch_add(ticks, Ordering::SeqCst);
        Ticks(prev.wrapping_add(ticks))
    }
}

impl TickSource for ManualClock {
    fn ticks(&self) -> Ticks {
        Ticks(self.now.load(Ordering::SeqCst))
    }

    fn idle(&self) {
        self.advance(1);
    }
}

/// Wall-clock tick source anchored at construction.
#[derive(Debug, Clone, Copy)]
pub struct HostClock {
    epoch: Instant,
    base: Ticks,
}

impl HostClock {
    pub fn new() -> Self {
        Self::starting_at(Ticks::ZERO)
    }

    pub fn starting_at(base: Ticks) -> Self {
        Self {
            epoch: Instant::now(),
            base,
        }
    }
}

impl Default for HostClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TickSource for HostClock {
    fn ticks(&self) -> Ticks {
        let elapsed = self.epoch.elapsed();
        let ticks = elapsed.as_millis() * u128::from(TICKS_PER_SECOND) / 1000;
        self.base.wrapping_add(ticks as u32)
    }

    fn idle(&self) {
        std::thread::sleep(Duration::from_millis(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elapsed_handles_wraparound() {
        let before = Ticks::new(u32::MAX - 2);
        let after = before.wrapping_add(5);
        assert_eq!(after, Ticks::new(2));
        assert_eq!(after.elapsed_since(before), 5);
        assert!(after.is_at_or_after(before));
        assert!(!before.is_at_or_after(after));
    }

    #[test]
    fn manual_clock_clones_share_time() {
        let clock = ManualClock::new(Ticks::new(10));
        let view = clock.clone();
        clock.advance(5);
        assert_eq!(view.ticks(), Ticks::new(15));
        view.idle();
        assert_eq!(clock.ticks(), Ticks::new(16));
    }

    #[test]
    fn host_clock_starts_at_base() {
        let clock = HostClock::starting_at(Ticks::new(100));
        assert!(clock.ticks().raw() >= 100);
    }
}
