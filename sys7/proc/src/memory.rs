//! Process memory partitions
//!
//! Every application gets three regions at creation: its partition (heap
//! and globals), a stack, and a small area for the saved context. Regions
//! come from a [`PartitionAllocator`]; the default [`HeapPartitions`]
//! accounts bytes against a fixed budget and hands out synthetic, aligned
//! base addresses.

use std::collections::BTreeMap;

use sys7_core::{OsErr, OsResult};

/// Alignment of every region base.
pub const PARTITION_ALIGN: usize = 16;

/// A reserved memory region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Partition {
    pub base: usize,
    pub size: usize,
}

impl Partition {
    pub const fn new(base: usize, size: usize) -> Self {
        Self { base, size }
    }

    /// One past the last byte.
    pub const fn end(&self) -> usize {
        self.base + self.size
    }
}

/// Allocation statistics for debugging and monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PartitionStats {
    /// Budget in bytes.
    pub total_bytes: usize,
    pub used_bytes: usize,
    /// Lowest free byte count ever reached.
    pub min_free_bytes: usize,
    /// Live regions.
    pub regions: usize,
}

impl PartitionStats {
    pub const fn new(total_bytes: usize) -> Self {
        Self {
            total_bytes,
            used_bytes: 0,
            min_free_bytes: total_bytes,
            regions: 0,
        }
    }

    pub const fn free_bytes(&self) -> usize {
        self.total_bytes - self.used_bytes
    }

    fn on_alloc(&mut self, size: usize) {
        self.used_bytes += size;
        self.regions += 1;
        self.min_free_bytes = self.min_free_bytes.min(self.free_bytes());
    }

    fn on_release(&mut self, size: usize) {
        self.used_bytes = self.used_bytes.saturating_sub(size);
        self.regions = self.regions.saturating_sub(1);
    }

    /// Utilization as a percentage (0-100).
    pub fn utilization(&self) -> u8 {
        if self.total_bytes == 0 {
            0
        } else {
            ((self.used_bytes * 100) / self.total_bytes) as u8
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for PartitionStats {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(
            fmt,
            "PartitionStats{{ total: {}, used: {}, min_free: {}, regions: {} }}",
            self.total_bytes,
            self.used_bytes,
            self.min_free_bytes,
            self.regions
        );
    }
}

/// Source of process memory regions.
pub trait PartitionAllocator: Send {
    /// Reserves `size` bytes. Fails with `MemFullErr` when the request
    /// cannot be met and with `ParamErr` for zero-sized requests.
    fn allocate(&mut self, size: usize) -> OsResult<Partition>;

    /// Returns a region. Unknown regions are ignored.
    fn release(&mut self, partition: Partition);

    fn stats(&self) -> PartitionStats;
}

/// Budget-accounted allocator handing out synthetic addresses.
#[derive(Debug, Clone)]
pub struct HeapPartitions {
    live: BTreeMap<usize, usize>,
    next_base: usize,
    stats: PartitionStats,
}

impl HeapPartitions {
    /// Base address of the first region.
    pub const BASE: usize = 0x0010_0000;

    pub fn new(budget: usize) -> Self {
        Self {
            live: BTreeMap::new(),
            next_base: Self::BASE,
            stats: PartitionStats::new(budget),
        }
    }

    pub fn is_live(&self, partition: Partition) -> bool {
        self.live.get(&partition.base) == Some(&partition.size)
    }
}

impl PartitionAllocator for HeapPartitions {
    fn allocate(&mut self, size: usize) -> OsResult<Partition> {
        if size == 0 {
            return Err(OsErr::ParamErr);
        }
        if size > self.stats.free_bytes() {
            log::debug!(
                "partitions: {size} bytes requested, {} free",
                self.stats.free_bytes()
            );
            return Err(OsErr::MemFullErr);
        }
        let aligned = size
            .checked_next_multiple_of(PARTITION_ALIGN)
            .ok_or(OsErr::MemFullErr)?;
        let base = self.next_base;
        self.next_base = base.checked_add(aligned).ok_or(OsErr::MemFullErr)?;
        self.live.insert(base, size);
        self.stats.on_alloc(size);
        Ok(Partition::new(base, size))
    }

    fn release(&mut self, partition: Partition) {
        match self.live.remove(&partition.base) {
            Some(size) => self.stats.on_release(size),
            None => log::warn!("partitions: release of unknown region {:#x}", partition.base),
        }
    }

    fn stats(&self) -> PartitionStats {
        self.stats
    }
}
