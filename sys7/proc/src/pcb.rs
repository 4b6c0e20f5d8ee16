//! Process control blocks

use core::fmt;

use sys7_core::{EventMask, OsType, ProcessSerialNumber, Ticks};

use crate::memory::Partition;

/// Lifecycle state of a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ProcessState {
    /// Slot is free.
    #[default]
    Terminated,
    /// Created or explicitly suspended; never scheduled.
    Suspended,
    /// Holds the CPU. Exactly one process is in this state.
    Running,
    /// Schedulable but not currently running.
    Background,
}

impl ProcessState {
    /// Running or Background.
    pub const fn is_schedulable(self) -> bool {
        matches!(self, ProcessState::Running | ProcessState::Background)
    }

    pub const fn is_live(self) -> bool {
        !matches!(self, ProcessState::Terminated)
    }
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProcessState::Terminated => "terminated",
            ProcessState::Suspended => "suspended",
            ProcessState::Running => "running",
            ProcessState::Background => "background",
        };
        f.write_str(name)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for ProcessState {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            ProcessState::Terminated => defmt::write!(fmt, "Terminated"),
            ProcessState::Suspended => defmt::write!(fmt, "Suspended"),
            ProcessState::Running => defmt::write!(fmt, "Running"),
            ProcessState::Background => defmt::write!(fmt, "Background"),
        }
    }
}

/// Process mode flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProcessMode(pub u32);

impl ProcessMode {
    pub const NONE: ProcessMode = ProcessMode(0);
    /// Yields only at event calls.
    pub const COOPERATIVE: ProcessMode = ProcessMode(0x0001);
    /// May receive time while not frontmost.
    pub const CAN_BACKGROUND: ProcessMode = ProcessMode(0x0002);
    /// May be moved to the Suspended state.
    pub const SUSPENDABLE: ProcessMode = ProcessMode(0x0004);
    /// Receives suspend/resume `osEvt`s on front switches.
    pub const ACCEPTS_SUSPEND_RESUME: ProcessMode = ProcessMode(0x0008);
    /// Never becomes the front process.
    pub const BACKGROUND_ONLY: ProcessMode = ProcessMode(0x0010);

    /// Mode given to created applications.
    pub const APPLICATION: ProcessMode = ProcessMode(
        Self::COOPERATIVE.0
            | Self::CAN_BACKGROUND.0
            | Self::SUSPENDABLE.0
            | Self::ACCEPTS_SUSPEND_RESUME.0,
    );
    /// Mode of the system process.
    pub const SYSTEM: ProcessMode = ProcessMode(Self::COOPERATIVE.0 | Self::CAN_BACKGROUND.0);

    pub const fn contains(self, other: ProcessMode) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn union(self, other: ProcessMode) -> ProcessMode {
        ProcessMode(self.0 | other.0)
    }

    pub const fn without(self, other: ProcessMode) -> ProcessMode {
        ProcessMode(self.0 & !other.0)
    }
}

impl core::ops::BitOr for ProcessMode {
    type Output = ProcessMode;

    fn bitor(self, rhs: ProcessMode) -> ProcessMode {
        self.union(rhs)
    }
}

/// Launch control flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LaunchFlags(pub u16);

impl LaunchFlags {
    pub const NONE: LaunchFlags = LaunchFlags(0);
    /// Create the process background-only; it never becomes front.
    pub const BACKGROUND_ONLY: LaunchFlags = LaunchFlags(0x0001);
    /// `launchDontSwitch`: launch without bringing the process forward.
    pub const DONT_SWITCH: LaunchFlags = LaunchFlags(0x0200);
    /// `launchContinue`: the caller keeps running (accepted, no effect here).
    pub const CONTINUE: LaunchFlags = LaunchFlags(0x4000);

    pub const fn contains(self, other: LaunchFlags) -> bool {
        self.0 & other.0 == other.0 && other.0 != 0
    }
}

impl core::ops::BitOr for LaunchFlags {
    type Output = LaunchFlags;

    fn bitor(self, rhs: LaunchFlags) -> LaunchFlags {
        LaunchFlags(self.0 | rhs.0)
    }
}

/// Portable snapshot taken when a process gives up the CPU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExecutionContext {
    /// Top of the process stack at the last switch.
    pub stack_pointer: usize,
    /// Base of the process globals (A5 world equivalent).
    pub globals: usize,
    /// Times the process has been switched out.
    pub switch_count: u32,
    /// Host-defined resume token (fiber id, coroutine state, ...).
    pub resume_token: u64,
}

/// Offset of the globals area inside a partition.
pub const GLOBALS_OFFSET: usize = 32;

/// Per-process record owned by the process table.
#[derive(Debug, Clone, Default)]
pub struct ProcessControlBlock {
    pub psn: ProcessSerialNumber,
    pub name: String,
    pub signature: OsType,
    pub file_type: OsType,
    pub state: ProcessState,
    pub mode: ProcessMode,
    pub partition: Option<Partition>,
    pub stack: Option<Partition>,
    pub context_area: Option<Partition>,
    pub context: ExecutionContext,
    pub creation_time: Ticks,
    pub last_event_time: Ticks,
    pub event_mask: EventMask,
    /// Effective priority, including any front-process boost.
    pub priority: u16,
    /// Priority without boost.
    pub base_priority: u16,
    /// Next process in the scheduling queue (arena index).
    pub next: Option<usize>,
    pub(crate) generation: u32,
    pub(crate) linked: bool,
}

impl ProcessControlBlock {
    /// The always-present system process.
    pub fn system(now: Ticks, priority: u16) -> Self {
        Self {
            psn: ProcessSerialNumber::SYSTEM,
            name: String::from("System"),
            signature: OsType::SYSTEM_SIGNATURE,
            file_type: OsType::SYSTEM_TYPE,
            state: ProcessState::Running,
            mode: ProcessMode::SYSTEM,
            creation_time: now,
            last_event_time: now,
            event_mask: EventMask::EVERY,
            priority,
            base_priority: priority,
            ..Self::default()
        }
    }

    pub fn is_system(&self) -> bool {
        self.psn == ProcessSerialNumber::SYSTEM
    }

    /// Bytes held by partition, stack and context area.
    pub fn footprint(&self) -> usize {
        [self.partition, self.stack, self.context_area]
            .iter()
            .flatten()
            .map(|p| p.size)
            .sum()
    }
}

/// Read-only snapshot returned by process queries.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProcessInfo {
    pub psn: ProcessSerialNumber,
    pub name: String,
    pub signature: OsType,
    pub file_type: OsType,
    pub state: ProcessState,
    pub mode: ProcessMode,
    pub priority: u16,
    pub partition_size: usize,
    pub stack_size: usize,
    pub creation_time: Ticks,
    pub last_event_time: Ticks,
    pub event_mask: EventMask,
    pub is_front: bool,
}

impl ProcessInfo {
    pub(crate) fn from_pcb(pcb: &ProcessControlBlock, is_front: bool) -> Self {
        Self {
            psn: pcb.psn,
            name: pcb.name.clone(),
            signature: pcb.signature,
            file_type: pcb.file_type,
            state: pcb.state,
            mode: pcb.mode,
            priority: pcb.priority,
            partition_size: pcb.partition.map_or(0, |p| p.size),
            stack_size: pcb.stack.map_or(0, |p| p.size),
            creation_time: pcb.creation_time,
            last_event_time: pcb.last_event_time,
            event_mask: pcb.event_mask,
            is_front,
        }
    }
}
