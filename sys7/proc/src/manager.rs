//! The Process Manager: process lifecycle, front process and yields.

use core::fmt;

use sys7_core::trace::{self, records};
use sys7_core::{
    EventMask, OsErr, OsResult, OsType, ProcessSerialNumber, SharedClock, Ticks, TraceHook,
};

use crate::config::{ProcessConfig, CONTEXT_AREA_SIZE};
use crate::context::{self, ContextHooks, NoopContext, Switch};
use crate::memory::{HeapPartitions, Partition, PartitionAllocator, PartitionStats};
use crate::pcb::{LaunchFlags, ProcessControlBlock, ProcessInfo, ProcessMode, ProcessState};
use crate::scheduler;
use crate::table::{ProcessHandle, ProcessTable, SYSTEM_SLOT};

/// What to launch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSpec {
    pub name: String,
    pub signature: OsType,
    pub file_type: OsType,
    pub partition_size: usize,
    /// Overrides [`ProcessConfig::default_stack_size`].
    pub stack_size: Option<usize>,
    /// Overrides [`ProcessConfig::default_priority`].
    pub priority: Option<u16>,
    pub flags: LaunchFlags,
}

impl LaunchSpec {
    pub fn new(name: impl Into<String>, signature: OsType, partition_size: usize) -> Self {
        Self {
            name: name.into(),
            signature,
            file_type: OsType::APPLICATION,
            partition_size,
            stack_size: None,
            priority: None,
            flags: LaunchFlags::NONE,
        }
    }

    pub fn with_flags(mut self, flags: LaunchFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_priority(mut self, priority: u16) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_stack_size(mut self, bytes: usize) -> Self {
        self.stack_size = Some(bytes);
        self
    }

    pub fn with_file_type(mut self, file_type: OsType) -> Self {
        self.file_type = file_type;
        self
    }
}

/// A change of front process, reported so the caller can post
/// suspend/resume `osEvt`s.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrontChange {
    pub from: ProcessSerialNumber,
    pub to: ProcessSerialNumber,
    /// The old front process is alive and accepts a suspend event.
    pub notify_from: bool,
    /// The new front process accepts a resume event.
    pub notify_to: bool,
}

/// Process table, scheduler and memory partitions behind the classic
/// Process Manager calls.
pub struct ProcessManager {
    config: ProcessConfig,
    table: ProcessTable,
    allocator: Box<dyn PartitionAllocator>,
    hooks: Box<dyn ContextHooks>,
    clock: SharedClock,
    next_serial: u32,
    front: usize,
    front_changes: Vec<FrontChange>,
    switches: u64,
    trace: Option<TraceHook>,
}

impl ProcessManager {
    /// `ProcessManager_Initialize`: an empty table holding only the system
    /// process, which is current and front.
    pub fn new(config: ProcessConfig, clock: SharedClock) -> Self {
        let now = clock.ticks();
        let table = ProcessTable::new(config.max_processes, config.system_priority, now);
        let allocator = Box::new(HeapPartitions::new(config.partition_budget));
        log::info!(
            "process manager: {} slots, {} byte partition budget",
            config.max_processes,
            config.partition_budget
        );
        Self {
            config,
            table,
            allocator,
            hooks: Box::new(NoopContext),
            clock,
            next_serial: ProcessSerialNumber::FIRST_APPLICATION,
            front: SYSTEM_SLOT,
            front_changes: Vec::new(),
            switches: 0,
            trace: None,
        }
    }

    pub fn with_allocator(mut self, allocator: Box<dyn PartitionAllocator>) -> Self {
        self.allocator = allocator;
        self
    }

    pub fn with_context_hooks(mut self, hooks: Box<dyn ContextHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn with_trace_hook(mut self, hook: TraceHook) -> Self {
        self.trace = Some(hook);
        self
    }

    pub fn set_trace_hook(&mut self, hook: Option<TraceHook>) {
        self.trace = hook;
    }

    pub fn config(&self) -> &ProcessConfig {
        &self.config
    }

    pub fn table(&self) -> &ProcessTable {
        &self.table
    }

    pub fn partition_stats(&self) -> PartitionStats {
        self.allocator.stats()
    }

    /// Context switches performed so far.
    pub fn switch_count(&self) -> u64 {
        self.switches
    }

    fn now(&self) -> Ticks {
        self.clock.ticks()
    }

    fn resolve(&self, psn: ProcessSerialNumber) -> OsResult<usize> {
        if psn.is_current_process() {
            return Ok(self.table.current());
        }
        self.table.lookup(psn).ok_or(OsErr::ProcNotFound)
    }

    fn psn_at(&self, index: usize) -> ProcessSerialNumber {
        self.table
            .get(index)
            .map_or(ProcessSerialNumber::NO_PROCESS, |pcb| pcb.psn)
    }

    fn allocate_serial(&mut self) -> ProcessSerialNumber {
        let low = self.next_serial;
        self.next_serial = match low.wrapping_add(1) {
            n if n < ProcessSerialNumber::FIRST_APPLICATION => ProcessSerialNumber::FIRST_APPLICATION,
            n => n,
        };
        ProcessSerialNumber::new(0, low)
    }

    // ---------------------------------------------------------------------
    // Lifecycle
    // ---------------------------------------------------------------------

    /// `Process_Create`: reserves a slot, a partition, a stack and a context
    /// area. The new process is Suspended and not yet scheduled.
    ///
    /// Fails with `ProcNotFound` when the table is full, `ParamErr` for an
    /// empty partition, and `MemFullErr` when any allocation fails; earlier
    /// allocations are released before returning.
    pub fn create(&mut self, spec: &LaunchSpec) -> OsResult<ProcessSerialNumber> {
        if spec.partition_size == 0 {
            return Err(OsErr::ParamErr);
        }
        let slot = self.table.find_free_slot().ok_or_else(|| {
            log::warn!("process manager: table full, cannot create {}", spec.name);
            OsErr::ProcNotFound
        })?;

        let stack_size = spec.stack_size.unwrap_or(self.config.default_stack_size);
        let (partition, stack, context_area) = self.allocate_regions(spec.partition_size, stack_size)?;

        let now = self.now();
        let psn = self.allocate_serial();
        let priority = spec.priority.unwrap_or(self.config.default_priority);
        let mut mode = ProcessMode::APPLICATION;
        if spec.flags.contains(LaunchFlags::BACKGROUND_ONLY) {
            mode = mode | ProcessMode::BACKGROUND_ONLY;
        }

        self.table.install(
            slot,
            ProcessControlBlock {
                psn,
                name: spec.name.clone(),
                signature: spec.signature,
                file_type: spec.file_type,
                state: ProcessState::Suspended,
                mode,
                partition: Some(partition),
                stack: Some(stack),
                context_area: Some(context_area),
                creation_time: now,
                last_event_time: now,
                event_mask: EventMask::EVERY,
                priority,
                base_priority: priority,
                ..ProcessControlBlock::default()
            },
        );

        log::info!("process manager: created {} '{}' in slot {slot}", psn, spec.name);
        self.emit(records::proc::CREATE, psn, ProcessState::Suspended);
        Ok(psn)
    }

    fn allocate_regions(
        &mut self,
        partition_size: usize,
        stack_size: usize,
    ) -> OsResult<(Partition, Partition, Partition)> {
        let partition = self.allocator.allocate(partition_size)?;
        let stack = match self.allocator.allocate(stack_size) {
            Ok(stack) => stack,
            Err(err) => {
                self.allocator.release(partition);
                return Err(err);
            }
        };
        match self.allocator.allocate(CONTEXT_AREA_SIZE) {
            Ok(context_area) => Ok((partition, stack, context_area)),
            Err(err) => {
                self.allocator.release(stack);
                self.allocator.release(partition);
                Err(err)
            }
        }
    }

    /// `LaunchApplication`: creates the process, queues it, and unless
    /// `DONT_SWITCH` or background-only brings it to the front and switches
    /// to it.
    pub fn launch_application(&mut self, spec: &LaunchSpec) -> OsResult<ProcessSerialNumber> {
        let psn = self.create(spec)?;
        let slot = self.resolve(psn)?;
        self.table.link_tail(slot);
        if let Some(pcb) = self.table.get_mut(slot) {
            pcb.state = ProcessState::Background;
        }
        self.emit(records::proc::LAUNCH, psn, ProcessState::Background);

        let background_only = spec.flags.contains(LaunchFlags::BACKGROUND_ONLY);
        if !spec.flags.contains(LaunchFlags::DONT_SWITCH) && !background_only {
            self.change_front(slot);
            self.switch_slot(slot)?;
        }
        log::info!("process manager: launched {psn} '{}'", spec.name);
        Ok(psn)
    }

    /// `Process_Suspend`. Suspending the current process switches away from
    /// it; suspending the front process hands the front to whoever runs
    /// next.
    pub fn suspend(&mut self, psn: ProcessSerialNumber) -> OsResult<()> {
        let slot = self.resolve(psn)?;
        let pcb = self.table.get(slot).ok_or(OsErr::ProcNotFound)?;
        if pcb.is_system() || !pcb.mode.contains(ProcessMode::SUSPENDABLE) {
            log::warn!("process manager: {} may not be suspended", pcb.psn);
            return Err(OsErr::ParamErr);
        }
        if pcb.state == ProcessState::Suspended {
            return Ok(());
        }
        let psn = pcb.psn;
        if let Some(pcb) = self.table.get_mut(slot) {
            pcb.state = ProcessState::Suspended;
        }
        log::debug!("process manager: suspended {psn}");
        self.emit(records::proc::SUSPEND, psn, ProcessState::Suspended);

        if slot == self.table.current() {
            self.switch_away()?;
        }
        if slot == self.front {
            self.change_front(self.table.current());
        }
        Ok(())
    }

    /// `Process_Resume`: a Suspended process becomes schedulable again.
    /// Resuming a process that is not suspended does nothing.
    pub fn resume(&mut self, psn: ProcessSerialNumber) -> OsResult<()> {
        let slot = self.resolve(psn)?;
        let pcb = self.table.get_mut(slot).ok_or(OsErr::ProcNotFound)?;
        if pcb.state != ProcessState::Suspended {
            return Ok(());
        }
        pcb.state = ProcessState::Background;
        let psn = pcb.psn;
        self.table.link_tail(slot);
        log::debug!("process manager: resumed {psn}");
        self.emit(records::proc::RESUME, psn, ProcessState::Background);
        Ok(())
    }

    /// `Process_Cleanup`: releases the process memory and frees its slot.
    /// The system process cannot be cleaned up.
    pub fn cleanup(&mut self, psn: ProcessSerialNumber) -> OsResult<()> {
        let slot = self.resolve(psn)?;
        if slot == SYSTEM_SLOT {
            return Err(OsErr::ParamErr);
        }

        self.table.unlink(slot);
        let pcb = self.table.get_mut(slot).ok_or(OsErr::ProcNotFound)?;
        let psn = pcb.psn;
        let regions = [pcb.partition.take(), pcb.stack.take(), pcb.context_area.take()];
        pcb.state = ProcessState::Terminated;
        pcb.priority = 0;
        for region in regions.into_iter().flatten() {
            self.allocator.release(region);
        }
        log::info!("process manager: cleaned up {psn}");
        self.emit(records::proc::CLEANUP, psn, ProcessState::Terminated);

        if slot == self.table.current() {
            self.switch_away()?;
        }
        if slot == self.front {
            self.change_front(self.table.current());
        }
        Ok(())
    }

    /// Leaves the current process for the next schedulable one, falling
    /// back to the system process.
    fn switch_away(&mut self) -> OsResult<()> {
        let current = self.table.current();
        let mut next = scheduler::next_process(&self.table);
        if next == current {
            next = SYSTEM_SLOT;
        }
        self.switch_slot(next).map(|_| ())
    }

    // ---------------------------------------------------------------------
    // Scheduling
    // ---------------------------------------------------------------------

    /// `Scheduler_GetNextProcess`.
    pub fn next_process(&self) -> ProcessSerialNumber {
        self.psn_at(scheduler::next_process(&self.table))
    }

    /// True if a schedulable process outranks the current one.
    pub fn higher_priority_waiting(&self) -> bool {
        scheduler::higher_priority_waiting(&self.table)
    }

    /// `Process_Yield`: switches to the scheduler's pick. Returns the
    /// process that is current afterwards.
    pub fn process_yield(&mut self) -> OsResult<ProcessSerialNumber> {
        let next = scheduler::next_process(&self.table);
        if next == self.table.current() {
            trace::emit(self.trace.as_ref(), records::sched::IDLE, &[]);
        } else {
            self.switch_slot(next)?;
        }
        Ok(self.current_process())
    }

    /// `Context_Switch` by serial number. Returns false if the target
    /// already was current.
    pub fn switch_to(&mut self, psn: ProcessSerialNumber) -> OsResult<bool> {
        let slot = self.resolve(psn)?;
        if !self.table.get(slot).is_some_and(|pcb| pcb.state.is_schedulable()) {
            return Err(OsErr::ParamErr);
        }
        self.switch_slot(slot).map(|switch| switch.is_some())
    }

    fn switch_slot(&mut self, slot: usize) -> OsResult<Option<Switch>> {
        let now = self.now();
        let switch = context::context_switch(&mut self.table, slot, now, self.hooks.as_mut())?;
        if let Some(Switch { from, to }) = switch {
            self.switches += 1;
            let (from, to) = (self.psn_at(from), self.psn_at(to));
            log::debug!("process manager: switch {from} -> {to} at {now}");
            if self.trace.is_some() {
                let mut payload = [0u8; 8];
                payload[..4].copy_from_slice(&from.low.to_le_bytes());
                payload[4..].copy_from_slice(&to.low.to_le_bytes());
                trace::emit(self.trace.as_ref(), records::sched::SWITCH, &payload);
            }
        }
        Ok(switch)
    }

    /// Stamps the current process as having just received an event.
    pub fn note_event_delivered(&mut self) {
        let now = self.now();
        let current = self.table.current();
        if let Some(pcb) = self.table.get_mut(current) {
            pcb.last_event_time = now;
        }
    }

    // ---------------------------------------------------------------------
    // Queries and front process
    // ---------------------------------------------------------------------

    /// `GetCurrentProcess`.
    pub fn current_process(&self) -> ProcessSerialNumber {
        self.table.current_pcb().psn
    }

    /// `GetNextProcess`: `NO_PROCESS` yields the first process in the queue;
    /// any other serial yields its successor. `ProcNotFound` past the end or
    /// for unknown serials.
    pub fn get_next_process(&self, psn: ProcessSerialNumber) -> OsResult<ProcessSerialNumber> {
        let mut queue = self.table.iter_queue();
        let next = if psn.is_no_process() {
            queue.next()
        } else {
            queue
                .by_ref()
                .find(|&i| self.table.get(i).is_some_and(|pcb| pcb.psn == psn))
                .and_then(|_| queue.next())
        };
        next.map(|i| self.psn_at(i)).ok_or(OsErr::ProcNotFound)
    }

    /// `GetFrontProcess`.
    pub fn front_process(&self) -> ProcessSerialNumber {
        self.psn_at(self.front)
    }

    /// `SetFrontProcess`: resumes the target if needed, moves the priority
    /// boost to it and switches to it immediately.
    pub fn set_front_process(&mut self, psn: ProcessSerialNumber) -> OsResult<()> {
        let slot = self.resolve(psn)?;
        let pcb = self.table.get(slot).ok_or(OsErr::ProcNotFound)?;
        if pcb.mode.contains(ProcessMode::BACKGROUND_ONLY) {
            return Err(OsErr::ParamErr);
        }
        if pcb.state == ProcessState::Suspended {
            let psn = pcb.psn;
            self.resume(psn)?;
        }
        self.change_front(slot);
        self.switch_slot(slot)?;
        Ok(())
    }

    fn change_front(&mut self, target: usize) {
        let old = self.front;
        if old == target {
            return;
        }
        let boost = self.config.front_boost;
        let notify_from = match self.table.get_mut(old) {
            Some(pcb) if pcb.state.is_live() => {
                pcb.priority = pcb.base_priority;
                pcb.mode.contains(ProcessMode::ACCEPTS_SUSPEND_RESUME)
            }
            _ => false,
        };
        let notify_to = match self.table.get_mut(target) {
            Some(pcb) => {
                pcb.priority = pcb.base_priority.saturating_add(boost);
                pcb.mode.contains(ProcessMode::ACCEPTS_SUSPEND_RESUME)
            }
            None => false,
        };
        self.front = target;

        let change = FrontChange {
            from: self.psn_at(old),
            to: self.psn_at(target),
            notify_from,
            notify_to,
        };
        log::info!("process manager: front {} -> {}", change.from, change.to);
        self.emit(records::proc::FRONT, change.to, ProcessState::Running);
        self.front_changes.push(change);
    }

    /// Front switches since the last call, oldest first.
    pub fn take_front_changes(&mut self) -> Vec<FrontChange> {
        core::mem::take(&mut self.front_changes)
    }

    /// `SameProcess`. `CURRENT` is resolved on both sides, then the serial
    /// values are compared; a serial need not name a live process.
    pub fn same_process(&self, a: ProcessSerialNumber, b: ProcessSerialNumber) -> bool {
        self.concrete(a) == self.concrete(b)
    }

    fn concrete(&self, psn: ProcessSerialNumber) -> ProcessSerialNumber {
        if psn.is_current_process() {
            self.current_process()
        } else {
            psn
        }
    }

    /// `GetProcessInformation`-style snapshot.
    pub fn process_info(&self, psn: ProcessSerialNumber) -> OsResult<ProcessInfo> {
        let slot = self.resolve(psn)?;
        let pcb = self.table.get(slot).ok_or(OsErr::ProcNotFound)?;
        Ok(ProcessInfo::from_pcb(pcb, slot == self.front))
    }

    /// Snapshots of every queued process in queue order.
    pub fn processes(&self) -> Vec<ProcessInfo> {
        self.table
            .iter_queue()
            .filter_map(|i| self.table.get(i).map(|pcb| ProcessInfo::from_pcb(pcb, i == self.front)))
            .collect()
    }

    /// Changes a process's base priority; the front boost is kept.
    pub fn set_process_priority(&mut self, psn: ProcessSerialNumber, priority: u16) -> OsResult<()> {
        let slot = self.resolve(psn)?;
        let boost = if slot == self.front { self.config.front_boost } else { 0 };
        let pcb = self.table.get_mut(slot).ok_or(OsErr::ProcNotFound)?;
        pcb.base_priority = priority;
        pcb.priority = priority.saturating_add(boost);
        Ok(())
    }

    /// Generation-checked handle for a live process.
    pub fn handle_of(&self, psn: ProcessSerialNumber) -> OsResult<ProcessHandle> {
        let slot = self.resolve(psn)?;
        self.table.handle(slot).ok_or(OsErr::ProcNotFound)
    }

    /// Serial number behind a handle; `ProcNotFound` once the process is gone.
    pub fn psn_of(&self, handle: ProcessHandle) -> OsResult<ProcessSerialNumber> {
        self.table
            .resolve(handle)
            .map(|slot| self.psn_at(slot))
            .ok_or(OsErr::ProcNotFound)
    }

    fn emit(&self, record: u8, psn: ProcessSerialNumber, state: ProcessState) {
        if self.trace.is_none() {
            return;
        }
        let mut payload = [0u8; 5];
        payload[..4].copy_from_slice(&psn.low.to_le_bytes());
        payload[4] = state as u8;
        trace::emit(self.trace.as_ref(), record, &payload);
    }
}

impl fmt::Debug for ProcessManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessManager")
            .field("current", &self.current_process())
            .field("front", &self.front_process())
            .field("queued", &self.table.len())
            .field("switches", &self.switches)
            .field("partitions", &self.allocator.stats())
            .finish()
    }
}
