//! Kernel state: the Event Manager and Process Manager behind one owner.

use core::fmt;

use sys7_core::{
    os_event, EventKind, EventMask, EventRecord, OsErr, OsResult, ProcessSerialNumber, Region,
    SharedClock, Ticks, TraceHook,
};
use sys7_evt::{EventManager, RawInput, RawInputQueue};
use sys7_proc::{FrontChange, LaunchSpec, ProcessManager};

use crate::config::{KernelConfig, RAW_INPUT_CAPACITY};
use crate::wait::{WaitNextEvent, WaitStep};

/// Everything the trap surface operates on.
///
/// All mutation goes through `&mut self`; the global facade in
/// [`crate::api`] serializes access with a critical section.
pub struct KernelState {
    config: KernelConfig,
    clock: SharedClock,
    events: EventManager,
    processes: ProcessManager,
    raw_input: RawInputQueue<RAW_INPUT_CAPACITY>,
    last_yield: Ticks,
}

impl KernelState {
    pub fn new(config: KernelConfig, clock: SharedClock) -> Self {
        let events = EventManager::new(config.events.clone(), clock.clone());
        let processes = ProcessManager::new(config.processes.clone(), clock.clone());
        let last_yield = clock.ticks();
        log::info!(
            "kernel: multitasking {}, yield every {} ticks",
            if config.multitasking { "on" } else { "off" },
            config.yield_interval
        );
        Self {
            config,
            clock,
            events,
            processes,
            raw_input: RawInputQueue::new(),
            last_yield,
        }
    }

    /// Installs the same trace hook on both managers.
    pub fn with_trace_hook(mut self, hook: TraceHook) -> Self {
        self.set_trace_hook(Some(hook));
        self
    }

    pub fn set_trace_hook(&mut self, hook: Option<TraceHook>) {
        self.events.set_trace_hook(hook.clone());
        self.processes.set_trace_hook(hook);
    }

    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    pub fn clock(&self) -> &SharedClock {
        &self.clock
    }

    /// `TickCount`.
    pub fn tick_count(&self) -> Ticks {
        self.clock.ticks()
    }

    pub fn events(&self) -> &EventManager {
        &self.events
    }

    pub fn events_mut(&mut self) -> &mut EventManager {
        &mut self.events
    }

    pub fn processes(&self) -> &ProcessManager {
        &self.processes
    }

    pub fn processes_mut(&mut self) -> &mut ProcessManager {
        &mut self.processes
    }

    pub fn raw_input(&self) -> &RawInputQueue<RAW_INPUT_CAPACITY> {
        &self.raw_input
    }

    /// Queues a driver packet for the next pump.
    pub fn post_raw_input(&self, input: RawInput) -> OsResult<()> {
        self.raw_input.push(input)
    }

    pub fn set_multitasking(&mut self, enabled: bool) {
        self.config.multitasking = enabled;
    }

    /// Tick of the last scheduler yield.
    pub fn last_yield(&self) -> Ticks {
        self.last_yield
    }

    // ---------------------------------------------------------------------
    // Input and events
    // ---------------------------------------------------------------------

    /// Drains queued raw input, runs auto-repeat and posts pending
    /// suspend/resume events. Returns the number of events generated.
    pub fn pump_input(&mut self) -> usize {
        let mut generated = self
            .events
            .pump(&self.raw_input, self.config.raw_input_drain_limit);
        if self.events.tick() {
            generated += 1;
        }
        generated + self.deliver_front_changes()
    }

    /// `GetNextEvent`. With `yield_on_get_next_event` set, a miss yields to
    /// the scheduler.
    pub fn get_next_event(&mut self, mask: EventMask, out: &mut EventRecord) -> bool {
        self.pump_input();
        if self.take_event(mask, out) {
            return true;
        }
        if self.config.multitasking && self.config.yield_on_get_next_event {
            if let Err(err) = self.yield_now() {
                log::warn!("kernel: yield from GetNextEvent failed: {err}");
            }
        }
        false
    }

    /// Dequeues without pumping or yielding; stamps the current process on a
    /// hit.
    pub(crate) fn take_event(&mut self, mask: EventMask, out: &mut EventRecord) -> bool {
        let hit = self.events.get_next_event(mask, out);
        if hit {
            self.processes.note_event_delivered();
        }
        hit
    }

    /// `EventAvail`.
    pub fn event_avail(&mut self, mask: EventMask, out: &mut EventRecord) -> bool {
        self.pump_input();
        self.events.event_avail(mask, out)
    }

    /// `WaitNextEvent`. Always returns true; an idle return carries a
    /// `nullEvent`.
    pub fn wait_next_event(
        &mut self,
        mask: EventMask,
        out: &mut EventRecord,
        sleep: u32,
        mouse_region: Option<&Region>,
    ) -> bool {
        let mut wait = WaitNextEvent::new(mask, sleep, mouse_region.cloned());
        loop {
            match wait.poll(self) {
                WaitStep::Ready(record) => {
                    *out = record;
                    return true;
                }
                WaitStep::Pending => self.idle(),
            }
        }
    }

    /// One idle pass: the configured callback, then the clock's idle.
    pub fn idle(&self) {
        if let Some(callback) = self.config.idle_callback {
            callback();
        }
        self.clock.idle();
    }

    // ---------------------------------------------------------------------
    // Scheduling
    // ---------------------------------------------------------------------

    /// Yields to the scheduler's pick and restarts the yield interval.
    pub fn yield_now(&mut self) -> OsResult<ProcessSerialNumber> {
        let psn = self.processes.process_yield()?;
        self.last_yield = self.clock.ticks();
        self.deliver_front_changes();
        Ok(psn)
    }

    /// True once the yield interval has elapsed or a higher priority
    /// process is waiting.
    pub fn yield_due(&self) -> bool {
        let elapsed = self.clock.ticks().elapsed_since(self.last_yield);
        elapsed >= self.config.yield_interval || self.processes.higher_priority_waiting()
    }

    pub fn launch_application(&mut self, spec: &LaunchSpec) -> OsResult<ProcessSerialNumber> {
        let psn = self.processes.launch_application(spec)?;
        self.deliver_front_changes();
        Ok(psn)
    }

    pub fn set_front_process(&mut self, psn: ProcessSerialNumber) -> OsResult<()> {
        self.processes.set_front_process(psn)?;
        self.deliver_front_changes();
        Ok(())
    }

    pub fn suspend_process(&mut self, psn: ProcessSerialNumber) -> OsResult<()> {
        self.processes.suspend(psn)?;
        self.deliver_front_changes();
        Ok(())
    }

    pub fn resume_process(&mut self, psn: ProcessSerialNumber) -> OsResult<()> {
        self.processes.resume(psn)
    }

    pub fn cleanup_process(&mut self, psn: ProcessSerialNumber) -> OsResult<()> {
        self.processes.cleanup(psn)?;
        self.deliver_front_changes();
        Ok(())
    }

    /// Posts suspend/resume `osEvt`s for front switches. Returns the number
    /// of events queued.
    fn deliver_front_changes(&mut self) -> usize {
        let mut posted = 0;
        for FrontChange {
            from,
            to,
            notify_from,
            notify_to,
        } in self.processes.take_front_changes()
        {
            if notify_from {
                posted += self.post_os(os_event::suspend_resume_message(false, false), from);
            }
            if notify_to {
                posted += self.post_os(os_event::suspend_resume_message(true, false), to);
            }
        }
        posted
    }

    fn post_os(&mut self, message: i32, psn: ProcessSerialNumber) -> usize {
        match self.events.post_event(EventKind::Os, message) {
            Ok(()) => 1,
            Err(OsErr::EvtNotEnb) => 0,
            Err(err) => {
                log::warn!("kernel: osEvt {message:#x} for {psn} dropped: {err}");
                0
            }
        }
    }
}

impl fmt::Debug for KernelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KernelState")
            .field("now", &self.clock.ticks())
            .field("events", &self.events)
            .field("processes", &self.processes)
            .field("raw_input", &self.raw_input.len())
            .finish()
    }
}
