//! Trap-style global API.
//!
//! One [`KernelState`] lives in a static guarded by a critical section.
//! Each call takes the lock for the duration of one operation and never
//! re-enters it. `WaitNextEvent` releases the lock between passes so that
//! input producers are not held off while it idles.
//!
//! Any call made before [`init`] installs a default kernel driven by the
//! host clock.
//!
//! Trace hooks and context hooks run inside that lock and must not call
//! back into this module. The `OsResult` calls detect it and return
//! `ParamErr`; the others panic.

use core::cell::RefCell;
use std::sync::Arc;

use critical_section::Mutex;
use sys7_core::{
    EventKind, EventMask, EventRecord, HostClock, KeyMap, Modifiers, OsErr, OsResult, Point,
    ProcessSerialNumber, Region, SharedClock, Ticks, TraceHook,
};
use sys7_evt::{EventManager, RawInput};
use sys7_proc::{LaunchSpec, ProcessInfo};

use crate::config::KernelConfig;
use crate::state::KernelState;
use crate::wait::{WaitNextEvent, WaitStep};

static KERNEL: Mutex<RefCell<Option<KernelState>>> = Mutex::new(RefCell::new(None));

/// Runs `f` with exclusive access to the global kernel.
///
/// Hooks run while the kernel is borrowed; calling this from one panics.
/// The calls returning [`OsResult`] go through [`try_with_kernel`] and fail
/// with `ParamErr` instead.
pub fn with_kernel<F, R>(f: F) -> R
where
    F: FnOnce(&mut KernelState) -> R,
{
    critical_section::with(|cs| {
        let mut slot = KERNEL.borrow_ref_mut(cs);
        let kernel = slot.get_or_insert_with(|| {
            KernelState::new(KernelConfig::default(), Arc::new(HostClock::new()))
        });
        f(kernel)
    })
}

/// Like [`with_kernel`], but reports a call made while the kernel is
/// already borrowed (a trace or context hook calling back into this module)
/// as `ParamErr` instead of panicking.
pub fn try_with_kernel<F, R>(f: F) -> OsResult<R>
where
    F: FnOnce(&mut KernelState) -> OsResult<R>,
{
    critical_section::with(|cs| {
        let Ok(mut slot) = KERNEL.borrow(cs).try_borrow_mut() else {
            log::warn!("kernel: API re-entered from a hook");
            return Err(OsErr::ParamErr);
        };
        let kernel = slot.get_or_insert_with(|| {
            KernelState::new(KernelConfig::default(), Arc::new(HostClock::new()))
        });
        f(kernel)
    })
}

/// Installs a fresh kernel, replacing any previous one.
pub fn init(config: KernelConfig, clock: SharedClock) {
    let kernel = KernelState::new(config, clock);
    critical_section::with(|cs| {
        KERNEL.borrow_ref_mut(cs).replace(kernel);
    });
}

/// Drops the global kernel.
pub fn shutdown() {
    critical_section::with(|cs| {
        KERNEL.borrow_ref_mut(cs).take();
    });
}

pub fn is_initialized() -> bool {
    critical_section::with(|cs| KERNEL.borrow_ref(cs).is_some())
}

pub fn set_trace_hook(hook: Option<TraceHook>) {
    with_kernel(|k| k.set_trace_hook(hook));
}

// ============================================================================
// Event Manager
// ============================================================================

/// `InitEvents`: resizes and clears the event pool.
pub fn init_events(queue_size: i32) -> OsResult<()> {
    try_with_kernel(|k| k.events_mut().init_events(queue_size))
}

/// `PostEvent`.
pub fn post_event(what: EventKind, message: i32) -> OsResult<()> {
    try_with_kernel(|k| k.events_mut().post_event(what, message))
}

/// `PostEvent` with a raw event code.
pub fn post_event_raw(code: u16, message: i32) -> OsResult<()> {
    try_with_kernel(|k| k.events_mut().post_event_raw(code, message))
}

/// `PPostEvent`.
pub fn ppost_event(what: EventKind, message: i32) -> OsResult<EventRecord> {
    try_with_kernel(|k| k.events_mut().ppost_event(what, message))
}

/// `GetNextEvent`.
pub fn get_next_event(mask: EventMask, out: &mut EventRecord) -> bool {
    with_kernel(|k| k.get_next_event(mask, out))
}

/// `EventAvail`.
pub fn event_avail(mask: EventMask, out: &mut EventRecord) -> bool {
    with_kernel(|k| k.event_avail(mask, out))
}

/// `FlushEvents`. Returns the number of events removed.
pub fn flush_events(which: EventMask, stop: EventMask) -> usize {
    with_kernel(|k| k.events_mut().flush_events(which, stop))
}

/// `WaitNextEvent`. Always returns true; `out.what == Null` means the wait
/// timed out or the mouse left `mouse_region`.
pub fn wait_next_event(
    mask: EventMask,
    out: &mut EventRecord,
    sleep: u32,
    mouse_region: Option<&Region>,
) -> bool {
    let mut wait = WaitNextEvent::new(mask, sleep, mouse_region.cloned());
    loop {
        let (step, clock, idle_callback) = with_kernel(|k| {
            let step = wait.poll(k);
            (step, k.clock().clone(), k.config().idle_callback)
        });
        match step {
            WaitStep::Ready(record) => {
                *out = record;
                return true;
            }
            WaitStep::Pending => {
                if let Some(callback) = idle_callback {
                    callback();
                }
                clock.idle();
            }
        }
    }
}

/// `SystemEvent`: true for `osEvt` and `activateEvt` records.
pub fn system_event(record: &EventRecord) -> bool {
    EventManager::system_event(record)
}

/// `GetMouse`, in global coordinates.
pub fn get_mouse() -> Point {
    with_kernel(|k| k.events().get_mouse())
}

/// `GetKeys`.
pub fn get_keys() -> KeyMap {
    with_kernel(|k| k.events().get_keys())
}

/// `Button`.
pub fn button() -> bool {
    with_kernel(|k| k.events().button())
}

/// `StillDown`.
pub fn still_down() -> bool {
    with_kernel(|k| k.events().still_down())
}

/// `WaitMouseUp`.
pub fn wait_mouse_up() -> bool {
    with_kernel(|k| k.events_mut().wait_mouse_up())
}

/// `TickCount`.
pub fn tick_count() -> u32 {
    with_kernel(|k| k.tick_count().raw())
}

/// `GetDblTime`.
pub fn get_dbl_time() -> u32 {
    with_kernel(|k| k.events().get_dbl_time())
}

/// `GetCaretTime`.
pub fn get_caret_time() -> u32 {
    with_kernel(|k| k.events().get_caret_time())
}

/// `SetEventMask`.
pub fn set_event_mask(mask: EventMask) {
    with_kernel(|k| k.events_mut().set_event_mask(mask));
}

/// `SetKeyRepeat`: delay before the first repeat and ticks between repeats.
pub fn set_key_repeat(delay: u32, rate: u32) {
    with_kernel(|k| k.events_mut().set_key_repeat(delay, rate));
}

/// `CheckAbort`: Command-Period held.
pub fn check_abort() -> bool {
    with_kernel(|k| k.events().check_abort())
}

/// `GetModifierState`.
pub fn get_modifier_state() -> Modifiers {
    with_kernel(|k| k.events().get_modifier_state())
}

// ============================================================================
// Raw input
// ============================================================================

/// `ProcessRawMouseEvent`. Returns the number of events generated.
pub fn process_raw_mouse_event(
    x: i16,
    y: i16,
    buttons: u16,
    modifiers: Modifiers,
    timestamp: Ticks,
) -> u16 {
    with_kernel(|k| {
        k.events_mut()
            .process_raw_mouse_event(x, y, buttons, modifiers, timestamp)
    })
}

/// `ProcessRawKeyboardEvent`. Returns the number of events generated.
pub fn process_raw_keyboard_event(
    scan_code: u16,
    is_down: bool,
    modifiers: Modifiers,
    timestamp: Ticks,
) -> u16 {
    with_kernel(|k| {
        k.events_mut()
            .process_raw_keyboard_event(scan_code, is_down, modifiers, timestamp)
    })
}

/// Queues a driver packet; it is translated at the next yield point.
pub fn post_raw_input(input: RawInput) -> OsResult<()> {
    try_with_kernel(|k| k.post_raw_input(input))
}

// ============================================================================
// Process Manager
// ============================================================================

/// `Process_Create`: the new process stays suspended until resumed.
pub fn create_process(spec: &LaunchSpec) -> OsResult<ProcessSerialNumber> {
    try_with_kernel(|k| k.processes_mut().create(spec))
}

/// `LaunchApplication`.
pub fn launch_application(spec: &LaunchSpec) -> OsResult<ProcessSerialNumber> {
    try_with_kernel(|k| k.launch_application(spec))
}

/// `Process_Yield`.
pub fn process_yield() -> OsResult<ProcessSerialNumber> {
    try_with_kernel(|k| k.yield_now())
}

/// `Scheduler_GetNextProcess`: the process a yield would switch to.
pub fn scheduler_next_process() -> ProcessSerialNumber {
    with_kernel(|k| k.processes().next_process())
}

/// `Context_Switch`. Returns false if `psn` already is current.
pub fn context_switch(psn: ProcessSerialNumber) -> OsResult<bool> {
    try_with_kernel(|k| k.processes_mut().switch_to(psn))
}

/// `GetCurrentProcess`.
pub fn get_current_process() -> OsResult<ProcessSerialNumber> {
    try_with_kernel(|k| Ok(k.processes().current_process()))
}

/// `GetNextProcess`: pass `NO_PROCESS` for the first process.
pub fn get_next_process(psn: ProcessSerialNumber) -> OsResult<ProcessSerialNumber> {
    try_with_kernel(|k| k.processes().get_next_process(psn))
}

/// `GetFrontProcess`.
pub fn get_front_process() -> OsResult<ProcessSerialNumber> {
    try_with_kernel(|k| Ok(k.processes().front_process()))
}

/// `SetFrontProcess`.
pub fn set_front_process(psn: ProcessSerialNumber) -> OsResult<()> {
    try_with_kernel(|k| k.set_front_process(psn))
}

/// `SameProcess`.
pub fn same_process(a: ProcessSerialNumber, b: ProcessSerialNumber) -> OsResult<bool> {
    try_with_kernel(|k| Ok(k.processes().same_process(a, b)))
}

/// `Process_Suspend`.
pub fn suspend_process(psn: ProcessSerialNumber) -> OsResult<()> {
    try_with_kernel(|k| k.suspend_process(psn))
}

/// `Process_Resume`.
pub fn resume_process(psn: ProcessSerialNumber) -> OsResult<()> {
    try_with_kernel(|k| k.resume_process(psn))
}

/// `Process_Cleanup`.
pub fn cleanup_process(psn: ProcessSerialNumber) -> OsResult<()> {
    try_with_kernel(|k| k.cleanup_process(psn))
}

/// `GetProcessInformation`.
pub fn get_process_information(psn: ProcessSerialNumber) -> OsResult<ProcessInfo> {
    try_with_kernel(|k| k.processes().process_info(psn))
}
