//! WaitNextEvent and scheduling integration tests for sys7-kernel

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use sys7_core::{
    os_event, scan, EventKind, EventMask, EventRecord, ManualClock, Modifiers, OsType,
    ProcessSerialNumber, TickSource, Ticks,
};
use sys7_evt::RawInput;
use sys7_kernel::{KernelConfig, KernelState};
use sys7_proc::{LaunchFlags, LaunchSpec};

fn setup(config: KernelConfig, start: u32) -> (KernelState, ManualClock) {
    let clock = ManualClock::new(Ticks::new(start));
    let kernel = KernelState::new(config, Arc::new(clock.clone()));
    (kernel, clock)
}

fn app(name: &str) -> LaunchSpec {
    LaunchSpec::new(name, OsType::from_bytes(*b"TEST"), 32 * 1024)
}

fn drain(kernel: &mut KernelState) -> Vec<EventRecord> {
    let mut out = Vec::new();
    let mut evt = EventRecord::default();
    while kernel.get_next_event(EventMask::EVERY, &mut evt) {
        out.push(evt);
    }
    out
}

#[test]
fn test_timeout_is_bounded() {
    let (mut kernel, _) = setup(KernelConfig::default(), 100);
    let mut evt = EventRecord::default();
    assert!(kernel.wait_next_event(EventMask::EVERY, &mut evt, 10, None));
    assert_eq!(evt.what, EventKind::Null);
    assert!(evt.when.raw() >= 100 && evt.when.raw() <= 111, "woke at {}", evt.when);
}

#[test]
fn test_zero_sleep_returns_null_immediately() {
    let (mut kernel, clock) = setup(KernelConfig::default(), 5);
    let mut evt = EventRecord::default();
    assert!(kernel.wait_next_event(EventMask::EVERY, &mut evt, 0, None));
    assert!(evt.is_null());
    assert_eq!(clock.ticks(), Ticks::new(5));
}

#[test]
fn test_raw_input_is_delivered_by_wait() {
    let (mut kernel, _) = setup(KernelConfig::default(), 1);
    kernel
        .post_raw_input(RawInput::Key {
            scan_code: scan::D as u16,
            is_down: true,
            modifiers: Modifiers::NONE,
            timestamp: Ticks::new(1),
        })
        .unwrap();

    let mut evt = EventRecord::default();
    assert!(kernel.wait_next_event(EventMask::EVERY, &mut evt, 60, None));
    assert_eq!(evt.what, EventKind::KeyDown);
    assert_eq!(evt.char_code(), b'd');
    assert!(kernel.raw_input().is_empty());
}

#[test]
fn test_front_switches_post_suspend_and_resume() {
    let (mut kernel, _) = setup(KernelConfig::default(), 1);
    let a = kernel.launch_application(&app("A")).unwrap();
    let b = kernel.launch_application(&app("B")).unwrap();
    assert_eq!(kernel.processes().front_process(), b);

    let messages: Vec<_> = drain(&mut kernel)
        .into_iter()
        .filter(|e| e.what == EventKind::Os)
        .map(|e| e.message)
        .collect();
    assert_eq!(
        messages,
        vec![
            os_event::suspend_resume_message(true, false),
            os_event::suspend_resume_message(false, false),
            os_event::suspend_resume_message(true, false),
        ]
    );

    kernel.set_front_process(a).unwrap();
    let resumed = drain(&mut kernel);
    assert_eq!(resumed.len(), 2);
    assert!(os_event::is_resume(resumed[1].message));
}

#[test]
fn test_wait_shares_time_with_background_process() {
    let (mut kernel, _) = setup(KernelConfig::default(), 1);
    let front = kernel.launch_application(&app("front")).unwrap();
    let back = kernel
        .launch_application(&app("back").with_flags(LaunchFlags::DONT_SWITCH))
        .unwrap();
    drain(&mut kernel);

    let mut evt = EventRecord::default();
    kernel.wait_next_event(EventMask::EVERY, &mut evt, 30, None);
    assert!(evt.is_null());
    assert!(kernel.processes().switch_count() >= 2);
    let back_info = kernel.processes().process_info(back).unwrap();
    assert!(back_info.last_event_time.raw() > 1);
    // the boosted front process wins the CPU back after every slice
    assert_eq!(kernel.processes().current_process(), front);
}

#[test]
fn test_single_tasking_never_switches() {
    let config = KernelConfig::builder().multitasking(false).build();
    let (mut kernel, _) = setup(config, 1);
    let front = kernel.launch_application(&app("front")).unwrap();
    kernel
        .launch_application(&app("back").with_flags(LaunchFlags::DONT_SWITCH))
        .unwrap();
    let switches = kernel.processes().switch_count();

    let mut evt = EventRecord::default();
    kernel.wait_next_event(EventMask::EVERY, &mut evt, 30, None);
    kernel.wait_next_event(EventMask::EVERY, &mut evt, 30, None);
    assert_eq!(kernel.processes().switch_count(), switches);
    assert_eq!(kernel.processes().current_process(), front);
}

#[test]
fn test_get_next_event_can_yield() {
    let config = KernelConfig::builder().yield_on_get_next_event(true).build();
    let (mut kernel, _) = setup(config, 1);
    let back = kernel
        .launch_application(&app("back").with_flags(LaunchFlags::DONT_SWITCH))
        .unwrap();

    let mut evt = EventRecord::default();
    assert!(!kernel.get_next_event(EventMask::EVERY, &mut evt));
    assert_eq!(kernel.processes().current_process(), back);
    assert!(!kernel.get_next_event(EventMask::EVERY, &mut evt));
    assert_eq!(kernel.processes().current_process(), ProcessSerialNumber::SYSTEM);
}

static IDLE_PASSES: AtomicU32 = AtomicU32::new(0);

fn count_idle() {
    IDLE_PASSES.fetch_add(1, Ordering::SeqCst);
}

#[test]
fn test_idle_callback_runs_each_pass() {
    let config = KernelConfig::builder().idle_callback(count_idle).build();
    let (mut kernel, _) = setup(config, 1);
    let before = IDLE_PASSES.load(Ordering::SeqCst);
    let mut evt = EventRecord::default();
    kernel.wait_next_event(EventMask::EVERY, &mut evt, 5, None);
    assert_eq!(IDLE_PASSES.load(Ordering::SeqCst) - before, 5);
}
