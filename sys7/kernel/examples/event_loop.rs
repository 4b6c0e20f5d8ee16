//! Classic event loop over the global API.
//!
//! A driver thread feeds keyboard and mouse packets into the raw input
//! queue while the main loop calls `WaitNextEvent` and dispatches on the
//! event kind. Command-Period ends the loop.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use sys7_core::{scan, EventKind, EventMask, EventRecord, HostClock, Modifiers, OsType, Ticks};
use sys7_evt::RawInput;
use sys7_kernel::{api, KernelConfig};
use sys7_proc::{LaunchFlags, LaunchSpec};

fn main() {
    api::init(KernelConfig::default(), Arc::new(HostClock::new()));

    let editor = api::launch_application(&LaunchSpec::new(
        "Editor",
        OsType::from_bytes(*b"EDIT"),
        256 * 1024,
    ))
    .expect("launch editor");
    api::launch_application(
        &LaunchSpec::new("Clock", OsType::from_bytes(*b"CLOK"), 32 * 1024)
            .with_flags(LaunchFlags::DONT_SWITCH),
    )
    .expect("launch clock");
    println!("front process: {editor}");

    let driver = thread::spawn(|| {
        let packets = [
            (scan::A, true),
            (scan::A, false),
            (scan::S, true),
            (scan::S, false),
            (scan::COMMAND, true),
            (scan::PERIOD, true),
        ];
        for (i, (key, down)) in packets.into_iter().enumerate() {
            thread::sleep(Duration::from_millis(50));
            let timestamp = Ticks::new(api::tick_count());
            if i == 2 {
                let _ = api::post_raw_input(RawInput::Mouse {
                    x: 100,
                    y: 80,
                    buttons: 1,
                    modifiers: Modifiers::NONE,
                    timestamp,
                });
            }
            let _ = api::post_raw_input(RawInput::Key {
                scan_code: u16::from(key),
                is_down: down,
                modifiers: Modifiers::NONE,
                timestamp,
            });
        }
    });

    let mut event = EventRecord::default();
    loop {
        api::wait_next_event(EventMask::EVERY, &mut event, 30, None);
        match event.what {
            EventKind::Null => {}
            EventKind::KeyDown | EventKind::AutoKey => {
                println!(
                    "{} '{}' (scan {:#04x}) at {}",
                    event.what,
                    char::from(event.char_code()),
                    event.key_code(),
                    event.when
                );
                if api::check_abort() {
                    println!("command-period, quitting");
                    break;
                }
            }
            EventKind::MouseDown => {
                println!("click x{} at {:?}", event.click_count(), event.location);
            }
            other => println!("{other}: message {:#010x}", event.message),
        }
    }

    let _ = driver.join();
}
