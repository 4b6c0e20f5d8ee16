//! Event dispatch tests for sys7-evt

use std::sync::Arc;

use sys7_core::{
    scan, EventKind, EventMask, EventRecord, ManualClock, Modifiers, OsErr, Point, Ticks,
};
use sys7_evt::{EventConfig, EventManager, OverflowPolicy, RawInput, RawInputQueue};

fn setup(config: EventConfig) -> (EventManager, ManualClock) {
    let clock = ManualClock::new(Ticks::new(1));
    let mgr = EventManager::new(config, Arc::new(clock.clone()));
    (mgr, clock)
}

fn next(mgr: &mut EventManager, mask: EventMask) -> Option<EventRecord> {
    let mut evt = EventRecord::default();
    mgr.get_next_event(mask, &mut evt).then_some(evt)
}

#[test]
fn test_fifo_order() {
    let (mut mgr, _) = setup(EventConfig::default());
    let kinds = [
        EventKind::KeyDown,
        EventKind::MouseUp,
        EventKind::Update,
        EventKind::AutoKey,
        EventKind::Disk,
    ];
    for (i, kind) in kinds.iter().enumerate() {
        mgr.post_event(*kind, i as i32).expect("posted");
    }
    for (i, kind) in kinds.iter().enumerate() {
        let evt = next(&mut mgr, EventMask::EVERY).expect("queued");
        assert_eq!(evt.what, *kind);
        assert_eq!(evt.message, i as i32);
    }
    assert!(next(&mut mgr, EventMask::EVERY).is_none());
}

#[test]
fn test_mask_filtering_leaves_event_queued() {
    let (mut mgr, _) = setup(EventConfig::default());
    mgr.post_event(EventKind::KeyDown, 0x61).expect("posted");

    let mut evt = EventRecord::default();
    assert!(!mgr.get_next_event(EventMask::MOUSE_UP, &mut evt));
    assert_eq!(evt.what, EventKind::Null);

    let evt = next(&mut mgr, EventMask::EVERY).expect("still queued");
    assert_eq!(evt.what, EventKind::KeyDown);
    assert_eq!(evt.message, 0x61);
}

#[test]
fn test_peek_then_consume() {
    let (mut mgr, _) = setup(EventConfig::default());
    mgr.post_event(EventKind::Update, 5).expect("posted");

    let mut peeked = EventRecord::default();
    assert!(mgr.event_avail(EventMask::UPDATE, &mut peeked));
    let taken = next(&mut mgr, EventMask::UPDATE).expect("consumed");
    assert_eq!(peeked, taken);
    assert!(next(&mut mgr, EventMask::UPDATE).is_none());
}

#[test]
fn test_null_event_on_miss_is_stamped() {
    let (mut mgr, clock) = setup(EventConfig::default());
    clock.set(Ticks::new(77));
    mgr.update_mouse_state(Point::new(3, 4), false);
    let mut evt = EventRecord::default();
    assert!(!mgr.event_avail(EventMask::EVERY, &mut evt));
    assert_eq!(evt, EventRecord::null(Ticks::new(77), Point::new(3, 4), Modifiers::NONE));
}

#[test]
fn test_flush_stops_at_stop_mask() {
    let (mut mgr, _) = setup(EventConfig::default());
    mgr.post_event(EventKind::KeyDown, 1).expect("posted");
    mgr.post_event(EventKind::Update, 2).expect("posted");
    mgr.post_event(EventKind::KeyDown, 3).expect("posted");
    mgr.post_event(EventKind::Disk, 4).expect("posted");
    mgr.post_event(EventKind::KeyDown, 5).expect("posted");

    assert_eq!(mgr.flush_events(EventMask::KEY_DOWN, EventMask::DISK), 2);

    let rest: Vec<_> = std::iter::from_fn(|| next(&mut mgr, EventMask::EVERY))
        .map(|e| e.message)
        .collect();
    assert_eq!(rest, vec![2, 4, 5]);
}

#[test]
fn test_queue_full_reject() {
    let config = EventConfig::builder().queue_size(2).build();
    let (mut mgr, _) = setup(config);
    mgr.post_event(EventKind::Update, 1).expect("posted");
    mgr.post_event(EventKind::Update, 2).expect("posted");
    assert_eq!(mgr.post_event(EventKind::Update, 3), Err(OsErr::QueueFull));
    assert_eq!(next(&mut mgr, EventMask::EVERY).map(|e| e.message), Some(1));
    assert_eq!(mgr.stats().rejected_full, 1);
}

#[test]
fn test_queue_full_evict_oldest() {
    let config = EventConfig::builder()
        .queue_size(2)
        .overflow(OverflowPolicy::EvictOldest)
        .build();
    let (mut mgr, _) = setup(config);
    for i in 1..=3 {
        mgr.post_event(EventKind::Update, i).expect("posted");
    }
    assert_eq!(next(&mut mgr, EventMask::EVERY).map(|e| e.message), Some(2));
    assert_eq!(next(&mut mgr, EventMask::EVERY).map(|e| e.message), Some(3));
    assert_eq!(mgr.stats().evicted, 1);
}

#[test]
fn test_double_click_scenario() {
    let config = EventConfig::builder().timing(30, 32).click_slop(5).build();
    let (mut mgr, clock) = setup(config);

    clock.set(Ticks::new(10));
    mgr.update_mouse_state(Point::new(50, 50), true);
    mgr.post_event(EventKind::MouseDown, 0).expect("posted");
    assert_eq!(mgr.get_click_count(), 1);

    clock.set(Ticks::new(12));
    mgr.update_mouse_state(Point::new(52, 51), true);
    mgr.post_event(EventKind::MouseDown, 0).expect("posted");
    assert_eq!(mgr.get_click_count(), 2);

    let first = next(&mut mgr, EventMask::MOUSE_DOWN).expect("first click");
    let second = next(&mut mgr, EventMask::MOUSE_DOWN).expect("second click");
    assert_eq!(first.click_count(), 1);
    assert_eq!(second.click_count(), 2);
    assert_eq!(second.when, Ticks::new(12));
}

#[test]
fn test_click_boundaries() {
    let config = EventConfig::builder().timing(30, 32).click_slop(5).build();
    let (mut mgr, _) = setup(config);

    mgr.post_stamped(EventKind::MouseDown, 0, Ticks::new(100), Point::new(10, 10))
        .expect("posted");
    let evt = mgr
        .post_stamped(EventKind::MouseDown, 0, Ticks::new(130), Point::new(10, 10))
        .expect("posted");
    assert_eq!(evt.click_count(), 2);

    mgr.reset_click_sequence();
    mgr.post_stamped(EventKind::MouseDown, 0, Ticks::new(200), Point::new(10, 10))
        .expect("posted");
    let evt = mgr
        .post_stamped(EventKind::MouseDown, 0, Ticks::new(231), Point::new(10, 10))
        .expect("posted");
    assert_eq!(evt.click_count(), 1);

    let evt = mgr
        .post_stamped(EventKind::MouseDown, 0, Ticks::new(232), Point::new(16, 10))
        .expect("posted");
    assert_eq!(evt.click_count(), 1);
}

#[test]
fn test_raw_mouse_click_posts_down_and_up() {
    let (mut mgr, _) = setup(EventConfig::default());
    assert_eq!(mgr.process_raw_mouse_event(20, 30, 1, Modifiers::NONE, Ticks::new(5)), 1);
    assert!(mgr.button());
    assert_eq!(mgr.process_raw_mouse_event(20, 30, 0, Modifiers::NONE, Ticks::new(8)), 1);

    let down = next(&mut mgr, EventMask::EVERY).expect("down");
    assert_eq!(down.what, EventKind::MouseDown);
    assert_eq!(down.location, Point::new(20, 30));
    assert_eq!(down.when, Ticks::new(5));
    assert!(down.modifiers.contains(Modifiers::BTN_STATE));
    let up = next(&mut mgr, EventMask::EVERY).expect("up");
    assert_eq!(up.what, EventKind::MouseUp);
    assert!(!up.modifiers.contains(Modifiers::BTN_STATE));
}

#[test]
fn test_raw_keyboard_and_auto_repeat() {
    let (mut mgr, clock) = setup(EventConfig::builder().key_repeat(10, 4).build());
    clock.set(Ticks::new(100));
    assert_eq!(
        mgr.process_raw_keyboard_event(scan::A as u16, true, Modifiers::NONE, Ticks::new(100)),
        1
    );
    let down = next(&mut mgr, EventMask::EVERY).expect("keyDown");
    assert_eq!(down.what, EventKind::KeyDown);
    assert_eq!(down.char_code(), b'a');
    assert_eq!(down.key_code(), scan::A);

    clock.set(Ticks::new(113));
    assert!(!mgr.tick());
    clock.set(Ticks::new(114));
    assert!(mgr.tick());
    let auto = next(&mut mgr, EventMask::EVERY).expect("autoKey");
    assert_eq!(auto.what, EventKind::AutoKey);
    assert_eq!(auto.char_code(), b'a');

    // keyUp is masked out by default but still stops the repeat
    assert_eq!(
        mgr.process_raw_keyboard_event(scan::A as u16, false, Modifiers::NONE, Ticks::new(115)),
        0
    );
    clock.set(Ticks::new(200));
    assert!(!mgr.tick());
}

#[test]
fn test_check_abort_and_keys() {
    let (mut mgr, _) = setup(EventConfig::default());
    mgr.process_raw_keyboard_event(scan::COMMAND as u16, true, Modifiers::NONE, Ticks::new(1));
    assert!(mgr.is_modifier_down(Modifiers::CMD_KEY));
    assert!(!mgr.check_abort());
    mgr.process_raw_keyboard_event(scan::PERIOD as u16, true, Modifiers::NONE, Ticks::new(2));
    assert!(mgr.check_abort());
    assert!(mgr.get_keys().is_down(scan::PERIOD));
    assert_eq!(mgr.process_raw_keyboard_event(0x1FF, true, Modifiers::NONE, Ticks::new(3)), 0);
}

#[test]
fn test_pump_drains_raw_queue() {
    let (mut mgr, _) = setup(EventConfig::default());
    let raw: RawInputQueue<8> = RawInputQueue::new();
    raw.push(RawInput::Mouse {
        x: 1,
        y: 1,
        buttons: 1,
        modifiers: Modifiers::NONE,
        timestamp: Ticks::new(3),
    })
    .expect("room");
    raw.push(RawInput::Key {
        scan_code: scan::S as u16,
        is_down: true,
        modifiers: Modifiers::SHIFT_KEY,
        timestamp: Ticks::new(4),
    })
    .expect("room");

    assert_eq!(mgr.pump(&raw, 16), 2);
    assert!(raw.is_empty());
    assert_eq!(next(&mut mgr, EventMask::KEY_DOWN).map(|e| e.char_code()), Some(b'S'));
}

#[test]
fn test_timing_parameters() {
    let (mut mgr, _) = setup(EventConfig::default());
    assert_eq!(mgr.get_dbl_time(), 30);
    assert_eq!(mgr.get_caret_time(), 32);
    mgr.set_timing_parameters(20, 40);
    assert_eq!((mgr.get_dbl_time(), mgr.get_caret_time()), (20, 40));
    mgr.set_key_repeat(12, 2);
    assert_eq!(mgr.key_repeat(), (12, 2));
}
