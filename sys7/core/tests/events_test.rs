//! Event record and mask tests for sys7-core

use sys7_core::{
    click_message, key_message, os_event, EventKind, EventMask, EventRecord, Modifiers, Point,
    Ticks,
};

#[test]
fn test_mask_bit_per_kind() {
    for kind in EventKind::ALL {
        assert_eq!(kind.mask().bits(), 1 << kind.raw());
        assert!(EventMask::EVERY.contains(kind));
        assert!(!EventMask::NONE.contains(kind));
    }
}

#[test]
fn test_mask_union() {
    let mask = EventMask::MOUSE_DOWN | EventMask::MOUSE_UP;
    assert!(mask.contains(EventKind::MouseDown));
    assert!(mask.contains(EventKind::MouseUp));
    assert!(!mask.contains(EventKind::KeyDown));
    assert_eq!(mask.without(EventMask::MOUSE_UP), EventMask::MOUSE_DOWN);
}

#[test]
fn test_key_message_layout() {
    let evt = EventRecord::new(
        EventKind::KeyDown,
        key_message(b'a', 0x00),
        Ticks::new(1),
        Point::ORIGIN,
        Modifiers::NONE,
    );
    assert_eq!(evt.char_code(), b'a');
    assert_eq!(evt.key_code(), 0x00);

    let msg = key_message(b'.', 0x2F);
    assert_eq!(msg, 0x2F2E);
}

#[test]
fn test_click_count_in_high_word() {
    let evt = EventRecord::new(
        EventKind::MouseDown,
        click_message(2),
        Ticks::new(12),
        Point::new(52, 51),
        Modifiers::BTN_STATE,
    );
    assert_eq!(evt.click_count(), 2);
}

#[test]
fn test_mouse_moved_subtype() {
    let evt = EventRecord::new(
        EventKind::Os,
        os_event::mouse_moved_message(),
        Ticks::ZERO,
        Point::ORIGIN,
        Modifiers::NONE,
    );
    assert_eq!(evt.system_event_subtype(), Some(os_event::MOUSE_MOVED));
    assert!(evt.what.is_system_event());
    assert!(!EventKind::KeyDown.is_system_event());
}

#[test]
fn test_null_event_default() {
    let evt = EventRecord::default();
    assert!(evt.is_null());
    assert_eq!(evt.when, Ticks::ZERO);
}
