//! Event records, event kinds and event masks

use core::fmt;

use crate::{Modifiers, OsErr, Point, Ticks};

/// Classic event type code (the `what` field of an event record)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u16)]
pub enum EventKind {
    Null = 0,
    MouseDown = 1,
    MouseUp = 2,
    KeyDown = 3,
    KeyUp = 4,
    AutoKey = 5,
    Update = 6,
    Disk = 7,
    Activate = 8,
    Os = 15,
    HighLevel = 23,
}

impl EventKind {
    /// Every defined kind, in code order.
    pub const ALL: [EventKind; 11] = [
        EventKind::Null,
        EventKind::MouseDown,
        EventKind::MouseUp,
        EventKind::KeyDown,
        EventKind::KeyUp,
        EventKind::AutoKey,
        EventKind::Update,
        EventKind::Disk,
        EventKind::Activate,
        EventKind::Os,
        EventKind::HighLevel,
    ];

    /// Decode a wire value.
    pub const fn from_raw(code: u16) -> Option<Self> {
        match code {
            0 => Some(EventKind::Null),
            1 => Some(EventKind::MouseDown),
            2 => Some(EventKind::MouseUp),
            3 => Some(EventKind::KeyDown),
            4 => Some(EventKind::KeyUp),
            5 => Some(EventKind::AutoKey),
            6 => Some(EventKind::Update),
            7 => Some(EventKind::Disk),
            8 => Some(EventKind::Activate),
            15 => Some(EventKind::Os),
            23 => Some(EventKind::HighLevel),
            _ => None,
        }
    }

    /// Wire value.
    pub const fn raw(self) -> u16 {
        self as u16
    }

    /// Mask bit selecting this kind.
    pub const fn mask(self) -> EventMask {
        EventMask(1 << (self as u16))
    }

    /// Events generated by the system rather than by user input.
    pub const fn is_system_event(self) -> bool {
        matches!(
            self,
            EventKind::Update | EventKind::Activate | EventKind::Disk | EventKind::Os
        )
    }
}

impl TryFrom<u16> for EventKind {
    type Error = OsErr;

    fn try_from(code: u16) -> Result<Self, Self::Error> {
        EventKind::from_raw(code).ok_or(OsErr::ParamErr)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EventKind::Null => "nullEvent",
            EventKind::MouseDown => "mouseDown",
            EventKind::MouseUp => "mouseUp",
            EventKind::KeyDown => "keyDown",
            EventKind::KeyUp => "keyUp",
            EventKind::AutoKey => "autoKey",
            EventKind::Update => "updateEvt",
            EventKind::Disk => "diskEvt",
            EventKind::Activate => "activateEvt",
            EventKind::Os => "osEvt",
            EventKind::HighLevel => "kHighLevelEvent",
        };
        f.write_str(name)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for EventKind {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "EventKind({})", self.raw());
    }
}

/// Bit set of event kinds, `1 << what` per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EventMask(pub u32);

impl EventMask {
    pub const NONE: EventMask = EventMask(0);
    pub const MOUSE_DOWN: EventMask = EventKind::MouseDown.mask();
    pub const MOUSE_UP: EventMask = EventKind::MouseUp.mask();
    pub const KEY_DOWN: EventMask = EventKind::KeyDown.mask();
    pub const KEY_UP: EventMask = EventKind::KeyUp.mask();
    pub const AUTO_KEY: EventMask = EventKind::AutoKey.mask();
    pub const UPDATE: EventMask = EventKind::Update.mask();
    pub const DISK: EventMask = EventKind::Disk.mask();
    pub const ACTIVATE: EventMask = EventKind::Activate.mask();
    pub const OS: EventMask = EventKind::Os.mask();
    pub const HIGH_LEVEL: EventMask = EventKind::HighLevel.mask();
    /// `everyEvent`
    pub const EVERY: EventMask = EventMask(u32::MAX);
    /// Default system event mask: everything except `keyUp`.
    pub const SYSTEM_DEFAULT: EventMask = EventMask(0xFFFF_FFFF & !(1 << 4));

    pub const fn new(bits: u32) -> Self {
        EventMask(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, kind: EventKind) -> bool {
        self.0 & (1 << (kind as u16)) != 0
    }

    pub const fn union(self, other: EventMask) -> EventMask {
        EventMask(self.0 | other.0)
    }

    pub const fn without(self, other: EventMask) -> EventMask {
        EventMask(self.0 & !other.0)
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl core::ops::BitOr for EventMask {
    type Output = EventMask;

    fn bitor(self, rhs: EventMask) -> EventMask {
        self.union(rhs)
    }
}

impl core::ops::BitOrAssign for EventMask {
    fn bitor_assign(&mut self, rhs: EventMask) {
        self.0 |= rhs.0;
    }
}

impl From<EventKind> for EventMask {
    fn from(kind: EventKind) -> Self {
        kind.mask()
    }
}

impl fmt::Display for EventMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventMask({:#010x})", self.0)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for EventMask {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "EventMask({=u32:#x})", self.0);
    }
}

/// One posted or synthesized event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EventRecord {
    pub what: EventKind,
    pub message: i32,
    pub when: Ticks,
    /// Global mouse location (`where` in the classic record).
    pub location: Point,
    pub modifiers: Modifiers,
}

impl EventRecord {
    pub const fn new(
        what: EventKind,
        message: i32,
        when: Ticks,
        location: Point,
        modifiers: Modifiers,
    ) -> Self {
        Self {
            what,
            message,
            when,
            location,
            modifiers,
        }
    }

    /// A `nullEvent` stamped with the given state.
    pub const fn null(when: Ticks, location: Point, modifiers: Modifiers) -> Self {
        Self::new(EventKind::Null, 0, when, location, modifiers)
    }

    pub const fn is_null(&self) -> bool {
        matches!(self.what, EventKind::Null)
    }

    /// Low byte of a key event message.
    pub const fn char_code(&self) -> u8 {
        (self.message & 0xFF) as u8
    }

    /// Second byte of a key event message.
    pub const fn key_code(&self) -> u8 {
        ((self.message >> 8) & 0xFF) as u8
    }

    /// Click count carried in the high word of a `mouseDown` message.
    pub const fn click_count(&self) -> u8 {
        ((self.message >> 16) & 0xFF) as u8
    }

    /// Subtype of an `osEvt` (high byte) or `diskEvt` (third byte).
    pub const fn system_event_subtype(&self) -> Option<u8> {
        match self.what {
            EventKind::Os => Some(((self.message as u32) >> 24) as u8),
            EventKind::Disk => Some(((self.message as u32 >> 16) & 0xFF) as u8),
            _ => None,
        }
    }
}

impl Default for EventRecord {
    fn default() -> Self {
        EventRecord::null(Ticks::ZERO, Point::ORIGIN, Modifiers::NONE)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for EventRecord {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(
            fmt,
            "EventRecord{{what: {}, message: {=i32:#x}, when: {}}}",
            self.what,
            self.message,
            self.when
        );
    }
}

/// Packs a key event message: character in the low byte, scan code above it.
pub const fn key_message(char_code: u8, scan_code: u8) -> i32 {
    (char_code as i32) | ((scan_code as i32) << 8)
}

/// Packs the click count into the high word of a `mouseDown` message.
pub const fn click_message(click_count: u8) -> i32 {
    (click_count as i32) << 16
}

/// `osEvt` message payloads.
pub mod os_event {
    /// `mouseMovedMessage`
    pub const MOUSE_MOVED: u8 = 0xFA;
    /// `suspendResumeMessage`
    pub const SUSPEND_RESUME: u8 = 0x01;
    /// `resumeFlag`
    pub const RESUME_FLAG: i32 = 0x0000_0001;
    /// `convertClipboardFlag`
    pub const CONVERT_CLIPBOARD_FLAG: i32 = 0x0000_0002;

    /// Message for a mouse-moved `osEvt`.
    pub const fn mouse_moved_message() -> i32 {
        ((MOUSE_MOVED as u32) << 24) as i32
    }

    /// Message for a suspend or resume `osEvt`.
    pub const fn suspend_resume_message(resume: bool, convert_clipboard: bool) -> i32 {
        let mut message = ((SUSPEND_RESUME as u32) << 24) as i32;
        if resume {
            message |= RESUME_FLAG;
        }
        if convert_clipboard {
            message |= CONVERT_CLIPBOARD_FLAG;
        }
        message
    }

    /// True when an `osEvt` message announces a resume.
    pub const fn is_resume(message: i32) -> bool {
        ((message as u32) >> 24) as u8 == SUSPEND_RESUME && message & RESUME_FLAG != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_roundtrips_defined_codes_only() {
        for kind in EventKind::ALL {
            assert_eq!(EventKind::from_raw(kind.raw()), Some(kind));
        }
        assert_eq!(EventKind::from_raw(9), None);
        assert_eq!(EventKind::try_from(24), Err(OsErr::ParamErr));
    }

    #[test]
    fn system_default_mask_excludes_key_up() {
        assert!(!EventMask::SYSTEM_DEFAULT.contains(EventKind::KeyUp));
        assert!(EventMask::SYSTEM_DEFAULT.contains(EventKind::KeyDown));
        assert!(EventMask::SYSTEM_DEFAULT.contains(EventKind::HighLevel));
    }

    #[test]
    fn os_event_subtypes() {
        let evt = EventRecord::new(
            EventKind::Os,
            os_event::suspend_resume_message(true, false),
            Ticks::new(5),
            Point::ORIGIN,
            Modifiers::NONE,
        );
        assert_eq!(evt.system_event_subtype(), Some(os_event::SUSPEND_RESUME));
        assert!(os_event::is_resume(evt.message));
        assert!(!os_event::is_resume(os_event::suspend_resume_message(false, true)));
    }
}
