//! Modifier flags carried in every event record

use core::fmt;

/// The `modifiers` word of an event record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Modifiers(pub u16);

impl Modifiers {
    pub const NONE: Modifiers = Modifiers(0);
    /// `activeFlag` (activate events only)
    pub const ACTIVE_FLAG: Modifiers = Modifiers(0x0001);
    /// `btnState`: set while the mouse button is down
    pub const BTN_STATE: Modifiers = Modifiers(0x0080);
    pub const CMD_KEY: Modifiers = Modifiers(0x0100);
    pub const SHIFT_KEY: Modifiers = Modifiers(0x0200);
    pub const ALPHA_LOCK: Modifiers = Modifiers(0x0400);
    pub const OPTION_KEY: Modifiers = Modifiers(0x0800);
    pub const CONTROL_KEY: Modifiers = Modifiers(0x1000);
    pub const RIGHT_SHIFT_KEY: Modifiers = Modifiers(0x2000);
    pub const RIGHT_OPTION_KEY: Modifiers = Modifiers(0x4000);
    pub const RIGHT_CONTROL_KEY: Modifiers = Modifiers(0x8000);

    /// Every keyboard modifier bit.
    pub const KEYBOARD: Modifiers = Modifiers(0xFF00);

    pub const fn new(bits: u16) -> Self {
        Modifiers(bits)
    }

    pub const fn bits(self) -> u16 {
        self.0
    }

    pub const fn contains(self, other: Modifiers) -> bool {
        self.0 & other.0 == other.0 && other.0 != 0
    }

    pub const fn intersects(self, other: Modifiers) -> bool {
        self.0 & other.0 != 0
    }

    pub const fn union(self, other: Modifiers) -> Modifiers {
        Modifiers(self.0 | other.0)
    }

    pub fn insert(&mut self, other: Modifiers) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: Modifiers) {
        self.0 &= !other.0;
    }

    pub fn set(&mut self, other: Modifiers, on: bool) {
        if on {
            self.insert(other);
        } else {
            self.remove(other);
        }
    }

    /// Either shift key.
    pub const fn shift(self) -> bool {
        self.intersects(Modifiers(Self::SHIFT_KEY.0 | Self::RIGHT_SHIFT_KEY.0))
    }

    /// Either option key.
    pub const fn option(self) -> bool {
        self.intersects(Modifiers(Self::OPTION_KEY.0 | Self::RIGHT_OPTION_KEY.0))
    }

    /// Either control key.
    pub const fn control(self) -> bool {
        self.intersects(Modifiers(Self::CONTROL_KEY.0 | Self::RIGHT_CONTROL_KEY.0))
    }

    pub const fn command(self) -> bool {
        self.intersects(Self::CMD_KEY)
    }

    pub const fn alpha_lock(self) -> bool {
        self.intersects(Self::ALPHA_LOCK)
    }
}

impl core::ops::BitOr for Modifiers {
    type Output = Modifiers;

    fn bitor(self, rhs: Modifiers) -> Modifiers {
        self.union(rhs)
    }
}

impl fmt::Display for Modifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Modifiers({:#06x})", self.0)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Modifiers {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "Modifiers({=u16:#x})", self.0);
    }
}
