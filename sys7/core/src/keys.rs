//! Keyboard bitmap and scan codes

use core::fmt;

/// Scan codes of the Apple Extended keyboard (US layout).
pub mod scan {
    pub const A: u8 = 0x00;
    pub const S: u8 = 0x01;
    pub const D: u8 = 0x02;
    pub const E: u8 = 0x0E;
    pub const I: u8 = 0x22;
    pub const N: u8 = 0x2D;
    pub const U: u8 = 0x20;
    pub const O: u8 = 0x1F;
    pub const GRAVE: u8 = 0x32;
    pub const RETURN: u8 = 0x24;
    pub const TAB: u8 = 0x30;
    pub const SPACE: u8 = 0x31;
    pub const DELETE: u8 = 0x33;
    pub const ESCAPE: u8 = 0x35;
    pub const PERIOD: u8 = 0x2F;

    pub const COMMAND: u8 = 0x37;
    pub const SHIFT: u8 = 0x38;
    pub const CAPS_LOCK: u8 = 0x39;
    pub const OPTION: u8 = 0x3A;
    pub const CONTROL: u8 = 0x3B;
    pub const RIGHT_SHIFT: u8 = 0x3C;
    pub const RIGHT_OPTION: u8 = 0x3D;
    pub const RIGHT_CONTROL: u8 = 0x3E;
    pub const FUNCTION: u8 = 0x3F;

    /// Keys that only change modifier state.
    pub const fn is_modifier(code: u8) -> bool {
        matches!(code, COMMAND..=FUNCTION)
    }
}

/// Number of scan codes tracked by [`KeyMap`].
pub const KEY_MAP_BITS: usize = 128;

/// 128-bit set of keys currently held down, indexed by scan code.
///
/// Byte `n / 8`, bit `n % 8` holds scan code `n`, matching the byte layout
/// returned by `GetKeys`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KeyMap([u8; 16]);

impl KeyMap {
    pub const EMPTY: KeyMap = KeyMap([0; 16]);

    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        KeyMap(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// Marks `code` down or up. Codes outside the map are ignored.
    pub fn set(&mut self, code: u8, down: bool) {
        let idx = code as usize;
        if idx >= KEY_MAP_BITS {
            return;
        }
        let bit = 1u8 << (idx % 8);
        if down {
            self.0[idx / 8] |= bit;
        } else {
            self.0[idx / 8] &= !bit;
        }
    }

    pub const fn is_down(&self, code: u8) -> bool {
        let idx = code as usize;
        idx < KEY_MAP_BITS && self.0[idx / 8] & (1 << (idx % 8)) != 0
    }

    pub fn clear(&mut self) {
        self.0 = [0; 16];
    }

    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }

    /// Scan codes currently down, ascending.
    pub fn pressed(&self) -> impl Iterator<Item = u8> + '_ {
        (0..KEY_MAP_BITS as u8).filter(move |code| self.is_down(*code))
    }
}

impl fmt::Display for KeyMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("KeyMap[")?;
        for (i, code) in self.pressed().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{code:#04x}")?;
        }
        f.write_str("]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_clear_bits() {
        let mut map = KeyMap::EMPTY;
        map.set(scan::COMMAND, true);
        map.set(0x7F, true);
        map.set(0x80, true);
        assert!(map.is_down(scan::COMMAND));
        assert!(map.is_down(0x7F));
        assert!(!map.is_down(0x80));
        assert_eq!(map.as_bytes()[scan::COMMAND as usize / 8], 1 << 7);

        map.set(scan::COMMAND, false);
        assert_eq!(map.pressed().collect::<Vec<_>>(), vec![0x7F]);
    }

    #[test]
    fn modifier_range() {
        assert!(scan::is_modifier(scan::SHIFT));
        assert!(scan::is_modifier(scan::FUNCTION));
        assert!(!scan::is_modifier(scan::PERIOD));
    }
}
