//! Dead-key accent composition

use sys7_core::{scan, Modifiers};

/// Accent armed by a dead key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DeadKey {
    Acute,
    Grave,
    Circumflex,
    Umlaut,
    Tilde,
}

impl DeadKey {
    /// Dead key produced by `scan_code` under `modifiers`, if any.
    ///
    /// Option+E, Option+`, Option+I, Option+U and Option+N are dead keys.
    /// Command suppresses them so menu shortcuts still work.
    pub fn for_key(scan_code: u8, modifiers: Modifiers) -> Option<DeadKey> {
        if !modifiers.option() || modifiers.command() {
            return None;
        }
        match scan_code {
            scan::E => Some(DeadKey::Acute),
            scan::GRAVE => Some(DeadKey::Grave),
            scan::I => Some(DeadKey::Circumflex),
            scan::U => Some(DeadKey::Umlaut),
            scan::N => Some(DeadKey::Tilde),
            _ => None,
        }
    }
}

/// Latin-1 character for `dead` applied to `base`.
pub fn compose(dead: DeadKey, base: u8) -> Option<u8> {
    let composed = match (dead, base) {
        (DeadKey::Acute, b'a') => 0xE1,
        (DeadKey::Acute, b'e') => 0xE9,
        (DeadKey::Acute, b'i') => 0xED,
        (DeadKey::Acute, b'o') => 0xF3,
        (DeadKey::Acute, b'u') => 0xFA,
        (DeadKey::Acute, b'A') => 0xC1,
        (DeadKey::Acute, b'E') => 0xC9,
        (DeadKey::Acute, b'I') => 0xCD,
        (DeadKey::Acute, b'O') => 0xD3,
        (DeadKey::Acute, b'U') => 0xDA,

        (DeadKey::Grave, b'a') => 0xE0,
        (DeadKey::Grave, b'e') => 0xE8,
        (DeadKey::Grave, b'i') => 0xEC,
        (DeadKey::Grave, b'o') => 0xF2,
        (DeadKey::Grave, b'u') => 0xF9,
        (DeadKey::Grave, b'A') => 0xC0,
        (DeadKey::Grave, b'E') => 0xC8,
        (DeadKey::Grave, b'I') => 0xCC,
        (DeadKey::Grave, b'O') => 0xD2,
        (DeadKey::Grave, b'U') => 0xD9,

        (DeadKey::Circumflex, b'a') => 0xE2,
        (DeadKey::Circumflex, b'e') => 0xEA,
        (DeadKey::Circumflex, b'i') => 0xEE,
        (DeadKey::Circumflex, b'o') => 0xF4,
        (DeadKey::Circumflex, b'u') => 0xFB,
        (DeadKey::Circumflex, b'A') => 0xC2,
        (DeadKey::Circumflex, b'E') => 0xCA,
        (DeadKey::Circumflex, b'I') => 0xCE,
        (DeadKey::Circumflex, b'O') => 0xD4,
        (DeadKey::Circumflex, b'U') => 0xDB,

        (DeadKey::Umlaut, b'a') => 0xE4,
        (DeadKey::Umlaut, b'e') => 0xEB,
        (DeadKey::Umlaut, b'i') => 0xEF,
        (DeadKey::Umlaut, b'o') => 0xF6,
        (DeadKey::Umlaut, b'u') => 0xFC,
        (DeadKey::Umlaut, b'A') => 0xC4,
        (DeadKey::Umlaut, b'E') => 0xCB,
        (DeadKey::Umlaut, b'I') => 0xCF,
        (DeadKey::Umlaut, b'O') => 0xD6,
        (DeadKey::Umlaut, b'U') => 0xDC,

        (DeadKey::Tilde, b'n') => 0xF1,
        (DeadKey::Tilde, b'a') => 0xE3,
        (DeadKey::Tilde, b'o') => 0xF5,
        (DeadKey::Tilde, b'N') => 0xD1,
        (DeadKey::Tilde, b'A') => 0xC3,
        (DeadKey::Tilde, b'O') => 0xD5,

        _ => return None,
    };
    Some(composed)
}

/// Pending dead key between keystrokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeadKeyState {
    pending: Option<DeadKey>,
    armed_at: u8,
}

impl DeadKeyState {
    pub const fn new() -> Self {
        Self {
            pending: None,
            armed_at: 0,
        }
    }

    /// Arms `dead`, replacing any accent already waiting.
    pub fn arm(&mut self, dead: DeadKey, scan_code: u8) {
        self.pending = Some(dead);
        self.armed_at = scan_code;
    }

    pub const fn is_waiting(&self) -> bool {
        self.pending.is_some()
    }

    pub const fn pending(&self) -> Option<DeadKey> {
        self.pending
    }

    /// Scan code of the dead key currently armed.
    pub const fn armed_scan_code(&self) -> Option<u8> {
        match self.pending {
            Some(_) => Some(self.armed_at),
            None => None,
        }
    }

    /// Applies the pending accent to `base` and clears the state. A base
    /// with no composed form passes through unchanged.
    pub fn resolve(&mut self, base: u8) -> u8 {
        match self.pending.take() {
            Some(dead) => compose(dead, base).unwrap_or(base),
            None => base,
        }
    }

    pub fn clear(&mut self) {
        self.pending = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_keys_are_dead() {
        assert_eq!(DeadKey::for_key(scan::E, Modifiers::OPTION_KEY), Some(DeadKey::Acute));
        assert_eq!(
            DeadKey::for_key(scan::N, Modifiers::RIGHT_OPTION_KEY),
            Some(DeadKey::Tilde)
        );
        assert_eq!(DeadKey::for_key(scan::E, Modifiers::NONE), None);
        assert_eq!(
            DeadKey::for_key(scan::E, Modifiers::OPTION_KEY | Modifiers::CMD_KEY),
            None
        );
        assert_eq!(DeadKey::for_key(scan::A, Modifiers::OPTION_KEY), None);
    }

    #[test]
    fn resolve_composes_then_clears() {
        let mut state = DeadKeyState::new();
        state.arm(DeadKey::Acute, scan::E);
        assert!(state.is_waiting());
        assert_eq!(state.resolve(b'e'), 0xE9);
        assert!(!state.is_waiting());
        assert_eq!(state.resolve(b'e'), b'e');
    }

    #[test]
    fn miss_passes_base_through() {
        let mut state = DeadKeyState::new();
        state.arm(DeadKey::Umlaut, scan::U);
        assert_eq!(state.resolve(b'x'), b'x');
        assert!(!state.is_waiting());
    }

    #[test]
    fn uppercase_compositions() {
        assert_eq!(compose(DeadKey::Grave, b'E'), Some(0xC8));
        assert_eq!(compose(DeadKey::Tilde, b'N'), Some(0xD1));
        assert_eq!(compose(DeadKey::Tilde, b'e'), None);
    }
}
