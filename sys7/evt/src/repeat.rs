//! Keyboard auto-repeat

use sys7_core::Ticks;

/// A key due for an `autoKey` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepeatKey {
    pub key_code: u8,
    pub char_code: u8,
}

/// Single-key auto-repeat state machine.
///
/// Only the most recently pressed key repeats. The engine is driven by
/// [`AutoRepeatEngine::poll`] from the tick-processing pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoRepeatEngine {
    key_code: u8,
    char_code: u8,
    start_time: Ticks,
    last_repeat_time: Ticks,
    initial_delay: u32,
    repeat_rate: u32,
    active: bool,
    enabled: bool,
}

impl AutoRepeatEngine {
    pub const fn new(initial_delay: u32, repeat_rate: u32) -> Self {
        Self {
            key_code: 0,
            char_code: 0,
            start_time: Ticks::ZERO,
            last_repeat_time: Ticks::ZERO,
            initial_delay,
            repeat_rate,
            active: false,
            enabled: true,
        }
    }

    /// Arms repeat for a freshly pressed key, replacing any repeating key.
    pub fn key_down(&mut self, key_code: u8, char_code: u8, now: Ticks) {
        if self.active && self.key_code != key_code {
            log::trace!("auto-repeat: {:#04x} replaced by {:#04x}", self.key_code, key_code);
        }
        self.key_code = key_code;
        self.char_code = char_code;
        self.start_time = now;
        self.last_repeat_time = now.wrapping_add(self.initial_delay);
        self.active = true;
    }

    /// Stops repeating if `key_code` is the repeating key. Returns true if
    /// it was.
    pub fn key_up(&mut self, key_code: u8) -> bool {
        if self.active && self.key_code == key_code {
            self.active = false;
            true
        } else {
            false
        }
    }

    pub fn stop(&mut self) {
        self.active = false;
    }

    /// `SetAutoRepeatEnabled`; disabling also stops the current key.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.active = false;
        }
    }

    /// `SetKeyRepeat(delay, rate)`
    pub fn set_timing(&mut self, initial_delay: u32, repeat_rate: u32) {
        self.initial_delay = initial_delay;
        self.repeat_rate = repeat_rate;
    }

    /// Returns the key to emit as `autoKey` if one is due at `now`.
    ///
    /// Elapsed time is measured from the last repeat, or from the end of the
    /// initial delay for the first repeat. Times before that point never
    /// fire.
    pub fn poll(&mut self, now: Ticks) -> Option<RepeatKey> {
        if !self.active || !self.enabled {
            return None;
        }
        if !now.is_at_or_after(self.last_repeat_time) {
            return None;
        }
        if now.elapsed_since(self.last_repeat_time) < self.repeat_rate {
            return None;
        }
        self.last_repeat_time = now;
        Some(RepeatKey {
            key_code: self.key_code,
            char_code: self.char_code,
        })
    }

    pub const fn is_active(&self) -> bool {
        self.active
    }

    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub const fn key_code(&self) -> Option<u8> {
        if self.active {
            Some(self.key_code)
        } else {
            None
        }
    }

    pub const fn start_time(&self) -> Ticks {
        self.start_time
    }

    pub const fn timing(&self) -> (u32, u32) {
        (self.initial_delay, self.repeat_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_repeat_after_delay_plus_rate() {
        let mut engine = AutoRepeatEngine::new(24, 6);
        engine.key_down(0x00, b'a', Ticks::new(100));

        assert_eq!(engine.poll(Ticks::new(101)), None);
        assert_eq!(engine.poll(Ticks::new(124)), None);
        assert_eq!(engine.poll(Ticks::new(129)), None);
        assert_eq!(
            engine.poll(Ticks::new(130)),
            Some(RepeatKey { key_code: 0x00, char_code: b'a' })
        );
        assert_eq!(engine.poll(Ticks::new(135)), None);
        assert!(engine.poll(Ticks::new(136)).is_some());
    }

    #[test]
    fn key_up_of_other_key_keeps_repeating() {
        let mut engine = AutoRepeatEngine::new(0, 1);
        engine.key_down(0x00, b'a', Ticks::new(10));
        engine.key_down(0x01, b's', Ticks::new(11));
        assert!(!engine.key_up(0x00));
        assert_eq!(engine.poll(Ticks::new(12)).map(|k| k.char_code), Some(b's'));
        assert!(engine.key_up(0x01));
        assert_eq!(engine.poll(Ticks::new(20)), None);
    }

    #[test]
    fn disabling_clears_active() {
        let mut engine = AutoRepeatEngine::new(0, 1);
        engine.key_down(0x00, b'a', Ticks::new(10));
        engine.set_enabled(false);
        assert!(!engine.is_active());
        assert_eq!(engine.poll(Ticks::new(50)), None);
    }
}
