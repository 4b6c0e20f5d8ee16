//! Raw hardware state to semantic input transitions.
//!
//! Drivers report absolute state (pointer position, button bitmask, one key
//! edge at a time). [`InputBridge`] diffs it against what it saw last and
//! yields the transitions the Event Manager turns into events. Modifier
//! tracking, caps lock, the key bitmap, dead keys and the Command-Period
//! abort latch live here too.

use heapless::Vec as HVec;
use sys7_core::{scan, KeyMap, Modifiers, Point, Ticks};

use crate::config::EventConfig;
use crate::deadkey::{DeadKey, DeadKeyState};
use crate::keytrans;

/// Buttons a driver may report; higher bits are ignored.
pub const MAX_MOUSE_BUTTONS: u16 = 3;
/// Pixels the pointer must travel with the button held before a drag starts.
pub const DRAG_THRESHOLD: u16 = 4;

/// Physical button bits in a raw button mask.
pub mod button {
    pub const LEFT: u16 = 0x01;
    pub const RIGHT: u16 = 0x02;
    pub const MIDDLE: u16 = 0x04;
}

/// One semantic input edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputTransition {
    MouseMoved { to: Point, when: Ticks },
    MouseDown { at: Point, when: Ticks },
    MouseUp { at: Point, when: Ticks },
    KeyDown { key_code: u8, char_code: u8, when: Ticks },
    KeyUp { key_code: u8, char_code: u8, when: Ticks },
}

/// Transitions produced by one raw packet.
pub type Transitions = HVec<InputTransition, 4>;

/// Per-device input state.
#[derive(Debug, Clone)]
pub struct InputBridge {
    mouse: Point,
    buttons: u16,
    primary_down: bool,
    last_mouse_down: Option<Ticks>,
    suppress_next_up: bool,
    drag_origin: Point,
    dragging: bool,
    key_modifiers: Modifiers,
    driver_modifiers: Modifiers,
    caps_lock: bool,
    keymap: KeyMap,
    dead_keys: DeadKeyState,
    abort: bool,
    left_handed: bool,
    debounce: u32,
    moved_threshold: Option<u16>,
}

impl InputBridge {
    pub fn new(config: &EventConfig) -> Self {
        Self {
            mouse: Point::ORIGIN,
            buttons: 0,
            primary_down: false,
            last_mouse_down: None,
            suppress_next_up: false,
            drag_origin: Point::ORIGIN,
            dragging: false,
            key_modifiers: Modifiers::NONE,
            driver_modifiers: Modifiers::NONE,
            caps_lock: false,
            keymap: KeyMap::EMPTY,
            dead_keys: DeadKeyState::new(),
            abort: false,
            left_handed: config.left_handed,
            debounce: config.mouse_down_debounce,
            moved_threshold: config.mouse_moved_threshold,
        }
    }

    /// Re-reads the tunables from `config`; tracked state is kept.
    pub fn configure(&mut self, config: &EventConfig) {
        self.left_handed = config.left_handed;
        self.debounce = config.mouse_down_debounce;
        self.moved_threshold = config.mouse_moved_threshold;
    }

    fn primary_bit(&self) -> u16 {
        if self.left_handed {
            button::RIGHT
        } else {
            button::LEFT
        }
    }

    /// Diffs a raw mouse packet against the previous state.
    ///
    /// Only the primary button produces `MouseDown`/`MouseUp`. A down that
    /// follows the previous down within the debounce window is treated as a
    /// duplicate hardware packet and dropped together with its up.
    pub fn mouse_packet(
        &mut self,
        x: i16,
        y: i16,
        buttons: u16,
        modifiers: Modifiers,
        when: Ticks,
    ) -> Transitions {
        let mut out = Transitions::new();
        let pos = Point::new(x, y);
        let old = self.mouse;
        self.mouse = pos;
        self.driver_modifiers = keyboard_bits(modifiers);

        if pos != old {
            if let Some(threshold) = self.moved_threshold {
                let (dx, dy) = pos.distance(old);
                if dx.max(dy) >= threshold {
                    let _ = out.push(InputTransition::MouseMoved { to: pos, when });
                }
            }
        }

        let buttons = buttons & ((1 << MAX_MOUSE_BUTTONS) - 1);
        let changed = buttons ^ self.buttons;
        let primary = self.primary_bit();
        self.buttons = buttons;

        if changed & primary != 0 {
            if buttons & primary != 0 {
                self.primary_down = true;
                self.drag_origin = pos;
                self.dragging = false;
                let duplicate = self.debounce > 0
                    && self
                        .last_mouse_down
                        .is_some_and(|last| when.elapsed_since(last) < self.debounce);
                self.last_mouse_down = Some(when);
                if duplicate {
                    log::debug!("input: dropped duplicate mouse-down at {when}");
                    self.suppress_next_up = true;
                } else {
                    let _ = out.push(InputTransition::MouseDown { at: pos, when });
                }
            } else {
                self.primary_down = false;
                self.dragging = false;
                if self.suppress_next_up {
                    self.suppress_next_up = false;
                } else {
                    let _ = out.push(InputTransition::MouseUp { at: pos, when });
                }
            }
        }

        if self.primary_down && !self.dragging {
            let (dx, dy) = pos.distance(self.drag_origin);
            if dx.max(dy) >= DRAG_THRESHOLD {
                self.dragging = true;
            }
        }

        out
    }

    /// Handles one key edge.
    ///
    /// Modifier keys update modifier state only. A dead key arms its accent
    /// and produces nothing; the next character key consumes it.
    pub fn key_packet(
        &mut self,
        scan_code: u8,
        is_down: bool,
        modifiers: Modifiers,
        when: Ticks,
    ) -> Transitions {
        let mut out = Transitions::new();
        self.keymap.set(scan_code, is_down);
        self.driver_modifiers = keyboard_bits(modifiers);

        if scan::is_modifier(scan_code) {
            self.track_modifier(scan_code, is_down);
            return out;
        }

        let effective = self.modifiers();
        if is_down {
            if let Some(dead) = DeadKey::for_key(scan_code, effective) {
                log::trace!("input: dead key {dead:?} armed");
                self.dead_keys.arm(dead, scan_code);
                return out;
            }
            let mut char_code = keytrans::translate(scan_code, effective);
            if self.dead_keys.is_waiting() && char_code != 0 {
                char_code = self.dead_keys.resolve(char_code);
            }
            if scan_code == scan::PERIOD && effective.command() {
                self.abort = true;
            }
            let _ = out.push(InputTransition::KeyDown {
                key_code: scan_code,
                char_code,
                when,
            });
        } else {
            if self.dead_keys.armed_scan_code() == Some(scan_code) {
                return out;
            }
            let char_code = keytrans::translate(scan_code, effective);
            if scan_code == scan::PERIOD {
                self.abort = false;
            }
            let _ = out.push(InputTransition::KeyUp {
                key_code: scan_code,
                char_code,
                when,
            });
        }
        out
    }

    fn track_modifier(&mut self, scan_code: u8, is_down: bool) {
        let bit = match scan_code {
            scan::COMMAND => Modifiers::CMD_KEY,
            scan::SHIFT => Modifiers::SHIFT_KEY,
            scan::OPTION => Modifiers::OPTION_KEY,
            scan::CONTROL => Modifiers::CONTROL_KEY,
            scan::RIGHT_SHIFT => Modifiers::RIGHT_SHIFT_KEY,
            scan::RIGHT_OPTION => Modifiers::RIGHT_OPTION_KEY,
            scan::RIGHT_CONTROL => Modifiers::RIGHT_CONTROL_KEY,
            scan::CAPS_LOCK => {
                if is_down {
                    self.caps_lock = !self.caps_lock;
                }
                return;
            }
            _ => return,
        };
        self.key_modifiers.set(bit, is_down);
        if scan_code == scan::COMMAND && !is_down {
            self.abort = false;
        }
    }

    /// Current modifier word, `btnState` included while the primary button
    /// is down.
    pub fn modifiers(&self) -> Modifiers {
        let mut mods = self.key_modifiers.union(self.driver_modifiers);
        mods.set(Modifiers::ALPHA_LOCK, self.caps_lock);
        mods.set(Modifiers::BTN_STATE, self.primary_down);
        mods
    }

    pub fn mouse(&self) -> Point {
        self.mouse
    }

    /// Moves the pointer without generating transitions.
    pub fn set_mouse(&mut self, pos: Point) {
        self.mouse = pos;
    }

    /// Overrides the primary button state without generating transitions.
    pub fn set_button(&mut self, down: bool) {
        self.primary_down = down;
        let primary = self.primary_bit();
        if down {
            self.buttons |= primary;
        } else {
            self.buttons &= !primary;
            self.dragging = false;
        }
    }

    pub fn button(&self) -> bool {
        self.primary_down
    }

    /// Raw mask of all buttons held.
    pub fn buttons(&self) -> u16 {
        self.buttons
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn keymap(&self) -> KeyMap {
        self.keymap
    }

    pub fn is_key_down(&self, scan_code: u8) -> bool {
        self.keymap.is_down(scan_code)
    }

    pub fn caps_lock(&self) -> bool {
        self.caps_lock
    }

    pub fn dead_key_pending(&self) -> Option<DeadKey> {
        self.dead_keys.pending()
    }

    /// Command-Period latch.
    pub fn abort_pressed(&self) -> bool {
        self.abort
            || (self.keymap.is_down(scan::COMMAND) && self.keymap.is_down(scan::PERIOD))
    }

    pub fn clear_abort(&mut self) {
        self.abort = false;
    }
}

// Caps lock is tracked from key edges, not from driver reports.
fn keyboard_bits(modifiers: Modifiers) -> Modifiers {
    Modifiers::new(modifiers.bits() & Modifiers::KEYBOARD.bits() & !Modifiers::ALPHA_LOCK.bits())
}
