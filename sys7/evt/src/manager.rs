//! Event dispatch: the public Event Manager surface.

use core::fmt;

use sys7_core::trace::{self, records};
use sys7_core::{
    click_message, key_message, os_event, EventKind, EventMask, EventRecord, KeyMap, Modifiers,
    OsErr, OsResult, Point, SharedClock, Ticks, TraceHook,
};

use crate::click::ClickClassifier;
use crate::config::EventConfig;
use crate::ingest::{RawInput, RawInputQueue};
use crate::input::{InputBridge, InputTransition};
use crate::queue::EventQueue;
use crate::repeat::AutoRepeatEngine;

/// Counters kept by the Event Manager.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventStats {
    pub posted: u32,
    pub not_enabled: u32,
    pub rejected_full: u32,
    pub evicted: u32,
    pub delivered: u32,
}

/// Event queue, dispatch and input state.
pub struct EventManager {
    config: EventConfig,
    clock: SharedClock,
    queue: EventQueue,
    input: InputBridge,
    clicks: ClickClassifier,
    repeat: AutoRepeatEngine,
    system_mask: EventMask,
    trace: Option<TraceHook>,
    stats: EventStats,
}

impl EventManager {
    /// `InitEvents` with an explicit configuration.
    pub fn new(config: EventConfig, clock: SharedClock) -> Self {
        let mut repeat = AutoRepeatEngine::new(config.key_repeat_delay, config.key_repeat_rate);
        repeat.set_enabled(config.auto_repeat_enabled);
        log::debug!(
            "event manager: queue {} ({:?}), mask {}",
            config.queue_size,
            config.overflow,
            config.system_event_mask
        );
        Self {
            queue: EventQueue::new(config.queue_size, config.overflow),
            input: InputBridge::new(&config),
            clicks: ClickClassifier::new(config.double_click_ticks, config.click_slop),
            repeat,
            system_mask: config.system_event_mask,
            config,
            clock,
            trace: None,
            stats: EventStats::default(),
        }
    }

    pub fn with_trace_hook(mut self, hook: TraceHook) -> Self {
        self.trace = Some(hook);
        self
    }

    pub fn set_trace_hook(&mut self, hook: Option<TraceHook>) {
        self.trace = hook;
    }

    /// `InitEvents(numEvents)`: discards queued events and resizes the pool.
    /// Non-positive sizes select the default.
    pub fn init_events(&mut self, queue_size: i32) -> OsResult<()> {
        let size = EventConfig::clamp_queue_size(queue_size);
        self.config.queue_size = size;
        self.queue = EventQueue::new(size, self.config.overflow);
        self.clicks.reset();
        self.repeat.stop();
        log::debug!("event manager: InitEvents({queue_size}) -> {size} entries");
        Ok(())
    }

    pub fn config(&self) -> &EventConfig {
        &self.config
    }

    pub fn stats(&self) -> EventStats {
        self.stats
    }

    pub fn queue(&self) -> &EventQueue {
        &self.queue
    }

    /// `TickCount`
    pub fn ticks(&self) -> Ticks {
        self.clock.ticks()
    }

    pub fn clock(&self) -> &SharedClock {
        &self.clock
    }

    // ---- posting ------------------------------------------------------

    /// `PostEvent`: stamps the event with the current tick, mouse location
    /// and modifiers.
    pub fn post_event(&mut self, what: EventKind, message: i32) -> OsResult<()> {
        self.ppost_event(what, message).map(|_| ())
    }

    /// `PPostEvent`: like [`post_event`](Self::post_event) but returns the
    /// record as queued.
    pub fn ppost_event(&mut self, what: EventKind, message: i32) -> OsResult<EventRecord> {
        let when = self.clock.ticks();
        let location = self.input.mouse();
        self.post_stamped(what, message, when, location)
    }

    /// Trap-level `PostEvent` taking a raw event code.
    pub fn post_event_raw(&mut self, code: u16, message: i32) -> OsResult<()> {
        let what = EventKind::try_from(code)?;
        self.post_event(what, message)
    }

    /// Posts with an explicit timestamp and location; modifiers come from
    /// the current input state.
    ///
    /// A `mouseDown` is numbered by the click classifier here, and the count
    /// replaces the high word of its message. A rejected `mouseDown` leaves
    /// the click sequence untouched.
    pub fn post_stamped(
        &mut self,
        what: EventKind,
        message: i32,
        when: Ticks,
        location: Point,
    ) -> OsResult<EventRecord> {
        if !self.system_mask.contains(what) {
            self.stats.not_enabled += 1;
            log::trace!("event manager: {what} not enabled, dropped");
            trace::emit(self.trace.as_ref(), records::evt::POST_REJECTED, &[what.raw() as u8, 0]);
            return Err(OsErr::EvtNotEnb);
        }

        let clicks = self.clicks;
        let mut message = message;
        if what == EventKind::MouseDown {
            let count = self.clicks.classify(location, when);
            message = (message & 0xFFFF) | click_message(count);
            trace::emit(self.trace.as_ref(), records::evt::CLICK, &[count]);
        }

        let record = EventRecord::new(what, message, when, location, self.input.modifiers());
        match self.queue.push(record) {
            Ok(evicted) => {
                if let Some(old) = evicted {
                    self.stats.evicted += 1;
                    log::warn!("event manager: queue full, evicted {} from {}", old.what, old.when);
                    trace::emit(self.trace.as_ref(), records::evt::EVICT, &[old.what.raw() as u8]);
                }
                self.stats.posted += 1;
                log::trace!("event manager: posted {what} msg={message:#x} at {when}");
                self.emit_record(records::evt::POST, &record);
                Ok(record)
            }
            Err(err) => {
                self.clicks = clicks;
                self.stats.rejected_full += 1;
                log::warn!("event manager: queue full, {what} rejected");
                trace::emit(self.trace.as_ref(), records::evt::POST_REJECTED, &[what.raw() as u8, 1]);
                Err(err)
            }
        }
    }

    // ---- retrieval ----------------------------------------------------

    /// A `nullEvent` reflecting the current time, mouse and modifiers.
    pub fn null_event(&self) -> EventRecord {
        EventRecord::null(self.clock.ticks(), self.input.mouse(), self.input.modifiers())
    }

    /// `GetNextEvent`: removes and returns the first queued event matching
    /// `mask`. On a miss `out` receives a `nullEvent` and the result is false.
    pub fn get_next_event(&mut self, mask: EventMask, out: &mut EventRecord) -> bool {
        match self.queue.take(mask) {
            Some(record) => {
                *out = record;
                self.stats.delivered += 1;
                self.emit_record(records::evt::GET, &record);
                true
            }
            None => {
                *out = self.null_event();
                false
            }
        }
    }

    /// `EventAvail`: same scan as [`get_next_event`](Self::get_next_event),
    /// leaving the queue untouched.
    pub fn event_avail(&self, mask: EventMask, out: &mut EventRecord) -> bool {
        match self.queue.peek(mask) {
            Some(record) => {
                *out = record;
                true
            }
            None => {
                *out = self.null_event();
                false
            }
        }
    }

    /// `FlushEvents(whichMask, stopMask)`. Returns the number removed.
    pub fn flush_events(&mut self, which: EventMask, stop: EventMask) -> usize {
        let removed = self.queue.flush(which, stop);
        if removed > 0 {
            log::debug!("event manager: flushed {removed} events ({which}, stop {stop})");
        }
        let count = removed.min(u8::MAX as usize) as u8;
        trace::emit(self.trace.as_ref(), records::evt::FLUSH, &[count]);
        removed
    }

    /// `SystemEvent`: true for records the system handles before the
    /// application sees them (`osEvt` and `activateEvt`).
    pub fn system_event(record: &EventRecord) -> bool {
        matches!(record.what, EventKind::Os | EventKind::Activate)
    }

    // ---- state queries --------------------------------------------------

    /// `GetMouse` (global coordinates).
    pub fn get_mouse(&self) -> Point {
        self.input.mouse()
    }

    /// `GetKeys`
    pub fn get_keys(&self) -> KeyMap {
        self.input.keymap()
    }

    /// `Button`
    pub fn button(&self) -> bool {
        self.input.button()
    }

    /// `StillDown`: the button is held and no further mouse event is queued.
    pub fn still_down(&self) -> bool {
        self.input.button()
            && self
                .queue
                .peek(EventMask::MOUSE_DOWN | EventMask::MOUSE_UP)
                .is_none()
    }

    /// `WaitMouseUp`, non-blocking: true while [`still_down`](Self::still_down)
    /// holds; otherwise consumes the pending `mouseUp` if any and returns
    /// false.
    pub fn wait_mouse_up(&mut self) -> bool {
        if self.still_down() {
            return true;
        }
        let _ = self.queue.take(EventMask::MOUSE_UP);
        false
    }

    /// `GetDblTime`
    pub fn get_dbl_time(&self) -> u32 {
        self.clicks.threshold()
    }

    /// `GetCaretTime`
    pub fn get_caret_time(&self) -> u32 {
        self.config.caret_ticks
    }

    /// Sets double-click and caret times, in ticks.
    pub fn set_timing_parameters(&mut self, double_click: u32, caret: u32) {
        self.config.double_click_ticks = double_click;
        self.config.caret_ticks = caret;
        self.clicks.set_threshold(double_click);
    }

    pub fn click_slop(&self) -> u16 {
        self.clicks.slop()
    }

    pub fn set_click_slop(&mut self, slop: u16) {
        self.config.click_slop = slop;
        self.clicks.set_slop(slop);
    }

    /// Count given to the most recent `mouseDown`.
    pub fn get_click_count(&self) -> u8 {
        self.clicks.count()
    }

    /// `ResetClickSequence`
    pub fn reset_click_sequence(&mut self) {
        self.clicks.reset();
    }

    /// `SetEventMask`: the system event mask filtering [`post_event`](Self::post_event).
    pub fn set_event_mask(&mut self, mask: EventMask) {
        log::debug!("event manager: system mask {} -> {}", self.system_mask, mask);
        self.system_mask = mask;
        self.config.system_event_mask = mask;
    }

    pub fn event_mask(&self) -> EventMask {
        self.system_mask
    }

    /// `SetKeyRepeat(delay, rate)`, both in ticks.
    pub fn set_key_repeat(&mut self, delay: u32, rate: u32) {
        self.config.key_repeat_delay = delay;
        self.config.key_repeat_rate = rate;
        self.repeat.set_timing(delay, rate);
    }

    pub fn key_repeat(&self) -> (u32, u32) {
        self.repeat.timing()
    }

    /// `SetAutoRepeatEnabled`
    pub fn set_auto_repeat_enabled(&mut self, enabled: bool) {
        self.config.auto_repeat_enabled = enabled;
        self.repeat.set_enabled(enabled);
    }

    pub fn auto_repeat(&self) -> &AutoRepeatEngine {
        &self.repeat
    }

    /// `CheckAbort`: Command-Period is down.
    pub fn check_abort(&self) -> bool {
        self.input.abort_pressed()
    }

    /// `GetModifierState`
    pub fn get_modifier_state(&self) -> Modifiers {
        self.input.modifiers()
    }

    pub fn is_key_down(&self, scan_code: u8) -> bool {
        self.input.is_key_down(scan_code)
    }

    pub fn is_modifier_down(&self, modifier: Modifiers) -> bool {
        self.input.modifiers().contains(modifier)
    }

    pub fn is_dragging(&self) -> bool {
        self.input.is_dragging()
    }

    /// Records the pointer location and button state without posting.
    pub fn update_mouse_state(&mut self, location: Point, button_down: bool) {
        self.input.set_mouse(location);
        self.input.set_button(button_down);
    }

    // ---- raw input ------------------------------------------------------

    /// `ProcessRawMouseEvent`: returns the number of events queued.
    pub fn process_raw_mouse_event(
        &mut self,
        x: i16,
        y: i16,
        buttons: u16,
        modifiers: Modifiers,
        timestamp: Ticks,
    ) -> u16 {
        let transitions = self.input.mouse_packet(x, y, buttons, modifiers, timestamp);
        self.apply(transitions.as_slice())
    }

    /// `ProcessRawKeyboardEvent`: returns the number of events queued.
    /// Scan codes beyond the key map are ignored.
    pub fn process_raw_keyboard_event(
        &mut self,
        scan_code: u16,
        is_down: bool,
        modifiers: Modifiers,
        timestamp: Ticks,
    ) -> u16 {
        let Ok(code) = u8::try_from(scan_code) else {
            log::warn!("event manager: scan code {scan_code:#x} out of range");
            return 0;
        };
        if code as usize >= sys7_core::KEY_MAP_BITS {
            log::warn!("event manager: scan code {scan_code:#x} out of range");
            return 0;
        }
        let transitions = self.input.key_packet(code, is_down, modifiers, timestamp);
        self.apply(transitions.as_slice())
    }

    /// Feeds one queued raw packet through the matching entry point.
    pub fn process_raw_input(&mut self, input: RawInput) -> u16 {
        match input {
            RawInput::Mouse {
                x,
                y,
                buttons,
                modifiers,
                timestamp,
            } => self.process_raw_mouse_event(x, y, buttons, modifiers, timestamp),
            RawInput::Key {
                scan_code,
                is_down,
                modifiers,
                timestamp,
            } => self.process_raw_keyboard_event(scan_code, is_down, modifiers, timestamp),
        }
    }

    /// Drains up to `limit` packets from `source`. Returns the number of
    /// events queued.
    pub fn pump<const N: usize>(&mut self, source: &RawInputQueue<N>, limit: usize) -> usize {
        let mut generated = 0usize;
        for _ in 0..limit {
            match source.pop() {
                Ok(input) => generated += usize::from(self.process_raw_input(input)),
                Err(nb::Error::WouldBlock) => break,
                Err(nb::Error::Other(never)) => match never {},
            }
        }
        generated
    }

    fn apply(&mut self, transitions: &[InputTransition]) -> u16 {
        let mut generated = 0;
        for transition in transitions {
            let posted = match *transition {
                InputTransition::MouseMoved { to, when } => {
                    self.post_stamped(EventKind::Os, os_event::mouse_moved_message(), when, to)
                }
                InputTransition::MouseDown { at, when } => {
                    self.post_stamped(EventKind::MouseDown, 0, when, at)
                }
                InputTransition::MouseUp { at, when } => {
                    self.post_stamped(EventKind::MouseUp, 0, when, at)
                }
                InputTransition::KeyDown {
                    key_code,
                    char_code,
                    when,
                } => {
                    let at = self.input.mouse();
                    let posted = self.post_stamped(
                        EventKind::KeyDown,
                        key_message(char_code, key_code),
                        when,
                        at,
                    );
                    // only a delivered keyDown starts auto-repeat
                    if posted.is_ok() && char_code != 0 {
                        self.repeat.key_down(key_code, char_code, when);
                    }
                    posted
                }
                InputTransition::KeyUp {
                    key_code,
                    char_code,
                    when,
                } => {
                    self.repeat.key_up(key_code);
                    let at = self.input.mouse();
                    self.post_stamped(EventKind::KeyUp, key_message(char_code, key_code), when, at)
                }
            };
            if posted.is_ok() {
                generated += 1;
            }
        }
        generated
    }

    // ---- periodic -------------------------------------------------------

    /// Tick-processing pass: posts an `autoKey` if the held key is due.
    /// Returns true if one was queued.
    pub fn tick(&mut self) -> bool {
        let now = self.clock.ticks();
        let Some(key) = self.repeat.poll(now) else {
            return false;
        };
        trace::emit(self.trace.as_ref(), records::evt::AUTO_KEY, &[key.key_code, key.char_code]);
        let at = self.input.mouse();
        self.post_stamped(
            EventKind::AutoKey,
            key_message(key.char_code, key.key_code),
            now,
            at,
        )
        .is_ok()
    }

    fn emit_record(&self, record_id: u8, record: &EventRecord) {
        if self.trace.is_none() {
            return;
        }
        let mut payload = [0u8; 14];
        payload[0..2].copy_from_slice(&record.what.raw().to_le_bytes());
        payload[2..6].copy_from_slice(&record.message.to_le_bytes());
        payload[6..10].copy_from_slice(&record.when.raw().to_le_bytes());
        payload[10..12].copy_from_slice(&record.location.h.to_le_bytes());
        payload[12..14].copy_from_slice(&record.location.v.to_le_bytes());
        trace::emit(self.trace.as_ref(), record_id, &payload);
    }
}

impl fmt::Debug for EventManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventManager")
            .field("queued", &self.queue.len())
            .field("capacity", &self.queue.capacity())
            .field("system_mask", &self.system_mask)
            .field("mouse", &self.input.mouse())
            .field("stats", &self.stats)
            .finish()
    }
}
