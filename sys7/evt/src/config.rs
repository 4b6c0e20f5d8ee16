//! Event Manager configuration.

use sys7_core::EventMask;

/// Queue length used when `InitEvents` is given a non-positive size.
pub const DEFAULT_QUEUE_SIZE: usize = 20;
/// Upper bound on the event pool.
pub const MAX_QUEUE_SIZE: usize = 256;
/// `GetDblTime` default, in ticks.
pub const DEFAULT_DOUBLE_CLICK_TICKS: u32 = 30;
/// `GetCaretTime` default, in ticks.
pub const DEFAULT_CARET_TICKS: u32 = 32;
/// Per-axis pixel tolerance between clicks of one sequence.
pub const DEFAULT_CLICK_SLOP: u16 = 5;
/// Ticks a key must be held before it starts repeating.
pub const DEFAULT_KEY_REPEAT_DELAY: u32 = 24;
/// Ticks between repeats once repeating.
pub const DEFAULT_KEY_REPEAT_RATE: u32 = 6;

/// What `PostEvent` does when the pool is exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OverflowPolicy {
    /// Refuse the new event with `QueueFull`.
    #[default]
    Reject,
    /// Drop the oldest queued event and accept the new one.
    EvictOldest,
}

/// Runtime parameters of the Event Manager.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EventConfig {
    pub queue_size: usize,
    pub overflow: OverflowPolicy,
    pub system_event_mask: EventMask,
    pub double_click_ticks: u32,
    pub caret_ticks: u32,
    pub click_slop: u16,
    pub key_repeat_delay: u32,
    pub key_repeat_rate: u32,
    pub auto_repeat_enabled: bool,
    /// Duplicate mouse-down packets closer than this many ticks are dropped.
    /// Zero disables the filter.
    pub mouse_down_debounce: u32,
    /// Post a mouse-moved `osEvt` whenever the pointer moves at least this
    /// far. `None` disables mouse-moved events.
    pub mouse_moved_threshold: Option<u16>,
    pub left_handed: bool,
}

impl Default for EventConfig {
    fn default() -> Self {
        Self {
            queue_size: DEFAULT_QUEUE_SIZE,
            overflow: OverflowPolicy::Reject,
            system_event_mask: EventMask::SYSTEM_DEFAULT,
            double_click_ticks: DEFAULT_DOUBLE_CLICK_TICKS,
            caret_ticks: DEFAULT_CARET_TICKS,
            click_slop: DEFAULT_CLICK_SLOP,
            key_repeat_delay: DEFAULT_KEY_REPEAT_DELAY,
            key_repeat_rate: DEFAULT_KEY_REPEAT_RATE,
            auto_repeat_enabled: true,
            mouse_down_debounce: 0,
            mouse_moved_threshold: None,
            left_handed: false,
        }
    }
}

impl EventConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> EventConfigBuilder {
        EventConfigBuilder::default()
    }

    /// Queue length after `InitEvents` clamping: non-positive requests use
    /// the default, oversized requests are capped.
    pub fn clamp_queue_size(requested: i32) -> usize {
        if requested <= 0 {
            DEFAULT_QUEUE_SIZE
        } else {
            (requested as usize).min(MAX_QUEUE_SIZE)
        }
    }
}

/// Builder for [`EventConfig`].
#[derive(Debug, Clone, Default)]
pub struct EventConfigBuilder {
    config: EventConfig,
}

impl EventConfigBuilder {
    /// Sets the event pool size, clamped like `InitEvents`.
    pub fn queue_size(mut self, size: i32) -> Self {
        self.config.queue_size = EventConfig::clamp_queue_size(size);
        self
    }

    pub fn overflow(mut self, policy: OverflowPolicy) -> Self {
        self.config.overflow = policy;
        self
    }

    pub fn system_event_mask(mut self, mask: EventMask) -> Self {
        self.config.system_event_mask = mask;
        self
    }

    /// Sets double-click and caret times.
    pub fn timing(mut self, double_click: u32, caret: u32) -> Self {
        self.config.double_click_ticks = double_click;
        self.config.caret_ticks = caret;
        self
    }

    pub fn click_slop(mut self, slop: u16) -> Self {
        self.config.click_slop = slop;
        self
    }

    /// Sets auto-repeat initial delay and repeat rate.
    pub fn key_repeat(mut self, delay: u32, rate: u32) -> Self {
        self.config.key_repeat_delay = delay;
        self.config.key_repeat_rate = rate;
        self
    }

    pub fn auto_repeat(mut self, enabled: bool) -> Self {
        self.config.auto_repeat_enabled = enabled;
        self
    }

    pub fn mouse_down_debounce(mut self, ticks: u32) -> Self {
        self.config.mouse_down_debounce = ticks;
        self
    }

    pub fn mouse_moved_events(mut self, threshold: u16) -> Self {
        self.config.mouse_moved_threshold = Some(threshold.max(1));
        self
    }

    pub fn left_handed(mut self, left_handed: bool) -> Self {
        self.config.left_handed = left_handed;
        self
    }

    pub fn build(self) -> EventConfig {
        self.config
    }
}
