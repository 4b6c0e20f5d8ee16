//! Kernel configuration.

use sys7_evt::EventConfig;
use sys7_proc::ProcessConfig;

/// Ticks between forced yields inside `WaitNextEvent` (about 1/10 s).
pub const DEFAULT_YIELD_INTERVAL: u32 = 6;
/// Raw input packets drained per pump.
pub const DEFAULT_RAW_INPUT_DRAIN: usize = 32;
/// Capacity of the kernel's raw input queue.
pub const RAW_INPUT_CAPACITY: usize = 64;

/// Configuration for the cooperative kernel.
///
/// Bundles the Event Manager and Process Manager settings with the options
/// that govern yielding and idling.
#[derive(Debug, Clone)]
pub struct KernelConfig {
    pub events: EventConfig,
    pub processes: ProcessConfig,
    /// When false, `WaitNextEvent` never switches processes.
    pub multitasking: bool,
    pub yield_interval: u32,
    /// Let `GetNextEvent` yield when it finds nothing.
    pub yield_on_get_next_event: bool,
    pub raw_input_drain_limit: usize,
    /// Called on every idle pass of `WaitNextEvent`.
    pub idle_callback: Option<fn()>,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            events: EventConfig::default(),
            processes: ProcessConfig::default(),
            multitasking: true,
            yield_interval: DEFAULT_YIELD_INTERVAL,
            yield_on_get_next_event: false,
            raw_input_drain_limit: DEFAULT_RAW_INPUT_DRAIN,
            idle_callback: None,
        }
    }
}

impl KernelConfig {
    /// Creates a new kernel configuration builder.
    pub fn builder() -> KernelConfigBuilder {
        KernelConfigBuilder::default()
    }
}

/// Builder for ergonomic kernel configuration construction.
#[derive(Debug, Clone, Default)]
pub struct KernelConfigBuilder {
    config: KernelConfig,
}

impl KernelConfigBuilder {
    pub fn events(mut self, events: EventConfig) -> Self {
        self.config.events = events;
        self
    }

    pub fn processes(mut self, processes: ProcessConfig) -> Self {
        self.config.processes = processes;
        self
    }

    /// Enables or disables cooperative multitasking.
    pub fn multitasking(mut self, enabled: bool) -> Self {
        self.config.multitasking = enabled;
        self
    }

    /// Sets the forced-yield interval in ticks. Zero yields on every pass.
    pub fn yield_interval(mut self, ticks: u32) -> Self {
        self.config.yield_interval = ticks;
        self
    }

    pub fn yield_on_get_next_event(mut self, enabled: bool) -> Self {
        self.config.yield_on_get_next_event = enabled;
        self
    }

    /// Sets how many raw packets one pump may drain (at least one).
    pub fn raw_input_drain_limit(mut self, limit: usize) -> Self {
        self.config.raw_input_drain_limit = limit.max(1);
        self
    }

    /// Sets the idle callback function.
    pub fn idle_callback(mut self, callback: fn()) -> Self {
        self.config.idle_callback = Some(callback);
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> KernelConfig {
        self.config
    }
}
