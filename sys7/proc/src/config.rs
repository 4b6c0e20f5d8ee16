//! Process Manager configuration.

/// Process table capacity, system process included.
pub const DEFAULT_MAX_PROCESSES: usize = 32;
/// Bytes available to all application partitions together.
pub const DEFAULT_PARTITION_BUDGET: usize = 8 * 1024 * 1024;
/// Stack reserved for each created process.
pub const DEFAULT_STACK_SIZE: usize = 8 * 1024;
/// Bytes reserved for a saved execution context.
pub const CONTEXT_AREA_SIZE: usize = 64;
/// Priority of the system process.
pub const SYSTEM_PRIORITY: u16 = 0;
/// Priority given to applications that do not ask for one.
pub const DEFAULT_PRIORITY: u16 = 1;
/// Added to the base priority of the front process.
pub const DEFAULT_FRONT_BOOST: u16 = 1;

/// Runtime parameters of the Process Manager.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProcessConfig {
    pub max_processes: usize,
    pub partition_budget: usize,
    pub default_stack_size: usize,
    pub system_priority: u16,
    pub default_priority: u16,
    pub front_boost: u16,
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            max_processes: DEFAULT_MAX_PROCESSES,
            partition_budget: DEFAULT_PARTITION_BUDGET,
            default_stack_size: DEFAULT_STACK_SIZE,
            system_priority: SYSTEM_PRIORITY,
            default_priority: DEFAULT_PRIORITY,
            front_boost: DEFAULT_FRONT_BOOST,
        }
    }
}

impl ProcessConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> ProcessConfigBuilder {
        ProcessConfigBuilder::default()
    }
}

/// Builder for [`ProcessConfig`].
#[derive(Debug, Clone, Default)]
pub struct ProcessConfigBuilder {
    config: ProcessConfig,
}

impl ProcessConfigBuilder {
    /// Sets the table capacity. At least two slots are kept so that one
    /// application can run beside the system process.
    pub fn max_processes(mut self, max: usize) -> Self {
        self.config.max_processes = max.max(2);
        self
    }

    pub fn partition_budget(mut self, bytes: usize) -> Self {
        self.config.partition_budget = bytes;
        self
    }

    pub fn default_stack_size(mut self, bytes: usize) -> Self {
        self.config.default_stack_size = bytes;
        self
    }

    pub fn system_priority(mut self, priority: u16) -> Self {
        self.config.system_priority = priority;
        self
    }

    pub fn default_priority(mut self, priority: u16) -> Self {
        self.config.default_priority = priority;
        self
    }

    /// Sets the priority boost applied to the front process.
    pub fn front_boost(mut self, boost: u16) -> Self {
        self.config.front_boost = boost;
        self
    }

    pub fn build(self) -> ProcessConfig {
        self.config
    }
}
