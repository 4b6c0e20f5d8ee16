#![forbid(unsafe_code)]

//! # sys7-proc
//!
//! The cooperative System 7.1 Process Manager. Processes live in a
//! fixed-capacity [`ProcessTable`]; the [`scheduler`] picks the next one by
//! priority and then round-robin; [`context`] performs the switch; the
//! [`ProcessManager`] ties lifecycle, front process and memory partitions
//! together.
//!
//! Nothing here preempts. Control changes hands only when a caller yields.

pub mod config;
pub mod context;
pub mod manager;
pub mod memory;
pub mod pcb;
pub mod scheduler;
pub mod table;

pub use config::{ProcessConfig, ProcessConfigBuilder};
pub use context::{context_switch, ContextHooks, NoopContext, Switch};
pub use manager::{FrontChange, LaunchSpec, ProcessManager};
pub use memory::{HeapPartitions, Partition, PartitionAllocator, PartitionStats};
pub use pcb::{
    ExecutionContext, LaunchFlags, ProcessControlBlock, ProcessInfo, ProcessMode, ProcessState,
};
pub use table::{ProcessHandle, ProcessTable, SYSTEM_SLOT};
