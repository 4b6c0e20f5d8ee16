#![forbid(unsafe_code)]

//! # sys7-kernel
//!
//! The cooperative System 7.1 kernel: the Event Manager and the Process
//! Manager joined at `WaitNextEvent`, plus a trap-style global API.
//!
//! ## Module Overview
//! - [`config`] – [`KernelConfig`] and its builder.
//! - [`state`]  – [`KernelState`], the single owner of both managers.
//! - [`wait`]   – the `WaitNextEvent` state machine.
//! - [`api`]    – global free functions named after the classic traps.

pub mod api;
pub mod config;
pub mod state;
pub mod wait;

pub use config::{KernelConfig, KernelConfigBuilder};
pub use state::KernelState;
pub use wait::{WaitNextEvent, WaitStep};
