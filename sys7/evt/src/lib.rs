#![forbid(unsafe_code)]

//! # sys7-evt
//!
//! The System 7.1 Event Manager: a bounded queue of posted events, the
//! `PostEvent` / `GetNextEvent` / `EventAvail` / `FlushEvents` dispatch
//! surface, and the input path that turns raw driver packets into events.
//!
//! ## Module Overview
//! - [`queue`]    – bounded FIFO with mask-filtered lookup.
//! - [`click`]    – multi-click classification.
//! - [`repeat`]   – keyboard auto-repeat.
//! - [`keytrans`] – scan code translation (US layout).
//! - [`deadkey`]  – accent composition.
//! - [`input`]    – raw packet diffing into transitions.
//! - [`ingest`]   – interrupt-safe raw packet queue.
//! - [`manager`]  – the [`EventManager`] tying it together.

pub mod click;
pub mod config;
pub mod deadkey;
pub mod ingest;
pub mod input;
pub mod keytrans;
pub mod manager;
pub mod queue;
pub mod repeat;

pub use click::{ClickClassifier, MAX_CLICK_COUNT};
pub use config::{EventConfig, EventConfigBuilder, OverflowPolicy};
pub use deadkey::{DeadKey, DeadKeyState};
pub use ingest::{RawInput, RawInputQueue};
pub use input::{InputBridge, InputTransition};
pub use manager::{EventManager, EventStats};
pub use queue::EventQueue;
pub use repeat::{AutoRepeatEngine, RepeatKey};
