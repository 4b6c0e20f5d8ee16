#![forbid(unsafe_code)]

//! # sys7-core
//!
//! Shared vocabulary for the System 7.1 Event Manager and Process Manager:
//! event records and masks, modifier bits, QuickDraw-style geometry, the
//! 60 Hz tick source, the keyboard bitmap, process serial numbers, and the
//! trace hook used by the higher crates.

use thiserror::Error;

pub mod events;
pub mod geometry;
pub mod keys;
pub mod modifiers;
pub mod psn;
pub mod time;
pub mod trace;

pub use events::*;
pub use geometry::*;
pub use keys::*;
pub use modifiers::*;
pub use psn::*;
pub use time::*;
pub use trace::{TraceHook, TraceResult};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Result type used throughout the event and process managers
pub type OsResult<T> = Result<T, OsErr>;

/// Status codes surfaced by the event and process managers.
///
/// Every variant is recoverable; callers decide whether to retry or to treat
/// the request as not having materialized.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OsErr {
    /// Event type is disabled in the system event mask
    #[error("event type not enabled in the system event mask")]
    EvtNotEnb,
    /// Bounded event pool exhausted
    #[error("event queue is full")]
    QueueFull,
    /// Invalid or out of range argument
    #[error("invalid parameter")]
    ParamErr,
    /// No process matches the serial number
    #[error("process not found")]
    ProcNotFound,
    /// Partition, stack or context allocation failed
    #[error("not enough memory")]
    MemFullErr,
}

impl OsErr {
    /// Classic numeric OSErr value.
    pub const fn code(self) -> i16 {
        match self {
            OsErr::EvtNotEnb => 1,
            OsErr::QueueFull => -1,
            OsErr::ParamErr => -50,
            OsErr::MemFullErr => -108,
            OsErr::ProcNotFound => -600,
        }
    }

    /// Maps a classic numeric OSErr back to a variant. `noErr` and unknown
    /// codes yield `None`.
    pub const fn from_code(code: i16) -> Option<Self> {
        match code {
            1 => Some(OsErr::EvtNotEnb),
            -1 => Some(OsErr::QueueFull),
            -50 => Some(OsErr::ParamErr),
            -108 => Some(OsErr::MemFullErr),
            -600 => Some(OsErr::ProcNotFound),
            _ => None,
        }
    }
}

/// `noErr`
pub const NO_ERR: i16 = 0;

/// Flattens an [`OsResult`] into the classic status code.
pub fn os_status<T>(result: &OsResult<T>) -> i16 {
    match result {
        Ok(_) => NO_ERR,
        Err(err) => err.code(),
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for OsErr {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            OsErr::EvtNotEnb => defmt::write!(fmt, "EvtNotEnb"),
            OsErr::QueueFull => defmt::write!(fmt, "QueueFull"),
            OsErr::ParamErr => defmt::write!(fmt, "ParamErr"),
            OsErr::ProcNotFound => defmt::write!(fmt, "ProcNotFound"),
            OsErr::MemFullErr => defmt::write!(fmt, "MemFullErr"),
        }
    }
}
