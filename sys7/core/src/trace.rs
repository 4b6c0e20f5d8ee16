//! Binary trace hook shared by the event and process managers.
//!
//! A hook receives `(record_id, payload, with_timestamp)`. Record ids are
//! grouped per subsystem in [`records`]; payloads are little-endian.

use std::sync::Arc;

pub type TraceError = core::convert::Infallible;

pub type TraceResult = Result<(), TraceError>;

/// Called with a record id, its payload and a timestamp flag. Runs inside
/// the emitting manager and must not call back into it.
pub type TraceHook = Arc<dyn Fn(u8, &[u8], bool) -> TraceResult + Send + Sync>;

/// Sends one record through an optional hook. Hook failures are ignored.
pub fn emit(hook: Option<&TraceHook>, record: u8, payload: &[u8]) {
    if let Some(trace) = hook {
        let _ = trace(record, payload, true);
    }
}

pub mod records {
    /// Event Manager records.
    pub mod evt {
        pub const POST: u8 = 70;
        pub const POST_REJECTED: u8 = 71;
        pub const EVICT: u8 = 72;
        pub const GET: u8 = 73;
        pub const FLUSH: u8 = 74;
        pub const AUTO_KEY: u8 = 75;
        pub const CLICK: u8 = 76;
    }

    /// Scheduler records.
    pub mod sched {
        pub const NEXT: u8 = 52;
        pub const IDLE: u8 = 53;
        pub const SWITCH: u8 = 54;
    }

    /// Process lifecycle records.
    pub mod proc {
        pub const CREATE: u8 = 80;
        pub const LAUNCH: u8 = 81;
        pub const SUSPEND: u8 = 82;
        pub const RESUME: u8 = 83;
        pub const FRONT: u8 = 84;
        pub const CLEANUP: u8 = 85;
    }
}
