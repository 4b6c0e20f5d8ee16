//! `WaitNextEvent`, the cooperative yield point.
//!
//! The wait is a small state machine so that a caller can release its lock
//! between passes: [`WaitNextEvent::poll`] does one pass against a
//! [`KernelState`] and reports whether the wait finished. Between pending
//! passes the caller idles (see [`KernelState::idle`]).
//!
//! One pass:
//! 1. first pass only: dequeue a matching event, then give the scheduler a
//!    chance to switch;
//! 2. return a null event if a mouse region was given and the mouse left it;
//! 3. dequeue a matching event;
//! 4. yield again if the yield interval elapsed or a higher priority
//!    process is waiting;
//! 5. return a null event once `sleep` ticks have elapsed.

use sys7_core::{EventMask, EventRecord, Region, Ticks};

use crate::state::KernelState;

/// Result of one wait pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitStep {
    /// The wait is over; the record is an event or a stamped null event.
    Ready(EventRecord),
    /// Nothing yet; idle and poll again.
    Pending,
}

/// An in-progress `WaitNextEvent` call.
#[derive(Debug, Clone)]
pub struct WaitNextEvent {
    mask: EventMask,
    sleep: u32,
    mouse_region: Option<Region>,
    start: Option<Ticks>,
    passes: u32,
}

impl WaitNextEvent {
    pub fn new(mask: EventMask, sleep: u32, mouse_region: Option<Region>) -> Self {
        Self {
            mask,
            sleep,
            mouse_region,
            start: None,
            passes: 0,
        }
    }

    /// Tick at which the first pass ran.
    pub fn started_at(&self) -> Option<Ticks> {
        self.start
    }

    pub fn passes(&self) -> u32 {
        self.passes
    }

    /// Runs one pass.
    pub fn poll(&mut self, kernel: &mut KernelState) -> WaitStep {
        self.passes += 1;
        kernel.pump_input();
        let mut out = EventRecord::default();

        let start = match self.start {
            Some(start) => start,
            None => {
                let start = kernel.tick_count();
                self.start = Some(start);
                if kernel.take_event(self.mask, &mut out) {
                    return WaitStep::Ready(out);
                }
                if kernel.config().multitasking {
                    self.yield_to_scheduler(kernel);
                }
                start
            }
        };

        if let Some(region) = &self.mouse_region {
            if !region.contains(kernel.events().get_mouse()) {
                log::trace!("kernel: mouse left wait region");
                return WaitStep::Ready(kernel.events().null_event());
            }
        }

        if kernel.take_event(self.mask, &mut out) {
            return WaitStep::Ready(out);
        }

        if kernel.config().multitasking && kernel.yield_due() {
            self.yield_to_scheduler(kernel);
        }

        if kernel.tick_count().elapsed_since(start) >= self.sleep {
            return WaitStep::Ready(kernel.events().null_event());
        }
        WaitStep::Pending
    }

    fn yield_to_scheduler(&self, kernel: &mut KernelState) {
        if let Err(err) = kernel.yield_now() {
            log::warn!("kernel: yield from WaitNextEvent failed: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use sys7_core::{EventKind, ManualClock, Point, Rect};

    use crate::config::KernelConfig;

    fn kernel(start: u32) -> (KernelState, ManualClock) {
        let clock = ManualClock::new(Ticks::new(start));
        let kernel = KernelState::new(KernelConfig::default(), Arc::new(clock.clone()));
        (kernel, clock)
    }

    #[test]
    fn test_queued_event_returns_on_first_pass() {
        let (mut kernel, _) = kernel(10);
        kernel.events_mut().post_event(EventKind::Update, 9).unwrap();
        let mut wait = WaitNextEvent::new(EventMask::EVERY, 60, None);
        match wait.poll(&mut kernel) {
            WaitStep::Ready(evt) => assert_eq!((evt.what, evt.message), (EventKind::Update, 9)),
            WaitStep::Pending => panic!("event was queued"),
        }
        assert_eq!(wait.passes(), 1);
    }

    #[test]
    fn test_zero_sleep_polls_once() {
        let (mut kernel, _) = kernel(10);
        let mut wait = WaitNextEvent::new(EventMask::EVERY, 0, None);
        match wait.poll(&mut kernel) {
            WaitStep::Ready(evt) => assert!(evt.is_null()),
            WaitStep::Pending => panic!("zero sleep must not block"),
        }
    }

    #[test]
    fn test_pending_until_sleep_elapses() {
        let (mut kernel, clock) = kernel(10);
        let mut wait = WaitNextEvent::new(EventMask::EVERY, 3, None);
        assert_eq!(wait.poll(&mut kernel), WaitStep::Pending);
        clock.advance(2);
        assert_eq!(wait.poll(&mut kernel), WaitStep::Pending);
        clock.advance(1);
        match wait.poll(&mut kernel) {
            WaitStep::Ready(evt) => {
                assert!(evt.is_null());
                assert_eq!(evt.when, Ticks::new(13));
            }
            WaitStep::Pending => panic!("sleep elapsed"),
        }
        assert_eq!(wait.started_at(), Some(Ticks::new(10)));
    }

    #[test]
    fn test_mouse_leaving_region_ends_wait() {
        let (mut kernel, _) = kernel(0);
        kernel.events_mut().update_mouse_state(Point::new(5, 5), false);
        let region = Region::from_rect(Rect::new(0, 0, 10, 10));
        let mut wait = WaitNextEvent::new(EventMask::EVERY, 600, Some(region));
        assert_eq!(wait.poll(&mut kernel), WaitStep::Pending);

        kernel.events_mut().update_mouse_state(Point::new(50, 5), false);
        match wait.poll(&mut kernel) {
            WaitStep::Ready(evt) => {
                assert!(evt.is_null());
                assert_eq!(evt.location, Point::new(50, 5));
            }
            WaitStep::Pending => panic!("mouse left the region"),
        }
    }
}
