//! Context switching between processes.
//!
//! The portable part of a switch is bookkeeping: the outgoing process
//! records its stack and globals pointers, the incoming one becomes current
//! and `Running`. Hosts that really run process code (fibers, coroutines,
//! emulated CPUs) plug in through [`ContextHooks`].

use sys7_core::{OsErr, OsResult, Ticks};

use crate::pcb::{ExecutionContext, ProcessControlBlock, ProcessState, GLOBALS_OFFSET};
use crate::table::ProcessTable;

/// Host side of a context switch.
///
/// Hooks run while the owning manager is mutably borrowed and must not call
/// back into it.
pub trait ContextHooks: Send {
    /// Called for the outgoing process after its portable context was
    /// captured.
    fn save(&mut self, _pcb: &ProcessControlBlock, _context: &mut ExecutionContext) {}

    /// Called for the incoming process before it is marked running.
    fn restore(&mut self, _pcb: &ProcessControlBlock, _context: &ExecutionContext) {}
}

/// Hooks that only keep the portable bookkeeping.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopContext;

impl ContextHooks for NoopContext {}

/// Outcome of a [`context_switch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Switch {
    pub from: usize,
    pub to: usize,
}

/// Makes `target` the current process.
///
/// Returns `Ok(None)` when `target` already is current. Fails with
/// `ParamErr` if the slot does not hold a live process.
pub fn context_switch(
    table: &mut ProcessTable,
    target: usize,
    now: Ticks,
    hooks: &mut dyn ContextHooks,
) -> OsResult<Option<Switch>> {
    let from = table.current();
    if target == from {
        return Ok(None);
    }
    if !table.get(target).is_some_and(|pcb| pcb.state.is_live()) {
        return Err(OsErr::ParamErr);
    }

    if let Some(outgoing) = table.get_mut(from) {
        if outgoing.state.is_live() {
            let mut context = capture(outgoing);
            hooks.save(outgoing, &mut context);
            outgoing.context = context;
            if outgoing.state == ProcessState::Running {
                outgoing.state = ProcessState::Background;
            }
        }
    }

    let incoming = table.get_mut(target).ok_or(OsErr::ParamErr)?;
    let context = incoming.context;
    hooks.restore(incoming, &context);
    incoming.state = ProcessState::Running;
    incoming.last_event_time = now;
    table.set_current(target);

    Ok(Some(Switch { from, to: target }))
}

fn capture(pcb: &ProcessControlBlock) -> ExecutionContext {
    let mut context = pcb.context;
    if let Some(stack) = pcb.stack {
        context.stack_pointer = stack.end();
    }
    if let Some(partition) = pcb.partition {
        context.globals = partition.base + GLOBALS_OFFSET;
    }
    context.switch_count = context.switch_count.wrapping_add(1);
    context
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::Partition;
    use sys7_core::ProcessSerialNumber;

    #[derive(Default)]
    struct Recorder {
        saved: Vec<ProcessSerialNumber>,
        restored: Vec<ProcessSerialNumber>,
    }

    impl ContextHooks for Recorder {
        fn save(&mut self, pcb: &ProcessControlBlock, context: &mut ExecutionContext) {
            context.resume_token = u64::from(pcb.psn.low) * 100;
            self.saved.push(pcb.psn);
        }

        fn restore(&mut self, pcb: &ProcessControlBlock, _context: &ExecutionContext) {
            self.restored.push(pcb.psn);
        }
    }

    fn table_with_app() -> ProcessTable {
        let mut table = ProcessTable::new(4, 0, Ticks::ZERO);
        table.install(
            1,
            ProcessControlBlock {
                psn: ProcessSerialNumber::new(0, 3),
                state: ProcessState::Background,
                partition: Some(Partition::new(0x1000, 0x800)),
                stack: Some(Partition::new(0x2000, 0x400)),
                ..ProcessControlBlock::default()
            },
        );
        table.link_tail(1);
        table
    }

    #[test]
    fn test_switch_updates_states_and_time() {
        let mut table = table_with_app();
        let mut hooks = Recorder::default();

        let switch = context_switch(&mut table, 1, Ticks::new(42), &mut hooks).unwrap();
        assert_eq!(switch, Some(Switch { from: 0, to: 1 }));
        assert_eq!(table.current(), 1);
        assert_eq!(table.get(0).unwrap().state, ProcessState::Background);
        assert_eq!(table.get(1).unwrap().state, ProcessState::Running);
        assert_eq!(table.get(1).unwrap().last_event_time, Ticks::new(42));
        assert_eq!(table.running_count(), 1);
        assert_eq!(hooks.saved, vec![ProcessSerialNumber::SYSTEM]);
        assert_eq!(hooks.restored, vec![ProcessSerialNumber::new(0, 3)]);
    }

    #[test]
    fn test_outgoing_context_is_captured() {
        let mut table = table_with_app();
        context_switch(&mut table, 1, Ticks::new(1), &mut NoopContext).unwrap();
        context_switch(&mut table, 0, Ticks::new(2), &mut NoopContext).unwrap();

        let ctx = table.get(1).unwrap().context;
        assert_eq!(ctx.stack_pointer, 0x2400);
        assert_eq!(ctx.globals, 0x1000 + GLOBALS_OFFSET);
        assert_eq!(ctx.switch_count, 1);
    }

    #[test]
    fn test_switch_to_self_is_noop() {
        let mut table = table_with_app();
        assert_eq!(context_switch(&mut table, 0, Ticks::new(1), &mut NoopContext), Ok(None));
        assert_eq!(table.get(0).unwrap().state, ProcessState::Running);
    }

    #[test]
    fn test_switch_to_free_slot_fails() {
        let mut table = table_with_app();
        assert_eq!(
            context_switch(&mut table, 2, Ticks::new(1), &mut NoopContext),
            Err(OsErr::ParamErr)
        );
        assert_eq!(table.current(), 0);
    }
}
