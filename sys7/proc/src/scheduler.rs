//! Next-process selection
//!
//! Priority first: a schedulable process whose priority strictly exceeds the
//! current one always wins. Otherwise the queue is walked round-robin from
//! the successor of the current process.

use crate::table::ProcessTable;

/// Slot that should run next. Returns the current slot when nothing else is
/// schedulable.
pub fn next_process(table: &ProcessTable) -> usize {
    let current = table.current();
    let current_priority = table.get(current).map_or(0, |pcb| pcb.priority);

    if let Some(index) = highest_priority(table) {
        if table.get(index).is_some_and(|pcb| pcb.priority > current_priority) {
            return index;
        }
    }

    round_robin(table).unwrap_or(current)
}

/// Schedulable slot with the highest priority; the first in queue order
/// wins ties.
pub fn highest_priority(table: &ProcessTable) -> Option<usize> {
    let mut best: Option<(usize, u16)> = None;
    for index in table.iter_queue() {
        let Some(pcb) = table.get(index) else { continue };
        if !pcb.state.is_schedulable() {
            continue;
        }
        if best.map_or(true, |(_, priority)| pcb.priority > priority) {
            best = Some((index, pcb.priority));
        }
    }
    best.map(|(index, _)| index)
}

/// True if a schedulable process outranks the current one.
pub fn higher_priority_waiting(table: &ProcessTable) -> bool {
    let current_priority = table.current_pcb().priority;
    highest_priority(table)
        .and_then(|index| table.get(index))
        .is_some_and(|pcb| pcb.priority > current_priority)
}

fn round_robin(table: &ProcessTable) -> Option<usize> {
    let current = table.current();
    let start = if table.is_linked(current) {
        table.next_wrapping(current)?
    } else {
        table.head()?
    };

    let mut index = start;
    for _ in 0..table.len() {
        if index != current && table.get(index).is_some_and(|pcb| pcb.state.is_schedulable()) {
            return Some(index);
        }
        index = table.next_wrapping(index)?;
        if index == start {
            break;
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pcb::{ProcessControlBlock, ProcessState};
    use crate::table::SYSTEM_SLOT;
    use sys7_core::{ProcessSerialNumber, Ticks};

    /// Table with the system process at priority 0 plus one app per entry.
    fn table(apps: &[(u16, ProcessState)]) -> ProcessTable {
        let mut table = ProcessTable::new(8, 0, Ticks::ZERO);
        for (i, &(priority, state)) in apps.iter().enumerate() {
            let slot = table.find_free_slot().unwrap();
            table.install(
                slot,
                ProcessControlBlock {
                    psn: ProcessSerialNumber::new(0, 3 + i as u32),
                    state,
                    priority,
                    base_priority: priority,
                    ..ProcessControlBlock::default()
                },
            );
            table.link_tail(slot);
        }
        table
    }

    fn make_current(table: &mut ProcessTable, index: usize) {
        let old = table.current();
        table.get_mut(old).unwrap().state = ProcessState::Background;
        table.get_mut(index).unwrap().state = ProcessState::Running;
        table.set_current(index);
    }

    #[test]
    fn test_strictly_higher_priority_wins() {
        use ProcessState::Background;
        let mut table = table(&[(1, Background), (5, Background), (3, Background)]);
        make_current(&mut table, 1);
        assert_eq!(next_process(&table), 2);
        assert!(higher_priority_waiting(&table));
    }

    #[test]
    fn test_equal_priority_round_robins() {
        use ProcessState::Background;
        let mut table = table(&[(1, Background), (1, Background), (1, Background)]);
        make_current(&mut table, 1);
        assert!(!higher_priority_waiting(&table));

        // the system process takes its round-robin turn too
        let mut order = Vec::new();
        for _ in 0..6 {
            let next = next_process(&table);
            order.push(next);
            make_current(&mut table, next);
        }
        assert_eq!(order, vec![2, 3, 0, 1, 2, 3]);
    }

    #[test]
    fn test_suspended_processes_are_skipped() {
        use ProcessState::{Background, Suspended};
        let mut table = table(&[(1, Background), (9, Suspended), (1, Background)]);
        make_current(&mut table, 1);
        assert_eq!(next_process(&table), 3);
    }

    #[test]
    fn test_lone_process_yields_to_itself() {
        let table = table(&[]);
        assert_eq!(next_process(&table), SYSTEM_SLOT);
    }
}
