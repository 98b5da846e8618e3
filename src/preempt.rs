/*
 * Yielding & Preemption
 *
 * spec.md §4.4. Preemption in this runtime is cooperative and
 * reduction-counted, not hardware-timer-driven (spec.md §1 Non-goals
 * excludes hardware-timer preemption): every BIF call decrements the
 * current process's reduction budget and, once it reaches the
 * exhaustion boundary, forces the process back onto its ready queue in
 * favor of the next runnable one.
 *
 * Grounded on the teacher's `SchedulerCore::on_tick`/`reschedule`
 * timeslice accounting in `sched_core.rs`, re-cast from a tick counter
 * to a reduction counter per spec.md's BEAM-derived model.
 */

use crate::config::YIELD_CHECK_THRESHOLD;
use crate::pcb::{PcbRef, Priority, ProcessState};
use crate::runtime::SchedulerArray;

/// Whether a reduction-accounting step should force preemption.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trap {
    Continue,
    Preempted,
}

/// Decrement `core_id`'s current reduction counter by `cost` and report
/// whether it has now crossed `YIELD_CHECK_THRESHOLD`. Does not itself
/// perform the preemption; see `yield_check`/`preempt`. Returns
/// `Trap::Continue` (not an error) for an invalid core: a cost charge
/// against a core that does not exist has nothing to preempt.
pub fn decrement_reductions_with_check(array: &SchedulerArray, core_id: usize, cost: i64) -> Trap {
    let Some(mutex) = array.get_scheduler_state(core_id) else {
        return Trap::Continue;
    };
    let mut state = mutex.lock();
    state.current_reductions -= cost;
    if state.current_reductions <= YIELD_CHECK_THRESHOLD {
        Trap::Preempted
    } else {
        Trap::Continue
    }
}

/// Pure predicate form of the same check, for callers that already hold
/// the reduction count (e.g. after reading it via the inspection API).
pub fn yield_check(reduction_count: i64) -> bool {
    reduction_count <= YIELD_CHECK_THRESHOLD
}

/// Force-preempt `core_id`'s current process: move it back to the tail
/// of its own priority's ready queue in `Ready` state and clear
/// `current_process`. Returns the preempted PCB, or `None` if the core
/// had nothing running.
pub fn preempt(array: &SchedulerArray, core_id: usize) -> Option<PcbRef> {
    let current = array.scheduler_get_current_process(core_id)?;
    let priority = {
        let pool = array.pool().lock();
        pool.get(current)?.priority
    };
    array.scheduler_set_current_process(core_id, None);
    array.enqueue(core_id, priority, current);
    log::debug!("core {} preempted {:?}", core_id, current);
    Some(current)
}

/// Voluntary yield (the mechanism behind `actly_yield`): always
/// preempts the current process regardless of its remaining reduction
/// count, per spec.md §4.4's distinction between voluntary and
/// reduction-forced yielding.
pub fn yield_now(array: &SchedulerArray, core_id: usize) -> Option<PcbRef> {
    preempt(array, core_id)
}

/// Preempt only if the current process's reduction count has crossed
/// the exhaustion boundary; otherwise a no-op. This is what a BIF calls
/// after charging its cost, rather than always yielding.
pub fn yield_conditional(array: &SchedulerArray, core_id: usize) -> Trap {
    let count = array.scheduler_get_reduction_count(core_id);
    if yield_check(count) {
        preempt(array, core_id);
        Trap::Preempted
    } else {
        Trap::Continue
    }
}

/// Confirm a PCB's process-state transition is legal before committing
/// it; used by preemption paths that move a PCB from `Running` back to
/// `Ready`. Refuses (returns `false`, no panic) rather than forcing an
/// illegal transition through.
pub fn transition_or_refuse(state: &mut ProcessState, to: ProcessState) -> bool {
    if state.can_transition_to(to) {
        *state = to;
        true
    } else {
        log::warn!("refused illegal transition {:?} -> {:?}", state, to);
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SchedulerConfig;

    fn array_with_reductions(reductions: i64) -> SchedulerArray {
        let mut cfg = SchedulerConfig::new(1);
        cfg.default_reductions = reductions;
        SchedulerArray::init(cfg).unwrap()
    }

    #[test]
    fn reduction_exhaustion_triggers_preemption() {
        let arr = array_with_reductions(1);
        arr.spawn(0, Priority::Normal, 0).unwrap();
        arr.schedule(0);
        let trap = decrement_reductions_with_check(&arr, 0, 1);
        assert_eq!(trap, Trap::Preempted);
    }

    #[test]
    fn positive_reductions_continue() {
        let arr = array_with_reductions(10);
        arr.spawn(0, Priority::Normal, 0).unwrap();
        arr.schedule(0);
        let trap = decrement_reductions_with_check(&arr, 0, 1);
        assert_eq!(trap, Trap::Continue);
    }

    #[test]
    fn preempt_moves_current_to_ready_queue_tail() {
        let arr = array_with_reductions(10);
        arr.spawn(0, Priority::Normal, 0).unwrap();
        let current = arr.schedule(0).unwrap();
        let preempted = preempt(&arr, 0).unwrap();
        assert_eq!(preempted, current);
        assert!(arr.scheduler_get_current_process(0).is_none());
        assert_eq!(arr.scheduler_get_queue_length(0, Priority::Normal), 1);
    }

    #[test]
    fn preempt_on_idle_core_is_none() {
        let arr = array_with_reductions(10);
        assert!(preempt(&arr, 0).is_none());
    }

    #[test]
    fn illegal_transition_refused_leaves_state_unchanged() {
        let mut state = ProcessState::Terminated;
        assert!(!transition_or_refuse(&mut state, ProcessState::Running));
        assert_eq!(state, ProcessState::Terminated);
    }
}
