/*
 * Built-In Functions: actly_yield, actly_spawn, actly_exit
 *
 * spec.md §4.9. Every BIF charges its fixed reduction cost
 * (`BIF_*_COST`) before doing its own work, then runs the shared
 * `bif_trap_check` to decide whether the caller should be preempted.
 * This mirrors the BEAM convention the specification is modeled on:
 * every built-in is itself a reduction-counted operation, not just
 * user bytecode between them.
 *
 * Grounded on the teacher's `ThreadManager::exit`/`ThreadManager::spawn`
 * (disable-interrupts, mutate scheduler state, re-enable, reschedule)
 * and spec.md §9's `Trap::{Continue, Preempted}` redesign note, which
 * replaces a setjmp/longjmp-style non-local exit with an explicit
 * return value.
 */

use crate::config::{BIF_EXIT_COST, BIF_SPAWN_COST, BIF_YIELD_COST};
use crate::pcb::{PcbRef, Pid, Priority, ProcessState};
use crate::preempt::{decrement_reductions_with_check, preempt, Trap};
use crate::runtime::SchedulerArray;

/// Shared pre-BIF bookkeeping (spec.md §4.9): read `core_id`'s current
/// reductions; if they are already short of `cost`, preempt without
/// touching the counter and report `Preempted`. Otherwise subtract
/// `cost`, store it back, and preempt iff the result is exactly zero.
/// Every BIF below calls this exactly once, before performing its own
/// effect — a BIF whose caller traps here never runs.
pub fn bif_trap_check(array: &SchedulerArray, core_id: usize, cost: i64) -> Trap {
    let Some(mutex) = array.get_scheduler_state(core_id) else {
        return Trap::Continue;
    };
    // Lock is scoped to end before `preempt` below, which re-acquires
    // the same core's state mutex.
    let trap = {
        let mut state = mutex.lock();
        if state.current_reductions < cost {
            Trap::Preempted
        } else {
            state.current_reductions -= cost;
            if state.current_reductions == 0 {
                Trap::Preempted
            } else {
                Trap::Continue
            }
        }
    };
    if trap == Trap::Preempted {
        preempt(array, core_id);
    }
    trap
}

/// Voluntary yield: always preempts the caller (regardless of remaining
/// reductions) after charging `BIF_YIELD_COST`, per spec.md §4.4's
/// voluntary/forced distinction.
pub fn actly_yield(array: &SchedulerArray, core_id: usize) -> Trap {
    decrement_reductions_with_check(array, core_id, BIF_YIELD_COST);
    preempt(array, core_id);
    Trap::Preempted
}

/// Spawn a new process on `core_id` at `priority`, charging
/// `BIF_SPAWN_COST` against the *caller's* reduction budget (the new
/// process starts with its own full budget on first `schedule`, not a
/// fraction of the caller's). Trap-checks first, per spec.md §4.9: a
/// caller already short on reductions is preempted and the spawn never
/// happens, returning `None` exactly as `PoolExhausted`/`InvalidCore`
/// would.
pub fn actly_spawn(
    array: &SchedulerArray,
    core_id: usize,
    priority: Priority,
    entry: usize,
) -> Option<Pid> {
    if bif_trap_check(array, core_id, BIF_SPAWN_COST) == Trap::Preempted {
        return None;
    }
    array.spawn(core_id, priority, entry)
}

/// What happened to the core after `actly_exit`: the exiting PCB is
/// gone, and this names whichever process the scheduler picked to run
/// next (if any). There is deliberately no way to resume the exited
/// PCB from this value — `actly_exit`'s contract is that control never
/// returns to it (spec.md §9's "never returns" redesign note).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitOutcome {
    pub next: Option<PcbRef>,
}

/// Terminate `core_id`'s current process and schedule whatever runs
/// next. `reason` is stored into the exiting PCB's `blocking_data`
/// before termination, per spec.md §4.9. Refuses (returns `None`) only
/// if the core has no current process to exit — there is nothing for
/// the caller to have been executing as in that case.
pub fn actly_exit(array: &SchedulerArray, core_id: usize, reason: u64) -> Option<ExitOutcome> {
    let current = array.scheduler_get_current_process(core_id)?;
    {
        let mut pool = array.pool().lock();
        if let Some(pcb) = pool.get_mut(current) {
            if !pcb.state.can_transition_to(ProcessState::Terminated) {
                log::warn!("actly_exit refused: illegal transition from {:?}", pcb.state);
                return None;
            }
            pcb.blocking_data = reason;
            pcb.state = ProcessState::Terminated;
        }
        pool.free(current);
    }
    array.scheduler_set_current_process(core_id, None);
    decrement_reductions_with_check(array, core_id, BIF_EXIT_COST);
    let next = array.schedule(core_id);
    log::info!("core {} exited {:?}, next = {:?}", core_id, current, next);
    Some(ExitOutcome { next })
}
