/*
 * Blocking & Wake
 *
 * spec.md §4.5. A running process can block on one of three reasons
 * (`Receive`, `Timer`, `Io`); `wake` reverses exactly that transition.
 * `check_timer_wakeups` is the sweep a host harness drives once per
 * tick to wake any process whose `wake_time` has passed.
 *
 * Grounded on the teacher's `io_wait.rs` (`WaitQueue::add_waiter`/
 * `wake_all`) and `ipc.rs`'s blocked-flag + waiting-process rendezvous,
 * merged into the three generic waiting reasons spec.md names instead
 * of the teacher's IRQ-channel-specific wait queues.
 */

use crate::config::MAX_BLOCKING_TIME;
use crate::message::QueuedMessage;
use crate::pcb::{BlockReason, PcbRef, ProcessState};
use crate::runtime::SchedulerArray;

/// Move `core_id`'s current process into the `reason` waiting queue.
/// Returns `false` (refused, no panic) if the core has no current
/// process or the state transition is illegal.
pub fn block(array: &SchedulerArray, core_id: usize, reason: BlockReason, data: u64) -> bool {
    let Some(current) = array.scheduler_get_current_process(core_id) else {
        log::warn!("block refused: core {} has no current process", core_id);
        return false;
    };
    let Some(mutex) = array.get_scheduler_state(core_id) else {
        return false;
    };
    let mut state = mutex.lock();
    let mut pool = array.pool().lock();
    let Some(pcb) = pool.get_mut(current) else {
        return false;
    };
    if !pcb.state.can_transition_to(ProcessState::Waiting) {
        log::warn!("block refused: illegal transition from {:?}", pcb.state);
        return false;
    }
    pcb.state = ProcessState::Waiting;
    pcb.blocking_reason = reason;
    pcb.blocking_data = data;
    if reason == BlockReason::Timer {
        pcb.wake_time = data.min(MAX_BLOCKING_TIME);
    }
    let Some(queue) = state.waiting_queue(reason) else {
        // BlockReason::None can never be passed here in practice; still
        // refuse cleanly rather than silently dropping the PCB.
        pcb.state = ProcessState::Running;
        return false;
    };
    queue.push_back(&mut pool, current);
    state.current_process = None;
    state.stats.blocks += 1;
    log::debug!("core {} blocked {:?} on {:?}", core_id, current, reason);
    true
}

/// Move `pcb_ref` out of `reason`'s waiting queue on `core_id` and back
/// onto its priority's ready queue. Returns `false` if the PCB is not
/// actually waiting for that reason (`NotRunnable`-shaped refusal).
pub fn wake(array: &SchedulerArray, core_id: usize, reason: BlockReason, pcb_ref: PcbRef) -> bool {
    let Some(mutex) = array.get_scheduler_state(core_id) else {
        return false;
    };
    let priority = {
        let mut state = mutex.lock();
        let mut pool = array.pool().lock();

        let is_waiting = match pool.get(pcb_ref) {
            Some(pcb) => pcb.state == ProcessState::Waiting && pcb.blocking_reason == reason,
            None => false,
        };
        if !is_waiting {
            log::warn!("wake refused: {:?} is not waiting on {:?}", pcb_ref, reason);
            return false;
        }

        let Some(queue) = state.waiting_queue(reason) else {
            return false;
        };
        if !queue.unlink(&mut pool, pcb_ref) {
            return false;
        }

        let Some(pcb) = pool.get_mut(pcb_ref) else {
            return false;
        };
        pcb.state = ProcessState::Ready;
        pcb.blocking_reason = BlockReason::None;
        let priority = pcb.priority;
        state.stats.wakes += 1;
        priority
    };
    array.enqueue(core_id, priority, pcb_ref)
}

/// Walk the current process's message queue first: a message whose
/// pattern matches (or `pattern` is the wildcard sentinel) is dequeued
/// and returned immediately, with no blocking. Only when nothing
/// matches does this store `pattern` and call `block(Receive)`.
pub fn block_on_receive(array: &SchedulerArray, core_id: usize, pattern: u64) -> Option<QueuedMessage> {
    let current = array.scheduler_get_current_process(core_id)?;
    {
        let mut pool = array.pool().lock();
        if let Some(pcb) = pool.get_mut(current) {
            if let Some(message) = pcb.message_queue.try_dequeue(pattern) {
                return Some(message);
            }
        }
    }
    block(array, core_id, BlockReason::Receive, pattern);
    None
}

/// `duration` is clamped to `MAX_BLOCKING_TIME`; callers that pass a
/// longer duration get the clamp silently applied rather than refused,
/// since an over-long sleep is not an error, just bounded.
pub fn block_on_timer(array: &SchedulerArray, core_id: usize, duration: u64) -> bool {
    block(array, core_id, BlockReason::Timer, duration.min(MAX_BLOCKING_TIME))
}

pub fn block_on_io(array: &SchedulerArray, core_id: usize, io_token: u64) -> bool {
    block(array, core_id, BlockReason::Io, io_token)
}

/// Wake every process in `core_id`'s `Timer` waiting queue whose
/// `wake_time` is at or before `now`. A host harness drives this once
/// per tick; it is never called from inside a BIF.
pub fn check_timer_wakeups(array: &SchedulerArray, core_id: usize, now: u64) -> usize {
    let due: Vec<PcbRef> = {
        let Some(mutex) = array.get_scheduler_state(core_id) else {
            return 0;
        };
        let state = mutex.lock();
        let pool = array.pool().lock();
        let Some(queue) = state.waiting_queue_ref(BlockReason::Timer) else {
            return 0;
        };
        let mut due = Vec::new();
        let mut cursor = queue.peek_front();
        // Linear scan: the waiting queue is a plain FIFO list with no
        // secondary ordering by wake_time, so every entry is checked.
        while let Some(pcb_ref) = cursor {
            if let Some(pcb) = pool.get(pcb_ref) {
                if pcb.wake_time <= now {
                    due.push(pcb_ref);
                }
                cursor = pcb.next;
            } else {
                break;
            }
        }
        due
    };
    let mut woken = 0;
    for pcb_ref in due {
        if wake(array, core_id, BlockReason::Timer, pcb_ref) {
            woken += 1;
        }
    }
    woken
}
