/*
 * Per-Core Scheduler State
 *
 * spec.md §3's scheduler-state record and §8's stats counters. One
 * instance per core, owned by `runtime::SchedulerArray` and guarded by
 * that core's own `spin::Mutex` (SPEC_FULL.md §5).
 *
 * Grounded on the teacher's `sched_core::PerCpuSchedState` (cpu_id,
 * current_thread, timeslice_remaining, context_switches), extended with
 * the four ready queues, three waiting queues, and stats fields spec.md
 * names.
 */

use crate::config::NUM_PRIORITIES;
use crate::pcb::{BlockReason, PcbRef, Priority};
use crate::queue::RunQueue;

/// Counters exposed for diagnostics and the property tests in spec.md
/// §8. Not consulted by any scheduling decision itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedStats {
    pub scheduled: u64,
    pub yields: u64,
    pub migrations: u64,
    pub blocks: u64,
    pub wakes: u64,
    pub idles: u64,
}

/// Index into the three waiting-queue reasons. `BlockReason::None` has
/// no corresponding queue.
fn waiting_index(reason: BlockReason) -> Option<usize> {
    match reason {
        BlockReason::None => None,
        BlockReason::Receive => Some(0),
        BlockReason::Timer => Some(1),
        BlockReason::Io => Some(2),
    }
}

/// All per-core scheduling state: the four priority-ordered ready
/// queues, the three waiting queues, the currently running process (if
/// any), and its remaining reduction budget.
pub struct SchedulerState {
    pub core_id: u32,
    ready_queues: [RunQueue; NUM_PRIORITIES],
    waiting_queues: [RunQueue; 3],
    pub current_process: Option<PcbRef>,
    pub current_reductions: i64,
    pub stats: SchedStats,
}

impl SchedulerState {
    pub fn new(core_id: u32) -> Self {
        Self {
            core_id,
            ready_queues: [RunQueue::new(); NUM_PRIORITIES],
            waiting_queues: [RunQueue::new(); 3],
            current_process: None,
            current_reductions: 0,
            stats: SchedStats::default(),
        }
    }

    pub fn ready_queue(&mut self, priority: Priority) -> &mut RunQueue {
        &mut self.ready_queues[priority.as_index()]
    }

    pub fn ready_queue_ref(&self, priority: Priority) -> &RunQueue {
        &self.ready_queues[priority.as_index()]
    }

    pub fn waiting_queue(&mut self, reason: BlockReason) -> Option<&mut RunQueue> {
        waiting_index(reason).map(move |i| &mut self.waiting_queues[i])
    }

    pub fn waiting_queue_ref(&self, reason: BlockReason) -> Option<&RunQueue> {
        waiting_index(reason).map(|i| &self.waiting_queues[i])
    }

    /// Total runnable processes across all four priority levels.
    pub fn ready_len(&self) -> usize {
        self.ready_queues.iter().map(|q| q.len()).sum()
    }

    pub fn is_idle(&self) -> bool {
        self.current_process.is_none() && self.ready_len() == 0
    }
}
