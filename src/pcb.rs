/*
 * Process Control Block
 *
 * This module defines the PCB record (spec.md §3), the process state
 * machine (§4.2), and the fixed-capacity slab pool that owns PCB storage
 * (§4.1).
 *
 * PCBs are never addressed by pointer. Per the arena redesign note in
 * spec.md §9, every PCB reference is a `PcbRef`, a 32-bit index into the
 * pool's slab array; `next`/`prev` intrusive links are `Option<PcbRef>`
 * for the same reason. `Pid` is a separate, monotonically increasing
 * identifier that is never reused even though the underlying slab is.
 */

use core::fmt;

use crate::affinity::AffinityMask;
use crate::config::{MAX_PROCESSES, STACK_ALIGNMENT, HEAP_ALIGNMENT};
use crate::message::MessageQueue;

/// Index into the PCB pool's slab array. Stands in for the pointer the
/// specification describes; validity is always checked against the pool
/// bounds and the allocation bitmap before use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PcbRef(pub u32);

/// Stable process identifier, unique for as long as the process lives.
/// Unlike `PcbRef`, a `Pid` is never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pid(pub u64);

impl fmt::Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pid{}", self.0)
    }
}

/// Scheduling priority. Numerically ordered, `Max` highest, matching
/// spec.md §6 exactly (`Max`=0, `High`=1, `Normal`=2, `Low`=3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(usize)]
pub enum Priority {
    Max = 0,
    High = 1,
    Normal = 2,
    Low = 3,
}

impl Priority {
    pub const ALL: [Priority; 4] = [Priority::Max, Priority::High, Priority::Normal, Priority::Low];

    /// Decode a priority level index, returning `None` for anything
    /// >= `NUM_PRIORITIES` (the `InvalidPriority` case).
    pub fn from_index(index: usize) -> Option<Priority> {
        match index {
            0 => Some(Priority::Max),
            1 => Some(Priority::High),
            2 => Some(Priority::Normal),
            3 => Some(Priority::Low),
            _ => None,
        }
    }

    pub fn as_index(self) -> usize {
        self as usize
    }
}

/// Process lifecycle state (spec.md §4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcessState {
    Created,
    Ready,
    Running,
    Waiting,
    Suspended,
    Terminated,
}

impl ProcessState {
    /// Whether `to` is a legal transition from `self`, per the table in
    /// spec.md §4.2. All transitions not listed there fail.
    pub fn can_transition_to(self, to: ProcessState) -> bool {
        use ProcessState::*;
        matches!(
            (self, to),
            (Created, Ready)
                | (Ready, Running)
                | (Running, Ready)
                | (Ready, Suspended)
                | (Ready, Terminated)
                | (Running, Waiting)
                | (Running, Terminated)
                | (Waiting, Ready)
                | (Waiting, Terminated)
                | (Suspended, Ready)
                | (Suspended, Terminated)
        )
    }

    /// True only for `Ready`, per spec.md §4.2's `is_runnable`.
    pub fn is_runnable(self) -> bool {
        matches!(self, ProcessState::Ready)
    }
}

/// Why a process is blocked. `None` iff the process is not `Waiting`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockReason {
    None,
    Receive,
    Timer,
    Io,
}

/// Bump-allocator descriptor for a stack or heap region (spec.md §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MemRegion {
    pub base: usize,
    pub size: usize,
    pub current: usize,
    pub limit: usize,
}

impl MemRegion {
    pub fn new(base: usize, size: usize) -> Self {
        Self {
            base,
            size,
            current: base,
            limit: base + size,
        }
    }
}

/// Opaque entry point the core jumps into. User process code is out of
/// scope (spec.md §1); this is just the address the context-restore
/// primitive is handed.
pub type EntryPoint = usize;

/// Sentinel `blocking_data`/pattern value meaning "accept any message".
pub const PATTERN_ANY: u64 = u64::MAX;

/// Fixed-size register save area. Populated and consumed only by the
/// `ContextOps` capability (spec.md §1: context save/restore is an
/// external collaborator); the scheduler core never interprets these
/// bytes.
pub const REGISTER_SAVE_AREA_SIZE: usize = 256;

/// The Process Control Block.
///
/// Field set matches spec.md §3's table. `next`/`prev` are intrusive
/// links usable by whichever single queue currently owns this PCB (the
/// invariant in spec.md §8: a PCB is linked into at most one of a ready
/// queue, a waiting queue, the current-process slot, or the deque).
pub struct Pcb {
    pub next: Option<PcbRef>,
    pub prev: Option<PcbRef>,
    pub pid: Pid,
    pub scheduler_id: u32,
    pub state: ProcessState,
    pub priority: Priority,
    pub reduction_count: i64,
    pub register_save_area: [u8; REGISTER_SAVE_AREA_SIZE],
    pub stack: MemRegion,
    pub heap: MemRegion,
    pub message_queue: MessageQueue,
    pub affinity_mask: AffinityMask,
    pub migration_count: u32,
    pub last_scheduled: u64,
    pub blocking_reason: BlockReason,
    pub blocking_data: u64,
    pub wake_time: u64,
    pub entry: EntryPoint,
}

impl Pcb {
    /// A zeroed, unowned PCB, as `allocate_pcb` hands out (spec.md §4.1:
    /// "Newly-allocated PCBs are zeroed").
    fn zeroed() -> Self {
        Self {
            next: None,
            prev: None,
            pid: Pid(0),
            scheduler_id: 0,
            state: ProcessState::Created,
            priority: Priority::Normal,
            reduction_count: 0,
            register_save_area: [0; REGISTER_SAVE_AREA_SIZE],
            stack: MemRegion::default(),
            heap: MemRegion::default(),
            message_queue: MessageQueue::new(),
            affinity_mask: AffinityMask::ALL,
            migration_count: 0,
            last_scheduled: 0,
            blocking_reason: BlockReason::None,
            blocking_data: 0,
            wake_time: 0,
            entry: 0,
        }
    }

    fn reset_for_spawn(
        &mut self,
        pid: Pid,
        scheduler_id: u32,
        priority: Priority,
        entry: EntryPoint,
        stack_size: usize,
        heap_size: usize,
    ) {
        *self = Pcb::zeroed();
        self.pid = pid;
        self.scheduler_id = scheduler_id;
        self.state = ProcessState::Created;
        self.priority = priority;
        self.entry = entry;
        // Bases are nominal: real allocation is delegated to the memory
        // pool collaborator (spec.md §1, §4.10). Alignment is asserted
        // here because it is an invariant of the descriptor itself.
        debug_assert_eq!(STACK_ALIGNMENT % 8, 0);
        debug_assert_eq!(HEAP_ALIGNMENT % 8, 0);
        self.stack = MemRegion::new(0, stack_size);
        self.heap = MemRegion::new(0, heap_size);
    }
}

impl fmt::Debug for Pcb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pcb")
            .field("pid", &self.pid)
            .field("scheduler_id", &self.scheduler_id)
            .field("state", &self.state)
            .field("priority", &self.priority)
            .field("reduction_count", &self.reduction_count)
            .field("migration_count", &self.migration_count)
            .field("blocking_reason", &self.blocking_reason)
            .finish()
    }
}

const BITMAP_WORDS: usize = MAX_PROCESSES.div_ceil(64);

/// Fixed-capacity slab pool of PCBs plus the allocation bitmap.
///
/// Grounded on the teacher's physical-frame bitmap allocator
/// (`memory/phys.rs`): a word-at-a-time scan for a free bit, generalized
/// from 4 KiB frames to 512-byte PCB slabs.
pub struct PcbPool {
    bitmap: [u64; BITMAP_WORDS],
    slots: Box<[Pcb]>,
    next_pid: u64,
}

impl PcbPool {
    pub fn new() -> Self {
        let mut slots = Vec::with_capacity(MAX_PROCESSES);
        for _ in 0..MAX_PROCESSES {
            slots.push(Pcb::zeroed());
        }
        Self {
            bitmap: [0; BITMAP_WORDS],
            slots: slots.into_boxed_slice(),
            next_pid: 1,
        }
    }

    fn is_allocated(&self, index: usize) -> bool {
        let word = index / 64;
        let bit = index % 64;
        (self.bitmap[word] >> bit) & 1 == 1
    }

    fn set_allocated(&mut self, index: usize, allocated: bool) {
        let word = index / 64;
        let bit = index % 64;
        if allocated {
            self.bitmap[word] |= 1 << bit;
        } else {
            self.bitmap[word] &= !(1u64 << bit);
        }
    }

    /// Allocate a PCB for a new process. Returns `None` when the pool is
    /// exhausted (`PoolExhausted`). The returned slot is zeroed and then
    /// populated with the given parameters.
    pub fn allocate(
        &mut self,
        scheduler_id: u32,
        priority: Priority,
        entry: EntryPoint,
        stack_size: usize,
        heap_size: usize,
    ) -> Option<(PcbRef, Pid)> {
        for word_idx in 0..BITMAP_WORDS {
            if self.bitmap[word_idx] == u64::MAX {
                continue;
            }
            for bit_idx in 0..64 {
                let index = word_idx * 64 + bit_idx;
                if index >= MAX_PROCESSES {
                    break;
                }
                if !self.is_allocated(index) {
                    self.set_allocated(index, true);
                    let pid = Pid(self.next_pid);
                    self.next_pid += 1;
                    self.slots[index].reset_for_spawn(
                        pid,
                        scheduler_id,
                        priority,
                        entry,
                        stack_size,
                        heap_size,
                    );
                    return Some((PcbRef(index as u32), pid));
                }
            }
        }
        None
    }

    /// Free a PCB. Validates the reference lies inside the pool and is
    /// currently allocated; an invalid reference is refused (returns
    /// `false`) rather than panicking, per spec.md §7.
    pub fn free(&mut self, pcb_ref: PcbRef) -> bool {
        let index = pcb_ref.0 as usize;
        if index >= MAX_PROCESSES || !self.is_allocated(index) {
            return false;
        }
        self.set_allocated(index, false);
        self.slots[index] = Pcb::zeroed();
        true
    }

    pub fn get(&self, pcb_ref: PcbRef) -> Option<&Pcb> {
        let index = pcb_ref.0 as usize;
        if index < MAX_PROCESSES && self.is_allocated(index) {
            Some(&self.slots[index])
        } else {
            None
        }
    }

    pub fn get_mut(&mut self, pcb_ref: PcbRef) -> Option<&mut Pcb> {
        let index = pcb_ref.0 as usize;
        if index < MAX_PROCESSES && self.is_allocated(index) {
            Some(&mut self.slots[index])
        } else {
            None
        }
    }

    /// Number of PCBs currently allocated. Used by test/diagnostic code
    /// only; the scheduling core never needs a linear scan to operate.
    pub fn allocated_count(&self) -> usize {
        (0..MAX_PROCESSES).filter(|&i| self.is_allocated(i)).count()
    }
}

impl Default for PcbPool {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocate_zeroes_and_reuses_slots() {
        let mut pool = PcbPool::new();
        let (r1, pid1) = pool.allocate(0, Priority::Normal, 0x1000, 8192, 4096).unwrap();
        assert!(pool.free(r1));
        let (r2, pid2) = pool.allocate(0, Priority::Normal, 0x2000, 8192, 4096).unwrap();
        // Slot reuse is allowed; pid is never reused.
        assert_eq!(r1, r2);
        assert_ne!(pid1, pid2);
    }

    #[test]
    fn free_on_allocated_pointer_never_fails() {
        let mut pool = PcbPool::new();
        let (r, _pid) = pool.allocate(0, Priority::Normal, 0, 8192, 4096).unwrap();
        assert!(pool.free(r));
    }

    #[test]
    fn free_on_null_or_unallocated_never_succeeds() {
        let mut pool = PcbPool::new();
        assert!(!pool.free(PcbRef(999_999)));
        let (r, _pid) = pool.allocate(0, Priority::Normal, 0, 8192, 4096).unwrap();
        assert!(pool.free(r));
        assert!(!pool.free(r));
    }

    #[test]
    fn pool_exhaustion_returns_none() {
        let mut pool = PcbPool::new();
        let mut refs = Vec::new();
        for _ in 0..MAX_PROCESSES {
            refs.push(pool.allocate(0, Priority::Normal, 0, 8192, 4096).unwrap());
        }
        assert!(pool.allocate(0, Priority::Normal, 0, 8192, 4096).is_none());
    }

    #[test]
    fn state_machine_legal_transitions() {
        use ProcessState::*;
        assert!(Created.can_transition_to(Ready));
        assert!(Ready.can_transition_to(Running));
        assert!(Running.can_transition_to(Ready));
        assert!(Running.can_transition_to(Waiting));
        assert!(Waiting.can_transition_to(Ready));
        assert!(Suspended.can_transition_to(Ready));
        assert!(Terminated.can_transition_to(Ready) == false);
    }

    #[test]
    fn state_machine_illegal_transition_leaves_state_unchanged() {
        // The state machine itself is pure; "unchanged on failure" is an
        // invariant of callers (block/wake/etc.), exercised there. Here
        // we just confirm the predicate is false for every non-listed
        // pair, e.g. Created -> Running is not legal.
        assert!(!ProcessState::Created.can_transition_to(ProcessState::Running));
        assert!(!ProcessState::Terminated.can_transition_to(ProcessState::Ready));
        assert!(!ProcessState::Terminated.can_transition_to(ProcessState::Waiting));
    }

    #[test]
    fn is_runnable_only_for_ready() {
        assert!(ProcessState::Ready.is_runnable());
        assert!(!ProcessState::Running.is_runnable());
        assert!(!ProcessState::Waiting.is_runnable());
        assert!(!ProcessState::Created.is_runnable());
    }
}
