/*
 * Scheduler Constants & Runtime Configuration
 *
 * This module carries the fixed constants the specification exposes as
 * read-only (section 6), plus `SchedulerConfig`, the small set of
 * parameters a host harness may legitimately choose at runtime instead of
 * compiling in.
 */

/// Maximum number of cores a single `SchedulerArray` can manage.
pub const MAX_CORES: usize = 128;

/// Number of priority levels (`Priority::Max` .. `Priority::Low`).
pub const NUM_PRIORITIES: usize = 4;

/// Reduction budget a process receives on `schedule`/`wake`.
pub const DEFAULT_REDUCTIONS: i64 = 2000;

/// Canonical PCB size, in bytes. See DESIGN.md Open Question 2: this is a
/// documented budget, not an enforced `repr(C)` layout.
pub const PCB_SIZE: usize = 512;

pub const DEFAULT_STACK_SIZE: usize = 8192;
pub const DEFAULT_HEAP_SIZE: usize = 4096;
pub const MAX_STACK_SIZE: usize = 65536;
pub const MAX_HEAP_SIZE: usize = 1_048_576;
pub const STACK_ALIGNMENT: usize = 16;
pub const HEAP_ALIGNMENT: usize = 8;

/// Fixed capacity of the PCB slab pool.
pub const MAX_PROCESSES: usize = 1024;

/// A PCB may be migrated at most this many times before further steals
/// are refused for it.
pub const MAX_MIGRATIONS: u32 = 10;

/// A victim's deque must hold at least this many entries before a steal
/// attempt against it is worth making.
pub const MIN_STEAL_QUEUE_SIZE: usize = 2;

pub const WORK_STEAL_ENABLED: bool = true;

/// Longest timer-wait duration, in ticks, `block_on_timer` accepts.
pub const MAX_BLOCKING_TIME: u64 = 10_000;

pub const BIF_SPAWN_COST: i64 = 10;
pub const BIF_EXIT_COST: i64 = 1;
pub const BIF_YIELD_COST: i64 = 1;

/// Size, in bytes, of one priority-queue record (head + tail + count).
pub const PRIORITY_QUEUE_RECORD_SIZE: usize = 24;

/// Size, in bytes, of one per-core scheduler record.
pub const SCHEDULER_RECORD_SIZE: usize = 240;

/// Boundary `yield_check` compares `reduction_count` against. See
/// DESIGN.md Open Question 1: the spec's own test files disagree on
/// whether exhaustion is `== 0` or `<= 1`; this constant makes the choice
/// a single, overridable point rather than a scattered literal.
pub const YIELD_CHECK_THRESHOLD: i64 = 0;

/// Runtime-tunable scheduler parameters.
///
/// Everything else in this module is a fixed constant; these three are
/// the parameters a host harness legitimately picks per run (e.g. tests
/// want a tiny `default_reductions` to exercise preemption quickly
/// without looping thousands of times).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(
    feature = "config-serde",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct SchedulerConfig {
    /// Number of cores to bring up, 1..=MAX_CORES.
    pub core_count: usize,
    /// Reduction budget assigned on `schedule`/`wake`.
    pub default_reductions: i64,
    /// Whether idle cores attempt work stealing.
    pub work_steal_enabled: bool,
}

impl SchedulerConfig {
    /// Build a config for `core_count` cores with every other parameter
    /// at its spec-mandated default.
    pub fn new(core_count: usize) -> Self {
        Self {
            core_count,
            default_reductions: DEFAULT_REDUCTIONS,
            work_steal_enabled: WORK_STEAL_ENABLED,
        }
    }

    /// Validate the configuration against the fixed bounds in this
    /// module. Does not validate anything that depends on runtime
    /// topology (that happens in `runtime::SchedulerArray::init`).
    pub fn is_valid(&self) -> bool {
        self.core_count >= 1 && self.core_count <= MAX_CORES && self.default_reductions >= 0
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::new(1)
    }
}
