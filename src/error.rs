/*
 * Scheduler Error Kinds
 *
 * One variant per error kind named in the specification's error handling
 * design. These are used internally by `Result`-returning helpers so call
 * sites get `?` and a meaningful `Display`; the public, spec-mandated entry
 * points (BIFs, host-harness API) never return `SchedError` themselves —
 * they collapse it to the sentinel spec.md §7 requires (0 / None / false)
 * and log the refusal at `warn!`.
 */

use thiserror::Error;

/// Reason a core scheduling operation refused to run.
///
/// Every variant corresponds 1:1 to a kind in the specification's error
/// handling section. No variant here is ever raised for a situation the
/// spec treats as a normal outcome (queue-empty, deque-full): those are
/// encoded as `Option`/`bool` return values, not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SchedError {
    #[error("core id is out of range")]
    InvalidCore,

    #[error("priority level is out of range")]
    InvalidPriority,

    #[error("pcb reference is null or invalid")]
    InvalidPcb,

    #[error("state transition is not legal from the current state")]
    InvalidState,

    #[error("wake was called on a pcb that is not waiting")]
    NotRunnable,

    #[error("size or duration is outside the allowed range")]
    SizeOutOfRange,

    #[error("pcb pool is exhausted")]
    PoolExhausted,

    #[error("operation is not permitted between these cores/pcb")]
    PermissionDenied,

    #[error("current process ran out of reductions")]
    Preempted,
}

pub type SchedResult<T> = Result<T, SchedError>;
