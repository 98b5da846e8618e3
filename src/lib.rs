/*
 * actly-core
 *
 * A BEAM-inspired preemptive multicore scheduler for lightweight
 * user-space processes. Cooperative, reduction-counted preemption
 * instead of hardware-timer interrupts: every built-in call charges a
 * fixed cost against the current process's budget, and once that
 * budget is spent the process is handed back to its ready queue in
 * favor of the next runnable one.
 *
 * A `runtime::SchedulerArray` is the crate's one entry point: it owns
 * every core's state plus the shared PCB pool, and is built, held, and
 * driven entirely by a host harness. There is no process-wide global
 * scheduler state.
 */

pub mod affinity;
pub mod bif;
pub mod block;
pub mod config;
pub mod context;
pub mod deque;
pub mod error;
pub mod logging;
pub mod memory_pool;
pub mod message;
pub mod pcb;
pub mod preempt;
pub mod queue;
pub mod runtime;
pub mod scheduler_state;
pub mod steal;

pub use config::SchedulerConfig;
pub use error::{SchedError, SchedResult};
pub use pcb::{BlockReason, Pcb, PcbRef, Pid, Priority, ProcessState};
pub use runtime::SchedulerArray;
