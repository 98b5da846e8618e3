/*
 * Context Save/Restore Capability
 *
 * Low-level register context save/restore is explicitly out of scope
 * (spec.md §1): this module only names the interface the scheduler core
 * calls at the points spec.md requires a context switch, per the
 * `ContextOps` redesign note in spec.md §9. A host harness supplies the
 * real implementation (inline assembly, a `ucontext`-style call,
 * whatever its target needs); this crate never looks inside the bytes
 * it hands across the boundary.
 *
 * Grounded on the shape of the teacher's `InterruptContext` field
 * (an opaque register-dump struct threaded through context switch
 * code without the scheduler interpreting it).
 */

use crate::pcb::{Pcb, REGISTER_SAVE_AREA_SIZE};

/// Capability a host harness implements to actually move the CPU
/// between processes. The scheduler core calls these at well-defined
/// points (before `schedule` hands a new PCB to the caller, and when a
/// process is preempted) but never inspects the saved bytes itself.
pub trait ContextOps {
    /// Save the currently executing process's register state into its
    /// PCB's `register_save_area`.
    fn save(&self, pcb: &mut Pcb);

    /// Restore a process's register state from its PCB and transfer
    /// control to it. Does not return to the caller under normal
    /// operation; a host harness running on a real core treats this as
    /// divergent.
    fn restore(&self, pcb: &Pcb);
}

/// A `ContextOps` that does nothing, for hosts driving the scheduler
/// purely through its inspection API (tests, simulation) with no real
/// register state to move.
pub struct NoopContext;

impl ContextOps for NoopContext {
    fn save(&self, pcb: &mut Pcb) {
        pcb.register_save_area = [0; REGISTER_SAVE_AREA_SIZE];
    }

    fn restore(&self, _pcb: &Pcb) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pcb::PcbPool;
    use crate::pcb::Priority;

    #[test]
    fn noop_context_save_zeroes_register_area() {
        let mut pool = PcbPool::new();
        let (pcb_ref, _pid) = pool.allocate(0, Priority::Normal, 0, 8192, 4096).unwrap();
        let pcb = pool.get_mut(pcb_ref).unwrap();
        pcb.register_save_area[0] = 0xAB;
        NoopContext.save(pcb);
        assert_eq!(pcb.register_save_area[0], 0);
    }
}
