/*
 * Memory Pool Expansion
 *
 * spec.md §4.10: a thin collaborator a PCB's stack/heap bump allocator
 * calls when it runs off the end of its current region. The expansion
 * *policy* (when to grow, by how much, where backing pages come from)
 * is explicitly out of scope (spec.md §1); this module only offers the
 * narrow operation the scheduler core depends on so that `bif_spawn`
 * and friends have somewhere to call.
 *
 * Grounded on the teacher's `memory/phys.rs` bitmap frame allocator,
 * kept as a thin stand-in: growth here is a size check against the
 * configured maximum, not a real page-table operation.
 */

use crate::config::{MAX_HEAP_SIZE, MAX_STACK_SIZE};
use crate::pcb::MemRegion;

/// What a bump-allocator region exists for, bounding its growth ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionKind {
    Stack,
    Heap,
}

/// Grow `region` to `new_size`, provided it does not exceed the kind's
/// configured ceiling. Returns `false` (no panic) on an out-of-range
/// request, matching spec.md §7's `SizeOutOfRange` kind.
pub fn expand_memory_pool(region: &mut MemRegion, kind: RegionKind, new_size: usize) -> bool {
    let ceiling = match kind {
        RegionKind::Stack => MAX_STACK_SIZE,
        RegionKind::Heap => MAX_HEAP_SIZE,
    };
    if new_size == 0 || new_size > ceiling || new_size < region.size {
        log::warn!("memory pool expansion refused: requested {} (ceiling {})", new_size, ceiling);
        return false;
    }
    region.size = new_size;
    region.limit = region.base + new_size;
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expansion_within_ceiling_succeeds() {
        let mut region = MemRegion::new(0, 4096);
        assert!(expand_memory_pool(&mut region, RegionKind::Heap, 8192));
        assert_eq!(region.size, 8192);
    }

    #[test]
    fn expansion_past_ceiling_is_refused() {
        let mut region = MemRegion::new(0, 4096);
        assert!(!expand_memory_pool(&mut region, RegionKind::Heap, MAX_HEAP_SIZE + 1));
        assert_eq!(region.size, 4096);
    }

    #[test]
    fn shrink_request_is_refused() {
        let mut region = MemRegion::new(0, 8192);
        assert!(!expand_memory_pool(&mut region, RegionKind::Stack, 4096));
    }
}
