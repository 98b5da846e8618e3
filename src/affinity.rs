/*
 * Affinity & Topology
 *
 * spec.md §4.8. Affinity is a bitmask over core indices; topology is a
 * small, fixed-at-init table describing each core's type, cluster, and
 * NUMA node. CPU topology discovery internals are out of scope (spec.md
 * §1); `Topology::uniform` and `Topology::from_clusters` are the "fixed
 * capability query" construction the spec allows in place of real probing.
 *
 * Grounded on the teacher's `types::CpuId` (a thin newtype over the core
 * index, `BSP` constant for core 0), generalized to a mask and a table.
 */

use crate::config::MAX_CORES;

/// Bitmask over up to `MAX_CORES` (128) core indices. A plain `u128`
/// newtype rather than `bitflags`, since the set of bits is data (which
/// cores a process may run on), not a fixed compile-time flag set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AffinityMask(u128);

impl AffinityMask {
    pub const NONE: AffinityMask = AffinityMask(0);
    pub const ALL: AffinityMask = AffinityMask(u128::MAX);

    /// Mask containing only `core_id`. Returns `AffinityMask::NONE` if
    /// `core_id >= MAX_CORES` (an out-of-range core can never be set).
    pub fn single(core_id: usize) -> AffinityMask {
        if core_id >= MAX_CORES {
            AffinityMask::NONE
        } else {
            AffinityMask(1u128 << core_id)
        }
    }

    pub fn contains(self, core_id: usize) -> bool {
        core_id < MAX_CORES && (self.0 & (1u128 << core_id)) != 0
    }

    pub fn with(self, core_id: usize) -> AffinityMask {
        if core_id >= MAX_CORES {
            self
        } else {
            AffinityMask(self.0 | (1u128 << core_id))
        }
    }

    pub fn without(self, core_id: usize) -> AffinityMask {
        if core_id >= MAX_CORES {
            self
        } else {
            AffinityMask(self.0 & !(1u128 << core_id))
        }
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn intersects(self, other: AffinityMask) -> bool {
        (self.0 & other.0) != 0
    }

    pub fn count(self) -> u32 {
        self.0.count_ones()
    }
}

impl Default for AffinityMask {
    fn default() -> Self {
        AffinityMask::ALL
    }
}

/// Whether a core is a performance or efficiency core, per spec.md
/// §4.8's core-type query. Topologies with no heterogeneous cores (the
/// common case) report every core as `Performance`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CoreType {
    Performance,
    Efficiency,
}

/// What a newly-spawned process mostly does, used by `get_optimal_core`
/// to bias initial placement (spec.md §4.8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcessType {
    CpuIntensive,
    IoBound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct CoreInfo {
    core_type: CoreType,
    cluster: u32,
    numa_node: u32,
}

/// Fixed description of the cores a `SchedulerArray` manages. Built once
/// at `runtime::SchedulerArray::init` time; never mutated afterward
/// (spec.md §1 excludes topology discovery internals — this is a static
/// table, not a hardware probe).
#[derive(Debug, Clone)]
pub struct Topology {
    cores: Vec<CoreInfo>,
}

impl Topology {
    /// `core_count` homogeneous performance cores, one cluster, one NUMA
    /// node. The default for single-socket, non-hybrid targets.
    pub fn uniform(core_count: usize) -> Topology {
        Topology {
            cores: (0..core_count)
                .map(|_| CoreInfo {
                    core_type: CoreType::Performance,
                    cluster: 0,
                    numa_node: 0,
                })
                .collect(),
        }
    }

    /// Build a topology from an explicit per-core description. Intended
    /// for tests and hosts that already know their hybrid/NUMA layout.
    pub fn from_table(entries: Vec<(CoreType, u32, u32)>) -> Topology {
        Topology {
            cores: entries
                .into_iter()
                .map(|(core_type, cluster, numa_node)| CoreInfo {
                    core_type,
                    cluster,
                    numa_node,
                })
                .collect(),
        }
    }

    pub fn core_count(&self) -> usize {
        self.cores.len()
    }

    pub fn core_type(&self, core_id: usize) -> Option<CoreType> {
        self.cores.get(core_id).map(|c| c.core_type)
    }

    pub fn is_performance_core(&self, core_id: usize) -> bool {
        matches!(self.core_type(core_id), Some(CoreType::Performance))
    }

    pub fn cluster(&self, core_id: usize) -> Option<u32> {
        self.cores.get(core_id).map(|c| c.cluster)
    }

    pub fn numa_node(&self, core_id: usize) -> Option<u32> {
        self.cores.get(core_id).map(|c| c.numa_node)
    }

    /// Pick a core best suited for `process_type`, preferring
    /// performance cores for CPU-bound work and efficiency cores for
    /// I/O-bound work; falls back to core 0 when the preferred kind is
    /// absent, and to `None` only when the topology has no cores at all.
    pub fn get_optimal_core(&self, process_type: ProcessType) -> Option<usize> {
        if self.cores.is_empty() {
            return None;
        }
        let wanted = match process_type {
            ProcessType::CpuIntensive => CoreType::Performance,
            ProcessType::IoBound => CoreType::Efficiency,
        };
        self.cores
            .iter()
            .position(|c| c.core_type == wanted)
            .or(Some(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_single_and_contains() {
        let m = AffinityMask::single(3);
        assert!(m.contains(3));
        assert!(!m.contains(4));
    }

    #[test]
    fn mask_out_of_range_core_is_none() {
        let m = AffinityMask::single(MAX_CORES + 5);
        assert!(m.is_empty());
    }

    #[test]
    fn mask_with_without_round_trip() {
        let m = AffinityMask::NONE.with(1).with(2);
        assert!(m.contains(1) && m.contains(2));
        let m = m.without(1);
        assert!(!m.contains(1));
        assert!(m.contains(2));
    }

    #[test]
    fn uniform_topology_all_performance() {
        let t = Topology::uniform(4);
        assert_eq!(t.core_count(), 4);
        for i in 0..4 {
            assert!(t.is_performance_core(i));
        }
    }

    #[test]
    fn optimal_core_falls_back_when_no_efficiency_core_present() {
        let t = Topology::uniform(4);
        assert_eq!(t.get_optimal_core(ProcessType::IoBound), Some(0));
    }

    #[test]
    fn optimal_core_prefers_matching_type() {
        let t = Topology::from_table(vec![
            (CoreType::Performance, 0, 0),
            (CoreType::Efficiency, 0, 0),
        ]);
        assert_eq!(t.get_optimal_core(ProcessType::IoBound), Some(1));
        assert_eq!(t.get_optimal_core(ProcessType::CpuIntensive), Some(0));
    }
}
