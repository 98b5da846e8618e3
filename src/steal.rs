/*
 * Work Stealing
 *
 * spec.md §4.7: load estimation, victim selection, the steal protocol
 * itself, and migration bookkeeping (the `MAX_MIGRATIONS` cap).
 *
 * There is no teacher analogue — CLUU is single-core — so the
 * victim-selection strategies are shaped after the policy/mechanism
 * split in `traits.rs` (`Scheduler`/`KernelSchedCtx`), applied here to
 * core selection instead of thread selection. `rand` (used elsewhere in
 * the example pack for exactly this kind of selection, e.g.
 * `adamtc007-ob-poc`) backs `select_random`.
 */

use rand::Rng;

use crate::affinity::AffinityMask;
use crate::config::{MAX_MIGRATIONS, MIN_STEAL_QUEUE_SIZE};
use crate::deque::StealOutcome;
use crate::pcb::{PcbRef, Priority};
use crate::runtime::SchedulerArray;

/// How a busy core is picked when an idle core goes looking for work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VictimStrategy {
    Random,
    ByLoad,
    /// Prefer a victim in the same cluster (affinity/topology-aware).
    Locality,
}

/// Weighted load estimate for one core: ready-queue depth plus deque
/// depth, weighted so that higher-priority work counts for more
/// (spec.md §4.7: "load calculation... weighted by priority").
pub fn get_load(array: &SchedulerArray, core_id: usize) -> u64 {
    let Some(mutex) = array.get_scheduler_state(core_id) else {
        return 0;
    };
    let state = mutex.lock();
    let weighted_ready: u64 = Priority::ALL
        .iter()
        .map(|&p| {
            let weight = 4 - p.as_index() as u64;
            weight * state.ready_queue_ref(p).len() as u64
        })
        .sum();
    let deque_len = array.get_deque(core_id).map(|d| d.size()).unwrap_or(0) as u64;
    weighted_ready + deque_len
}

/// The most heavily loaded core other than `excluding`, if any core has
/// nonzero load.
pub fn find_busiest(array: &SchedulerArray, excluding: usize) -> Option<usize> {
    (0..array.core_count())
        .filter(|&c| c != excluding)
        .map(|c| (c, get_load(array, c)))
        .filter(|&(_, load)| load > 0)
        .max_by_key(|&(_, load)| load)
        .map(|(c, _)| c)
}

pub fn select_random(array: &SchedulerArray, excluding: usize) -> Option<usize> {
    let candidates: Vec<usize> = (0..array.core_count()).filter(|&c| c != excluding).collect();
    if candidates.is_empty() {
        return None;
    }
    let index = rand::thread_rng().gen_range(0..candidates.len());
    Some(candidates[index])
}

pub fn select_by_load(array: &SchedulerArray, excluding: usize) -> Option<usize> {
    find_busiest(array, excluding)
}

/// Prefer a victim in the same topology cluster as `excluding`; falls
/// back to load-based selection if no other core shares the cluster.
pub fn select_locality(array: &SchedulerArray, excluding: usize) -> Option<usize> {
    let cluster = array.topology.cluster(excluding)?;
    let same_cluster: Option<usize> = (0..array.core_count())
        .filter(|&c| c != excluding)
        .filter(|&c| array.topology.cluster(c) == Some(cluster))
        .map(|c| (c, get_load(array, c)))
        .filter(|&(_, load)| load > 0)
        .max_by_key(|&(_, load)| load)
        .map(|(c, _)| c);
    same_cluster.or_else(|| select_by_load(array, excluding))
}

fn select_victim(array: &SchedulerArray, excluding: usize, strategy: VictimStrategy) -> Option<usize> {
    match strategy {
        VictimStrategy::Random => select_random(array, excluding),
        VictimStrategy::ByLoad => select_by_load(array, excluding),
        VictimStrategy::Locality => select_locality(array, excluding),
    }
}

/// Whether stealing `pcb_ref` from `victim_core` onto `thief_core` is
/// permitted: the PCB's affinity mask must allow `thief_core`, and its
/// migration count must not already be at the cap.
pub fn is_steal_allowed(array: &SchedulerArray, pcb_ref: PcbRef, thief_core: usize) -> bool {
    let pool = array.pool().lock();
    match pool.get(pcb_ref) {
        Some(pcb) => pcb.affinity_mask.contains(thief_core) && pcb.migration_count < MAX_MIGRATIONS,
        None => false,
    }
}

/// One end-to-end steal attempt by `thief_core`: select a victim,
/// inspect its deque size against `MIN_STEAL_QUEUE_SIZE`, attempt
/// `pop_top`, and check affinity/migration permission. Returns the
/// stolen PCB on success. Every refusal path is a plain `None`, not a
/// panic or error — an empty/aborted/disallowed steal is a routine
/// outcome at this layer (spec.md §4.7 treats none of these as errors).
pub fn try_steal_work(array: &SchedulerArray, thief_core: usize, strategy: VictimStrategy) -> Option<PcbRef> {
    let victim_core = select_victim(array, thief_core, strategy)?;
    let victim_deque = array.get_deque(victim_core)?;
    if victim_deque.size() < MIN_STEAL_QUEUE_SIZE {
        return None;
    }
    match victim_deque.pop_top() {
        StealOutcome::Success(pcb_ref) => {
            if !is_steal_allowed(array, pcb_ref, thief_core) {
                // Put it back where it came from; the thief has no
                // entitlement to a PCB affinity-pinned away from it.
                victim_deque.push_bottom(pcb_ref);
                log::debug!("steal of {:?} refused by affinity/migration cap", pcb_ref);
                return None;
            }
            migrate_process(array, pcb_ref, victim_core, thief_core);
            Some(pcb_ref)
        }
        StealOutcome::Empty | StealOutcome::Abort => None,
    }
}

/// Record a migration: bump the PCB's migration counter and move it
/// onto the thief core's ready queue. Does not itself check the
/// migration cap — `try_steal_work` already did, via
/// `is_steal_allowed`; this is the unconditional bookkeeping half.
pub fn migrate_process(array: &SchedulerArray, pcb_ref: PcbRef, from_core: usize, to_core: usize) {
    let priority = {
        let mut pool = array.pool().lock();
        let Some(pcb) = pool.get_mut(pcb_ref) else {
            return;
        };
        pcb.migration_count += 1;
        pcb.scheduler_id = to_core as u32;
        pcb.priority
    };
    if let Some(mutex) = array.get_scheduler_state(from_core) {
        mutex.lock().stats.migrations += 1;
    }
    array.enqueue(to_core, priority, pcb_ref);
    log::info!("migrated {:?} from core {} to core {}", pcb_ref, from_core, to_core);
}

/// Affinity-pin `pcb_ref` to exactly `mask`. Refuses a null PCB or an
/// all-zero mask — a process runnable on no core could never be
/// scheduled again.
pub fn set_affinity(array: &SchedulerArray, pcb_ref: PcbRef, mask: AffinityMask) -> bool {
    if mask.is_empty() {
        log::warn!("set_affinity refused: {:?} would have an empty mask", pcb_ref);
        return false;
    }
    let mut pool = array.pool().lock();
    match pool.get_mut(pcb_ref) {
        Some(pcb) => {
            pcb.affinity_mask = mask;
            true
        }
        None => false,
    }
}

pub fn get_affinity(array: &SchedulerArray, pcb_ref: PcbRef) -> Option<AffinityMask> {
    array.pool().lock().get(pcb_ref).map(|p| p.affinity_mask)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SchedulerConfig;

    fn array(cores: usize) -> SchedulerArray {
        SchedulerArray::init(SchedulerConfig::new(cores)).unwrap()
    }

    #[test]
    fn busiest_core_excludes_self() {
        let arr = array(2);
        arr.spawn(1, Priority::Normal, 0).unwrap();
        arr.spawn(1, Priority::Normal, 0).unwrap();
        assert_eq!(find_busiest(&arr, 1), None);
        assert_eq!(find_busiest(&arr, 0), Some(1));
    }

    #[test]
    fn migration_increments_counter_and_caps_out() {
        let arr = array(2);
        arr.spawn(0, Priority::Normal, 0).unwrap();
        let pcb_ref = arr.schedule(0).unwrap();
        for _ in 0..MAX_MIGRATIONS {
            migrate_process(&arr, pcb_ref, 0, 1);
        }
        assert!(!is_steal_allowed(&arr, pcb_ref, 0));
    }

    #[test]
    fn steal_respects_affinity_mask() {
        let arr = array(2);
        arr.spawn(0, Priority::Normal, 0).unwrap();
        let pcb_ref = arr.schedule(0).unwrap();
        assert!(set_affinity(&arr, pcb_ref, AffinityMask::single(0)));
        assert!(!is_steal_allowed(&arr, pcb_ref, 1));
        assert!(is_steal_allowed(&arr, pcb_ref, 0));
    }

    #[test]
    fn set_affinity_rejects_empty_mask() {
        let arr = array(2);
        arr.spawn(0, Priority::Normal, 0).unwrap();
        let pcb_ref = arr.schedule(0).unwrap();
        assert!(!set_affinity(&arr, pcb_ref, AffinityMask::NONE));
        assert_eq!(get_affinity(&arr, pcb_ref), Some(AffinityMask::ALL));
    }

    #[test]
    fn steal_below_min_queue_size_is_refused() {
        let arr = array(2);
        let deque = arr.get_deque(1).unwrap();
        deque.push_bottom(PcbRef(0));
        // Only one entry: below MIN_STEAL_QUEUE_SIZE (2).
        assert!(try_steal_work(&arr, 0, VictimStrategy::ByLoad).is_none());
    }
}
