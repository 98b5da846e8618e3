/*
 * Priority Queue / Waiting Queue mechanics
 *
 * spec.md §4.3: a generic intrusive doubly-linked list over `PcbPool`
 * slots, addressed by `PcbRef` rather than pointer (per the arena
 * redesign note in spec.md §9). `RunQueue` is used both for the four
 * per-core ready queues and the three per-core waiting queues; which
 * queue a PCB is linked into is tracked by its caller; a PCB is never
 * linked into more than one queue at a time (spec.md §8 invariant).
 *
 * Grounded on the teacher's `RoundRobinPolicy` (`round_robin.rs`): a
 * FIFO `VecDeque<ThreadId>` rotated by `pick_next`. Re-expressed here as
 * an intrusive list so that the deque's O(1) unlink-from-middle
 * property (needed by `wake`, which must remove a specific PCB from
 * whichever waiting queue holds it) is preserved without a linear scan.
 */

use crate::pcb::{PcbPool, PcbRef};

/// FIFO list of `PcbRef`s threaded through `Pcb::next`/`Pcb::prev`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RunQueue {
    head: Option<PcbRef>,
    tail: Option<PcbRef>,
    count: usize,
}

impl RunQueue {
    pub fn new() -> Self {
        Self {
            head: None,
            tail: None,
            count: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Link `pcb_ref` onto the tail. Caller is responsible for having
    /// already unlinked it from any other queue.
    pub fn push_back(&mut self, pool: &mut PcbPool, pcb_ref: PcbRef) {
        if let Some(pcb) = pool.get_mut(pcb_ref) {
            pcb.next = None;
            pcb.prev = self.tail;
        }
        if let Some(tail_ref) = self.tail {
            if let Some(tail_pcb) = pool.get_mut(tail_ref) {
                tail_pcb.next = Some(pcb_ref);
            }
        } else {
            self.head = Some(pcb_ref);
        }
        self.tail = Some(pcb_ref);
        self.count += 1;
    }

    /// Unlink and return the head, if any.
    pub fn pop_front(&mut self, pool: &mut PcbPool) -> Option<PcbRef> {
        let head_ref = self.head?;
        let next = pool.get(head_ref).and_then(|p| p.next);
        self.head = next;
        match next {
            Some(next_ref) => {
                if let Some(next_pcb) = pool.get_mut(next_ref) {
                    next_pcb.prev = None;
                }
            }
            None => self.tail = None,
        }
        if let Some(pcb) = pool.get_mut(head_ref) {
            pcb.next = None;
            pcb.prev = None;
        }
        self.count -= 1;
        Some(head_ref)
    }

    /// Unlink a specific `pcb_ref` from anywhere in the list. Used by
    /// `wake`, which must remove a PCB from a waiting queue without
    /// scanning from the front. Returns `false` if `pcb_ref` was not
    /// actually linked into *this* queue (the caller is expected to
    /// know which queue holds it; this is a safety net, not the primary
    /// lookup path).
    pub fn unlink(&mut self, pool: &mut PcbPool, pcb_ref: PcbRef) -> bool {
        let (prev, next) = match pool.get(pcb_ref) {
            Some(pcb) => (pcb.prev, pcb.next),
            None => return false,
        };

        match prev {
            Some(prev_ref) => {
                if let Some(prev_pcb) = pool.get_mut(prev_ref) {
                    prev_pcb.next = next;
                }
            }
            None => {
                if self.head != Some(pcb_ref) {
                    return false;
                }
                self.head = next;
            }
        }

        match next {
            Some(next_ref) => {
                if let Some(next_pcb) = pool.get_mut(next_ref) {
                    next_pcb.prev = prev;
                }
            }
            None => {
                self.tail = prev;
            }
        }

        if let Some(pcb) = pool.get_mut(pcb_ref) {
            pcb.next = None;
            pcb.prev = None;
        }
        self.count -= 1;
        true
    }

    pub fn peek_front(&self) -> Option<PcbRef> {
        self.head
    }
}
