/*
 * Message Queue
 *
 * Per-PCB inbox mechanics (spec.md §3, §4.5). Payload semantics are out
 * of scope (spec.md §1): a message is an opaque byte vector tagged with
 * a pattern value the receiver matches against.
 *
 * Grounded on the teacher's `ipc.rs` Mach-style port: a `VecDeque`-backed
 * FIFO queue coupled with a "someone is waiting" flag. The wider
 * multi-port/fixed-256-byte-message/capacity-32 machinery in that file
 * has no counterpart in the specification (which describes a single
 * queue per process, no ports, no fixed message size) and was not
 * carried over.
 */

use std::collections::VecDeque;

use crate::pcb::{PcbRef, PATTERN_ANY};

/// A single queued message: an opaque payload plus the pattern tag a
/// blocked receiver is matched against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedMessage {
    pub pattern: u64,
    pub payload: Vec<u8>,
}

impl QueuedMessage {
    pub fn new(pattern: u64, payload: Vec<u8>) -> Self {
        Self { pattern, payload }
    }

    fn matches(&self, wanted_pattern: u64) -> bool {
        wanted_pattern == PATTERN_ANY || wanted_pattern == self.pattern
    }
}

/// The inbox belonging to a single PCB.
///
/// `waiting_process` names the PCB blocked on `Receive` against this
/// queue (if any); it is always either `None` or the owning PCB's own
/// `PcbRef`, since only the owner process receives from its own queue.
#[derive(Debug, Default)]
pub struct MessageQueue {
    messages: VecDeque<QueuedMessage>,
    waiting_process: Option<PcbRef>,
}

impl MessageQueue {
    pub fn new() -> Self {
        Self {
            messages: VecDeque::new(),
            waiting_process: None,
        }
    }

    /// Enqueue a message. Always succeeds; the queue has no fixed
    /// capacity in this design (spec.md names no bound on queue depth).
    pub fn enqueue(&mut self, message: QueuedMessage) {
        self.messages.push_back(message);
    }

    /// Remove and return the oldest message matching `pattern`, if any.
    /// `PATTERN_ANY` matches every message. Preserves FIFO order among
    /// non-matching messages left behind.
    pub fn try_dequeue(&mut self, pattern: u64) -> Option<QueuedMessage> {
        let position = self.messages.iter().position(|m| m.matches(pattern))?;
        self.messages.remove(position)
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether any queued message currently matches `pattern`.
    pub fn has_match(&self, pattern: u64) -> bool {
        self.messages.iter().any(|m| m.matches(pattern))
    }

    pub fn set_waiting_process(&mut self, pcb_ref: Option<PcbRef>) {
        self.waiting_process = pcb_ref;
    }

    pub fn waiting_process(&self) -> Option<PcbRef> {
        self.waiting_process
    }
}
