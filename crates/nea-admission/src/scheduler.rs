//! Single-threaded virtual-time scheduler
//!
//! Events fire in deadline order; events sharing a deadline fire in the
//! order they were scheduled.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

#[derive(Debug)]
struct Entry<E> {
    due_ms: u64,
    seq: u64,
    event: E,
}

impl<E> PartialEq for Entry<E> {
    fn eq(&self, other: &Self) -> bool {
        (self.due_ms, self.seq) == (other.due_ms, other.seq)
    }
}

impl<E> Eq for Entry<E> {}

impl<E> PartialOrd for Entry<E> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<E> Ord for Entry<E> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.due_ms, self.seq).cmp(&(other.due_ms, other.seq))
    }
}

/// Min-heap of pending events keyed by deadline
#[derive(Debug)]
pub struct Scheduler<E> {
    queue: BinaryHeap<Reverse<Entry<E>>>,
    next_seq: u64,
}

impl<E> Scheduler<E> {
    pub fn new() -> Self {
        Self {
            queue: BinaryHeap::new(),
            next_seq: 0,
        }
    }

    pub fn schedule_at(&mut self, due_ms: u64, event: E) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(Reverse(Entry { due_ms, seq, event }));
    }

    /// Pop the earliest event due at or before `now_ms`
    pub fn pop_due(&mut self, now_ms: u64) -> Option<(u64, E)> {
        match self.queue.peek() {
            Some(Reverse(entry)) if entry.due_ms <= now_ms => self
                .queue
                .pop()
                .map(|Reverse(entry)| (entry.due_ms, entry.event)),
            _ => None,
        }
    }

    /// Drop every pending event matching `predicate`
    pub fn cancel_where(&mut self, mut predicate: impl FnMut(&E) -> bool) -> usize {
        let before = self.queue.len();
        self.queue.retain(|Reverse(entry)| !predicate(&entry.event));
        before - self.queue.len()
    }

    pub fn next_due(&self) -> Option<u64> {
        self.queue.peek().map(|Reverse(entry)| entry.due_ms)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl<E> Default for Scheduler<E> {
    fn default() -> Self {
        Self::new()
    }
}
