//! Virtual clock with a queue of delayed callbacks
//!
//! Stands in for browser timers so the game can be driven deterministically.
//! Entries fire in `(due time, priority, schedule order)` order; a lower
//! priority value fires first when two entries are due in the same instant.

use serde::{Deserialize, Serialize};

/// Handle for a scheduled entry
pub type TimerId = u64;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Entry<T> {
    id: TimerId,
    due_ms: u64,
    priority: u8,
    payload: T,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scheduler<T> {
    now_ms: u64,
    next_id: TimerId,
    queue: Vec<Entry<T>>,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self {
            now_ms: 0,
            next_id: 1,
            queue: Vec::new(),
        }
    }

    /// Current virtual time
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Queue `payload` to fire `delay_ms` from now
    pub fn schedule(&mut self, delay_ms: u64, priority: u8, payload: T) -> TimerId {
        let id = self.next_id;
        self.next_id += 1;
        self.queue.push(Entry {
            id,
            due_ms: self.now_ms.saturating_add(delay_ms),
            priority,
            payload,
        });
        id
    }

    /// Remove a queued entry. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.queue.len();
        self.queue.retain(|e| e.id != id);
        self.queue.len() != before
    }

    /// Drop every queued entry
    pub fn clear(&mut self) {
        self.queue.clear();
    }

    /// Due time of the earliest entry
    pub fn next_due(&self) -> Option<u64> {
        self.queue.iter().map(|e| e.due_ms).min()
    }

    /// Pop the next entry due at or before `until_ms`, moving the clock to its due time
    pub fn pop_due(&mut self, until_ms: u64) -> Option<(TimerId, T)> {
        let index = self
            .queue
            .iter()
            .enumerate()
            .filter(|(_, e)| e.due_ms <= until_ms)
            .min_by_key(|(_, e)| (e.due_ms, e.priority, e.id))
            .map(|(i, _)| i)?;
        let entry = self.queue.swap_remove(index);
        self.now_ms = self.now_ms.max(entry.due_ms);
        Some((entry.id, entry.payload))
    }

    /// Move the clock forward without firing anything
    pub fn set_now(&mut self, now_ms: u64) {
        self.now_ms = self.now_ms.max(now_ms);
    }
}
