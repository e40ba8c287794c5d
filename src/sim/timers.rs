//! Virtual-time timer queue
//!
//! Deferred work is data, not closures: each entry carries a task value
//! that the owner interprets when it comes due. The queue only moves when
//! its owner advances it, so freezing a queue is simply not advancing it.

use std::collections::BTreeMap;

/// Cancellation token for a scheduled task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

/// Tasks ordered by due time, then by scheduling order
#[derive(Debug, Clone)]
pub struct TimerQueue<T> {
    now_ms: u64,
    next_id: u64,
    pending: BTreeMap<(u64, u64), T>,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TimerQueue<T> {
    pub fn new() -> Self {
        Self {
            now_ms: 0,
            next_id: 1,
            pending: BTreeMap::new(),
        }
    }

    /// Current virtual time
    pub fn now(&self) -> u64 {
        self.now_ms
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Schedule `task` to come due `delay_ms` from now
    pub fn schedule_after(&mut self, delay_ms: u64, task: T) -> TimerHandle {
        self.schedule_at(self.now_ms.saturating_add(delay_ms), task)
    }

    /// Schedule `task` at an absolute virtual time, which may already be past
    pub fn schedule_at(&mut self, due_ms: u64, task: T) -> TimerHandle {
        let id = self.next_id;
        self.next_id += 1;
        self.pending.insert((due_ms, id), task);
        TimerHandle(id)
    }

    /// Cancel a pending task, returning it if it had not fired yet
    pub fn cancel(&mut self, handle: TimerHandle) -> Option<T> {
        let key = self.key_of(handle)?;
        self.pending.remove(&key)
    }

    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.key_of(handle).is_some()
    }

    /// Milliseconds until `handle` fires
    pub fn remaining(&self, handle: TimerHandle) -> Option<u64> {
        self.key_of(handle)
            .map(|(due, _)| due.saturating_sub(self.now_ms))
    }

    /// Drop every pending task; returns how many were cancelled
    pub fn clear(&mut self) -> usize {
        let count = self.pending.len();
        self.pending.clear();
        count
    }

    /// Cancel every pending task that `keep` rejects; returns how many went
    pub fn retain(&mut self, mut keep: impl FnMut(&T) -> bool) -> usize {
        let before = self.pending.len();
        self.pending.retain(|_, task| keep(task));
        before - self.pending.len()
    }

    /// Move virtual time forward. Nothing fires until [`Self::pop_due`].
    pub fn advance_by(&mut self, ms: u64) {
        self.now_ms = self.now_ms.saturating_add(ms);
    }

    /// Remove and return the earliest task that is due
    pub fn pop_due(&mut self) -> Option<(TimerHandle, T)> {
        self.pop_due_at().map(|(handle, _, task)| (handle, task))
    }

    /// Like [`Self::pop_due`], also returning the time the task was due.
    /// Repeating work reschedules from this so late polling does not drift.
    pub fn pop_due_at(&mut self) -> Option<(TimerHandle, u64, T)> {
        let (&(due, id), _) = self.pending.first_key_value()?;
        if due > self.now_ms {
            return None;
        }
        self.pending
            .remove(&(due, id))
            .map(|task| (TimerHandle(id), due, task))
    }

    fn key_of(&self, handle: TimerHandle) -> Option<(u64, u64)> {
        self.pending
            .keys()
            .find(|(_, id)| *id == handle.0)
            .copied()
    }
}
