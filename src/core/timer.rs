//! Virtual Timer Queue
//!
//! One logical timeline measured in milliseconds. Timers are one-shot or
//! recurring and fire in `(deadline, arm order)` order, so two callbacks due at
//! the same instant always run in the order they were armed.

use std::collections::BTreeMap;

/// Milliseconds on the engine timeline.
pub type Millis = u64;

/// Handle to a scheduled timer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(u64);

#[derive(Clone, Debug)]
struct TimerEntry<T> {
    token: T,
    deadline: Millis,
    seq: u64,
    /// `Some(period)` for recurring timers.
    period: Option<Millis>,
}

/// A fired timer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fired<T> {
    /// Timer that fired.
    pub id: TimerId,
    /// Instant it was due.
    pub at: Millis,
    /// Payload given at schedule time.
    pub token: T,
}

/// Ordered queue of pending timers.
///
/// Cancelling is idempotent: cancelling a fired, cancelled or unknown timer
/// simply returns `false`.
#[derive(Clone, Debug)]
pub struct TimerQueue<T> {
    now: Millis,
    next_id: u64,
    next_seq: u64,
    entries: BTreeMap<TimerId, TimerEntry<T>>,
    order: BTreeMap<(Millis, u64), TimerId>,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TimerQueue<T> {
    /// Create an empty queue at time zero.
    pub fn new() -> Self {
        Self {
            now: 0,
            next_id: 0,
            next_seq: 0,
            entries: BTreeMap::new(),
            order: BTreeMap::new(),
        }
    }

    /// Current time on the timeline.
    #[inline]
    pub fn now(&self) -> Millis {
        self.now
    }

    /// Fire once, `delay` ms from now.
    pub fn schedule_once(&mut self, delay: Millis, token: T) -> TimerId {
        self.insert(delay, None, token)
    }

    /// Fire every `period` ms, first at `now + period`.
    pub fn schedule_every(&mut self, period: Millis, token: T) -> TimerId {
        self.insert(period, Some(period.max(1)), token)
    }

    fn insert(&mut self, delay: Millis, period: Option<Millis>, token: T) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        let seq = self.bump_seq();
        let deadline = self.now.saturating_add(delay);

        self.order.insert((deadline, seq), id);
        self.entries.insert(id, TimerEntry { token, deadline, seq, period });
        id
    }

    fn bump_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    /// Cancel a timer. Returns whether it was still pending.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        match self.entries.remove(&id) {
            Some(entry) => {
                self.order.remove(&(entry.deadline, entry.seq));
                true
            }
            None => false,
        }
    }

    /// Cancel an optional handle and clear it.
    pub fn cancel_slot(&mut self, slot: &mut Option<TimerId>) -> bool {
        slot.take().is_some_and(|id| self.cancel(id))
    }

    /// Drop every pending timer. The clock keeps its position.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    /// Is this timer still pending?
    pub fn is_pending(&self, id: TimerId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Deadline of a pending timer.
    pub fn deadline(&self, id: TimerId) -> Option<Millis> {
        self.entries.get(&id).map(|e| e.deadline)
    }

    /// Milliseconds until a pending timer fires.
    pub fn remaining(&self, id: TimerId) -> Option<Millis> {
        self.deadline(id).map(|d| d.saturating_sub(self.now))
    }

    /// Number of pending timers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is scheduled.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Earliest pending deadline.
    pub fn next_deadline(&self) -> Option<Millis> {
        self.order.keys().next().map(|(deadline, _)| *deadline)
    }

    /// Move the clock forward without firing anything.
    ///
    /// Never moves backwards and never past a pending deadline.
    pub fn advance_idle(&mut self, until: Millis) {
        let cap = self.next_deadline().unwrap_or(until);
        self.now = self.now.max(until.min(cap));
    }
}

impl<T: Clone> TimerQueue<T> {
    /// Pop the earliest timer due at or before `until`.
    ///
    /// Moves the clock to the timer's deadline. Recurring timers are re-armed
    /// at `deadline + period` under the same id.
    pub fn pop_due(&mut self, until: Millis) -> Option<Fired<T>> {
        let (&(deadline, seq), &id) = self.order.iter().next()?;
        if deadline > until {
            return None;
        }
        self.order.remove(&(deadline, seq));
        self.now = self.now.max(deadline);

        let period = self.entries.get(&id)?.period;
        let token = match period {
            Some(period) => {
                let next_seq = self.bump_seq();
                let entry = self.entries.get_mut(&id)?;
                entry.deadline = deadline.saturating_add(period);
                entry.seq = next_seq;
                self.order.insert((entry.deadline, next_seq), id);
                entry.token.clone()
            }
            None => self.entries.remove(&id)?.token,
        };

        Some(Fired { id, at: deadline, token })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_shot_fires_once() {
        let mut timers = TimerQueue::new();
        let id = timers.schedule_once(100, "a");

        assert!(timers.pop_due(99).is_none());
        let fired = timers.pop_due(100).unwrap();
        assert_eq!(fired, Fired { id, at: 100, token: "a" });
        assert!(timers.pop_due(10_000).is_none());
        assert!(!timers.is_pending(id));
        assert_eq!(timers.now(), 100);
    }

    #[test]
    fn test_recurring_keeps_fixed_cadence() {
        let mut timers = TimerQueue::new();
        timers.schedule_every(550, ());

        let mut fired_at = Vec::new();
        while let Some(f) = timers.pop_due(2_000) {
            fired_at.push(f.at);
        }
        assert_eq!(fired_at, vec![550, 1100, 1650]);
        assert_eq!(timers.next_deadline(), Some(2200));
    }

    #[test]
    fn test_same_deadline_fires_in_arm_order() {
        let mut timers = TimerQueue::new();
        timers.schedule_once(50, 1);
        timers.schedule_once(50, 2);
        timers.schedule_once(10, 3);

        let order: Vec<_> = std::iter::from_fn(|| timers.pop_due(50).map(|f| f.token)).collect();
        assert_eq!(order, vec![3, 1, 2]);
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let mut timers = TimerQueue::new();
        let id = timers.schedule_every(1000, ());

        assert!(timers.cancel(id));
        assert!(!timers.cancel(id));
        assert!(timers.pop_due(5000).is_none());

        let mut slot = None;
        assert!(!timers.cancel_slot(&mut slot));
        let mut slot = Some(timers.schedule_once(10, ()));
        assert!(timers.cancel_slot(&mut slot));
        assert!(slot.is_none());
    }

    #[test]
    fn test_remaining_and_idle_advance() {
        let mut timers = TimerQueue::new();
        let id = timers.schedule_once(300, ());

        timers.advance_idle(120);
        assert_eq!(timers.now(), 120);
        assert_eq!(timers.remaining(id), Some(180));

        // Idle advance stops at the next deadline
        timers.advance_idle(1_000);
        assert_eq!(timers.now(), 300);

        // Never backwards
        timers.advance_idle(10);
        assert_eq!(timers.now(), 300);
    }

    #[test]
    fn test_clear_drops_everything() {
        let mut timers = TimerQueue::new();
        timers.schedule_every(1000, ());
        timers.schedule_once(5, ());
        timers.clear();
        assert!(timers.is_empty());
        assert!(timers.next_deadline().is_none());
    }
}
