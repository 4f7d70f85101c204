//! Deferred and recurring events
//!
//! Timers are polled from the frame loop rather than fired from another
//! thread, so the state they touch is only ever mutated on one thread.
//! Handles are generational: once a timer is cancelled its handle can never
//! match a fire again, even if the slot is reused.

use slotmap::{new_key_type, SlotMap};

new_key_type! {
    /// Handle to a scheduled timer
    pub struct TimerHandle;
}

#[derive(Debug, Clone)]
struct ScheduledTimer<T> {
    period_ms: u64,
    next_due_ms: u64,
    payload: T,
}

/// Queue of cancellable recurring timers
///
/// Call [`TimerQueue::update_time`] once per frame, then drain
/// [`TimerQueue::pop_due`] until it returns `None`.
#[derive(Debug, Clone)]
pub struct TimerQueue<T> {
    timers: SlotMap<TimerHandle, ScheduledTimer<T>>,
    current_time_ms: u64,
}

impl<T: Clone> TimerQueue<T> {
    /// Create an empty queue at time zero
    pub fn new() -> Self {
        Self {
            timers: SlotMap::with_key(),
            current_time_ms: 0,
        }
    }

    /// Update current time (milliseconds)
    pub fn update_time(&mut self, now_ms: u64) {
        self.current_time_ms = self.current_time_ms.max(now_ms);
    }

    /// Current queue time in milliseconds
    pub fn now_ms(&self) -> u64 {
        self.current_time_ms
    }

    /// Schedule `payload` to fire every `period_ms`, first at now + period
    pub fn start(&mut self, period_ms: u64, payload: T) -> TimerHandle {
        let period_ms = period_ms.max(1);
        let handle = self.timers.insert(ScheduledTimer {
            period_ms,
            next_due_ms: self.current_time_ms.saturating_add(period_ms),
            payload,
        });
        log::debug!("Timer {handle:?} started, period {period_ms} ms");
        handle
    }

    /// Cancel a timer; returns false if it was already gone
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        let removed = self.timers.remove(handle).is_some();
        if removed {
            log::debug!("Timer {handle:?} cancelled");
        }
        removed
    }

    /// Whether `handle` still refers to a live timer
    pub fn is_active(&self, handle: TimerHandle) -> bool {
        self.timers.contains_key(handle)
    }

    /// Number of live timers
    pub fn active_count(&self) -> usize {
        self.timers.len()
    }

    /// Take the earliest fire that is due, re-arming its timer
    ///
    /// A timer that fell several periods behind yields one fire per call.
    pub fn pop_due(&mut self) -> Option<(TimerHandle, T)> {
        let now = self.current_time_ms;
        let (handle, timer) = self
            .timers
            .iter_mut()
            .filter(|(_, timer)| timer.next_due_ms <= now)
            .min_by_key(|(_, timer)| timer.next_due_ms)?;

        timer.next_due_ms = timer.next_due_ms.saturating_add(timer.period_ms);
        Some((handle, timer.payload.clone()))
    }
}

impl<T: Clone> Default for TimerQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(queue: &mut TimerQueue<u32>) -> Vec<u32> {
        std::iter::from_fn(|| queue.pop_due().map(|(_, payload)| payload)).collect()
    }

    #[test]
    fn test_timer_fires_once_per_period() {
        let mut queue = TimerQueue::new();
        queue.start(1_000, 7);

        queue.update_time(999);
        assert!(drain(&mut queue).is_empty());

        queue.update_time(1_000);
        assert_eq!(drain(&mut queue), vec![7]);

        queue.update_time(1_500);
        assert!(drain(&mut queue).is_empty());

        queue.update_time(3_000);
        assert_eq!(drain(&mut queue), vec![7, 7]);
    }

    #[test]
    fn test_cancelled_timer_never_fires() {
        let mut queue = TimerQueue::new();
        let handle = queue.start(1_000, 1);
        queue.update_time(5_000);

        assert!(queue.cancel(handle));
        assert!(!queue.is_active(handle));
        assert!(drain(&mut queue).is_empty());
        assert!(!queue.cancel(handle));
    }

    #[test]
    fn test_stale_handle_does_not_match_reused_slot() {
        let mut queue = TimerQueue::new();
        let first = queue.start(100, 1);
        queue.cancel(first);
        let second = queue.start(100, 2);

        assert_ne!(first, second);
        assert!(!queue.cancel(first));
        assert!(queue.is_active(second));
    }

    #[test]
    fn test_earliest_fire_comes_first() {
        let mut queue = TimerQueue::new();
        queue.start(300, 3);
        queue.start(100, 1);
        queue.update_time(300);
        assert_eq!(drain(&mut queue), vec![1, 1, 3, 1]);
    }

    #[test]
    fn test_time_never_runs_backwards() {
        let mut queue: TimerQueue<u32> = TimerQueue::new();
        queue.update_time(500);
        queue.update_time(100);
        assert_eq!(queue.now_ms(), 500);
    }
}
