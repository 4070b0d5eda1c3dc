//! Debounce and throttle helpers for high-frequency events.

use std::time::Duration;

use crate::timer::{Deferred, Scheduler, TimerId};

/// Runs an action only after calls have stopped for `wait`.
#[derive(Debug)]
pub struct Debouncer {
    wait: Duration,
    pending: Option<TimerId>,
}

impl Debouncer {
    pub fn new(wait: Duration) -> Self {
        Self {
            wait,
            pending: None,
        }
    }

    /// Restart the quiet period; the previous pending action is dropped.
    pub fn call(&mut self, timers: &mut dyn Scheduler, action: Deferred) {
        if let Some(previous) = self.pending.take() {
            timers.cancel(previous);
        }
        self.pending = Some(timers.schedule(self.wait, action));
    }

    /// Forget the pending timer once it has fired.
    pub fn settle(&mut self, id: TimerId) {
        if self.pending == Some(id) {
            self.pending = None;
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

/// Admits at most one call per `limit`.
#[derive(Debug)]
pub struct Throttle {
    limit: Duration,
    last: Option<Duration>,
}

impl Throttle {
    pub fn new(limit: Duration) -> Self {
        Self { limit, last: None }
    }

    /// True if the call at `now` should run.
    pub fn admit(&mut self, now: Duration) -> bool {
        match self.last {
            Some(last) if now.saturating_sub(last) < self.limit => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }

    /// Time left at `now` before the next call is admitted.
    pub fn remaining(&self, now: Duration) -> Duration {
        self.last
            .map(|last| self.limit.saturating_sub(now.saturating_sub(last)))
            .unwrap_or_default()
    }

    /// Record a call made outside [`admit`](Self::admit).
    pub fn mark(&mut self, now: Duration) {
        self.last = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::FakeScheduler;

    #[test]
    fn test_debounce_keeps_only_last_call() {
        let mut timers = FakeScheduler::new();
        let mut debounce = Debouncer::new(Duration::from_millis(100));

        debounce.call(&mut timers, Deferred::ResizeSettled);
        timers.advance(Duration::from_millis(60));
        debounce.call(&mut timers, Deferred::ResizeSettled);

        assert!(timers.advance(Duration::from_millis(60)).is_empty());
        let fired = timers.advance(Duration::from_millis(40));
        assert_eq!(fired.len(), 1);

        debounce.settle(fired[0].0);
        assert!(!debounce.is_pending());
    }

    #[test]
    fn test_throttle_spacing() {
        let mut throttle = Throttle::new(Duration::from_millis(50));
        assert!(throttle.admit(Duration::from_millis(0)));
        assert!(!throttle.admit(Duration::from_millis(20)));
        assert!(!throttle.admit(Duration::from_millis(49)));
        assert!(throttle.admit(Duration::from_millis(50)));
        assert!(!throttle.admit(Duration::from_millis(80)));
        assert!(throttle.admit(Duration::from_millis(120)));
    }

    #[test]
    fn test_throttle_remaining_window() {
        let mut throttle = Throttle::new(Duration::from_millis(100));
        assert_eq!(throttle.remaining(Duration::from_millis(5)), Duration::ZERO);

        throttle.admit(Duration::from_millis(10));
        assert_eq!(throttle.remaining(Duration::from_millis(40)), Duration::from_millis(70));
        assert_eq!(throttle.remaining(Duration::from_millis(200)), Duration::ZERO);

        throttle.mark(Duration::from_millis(200));
        assert!(!throttle.admit(Duration::from_millis(250)));
    }
}
