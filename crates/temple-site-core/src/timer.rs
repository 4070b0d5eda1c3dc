//! Deferred actions and the timer abstraction.
//!
//! A scheduled callback is plain data: the controllers schedule a
//! [`Deferred`] action and the host hands it back to
//! [`Site::run_deferred`](crate::Site::run_deferred) when the timer fires.

use std::collections::BTreeSet;
use std::time::Duration;

use crate::dom::ElementId;

/// Handle to a scheduled action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

impl TimerId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Work to perform once a timer fires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Deferred {
    /// Scroll an opened card to the viewport centre.
    ScrollCardIntoView(ElementId),
    /// Clear the press effect left by a touch.
    ResetTouch(ElementId),
    /// Pause the background video and dim it.
    BatteryPause(ElementId),
    /// A debounced resize has gone quiet.
    ResizeSettled,
    /// The scroll throttle window closed with skipped events.
    ScrollSettled,
}

/// Timer source.
pub trait Scheduler {
    fn schedule(&mut self, delay: Duration, action: Deferred) -> TimerId;

    /// Cancelling an unknown or already fired timer is a no-op.
    fn cancel(&mut self, id: TimerId);

    /// Monotonic time since an arbitrary origin.
    fn now(&self) -> Duration;
}

/// Wraps a [`Scheduler`] and remembers which timers are still pending.
///
/// A timer that fires after it was cancelled is reported as stale by
/// [`complete`](Self::complete), so hosts whose native timers cannot be
/// cleared still honour cancellation.
#[derive(Debug)]
pub struct TrackedScheduler<S> {
    inner: S,
    pending: BTreeSet<TimerId>,
}

impl<S: Scheduler> TrackedScheduler<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            pending: BTreeSet::new(),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut S {
        &mut self.inner
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Mark a fired timer as done. Returns false if it had been cancelled.
    pub fn complete(&mut self, id: TimerId) -> bool {
        self.pending.remove(&id)
    }

    /// Cancel every pending timer.
    pub fn cancel_all(&mut self) {
        for id in std::mem::take(&mut self.pending) {
            self.inner.cancel(id);
        }
    }
}

impl<S: Scheduler> Scheduler for TrackedScheduler<S> {
    fn schedule(&mut self, delay: Duration, action: Deferred) -> TimerId {
        let id = self.inner.schedule(delay, action);
        self.pending.insert(id);
        id
    }

    fn cancel(&mut self, id: TimerId) {
        if self.pending.remove(&id) {
            self.inner.cancel(id);
        }
    }

    fn now(&self) -> Duration {
        self.inner.now()
    }
}
