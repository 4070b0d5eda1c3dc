//! Browser timers for the site's deferred actions.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use gloo::timers::callback::Timeout;
use temple_site_core::{Deferred, Scheduler, TimerId};
use tracing::trace;

/// Runs a deferred action once its timer fires.
pub type DeferredSink = Rc<dyn Fn(TimerId, Deferred)>;

pub type DeferredSlot = Rc<RefCell<Option<DeferredSink>>>;

/// `setTimeout` backed scheduler.
///
/// A cancelled timeout still fires; the site's tracked scheduler discards it.
pub struct WebScheduler {
    next_id: u64,
    sink: DeferredSlot,
}

impl WebScheduler {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            sink: Rc::new(RefCell::new(None)),
        }
    }

    pub fn sink_slot(&self) -> DeferredSlot {
        self.sink.clone()
    }
}

impl Default for WebScheduler {
    fn default() -> Self {
        Self::new()
    }
}

fn millis(delay: Duration) -> u32 {
    u32::try_from(delay.as_millis()).unwrap_or(u32::MAX)
}

impl Scheduler for WebScheduler {
    fn schedule(&mut self, delay: Duration, action: Deferred) -> TimerId {
        let id = TimerId::new(self.next_id);
        self.next_id += 1;

        let sink = self.sink.clone();
        Timeout::new(millis(delay), move || {
            let handler = sink.borrow().clone();
            if let Some(handler) = handler {
                handler(id, action);
            }
        })
        .forget();
        id
    }

    fn cancel(&mut self, id: TimerId) {
        trace!(?id, "timer cancelled");
    }

    fn now(&self) -> Duration {
        let millis = web_sys::window()
            .and_then(|window| window.performance())
            .map(|performance| performance.now())
            .unwrap_or_else(js_sys::Date::now);
        Duration::from_secs_f64(millis.max(0.0) / 1000.0)
    }
}
