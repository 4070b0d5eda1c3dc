//! Temple site browser host.
//!
//! Compiled to WebAssembly and started by `wasm-bindgen` once the module is
//! loaded. Wires [`temple_site_core::Site`] to the real page through
//! [`dom::WebDom`] and [`timer::WebScheduler`], and installs the
//! [`ErrorGuard`] before anything else so a failing start still leaves a
//! working menu toggle.

pub mod dom;
pub mod logging;
pub mod timer;

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use temple_site_core::{
    EventResponse, ErrorGuard, Site, SiteConfig, SiteError, SiteEvent, SiteResult,
};
use tracing::{error, warn};
use wasm_bindgen::prelude::*;

use crate::dom::{ErrorSink, EventSink, Registry, WebDom};
use crate::timer::{DeferredSink, WebScheduler};

/// Body attribute holding the JSON site configuration.
pub const CONFIG_ATTRIBUTE: &str = "data-site-config";

pub type WebSite = Site<WebDom, WebScheduler>;

struct Running {
    _guard: Rc<RefCell<ErrorGuard<WebDom>>>,
    site: Option<Rc<RefCell<WebSite>>>,
}

thread_local! {
    static RUNNING: RefCell<Option<Running>> = const { RefCell::new(None) };
}

/// Configuration from the raw attribute value. An absent attribute means
/// defaults; an unusable one means defaults plus the reason.
pub fn config_from_attribute(raw: Option<&str>) -> (SiteConfig, Option<SiteError>) {
    let Some(raw) = raw.filter(|raw| !raw.trim().is_empty()) else {
        return (SiteConfig::default(), None);
    };
    match SiteConfig::from_json(raw) {
        Ok(config) => (config, None),
        Err(err) => (SiteConfig::default(), Some(err)),
    }
}

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();

    let raw = gloo::utils::document()
        .body()
        .and_then(|body| body.get_attribute(CONFIG_ATTRIBUTE));
    let (config, problem) = config_from_attribute(raw.as_deref());
    logging::init(&config.log_filter);
    if let Some(err) = problem {
        warn!(%err, "ignoring site config, using defaults");
    }

    if let Err(err) = launch(config) {
        error!(%err, "failed to start site");
    }
}

/// Cancel pending timers and unbind the site's listeners. The error guard
/// stays armed.
#[wasm_bindgen]
pub fn shutdown() {
    let site = RUNNING.with(|running| {
        running
            .borrow_mut()
            .as_mut()
            .and_then(|running| running.site.take())
    });
    if let Some(site) = site {
        match site.try_borrow_mut() {
            Ok(mut site) => site.teardown(),
            Err(_) => warn!("site busy during shutdown"),
        }
    }
}

fn launch(config: SiteConfig) -> SiteResult<()> {
    let registry = Registry::shared();

    let guard_dom = WebDom::new(registry.clone())?;
    let guard_slot = guard_dom.error_slot();
    let guard = Rc::new(RefCell::new(ErrorGuard::new(guard_dom, &config)));
    *guard_slot.borrow_mut() = Some(guard_sink(Rc::downgrade(&guard)));
    guard.borrow_mut().arm()?;

    let site_dom = WebDom::new(registry)?;
    let site_slot = site_dom.sink_slot();
    let scheduler = WebScheduler::new();
    let timer_slot = scheduler.sink_slot();

    let site = match Site::mount(site_dom, scheduler, config) {
        Ok(site) => {
            let site = Rc::new(RefCell::new(site));
            *site_slot.borrow_mut() = Some(site_sink(Rc::downgrade(&site)));
            *timer_slot.borrow_mut() = Some(deferred_sink(Rc::downgrade(&site)));
            Some(site)
        }
        Err(err) => {
            guard.borrow_mut().on_script_error(&err.to_string())?;
            None
        }
    };

    RUNNING.with(|running| *running.borrow_mut() = Some(Running { _guard: guard, site }));
    Ok(())
}

fn site_sink(site: Weak<RefCell<WebSite>>) -> EventSink {
    Rc::new(move |event: SiteEvent| {
        let Some(site) = site.upgrade() else {
            return EventResponse::Continue;
        };
        let Ok(mut site) = site.try_borrow_mut() else {
            warn!(?event, "site busy, dropping event");
            return EventResponse::Continue;
        };
        site.dispatch(event)
    })
}

fn deferred_sink(site: Weak<RefCell<WebSite>>) -> DeferredSink {
    Rc::new(move |id, action| {
        let Some(site) = site.upgrade() else {
            return;
        };
        match site.try_borrow_mut() {
            Ok(mut site) => site.run_deferred(id, action),
            Err(_) => warn!(?action, "site busy, dropping timer"),
        };
    })
}

fn guard_sink(guard: Weak<RefCell<ErrorGuard<WebDom>>>) -> ErrorSink {
    Rc::new(move |message: String| {
        let Some(guard) = guard.upgrade() else {
            return;
        };
        let Ok(mut guard) = guard.try_borrow_mut() else {
            warn!(detail = %message, "error guard busy");
            return;
        };
        if let Err(err) = guard.on_script_error(&message) {
            error!(%err, "error guard failed");
        }
    })
}
