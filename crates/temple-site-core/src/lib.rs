//! Temple Site Core Library
//!
//! Page behaviour for the temple website, independent of the browser.
//!
//! ## Overview
//!
//! Every behaviour is a reaction to a single DOM event: the mobile menu, the
//! ritual card accordion, smooth anchor scrolling, the navbar's scroll
//! effects, fade-in reveals, background video playback, lazy images, touch
//! feedback and keyboard accessibility.
//!
//! The controllers reach the page only through the [`Dom`] trait and timers
//! only through the [`Scheduler`] trait. The browser host implements both
//! with `web-sys` and `gloo`; tests use `fake::FakeDom` and
//! `fake::FakeScheduler`, available with the `test-support` feature.
//!
//! ## Quick Start
//!
//! ```
//! use temple_site_core::fake::{FakeDom, FakeScheduler};
//! use temple_site_core::{Site, SiteConfig, SiteEvent};
//!
//! let (dom, page) = FakeDom::sample_page();
//! let mut site = Site::mount(dom, FakeScheduler::new(), SiteConfig::default()).unwrap();
//!
//! site.dispatch(SiteEvent::Click(page.nav_toggle));
//! assert!(site.navigation().is_open(site.dom()));
//! ```

pub mod accessibility;
pub mod anchors;
pub mod cards;
pub mod config;
pub mod dom;
pub mod error;
#[cfg(any(test, feature = "test-support"))]
pub mod fake;
pub mod fallback;
pub mod lazy_images;
pub mod media;
pub mod navigation;
pub mod rate_limit;
pub mod reveal;
pub mod scroll;
pub mod site;
pub mod timer;
pub mod touch;

// Re-exports
pub use config::SiteConfig;
pub use dom::{Dom, ElementId, EventKind, EventResponse, Target, Watcher, WatcherOptions};
pub use error::{SiteError, SiteResult};
pub use fallback::{next_display, ErrorGuard};
pub use site::{EventDetail, Site, SiteEvent};
pub use timer::{Deferred, Scheduler, TimerId, TrackedScheduler};
