//! The page controller: one instance, constructed once at startup, owning
//! every component's state and routing browser events to them.

use tracing::{debug, info, trace, warn};

use crate::accessibility::AccessibilityController;
use crate::anchors::AnchorScroller;
use crate::cards::ExpandableCardController;
use crate::config::SiteConfig;
use crate::dom::{Dom, ElementId, EventKind, EventResponse, Target, Watcher};
use crate::error::SiteResult;
use crate::lazy_images::LazyImageController;
use crate::media::MediaController;
use crate::navigation::NavigationController;
use crate::rate_limit::Debouncer;
use crate::reveal::RevealOnScrollController;
use crate::scroll::ScrollEffectController;
use crate::timer::{Deferred, Scheduler, TimerId, TrackedScheduler};
use crate::touch::TouchFeedbackController;

/// Body class telling the stylesheet the script is running.
pub const JS_LOADED_CLASS: &str = "js-loaded";
/// Body class for mobile visitors who asked for less motion.
pub const REDUCE_MOTION_CLASS: &str = "reduce-motion";
pub const REDUCED_MOTION_QUERY: &str = "(prefers-reduced-motion: reduce)";

/// A browser event, resolved to the element it concerns.
#[derive(Debug, Clone, PartialEq)]
pub enum SiteEvent {
    /// Any click reaching the document, with the element that was clicked.
    DocumentClick { target: Option<ElementId> },
    /// Click on an element the site bound a listener to.
    Click(ElementId),
    KeyDown { el: ElementId, key: String },
    Resize,
    Scroll,
    TouchStart(ElementId),
    TouchEnd(ElementId),
    Focus(ElementId),
    Blur(ElementId),
    MediaError(ElementId),
    Intersection {
        watcher: Watcher,
        el: ElementId,
        intersecting: bool,
    },
}

/// Extra data a host extracts from the native event.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventDetail {
    pub click_target: Option<ElementId>,
    pub key: Option<String>,
}

impl SiteEvent {
    /// Translate a fired listener (as bound through [`Dom::listen`]) into an
    /// event. Returns `None` for combinations the site never binds, including
    /// window script errors, which belong to the
    /// [`ErrorGuard`](crate::ErrorGuard).
    pub fn from_listener(target: Target, kind: EventKind, detail: EventDetail) -> Option<Self> {
        let event = match (target, kind) {
            (Target::Document, EventKind::Click) => SiteEvent::DocumentClick {
                target: detail.click_target,
            },
            (Target::Element(el), EventKind::Click) => SiteEvent::Click(el),
            (Target::Element(el), EventKind::KeyDown) => SiteEvent::KeyDown {
                el,
                key: detail.key.unwrap_or_default(),
            },
            (Target::Window, EventKind::Resize) => SiteEvent::Resize,
            (Target::Window, EventKind::Scroll) => SiteEvent::Scroll,
            (Target::Element(el), EventKind::TouchStart) => SiteEvent::TouchStart(el),
            (Target::Element(el), EventKind::TouchEnd) => SiteEvent::TouchEnd(el),
            (Target::Element(el), EventKind::Focus) => SiteEvent::Focus(el),
            (Target::Element(el), EventKind::Blur) => SiteEvent::Blur(el),
            (Target::Element(el), EventKind::MediaError) => SiteEvent::MediaError(el),
            _ => return None,
        };
        Some(event)
    }
}

pub struct Site<D, S> {
    dom: D,
    timers: TrackedScheduler<S>,
    config: SiteConfig,
    nav: NavigationController,
    cards: ExpandableCardController,
    anchors: AnchorScroller,
    scroll: ScrollEffectController,
    reveal: RevealOnScrollController,
    media: MediaController,
    lazy_images: LazyImageController,
    touch: TouchFeedbackController,
    a11y: AccessibilityController,
    resize_debounce: Option<Debouncer>,
}

impl<D: Dom, S: Scheduler> Site<D, S> {
    /// Wire every controller to the page.
    ///
    /// Fails only when the configuration is invalid or the navigation markup
    /// is missing; every other structure is optional.
    pub fn mount(mut dom: D, scheduler: S, config: SiteConfig) -> SiteResult<Self> {
        config.validate()?;
        let mut timers = TrackedScheduler::new(scheduler);

        let nav = NavigationController::mount(&mut dom, &config)?;
        let cards = ExpandableCardController::mount(&mut dom, &config)?;
        let anchors = AnchorScroller::mount(&mut dom, &config)?;
        let scroll = ScrollEffectController::mount(&mut dom, &config, nav.navbar())?;
        let reveal = RevealOnScrollController::mount(&mut dom, &config)?;
        let media = MediaController::mount(&mut dom, &mut timers, &config)?;
        let lazy_images = LazyImageController::mount(&mut dom, &config)?;
        let touch = TouchFeedbackController::mount(&mut dom, &config)?;
        let focusable = dom.query_all(&config.selectors.ritual_cards)?;
        let a11y = AccessibilityController::mount(&mut dom, &config, focusable)?;

        let body = dom.body()?;
        dom.add_class(body, JS_LOADED_CLASS)?;
        info!("🕉️ temple site loaded");
        if config.is_mobile(dom.viewport_width()) {
            info!("📱 mobile optimizations active");
            if dom.matches_media(REDUCED_MOTION_QUERY) {
                dom.add_class(body, REDUCE_MOTION_CLASS)?;
            }
        }

        let resize_debounce = config.timing.resize_debounce().map(Debouncer::new);

        Ok(Self {
            dom,
            timers,
            config,
            nav,
            cards,
            anchors,
            scroll,
            reveal,
            media,
            lazy_images,
            touch,
            a11y,
            resize_debounce,
        })
    }

    pub fn dom(&self) -> &D {
        &self.dom
    }

    pub fn dom_mut(&mut self) -> &mut D {
        &mut self.dom
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    pub fn timers(&self) -> &TrackedScheduler<S> {
        &self.timers
    }

    pub fn timers_mut(&mut self) -> &mut TrackedScheduler<S> {
        &mut self.timers
    }

    pub fn navigation(&self) -> &NavigationController {
        &self.nav
    }

    pub fn cards(&self) -> &ExpandableCardController {
        &self.cards
    }

    pub fn scroll(&self) -> &ScrollEffectController {
        &self.scroll
    }

    pub fn media(&self) -> &MediaController {
        &self.media
    }

    pub fn lazy_images(&self) -> &LazyImageController {
        &self.lazy_images
    }

    pub fn accessibility(&self) -> &AccessibilityController {
        &self.a11y
    }

    /// Handle one browser event. Failures are logged, never propagated.
    pub fn dispatch(&mut self, event: SiteEvent) -> EventResponse {
        trace!(?event, "dispatch");
        match self.handle(event) {
            Ok(response) => response,
            Err(err) => {
                warn!(%err, "event handler failed");
                EventResponse::Continue
            }
        }
    }

    fn handle(&mut self, event: SiteEvent) -> SiteResult<EventResponse> {
        match event {
            SiteEvent::DocumentClick { target } => {
                self.nav.on_document_click(&mut self.dom, target)?;
            }
            SiteEvent::Click(el) if el == self.nav.toggle_button() => {
                self.nav.toggle(&mut self.dom)?;
            }
            SiteEvent::Click(el) if self.cards.is_card(el) => {
                self.cards
                    .toggle(&mut self.dom, &mut self.timers, &self.config, el)?;
            }
            SiteEvent::Click(el) if self.anchors.is_anchor(el) => {
                return self
                    .anchors
                    .on_click(&mut self.dom, &self.nav, &self.config, el);
            }
            SiteEvent::Click(el) => debug!(%el, "click on unmanaged element"),
            SiteEvent::KeyDown { el, key } => {
                let card = self
                    .a11y
                    .activated_card(el, &key)
                    .filter(|card| self.cards.is_card(*card));
                if let Some(card) = card {
                    self.cards
                        .toggle(&mut self.dom, &mut self.timers, &self.config, card)?;
                    return Ok(EventResponse::PreventDefault);
                }
            }
            SiteEvent::Resize => match self.resize_debounce.as_mut() {
                Some(debounce) => debounce.call(&mut self.timers, Deferred::ResizeSettled),
                None => self.nav.on_resize(&mut self.dom, &self.config)?,
            },
            SiteEvent::Scroll => {
                self.scroll
                    .on_scroll(&mut self.dom, &mut self.timers, &self.config)?;
            }
            SiteEvent::TouchStart(el) => self.touch.on_touch_start(&mut self.dom, el)?,
            SiteEvent::TouchEnd(el) => self.touch.on_touch_end(&mut self.timers, &self.config, el),
            SiteEvent::Focus(el) => self.a11y.on_focus(&mut self.dom, el)?,
            SiteEvent::Blur(el) => self.a11y.on_blur(&mut self.dom, el)?,
            SiteEvent::MediaError(el) if self.media.is_video(el) => {
                self.media.on_error(&mut self.dom, &self.config)?;
            }
            SiteEvent::MediaError(el) => debug!(%el, "media error on unmanaged element"),
            SiteEvent::Intersection {
                watcher,
                el,
                intersecting,
            } => match watcher {
                Watcher::Reveal => self.reveal.on_intersection(&mut self.dom, el, intersecting)?,
                Watcher::Media => {
                    self.media
                        .on_intersection(&mut self.dom, &self.config, el, intersecting)?;
                }
                Watcher::LazyImages => {
                    self.lazy_images
                        .on_intersection(&mut self.dom, el, intersecting)?;
                }
            },
        }
        Ok(EventResponse::Continue)
    }

    /// Run an action whose timer fired. Cancelled timers are ignored.
    pub fn run_deferred(&mut self, id: TimerId, action: Deferred) {
        if !self.timers.complete(id) {
            trace!(?id, "stale timer");
            return;
        }
        let result = match action {
            Deferred::ScrollCardIntoView(card) => self.cards.scroll_into_view(&mut self.dom, card),
            Deferred::ResetTouch(el) => self.touch.reset(&mut self.dom, el),
            Deferred::BatteryPause(video) => {
                self.media.battery_pause(&mut self.dom, &self.config, video)
            }
            Deferred::ResizeSettled => {
                if let Some(debounce) = self.resize_debounce.as_mut() {
                    debounce.settle(id);
                }
                self.nav.on_resize(&mut self.dom, &self.config)
            }
            Deferred::ScrollSettled => {
                self.scroll
                    .on_settled(&mut self.dom, &self.timers, &self.config, id)
            }
        };
        if let Err(err) = result {
            warn!(%err, "deferred action failed");
        }
    }

    /// Cancel every pending timer.
    pub fn teardown(&mut self) {
        debug!(pending = self.timers.pending(), "tearing down site timers");
        self.timers.cancel_all();
    }
}
