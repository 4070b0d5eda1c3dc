//! Page abstraction consumed by the controllers.
//!
//! The controllers never touch a browser API directly. They address elements
//! through opaque [`ElementId`] handles issued by a [`Dom`] implementation and
//! ask the host to bind listeners and visibility watchers, which later come
//! back to the [`Site`](crate::Site) as [`SiteEvent`](crate::SiteEvent)s.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::SiteResult;

/// Opaque handle to one element of the page.
///
/// Two handles compare equal exactly when they denote the same element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementId(usize);

impl ElementId {
    pub const fn new(raw: usize) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> usize {
        self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Where a listener is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Target {
    Window,
    Document,
    Element(ElementId),
}

/// Browser events the controllers react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    Click,
    Resize,
    Scroll,
    KeyDown,
    TouchStart,
    TouchEnd,
    Focus,
    Blur,
    /// `error` fired by a media element.
    MediaError,
    /// `error` fired on the window for an uncaught script error.
    ScriptError,
}

impl EventKind {
    /// DOM event type name.
    pub fn name(self) -> &'static str {
        match self {
            EventKind::Click => "click",
            EventKind::Resize => "resize",
            EventKind::Scroll => "scroll",
            EventKind::KeyDown => "keydown",
            EventKind::TouchStart => "touchstart",
            EventKind::TouchEnd => "touchend",
            EventKind::Focus => "focus",
            EventKind::Blur => "blur",
            EventKind::MediaError | EventKind::ScriptError => "error",
        }
    }

    /// Passive listeners never call `preventDefault` and never block scrolling.
    pub fn passive(self) -> bool {
        matches!(
            self,
            EventKind::Scroll | EventKind::TouchStart | EventKind::TouchEnd
        )
    }
}

/// The visibility watchers the page uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Watcher {
    Reveal,
    Media,
    LazyImages,
}

/// Options for a visibility watcher, as understood by `IntersectionObserver`.
#[derive(Debug, Clone, PartialEq)]
pub struct WatcherOptions {
    pub threshold: f64,
    pub root_margin: String,
}

impl Default for WatcherOptions {
    fn default() -> Self {
        Self {
            threshold: 0.0,
            root_margin: "0px".to_string(),
        }
    }
}

/// What the host should do with the browser event after dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventResponse {
    #[default]
    Continue,
    PreventDefault,
}

/// Operations the controllers need from the page.
///
/// Style property names are CSS names (`box-shadow`, not `boxShadow`).
pub trait Dom {
    /// First element matching `selector`.
    fn query(&mut self, selector: &str) -> SiteResult<Option<ElementId>>;

    /// All elements matching `selector`, in document order.
    fn query_all(&mut self, selector: &str) -> SiteResult<Vec<ElementId>>;

    /// First descendant of `scope` matching `selector`.
    fn query_within(&mut self, scope: ElementId, selector: &str) -> SiteResult<Option<ElementId>>;

    fn body(&mut self) -> SiteResult<ElementId>;

    /// Inclusive descendant test: an element contains itself.
    fn contains(&self, ancestor: ElementId, node: ElementId) -> bool;

    /// False once the element has been removed from the document.
    fn is_connected(&self, el: ElementId) -> bool;

    fn has_class(&self, el: ElementId, class: &str) -> bool;
    fn add_class(&mut self, el: ElementId, class: &str) -> SiteResult<()>;
    fn remove_class(&mut self, el: ElementId, class: &str) -> SiteResult<()>;
    /// Returns whether the class is present afterwards.
    fn toggle_class(&mut self, el: ElementId, class: &str) -> SiteResult<bool>;

    /// Inline style value, empty when unset.
    fn style(&self, el: ElementId, property: &str) -> String;
    /// Setting an empty value clears the inline property.
    fn set_style(&mut self, el: ElementId, property: &str, value: &str) -> SiteResult<()>;

    fn attribute(&self, el: ElementId, name: &str) -> Option<String>;
    fn set_attribute(&mut self, el: ElementId, name: &str, value: &str) -> SiteResult<()>;
    fn set_text(&mut self, el: ElementId, text: &str) -> SiteResult<()>;

    fn create_element(&mut self, tag: &str) -> SiteResult<ElementId>;
    /// Insert `child` before the first child of `parent`.
    fn prepend_child(&mut self, parent: ElementId, child: ElementId) -> SiteResult<()>;

    fn offset_top(&self, el: ElementId) -> f64;
    fn offset_height(&self, el: ElementId) -> f64;
    fn viewport_width(&self) -> f64;
    fn scroll_top(&self) -> f64;

    fn smooth_scroll_to(&mut self, top: f64) -> SiteResult<()>;
    fn scroll_into_view_centered(&mut self, el: ElementId) -> SiteResult<()>;

    /// Start playback. A rejected autoplay is handled by the host.
    fn play(&mut self, el: ElementId) -> SiteResult<()>;
    fn pause(&mut self, el: ElementId) -> SiteResult<()>;

    fn matches_media(&self, query: &str) -> bool;

    /// Bind a listener that reports back as a [`SiteEvent`](crate::SiteEvent).
    fn listen(&mut self, target: Target, kind: EventKind) -> SiteResult<()>;

    fn observe(&mut self, watcher: Watcher, options: &WatcherOptions, el: ElementId) -> SiteResult<()>;
    fn unobserve(&mut self, watcher: Watcher, el: ElementId) -> SiteResult<()>;

    /// Whether a direct click handler (`onclick`) is bound to the element.
    fn has_click_handler(&self, el: ElementId) -> bool;

    /// Bind a click handler on `toggle` that flips `menu`'s inline `display`
    /// with [`next_display`](crate::fallback::next_display), independently of
    /// the site state.
    fn install_fallback_toggle(&mut self, toggle: ElementId, menu: ElementId) -> SiteResult<()>;
}
