//! `web-sys` implementation of the page abstraction.
//!
//! Elements are interned into a [`Registry`] shared by every [`WebDom`] on the
//! page, so the error guard and the site agree on element handles and on
//! which elements already carry a click listener.
//!
//! Only elements the controllers query or create are interned. A click on any
//! other element is reported as its nearest registered ancestor, or as the
//! document root when it has none, so the registry stays bounded.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use gloo::events::{EventListener, EventListenerOptions};
use temple_site_core::fallback::next_display;
use temple_site_core::{
    Dom, ElementId, EventDetail, EventKind, EventResponse, SiteError, SiteEvent, SiteResult,
    Target, Watcher, WatcherOptions,
};
use tracing::{debug, trace};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    Document, Element, ErrorEvent, Event, HtmlElement, HtmlMediaElement, IntersectionObserver,
    IntersectionObserverEntry, IntersectionObserverInit, KeyboardEvent, ScrollBehavior,
    ScrollIntoViewOptions, ScrollLogicalPosition, ScrollToOptions, Window,
};

/// Receives every event a [`WebDom`] listener or watcher reports.
pub type EventSink = Rc<dyn Fn(SiteEvent) -> EventResponse>;

/// Slot the host fills once the receiver of the events exists.
pub type SinkSlot = Rc<RefCell<Option<EventSink>>>;

/// Receives the message of every uncaught script error.
pub type ErrorSink = Rc<dyn Fn(String)>;

pub type ErrorSlot = Rc<RefCell<Option<ErrorSink>>>;

pub type SharedRegistry = Rc<RefCell<Registry>>;

/// Element handles for one document.
#[derive(Default)]
pub struct Registry {
    elements: Vec<Element>,
    click_bound: HashSet<ElementId>,
}

impl Registry {
    pub fn shared() -> SharedRegistry {
        Rc::new(RefCell::new(Self::default()))
    }

    /// Handle for `element`, issuing a new one the first time it is seen.
    pub fn intern(&mut self, element: Element) -> ElementId {
        if let Some(id) = self.lookup(&element) {
            return id;
        }
        self.elements.push(element);
        ElementId::new(self.elements.len() - 1)
    }

    /// Handle for `element` if it has one already.
    pub fn lookup(&self, element: &Element) -> Option<ElementId> {
        self.elements
            .iter()
            .position(|known| known.is_same_node(Some(&**element)))
            .map(ElementId::new)
    }

    /// Handle reported for a click on `target`. Never issues a handle for
    /// `target` itself unless it is the document `root`.
    pub fn resolve_click(&mut self, target: Element, root: Element) -> ElementId {
        let found = nearest_known(target, |el: &Element| el.parent_element(), |el| self.lookup(el));
        found.unwrap_or_else(|| self.intern(root))
    }

    pub fn get(&self, id: ElementId) -> Option<Element> {
        self.elements.get(id.raw()).cloned()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

struct Observer {
    observer: IntersectionObserver,
    _callback: Closure<dyn FnMut(js_sys::Array, IntersectionObserver)>,
}

pub struct WebDom {
    window: Window,
    document: Document,
    registry: SharedRegistry,
    sink: SinkSlot,
    errors: ErrorSlot,
    listeners: Vec<EventListener>,
    click_bound: Vec<ElementId>,
    observers: HashMap<Watcher, Observer>,
    autoplay_rejected: Closure<dyn FnMut(JsValue)>,
    fallback: Option<Closure<dyn FnMut()>>,
}

impl WebDom {
    pub fn new(registry: SharedRegistry) -> SiteResult<Self> {
        let window = web_sys::window().ok_or_else(|| SiteError::Dom("no window".into()))?;
        let document = window
            .document()
            .ok_or_else(|| SiteError::Dom("no document".into()))?;
        let autoplay_rejected = Closure::<dyn FnMut(JsValue)>::new(|err: JsValue| {
            debug!(?err, "video autoplay was rejected");
        });

        Ok(Self {
            window,
            document,
            registry,
            sink: Rc::new(RefCell::new(None)),
            errors: Rc::new(RefCell::new(None)),
            listeners: Vec::new(),
            click_bound: Vec::new(),
            observers: HashMap::new(),
            autoplay_rejected,
            fallback: None,
        })
    }

    pub fn sink_slot(&self) -> SinkSlot {
        self.sink.clone()
    }

    pub fn error_slot(&self) -> ErrorSlot {
        self.errors.clone()
    }

    fn element(&self, id: ElementId) -> SiteResult<Element> {
        self.registry
            .borrow()
            .get(id)
            .ok_or(SiteError::UnknownElement(id))
    }

    fn html(&self, id: ElementId) -> SiteResult<HtmlElement> {
        self.element(id)?
            .dyn_into::<HtmlElement>()
            .map_err(|_| SiteError::Dom(format!("{id} is not an HTML element")))
    }

    fn media(&self, id: ElementId) -> SiteResult<HtmlMediaElement> {
        self.element(id)?
            .dyn_into::<HtmlMediaElement>()
            .map_err(|_| SiteError::Dom(format!("{id} is not a media element")))
    }

    fn intern(&self, element: Element) -> ElementId {
        self.registry.borrow_mut().intern(element)
    }

    fn create_observer(&self, watcher: Watcher, options: &WatcherOptions) -> SiteResult<Observer> {
        let sink = self.sink.clone();
        let registry = self.registry.clone();
        let callback = Closure::<dyn FnMut(js_sys::Array, IntersectionObserver)>::new(
            move |entries: js_sys::Array, _observer: IntersectionObserver| {
                for entry in entries.iter() {
                    let Ok(entry) = entry.dyn_into::<IntersectionObserverEntry>() else {
                        continue;
                    };
                    let Some(el) = registry.borrow().lookup(&entry.target()) else {
                        continue;
                    };
                    deliver(
                        &sink,
                        SiteEvent::Intersection {
                            watcher,
                            el,
                            intersecting: entry.is_intersecting(),
                        },
                    );
                }
            },
        );

        let init = IntersectionObserverInit::new();
        init.set_threshold(&JsValue::from_f64(options.threshold));
        init.set_root_margin(&options.root_margin);
        let observer =
            IntersectionObserver::new_with_options(callback.as_ref().unchecked_ref(), &init)
                .map_err(js_error)?;

        Ok(Observer {
            observer,
            _callback: callback,
        })
    }
}

impl Drop for WebDom {
    fn drop(&mut self) {
        for observer in self.observers.values() {
            observer.observer.disconnect();
        }
        let mut registry = self.registry.borrow_mut();
        for el in &self.click_bound {
            registry.click_bound.remove(el);
        }
    }
}

/// Walk from `start` towards the root and return the first handle `lookup`
/// knows.
fn nearest_known<N>(
    start: N,
    parent: impl Fn(&N) -> Option<N>,
    lookup: impl Fn(&N) -> Option<ElementId>,
) -> Option<ElementId> {
    let mut node = Some(start);
    while let Some(current) = node {
        if let Some(id) = lookup(&current) {
            return Some(id);
        }
        node = parent(&current);
    }
    None
}

fn js_error(err: JsValue) -> SiteError {
    SiteError::Dom(format!("{err:?}"))
}

fn deliver(sink: &SinkSlot, event: SiteEvent) -> EventResponse {
    let handler = sink.borrow().clone();
    match handler {
        Some(handler) => handler(event),
        None => {
            trace!(?event, "no receiver yet");
            EventResponse::Continue
        }
    }
}

fn report(errors: &ErrorSlot, message: String) {
    let handler = errors.borrow().clone();
    match handler {
        Some(handler) => handler(message),
        None => trace!(%message, "no error receiver"),
    }
}

fn event_detail(
    kind: EventKind,
    event: &Event,
    registry: &SharedRegistry,
    document: &Document,
) -> EventDetail {
    let mut detail = EventDetail::default();
    match kind {
        EventKind::Click => {
            let target = event
                .target()
                .and_then(|target| target.dyn_into::<Element>().ok());
            if let (Some(target), Some(root)) = (target, document.document_element()) {
                detail.click_target = Some(registry.borrow_mut().resolve_click(target, root));
            }
        }
        EventKind::KeyDown => {
            detail.key = event.dyn_ref::<KeyboardEvent>().map(KeyboardEvent::key);
        }
        _ => {}
    }
    detail
}

impl Dom for WebDom {
    fn query(&mut self, selector: &str) -> SiteResult<Option<ElementId>> {
        let found = self.document.query_selector(selector).map_err(js_error)?;
        Ok(found.map(|element| self.intern(element)))
    }

    fn query_all(&mut self, selector: &str) -> SiteResult<Vec<ElementId>> {
        let list = self
            .document
            .query_selector_all(selector)
            .map_err(js_error)?;
        let mut found = Vec::with_capacity(list.length() as usize);
        for index in 0..list.length() {
            if let Some(element) = list.item(index).and_then(|n| n.dyn_into::<Element>().ok()) {
                found.push(self.intern(element));
            }
        }
        Ok(found)
    }

    fn query_within(&mut self, scope: ElementId, selector: &str) -> SiteResult<Option<ElementId>> {
        let found = self
            .element(scope)?
            .query_selector(selector)
            .map_err(js_error)?;
        Ok(found.map(|element| self.intern(element)))
    }

    fn body(&mut self) -> SiteResult<ElementId> {
        let body = self
            .document
            .body()
            .ok_or_else(|| SiteError::ElementNotFound("body".into()))?;
        Ok(self.intern(body.into()))
    }

    fn contains(&self, ancestor: ElementId, node: ElementId) -> bool {
        match (self.element(ancestor), self.element(node)) {
            (Ok(ancestor), Ok(node)) => ancestor.contains(Some(&*node)),
            _ => false,
        }
    }

    fn is_connected(&self, el: ElementId) -> bool {
        self.element(el).is_ok_and(|element| element.is_connected())
    }

    fn has_class(&self, el: ElementId, class: &str) -> bool {
        self.element(el)
            .is_ok_and(|element| element.class_list().contains(class))
    }

    fn add_class(&mut self, el: ElementId, class: &str) -> SiteResult<()> {
        self.element(el)?.class_list().add_1(class).map_err(js_error)
    }

    fn remove_class(&mut self, el: ElementId, class: &str) -> SiteResult<()> {
        self.element(el)?
            .class_list()
            .remove_1(class)
            .map_err(js_error)
    }

    fn toggle_class(&mut self, el: ElementId, class: &str) -> SiteResult<bool> {
        self.element(el)?
            .class_list()
            .toggle(class)
            .map_err(js_error)
    }

    fn style(&self, el: ElementId, property: &str) -> String {
        self.html(el)
            .ok()
            .and_then(|html| html.style().get_property_value(property).ok())
            .unwrap_or_default()
    }

    fn set_style(&mut self, el: ElementId, property: &str, value: &str) -> SiteResult<()> {
        let style = self.html(el)?.style();
        if value.is_empty() {
            style.remove_property(property).map_err(js_error)?;
            Ok(())
        } else {
            style.set_property(property, value).map_err(js_error)
        }
    }

    fn attribute(&self, el: ElementId, name: &str) -> Option<String> {
        self.element(el).ok()?.get_attribute(name)
    }

    fn set_attribute(&mut self, el: ElementId, name: &str, value: &str) -> SiteResult<()> {
        self.element(el)?
            .set_attribute(name, value)
            .map_err(js_error)
    }

    fn set_text(&mut self, el: ElementId, text: &str) -> SiteResult<()> {
        self.element(el)?.set_text_content(Some(text));
        Ok(())
    }

    fn create_element(&mut self, tag: &str) -> SiteResult<ElementId> {
        let element = self.document.create_element(tag).map_err(js_error)?;
        Ok(self.intern(element))
    }

    fn prepend_child(&mut self, parent: ElementId, child: ElementId) -> SiteResult<()> {
        let parent = self.element(parent)?;
        let child = self.element(child)?;
        parent
            .insert_before(&child, parent.first_child().as_ref())
            .map_err(js_error)?;
        Ok(())
    }

    fn offset_top(&self, el: ElementId) -> f64 {
        self.html(el)
            .map(|html| f64::from(html.offset_top()))
            .unwrap_or_default()
    }

    fn offset_height(&self, el: ElementId) -> f64 {
        self.html(el)
            .map(|html| f64::from(html.offset_height()))
            .unwrap_or_default()
    }

    fn viewport_width(&self) -> f64 {
        self.window
            .inner_width()
            .ok()
            .and_then(|width| width.as_f64())
            .unwrap_or_default()
    }

    fn scroll_top(&self) -> f64 {
        self.window.scroll_y().unwrap_or_else(|_| {
            self.document
                .document_element()
                .map(|root| f64::from(root.scroll_top()))
                .unwrap_or_default()
        })
    }

    fn smooth_scroll_to(&mut self, top: f64) -> SiteResult<()> {
        let options = ScrollToOptions::new();
        options.set_top(top);
        options.set_behavior(ScrollBehavior::Smooth);
        self.window.scroll_to_with_scroll_to_options(&options);
        Ok(())
    }

    fn scroll_into_view_centered(&mut self, el: ElementId) -> SiteResult<()> {
        let options = ScrollIntoViewOptions::new();
        options.set_behavior(ScrollBehavior::Smooth);
        options.set_block(ScrollLogicalPosition::Center);
        self.element(el)?
            .scroll_into_view_with_scroll_into_view_options(&options);
        Ok(())
    }

    fn play(&mut self, el: ElementId) -> SiteResult<()> {
        let promise = self.media(el)?.play().map_err(js_error)?;
        let _ = promise.catch(&self.autoplay_rejected);
        Ok(())
    }

    fn pause(&mut self, el: ElementId) -> SiteResult<()> {
        self.media(el)?.pause().map_err(js_error)
    }

    fn matches_media(&self, query: &str) -> bool {
        self.window
            .match_media(query)
            .ok()
            .flatten()
            .is_some_and(|list| list.matches())
    }

    fn listen(&mut self, target: Target, kind: EventKind) -> SiteResult<()> {
        let event_target: web_sys::EventTarget = match target {
            Target::Window => self.window.clone().into(),
            Target::Document => self.document.clone().into(),
            Target::Element(id) => self.element(id)?.into(),
        };
        let options = if kind.passive() {
            EventListenerOptions::default()
        } else {
            EventListenerOptions::enable_prevent_default()
        };

        let sink = self.sink.clone();
        let errors = self.errors.clone();
        let registry = self.registry.clone();
        let document = self.document.clone();
        let listener = EventListener::new_with_options(
            &event_target,
            kind.name(),
            options,
            move |event| {
                if kind == EventKind::ScriptError {
                    let message = event
                        .dyn_ref::<ErrorEvent>()
                        .map(ErrorEvent::message)
                        .unwrap_or_default();
                    report(&errors, message);
                    return;
                }
                let detail = event_detail(kind, event, &registry, &document);
                let Some(site_event) = SiteEvent::from_listener(target, kind, detail) else {
                    return;
                };
                if deliver(&sink, site_event) == EventResponse::PreventDefault {
                    event.prevent_default();
                }
            },
        );
        self.listeners.push(listener);

        if let (Target::Element(id), EventKind::Click) = (target, kind) {
            self.registry.borrow_mut().click_bound.insert(id);
            self.click_bound.push(id);
        }
        trace!(?target, event = kind.name(), "listening");
        Ok(())
    }

    fn observe(&mut self, watcher: Watcher, options: &WatcherOptions, el: ElementId) -> SiteResult<()> {
        let element = self.element(el)?;
        if !self.observers.contains_key(&watcher) {
            let observer = self.create_observer(watcher, options)?;
            self.observers.insert(watcher, observer);
        }
        if let Some(observer) = self.observers.get(&watcher) {
            observer.observer.observe(&element);
        }
        Ok(())
    }

    fn unobserve(&mut self, watcher: Watcher, el: ElementId) -> SiteResult<()> {
        let element = self.element(el)?;
        if let Some(observer) = self.observers.get(&watcher) {
            observer.observer.unobserve(&element);
        }
        Ok(())
    }

    fn has_click_handler(&self, el: ElementId) -> bool {
        let inline = self.html(el).is_ok_and(|html| html.onclick().is_some());
        inline || self.registry.borrow().click_bound.contains(&el)
    }

    fn install_fallback_toggle(&mut self, toggle: ElementId, menu: ElementId) -> SiteResult<()> {
        let toggle = self.html(toggle)?;
        let menu = self.html(menu)?;
        let handler = Closure::<dyn FnMut()>::new(move || {
            let style = menu.style();
            let current = style.get_property_value("display").unwrap_or_default();
            let _ = style.set_property("display", next_display(&current));
        });
        toggle.set_onclick(Some(handler.as_ref().unchecked_ref()));
        self.fallback = Some(handler);
        Ok(())
    }
}
