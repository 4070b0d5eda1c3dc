//! In-memory page and manual clock.
//!
//! [`FakeDom`] implements [`Dom`] over a plain element tree and records every
//! side effect the controllers request (scrolls, media calls, listeners,
//! watchers) so tests can assert on them. [`FakeScheduler`] only advances when
//! told to.
//!
//! Selector support is the subset the site uses: tag, `.class`, `#id`,
//! `[attr]`, `[attr="v"]`, `[attr^="v"]`, descendant combinators and
//! comma-separated lists.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use crate::dom::{Dom, ElementId, EventKind, Target, Watcher, WatcherOptions};
use crate::error::{SiteError, SiteResult};
use crate::fallback::next_display;
use crate::site::Site;
use crate::timer::{Deferred, Scheduler, TimerId};

// ============================================================================
// Scheduler
// ============================================================================

/// Scheduler driven by explicit [`advance`](Self::advance) calls.
#[derive(Debug, Default)]
pub struct FakeScheduler {
    now: Duration,
    next_id: u64,
    queue: Vec<(Duration, TimerId, Deferred)>,
}

impl FakeScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the clock forward and return the actions that became due,
    /// earliest first.
    pub fn advance(&mut self, by: Duration) -> Vec<(TimerId, Deferred)> {
        let target = self.now + by;
        let mut due: Vec<_> = Vec::new();
        self.queue.retain(|(at, id, action)| {
            if *at <= target {
                due.push((*at, *id, action.clone()));
                false
            } else {
                true
            }
        });
        due.sort_by_key(|(at, id, _)| (*at, *id));
        self.now = target;
        due.into_iter().map(|(_, id, action)| (id, action)).collect()
    }

    /// Actions still waiting to fire.
    pub fn queued(&self) -> Vec<Deferred> {
        self.queue.iter().map(|(_, _, action)| action.clone()).collect()
    }
}

impl Scheduler for FakeScheduler {
    fn schedule(&mut self, delay: Duration, action: Deferred) -> TimerId {
        self.next_id += 1;
        let id = TimerId::new(self.next_id);
        self.queue.push((self.now + delay, id, action));
        id
    }

    fn cancel(&mut self, id: TimerId) {
        self.queue.retain(|(_, queued, _)| *queued != id);
    }

    fn now(&self) -> Duration {
        self.now
    }
}

impl Site<FakeDom, FakeScheduler> {
    /// Advance the fake clock and run every action that became due.
    pub fn advance(&mut self, by: Duration) {
        let due = self.timers_mut().inner_mut().advance(by);
        for (id, action) in due {
            self.run_deferred(id, action);
        }
    }
}

// ============================================================================
// DOM
// ============================================================================

/// A scroll requested by a controller.
#[derive(Debug, Clone, PartialEq)]
pub enum ScrollCall {
    SmoothTo(f64),
    IntoViewCentered(ElementId),
}

/// A media call requested by a controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaCall {
    Play(ElementId),
    Pause(ElementId),
}

#[derive(Debug, Clone, Default)]
struct Node {
    tag: String,
    classes: Vec<String>,
    attributes: BTreeMap<String, String>,
    styles: BTreeMap<String, String>,
    text: String,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
    offset_top: f64,
    offset_height: f64,
    onclick: bool,
}

/// Element tree with recorded side effects.
#[derive(Debug)]
pub struct FakeDom {
    nodes: Vec<Node>,
    root: ElementId,
    body: ElementId,
    pub viewport_width: f64,
    pub scroll_top: f64,
    media_matches: BTreeSet<String>,
    listeners: Vec<(Target, EventKind)>,
    observed: BTreeSet<(Watcher, ElementId)>,
    watcher_options: BTreeMap<Watcher, WatcherOptions>,
    scrolls: Vec<ScrollCall>,
    media: Vec<MediaCall>,
    attribute_writes: Vec<(ElementId, String)>,
    fallback_toggle: Option<(ElementId, ElementId)>,
}

impl Default for FakeDom {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeDom {
    /// Empty `<html><body></body></html>` on a 1024px wide viewport.
    pub fn new() -> Self {
        let mut dom = Self {
            nodes: Vec::new(),
            root: ElementId::new(0),
            body: ElementId::new(0),
            viewport_width: 1024.0,
            scroll_top: 0.0,
            media_matches: BTreeSet::new(),
            listeners: Vec::new(),
            observed: BTreeSet::new(),
            watcher_options: BTreeMap::new(),
            scrolls: Vec::new(),
            media: Vec::new(),
            attribute_writes: Vec::new(),
            fallback_toggle: None,
        };
        dom.root = dom.alloc("html");
        dom.body = dom.append(dom.root, "body", &[]);
        dom
    }

    fn alloc(&mut self, tag: &str) -> ElementId {
        let id = ElementId::new(self.nodes.len());
        self.nodes.push(Node {
            tag: tag.to_string(),
            ..Node::default()
        });
        id
    }

    fn node(&self, el: ElementId) -> Option<&Node> {
        self.nodes.get(el.raw())
    }

    fn node_mut(&mut self, el: ElementId) -> SiteResult<&mut Node> {
        self.nodes
            .get_mut(el.raw())
            .ok_or(SiteError::UnknownElement(el))
    }

    /// Append a new element under `parent`.
    pub fn append(&mut self, parent: ElementId, tag: &str, classes: &[&str]) -> ElementId {
        let id = self.alloc(tag);
        self.nodes[id.raw()].classes = classes.iter().map(|c| c.to_string()).collect();
        self.nodes[id.raw()].parent = Some(parent);
        self.nodes[parent.raw()].children.push(id);
        id
    }

    /// Set an attribute without recording it as a controller write.
    pub fn seed_attribute(&mut self, el: ElementId, name: &str, value: &str) {
        self.nodes[el.raw()]
            .attributes
            .insert(name.to_string(), value.to_string());
    }

    pub fn set_layout(&mut self, el: ElementId, offset_top: f64, offset_height: f64) {
        let node = &mut self.nodes[el.raw()];
        node.offset_top = offset_top;
        node.offset_height = offset_height;
    }

    /// Mark an element as already having a direct click handler.
    pub fn set_onclick(&mut self, el: ElementId) {
        self.nodes[el.raw()].onclick = true;
    }

    /// Remove an element (and its subtree) from the document.
    pub fn detach(&mut self, el: ElementId) {
        if let Some(parent) = self.nodes[el.raw()].parent.take() {
            self.nodes[parent.raw()].children.retain(|c| *c != el);
        }
    }

    /// Make `matches_media(query)` return true.
    pub fn prefer_media(&mut self, query: &str) {
        self.media_matches.insert(query.to_string());
    }

    pub fn text(&self, el: ElementId) -> &str {
        self.node(el).map(|n| n.text.as_str()).unwrap_or_default()
    }

    pub fn tag(&self, el: ElementId) -> &str {
        self.node(el).map(|n| n.tag.as_str()).unwrap_or_default()
    }

    pub fn children(&self, el: ElementId) -> &[ElementId] {
        self.node(el).map(|n| n.children.as_slice()).unwrap_or_default()
    }

    pub fn body_id(&self) -> ElementId {
        self.body
    }

    pub fn is_listening(&self, target: Target, kind: EventKind) -> bool {
        self.listeners.contains(&(target, kind))
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_observed(&self, watcher: Watcher, el: ElementId) -> bool {
        self.observed.contains(&(watcher, el))
    }

    pub fn watcher_options(&self, watcher: Watcher) -> Option<&WatcherOptions> {
        self.watcher_options.get(&watcher)
    }

    pub fn scroll_calls(&self) -> &[ScrollCall] {
        &self.scrolls
    }

    pub fn media_calls(&self) -> &[MediaCall] {
        &self.media
    }

    pub fn clear_media_calls(&mut self) {
        self.media.clear();
    }

    /// Number of times a controller wrote `name` on `el`.
    pub fn attribute_writes(&self, el: ElementId, name: &str) -> usize {
        self.attribute_writes
            .iter()
            .filter(|(id, attr)| *id == el && attr == name)
            .count()
    }

    pub fn fallback_toggle(&self) -> Option<(ElementId, ElementId)> {
        self.fallback_toggle
    }

    /// Simulate a click on the fallback toggle. Returns false if none is bound.
    pub fn click_fallback_toggle(&mut self) -> bool {
        let Some((_, menu)) = self.fallback_toggle else {
            return false;
        };
        let next = next_display(&self.style(menu, "display"));
        self.nodes[menu.raw()]
            .styles
            .insert("display".to_string(), next.to_string());
        true
    }

    fn descendants(&self, scope: ElementId, out: &mut Vec<ElementId>) {
        for child in self.children(scope) {
            out.push(*child);
            self.descendants(*child, out);
        }
    }

    fn matches(&self, el: ElementId, selector: &str) -> bool {
        selector
            .split(',')
            .map(str::trim)
            .filter(|alt| !alt.is_empty())
            .any(|alt| self.matches_complex(el, alt))
    }

    fn matches_complex(&self, el: ElementId, selector: &str) -> bool {
        let parts: Vec<&str> = selector.split_whitespace().collect();
        let Some((last, ancestors)) = parts.split_last() else {
            return false;
        };
        if !self.matches_compound(el, last) {
            return false;
        }
        let mut cursor = self.node(el).and_then(|n| n.parent);
        for part in ancestors.iter().rev() {
            loop {
                match cursor {
                    Some(ancestor) if self.matches_compound(ancestor, part) => {
                        cursor = self.node(ancestor).and_then(|n| n.parent);
                        break;
                    }
                    Some(ancestor) => cursor = self.node(ancestor).and_then(|n| n.parent),
                    None => return false,
                }
            }
        }
        true
    }

    fn matches_compound(&self, el: ElementId, compound: &str) -> bool {
        let Some(node) = self.node(el) else {
            return false;
        };
        let mut rest = compound;

        let tag_len = rest
            .find(|c: char| matches!(c, '.' | '#' | '['))
            .unwrap_or(rest.len());
        let tag = &rest[..tag_len];
        if !tag.is_empty() && tag != "*" && !tag.eq_ignore_ascii_case(&node.tag) {
            return false;
        }
        rest = &rest[tag_len..];

        while let Some(first) = rest.chars().next() {
            match first {
                '.' | '#' => {
                    let body = &rest[1..];
                    let end = body
                        .find(|c: char| matches!(c, '.' | '#' | '['))
                        .unwrap_or(body.len());
                    let name = &body[..end];
                    let ok = if first == '.' {
                        node.classes.iter().any(|c| c == name)
                    } else {
                        node.attributes.get("id").map(String::as_str) == Some(name)
                    };
                    if !ok {
                        return false;
                    }
                    rest = &body[end..];
                }
                '[' => {
                    let Some(close) = rest.find(']') else {
                        return false;
                    };
                    if !attribute_matches(node, &rest[1..close]) {
                        return false;
                    }
                    rest = &rest[close + 1..];
                }
                _ => return false,
            }
        }
        true
    }
}

fn attribute_matches(node: &Node, expr: &str) -> bool {
    let unquote = |v: &str| v.trim().trim_matches(|c| c == '"' || c == '\'').to_string();
    if let Some((name, value)) = expr.split_once("^=") {
        let expected = unquote(value);
        node.attributes
            .get(name.trim())
            .is_some_and(|v| v.starts_with(&expected))
    } else if let Some((name, value)) = expr.split_once('=') {
        node.attributes.get(name.trim()) == Some(&unquote(value))
    } else {
        node.attributes.contains_key(expr.trim())
    }
}

impl Dom for FakeDom {
    fn query(&mut self, selector: &str) -> SiteResult<Option<ElementId>> {
        Ok(self.query_all(selector)?.into_iter().next())
    }

    fn query_all(&mut self, selector: &str) -> SiteResult<Vec<ElementId>> {
        let mut all = Vec::new();
        self.descendants(self.root, &mut all);
        Ok(all.into_iter().filter(|el| self.matches(*el, selector)).collect())
    }

    fn query_within(&mut self, scope: ElementId, selector: &str) -> SiteResult<Option<ElementId>> {
        let mut all = Vec::new();
        self.descendants(scope, &mut all);
        Ok(all.into_iter().find(|el| self.matches(*el, selector)))
    }

    fn body(&mut self) -> SiteResult<ElementId> {
        Ok(self.body)
    }

    fn contains(&self, ancestor: ElementId, node: ElementId) -> bool {
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.node(current).and_then(|n| n.parent);
        }
        false
    }

    fn is_connected(&self, el: ElementId) -> bool {
        self.contains(self.root, el)
    }

    fn has_class(&self, el: ElementId, class: &str) -> bool {
        self.node(el).is_some_and(|n| n.classes.iter().any(|c| c == class))
    }

    fn add_class(&mut self, el: ElementId, class: &str) -> SiteResult<()> {
        let node = self.node_mut(el)?;
        if !node.classes.iter().any(|c| c == class) {
            node.classes.push(class.to_string());
        }
        Ok(())
    }

    fn remove_class(&mut self, el: ElementId, class: &str) -> SiteResult<()> {
        self.node_mut(el)?.classes.retain(|c| c != class);
        Ok(())
    }

    fn toggle_class(&mut self, el: ElementId, class: &str) -> SiteResult<bool> {
        if self.has_class(el, class) {
            self.remove_class(el, class)?;
            Ok(false)
        } else {
            self.add_class(el, class)?;
            Ok(true)
        }
    }

    fn style(&self, el: ElementId, property: &str) -> String {
        self.node(el)
            .and_then(|n| n.styles.get(property).cloned())
            .unwrap_or_default()
    }

    fn set_style(&mut self, el: ElementId, property: &str, value: &str) -> SiteResult<()> {
        let styles = &mut self.node_mut(el)?.styles;
        if value.is_empty() {
            styles.remove(property);
        } else {
            styles.insert(property.to_string(), value.to_string());
        }
        Ok(())
    }

    fn attribute(&self, el: ElementId, name: &str) -> Option<String> {
        self.node(el).and_then(|n| n.attributes.get(name).cloned())
    }

    fn set_attribute(&mut self, el: ElementId, name: &str, value: &str) -> SiteResult<()> {
        self.node_mut(el)?
            .attributes
            .insert(name.to_string(), value.to_string());
        self.attribute_writes.push((el, name.to_string()));
        Ok(())
    }

    fn set_text(&mut self, el: ElementId, text: &str) -> SiteResult<()> {
        self.node_mut(el)?.text = text.to_string();
        Ok(())
    }

    fn create_element(&mut self, tag: &str) -> SiteResult<ElementId> {
        Ok(self.alloc(tag))
    }

    fn prepend_child(&mut self, parent: ElementId, child: ElementId) -> SiteResult<()> {
        self.node_mut(parent)?;
        self.detach(child);
        self.node_mut(child)?.parent = Some(parent);
        self.nodes[parent.raw()].children.insert(0, child);
        Ok(())
    }

    fn offset_top(&self, el: ElementId) -> f64 {
        self.node(el).map(|n| n.offset_top).unwrap_or_default()
    }

    fn offset_height(&self, el: ElementId) -> f64 {
        self.node(el).map(|n| n.offset_height).unwrap_or_default()
    }

    fn viewport_width(&self) -> f64 {
        self.viewport_width
    }

    fn scroll_top(&self) -> f64 {
        self.scroll_top
    }

    fn smooth_scroll_to(&mut self, top: f64) -> SiteResult<()> {
        self.scrolls.push(ScrollCall::SmoothTo(top));
        Ok(())
    }

    fn scroll_into_view_centered(&mut self, el: ElementId) -> SiteResult<()> {
        self.node_mut(el)?;
        self.scrolls.push(ScrollCall::IntoViewCentered(el));
        Ok(())
    }

    fn play(&mut self, el: ElementId) -> SiteResult<()> {
        self.media.push(MediaCall::Play(el));
        Ok(())
    }

    fn pause(&mut self, el: ElementId) -> SiteResult<()> {
        self.media.push(MediaCall::Pause(el));
        Ok(())
    }

    fn matches_media(&self, query: &str) -> bool {
        self.media_matches.contains(query)
    }

    fn listen(&mut self, target: Target, kind: EventKind) -> SiteResult<()> {
        self.listeners.push((target, kind));
        Ok(())
    }

    fn observe(&mut self, watcher: Watcher, options: &WatcherOptions, el: ElementId) -> SiteResult<()> {
        self.watcher_options
            .entry(watcher)
            .or_insert_with(|| options.clone());
        self.observed.insert((watcher, el));
        Ok(())
    }

    fn unobserve(&mut self, watcher: Watcher, el: ElementId) -> SiteResult<()> {
        self.observed.remove(&(watcher, el));
        Ok(())
    }

    fn has_click_handler(&self, el: ElementId) -> bool {
        self.node(el).is_some_and(|n| n.onclick)
            || self.is_listening(Target::Element(el), EventKind::Click)
            || self.fallback_toggle.is_some_and(|(toggle, _)| toggle == el)
    }

    fn install_fallback_toggle(&mut self, toggle: ElementId, menu: ElementId) -> SiteResult<()> {
        self.node_mut(toggle)?;
        self.node_mut(menu)?;
        self.fallback_toggle = Some((toggle, menu));
        Ok(())
    }
}

// ============================================================================
// Sample page
// ============================================================================

/// Handles into the page built by [`FakeDom::sample_page`].
#[derive(Debug, Clone)]
pub struct SamplePage {
    pub navbar: ElementId,
    pub nav_toggle: ElementId,
    pub nav_links: ElementId,
    /// `#about`, `#rituals`, `#contact` links inside the menu.
    pub nav_anchors: Vec<ElementId>,
    pub video_container: ElementId,
    pub video: ElementId,
    /// `#about`, `#rituals`, `#contact`.
    pub sections: Vec<ElementId>,
    pub intro: ElementId,
    pub stat_cards: Vec<ElementId>,
    pub cards: Vec<ElementId>,
    pub details: Vec<ElementId>,
    pub info_card: ElementId,
    pub button: ElementId,
    pub images: Vec<ElementId>,
    /// Link whose fragment names no element.
    pub dangling_anchor: ElementId,
}

impl FakeDom {
    /// A temple page with every structure the controllers look for.
    pub fn sample_page() -> (Self, SamplePage) {
        let mut dom = FakeDom::new();
        let body = dom.body;

        let navbar = dom.append(body, "nav", &["navbar"]);
        dom.set_layout(navbar, 0.0, 70.0);
        let nav_toggle = dom.append(navbar, "button", &["nav-toggle"]);
        dom.nodes[nav_toggle.raw()].text = "☰".to_string();
        let nav_links = dom.append(navbar, "ul", &["nav-links"]);
        dom.seed_attribute(nav_links, "id", "nav-links");
        let nav_anchors = ["#about", "#rituals", "#contact"]
            .iter()
            .map(|href| {
                let a = dom.append(nav_links, "a", &[]);
                dom.seed_attribute(a, "href", href);
                a
            })
            .collect();

        let video_container = dom.append(body, "div", &["video-background"]);
        let video = dom.append(video_container, "video", &[]);

        let mut sections = Vec::new();
        for (name, top) in [("about", 600.0), ("rituals", 1400.0), ("contact", 2600.0)] {
            let section = dom.append(body, "section", &[]);
            dom.seed_attribute(section, "id", name);
            dom.set_layout(section, top, 700.0);
            sections.push(section);
        }

        let intro = dom.append(sections[0], "p", &["fade-in"]);
        let stat_cards = (0..3)
            .map(|_| dom.append(sections[0], "div", &["stat-card"]))
            .collect();
        let button = dom.append(sections[0], "a", &["btn"]);
        dom.seed_attribute(button, "href", "#contact");

        let mut cards = Vec::new();
        let mut details = Vec::new();
        for i in 0..3 {
            let card = dom.append(sections[1], "div", &["ritual-card"]);
            dom.set_layout(card, 1450.0 + 200.0 * i as f64, 180.0);
            let title = dom.append(card, "h3", &[]);
            dom.nodes[title.raw()].text = format!("Ritual {}", i + 1);
            details.push(dom.append(card, "div", &["ritual-details"]));
            cards.push(card);
        }

        let info_card = dom.append(sections[2], "div", &["info-card", "fade-in"]);
        let images = (0..2)
            .map(|i| {
                let img = dom.append(sections[2], "img", &[]);
                dom.seed_attribute(img, "loading", "lazy");
                dom.seed_attribute(img, "src", &format!("/images/temple-{}.jpg", i));
                img
            })
            .collect();
        let dangling_anchor = dom.append(sections[2], "a", &[]);
        dom.seed_attribute(dangling_anchor, "href", "#missing");

        let page = SamplePage {
            navbar,
            nav_toggle,
            nav_links,
            nav_anchors,
            video_container,
            video,
            sections,
            intro,
            stat_cards,
            cards,
            details,
            info_card,
            button,
            images,
            dangling_anchor,
        };
        (dom, page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_subset() {
        let (mut dom, page) = FakeDom::sample_page();

        assert_eq!(dom.query(".navbar").unwrap(), Some(page.navbar));
        assert_eq!(dom.query("#nav-links").unwrap(), Some(page.nav_links));
        assert_eq!(dom.query(".video-background video").unwrap(), Some(page.video));
        assert_eq!(dom.query_all("img[loading=\"lazy\"]").unwrap(), page.images);
        assert_eq!(dom.query_all(".ritual-card").unwrap(), page.cards);
        assert_eq!(dom.query_all(".fade-in").unwrap(), vec![page.intro, page.info_card]);

        let anchors = dom.query_all("a[href^=\"#\"]").unwrap();
        assert_eq!(anchors.len(), 5);
        assert!(anchors.contains(&page.button));

        let touch = dom
            .query_all(".ritual-card, .stat-card, .info-card, .btn")
            .unwrap();
        assert_eq!(touch.len(), 3 + 3 + 1 + 1);
        assert_eq!(dom.query(".missing").unwrap(), None);
    }

    #[test]
    fn test_query_within_and_contains() {
        let (mut dom, page) = FakeDom::sample_page();
        assert_eq!(
            dom.query_within(page.cards[1], ".ritual-details").unwrap(),
            Some(page.details[1])
        );
        assert!(dom.contains(page.navbar, page.nav_anchors[0]));
        assert!(dom.contains(page.navbar, page.navbar));
        assert!(!dom.contains(page.navbar, page.cards[0]));
    }

    #[test]
    fn test_detach_disconnects_subtree() {
        let (mut dom, page) = FakeDom::sample_page();
        dom.detach(page.cards[0]);
        assert!(!dom.is_connected(page.cards[0]));
        assert!(!dom.is_connected(page.details[0]));
        assert!(dom.is_connected(page.cards[1]));
    }

    #[test]
    fn test_fake_scheduler_orders_due_actions() {
        let mut timers = FakeScheduler::new();
        let late = timers.schedule(Duration::from_millis(30), Deferred::ResizeSettled);
        let early = timers.schedule(Duration::from_millis(10), Deferred::ResizeSettled);

        let fired: Vec<_> = timers
            .advance(Duration::from_millis(50))
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        assert_eq!(fired, vec![early, late]);
        assert_eq!(timers.now(), Duration::from_millis(50));
    }
}
