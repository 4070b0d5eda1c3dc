//! Mobile navigation menu.
//!
//! The open/closed state lives on the page itself as the `active` class of the
//! menu-links container; the controller only remembers where the pieces are.

use tracing::debug;

use crate::config::SiteConfig;
use crate::dom::{Dom, ElementId, EventKind, Target};
use crate::error::{SiteError, SiteResult};

/// Class marking the open menu.
pub const OPEN_CLASS: &str = "active";
/// Toggle glyph while the menu is closed.
pub const MENU_GLYPH: &str = "☰";
/// Toggle glyph while the menu is open.
pub const CLOSE_GLYPH: &str = "✕";

#[derive(Debug, Clone)]
pub struct NavigationController {
    navbar: ElementId,
    toggle: ElementId,
    menu: ElementId,
    body: ElementId,
}

impl NavigationController {
    /// Locate the navbar, its toggle and the menu, and bind the toggle click,
    /// the outside-click and the resize listeners.
    pub fn mount(dom: &mut dyn Dom, config: &SiteConfig) -> SiteResult<Self> {
        let selectors = &config.selectors;
        let navbar = require(dom, &selectors.navbar)?;
        let toggle = require(dom, &selectors.nav_toggle)?;
        let menu = require(dom, &selectors.nav_links)?;
        let body = dom.body()?;

        dom.listen(Target::Element(toggle), EventKind::Click)?;
        dom.listen(Target::Document, EventKind::Click)?;
        dom.listen(Target::Window, EventKind::Resize)?;

        Ok(Self {
            navbar,
            toggle,
            menu,
            body,
        })
    }

    pub fn navbar(&self) -> ElementId {
        self.navbar
    }

    pub fn toggle_button(&self) -> ElementId {
        self.toggle
    }

    pub fn menu(&self) -> ElementId {
        self.menu
    }

    pub fn is_open(&self, dom: &dyn Dom) -> bool {
        dom.has_class(self.menu, OPEN_CLASS)
    }

    /// Flip the menu. Returns whether it is open afterwards.
    pub fn toggle(&self, dom: &mut dyn Dom) -> SiteResult<bool> {
        let open = dom.toggle_class(self.menu, OPEN_CLASS)?;
        if open {
            dom.set_text(self.toggle, CLOSE_GLYPH)?;
            dom.set_style(self.toggle, "transform", "rotate(180deg)")?;
            // keep the page from scrolling underneath the open menu
            dom.set_style(self.body, "overflow", "hidden")?;
        } else {
            self.apply_closed(dom)?;
        }
        debug!(open, "navigation toggled");
        Ok(open)
    }

    /// Force the closed state. Safe to call when already closed.
    pub fn close(&self, dom: &mut dyn Dom) -> SiteResult<()> {
        dom.remove_class(self.menu, OPEN_CLASS)?;
        self.apply_closed(dom)
    }

    fn apply_closed(&self, dom: &mut dyn Dom) -> SiteResult<()> {
        dom.set_text(self.toggle, MENU_GLYPH)?;
        dom.set_style(self.toggle, "transform", "rotate(0deg)")?;
        dom.set_style(self.body, "overflow", "auto")
    }

    /// Close the open menu when the click landed outside the navbar.
    pub fn on_document_click(&self, dom: &mut dyn Dom, target: Option<ElementId>) -> SiteResult<()> {
        let Some(target) = target else {
            return Ok(());
        };
        if !dom.contains(self.navbar, target) && self.is_open(dom) {
            debug!("click outside navbar, closing menu");
            self.close(dom)?;
        }
        Ok(())
    }

    /// Close the menu once the viewport is desktop sized.
    pub fn on_resize(&self, dom: &mut dyn Dom, config: &SiteConfig) -> SiteResult<()> {
        if !config.is_mobile(dom.viewport_width()) {
            self.close(dom)?;
        }
        Ok(())
    }
}

fn require(dom: &mut dyn Dom, selector: &str) -> SiteResult<ElementId> {
    dom.query(selector)?
        .ok_or_else(|| SiteError::ElementNotFound(selector.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::FakeDom;

    fn mounted() -> (FakeDom, crate::fake::SamplePage, NavigationController) {
        let (mut dom, page) = FakeDom::sample_page();
        let nav = NavigationController::mount(&mut dom, &SiteConfig::default()).unwrap();
        (dom, page, nav)
    }

    #[test]
    fn test_mount_binds_listeners() {
        let (dom, page, nav) = mounted();
        assert_eq!(nav.menu(), page.nav_links);
        assert!(dom.is_listening(Target::Element(page.nav_toggle), EventKind::Click));
        assert!(dom.is_listening(Target::Document, EventKind::Click));
        assert!(dom.is_listening(Target::Window, EventKind::Resize));
    }

    #[test]
    fn test_mount_requires_navbar() {
        let mut dom = FakeDom::new();
        let err = NavigationController::mount(&mut dom, &SiteConfig::default()).unwrap_err();
        assert!(matches!(err, SiteError::ElementNotFound(ref s) if s == ".navbar"));
    }

    #[test]
    fn test_toggle_open_then_closed() {
        let (mut dom, page, nav) = mounted();
        let body = dom.body_id();

        assert!(nav.toggle(&mut dom).unwrap());
        assert!(dom.has_class(page.nav_links, OPEN_CLASS));
        assert_eq!(dom.text(page.nav_toggle), CLOSE_GLYPH);
        assert_eq!(dom.style(page.nav_toggle, "transform"), "rotate(180deg)");
        assert_eq!(dom.style(body, "overflow"), "hidden");

        assert!(!nav.toggle(&mut dom).unwrap());
        assert!(!dom.has_class(page.nav_links, OPEN_CLASS));
        assert_eq!(dom.text(page.nav_toggle), MENU_GLYPH);
        assert_eq!(dom.style(page.nav_toggle, "transform"), "rotate(0deg)");
        assert_eq!(dom.style(body, "overflow"), "auto");
    }

    #[test]
    fn test_click_inside_navbar_keeps_menu_open() {
        let (mut dom, page, nav) = mounted();
        nav.toggle(&mut dom).unwrap();
        nav.on_document_click(&mut dom, Some(page.nav_toggle)).unwrap();
        assert!(nav.is_open(&dom));
        nav.on_document_click(&mut dom, None).unwrap();
        assert!(nav.is_open(&dom));
    }

    #[test]
    fn test_resize_below_breakpoint_keeps_menu_open() {
        let (mut dom, _page, nav) = mounted();
        nav.toggle(&mut dom).unwrap();
        dom.viewport_width = 767.0;
        nav.on_resize(&mut dom, &SiteConfig::default()).unwrap();
        assert!(nav.is_open(&dom));
        dom.viewport_width = 768.0;
        nav.on_resize(&mut dom, &SiteConfig::default()).unwrap();
        assert!(!nav.is_open(&dom));
    }
}
