//! Smooth scrolling for in-page anchor links.

use tracing::debug;

use crate::config::SiteConfig;
use crate::dom::{Dom, ElementId, EventKind, EventResponse, Target};
use crate::error::{SiteError, SiteResult};
use crate::navigation::NavigationController;

#[derive(Debug, Clone, Default)]
pub struct AnchorScroller {
    anchors: Vec<(ElementId, String)>,
}

impl AnchorScroller {
    pub fn mount(dom: &mut dyn Dom, config: &SiteConfig) -> SiteResult<Self> {
        let mut anchors = Vec::new();
        for anchor in dom.query_all(&config.selectors.anchors)? {
            let href = dom.attribute(anchor, "href").unwrap_or_default();
            dom.listen(Target::Element(anchor), EventKind::Click)?;
            anchors.push((anchor, href));
        }
        Ok(Self { anchors })
    }

    pub fn is_anchor(&self, el: ElementId) -> bool {
        self.anchors.iter().any(|(a, _)| *a == el)
    }

    /// Replace the native jump with a smooth scroll that leaves room for the
    /// fixed navbar, closing the mobile menu on the way. A link whose target
    /// does not exist only has its default suppressed.
    pub fn on_click(
        &self,
        dom: &mut dyn Dom,
        nav: &NavigationController,
        config: &SiteConfig,
        anchor: ElementId,
    ) -> SiteResult<EventResponse> {
        let href = self
            .anchors
            .iter()
            .find(|(a, _)| *a == anchor)
            .map(|(_, href)| href.as_str())
            .ok_or(SiteError::UnknownElement(anchor))?;

        let Some(target) = resolve(dom, href) else {
            debug!(href, "anchor target missing");
            return Ok(EventResponse::PreventDefault);
        };

        let top = dom.offset_top(target) - dom.offset_height(nav.navbar()) - config.anchor_margin_px;
        nav.close(dom)?;
        dom.smooth_scroll_to(top)?;
        debug!(href, top, "anchor scroll");
        Ok(EventResponse::PreventDefault)
    }
}

fn resolve(dom: &mut dyn Dom, href: &str) -> Option<ElementId> {
    let fragment = href.strip_prefix('#').filter(|f| !f.is_empty())?;
    match dom.query(&format!("#{}", fragment)) {
        Ok(target) => target,
        Err(err) => {
            debug!(href, %err, "unresolvable anchor");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::{FakeDom, ScrollCall};

    #[test]
    fn test_anchor_scrolls_below_navbar_and_closes_menu() {
        let (mut dom, page) = FakeDom::sample_page();
        let config = SiteConfig::default();
        let nav = NavigationController::mount(&mut dom, &config).unwrap();
        let anchors = AnchorScroller::mount(&mut dom, &config).unwrap();
        nav.toggle(&mut dom).unwrap();

        let response = anchors
            .on_click(&mut dom, &nav, &config, page.nav_anchors[1])
            .unwrap();

        assert_eq!(response, EventResponse::PreventDefault);
        // #rituals sits at 1400, navbar is 70 tall, 20px margin
        assert_eq!(dom.scroll_calls(), &[ScrollCall::SmoothTo(1310.0)]);
        assert!(!nav.is_open(&dom));
    }

    #[test]
    fn test_missing_target_does_nothing_further() {
        let (mut dom, page) = FakeDom::sample_page();
        let config = SiteConfig::default();
        let nav = NavigationController::mount(&mut dom, &config).unwrap();
        let anchors = AnchorScroller::mount(&mut dom, &config).unwrap();
        nav.toggle(&mut dom).unwrap();

        let response = anchors
            .on_click(&mut dom, &nav, &config, page.dangling_anchor)
            .unwrap();

        assert_eq!(response, EventResponse::PreventDefault);
        assert!(dom.scroll_calls().is_empty());
        assert!(nav.is_open(&dom));
    }

    #[test]
    fn test_bare_hash_resolves_nothing() {
        let mut dom = FakeDom::new();
        assert_eq!(resolve(&mut dom, "#"), None);
        assert_eq!(resolve(&mut dom, ""), None);
    }

    #[test]
    fn test_mount_binds_every_hash_link() {
        let (mut dom, page) = FakeDom::sample_page();
        let anchors = AnchorScroller::mount(&mut dom, &SiteConfig::default()).unwrap();
        assert!(anchors.is_anchor(page.button));
        assert!(anchors.is_anchor(page.dangling_anchor));
        assert!(!anchors.is_anchor(page.cards[0]));
        assert!(dom.is_listening(Target::Element(page.nav_anchors[0]), EventKind::Click));
    }
}
