//! Press feedback for touch screens.

use std::collections::BTreeSet;

use crate::config::SiteConfig;
use crate::dom::{Dom, ElementId, EventKind, Target};
use crate::error::SiteResult;
use crate::timer::{Deferred, Scheduler};

#[derive(Debug, Clone, Default)]
pub struct TouchFeedbackController {
    targets: BTreeSet<ElementId>,
}

impl TouchFeedbackController {
    pub fn mount(dom: &mut dyn Dom, config: &SiteConfig) -> SiteResult<Self> {
        let mut targets = BTreeSet::new();
        for el in dom.query_all(&config.selectors.touch_targets)? {
            dom.listen(Target::Element(el), EventKind::TouchStart)?;
            dom.listen(Target::Element(el), EventKind::TouchEnd)?;
            targets.insert(el);
        }
        Ok(Self { targets })
    }

    pub fn is_target(&self, el: ElementId) -> bool {
        self.targets.contains(&el)
    }

    pub fn on_touch_start(&self, dom: &mut dyn Dom, el: ElementId) -> SiteResult<()> {
        if !self.is_target(el) {
            return Ok(());
        }
        dom.set_style(el, "transform", "scale(0.98)")?;
        dom.set_style(el, "transition", "transform 0.1s ease")
    }

    pub fn on_touch_end(&self, timers: &mut dyn Scheduler, config: &SiteConfig, el: ElementId) {
        if self.is_target(el) {
            timers.schedule(config.timing.touch_reset_delay(), Deferred::ResetTouch(el));
        }
    }

    /// Deferred half of [`on_touch_end`](Self::on_touch_end).
    pub fn reset(&self, dom: &mut dyn Dom, el: ElementId) -> SiteResult<()> {
        if !dom.is_connected(el) {
            return Ok(());
        }
        dom.set_style(el, "transform", "")?;
        dom.set_style(el, "transition", "all 0.3s ease")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::{FakeDom, FakeScheduler};
    use std::time::Duration;

    #[test]
    fn test_press_and_release() {
        let (mut dom, page) = FakeDom::sample_page();
        let mut timers = FakeScheduler::new();
        let config = SiteConfig::default();
        let touch = TouchFeedbackController::mount(&mut dom, &config).unwrap();
        let card = page.stat_cards[0];

        assert!(dom.is_listening(Target::Element(card), EventKind::TouchStart));
        assert!(dom.is_listening(Target::Element(page.button), EventKind::TouchEnd));

        touch.on_touch_start(&mut dom, card).unwrap();
        assert_eq!(dom.style(card, "transform"), "scale(0.98)");
        assert_eq!(dom.style(card, "transition"), "transform 0.1s ease");

        touch.on_touch_end(&mut timers, &config, card);
        // still pressed until the delay passes
        assert_eq!(dom.style(card, "transform"), "scale(0.98)");
        let fired = timers.advance(Duration::from_millis(100));
        assert_eq!(fired[0].1, Deferred::ResetTouch(card));

        touch.reset(&mut dom, card).unwrap();
        assert_eq!(dom.style(card, "transform"), "");
        assert_eq!(dom.style(card, "transition"), "all 0.3s ease");
    }

    #[test]
    fn test_reset_after_removal_is_noop() {
        let (mut dom, page) = FakeDom::sample_page();
        let touch = TouchFeedbackController::mount(&mut dom, &SiteConfig::default()).unwrap();
        let card = page.cards[0];
        touch.on_touch_start(&mut dom, card).unwrap();
        dom.detach(card);
        touch.reset(&mut dom, card).unwrap();
        assert_eq!(dom.style(card, "transform"), "scale(0.98)");
    }

    #[test]
    fn test_untracked_element_ignored() {
        let (mut dom, page) = FakeDom::sample_page();
        let touch = TouchFeedbackController::mount(&mut dom, &SiteConfig::default()).unwrap();
        touch.on_touch_start(&mut dom, page.navbar).unwrap();
        assert_eq!(dom.style(page.navbar, "transform"), "");
    }
}
