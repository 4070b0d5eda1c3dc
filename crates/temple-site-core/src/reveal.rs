//! Fade-in on scroll and the stat card entrance stagger.

use std::collections::BTreeSet;

use tracing::debug;

use crate::config::SiteConfig;
use crate::dom::{Dom, ElementId, Watcher, WatcherOptions};
use crate::error::SiteResult;

#[derive(Debug, Clone, Default)]
pub struct RevealOnScrollController {
    elements: BTreeSet<ElementId>,
}

impl RevealOnScrollController {
    /// Hide every reveal element, hand it to the shared watcher and stagger
    /// the stat cards.
    pub fn mount(dom: &mut dyn Dom, config: &SiteConfig) -> SiteResult<Self> {
        let reveal = &config.reveal;
        let options = WatcherOptions {
            threshold: reveal.threshold,
            root_margin: reveal.root_margin.clone(),
        };

        let mut elements = BTreeSet::new();
        for el in dom.query_all(&config.selectors.reveal)? {
            dom.set_style(el, "opacity", "0")?;
            dom.set_style(el, "transform", &reveal.hidden_transform)?;
            dom.set_style(el, "transition", &reveal.transition)?;
            dom.observe(Watcher::Reveal, &options, el)?;
            elements.insert(el);
        }

        for (index, card) in dom.query_all(&config.selectors.stat_cards)?.into_iter().enumerate() {
            dom.set_style(card, "animation-delay", &stagger_delay(index, reveal.stagger_step_s))?;
        }

        debug!(count = elements.len(), "reveal elements mounted");
        Ok(Self { elements })
    }

    /// Reveal on entry. Leaving the viewport does not hide it again.
    pub fn on_intersection(&self, dom: &mut dyn Dom, el: ElementId, intersecting: bool) -> SiteResult<()> {
        if intersecting && self.elements.contains(&el) {
            dom.set_style(el, "opacity", "1")?;
            dom.set_style(el, "transform", "translateY(0)")?;
        }
        Ok(())
    }
}

/// CSS `animation-delay` for the stat card at `index`.
pub fn stagger_delay(index: usize, step_s: f64) -> String {
    format!("{}s", index as f64 * step_s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::FakeDom;

    #[test]
    fn test_mount_hides_and_observes() {
        let (mut dom, page) = FakeDom::sample_page();
        RevealOnScrollController::mount(&mut dom, &SiteConfig::default()).unwrap();

        for el in [page.intro, page.info_card] {
            assert_eq!(dom.style(el, "opacity"), "0");
            assert_eq!(dom.style(el, "transform"), "translateY(30px)");
            assert_eq!(dom.style(el, "transition"), "all 0.8s ease-out");
            assert!(dom.is_observed(Watcher::Reveal, el));
        }
        let options = dom.watcher_options(Watcher::Reveal).unwrap();
        assert_eq!(options.threshold, 0.1);
        assert_eq!(options.root_margin, "0px 0px -50px 0px");
    }

    #[test]
    fn test_stat_cards_staggered() {
        let (mut dom, page) = FakeDom::sample_page();
        RevealOnScrollController::mount(&mut dom, &SiteConfig::default()).unwrap();
        assert_eq!(dom.style(page.stat_cards[0], "animation-delay"), "0s");
        assert_eq!(dom.style(page.stat_cards[1], "animation-delay"), "0.2s");
        assert_eq!(dom.style(page.stat_cards[2], "animation-delay"), "0.4s");
    }

    #[test]
    fn test_reveal_is_one_shot() {
        let (mut dom, page) = FakeDom::sample_page();
        let reveal = RevealOnScrollController::mount(&mut dom, &SiteConfig::default()).unwrap();

        reveal.on_intersection(&mut dom, page.intro, true).unwrap();
        assert_eq!(dom.style(page.intro, "opacity"), "1");
        assert_eq!(dom.style(page.intro, "transform"), "translateY(0)");

        reveal.on_intersection(&mut dom, page.intro, false).unwrap();
        assert_eq!(dom.style(page.intro, "opacity"), "1");
        assert!(dom.is_observed(Watcher::Reveal, page.intro));

        // still hidden until it scrolls in
        assert_eq!(dom.style(page.info_card, "opacity"), "0");
    }
}
