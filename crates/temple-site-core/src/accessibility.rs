//! Keyboard access to ritual cards and the skip link.

use std::collections::BTreeSet;

use crate::config::SiteConfig;
use crate::dom::{Dom, ElementId, EventKind, Target};
use crate::error::SiteResult;

const SKIP_LINK_HIDDEN_TOP: &str = "-40px";
const SKIP_LINK_FOCUSED_TOP: &str = "6px";

const SKIP_LINK_STYLE: &[(&str, &str)] = &[
    ("position", "absolute"),
    ("top", SKIP_LINK_HIDDEN_TOP),
    ("left", "6px"),
    ("background", "#8b4513"),
    ("color", "white"),
    ("padding", "8px"),
    ("text-decoration", "none"),
    ("border-radius", "4px"),
    ("z-index", "1001"),
    ("transition", "top 0.3s"),
];

/// Keys that activate a focused card.
pub fn is_activation_key(key: &str) -> bool {
    matches!(key, "Enter" | " ")
}

#[derive(Debug, Clone)]
pub struct AccessibilityController {
    cards: BTreeSet<ElementId>,
    skip_link: ElementId,
}

impl AccessibilityController {
    /// Make `cards` focusable and insert the skip link as the first child of
    /// the body.
    pub fn mount(
        dom: &mut dyn Dom,
        config: &SiteConfig,
        cards: impl IntoIterator<Item = ElementId>,
    ) -> SiteResult<Self> {
        let mut focusable = BTreeSet::new();
        for card in cards {
            dom.set_attribute(card, "tabindex", "0")?;
            dom.listen(Target::Element(card), EventKind::KeyDown)?;
            focusable.insert(card);
        }

        let skip_link = dom.create_element("a")?;
        dom.set_attribute(skip_link, "href", &config.skip_link.href)?;
        dom.set_text(skip_link, &config.skip_link.text)?;
        dom.add_class(skip_link, "skip-link")?;
        for (property, value) in SKIP_LINK_STYLE {
            dom.set_style(skip_link, property, value)?;
        }
        dom.listen(Target::Element(skip_link), EventKind::Focus)?;
        dom.listen(Target::Element(skip_link), EventKind::Blur)?;
        let body = dom.body()?;
        dom.prepend_child(body, skip_link)?;

        Ok(Self {
            cards: focusable,
            skip_link,
        })
    }

    pub fn skip_link(&self) -> ElementId {
        self.skip_link
    }

    /// The card to toggle for this key press, if it activates one.
    pub fn activated_card(&self, el: ElementId, key: &str) -> Option<ElementId> {
        (self.cards.contains(&el) && is_activation_key(key)).then_some(el)
    }

    pub fn on_focus(&self, dom: &mut dyn Dom, el: ElementId) -> SiteResult<()> {
        if el == self.skip_link {
            dom.set_style(el, "top", SKIP_LINK_FOCUSED_TOP)?;
        }
        Ok(())
    }

    pub fn on_blur(&self, dom: &mut dyn Dom, el: ElementId) -> SiteResult<()> {
        if el == self.skip_link {
            dom.set_style(el, "top", SKIP_LINK_HIDDEN_TOP)?;
        }
        Ok(())
    }
}
