//! Ritual cards: a mutually exclusive accordion.

use tracing::{debug, warn};

use crate::config::SiteConfig;
use crate::dom::{Dom, ElementId, EventKind, Target};
use crate::error::{SiteError, SiteResult};
use crate::timer::{Deferred, Scheduler};

/// Class on the details region of the open card.
pub const DETAILS_OPEN_CLASS: &str = "active";
/// Class on the open card itself.
pub const CARD_OPEN_CLASS: &str = "expanded";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Card {
    card: ElementId,
    details: ElementId,
}

#[derive(Debug, Clone, Default)]
pub struct ExpandableCardController {
    cards: Vec<Card>,
}

impl ExpandableCardController {
    /// Collect every card with a details region and bind its click listener.
    pub fn mount(dom: &mut dyn Dom, config: &SiteConfig) -> SiteResult<Self> {
        let mut cards = Vec::new();
        for card in dom.query_all(&config.selectors.ritual_cards)? {
            match dom.query_within(card, &config.selectors.ritual_details)? {
                Some(details) => {
                    dom.listen(Target::Element(card), EventKind::Click)?;
                    cards.push(Card { card, details });
                }
                None => warn!(%card, "ritual card without details region, skipping"),
            }
        }
        debug!(count = cards.len(), "ritual cards mounted");
        Ok(Self { cards })
    }

    pub fn cards(&self) -> impl Iterator<Item = ElementId> + '_ {
        self.cards.iter().map(|c| c.card)
    }

    pub fn is_card(&self, el: ElementId) -> bool {
        self.cards.iter().any(|c| c.card == el)
    }

    /// The card currently open, if any.
    pub fn open_card(&self, dom: &dyn Dom) -> Option<ElementId> {
        self.cards
            .iter()
            .find(|c| dom.has_class(c.details, DETAILS_OPEN_CLASS))
            .map(|c| c.card)
    }

    /// Close every other card, then flip `card`. Returns whether `card` is
    /// open afterwards. On mobile an opened card is scrolled to the viewport
    /// centre after a short delay.
    pub fn toggle(
        &self,
        dom: &mut dyn Dom,
        timers: &mut dyn Scheduler,
        config: &SiteConfig,
        card: ElementId,
    ) -> SiteResult<bool> {
        let target = *self
            .cards
            .iter()
            .find(|c| c.card == card)
            .ok_or(SiteError::UnknownElement(card))?;

        for other in self.cards.iter().filter(|c| c.card != card) {
            dom.remove_class(other.details, DETAILS_OPEN_CLASS)?;
            dom.remove_class(other.card, CARD_OPEN_CLASS)?;
        }

        let open = dom.toggle_class(target.details, DETAILS_OPEN_CLASS)?;
        if open {
            dom.add_class(target.card, CARD_OPEN_CLASS)?;
        } else {
            dom.remove_class(target.card, CARD_OPEN_CLASS)?;
        }
        debug!(%card, open, "ritual card toggled");

        if open && config.is_mobile(dom.viewport_width()) {
            timers.schedule(
                config.timing.card_scroll_delay(),
                Deferred::ScrollCardIntoView(card),
            );
        }
        Ok(open)
    }

    /// Deferred half of [`toggle`](Self::toggle). A card removed from the
    /// page in the meantime is ignored.
    pub fn scroll_into_view(&self, dom: &mut dyn Dom, card: ElementId) -> SiteResult<()> {
        if !dom.is_connected(card) {
            debug!(%card, "card detached before scroll, ignoring");
            return Ok(());
        }
        dom.scroll_into_view_centered(card)
    }
}
