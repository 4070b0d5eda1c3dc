//! Property-based tests for the page controllers
//!
//! Uses proptest to check the accordion invariant, close() idempotence and
//! the navbar backdrop under arbitrary event sequences.

use proptest::prelude::*;
use temple_site_core::cards::{CARD_OPEN_CLASS, DETAILS_OPEN_CLASS};
use temple_site_core::fake::{FakeDom, FakeScheduler, SamplePage};
use temple_site_core::navigation::OPEN_CLASS;
use temple_site_core::scroll::{backdrop, Backdrop};
use temple_site_core::config::ScrollConfig;
use temple_site_core::{Dom, Site, SiteConfig, SiteEvent};

// ============================================================================
// Strategy Generators
// ============================================================================

/// Events a visitor can produce on the sample page
#[derive(Debug, Clone)]
enum PageOp {
    ClickCard(usize),
    KeyCard(usize),
    ClickToggle,
    ClickOutside,
    Scroll(u16),
}

fn page_ops_strategy(max_ops: usize) -> impl Strategy<Value = Vec<PageOp>> {
    prop::collection::vec(
        prop_oneof![
            4 => (0..3usize).prop_map(PageOp::ClickCard),
            2 => (0..3usize).prop_map(PageOp::KeyCard),
            1 => Just(PageOp::ClickToggle),
            1 => Just(PageOp::ClickOutside),
            2 => (0..2000u16).prop_map(PageOp::Scroll),
        ],
        0..max_ops,
    )
}

fn apply(site: &mut Site<FakeDom, FakeScheduler>, page: &SamplePage, op: &PageOp) {
    match op {
        PageOp::ClickCard(i) => {
            site.dispatch(SiteEvent::Click(page.cards[*i]));
        }
        PageOp::KeyCard(i) => {
            site.dispatch(SiteEvent::KeyDown {
                el: page.cards[*i],
                key: "Enter".to_string(),
            });
        }
        PageOp::ClickToggle => {
            site.dispatch(SiteEvent::Click(page.nav_toggle));
        }
        PageOp::ClickOutside => {
            site.dispatch(SiteEvent::DocumentClick {
                target: Some(page.sections[2]),
            });
        }
        PageOp::Scroll(top) => {
            site.dom_mut().scroll_top = f64::from(*top);
            site.dispatch(SiteEvent::Scroll);
        }
    }
}

fn mount(width: f64) -> (Site<FakeDom, FakeScheduler>, SamplePage) {
    let (mut dom, page) = FakeDom::sample_page();
    dom.viewport_width = width;
    let site = Site::mount(dom, FakeScheduler::new(), SiteConfig::default()).unwrap();
    (site, page)
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    /// At most one card is ever open, and its markers agree
    #[test]
    fn accordion_at_most_one_open(ops in page_ops_strategy(40), width in 320.0f64..1400.0) {
        let (mut site, page) = mount(width);

        for op in &ops {
            apply(&mut site, &page, op);

            let open_details = page
                .details
                .iter()
                .filter(|d| site.dom().has_class(**d, DETAILS_OPEN_CLASS))
                .count();
            prop_assert!(open_details <= 1);

            for (card, details) in page.cards.iter().zip(&page.details) {
                prop_assert_eq!(
                    site.dom().has_class(*card, CARD_OPEN_CLASS),
                    site.dom().has_class(*details, DETAILS_OPEN_CLASS)
                );
            }
        }
    }

    /// The card toggled last wins over any previously open card
    #[test]
    fn last_opened_card_wins(first in 0..3usize, second in 0..3usize) {
        prop_assume!(first != second);
        let (mut site, page) = mount(1024.0);

        site.dispatch(SiteEvent::Click(page.cards[first]));
        site.dispatch(SiteEvent::Click(page.cards[second]));

        prop_assert_eq!(site.cards().open_card(site.dom()), Some(page.cards[second]));
    }

    /// close() twice leaves the same page as close() once
    #[test]
    fn close_is_idempotent(ops in page_ops_strategy(20)) {
        let (mut site, page) = mount(500.0);
        for op in &ops {
            apply(&mut site, &page, op);
        }
        let nav = site.navigation().clone();
        let body = site.dom().body_id();
        let state = |site: &Site<FakeDom, FakeScheduler>| {
            (
                site.dom().has_class(page.nav_links, OPEN_CLASS),
                site.dom().text(page.nav_toggle).to_string(),
                site.dom().style(page.nav_toggle, "transform"),
                site.dom().style(body, "overflow"),
            )
        };

        nav.close(site.dom_mut()).unwrap();
        let once = state(&site);
        nav.close(site.dom_mut()).unwrap();
        prop_assert_eq!(state(&site), once);
    }

    /// The backdrop depends on the current offset only, not on history
    #[test]
    fn backdrop_is_pure(ops in page_ops_strategy(30), last in 0..2000u16) {
        let (mut site, page) = mount(1024.0);
        for op in &ops {
            apply(&mut site, &page, op);
        }
        apply(&mut site, &page, &PageOp::Scroll(last));

        let config = ScrollConfig::default();
        let expected = match backdrop(f64::from(last), &config) {
            Backdrop::Opaque => config.opaque_background.clone(),
            Backdrop::Translucent => config.translucent_background.clone(),
        };
        prop_assert_eq!(site.dom().style(page.navbar, "background"), expected);
        prop_assert_eq!(site.scroll().last_scroll_top(), f64::from(last));
    }
}
