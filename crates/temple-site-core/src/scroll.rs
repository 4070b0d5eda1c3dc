//! Navbar appearance while the page scrolls.
//!
//! Two independent axes: the backdrop depends only on the current offset, the
//! mobile hide/show depends on the direction since the previous event.
//!
//! With a throttle configured, events inside the window are skipped and one
//! trailing evaluation runs when the window closes, so the navbar always ends
//! up styled for the final offset.

use crate::config::{ScrollConfig, SiteConfig};
use crate::dom::{Dom, ElementId, EventKind, Target};
use crate::error::SiteResult;
use crate::rate_limit::Throttle;
use crate::timer::{Deferred, Scheduler, TimerId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backdrop {
    Translucent,
    Opaque,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavbarPosition {
    Shown,
    Hidden,
}

/// Backdrop for a scroll offset.
pub fn backdrop(scroll_top: f64, config: &ScrollConfig) -> Backdrop {
    if scroll_top > config.opaque_after_px {
        Backdrop::Opaque
    } else {
        Backdrop::Translucent
    }
}

/// Mobile navbar position after moving from `previous` to `current`.
pub fn navbar_position(previous: f64, current: f64, config: &ScrollConfig) -> NavbarPosition {
    if current > previous && current > config.hide_after_px {
        NavbarPosition::Hidden
    } else {
        NavbarPosition::Shown
    }
}

#[derive(Debug)]
pub struct ScrollEffectController {
    navbar: ElementId,
    last_scroll_top: f64,
    throttle: Option<Throttle>,
    trailing: Option<TimerId>,
}

impl ScrollEffectController {
    /// Bind the passive window scroll listener.
    pub fn mount(dom: &mut dyn Dom, config: &SiteConfig, navbar: ElementId) -> SiteResult<Self> {
        dom.listen(Target::Window, EventKind::Scroll)?;
        Ok(Self {
            navbar,
            last_scroll_top: 0.0,
            throttle: config.timing.scroll_throttle().map(Throttle::new),
            trailing: None,
        })
    }

    pub fn last_scroll_top(&self) -> f64 {
        self.last_scroll_top
    }

    /// Trailing evaluation still waiting for the throttle window to close.
    pub fn trailing(&self) -> Option<TimerId> {
        self.trailing
    }

    pub fn on_scroll(
        &mut self,
        dom: &mut dyn Dom,
        timers: &mut dyn Scheduler,
        config: &SiteConfig,
    ) -> SiteResult<()> {
        let now = timers.now();
        if let Some(throttle) = self.throttle.as_mut() {
            if !throttle.admit(now) {
                if self.trailing.is_none() {
                    let wait = throttle.remaining(now);
                    self.trailing = Some(timers.schedule(wait, Deferred::ScrollSettled));
                }
                return Ok(());
            }
        }
        self.apply(dom, config)
    }

    /// Run the evaluation skipped by the throttle.
    pub fn on_settled(
        &mut self,
        dom: &mut dyn Dom,
        timers: &dyn Scheduler,
        config: &SiteConfig,
        id: TimerId,
    ) -> SiteResult<()> {
        if self.trailing == Some(id) {
            self.trailing = None;
        }
        if let Some(throttle) = self.throttle.as_mut() {
            throttle.mark(timers.now());
        }
        self.apply(dom, config)
    }

    fn apply(&mut self, dom: &mut dyn Dom, config: &SiteConfig) -> SiteResult<()> {
        let scroll_top = dom.scroll_top();
        let scroll = &config.scroll;
        match backdrop(scroll_top, scroll) {
            Backdrop::Opaque => {
                dom.set_style(self.navbar, "background", &scroll.opaque_background)?;
                dom.set_style(self.navbar, "box-shadow", &scroll.opaque_shadow)?;
            }
            Backdrop::Translucent => {
                dom.set_style(self.navbar, "background", &scroll.translucent_background)?;
                dom.set_style(self.navbar, "box-shadow", "none")?;
            }
        }

        if config.is_mobile(dom.viewport_width()) {
            let transform = match navbar_position(self.last_scroll_top, scroll_top, scroll) {
                NavbarPosition::Hidden => "translateY(-100%)",
                NavbarPosition::Shown => "translateY(0)",
            };
            dom.set_style(self.navbar, "transform", transform)?;
        }

        self.last_scroll_top = scroll_top;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::fake::{FakeDom, FakeScheduler, SamplePage};

    fn mounted(config: &SiteConfig) -> (FakeDom, SamplePage, ScrollEffectController) {
        let (mut dom, page) = FakeDom::sample_page();
        let scroll = ScrollEffectController::mount(&mut dom, config, page.navbar).unwrap();
        (dom, page, scroll)
    }

    fn scroll_to(dom: &mut FakeDom, scroll: &mut ScrollEffectController, config: &SiteConfig, top: f64) {
        dom.scroll_top = top;
        scroll.on_scroll(dom, &mut FakeScheduler::new(), config).unwrap();
    }

    #[test]
    fn test_backdrop_threshold() {
        let config = ScrollConfig::default();
        assert_eq!(backdrop(0.0, &config), Backdrop::Translucent);
        assert_eq!(backdrop(49.0, &config), Backdrop::Translucent);
        assert_eq!(backdrop(50.0, &config), Backdrop::Translucent);
        assert_eq!(backdrop(51.0, &config), Backdrop::Opaque);
    }

    #[test]
    fn test_navbar_position_rules() {
        let config = ScrollConfig::default();
        assert_eq!(navbar_position(80.0, 120.0, &config), NavbarPosition::Hidden);
        assert_eq!(navbar_position(40.0, 90.0, &config), NavbarPosition::Shown);
        assert_eq!(navbar_position(300.0, 200.0, &config), NavbarPosition::Shown);
        assert_eq!(navbar_position(200.0, 200.0, &config), NavbarPosition::Shown);
    }

    #[test]
    fn test_styles_follow_offset() {
        let config = SiteConfig::default();
        let (mut dom, page, mut scroll) = mounted(&config);
        assert!(dom.is_listening(Target::Window, EventKind::Scroll));

        scroll_to(&mut dom, &mut scroll, &config, 51.0);
        assert_eq!(dom.style(page.navbar, "background"), "rgba(139, 69, 19, 0.98)");
        assert_eq!(dom.style(page.navbar, "box-shadow"), "0 2px 20px rgba(0,0,0,0.3)");

        scroll_to(&mut dom, &mut scroll, &config, 49.0);
        assert_eq!(dom.style(page.navbar, "background"), "rgba(139, 69, 19, 0.95)");
        assert_eq!(dom.style(page.navbar, "box-shadow"), "none");
        // desktop never hides the navbar
        assert_eq!(dom.style(page.navbar, "transform"), "");
    }

    #[test]
    fn test_mobile_hides_on_scroll_down_and_shows_on_scroll_up() {
        let config = SiteConfig::default();
        let (mut dom, page, mut scroll) = mounted(&config);
        dom.viewport_width = 400.0;

        scroll_to(&mut dom, &mut scroll, &config, 90.0);
        assert_eq!(dom.style(page.navbar, "transform"), "translateY(0)");

        scroll_to(&mut dom, &mut scroll, &config, 150.0);
        assert_eq!(dom.style(page.navbar, "transform"), "translateY(-100%)");

        scroll_to(&mut dom, &mut scroll, &config, 140.0);
        assert_eq!(dom.style(page.navbar, "transform"), "translateY(0)");
        assert_eq!(scroll.last_scroll_top(), 140.0);
    }

    #[test]
    fn test_last_offset_tracked_on_desktop_too() {
        let config = SiteConfig::default();
        let (mut dom, _page, mut scroll) = mounted(&config);
        scroll_to(&mut dom, &mut scroll, &config, 500.0);
        assert_eq!(scroll.last_scroll_top(), 500.0);
    }

    #[test]
    fn test_throttle_applies_final_offset_after_window() {
        let mut config = SiteConfig::default();
        config.timing.scroll_throttle_ms = 100;
        let (mut dom, page, mut scroll) = mounted(&config);
        let mut timers = FakeScheduler::new();

        dom.scroll_top = 80.0;
        scroll.on_scroll(&mut dom, &mut timers, &config).unwrap();
        assert_eq!(dom.style(page.navbar, "box-shadow"), "0 2px 20px rgba(0,0,0,0.3)");

        timers.advance(Duration::from_millis(30));
        dom.scroll_top = 0.0;
        scroll.on_scroll(&mut dom, &mut timers, &config).unwrap();
        // skipped inside the window
        assert_eq!(scroll.last_scroll_top(), 80.0);
        let pending = scroll.trailing().unwrap();

        // a second skipped event reuses the pending evaluation
        scroll.on_scroll(&mut dom, &mut timers, &config).unwrap();
        assert_eq!(timers.queued(), vec![Deferred::ScrollSettled]);

        assert!(timers.advance(Duration::from_millis(69)).is_empty());
        let fired = timers.advance(Duration::from_millis(1));
        assert_eq!(fired, vec![(pending, Deferred::ScrollSettled)]);

        scroll.on_settled(&mut dom, &timers, &config, pending).unwrap();
        assert_eq!(scroll.trailing(), None);
        assert_eq!(scroll.last_scroll_top(), 0.0);
        assert_eq!(dom.style(page.navbar, "background"), "rgba(139, 69, 19, 0.95)");
        assert_eq!(dom.style(page.navbar, "box-shadow"), "none");
    }
}
