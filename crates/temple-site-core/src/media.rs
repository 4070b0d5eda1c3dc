//! Background video playback.
//!
//! Desktop keeps the video playing once it has been seen; mobile pauses it
//! whenever it scrolls out of view and unconditionally after the battery
//! timeout.

use tracing::{debug, info};

use crate::config::SiteConfig;
use crate::dom::{Dom, ElementId, EventKind, Target, Watcher, WatcherOptions};
use crate::error::SiteResult;
use crate::timer::{Deferred, Scheduler, TimerId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Video {
    video: ElementId,
    container: Option<ElementId>,
}

#[derive(Debug, Clone, Default)]
pub struct MediaController {
    video: Option<Video>,
    battery_timer: Option<TimerId>,
}

impl MediaController {
    /// Wire the background video, if the page has one.
    pub fn mount(dom: &mut dyn Dom, timers: &mut dyn Scheduler, config: &SiteConfig) -> SiteResult<Self> {
        let Some(video) = dom.query(&config.selectors.video)? else {
            debug!("no background video");
            return Ok(Self::default());
        };
        let container = dom.query(&config.selectors.video_container)?;
        let mobile = config.is_mobile(dom.viewport_width());

        if mobile {
            dom.set_style(video, "object-position", "center center")?;
        }
        dom.listen(Target::Element(video), EventKind::MediaError)?;
        dom.observe(Watcher::Media, &WatcherOptions::default(), video)?;

        let battery_timer = mobile.then(|| {
            timers.schedule(
                config.timing.battery_pause_after(),
                Deferred::BatteryPause(video),
            )
        });

        Ok(Self {
            video: Some(Video { video, container }),
            battery_timer,
        })
    }

    pub fn video(&self) -> Option<ElementId> {
        self.video.map(|v| v.video)
    }

    pub fn battery_timer(&self) -> Option<TimerId> {
        self.battery_timer
    }

    pub fn is_video(&self, el: ElementId) -> bool {
        self.video() == Some(el)
    }

    /// Swap the video for the static gradient.
    pub fn on_error(&self, dom: &mut dyn Dom, config: &SiteConfig) -> SiteResult<()> {
        info!("video failed to load, applying fallback background");
        if let Some(container) = self.video.and_then(|v| v.container) {
            dom.set_style(container, "background", &config.media.fallback_background)?;
        }
        Ok(())
    }

    pub fn on_intersection(
        &self,
        dom: &mut dyn Dom,
        config: &SiteConfig,
        el: ElementId,
        intersecting: bool,
    ) -> SiteResult<()> {
        if !self.is_video(el) {
            return Ok(());
        }
        if intersecting {
            dom.play(el)
        } else if config.is_mobile(dom.viewport_width()) {
            dom.pause(el)
        } else {
            Ok(())
        }
    }

    /// Deferred mobile battery saver.
    pub fn battery_pause(&mut self, dom: &mut dyn Dom, config: &SiteConfig, el: ElementId) -> SiteResult<()> {
        self.battery_timer = None;
        if !dom.is_connected(el) {
            return Ok(());
        }
        debug!("pausing background video to save battery");
        dom.pause(el)?;
        dom.set_style(el, "opacity", &config.media.idle_opacity)
    }
}
