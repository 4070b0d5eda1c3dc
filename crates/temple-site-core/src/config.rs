//! Site configuration.
//!
//! Every value defaults to the constant the page was designed around, so an
//! empty JSON object (or no configuration at all) yields the stock behaviour.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{SiteError, SiteResult};

/// Top-level configuration for the behaviour layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Viewport width separating mobile (below) from desktop (at or above).
    pub breakpoint_px: f64,
    /// Extra space left above an anchor target after smooth scrolling.
    pub anchor_margin_px: f64,
    /// `tracing_subscriber::EnvFilter` directive used by the browser host.
    pub log_filter: String,
    pub selectors: Selectors,
    pub scroll: ScrollConfig,
    pub timing: Timing,
    pub reveal: RevealConfig,
    pub media: MediaConfig,
    pub skip_link: SkipLinkConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            breakpoint_px: 768.0,
            anchor_margin_px: 20.0,
            log_filter: "info".to_string(),
            selectors: Selectors::default(),
            scroll: ScrollConfig::default(),
            timing: Timing::default(),
            reveal: RevealConfig::default(),
            media: MediaConfig::default(),
            skip_link: SkipLinkConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Parse a (possibly partial) JSON configuration and validate it.
    pub fn from_json(json: &str) -> SiteResult<Self> {
        let config: SiteConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the controllers cannot work with.
    pub fn validate(&self) -> SiteResult<()> {
        if !(self.breakpoint_px > 0.0) {
            return Err(SiteError::Config(format!(
                "breakpoint_px must be positive, got {}",
                self.breakpoint_px
            )));
        }
        if !(0.0..=1.0).contains(&self.reveal.threshold) {
            return Err(SiteError::Config(format!(
                "reveal.threshold must be within 0..=1, got {}",
                self.reveal.threshold
            )));
        }
        if self.scroll.hide_after_px < 0.0 || self.scroll.opaque_after_px < 0.0 {
            return Err(SiteError::Config(
                "scroll thresholds must not be negative".to_string(),
            ));
        }
        Ok(())
    }

    /// True when `width` is a mobile viewport.
    pub fn is_mobile(&self, width: f64) -> bool {
        width < self.breakpoint_px
    }
}

/// CSS selectors describing the page structure the controllers expect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Selectors {
    pub navbar: String,
    pub nav_links: String,
    pub nav_toggle: String,
    pub ritual_cards: String,
    /// Evaluated within each ritual card.
    pub ritual_details: String,
    pub video: String,
    pub video_container: String,
    pub lazy_images: String,
    pub reveal: String,
    pub stat_cards: String,
    pub touch_targets: String,
    pub anchors: String,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            navbar: ".navbar".to_string(),
            nav_links: "#nav-links".to_string(),
            nav_toggle: ".nav-toggle".to_string(),
            ritual_cards: ".ritual-card".to_string(),
            ritual_details: ".ritual-details".to_string(),
            video: ".video-background video".to_string(),
            video_container: ".video-background".to_string(),
            lazy_images: "img[loading=\"lazy\"]".to_string(),
            reveal: ".fade-in".to_string(),
            stat_cards: ".stat-card".to_string(),
            touch_targets: ".ritual-card, .stat-card, .info-card, .btn".to_string(),
            anchors: "a[href^=\"#\"]".to_string(),
        }
    }
}

/// Navbar appearance while scrolling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrollConfig {
    /// Scroll offset beyond which the navbar turns opaque.
    pub opaque_after_px: f64,
    /// Scroll offset beyond which a downward scroll hides the navbar on mobile.
    pub hide_after_px: f64,
    pub translucent_background: String,
    pub opaque_background: String,
    pub opaque_shadow: String,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            opaque_after_px: 50.0,
            hide_after_px: 100.0,
            translucent_background: "rgba(139, 69, 19, 0.95)".to_string(),
            opaque_background: "rgba(139, 69, 19, 0.98)".to_string(),
            opaque_shadow: "0 2px 20px rgba(0,0,0,0.3)".to_string(),
        }
    }
}

/// Delays, in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timing {
    pub card_scroll_delay_ms: u64,
    pub touch_reset_delay_ms: u64,
    pub battery_pause_after_ms: u64,
    /// Minimum spacing between handled scroll events; 0 handles every event.
    pub scroll_throttle_ms: u64,
    /// Quiet period before a resize is handled; 0 handles it immediately.
    pub resize_debounce_ms: u64,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            card_scroll_delay_ms: 100,
            touch_reset_delay_ms: 100,
            battery_pause_after_ms: 30_000,
            scroll_throttle_ms: 0,
            resize_debounce_ms: 0,
        }
    }
}

impl Timing {
    pub fn card_scroll_delay(&self) -> Duration {
        Duration::from_millis(self.card_scroll_delay_ms)
    }

    pub fn touch_reset_delay(&self) -> Duration {
        Duration::from_millis(self.touch_reset_delay_ms)
    }

    pub fn battery_pause_after(&self) -> Duration {
        Duration::from_millis(self.battery_pause_after_ms)
    }

    pub fn scroll_throttle(&self) -> Option<Duration> {
        (self.scroll_throttle_ms > 0).then(|| Duration::from_millis(self.scroll_throttle_ms))
    }

    pub fn resize_debounce(&self) -> Option<Duration> {
        (self.resize_debounce_ms > 0).then(|| Duration::from_millis(self.resize_debounce_ms))
    }
}

/// Fade-in on scroll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RevealConfig {
    /// Fraction of an element that must be visible to reveal it.
    pub threshold: f64,
    pub root_margin: String,
    /// Animation delay added per stat card, in seconds.
    pub stagger_step_s: f64,
    pub hidden_transform: String,
    pub transition: String,
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            threshold: 0.1,
            root_margin: "0px 0px -50px 0px".to_string(),
            stagger_step_s: 0.2,
            hidden_transform: "translateY(30px)".to_string(),
            transition: "all 0.8s ease-out".to_string(),
        }
    }
}

/// Background video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    /// Container background used when the video cannot be played.
    pub fallback_background: String,
    /// Video opacity after the mobile battery pause.
    pub idle_opacity: String,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            fallback_background: "linear-gradient(135deg, #8b4513, #a0522d)".to_string(),
            idle_opacity: "0.7".to_string(),
        }
    }
}

/// Injected "skip to main content" link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkipLinkConfig {
    pub href: String,
    pub text: String,
}

impl Default for SkipLinkConfig {
    fn default() -> Self {
        Self {
            href: "#about".to_string(),
            text: "Skip to main content".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_page_constants() {
        let config = SiteConfig::default();
        assert_eq!(config.breakpoint_px, 768.0);
        assert_eq!(config.timing.card_scroll_delay(), Duration::from_millis(100));
        assert_eq!(config.timing.battery_pause_after(), Duration::from_secs(30));
        assert_eq!(
            config.media.fallback_background,
            "linear-gradient(135deg, #8b4513, #a0522d)"
        );
        assert!(config.timing.scroll_throttle().is_none());
        assert!(config.timing.resize_debounce().is_none());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config =
            SiteConfig::from_json(r#"{"breakpoint_px": 900, "timing": {"resize_debounce_ms": 150}}"#)
                .unwrap();
        assert_eq!(config.breakpoint_px, 900.0);
        assert_eq!(config.timing.resize_debounce(), Some(Duration::from_millis(150)));
        assert_eq!(config.timing.touch_reset_delay_ms, 100);
        assert_eq!(config.selectors.navbar, ".navbar");
    }

    #[test]
    fn test_empty_json_is_default() {
        assert_eq!(SiteConfig::from_json("{}").unwrap(), SiteConfig::default());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = SiteConfig::from_json(r#"{"breakpoint_px": 0}"#).unwrap_err();
        assert!(matches!(err, SiteError::Config(_)));

        let err = SiteConfig::from_json(r#"{"reveal": {"threshold": 1.5}}"#).unwrap_err();
        assert!(matches!(err, SiteError::Config(_)));

        let err = SiteConfig::from_json("not json").unwrap_err();
        assert!(matches!(err, SiteError::Json(_)));
    }

    #[test]
    fn test_is_mobile_boundary() {
        let config = SiteConfig::default();
        assert!(config.is_mobile(767.0));
        assert!(!config.is_mobile(768.0));
    }
}
