//! Deferred image loading.

use std::collections::BTreeSet;

use tracing::debug;

use crate::config::SiteConfig;
use crate::dom::{Dom, ElementId, Watcher, WatcherOptions};
use crate::error::SiteResult;

/// Class added once an image has been triggered.
pub const LOADED_CLASS: &str = "loaded";

#[derive(Debug, Clone, Default)]
pub struct LazyImageController {
    pending: BTreeSet<ElementId>,
}

impl LazyImageController {
    pub fn mount(dom: &mut dyn Dom, config: &SiteConfig) -> SiteResult<Self> {
        let mut pending = BTreeSet::new();
        for img in dom.query_all(&config.selectors.lazy_images)? {
            dom.observe(Watcher::LazyImages, &WatcherOptions::default(), img)?;
            pending.insert(img);
        }
        Ok(Self { pending })
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Re-assign the image source so the browser fetches it, then stop
    /// watching. Returns true only for the first trigger of an image.
    pub fn on_intersection(&mut self, dom: &mut dyn Dom, img: ElementId, intersecting: bool) -> SiteResult<bool> {
        if !intersecting || !self.pending.remove(&img) {
            return Ok(false);
        }
        if let Some(src) = dom.attribute(img, "src") {
            dom.set_attribute(img, "src", &src)?;
        }
        dom.add_class(img, LOADED_CLASS)?;
        dom.unobserve(Watcher::LazyImages, img)?;
        debug!(%img, "lazy image triggered");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::FakeDom;

    #[test]
    fn test_image_loads_once() {
        let (mut dom, page) = FakeDom::sample_page();
        let mut lazy = LazyImageController::mount(&mut dom, &SiteConfig::default()).unwrap();
        let img = page.images[0];
        assert!(dom.is_observed(Watcher::LazyImages, img));
        assert_eq!(lazy.pending(), 2);

        assert!(lazy.on_intersection(&mut dom, img, true).unwrap());
        assert!(!lazy.on_intersection(&mut dom, img, true).unwrap());

        assert_eq!(dom.attribute_writes(img, "src"), 1);
        assert_eq!(dom.attribute(img, "src").as_deref(), Some("/images/temple-0.jpg"));
        assert!(dom.has_class(img, LOADED_CLASS));
        assert!(!dom.is_observed(Watcher::LazyImages, img));
        assert_eq!(lazy.pending(), 1);
    }

    #[test]
    fn test_non_intersecting_entry_ignored() {
        let (mut dom, page) = FakeDom::sample_page();
        let mut lazy = LazyImageController::mount(&mut dom, &SiteConfig::default()).unwrap();
        assert!(!lazy.on_intersection(&mut dom, page.images[1], false).unwrap());
        assert!(dom.is_observed(Watcher::LazyImages, page.images[1]));
        assert!(!dom.has_class(page.images[1], LOADED_CLASS));
    }
}
