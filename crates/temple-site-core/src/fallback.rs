//! Last-resort navigation when the page script fails.
//!
//! [`ErrorGuard`] owns its own [`Dom`] handle and never touches the
//! [`Site`](crate::Site), so it keeps working when the site failed to mount or
//! is stuck in a broken state.

use tracing::{error, warn};

use crate::config::SiteConfig;
use crate::dom::{Dom, EventKind, Target};
use crate::error::SiteResult;

/// Inline `display` value the fallback toggle moves the menu to.
pub fn next_display(current: &str) -> &'static str {
    if current == "block" {
        "none"
    } else {
        "block"
    }
}

#[derive(Debug)]
pub struct ErrorGuard<D> {
    dom: D,
    toggle_selector: String,
    menu_selector: String,
    installed: bool,
}

impl<D: Dom> ErrorGuard<D> {
    pub fn new(dom: D, config: &SiteConfig) -> Self {
        Self {
            dom,
            toggle_selector: config.selectors.nav_toggle.clone(),
            menu_selector: config.selectors.nav_links.clone(),
            installed: false,
        }
    }

    /// Listen for uncaught script errors on the window.
    pub fn arm(&mut self) -> SiteResult<()> {
        self.dom.listen(Target::Window, EventKind::ScriptError)
    }

    pub fn dom(&self) -> &D {
        &self.dom
    }

    pub fn dom_mut(&mut self) -> &mut D {
        &mut self.dom
    }

    pub fn is_installed(&self) -> bool {
        self.installed
    }

    /// Log the error and, if the nav toggle has nothing bound to it, bind the
    /// display-flipping fallback. Returns true when the fallback was installed
    /// by this call.
    pub fn on_script_error(&mut self, message: &str) -> SiteResult<bool> {
        error!(detail = %message, "script error");
        if self.installed {
            return Ok(false);
        }
        let Some(toggle) = self.dom.query(&self.toggle_selector)? else {
            return Ok(false);
        };
        let Some(menu) = self.dom.query(&self.menu_selector)? else {
            return Ok(false);
        };
        if self.dom.has_click_handler(toggle) {
            return Ok(false);
        }
        self.dom.install_fallback_toggle(toggle, menu)?;
        self.installed = true;
        warn!("navigation toggle unbound, installed fallback handler");
        Ok(true)
    }
}
