use std::ffi::OsStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use headless_chrome::{Browser, LaunchOptions, Tab};
use tracing::{debug, info};

/// Shared headless Chrome process with page-scoped checkout.
///
/// The process is launched lazily on the first `acquire` and reused for every
/// page after that; pages are scoped per listing (opened by `acquire`, closed
/// by `release`). `shutdown` is the only call that touches the process itself.
pub struct BrowserSession {
    browser: Option<Browser>,
    user_agent: String,
}

impl BrowserSession {
    pub fn new(user_agent: &str) -> Self {
        Self {
            browser: None,
            user_agent: user_agent.to_string(),
        }
    }

    /// Returns a fresh page, launching the shared browser on first use.
    ///
    /// A launch failure propagates to the caller; no retry happens here.
    pub fn acquire(&mut self) -> Result<Arc<Tab>> {
        if let Some(browser) = &self.browser {
            return browser.new_tab().context("Failed to open a new browser tab");
        }

        info!("Launching headless Chrome...");
        let browser = self.launch()?;
        let tab = browser.new_tab().context("Failed to open a new browser tab")?;
        self.browser = Some(browser);
        Ok(tab)
    }

    /// Closes one page. The shared process stays up for the next listing.
    pub fn release(&self, tab: &Tab) {
        if let Err(e) = tab.close(false) {
            debug!("Failed to close tab: {}", e);
        }
    }

    /// Terminates the shared browser process. No-op when nothing is running.
    pub fn shutdown(&mut self) {
        if let Some(browser) = self.browser.take() {
            info!("Shutting down headless Chrome");
            drop(browser);
        }
    }

    /// True once the shared process has been launched.
    pub fn is_running(&self) -> bool {
        self.browser.is_some()
    }

    fn launch(&self) -> Result<Browser> {
        let ua_arg = format!("--user-agent={}", self.user_agent);
        let options = LaunchOptions::default_builder()
            .headless(true)
            .window_size(Some((1366, 960)))
            .args(vec![OsStr::new(&ua_arg)])
            // Image persistence runs between page loads; keep the idle
            // watchdog from reaping the browser in the meantime.
            .idle_browser_timeout(Duration::from_secs(300))
            .build()
            .context("Failed to build launch options")?;

        Browser::new(options).context("Failed to launch Chrome browser")
    }
}
