use std::time::Duration;

/// Tunables for one import run.
///
/// Defaults are the production values; the CLI only overrides the politeness
/// delay. Timeouts bound the two ways a page load can hang (navigation and
/// the required content element), everything else shapes throttling and the
/// gallery fallback.
#[derive(Debug, Clone)]
pub struct ImporterConfig {
    /// User agent for both the browser process and direct image downloads.
    pub user_agent: String,
    /// Upper bound on page navigation before the URL is failed.
    pub navigation_timeout: Duration,
    /// Upper bound on waiting for the listing's main content element.
    pub element_timeout: Duration,
    /// Grace period after navigation so client-side rendering can finish.
    pub settle_delay: Duration,
    /// Politeness pause between consecutive listing pages.
    pub listing_delay: Duration,
    /// Politeness pause between consecutive image downloads.
    pub image_delay: Duration,
    /// Below this many harvested images the broad CDN fallback scan runs.
    pub min_gallery: usize,
    /// Host substring identifying the source's image CDN.
    pub cdn_host: String,
}

impl Default for ImporterConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
            navigation_timeout: Duration::from_secs(30),
            element_timeout: Duration::from_secs(10),
            settle_delay: Duration::from_secs(2),
            listing_delay: Duration::from_secs(2),
            image_delay: Duration::from_millis(300),
            min_gallery: 3,
            cdn_host: "olxcdn.com".to_string(),
        }
    }
}
