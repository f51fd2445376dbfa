//! OLX.ro listing scraper: drives the browser session through one ad
//! page, captures the rendered markup and assembles the final record.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use headless_chrome::Tab;
use tracing::debug;

use crate::importer::browser::BrowserSession;
use crate::importer::config::ImporterConfig;
use crate::importer::extract::{self, ListingPage};
use crate::importer::images;
use crate::importer::traits::ListingScraper;
use crate::models::ExtractedListing;

/// Builds the import record from a parsed page. Pure construction over
/// the probe results; every unresolved field falls back to its documented
/// default, so a partially readable page still yields a record.
pub fn assemble(page: &ListingPage, config: &ImporterConfig) -> ExtractedListing {
    let (floor, total_floors) = match extract::floor(page) {
        Some((level, total)) => (Some(level), total),
        None => (None, None),
    };
    let (latitude, longitude) = match extract::coordinates(page) {
        Some((lat, lon)) => (Some(lat), Some(lon)),
        None => (None, None),
    };
    ExtractedListing {
        source_url: page.url.clone(),
        source_id: extract::source_id(&page.url),
        title: extract::title(page).unwrap_or_default(),
        price: extract::price(page).unwrap_or(0),
        currency: extract::currency(page),
        property_kind: extract::property_kind(page),
        transaction_kind: extract::transaction(page),
        locality: extract::locality(page),
        zone: extract::zone(page),
        street: extract::street(page),
        latitude,
        longitude,
        surface: extract::surface(page).unwrap_or(0.0),
        rooms: extract::rooms(page),
        floor,
        total_floors,
        description: extract::description(page).unwrap_or_default(),
        features: extract::features(page),
        building: extract::building(page),
        image_urls: images::harvest(page, config.min_gallery, &config.cdn_host),
        scraped_at: Utc::now(),
    }
}

pub struct OlxScraper {
    session: BrowserSession,
    config: ImporterConfig,
}

impl OlxScraper {
    pub fn new(config: ImporterConfig) -> Self {
        let session = BrowserSession::new(&config.user_agent);
        Self { session, config }
    }

    /// Navigation and readiness checks, kept separate from the capture so
    /// the tab is released on every path.
    fn navigate(&self, tab: &Tab, url: &str) -> Result<()> {
        tab.set_default_timeout(self.config.navigation_timeout);
        tab.navigate_to(url).context("navigation failed")?;
        tab.wait_until_navigated()
            .context("page did not finish loading")?;
        tab.wait_for_element_with_custom_timeout("h1", self.config.element_timeout)
            .context("listing headline never appeared")?;
        self.dismiss_consent(tab);
        Ok(())
    }

    /// Clicks the cookie wall away when present. A missing banner is the
    /// normal case, so failures only get a debug line.
    fn dismiss_consent(&self, tab: &Tab) {
        let js = r#"(() => {
            const btn = document.querySelector('#onetrust-accept-btn-handler, button[data-testid="accept-btn"]');
            if (btn) { btn.click(); return true; }
            return false;
        })()"#;
        if let Err(err) = tab.evaluate(js, false) {
            debug!(error = %err, "consent dismissal skipped");
        }
    }

    fn grab_html(&self, tab: &Tab) -> Result<String> {
        tab.evaluate("document.documentElement.outerHTML", false)
            .context("could not read page markup")?
            .value
            .and_then(|value| value.as_str().map(str::to_string))
            .context("page markup was empty")
    }
}

#[async_trait]
impl ListingScraper for OlxScraper {
    async fn warm_up(&mut self) -> Result<()> {
        let tab = self.session.acquire().context("could not start browser")?;
        self.session.release(&tab);
        Ok(())
    }

    async fn scrape(&mut self, url: &str) -> Result<ExtractedListing> {
        let tab = self.session.acquire()?;
        debug!(url, "navigating");
        let navigated = self.navigate(&tab, url);
        if navigated.is_ok() {
            // Give the gallery and parameter grid time to hydrate before
            // the markup snapshot.
            tokio::time::sleep(self.config.settle_delay).await;
        }
        let markup = match navigated {
            Ok(()) => self.grab_html(&tab),
            Err(err) => Err(err),
        };
        self.session.release(&tab);
        let markup = markup?;

        let page = ListingPage::parse(url, &markup);
        let listing = assemble(&page, &self.config);
        debug!(
            url,
            title = %listing.title,
            images = listing.image_urls.len(),
            "listing extracted"
        );
        Ok(listing)
    }

    fn close(&mut self) {
        self.session.shutdown();
    }

    fn source_name(&self) -> &'static str {
        "olx.ro"
    }
}
