use crate::models::{ExtractedListing, StoredImage};
use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;

/// Common trait for listing scrapers.
/// The orchestrator only talks to this seam, so other sources can be added
/// later and tests can drive the batch loop without a browser.
#[async_trait]
pub trait ListingScraper: Send {
    /// Brings shared resources up front (the browser process), so a launch
    /// failure surfaces as a batch-level error instead of failing every URL.
    async fn warm_up(&mut self) -> Result<()> {
        Ok(())
    }

    /// Scrapes one listing page into a structured record.
    async fn scrape(&mut self, url: &str) -> Result<ExtractedListing>;

    /// Tears down shared resources. Must be a no-op when called again.
    fn close(&mut self) {}

    /// Get the name of the scraper source
    fn source_name(&self) -> &'static str;
}

/// Record store owned by the surrounding application; the importer only
/// needs duplicate lookup, creation, and image attachment.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Returns the id of an already-imported listing with the same title
    /// and price, if any.
    async fn find_existing(&self, title: &str, price: i64) -> Result<Option<String>>;

    /// Persists a new listing and returns its id.
    async fn create(&self, listing: &ExtractedListing) -> Result<String>;

    /// Records the re-hosted images of a listing.
    async fn attach_images(&self, id: &str, images: &[StoredImage]) -> Result<()>;
}

/// Blob store that re-hosts downloaded bytes and returns their public URL.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn upload(&self, bytes: Bytes, path: &str, content_type: &str) -> Result<String>;
}

/// Downloads one image, returning its bytes and the reported content type.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<(Bytes, Option<String>)>;
}
