//! Batch import orchestration.
//!
//! URLs are processed strictly one after another over a single browser
//! session. Each listing is isolated: a capture, extraction or store
//! failure turns into a failed outcome for that URL and the batch moves
//! on. Only an empty input or a browser that refuses to start abort the
//! whole run.

use anyhow::{bail, Context, Result};
use tokio::time::sleep;
use tracing::{info, warn};

use crate::importer::config::ImporterConfig;
use crate::importer::persist::ImagePipeline;
use crate::importer::traits::{BlobStore, ImageFetcher, ListingScraper, RecordStore};
use crate::models::{ImportOutcome, ImportReport, ImportStatus};

pub struct BatchImporter {
    scraper: Box<dyn ListingScraper>,
    records: Box<dyn RecordStore>,
    fetcher: Box<dyn ImageFetcher>,
    blobs: Box<dyn BlobStore>,
    config: ImporterConfig,
}

impl BatchImporter {
    pub fn new(
        scraper: Box<dyn ListingScraper>,
        records: Box<dyn RecordStore>,
        fetcher: Box<dyn ImageFetcher>,
        blobs: Box<dyn BlobStore>,
        config: ImporterConfig,
    ) -> Self {
        Self {
            scraper,
            records,
            fetcher,
            blobs,
            config,
        }
    }

    /// Runs the batch to completion and returns one outcome per input URL,
    /// in input order. The browser is torn down exactly once, whether the
    /// run finishes or startup fails.
    pub async fn run(self, urls: &[String]) -> Result<ImportReport> {
        if urls.is_empty() {
            bail!("no listing urls to import");
        }
        let Self {
            mut scraper,
            records,
            fetcher,
            blobs,
            config,
        } = self;

        info!(
            count = urls.len(),
            source = scraper.source_name(),
            "starting import batch"
        );
        if let Err(err) = scraper.warm_up().await {
            scraper.close();
            return Err(err.context("browser startup failed"));
        }

        let pipeline = ImagePipeline::new(fetcher.as_ref(), blobs.as_ref(), config.image_delay);
        let mut report = ImportReport::default();
        for (index, url) in urls.iter().enumerate() {
            let outcome = import_one(scraper.as_mut(), records.as_ref(), &pipeline, url).await;
            match outcome.status {
                ImportStatus::Imported => info!(
                    url = %outcome.url,
                    id = outcome.created_id.as_deref().unwrap_or(""),
                    images = outcome.images_persisted.unwrap_or(0),
                    "listing imported"
                ),
                ImportStatus::DuplicateSkipped => info!(url = %outcome.url, "duplicate skipped"),
                ImportStatus::Failed => warn!(
                    url = %outcome.url,
                    error = outcome.error.as_deref().unwrap_or(""),
                    "listing failed"
                ),
            }
            report.record(outcome);
            if index + 1 < urls.len() {
                sleep(config.listing_delay).await;
            }
        }
        scraper.close();

        info!(
            imported = report.imported,
            failed = report.failed,
            total = report.outcomes.len(),
            "import batch finished"
        );
        Ok(report)
    }
}

async fn import_one(
    scraper: &mut dyn ListingScraper,
    records: &dyn RecordStore,
    pipeline: &ImagePipeline<'_>,
    url: &str,
) -> ImportOutcome {
    match try_import(scraper, records, pipeline, url).await {
        Ok(outcome) => outcome,
        Err(err) => ImportOutcome {
            url: url.to_string(),
            status: ImportStatus::Failed,
            created_id: None,
            images_persisted: None,
            error: Some(format!("{err:#}")),
        },
    }
}

async fn try_import(
    scraper: &mut dyn ListingScraper,
    records: &dyn RecordStore,
    pipeline: &ImagePipeline<'_>,
    url: &str,
) -> Result<ImportOutcome> {
    let listing = scraper.scrape(url).await?;

    if let Some(existing) = records
        .find_existing(&listing.title, listing.price)
        .await
        .context("duplicate lookup failed")?
    {
        info!(url, existing = %existing, "matching record already stored");
        return Ok(ImportOutcome {
            url: url.to_string(),
            status: ImportStatus::DuplicateSkipped,
            created_id: None,
            images_persisted: None,
            error: None,
        });
    }

    let record_id = records
        .create(&listing)
        .await
        .context("record creation failed")?;
    let stored = pipeline.persist(&record_id, &listing.image_urls).await;
    let persisted = stored.len();
    if !stored.is_empty() {
        // The record is already in the store at this point. Losing the
        // image links is worth a warning, not a failed outcome.
        if let Err(err) = records.attach_images(&record_id, &stored).await {
            warn!(record_id = %record_id, error = %err, "image attachment failed");
        }
    }

    Ok(ImportOutcome {
        url: url.to_string(),
        status: ImportStatus::Imported,
        created_id: Some(record_id),
        images_persisted: Some(persisted),
        error: None,
    })
}
