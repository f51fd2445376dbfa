mod importer;
mod models;
mod store;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{info, Level};

use importer::{BatchImporter, HttpFetcher, ImporterConfig, OlxScraper};
use models::ImportStatus;
use store::{JsonRecordStore, LocalBlobStore};

#[derive(Parser)]
#[command(author, version, about = "Imports OLX.ro listings into the local catalog")]
struct Args {
    /// File with one listing URL per line
    urls: PathBuf,

    /// Directory listing records are written into
    #[arg(long, default_value = "data/listings")]
    data_dir: PathBuf,

    /// Directory image files are written under
    #[arg(long, default_value = "data/media")]
    media_dir: PathBuf,

    /// Public base URL prefixed onto stored image paths
    #[arg(long, default_value = "http://localhost:8080/media")]
    base_url: String,

    /// Where to write the JSON import report
    #[arg(long, default_value = "import_report.json")]
    report: PathBuf,

    /// Milliseconds to wait between listing pages
    #[arg(long, default_value = "2000")]
    delay_ms: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    let args = Args::parse();

    info!("🏠 OLX Listing Importer");
    info!("=======================");

    let urls = read_urls(&args.urls).await?;
    info!("Importing {} listings from {}", urls.len(), args.urls.display());

    let config = ImporterConfig {
        listing_delay: Duration::from_millis(args.delay_ms),
        ..ImporterConfig::default()
    };

    let scraper = OlxScraper::new(config.clone());
    let fetcher = HttpFetcher::new(&config)?;
    let records = JsonRecordStore::new(&args.data_dir);
    let blobs = LocalBlobStore::new(&args.media_dir, &args.base_url);

    let importer = BatchImporter::new(
        Box::new(scraper),
        Box::new(records),
        Box::new(fetcher),
        Box::new(blobs),
        config,
    );
    let report = importer.run(&urls).await?;

    // Display results
    println!();
    for (i, outcome) in report.outcomes.iter().enumerate() {
        match outcome.status {
            ImportStatus::Imported => println!(
                "{}. ✅ {} (record {}, {} images)",
                i + 1,
                outcome.url,
                outcome.created_id.as_deref().unwrap_or("?"),
                outcome.images_persisted.unwrap_or(0)
            ),
            ImportStatus::DuplicateSkipped => println!("{}. ⏭  {} (already stored)", i + 1, outcome.url),
            ImportStatus::Failed => println!(
                "{}. ❌ {} ({})",
                i + 1,
                outcome.url,
                outcome.error.as_deref().unwrap_or("unknown error")
            ),
        }
    }
    println!();
    println!(
        "Imported {} of {} listings ({} failed)",
        report.imported,
        report.outcomes.len(),
        report.failed
    );

    let json = serde_json::to_string_pretty(&report)?;
    tokio::fs::write(&args.report, json).await?;
    info!("💾 Saved import report to {}", args.report.display());

    Ok(())
}

async fn read_urls(path: &Path) -> anyhow::Result<Vec<String>> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("could not read url list {}", path.display()))?;
    Ok(raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}
