//! File-backed stores for running imports locally.
//!
//! Each listing lands as one pretty-printed JSON file, images under a
//! media root mirroring their upload paths. A production deployment puts
//! a database and an object store behind the same traits.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::importer::traits::{BlobStore, RecordStore};
use crate::models::{ExtractedListing, StoredImage};

#[derive(Debug, Serialize, Deserialize)]
struct RecordFile {
    listing: ExtractedListing,
    images: Vec<StoredImage>,
}

pub struct JsonRecordStore {
    dir: PathBuf,
}

impl JsonRecordStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn record_path(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }

    async fn read_record(&self, path: &Path) -> Result<RecordFile> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("could not read {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("malformed record {}", path.display()))
    }

    async fn write_record(&self, id: &str, record: &RecordFile) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .context("could not create record directory")?;
        let json = serde_json::to_string_pretty(record)?;
        tokio::fs::write(self.record_path(id), json)
            .await
            .with_context(|| format!("could not write record {id}"))
    }
}

#[async_trait]
impl RecordStore for JsonRecordStore {
    async fn find_existing(&self, title: &str, price: i64) -> Result<Option<String>> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            // A store nothing was written to yet holds no duplicates.
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err).context("record directory unreadable"),
        };
        while let Some(entry) = entries
            .next_entry()
            .await
            .context("record directory unreadable")?
        {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            let Ok(record) = self.read_record(&path).await else {
                debug!(path = %path.display(), "skipping unreadable record");
                continue;
            };
            if record.listing.title == title && record.listing.price == price {
                let id = path
                    .file_stem()
                    .and_then(|stem| stem.to_str())
                    .unwrap_or_default()
                    .to_string();
                return Ok(Some(id));
            }
        }
        Ok(None)
    }

    async fn create(&self, listing: &ExtractedListing) -> Result<String> {
        let id = listing.source_id.clone();
        let record = RecordFile {
            listing: listing.clone(),
            images: Vec::new(),
        };
        self.write_record(&id, &record).await?;
        debug!(id = %id, "record written");
        Ok(id)
    }

    async fn attach_images(&self, id: &str, images: &[StoredImage]) -> Result<()> {
        let path = self.record_path(id);
        let mut record = self.read_record(&path).await?;
        record.images = images.to_vec();
        self.write_record(id, &record).await
    }
}

pub struct LocalBlobStore {
    root: PathBuf,
    public_base: String,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>, public_base: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base: public_base.into(),
        }
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    /// The content type rides on the path's extension here; an object
    /// store would send it as a header instead.
    async fn upload(&self, bytes: Bytes, path: &str, _content_type: &str) -> Result<String> {
        let full = self.root.join(path);
        if let Some(parent) = full.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .context("could not create media directory")?;
        }
        tokio::fs::write(&full, &bytes)
            .await
            .with_context(|| format!("could not write {}", full.display()))?;
        Ok(format!(
            "{}/{}",
            self.public_base.trim_end_matches('/'),
            path
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    use crate::models::{BuildingAttributes, Currency, PropertyKind, TransactionKind};

    fn sample(title: &str, price: i64) -> ExtractedListing {
        ExtractedListing {
            source_url: "https://www.olx.ro/d/oferta/test-IDabc.html".to_string(),
            source_id: "abc".to_string(),
            title: title.to_string(),
            price,
            currency: Currency::Eur,
            property_kind: PropertyKind::Apartment,
            transaction_kind: TransactionKind::Sale,
            locality: Some("Buzau".to_string()),
            zone: None,
            street: None,
            latitude: None,
            longitude: None,
            surface: 54.0,
            rooms: Some(2),
            floor: None,
            total_floors: None,
            description: String::new(),
            features: Vec::new(),
            building: BuildingAttributes::default(),
            image_urls: Vec::new(),
            scraped_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn created_records_are_found_by_title_and_price() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonRecordStore::new(dir.path());

        assert_eq!(store.find_existing("Apartament 2 camere", 50_000).await.unwrap(), None);

        let id = store.create(&sample("Apartament 2 camere", 50_000)).await.unwrap();
        assert_eq!(id, "abc");
        assert_eq!(
            store.find_existing("Apartament 2 camere", 50_000).await.unwrap(),
            Some("abc".to_string())
        );
        assert_eq!(store.find_existing("Apartament 2 camere", 49_000).await.unwrap(), None);
    }

    #[tokio::test]
    async fn attached_images_survive_a_reload() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonRecordStore::new(dir.path());
        let id = store.create(&sample("Casa noua", 99_000)).await.unwrap();

        let images = vec![
            StoredImage {
                url: "https://media.test/listings/abc/0.jpg".to_string(),
                position: 0,
                primary: true,
            },
            StoredImage {
                url: "https://media.test/listings/abc/1.jpg".to_string(),
                position: 1,
                primary: false,
            },
        ];
        store.attach_images(&id, &images).await.unwrap();

        let raw = tokio::fs::read_to_string(dir.path().join("abc.json")).await.unwrap();
        let record: RecordFile = serde_json::from_str(&raw).unwrap();
        assert_eq!(record.images, images);
        assert_eq!(record.listing.title, "Casa noua");
    }

    #[tokio::test]
    async fn uploads_land_under_the_media_root() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path(), "https://media.test/");

        let url = store
            .upload(Bytes::from_static(b"jpegdata"), "listings/abc/0.jpg", "image/jpeg")
            .await
            .unwrap();

        assert_eq!(url, "https://media.test/listings/abc/0.jpg");
        let written = tokio::fs::read(dir.path().join("listings/abc/0.jpg")).await.unwrap();
        assert_eq!(written, b"jpegdata");
    }
}
