//! Downloads harvested gallery images and hands them to blob storage.
//!
//! One bad image never sinks the rest: each URL is handled on its own,
//! and the stored set keeps the harvest order so the first photo that
//! survives becomes the record's primary.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tracing::{debug, warn};
use url::Url;

use crate::importer::config::ImporterConfig;
use crate::importer::traits::{BlobStore, ImageFetcher};
use crate::models::StoredImage;

const KNOWN_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif"];

/// Plain HTTP downloader used outside of tests.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &ImporterConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(&config.user_agent)
            .build()
            .context("failed to build image download client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ImageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<(Bytes, Option<String>)> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("image request failed")?;
        if !response.status().is_success() {
            bail!("image request returned {}", response.status());
        }
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.split(';').next().unwrap_or(value).trim().to_ascii_lowercase());
        let bytes = response
            .bytes()
            .await
            .context("image body could not be read")?;
        Ok((bytes, content_type))
    }
}

pub struct ImagePipeline<'a> {
    fetcher: &'a dyn ImageFetcher,
    blobs: &'a dyn BlobStore,
    delay: Duration,
}

impl<'a> ImagePipeline<'a> {
    pub fn new(fetcher: &'a dyn ImageFetcher, blobs: &'a dyn BlobStore, delay: Duration) -> Self {
        Self {
            fetcher,
            blobs,
            delay,
        }
    }

    /// Persists the gallery for one stored record. Failures are logged and
    /// skipped; the returned set holds whatever made it through.
    pub async fn persist(&self, record_id: &str, urls: &[String]) -> Vec<StoredImage> {
        let mut stored = Vec::new();
        for (index, url) in urls.iter().enumerate() {
            match self.persist_one(record_id, index, url, stored.is_empty()).await {
                Ok(image) => stored.push(image),
                Err(err) => warn!(url = %url, error = %err, "image skipped"),
            }
            if index + 1 < urls.len() {
                tokio::time::sleep(self.delay).await;
            }
        }
        debug!(record_id, count = stored.len(), "gallery persisted");
        stored
    }

    async fn persist_one(
        &self,
        record_id: &str,
        index: usize,
        url: &str,
        primary: bool,
    ) -> Result<StoredImage> {
        let (bytes, content_type) = self.fetcher.fetch(url).await?;
        let extension = pick_extension(url, content_type.as_deref(), &bytes);
        let path = format!("listings/{record_id}/{index}.{extension}");
        let stored_url = self
            .blobs
            .upload(bytes, &path, mime_for(extension))
            .await
            .context("image upload failed")?;
        Ok(StoredImage {
            url: stored_url,
            position: index,
            primary,
        })
    }
}

/// File extension for a downloaded image: the URL's own extension wins,
/// then the response content type, then the leading bytes. Unidentifiable
/// payloads are stored as jpg, the format the CDN serves in practice.
pub(crate) fn pick_extension(url: &str, content_type: Option<&str>, bytes: &[u8]) -> &'static str {
    if let Some(ext) = url_extension(url) {
        return ext;
    }
    if let Some(ext) = content_type.and_then(type_extension) {
        return ext;
    }
    magic_extension(bytes).unwrap_or("jpg")
}

fn url_extension(url: &str) -> Option<&'static str> {
    let parsed = Url::parse(url).ok()?;
    let segment = parsed.path_segments()?.last()?;
    let (_, ext) = segment.rsplit_once('.')?;
    let ext = ext.to_ascii_lowercase();
    KNOWN_EXTENSIONS
        .iter()
        .find(|known| **known == ext)
        .map(|known| normalize_jpeg(known))
}

fn type_extension(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/gif" => Some("gif"),
        _ => None,
    }
}

fn magic_extension(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("jpg")
    } else if bytes.starts_with(&[0x89, b'P', b'N', b'G']) {
        Some("png")
    } else if bytes.starts_with(b"GIF8") {
        Some("gif")
    } else if bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        Some("webp")
    } else {
        None
    }
}

fn normalize_jpeg(ext: &str) -> &'static str {
    match ext {
        "jpeg" | "jpg" => "jpg",
        "png" => "png",
        "webp" => "webp",
        "gif" => "gif",
        _ => "jpg",
    }
}

fn mime_for(extension: &str) -> &'static str {
    match extension {
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        _ => "image/jpeg",
    }
}
