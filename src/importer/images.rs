//! Gallery harvesting from a captured listing page.
//!
//! Three sources are merged in discovery order: structured-data image
//! lists, `picture`/`srcset` markup, then images labeled with the
//! gallery's "Imagine N din M" counter. A raw CDN scan backstops pages
//! whose gallery markup changed, but only when the merged set stays
//! under the expected minimum.

use std::collections::HashSet;

use regex::Regex;
use scraper::Selector;
use serde_json::Value;
use url::Url;

use crate::importer::extract::ListingPage;

/// Size segment written onto every CDN URL so persisted photos are the
/// full-resolution rendition rather than the thumbnail the page embeds.
const FULL_SIZE: &str = "1000x700";

/// Filenames that mark chrome assets rather than listing photos.
const NOISE_MARKERS: &[&str] = &["placeholder", "logo", "icon", "sprite", "avatar", "no_thumbnail"];

/// Gallery image URLs in discovery order, deduplicated by their
/// size-independent form.
pub fn harvest(page: &ListingPage, min_gallery: usize, cdn_host: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut urls = Vec::new();
    for candidate in payload_images(page)
        .into_iter()
        .chain(gallery_images(page))
        .chain(labeled_images(page))
    {
        push_unique(&mut urls, &mut seen, &page.url, &candidate);
    }
    if urls.len() < min_gallery {
        for candidate in cdn_scan(page, cdn_host) {
            push_unique(&mut urls, &mut seen, &page.url, &candidate);
        }
    }
    urls
}

fn push_unique(urls: &mut Vec<String>, seen: &mut HashSet<String>, base: &str, candidate: &str) {
    let Some(absolute) = absolutize(base, candidate) else {
        return;
    };
    if is_noise(&absolute) {
        return;
    }
    let upgraded = upgrade_resolution(&absolute);
    if seen.insert(dedupe_key(&upgraded)) {
        urls.push(upgraded);
    }
}

fn payload_images(page: &ListingPage) -> Vec<String> {
    let mut out = Vec::new();
    for payload in &page.payloads {
        if let Some(image) = payload.get("image") {
            collect_image_value(image, &mut out);
        }
    }
    out
}

/// `image` may be a bare URL, a list of URLs, or ImageObject entries.
fn collect_image_value(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::String(url) => out.push(url.clone()),
        Value::Array(items) => {
            for item in items {
                collect_image_value(item, out);
            }
        }
        Value::Object(map) => {
            if let Some(url) = map
                .get("url")
                .or_else(|| map.get("contentUrl"))
                .and_then(Value::as_str)
            {
                out.push(url.to_string());
            }
        }
        _ => {}
    }
}

fn gallery_images(page: &ListingPage) -> Vec<String> {
    let selector = Selector::parse(
        "[data-testid^=\"image-galery\"] img, [data-testid=\"gallery\"] img, picture source[srcset], picture img",
    )
    .unwrap();
    let mut out = Vec::new();
    for el in page.doc.select(&selector) {
        if let Some(best) = el.value().attr("srcset").and_then(best_from_srcset) {
            out.push(best);
        } else if let Some(src) = el.value().attr("src") {
            out.push(src.to_string());
        }
    }
    out
}

fn labeled_images(page: &ListingPage) -> Vec<String> {
    let selector = Selector::parse("img[aria-label], img[alt]").unwrap();
    let counter = Regex::new(r"(?i)imagine\s+\d+\s+din\s+\d+").unwrap();
    let mut out = Vec::new();
    for el in page.doc.select(&selector) {
        let label = el
            .value()
            .attr("aria-label")
            .or_else(|| el.value().attr("alt"))
            .unwrap_or_default();
        if !counter.is_match(label) {
            continue;
        }
        if let Some(best) = el.value().attr("srcset").and_then(best_from_srcset) {
            out.push(best);
        } else if let Some(src) = el.value().attr("src") {
            out.push(src.to_string());
        }
    }
    out
}

fn cdn_scan(page: &ListingPage, cdn_host: &str) -> Vec<String> {
    let selector = Selector::parse("img[src], img[srcset], source[srcset]").unwrap();
    let mut out = Vec::new();
    for el in page.doc.select(&selector) {
        if let Some(best) = el.value().attr("srcset").and_then(best_from_srcset) {
            if best.contains(cdn_host) {
                out.push(best);
                continue;
            }
        }
        if let Some(src) = el.value().attr("src") {
            if src.contains(cdn_host) {
                out.push(src.to_string());
            }
        }
    }
    out
}

/// Widest candidate in a srcset, falling back to the first when no
/// width descriptors are present.
fn best_from_srcset(srcset: &str) -> Option<String> {
    let mut best: Option<(u32, &str)> = None;
    for candidate in srcset.split(',') {
        let mut parts = candidate.split_whitespace();
        let Some(url) = parts.next() else {
            continue;
        };
        let width = parts
            .next()
            .and_then(|descriptor| descriptor.strip_suffix('w'))
            .and_then(|digits| digits.parse().ok())
            .unwrap_or(0);
        if best.map_or(true, |(w, _)| width > w) {
            best = Some((width, url));
        }
    }
    best.map(|(_, url)| url.to_string())
}

fn absolutize(base: &str, candidate: &str) -> Option<String> {
    let candidate = candidate.trim();
    if candidate.is_empty() || candidate.starts_with("data:") {
        return None;
    }
    if let Ok(url) = Url::parse(candidate) {
        return Some(url.to_string());
    }
    Url::parse(base)
        .ok()?
        .join(candidate)
        .ok()
        .map(|url| url.to_string())
}

fn is_noise(url: &str) -> bool {
    let lower = url.to_lowercase();
    NOISE_MARKERS.iter().any(|marker| lower.contains(marker))
}

pub(crate) fn upgrade_resolution(url: &str) -> String {
    let re = Regex::new(r";s=\d+x\d+").unwrap();
    re.replace(url, format!(";s={FULL_SIZE}")).into_owned()
}

/// Same photo at different renditions must collapse to one entry, so the
/// key drops the size segment, the query string and letter case.
fn dedupe_key(url: &str) -> String {
    let bare = url.split(&['?', '#'][..]).next().unwrap_or(url);
    let re = Regex::new(r";s=\d+x\d+").unwrap();
    re.replace(bare, "").to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    const GALLERY_PAGE: &str = r#"<html><head>
        <script type="application/ld+json">
        {"@type":"Product","name":"x","image":[
            "https://frankfurt.apollo.olxcdn.com/v1/files/abc/image;s=216x152",
            {"@type":"ImageObject","contentUrl":"https://frankfurt.apollo.olxcdn.com/v1/files/def/image;s=216x152"}
        ]}
        </script></head><body>
        <div data-testid="image-galery">
            <picture>
                <source srcset="https://frankfurt.apollo.olxcdn.com/v1/files/abc/image;s=216x152 216w, https://frankfurt.apollo.olxcdn.com/v1/files/abc/image;s=644x461 644w">
                <img src="https://frankfurt.apollo.olxcdn.com/v1/files/abc/image;s=216x152">
            </picture>
        </div>
        <img aria-label="Imagine 3 din 7" src="https://frankfurt.apollo.olxcdn.com/v1/files/ghi/image;s=216x152">
        <img src="https://www.olx.ro/static/logo.png">
        </body></html>"#;

    fn page(html: &str) -> ListingPage {
        ListingPage::parse("https://www.olx.ro/d/oferta/test-IDx.html", html)
    }

    #[test]
    fn sources_merge_in_order_without_duplicates() {
        let urls = harvest(&page(GALLERY_PAGE), 3, "olxcdn.com");
        assert_eq!(
            urls,
            vec![
                "https://frankfurt.apollo.olxcdn.com/v1/files/abc/image;s=1000x700".to_string(),
                "https://frankfurt.apollo.olxcdn.com/v1/files/def/image;s=1000x700".to_string(),
                "https://frankfurt.apollo.olxcdn.com/v1/files/ghi/image;s=1000x700".to_string(),
            ]
        );
    }

    #[test]
    fn cdn_scan_runs_only_below_the_gallery_minimum() {
        let sparse = r#"<html><body>
            <img src="https://frankfurt.apollo.olxcdn.com/v1/files/only/image;s=216x152">
            <img src="https://frankfurt.apollo.olxcdn.com/v1/files/extra/image;s=216x152" class="related">
            <img src="https://www.olx.ro/static/sprite.png">
            </body></html>"#;
        let urls = harvest(&page(sparse), 3, "olxcdn.com");
        assert_eq!(
            urls,
            vec![
                "https://frankfurt.apollo.olxcdn.com/v1/files/only/image;s=1000x700".to_string(),
                "https://frankfurt.apollo.olxcdn.com/v1/files/extra/image;s=1000x700".to_string(),
            ]
        );

        // Above the minimum the backstop scan does not run at all.
        let urls = harvest(&page(GALLERY_PAGE), 2, "olxcdn.com");
        assert_eq!(urls.len(), 3);
    }

    #[test]
    fn srcset_prefers_the_widest_candidate() {
        assert_eq!(
            best_from_srcset("https://a.test/small.jpg 216w, https://a.test/big.jpg 644w").as_deref(),
            Some("https://a.test/big.jpg")
        );
        assert_eq!(
            best_from_srcset("https://a.test/only.jpg").as_deref(),
            Some("https://a.test/only.jpg")
        );
    }

    #[test]
    fn relative_urls_resolve_against_the_listing() {
        let html = r#"<html><body><div data-testid="image-galery">
            <img src="/v1/files/rel/image;s=216x152"></div></body></html>"#;
        let urls = harvest(&page(html), 1, "olxcdn.com");
        assert_eq!(urls, vec!["https://www.olx.ro/v1/files/rel/image;s=1000x700".to_string()]);
    }

    #[test]
    fn size_segment_is_rewritten_everywhere() {
        assert_eq!(
            upgrade_resolution("https://cdn.test/files/x/image;s=216x152"),
            "https://cdn.test/files/x/image;s=1000x700"
        );
        assert_eq!(upgrade_resolution("https://cdn.test/plain.jpg"), "https://cdn.test/plain.jpg");
    }
}
