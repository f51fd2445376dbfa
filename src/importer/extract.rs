//! Field extraction over a captured listing page.
//!
//! Every field is resolved through its own probe chain: structured-data
//! payloads first, then meta tags, then known DOM nodes, then free-text
//! patterns. Probes run in trust order and the first one producing a value
//! wins, so a partial page degrades field by field instead of all at once.

use regex::Regex;
use scraper::{Html, Selector};
use serde_json::Value;

use crate::importer::normalize::{self, fold_diacritics};
use crate::models::{BuildingAttributes, Currency, PropertyKind, TransactionKind};

/// Structured-data types that can describe the listing itself. Anything
/// else in the page's JSON-LD (search widgets, org cards) is ignored.
const PAYLOAD_TYPES: &[&str] = &[
    "Product",
    "Offer",
    "Apartment",
    "House",
    "Residence",
    "RealEstateListing",
    "Place",
];

/// Attribute labels consumed by dedicated fields; everything else in the
/// parameter grid is carried through as a free-form feature.
const CONSUMED_LABELS: &[&str] = &[
    "incalzire",
    "stare",
    "disponibil",
    "garantie",
    "tip imobil",
    "material",
    "an constructie",
    "camere",
    "suprafata",
    "etaj",
];

/// One entry from the page's parameter grid, split at the first colon.
/// Flag-style entries ("Balcon") carry no value.
#[derive(Debug, Clone)]
pub struct AttributeEntry {
    pub label: String,
    pub value: Option<String>,
}

/// A parsed listing page with its structured data, breadcrumb trail and
/// parameter grid pre-collected. Holds the DOM, so it must stay on one
/// task and never live across an await point.
pub struct ListingPage {
    pub url: String,
    pub(crate) doc: Html,
    pub(crate) payloads: Vec<Value>,
    pub(crate) breadcrumbs: Vec<String>,
    pub(crate) attributes: Vec<AttributeEntry>,
}

impl ListingPage {
    pub fn parse(url: &str, html: &str) -> Self {
        let doc = Html::parse_document(html);
        let payloads = collect_payloads(&doc);
        let breadcrumbs = collect_breadcrumbs(&doc);
        let attributes = collect_attributes(&doc);
        Self {
            url: url.to_string(),
            doc,
            payloads,
            breadcrumbs,
            attributes,
        }
    }

    /// First whitelisted payload carrying `key` as a non-empty scalar.
    fn payload_str(&self, key: &str) -> Option<String> {
        self.payloads
            .iter()
            .find_map(|payload| payload.get(key).and_then(value_to_string))
    }

    /// Looks `key` up inside an `offers` block, whether the source nested
    /// a single offer object or a list of them.
    fn offer_str(&self, key: &str) -> Option<String> {
        self.payloads.iter().find_map(|payload| {
            let offers = payload.get("offers")?;
            let offer = match offers.as_array() {
                Some(list) => list.first()?,
                None => offers,
            };
            offer.get(key).and_then(value_to_string)
        })
    }

    fn address_str(&self, key: &str) -> Option<String> {
        self.payloads
            .iter()
            .find_map(|payload| payload.get("address")?.get(key).and_then(value_to_string))
    }

    fn meta(&self, key: &str) -> Option<String> {
        let selector =
            Selector::parse(&format!("meta[property=\"{key}\"], meta[name=\"{key}\"]")).ok()?;
        self.doc
            .select(&selector)
            .find_map(|el| el.value().attr("content"))
            .map(str::trim)
            .filter(|content| !content.is_empty())
            .map(str::to_string)
    }

    fn select_text(&self, css: &str) -> Option<String> {
        let selector = Selector::parse(css).ok()?;
        let el = self.doc.select(&selector).next()?;
        let text = collapse_ws(el.text());
        (!text.is_empty()).then_some(text)
    }

    fn attribute_value(&self, label_needle: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|entry| fold_lower(&entry.label).contains(label_needle))
            .and_then(|entry| entry.value.as_deref())
    }
}

type Probe<T> = fn(&ListingPage) -> Option<T>;

fn first_hit<T>(page: &ListingPage, probes: &[Probe<T>]) -> Option<T> {
    probes.iter().find_map(|probe| probe(page))
}

// ---- title ----

const TITLE_PROBES: &[Probe<String>] = &[
    |p| p.payload_str("name"),
    |p| p.meta("og:title").map(|t| strip_portal_suffix(&t)),
    |p| p.select_text("h1[data-testid=\"ad-title\"], h1"),
];

pub fn title(page: &ListingPage) -> Option<String> {
    first_hit(page, TITLE_PROBES)
}

// ---- price and currency ----

const PRICE_PROBES: &[Probe<i64>] = &[
    |p| p.payload_str("price").and_then(|t| parse_amount(&t)),
    |p| p.offer_str("price").and_then(|t| parse_amount(&t)),
    |p| p.meta("product:price:amount").and_then(|t| parse_amount(&t)),
    |p| {
        p.select_text("[data-testid=\"ad-price-container\"]")
            .and_then(|t| parse_amount(&t))
    },
    |p| {
        let text = fold_lower(&free_text(p));
        let re = Regex::new(r"(\d[\d\s.,]*)\s*(?:€|eur|lei|ron)").unwrap();
        re.captures(&text).and_then(|c| parse_amount(&c[1]))
    },
];

pub fn price(page: &ListingPage) -> Option<i64> {
    first_hit(page, PRICE_PROBES)
}

const CURRENCY_PROBES: &[Probe<Currency>] = &[
    |p| p.offer_str("priceCurrency").and_then(|t| normalize::match_currency(&t)),
    |p| p.payload_str("priceCurrency").and_then(|t| normalize::match_currency(&t)),
    |p| {
        p.meta("product:price:currency")
            .and_then(|t| normalize::match_currency(&t))
    },
    |p| {
        p.select_text("[data-testid=\"ad-price-container\"]")
            .and_then(|t| normalize::match_currency(&t))
    },
    |p| normalize::match_currency(&free_text(p)),
];

pub fn currency(page: &ListingPage) -> Currency {
    first_hit(page, CURRENCY_PROBES).unwrap_or_default()
}

// ---- description ----

const DESCRIPTION_PROBES: &[Probe<String>] = &[
    |p| p.payload_str("description"),
    |p| p.meta("og:description"),
    |p| p.select_text("[data-testid=\"ad_description\"], [data-testid=\"description\"]"),
];

pub fn description(page: &ListingPage) -> Option<String> {
    first_hit(page, DESCRIPTION_PROBES)
}

// ---- rooms, surface, floor ----

const ROOM_PROBES: &[Probe<u32>] = &[
    |p| {
        p.payload_str("numberOfRooms")
            .and_then(|value| leading_number(&value))
            .map(|n| n as u32)
    },
    |p| {
        let value = p.attribute_value("camere")?;
        leading_number(value)
            .map(|n| n as u32)
            .or_else(|| normalize::rooms_from_words(value))
    },
    |p| {
        let text = fold_lower(&free_text(p));
        let re = Regex::new(r"(\d+)\s*camer").unwrap();
        re.captures(&text).and_then(|c| c[1].parse().ok())
    },
    |p| normalize::rooms_from_words(&free_text(p)),
];

pub fn rooms(page: &ListingPage) -> Option<u32> {
    first_hit(page, ROOM_PROBES)
}

const SURFACE_PROBES: &[Probe<f64>] = &[
    |p| p.attribute_value("suprafata").and_then(leading_decimal),
    |p| {
        let text = fold_lower(&free_text(p));
        let re = Regex::new(r"(\d+(?:[.,]\d+)?)\s*(?:mp\b|m2\b|m²)").unwrap();
        re.captures(&text)
            .and_then(|c| c[1].replace(',', ".").parse().ok())
    },
];

pub fn surface(page: &ListingPage) -> Option<f64> {
    first_hit(page, SURFACE_PROBES)
}

const FLOOR_PROBES: &[Probe<(i32, Option<u32>)>] = &[
    |p| p.attribute_value("etaj").and_then(parse_floor),
    |p| {
        let text = fold_lower(&free_text(p));
        let re = Regex::new(r"etaj(?:ul)?\s*\d+(?:\s*(?:din|/)\s*\d+)?").unwrap();
        re.find(&text)
            .and_then(|m| parse_floor(m.as_str()))
            .or_else(|| {
                (text.contains("parter") || text.contains("demisol"))
                    .then(|| parse_floor(&text))
                    .flatten()
            })
    },
];

/// Floor of the unit and, when the source spells it out, the building's
/// total floor count.
pub fn floor(page: &ListingPage) -> Option<(i32, Option<u32>)> {
    first_hit(page, FLOOR_PROBES)
}

// ---- location ----

const LOCALITY_PROBES: &[Probe<String>] = &[
    |p| p.address_str("addressLocality"),
    |p| {
        dash_crumb(p).map(|(locality, _)| locality)
    },
    |p| {
        p.breadcrumbs
            .iter()
            .rev()
            .find(|crumb| looks_like_place(crumb))
            .cloned()
    },
    |p| {
        let text = fold_diacritics(&free_text(p));
        let re = Regex::new(r"(?i)judetul\s+([A-Za-z][A-Za-z -]*?)(?:\s*[,.;]|$)").unwrap();
        re.captures(&text).map(|c| c[1].trim().to_string())
    },
];

pub fn locality(page: &ListingPage) -> Option<String> {
    first_hit(page, LOCALITY_PROBES)
}

const ZONE_PROBES: &[Probe<String>] = &[
    |p| dash_crumb(p).map(|(_, zone)| zone),
    |p| {
        let text = fold_diacritics(&free_text(p));
        let re = Regex::new(r"(?i)zona\s+([A-Za-z][A-Za-z0-9 ]*?)(?:\s+judet|\s*[,.;]|$)").unwrap();
        re.captures(&text).map(|c| c[1].trim().to_string())
    },
];

pub fn zone(page: &ListingPage) -> Option<String> {
    first_hit(page, ZONE_PROBES)
}

const STREET_PROBES: &[Probe<String>] = &[
    |p| p.address_str("streetAddress"),
    |p| {
        let text = fold_diacritics(&free_text(p));
        let re = Regex::new(
            r"(?i)\b(?:strada|str\.|bulevardul|bd\.|calea|aleea)\s+([A-Za-z0-9][^,.;]{0,50})",
        )
        .unwrap();
        re.captures(&text).map(|c| c[1].trim().to_string())
    },
    |p| title(p).and_then(|t| street_from_title(&t)),
];

/// Leading words a title spends on the transaction and the kind before it
/// gets to the address, if it carries one at all.
const TITLE_NOISE_TOKENS: &[&str] = &[
    "vand",
    "vanzare",
    "vanzari",
    "inchiriez",
    "inchiriere",
    "inchiriat",
    "chirie",
    "de",
    "apartament",
    "garsoniera",
    "casa",
    "vila",
    "teren",
    "intravilan",
    "spatiu",
    "comercial",
    "birou",
    "hala",
    "camera",
    "camere",
    "mp",
    "m2",
    "suprafata",
    "decomandat",
    "semidecomandat",
    "mobilat",
    "utilat",
    "proprietar",
    "direct",
    "urgent",
];

/// Last-resort address fragment: drop the leading transaction/kind words
/// and the zone/county/floor clauses, keep whatever is left. Most titles
/// reduce to nothing here.
fn street_from_title(title: &str) -> Option<String> {
    let folded = fold_diacritics(title);
    let stop = Regex::new(r"(?i)\b(?:zona|judetul|judet|etaj|parter|demisol)\b").unwrap();
    let head = match stop.find(&folded) {
        Some(m) => &folded[..m.start()],
        None => folded.as_str(),
    };
    let mut words: Vec<&str> = head.split_whitespace().collect();
    while let Some(first) = words.first() {
        let token: String = first
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        if token.is_empty()
            || token.chars().all(|c| c.is_ascii_digit())
            || TITLE_NOISE_TOKENS.contains(&token.as_str())
        {
            words.remove(0);
        } else {
            break;
        }
    }
    if words.is_empty() {
        return None;
    }
    let fragment = words
        .join(" ")
        .trim_matches(|c: char| c.is_whitespace() || c == ',' || c == '-' || c == '.')
        .to_string();
    (fragment.chars().any(char::is_alphabetic)).then_some(fragment)
}

pub fn street(page: &ListingPage) -> Option<String> {
    first_hit(page, STREET_PROBES)
}

/// Coordinates come only from structured data; free text is never probed
/// for them.
pub fn coordinates(page: &ListingPage) -> Option<(f64, f64)> {
    page.payloads.iter().find_map(|payload| {
        let geo = payload.get("geo")?;
        let lat = value_to_f64(geo.get("latitude")?)?;
        let lon = value_to_f64(geo.get("longitude")?)?;
        Some((lat, lon))
    })
}

// ---- catalog fields ----

/// Breadcrumb categories outrank title text, which outranks the URL slug.
/// Each layer is consulted only when the previous one recognized nothing.
pub fn transaction(page: &ListingPage) -> TransactionKind {
    normalize::match_transaction(&page.breadcrumbs.join(" "))
        .or_else(|| title(page).and_then(|t| normalize::match_transaction(&t)))
        .or_else(|| normalize::match_transaction(&page.url))
        .unwrap_or_default()
}

pub fn property_kind(page: &ListingPage) -> PropertyKind {
    normalize::match_property_kind(&page.breadcrumbs.join(" "))
        .or_else(|| normalize::match_property_kind(&free_text(page)))
        .unwrap_or_default()
}

// ---- parameter grid ----

pub fn building(page: &ListingPage) -> BuildingAttributes {
    let mut building = BuildingAttributes::default();
    for entry in &page.attributes {
        let Some(value) = entry.value.as_deref() else {
            continue;
        };
        let label = fold_lower(&entry.label);
        let slot = if label.contains("incalzire") {
            &mut building.heating
        } else if label.contains("stare") {
            &mut building.condition
        } else if label.contains("disponibil") {
            &mut building.available_from
        } else if label.contains("garantie") {
            &mut building.deposit
        } else if label.contains("tip imobil") {
            &mut building.building_type
        } else if label.contains("material") {
            &mut building.building_material
        } else if label.contains("an constructie") {
            &mut building.year_built
        } else {
            continue;
        };
        if slot.is_none() {
            *slot = Some(value.to_string());
        }
    }
    building
}

/// Parameter-grid entries not claimed by a dedicated field, in page order.
/// Repeats stay in; the grid is carried through as found.
pub fn features(page: &ListingPage) -> Vec<String> {
    page.attributes
        .iter()
        .filter(|entry| {
            let label = fold_lower(&entry.label);
            !CONSUMED_LABELS.iter().any(|needle| label.contains(needle))
        })
        .map(|entry| match &entry.value {
            Some(value) => format!("{}: {}", entry.label, value),
            None => entry.label.clone(),
        })
        .collect()
}

// ---- identifiers ----

/// The source's own listing id, taken from the `-ID<token>.html` URL tail.
/// URLs without one fall back to the last path segment so the id stays
/// stable for the same page.
pub fn source_id(url: &str) -> String {
    let re = Regex::new(r"-ID([A-Za-z0-9]+)\.html").unwrap();
    if let Some(caps) = re.captures(url) {
        return caps[1].to_string();
    }
    url.trim_end_matches('/')
        .rsplit('/')
        .next()
        .map(|segment| segment.trim_end_matches(".html"))
        .filter(|segment| !segment.is_empty())
        .unwrap_or(url)
        .to_string()
}

// ---- page pre-collection ----

fn collect_payloads(doc: &Html) -> Vec<Value> {
    let selector = Selector::parse("script[type=\"application/ld+json\"]").unwrap();
    let mut payloads = Vec::new();
    for node in doc.select(&selector) {
        let raw: String = node.text().collect();
        let Ok(value) = serde_json::from_str::<Value>(&raw) else {
            continue;
        };
        flatten_payload(value, &mut payloads);
    }
    payloads
}

/// Unwraps top-level arrays and `@graph` containers, keeping only the
/// whitelisted types.
fn flatten_payload(value: Value, out: &mut Vec<Value>) {
    match value {
        Value::Array(items) => {
            for item in items {
                flatten_payload(item, out);
            }
        }
        Value::Object(mut map) => {
            if let Some(graph) = map.remove("@graph") {
                flatten_payload(graph, out);
            }
            if type_matches(map.get("@type")) {
                out.push(Value::Object(map));
            }
        }
        _ => {}
    }
}

fn type_matches(ty: Option<&Value>) -> bool {
    match ty {
        Some(Value::String(name)) => PAYLOAD_TYPES.contains(&name.as_str()),
        Some(Value::Array(names)) => names
            .iter()
            .any(|name| name.as_str().is_some_and(|n| PAYLOAD_TYPES.contains(&n))),
        _ => false,
    }
}

fn collect_breadcrumbs(doc: &Html) -> Vec<String> {
    for css in ["[data-testid=\"breadcrumbs\"] a", "nav ol li a"] {
        let selector = Selector::parse(css).unwrap();
        let crumbs: Vec<String> = doc
            .select(&selector)
            .map(|el| collapse_ws(el.text()))
            .filter(|text| !text.is_empty())
            .collect();
        if !crumbs.is_empty() {
            return crumbs;
        }
    }
    Vec::new()
}

fn collect_attributes(doc: &Html) -> Vec<AttributeEntry> {
    for css in [
        "[data-testid=\"ad-parameters-container\"] li, [data-testid=\"ad-parameters-container\"] tr",
        "[data-testid=\"ad-parameters-container\"] p",
    ] {
        let entries = scan_entries(doc, css);
        if !entries.is_empty() {
            return entries;
        }
    }
    // Markup without the parameter container still tends to render the
    // grid as list items with "Label: Value" text.
    scan_entries(doc, "ul li")
        .into_iter()
        .filter(|entry| entry.value.is_some())
        .collect()
}

fn scan_entries(doc: &Html, css: &str) -> Vec<AttributeEntry> {
    let selector = Selector::parse(css).unwrap();
    doc.select(&selector).filter_map(entry_from).collect()
}

/// One grid element into a label/value entry. Rows rendered as two text
/// cells pair directly; single-text entries split at the first colon.
fn entry_from(el: scraper::ElementRef) -> Option<AttributeEntry> {
    let cells: Vec<String> = el
        .text()
        .map(str::trim)
        .filter(|chunk| !chunk.is_empty())
        .map(|chunk| chunk.split_whitespace().collect::<Vec<_>>().join(" "))
        .collect();
    if cells.len() == 2 && !cells[0].contains(':') {
        return Some(AttributeEntry {
            label: cells[0].clone(),
            value: Some(cells[1].clone()),
        });
    }
    split_entry(&cells.join(" "))
}

fn split_entry(text: &str) -> Option<AttributeEntry> {
    if text.is_empty() {
        return None;
    }
    match text.split_once(':') {
        Some((label, value)) if !value.trim().is_empty() => Some(AttributeEntry {
            label: label.trim().to_string(),
            value: Some(value.trim().to_string()),
        }),
        Some((label, _)) => Some(AttributeEntry {
            label: label.trim().to_string(),
            value: None,
        }),
        None => Some(AttributeEntry {
            label: text.to_string(),
            value: None,
        }),
    }
}

// ---- text and number parsing ----

/// Scalar out of a payload value. Sources emit numbers both as JSON
/// numbers and as strings, so both are accepted.
fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => {
            let text = text.trim();
            (!text.is_empty()).then(|| text.to_string())
        }
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn value_to_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn fold_lower(text: &str) -> String {
    fold_diacritics(text).to_lowercase()
}

fn collapse_ws<'a>(parts: impl Iterator<Item = &'a str>) -> String {
    parts
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Title plus description, for the free-text probes at the end of chains.
fn free_text(page: &ListingPage) -> String {
    let title = first_hit(page, TITLE_PROBES).unwrap_or_default();
    let description = first_hit(page, DESCRIPTION_PROBES).unwrap_or_default();
    format!("{title} {description}")
}

fn strip_portal_suffix(title: &str) -> String {
    let trimmed = title.trim();
    for suffix in [" - OLX.ro", " | OLX.ro"] {
        if let Some(stripped) = trimmed.strip_suffix(suffix) {
            return stripped.trim_end().to_string();
        }
    }
    trimmed.to_string()
}

/// Integer amount out of a formatted price. Grouping spaces and dots are
/// dropped; a trailing one-or-two digit fraction is truncated.
pub(crate) fn parse_amount(text: &str) -> Option<i64> {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    let mut integral = compact.as_str();
    if let Some(pos) = compact.rfind(|c| c == ',' || c == '.') {
        let fraction = &compact[pos + 1..];
        if (1..=2).contains(&fraction.len()) && fraction.chars().all(|c| c.is_ascii_digit()) {
            integral = &compact[..pos];
        }
    }
    let digits: String = integral.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

fn leading_number(text: &str) -> Option<i64> {
    let digits: String = text
        .trim_start()
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().ok()
}

fn leading_decimal(text: &str) -> Option<f64> {
    let re = Regex::new(r"^\s*(\d+(?:[.,]\d+)?)").unwrap();
    re.captures(text)
        .and_then(|c| c[1].replace(',', ".").parse().ok())
}

/// Floor wording: "Parter" is ground level, "Demisol" sits below it, and
/// "Etaj 3 din 8" or "3/8" carry the building's total floor count.
pub(crate) fn parse_floor(text: &str) -> Option<(i32, Option<u32>)> {
    let folded = fold_lower(text);
    let total = Regex::new(r"(?:din|/)\s*(\d+)")
        .unwrap()
        .captures(&folded)
        .and_then(|c| c[1].parse().ok());
    if folded.contains("demisol") {
        return Some((-1, total));
    }
    if folded.contains("parter") {
        return Some((0, total));
    }
    let level = Regex::new(r"(\d+)")
        .unwrap()
        .captures(&folded)
        .and_then(|c| c[1].parse().ok())?;
    Some((level, total))
}

/// A trailing "Locality - Zone" breadcrumb, split into its two halves.
fn dash_crumb(page: &ListingPage) -> Option<(String, String)> {
    page.breadcrumbs.iter().rev().find_map(|crumb| {
        let (locality, zone) = crumb.split_once(" - ")?;
        let locality = locality.trim();
        let zone = zone.trim();
        if locality.is_empty() || zone.is_empty() || !looks_like_place(crumb) {
            return None;
        }
        Some((locality.to_string(), zone.to_string()))
    })
}

fn looks_like_place(crumb: &str) -> bool {
    let folded = fold_lower(crumb);
    normalize::match_property_kind(crumb).is_none()
        && normalize::match_transaction(crumb).is_none()
        && !folded.contains("imobiliare")
        && !folded.contains("anunturi")
        && !folded.contains("olx")
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_PAGE: &str = r#"<html><head>
        <title>Inchiriez apartament 2 camere zona Crang judetul Buzau</title>
        <meta property="og:title" content="Inchiriez apartament 2 camere zona Crang judetul Buzau - OLX.ro">
        <meta property="og:description" content="meta description">
        <script type="application/ld+json">
        {"@context":"https://schema.org","@graph":[
            {"@type":"BreadcrumbList","itemListElement":[]},
            {"@type":"Product",
             "name":"Inchiriez apartament 2 camere zona Crang judetul Buzau",
             "description":"Apartament luminos, etaj 2 din 4, suprafata 54 mp.",
             "offers":{"@type":"Offer","price":"350","priceCurrency":"EUR"}}
        ]}
        </script>
        </head><body>
        <ol data-testid="breadcrumbs">
            <li><a href="/">Imobiliare</a></li>
            <li><a href="/ap">Apartamente - Garsoniere de inchiriat</a></li>
            <li><a href="/bz">Buzau - Crang</a></li>
        </ol>
        <h1 data-testid="ad-title">Inchiriez apartament 2 camere zona Crang judetul Buzau</h1>
        <div data-testid="ad-price-container"><h3>350 €</h3></div>
        <div data-testid="ad-parameters-container">
            <p>Oferit de: Persoana fizica</p>
            <p>Numar camere: 2</p>
            <p>Suprafata utila: 54 m²</p>
            <p>Etaj: 2 din 4</p>
            <p>Incalzire: Centrala proprie</p>
            <p>An constructie: 1984</p>
            <p>Balcon</p>
        </div>
        <div data-testid="ad_description">Apartament luminos, etaj 2 din 4, suprafata 54 mp.</div>
        </body></html>"#;

    const BARE_PAGE: &str = r#"<html><head>
        <meta property="og:title" content="Vand teren intravilan 500 mp - OLX.ro">
        <meta property="product:price:amount" content="15.000">
        <meta property="product:price:currency" content="EUR">
        </head><body><h1>Vand teren intravilan 500 mp</h1></body></html>"#;

    fn full_page() -> ListingPage {
        ListingPage::parse(
            "https://www.olx.ro/d/oferta/inchiriez-apartament-2-camere-IDgkXyz.html",
            FULL_PAGE,
        )
    }

    #[test]
    fn payload_outranks_meta_and_dom() {
        let page = full_page();
        assert_eq!(
            title(&page).as_deref(),
            Some("Inchiriez apartament 2 camere zona Crang judetul Buzau")
        );
        assert_eq!(price(&page), Some(350));
        assert_eq!(currency(&page), Currency::Eur);
        assert_eq!(
            description(&page).as_deref(),
            Some("Apartament luminos, etaj 2 din 4, suprafata 54 mp.")
        );
    }

    #[test]
    fn meta_fills_in_when_structured_data_is_missing() {
        let page = ListingPage::parse("https://www.olx.ro/d/oferta/vand-teren-IDabc12.html", BARE_PAGE);
        assert_eq!(title(&page).as_deref(), Some("Vand teren intravilan 500 mp"));
        assert_eq!(price(&page), Some(15_000));
        assert_eq!(currency(&page), Currency::Eur);
        assert_eq!(property_kind(&page), PropertyKind::Land);
        assert_eq!(transaction(&page), TransactionKind::Sale);
    }

    #[test]
    fn parameter_grid_feeds_numeric_fields() {
        let page = full_page();
        assert_eq!(rooms(&page), Some(2));
        assert_eq!(surface(&page), Some(54.0));
        assert_eq!(floor(&page), Some((2, Some(4))));
    }

    #[test]
    fn building_attributes_and_features_split_the_grid() {
        let page = full_page();
        let building = building(&page);
        assert_eq!(building.heating.as_deref(), Some("Centrala proprie"));
        assert_eq!(building.year_built.as_deref(), Some("1984"));
        assert_eq!(building.condition, None);
        assert_eq!(
            features(&page),
            vec!["Oferit de: Persoana fizica".to_string(), "Balcon".to_string()]
        );
    }

    #[test]
    fn location_comes_from_the_trailing_breadcrumb() {
        let page = full_page();
        assert_eq!(locality(&page).as_deref(), Some("Buzau"));
        assert_eq!(zone(&page).as_deref(), Some("Crang"));
        assert_eq!(street(&page), None);
    }

    #[test]
    fn bare_title_resolves_catalog_rooms_and_zone() {
        // A page with no structured data and no parameter grid; the title
        // alone has to carry the classification.
        let html = r#"<html><head>
            <meta property="og:title" content="Inchiriez apartament 2 camere zona Crang judetul Buzau">
            </head><body></body></html>"#;
        let page = ListingPage::parse("https://example.test/x", html);
        assert_eq!(transaction(&page), TransactionKind::Rent);
        assert_eq!(property_kind(&page), PropertyKind::Apartment);
        assert_eq!(rooms(&page), Some(2));
        assert_eq!(zone(&page).as_deref(), Some("Crang"));
        assert_eq!(street(&page), None);
    }

    #[test]
    fn two_cell_grid_rows_pair_without_colons() {
        let html = r#"<html><body><div data-testid="ad-parameters-container"><ul>
            <li><span>Incalzire</span><span>Centrala pe gaz</span></li>
            <li><span>Etaj</span><span>Parter</span></li>
            </ul></div></body></html>"#;
        let page = ListingPage::parse("https://example.test/x", html);
        assert_eq!(building(&page).heating.as_deref(), Some("Centrala pe gaz"));
        assert_eq!(floor(&page), Some((0, None)));
    }

    #[test]
    fn street_heuristic_keeps_only_a_leftover_fragment() {
        assert_eq!(street_from_title("Inchiriez apartament 2 camere zona Crang judetul Buzau"), None);
        assert_eq!(street_from_title("Vand teren intravilan 500 mp"), None);
        assert_eq!(
            street_from_title("Vand apartament Aleea Parcului 3, etaj 2").as_deref(),
            Some("Aleea Parcului 3")
        );
    }

    #[test]
    fn zone_pattern_covers_pages_without_breadcrumbs() {
        let page = ListingPage::parse("https://example.test/x", BARE_PAGE);
        assert_eq!(zone(&page), None);
        let html = r#"<html><head><meta property="og:title" content="Apartament zona Crâng judetul Buzau"></head><body></body></html>"#;
        let page = ListingPage::parse("https://example.test/x", html);
        assert_eq!(zone(&page).as_deref(), Some("Crang"));
        assert_eq!(locality(&page).as_deref(), Some("Buzau"));
    }

    #[test]
    fn catalog_layers_fall_through_in_order() {
        let page = full_page();
        assert_eq!(transaction(&page), TransactionKind::Rent);
        assert_eq!(property_kind(&page), PropertyKind::Apartment);
        let html = r#"<html><body><h1>Proprietate deosebita</h1></body></html>"#;
        let page = ListingPage::parse("https://www.olx.ro/d/oferta/de-inchiriat-IDx.html", html);
        assert_eq!(transaction(&page), TransactionKind::Rent);
        assert_eq!(property_kind(&page), PropertyKind::Apartment);
    }

    #[test]
    fn amounts_drop_grouping_and_truncate_fractions() {
        assert_eq!(parse_amount("59 900"), Some(59_900));
        assert_eq!(parse_amount("59.900"), Some(59_900));
        assert_eq!(parse_amount("1.234,56"), Some(1_234));
        assert_eq!(parse_amount("350"), Some(350));
        assert_eq!(parse_amount("fara pret"), None);
    }

    #[test]
    fn floor_wording_variants_parse() {
        assert_eq!(parse_floor("Etaj 3 din 8"), Some((3, Some(8))));
        assert_eq!(parse_floor("3/8"), Some((3, Some(8))));
        assert_eq!(parse_floor("Parter"), Some((0, None)));
        assert_eq!(parse_floor("Parter din 4"), Some((0, Some(4))));
        assert_eq!(parse_floor("Demisol"), Some((-1, None)));
        assert_eq!(parse_floor("nespecificat"), None);
    }

    #[test]
    fn source_id_prefers_the_id_token() {
        assert_eq!(
            source_id("https://www.olx.ro/d/oferta/apartament-2-camere-IDgkXyz.html"),
            "gkXyz"
        );
        assert_eq!(
            source_id("https://www.olx.ro/d/oferta/apartament-fara-token/"),
            "apartament-fara-token"
        );
    }

    #[test]
    fn coordinates_require_structured_data() {
        let html = r#"<html><head><script type="application/ld+json">
            {"@type":"Place","geo":{"latitude":"45.15","longitude":26.82}}
        </script></head><body>44.0 26.0</body></html>"#;
        let page = ListingPage::parse("https://example.test/x", html);
        assert_eq!(coordinates(&page), Some((45.15, 26.82)));
        let page = ListingPage::parse("https://example.test/x", "<html><body>44.0 26.0</body></html>");
        assert_eq!(coordinates(&page), None);
    }
}
