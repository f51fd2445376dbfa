use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Closed set of property kinds the catalog understands.
/// Unrecognized source vocabulary resolves to `Apartment`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PropertyKind {
    #[default]
    Apartment,
    House,
    Land,
    Commercial,
}

/// Sale vs. rent. Unrecognized source vocabulary resolves to `Sale`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionKind {
    #[default]
    Sale,
    Rent,
}

/// Listing currency. `Ron` is the source market's local currency and the
/// fallback when no currency can be extracted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Currency {
    Eur,
    #[default]
    Ron,
}

/// Building facts pulled from the listing's label/value attribute table.
/// Every field is optional; unmatched labels are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildingAttributes {
    pub heating: Option<String>,
    pub condition: Option<String>,
    pub available_from: Option<String>,
    pub deposit: Option<String>,
    pub building_type: Option<String>,
    pub building_material: Option<String>,
    pub year_built: Option<String>,
}

/// One listing reconstructed from a source page.
///
/// Partial extraction is normal: unresolved text fields stay empty,
/// unresolved numbers stay `0`/`None`. The two kind enums are always
/// resolved, so consumers never see an unclassified record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedListing {
    pub source_url: String,
    /// Opaque listing identifier parsed out of the source URL.
    pub source_id: String,
    pub title: String,
    pub price: i64,
    pub currency: Currency,
    pub property_kind: PropertyKind,
    pub transaction_kind: TransactionKind,
    pub locality: Option<String>,
    pub zone: Option<String>,
    /// Best-effort address fragment; often derived heuristically from the
    /// title when the page has no structured address.
    pub street: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Usable surface in square meters, 0.0 when unresolved.
    pub surface: f64,
    pub rooms: Option<u32>,
    pub floor: Option<i32>,
    pub total_floors: Option<u32>,
    pub description: String,
    /// Amenities in document order; duplicates are kept as found.
    pub features: Vec<String>,
    pub building: BuildingAttributes,
    /// Harvested gallery URLs; the first one is the conventional cover.
    pub image_urls: Vec<String>,
    pub scraped_at: DateTime<Utc>,
}

/// Terminal state of one URL in a batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImportStatus {
    Imported,
    DuplicateSkipped,
    Failed,
}

/// Per-URL result line of a batch run. Finalized exactly once, before the
/// orchestrator moves to the next URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportOutcome {
    pub url: String,
    pub status: ImportStatus,
    pub created_id: Option<String>,
    pub images_persisted: Option<usize>,
    pub error: Option<String>,
}

/// Aggregate result of a batch run. Duplicates count toward neither counter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportReport {
    pub imported: usize,
    pub failed: usize,
    pub outcomes: Vec<ImportOutcome>,
}

impl ImportReport {
    /// Appends an outcome and bumps the matching aggregate counter.
    pub fn record(&mut self, outcome: ImportOutcome) {
        match outcome.status {
            ImportStatus::Imported => self.imported += 1,
            ImportStatus::Failed => self.failed += 1,
            ImportStatus::DuplicateSkipped => {}
        }
        self.outcomes.push(outcome);
    }
}

/// One re-hosted listing image. `position` is the harvest index, so gaps
/// reveal images that failed to persist; `primary` marks the cover image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredImage {
    pub url: String,
    pub position: usize,
    pub primary: bool,
}
