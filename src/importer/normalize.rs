//! Source-vocabulary mapping into the closed catalog enums.
//!
//! Everything here is a pure function over text the extraction engine pulled
//! off the page. The `match_*` variants report "not recognized" as `None` so
//! layered fallbacks can keep probing; the plain variants fall back to the
//! catalog defaults.

use crate::models::{Currency, PropertyKind, TransactionKind};

/// Term tables per property kind, in specificity order. A listing
/// categorized under both a generic and a specific kind must resolve to the
/// specific one, so land beats house beats commercial beats apartment.
const KIND_TERMS: &[(PropertyKind, &[&str])] = &[
    (PropertyKind::Land, &["teren"]),
    (PropertyKind::House, &["casa", "case", "vila", "vile"]),
    (PropertyKind::Commercial, &["spatiu", "spatii", "birou", "hala"]),
    (PropertyKind::Apartment, &["apartament", "garsonier"]),
];

const RENT_TERMS: &[&str] = &["inchiri", "chirie"];
const SALE_TERMS: &[&str] = &["vanzare", "vand"];

/// Spelled-out room counts as they appear in titles and descriptions.
const ROOM_WORDS: &[(&str, u32)] = &[
    ("garsonier", 1),
    ("o camera", 1),
    ("doua camere", 2),
    ("trei camere", 3),
    ("patru camere", 4),
    ("cinci camere", 5),
];

/// Maps Romanian diacritics (both modern and legacy cedilla forms) to their
/// ASCII bases so vocabulary matching tolerates either spelling.
pub fn fold_diacritics(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            'ă' | 'â' => 'a',
            'î' => 'i',
            'ș' | 'ş' => 's',
            'ț' | 'ţ' => 't',
            'Ă' | 'Â' => 'A',
            'Î' => 'I',
            'Ș' | 'Ş' => 'S',
            'Ț' | 'Ţ' => 'T',
            _ => c,
        })
        .collect()
}

fn fold_lower(text: &str) -> String {
    fold_diacritics(text).to_lowercase()
}

/// Strict property-kind match; `None` when no table term is present.
pub fn match_property_kind(text: &str) -> Option<PropertyKind> {
    let text = fold_lower(text);
    for (kind, terms) in KIND_TERMS {
        if terms.iter().any(|term| text.contains(term)) {
            return Some(*kind);
        }
    }
    None
}

/// Property kind with the documented `Apartment` fallback.
pub fn property_kind(text: &str) -> PropertyKind {
    match_property_kind(text).unwrap_or_default()
}

/// Strict transaction match; `None` when no table term is present.
/// Rent is probed first so mixed text ("vand sau inchiriez") reads as rent.
pub fn match_transaction(text: &str) -> Option<TransactionKind> {
    let text = fold_lower(text);
    if RENT_TERMS.iter().any(|term| text.contains(term)) {
        return Some(TransactionKind::Rent);
    }
    if SALE_TERMS.iter().any(|term| text.contains(term)) {
        return Some(TransactionKind::Sale);
    }
    None
}

/// Transaction kind with the documented `Sale` fallback.
pub fn transaction_kind(text: &str) -> TransactionKind {
    match_transaction(text).unwrap_or_default()
}

/// Strict currency match over a price string or an ISO code.
pub fn match_currency(text: &str) -> Option<Currency> {
    let text = fold_lower(text);
    if text.contains('€') || text.contains("eur") {
        return Some(Currency::Eur);
    }
    if text.contains("lei") || text.contains("ron") {
        return Some(Currency::Ron);
    }
    None
}

/// Currency with the documented local-currency fallback.
pub fn currency(text: &str) -> Currency {
    match_currency(text).unwrap_or_default()
}

/// Room count from spelled-out Romanian forms ("doua camere", "garsoniera").
/// Digit forms are handled by the extraction engine's pattern pass.
pub fn rooms_from_words(text: &str) -> Option<u32> {
    let text = fold_lower(text);
    ROOM_WORDS
        .iter()
        .find(|(term, _)| text.contains(term))
        .map(|(_, count)| *count)
}
