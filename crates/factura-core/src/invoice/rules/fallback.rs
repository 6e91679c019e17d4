//! Free-text rescue of tax base, VAT and concept from raw document text.

use super::patterns::{CONCEPT_MARKER, DESCRIPTION_MARKER, TAX_BASE, TAX_BASE_MARKER, VAT_AMOUNT};

/// Values found in the raw text. Amounts are left exactly as matched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FallbackFields {
    pub tax_base: String,
    pub vat: String,
    pub concept: String,
}

/// Pattern-match the raw OCR text for the fields the service may omit.
pub fn extract_fallback(raw_text: &str) -> FallbackFields {
    FallbackFields {
        tax_base: first_capture(&TAX_BASE, raw_text),
        vat: first_capture(&VAT_AMOUNT, raw_text),
        concept: extract_concept(raw_text),
    }
}

fn first_capture(pattern: &regex::Regex, text: &str) -> String {
    pattern
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default()
}

/// Text after the first CONCEPTO marker (DESCRIPCIÓN when there is none),
/// cut at the next BASE IMPONIBLE. A label colon is not part of the concept.
fn extract_concept(text: &str) -> String {
    let Some(marker) = CONCEPT_MARKER
        .find(text)
        .or_else(|| DESCRIPTION_MARKER.find(text))
    else {
        return String::new();
    };

    let rest = &text[marker.end()..];
    let section = match TAX_BASE_MARKER.find(rest) {
        Some(end) => &rest[..end.start()],
        None => rest,
    };

    section.trim().trim_start_matches(':').trim().to_string()
}
