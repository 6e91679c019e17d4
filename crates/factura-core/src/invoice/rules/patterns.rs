//! Common regex patterns for Spanish invoice text.

use lazy_static::lazy_static;
use regex::Regex;

/// Spanish amount capture: `1.234,56` or unseparated `1234,56`.
const AMOUNT: &str = r"(\d{1,3}(?:\.\d{3})+,\d{2}|\d+,\d{2})";

lazy_static! {
    // Labeled tax base
    pub static ref TAX_BASE: Regex = Regex::new(
        &format!(r"(?i)base\s+imponible[^\d]{{0,10}}?{AMOUNT}")
    ).unwrap();

    // Labeled VAT: IVA, I.V.A., I V A, optionally "(21%)"
    pub static ref VAT_AMOUNT: Regex = Regex::new(
        &format!(r"(?i)\b(?:i\.\s?v\.\s?a\.?|i\s+v\s+a|iva)(?:\s*\(?\s*\d{{1,2}}(?:[.,]\d{{1,2}})?\s*%\s*\)?)?[^\d]{{0,10}}?{AMOUNT}")
    ).unwrap();

    // Concept section markers
    pub static ref CONCEPT_MARKER: Regex = Regex::new(
        r"(?i)concepto"
    ).unwrap();

    pub static ref DESCRIPTION_MARKER: Regex = Regex::new(
        r"(?i)descripci[oó]n"
    ).unwrap();

    pub static ref TAX_BASE_MARKER: Regex = Regex::new(
        r"(?i)base\s+imponible"
    ).unwrap();
}
