//! Amount normalization for Spanish-formatted numbers.

use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

/// Parse a Spanish-formatted amount (`1.234,56`, `12,5 €`) into a decimal.
///
/// Every character other than digits, `,` and `.` is dropped, periods are
/// treated as thousands separators and the comma as the decimal mark. Any
/// input that does not yield a number parses as zero.
pub fn parse_locale_decimal(raw: &str) -> Decimal {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
        .collect();

    let normalized = cleaned.replace('.', "").replace(',', ".");
    if normalized.is_empty() {
        return Decimal::ZERO;
    }

    Decimal::from_str(&normalized).unwrap_or(Decimal::ZERO)
}

/// Format an amount with two decimals and a comma decimal mark (`1234,50`).
pub fn format_locale_amount(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    format!("{:.2}", rounded).replace('.', ",")
}
