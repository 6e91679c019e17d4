//! Rule-based helpers for Spanish invoice text.

pub mod amounts;
pub mod fallback;
pub mod patterns;

pub use amounts::{format_locale_amount, parse_locale_decimal};
pub use fallback::{extract_fallback, FallbackFields};
