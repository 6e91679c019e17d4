//! Invoice field reconciliation.
//!
//! Structured entities from the extraction service are merged through the
//! dispatch table in [`fields`]; amounts, tax base and concept still missing
//! afterwards are rescued from the raw document text by [`rules::fallback`].

pub mod fields;
mod reconciler;
pub mod rules;

pub use fields::{Field, Handler, MergePolicy};
pub use reconciler::{reconcile, Reconciliation, Reconciler, CONCEPT_SEPARATOR};
pub use rules::{extract_fallback, format_locale_amount, parse_locale_decimal, FallbackFields};
