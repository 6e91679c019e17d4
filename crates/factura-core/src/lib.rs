//! Core library for Spanish supplier invoice processing.
//!
//! This crate provides:
//! - Entity models matching the document understanding service output
//! - Spanish amount normalization (`1.234,56`)
//! - Entity reconciliation with free-text fallback for tax base, VAT and concept
//! - Invoice record, spreadsheet column layout and client/project routing keys

pub mod error;
pub mod invoice;
pub mod models;

pub use error::{DocumentError, FacturaError, Result, ServiceError, SinkError};
pub use invoice::{reconcile, parse_locale_decimal, extract_fallback, Reconciler, Reconciliation};
pub use models::{BatchKey, Column, DocumentPayload, ExtractedEntity, FacturaConfig, InvoiceRecord};
