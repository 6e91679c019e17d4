//! Data models shared by the pipeline.

pub mod batch;
pub mod config;
pub mod entity;
pub mod record;

pub use batch::BatchKey;
pub use config::FacturaConfig;
pub use entity::{DocumentPayload, ExtractedEntity};
pub use record::{Column, InvoiceRecord};
