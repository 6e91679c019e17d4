//! Entities returned by the document understanding service.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One typed span returned by the extraction service.
///
/// The field names follow the service's JSON representation (`type`,
/// `mentionText`, `properties`) so a raw `document.entities` array
/// deserializes straight into this type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedEntity {
    /// Entity type tag, e.g. `supplier_name` or `vat/tax_amount`.
    #[serde(rename = "type", default)]
    pub kind: String,

    /// Mention text as read from the document.
    #[serde(rename = "mentionText", default)]
    pub text: String,

    /// Nested sub-entities (only `vat` and `line_item` carry them).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<ExtractedEntity>,
}

impl ExtractedEntity {
    /// Create a leaf entity.
    pub fn new(kind: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            text: text.into(),
            properties: Vec::new(),
        }
    }

    /// Create a composite entity with nested properties.
    pub fn composite(kind: impl Into<String>, properties: Vec<ExtractedEntity>) -> Self {
        Self {
            kind: kind.into(),
            text: String::new(),
            properties,
        }
    }
}

/// The `document` object of a processing response: full text plus entities.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentPayload {
    /// Full OCR text of the document.
    #[serde(default)]
    pub text: String,

    /// Top-level entities in service order.
    #[serde(default)]
    pub entities: Vec<ExtractedEntity>,
}

#[derive(Deserialize)]
struct ProcessResponse {
    document: DocumentPayload,
}

impl DocumentPayload {
    /// Parse either a full processing response (`{"document": {...}}`) or a
    /// bare document object.
    pub fn from_json(json: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        if value.get("document").is_some() {
            let response: ProcessResponse = serde_json::from_value(value)?;
            Ok(response.document)
        } else {
            Ok(serde_json::from_value(value)?)
        }
    }
}
