//! Configuration structures for the batch pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{FacturaError, Result};

/// Main configuration for factura.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FacturaConfig {
    /// Document understanding service configuration.
    pub service: ServiceConfig,

    /// Document store configuration.
    pub storage: StorageConfig,

    /// Spreadsheet output configuration.
    pub output: OutputConfig,

    /// Batch driver configuration.
    pub batch: BatchConfig,
}

/// Document AI processor settings.
///
/// The access token is not part of the file; it is supplied at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Base URL. `{location}` is replaced with the configured location.
    pub endpoint: String,

    /// Google Cloud project id or number.
    pub project_id: String,

    /// Processor location (`us`, `eu`).
    pub location: String,

    /// Invoice processor id.
    pub processor_id: String,

    /// MIME type sent with the raw document.
    pub mime_type: String,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://{location}-documentai.googleapis.com".to_string(),
            project_id: String::new(),
            location: "us".to_string(),
            processor_id: String::new(),
            mime_type: "application/pdf".to_string(),
            timeout_secs: 120,
        }
    }
}

impl ServiceConfig {
    /// Full `:process` URL for the configured processor.
    pub fn process_url(&self) -> String {
        let base = self.endpoint.replace("{location}", &self.location);
        format!(
            "{}/v1/projects/{}/locations/{}/processors/{}:process",
            base.trim_end_matches('/'),
            self.project_id,
            self.location,
            self.processor_id
        )
    }
}

/// Local document store mirroring the bucket layout `client/project/file`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Root directory of the store.
    pub root: PathBuf,

    /// File extensions picked up by the batch (lowercase, no dot).
    pub extensions: Vec<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("facturas"),
            extensions: vec!["pdf".to_string()],
        }
    }
}

/// Spreadsheet file format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SheetFormat {
    #[default]
    Xlsx,
    Csv,
}

impl SheetFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            SheetFormat::Xlsx => "xlsx",
            SheetFormat::Csv => "csv",
        }
    }
}

/// Output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory receiving `{client}_{project}` spreadsheets and the error log.
    pub dir: PathBuf,

    /// Spreadsheet format.
    pub format: SheetFormat,

    /// Error log file name inside `dir`.
    pub error_log: String,

    /// Add Cliente / CIF Cliente columns.
    pub include_customer_columns: bool,

    /// File name used by ad-hoc batches (`process`).
    pub single_file_name: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("output"),
            format: SheetFormat::Xlsx,
            error_log: "errores_procesamiento.csv".to_string(),
            include_customer_columns: true,
            single_file_name: "facturas_extraidas.xlsx".to_string(),
        }
    }
}

/// Batch driver settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Maximum documents in flight.
    pub jobs: usize,

    /// Keep going after a per-document failure.
    pub continue_on_error: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            jobs: 4,
            continue_on_error: true,
        }
    }
}

impl FacturaConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Check that the processor is fully identified.
    pub fn validate_service(&self) -> Result<()> {
        let mut missing = Vec::new();
        if self.service.project_id.trim().is_empty() {
            missing.push("service.project_id");
        }
        if self.service.processor_id.trim().is_empty() {
            missing.push("service.processor_id");
        }
        if self.batch.jobs == 0 {
            return Err(FacturaError::Config("batch.jobs must be at least 1".to_string()));
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(FacturaError::Config(format!("missing {}", missing.join(", "))))
        }
    }
}
