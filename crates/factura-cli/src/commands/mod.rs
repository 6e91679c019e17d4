//! CLI subcommands.

pub mod batch;
pub mod config;
pub mod list;
pub mod process;
pub mod reconcile;

use std::path::{Path, PathBuf};

use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use factura_core::FacturaConfig;

/// Default configuration file location.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("factura")
        .join("config.json")
}

/// Load the `--config` file, else the default file when present, else defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<FacturaConfig> {
    if let Some(path) = config_path {
        return Ok(FacturaConfig::from_file(Path::new(path))?);
    }

    let default_path = default_config_path();
    if default_path.exists() {
        debug!("Using configuration from {}", default_path.display());
        Ok(FacturaConfig::from_file(&default_path)?)
    } else {
        Ok(FacturaConfig::default())
    }
}

/// Progress bar counting documents.
pub fn document_progress(total: usize) -> anyhow::Result<ProgressBar> {
    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} documents")?
            .progress_chars("=>-"),
    );
    Ok(pb)
}
