//! Process command - extract an ad-hoc set of invoices into one spreadsheet.

use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use tracing::{info, warn};

use factura_core::models::config::SheetFormat;
use factura_core::{InvoiceRecord, Reconciler};

use crate::pipeline::{process_all, DocumentInput};
use crate::service::DocumentAiClient;
use crate::sink::SpreadsheetSink;

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input files or glob patterns
    #[arg(required = true)]
    inputs: Vec<String>,

    /// Output spreadsheet (default: output.dir/output.single_file_name)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print the records as JSON instead of writing a spreadsheet
    #[arg(long)]
    json: bool,

    /// Number of documents processed concurrently
    #[arg(short = 'j', long)]
    jobs: Option<usize>,

    /// Bearer token for the document understanding service
    #[arg(long, env = "FACTURA_ACCESS_TOKEN", hide_env_values = true)]
    access_token: Option<String>,
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = super::load_config(config_path)?;
    if let Some(jobs) = args.jobs {
        config.batch.jobs = jobs;
    }

    let inputs = expand_inputs(&args.inputs)?;
    if inputs.is_empty() {
        anyhow::bail!("No matching files found for: {}", args.inputs.join(" "));
    }

    info!("Processing {} files", inputs.len());

    config.validate_service()?;
    let client = DocumentAiClient::new(&config.service, args.access_token)?;
    let reconciler = Reconciler::new();

    let pb = super::document_progress(inputs.len())?;
    let results = process_all(
        &client,
        &reconciler,
        inputs,
        config.batch.jobs,
        true,
        &pb,
    )
    .await;
    pb.finish_and_clear();

    let mut records: Vec<InvoiceRecord> = Vec::new();
    let mut failed = 0;
    for processed in results {
        match processed.outcome {
            Ok(reconciliation) => records.push(reconciliation.record),
            Err(e) => {
                failed += 1;
                eprintln!(
                    "{} {}: {}",
                    style("✗").red(),
                    processed.input.name,
                    e
                );
            }
        }
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if records.is_empty() {
        anyhow::bail!("No invoice could be processed");
    }

    let output_path = args
        .output
        .unwrap_or_else(|| config.output.dir.join(&config.output.single_file_name));
    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let format = match output_path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("csv") => SheetFormat::Csv,
        _ => SheetFormat::Xlsx,
    };
    let sink = SpreadsheetSink::new(format, config.output.include_customer_columns);
    sink.create(&output_path, &records)?;

    println!(
        "{} {} invoices written to {} in {:?}",
        style("✓").green(),
        records.len(),
        output_path.display(),
        start.elapsed()
    );
    if failed > 0 {
        println!("   {} failed", style(failed).red());
    }

    Ok(())
}

/// Expand globs, keeping literal paths that exist. Names are file names.
fn expand_inputs(patterns: &[String]) -> anyhow::Result<Vec<DocumentInput>> {
    let mut inputs = Vec::new();
    for pattern in patterns {
        let matches: Vec<PathBuf> = glob(pattern)?
            .filter_map(|r| r.ok())
            .filter(|p| p.is_file())
            .collect();

        if matches.is_empty() {
            warn!("No files match {}", pattern);
        }

        for path in matches {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            inputs.push(DocumentInput { name, path });
        }
    }
    Ok(inputs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_expand_inputs_uses_file_names() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.pdf"), b"%PDF").unwrap();
        fs::write(dir.path().join("a.pdf"), b"%PDF").unwrap();
        fs::write(dir.path().join("notas.txt"), b"x").unwrap();

        let pattern = format!("{}/*.pdf", dir.path().display());
        let inputs = expand_inputs(&[pattern]).unwrap();

        let names: Vec<&str> = inputs.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["a.pdf", "b.pdf"]);
    }
}
