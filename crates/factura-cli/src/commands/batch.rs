//! Batch command - process the document store into per-project spreadsheets.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use tracing::{error, info};

use factura_core::models::config::SheetFormat;
use factura_core::{BatchKey, InvoiceRecord, Reconciler};

use crate::pipeline::{average_processing_ms, process_all, DocumentInput};
use crate::service::DocumentAiClient;
use crate::sink::{write_error_log, BatchFailure, SpreadsheetSink};
use crate::store::LocalStore;

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Only process documents of this client
    #[arg(long)]
    client: Option<String>,

    /// Only process documents of this project
    #[arg(long)]
    project: Option<String>,

    /// Document store root (overrides storage.root)
    #[arg(long)]
    root: Option<PathBuf>,

    /// Output directory (overrides output.dir)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Spreadsheet format (overrides output.format)
    #[arg(short, long, value_enum)]
    format: Option<FormatArg>,

    /// Number of documents processed concurrently
    #[arg(short = 'j', long)]
    jobs: Option<usize>,

    /// Stop at the first failed document
    #[arg(long)]
    fail_fast: bool,

    /// Bearer token for the document understanding service
    #[arg(long, env = "FACTURA_ACCESS_TOKEN", hide_env_values = true)]
    access_token: Option<String>,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum FormatArg {
    Xlsx,
    Csv,
}

impl From<FormatArg> for SheetFormat {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::Xlsx => SheetFormat::Xlsx,
            FormatArg::Csv => SheetFormat::Csv,
        }
    }
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = super::load_config(config_path)?;
    if let Some(root) = args.root {
        config.storage.root = root;
    }
    if let Some(dir) = args.output_dir {
        config.output.dir = dir;
    }
    if let Some(format) = args.format {
        config.output.format = format.into();
    }
    if let Some(jobs) = args.jobs {
        config.batch.jobs = jobs;
    }
    if args.fail_fast {
        config.batch.continue_on_error = false;
    }

    let store = LocalStore::from_config(&config.storage);
    let documents: Vec<_> = store
        .list()?
        .into_iter()
        .filter(|d| d.key().matches(args.client.as_deref(), args.project.as_deref()))
        .collect();

    if documents.is_empty() {
        println!(
            "{} No documents to process under {}",
            style("ℹ").blue(),
            store.root().display()
        );
        return Ok(());
    }

    println!(
        "{} Found {} documents to process",
        style("ℹ").blue(),
        documents.len()
    );

    config.validate_service()?;
    let client = DocumentAiClient::new(&config.service, args.access_token)?;
    let reconciler = Reconciler::new();

    let inputs: Vec<DocumentInput> = documents
        .into_iter()
        .map(|d| DocumentInput {
            name: d.name,
            path: d.path,
        })
        .collect();

    let pb = super::document_progress(inputs.len())?;
    let results = process_all(
        &client,
        &reconciler,
        inputs,
        config.batch.jobs,
        config.batch.continue_on_error,
        &pb,
    )
    .await;
    pb.finish_and_clear();
    let average_ms = average_processing_ms(&results);

    let mut failures: Vec<BatchFailure> = results.iter().filter_map(|r| r.failure()).collect();

    let mut groups: BTreeMap<BatchKey, Vec<InvoiceRecord>> = BTreeMap::new();
    for processed in results {
        if let Ok(reconciliation) = processed.outcome {
            groups
                .entry(BatchKey::from_path(&processed.input.name))
                .or_default()
                .push(reconciliation.record);
        }
    }

    fs::create_dir_all(&config.output.dir)?;
    let sink = SpreadsheetSink::new(config.output.format, config.output.include_customer_columns);

    let mut written = 0;
    for (key, records) in &groups {
        let path = sink.path_for(&config.output.dir, &key.file_stem());
        match sink.append(&path, records) {
            Ok(total) => {
                written += records.len();
                info!("{}: {} new rows, {} total", key, records.len(), total);
                println!(
                    "{} {} -> {} ({} rows)",
                    style("✓").green(),
                    key,
                    path.display(),
                    total
                );
            }
            Err(e) => {
                error!("Failed to write {}: {}", path.display(), e);
                for record in records {
                    failures.push(BatchFailure {
                        file: record.filename.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }
    }

    if !failures.is_empty() {
        let log_path = config.output.dir.join(&config.output.error_log);
        write_error_log(&log_path, &failures)?;
        println!(
            "{} Error log written to {}",
            style("✓").green(),
            log_path.display()
        );
    }

    println!();
    println!(
        "{} Processed documents in {:?}",
        style("✓").green(),
        start.elapsed()
    );
    println!(
        "   {} written, {} failed, {}ms per document",
        style(written).green(),
        style(failures.len()).red(),
        average_ms
    );

    if !failures.is_empty() {
        println!();
        println!("{}", style("Failed documents:").red());
        for failure in &failures {
            println!("  - {}: {}", failure.file, failure.error);
        }
    }

    Ok(())
}
