//! Reconcile command - run reconciliation on a saved service response.

use std::fs;
use std::path::PathBuf;

use clap::Args;
use console::style;

use factura_core::{Column, DocumentPayload, InvoiceRecord, Reconciler, Reconciliation};

/// Arguments for the reconcile command.
#[derive(Args)]
pub struct ReconcileArgs {
    /// Saved response JSON (`{"document": {...}}` or the document object)
    #[arg(required = true)]
    input: PathBuf,

    /// File name recorded in the `Archivo` column (default: input file name)
    #[arg(long)]
    name: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Only use structured entities
    #[arg(long)]
    no_fallback: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON record
    Json,
    /// Spreadsheet columns, one per line
    Text,
}

pub async fn run(args: ReconcileArgs) -> anyhow::Result<()> {
    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let content = fs::read_to_string(&args.input)?;
    let document = DocumentPayload::from_json(&content)?;

    let name = args.name.unwrap_or_else(|| {
        args.input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    });

    let reconciliation = Reconciler::new()
        .with_fallback(!args.no_fallback)
        .reconcile_document(&document, &name);

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&reconciliation.record)?),
        OutputFormat::Text => print!("{}", format_record_text(&reconciliation.record)),
    }

    print_report(&reconciliation);
    Ok(())
}

fn format_record_text(record: &InvoiceRecord) -> String {
    let columns = Column::layout(true);
    let width = columns.iter().map(|c| c.header().chars().count()).max().unwrap_or(0);

    let mut output = String::new();
    for column in columns {
        output.push_str(&format!(
            "{:<width$}  {}\n",
            column.header(),
            record.cell(column),
            width = width
        ));
    }
    output
}

fn print_report(reconciliation: &Reconciliation) {
    if !reconciliation.fallback_fields.is_empty() {
        let fields: Vec<&str> = reconciliation.fallback_fields.iter().map(|f| f.name()).collect();
        eprintln!(
            "{} Filled from document text: {}",
            style("ℹ").blue(),
            fields.join(", ")
        );
    }
    if !reconciliation.ignored_kinds.is_empty() {
        eprintln!(
            "{} Ignored entity types: {}",
            style("ℹ").blue(),
            reconciliation.ignored_kinds.join(", ")
        );
    }
}
