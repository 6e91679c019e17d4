//! Per-document processing shared by the `batch` and `process` commands.

use std::path::PathBuf;
use std::time::Instant;

use futures_util::stream::{self, StreamExt};
use indicatif::ProgressBar;
use tracing::{debug, warn};

use factura_core::{DocumentError, FacturaError, Reconciler, Reconciliation};

use crate::service::EntityExtractor;
use crate::sink::BatchFailure;

/// A document waiting to be processed.
#[derive(Debug, Clone)]
pub struct DocumentInput {
    /// Name written to the `Archivo` column and the error log.
    pub name: String,
    pub path: PathBuf,
}

/// Result of one document.
#[derive(Debug)]
pub struct ProcessedDocument {
    pub input: DocumentInput,
    pub outcome: Result<Reconciliation, FacturaError>,
    pub processing_time_ms: u64,
}

impl ProcessedDocument {
    pub fn failure(&self) -> Option<BatchFailure> {
        self.outcome.as_ref().err().map(|e| BatchFailure {
            file: self.input.name.clone(),
            error: e.to_string(),
        })
    }
}

/// Mean per-document processing time, zero for an empty run.
pub fn average_processing_ms(results: &[ProcessedDocument]) -> u64 {
    if results.is_empty() {
        return 0;
    }
    results.iter().map(|r| r.processing_time_ms).sum::<u64>() / results.len() as u64
}

/// Reject empty content, extract entities and reconcile them.
pub async fn process_document<E: EntityExtractor>(
    extractor: &E,
    reconciler: &Reconciler,
    name: &str,
    content: &[u8],
) -> Result<Reconciliation, FacturaError> {
    if content.is_empty() {
        return Err(DocumentError::Empty {
            name: name.to_string(),
        }
        .into());
    }

    let document = extractor.extract(name, content).await?;
    debug!(
        "{}: {} entities, {} characters of text",
        name,
        document.entities.len(),
        document.text.len()
    );

    Ok(reconciler.reconcile_document(&document, name))
}

/// Process documents with at most `jobs` in flight, keeping input order.
///
/// Without `continue_on_error` the run stops after the first failure and
/// documents not yet finished are dropped.
pub async fn process_all<E: EntityExtractor>(
    extractor: &E,
    reconciler: &Reconciler,
    inputs: Vec<DocumentInput>,
    jobs: usize,
    continue_on_error: bool,
    progress: &ProgressBar,
) -> Vec<ProcessedDocument> {
    let mut pending = stream::iter(inputs)
        .map(|input| async move {
            let start = Instant::now();
            let outcome = match tokio::fs::read(&input.path).await {
                Ok(content) => process_document(extractor, reconciler, &input.name, &content).await,
                Err(e) => Err(FacturaError::Io(e)),
            };
            ProcessedDocument {
                input,
                outcome,
                processing_time_ms: start.elapsed().as_millis() as u64,
            }
        })
        .buffered(jobs.max(1));

    let mut results = Vec::new();
    while let Some(processed) = pending.next().await {
        progress.inc(1);
        let failed = processed.outcome.is_err();
        if let Err(e) = &processed.outcome {
            warn!("Failed to process {}: {}", processed.input.name, e);
        }
        results.push(processed);

        if failed && !continue_on_error {
            warn!("Stopping batch after first failure");
            break;
        }
    }

    results
}
