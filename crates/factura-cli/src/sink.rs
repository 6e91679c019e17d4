//! Spreadsheet output: append-or-create per client/project, plus the error log.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto, DataType, Reader};
use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};
use tracing::debug;

use factura_core::models::config::SheetFormat;
use factura_core::{Column, InvoiceRecord, SinkError};

/// Header row plus data rows, all as text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Rows projected onto `headers` by column name; unknown columns are blank.
    fn project(&self, headers: &[String]) -> Vec<Vec<String>> {
        let index: HashMap<&str, usize> = self
            .headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.as_str(), i))
            .collect();

        self.rows
            .iter()
            .map(|row| {
                headers
                    .iter()
                    .map(|h| {
                        index
                            .get(h.as_str())
                            .and_then(|i| row.get(*i))
                            .cloned()
                            .unwrap_or_default()
                    })
                    .collect()
            })
            .collect()
    }
}

/// Reads and writes whole tables in one file format.
pub trait TableFile {
    fn read(&self, path: &Path) -> Result<Table, SinkError>;
    fn write(&self, path: &Path, table: &Table) -> Result<(), SinkError>;
}

fn read_error(path: &Path, reason: impl ToString) -> SinkError {
    SinkError::Read {
        path: path.display().to_string(),
        reason: reason.to_string(),
    }
}

fn write_error(path: &Path, reason: impl ToString) -> SinkError {
    SinkError::Write {
        path: path.display().to_string(),
        reason: reason.to_string(),
    }
}

/// First worksheet of an `.xlsx` workbook.
pub struct XlsxFile;

impl TableFile for XlsxFile {
    fn read(&self, path: &Path) -> Result<Table, SinkError> {
        let mut workbook = open_workbook_auto(path).map_err(|e| read_error(path, e))?;
        let sheet = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| read_error(path, "workbook has no sheets"))?;
        let range = workbook
            .worksheet_range(&sheet)
            .map_err(|e| read_error(path, e))?;

        let mut rows = range
            .rows()
            .map(|row| row.iter().map(|c| c.as_string().unwrap_or_default()).collect::<Vec<_>>());
        let headers = rows.next().unwrap_or_default();
        let rows = rows
            .filter(|row| row.iter().any(|c| !c.is_empty()))
            .collect();

        Ok(Table { headers, rows })
    }

    fn write(&self, path: &Path, table: &Table) -> Result<(), SinkError> {
        let mut workbook = Workbook::new();
        fill_worksheet(workbook.add_worksheet(), table).map_err(|e| write_error(path, e))?;
        workbook.save(path).map_err(|e| write_error(path, e))
    }
}

fn fill_worksheet(worksheet: &mut Worksheet, table: &Table) -> Result<(), XlsxError> {
    let header_format = Format::new().set_bold();

    worksheet.set_name("Facturas")?;
    for (col, header) in table.headers.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, header, &header_format)?;
    }
    for (row_idx, row) in table.rows.iter().enumerate() {
        for (col, value) in row.iter().enumerate() {
            worksheet.write_string((row_idx + 1) as u32, col as u16, value)?;
        }
    }
    worksheet.set_freeze_panes(1, 0)?;
    worksheet.autofit();
    Ok(())
}

/// Comma-separated file with a header line.
pub struct CsvFile;

impl TableFile for CsvFile {
    fn read(&self, path: &Path) -> Result<Table, SinkError> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(path)
            .map_err(|e| read_error(path, e))?;
        let headers = reader
            .headers()
            .map_err(|e| read_error(path, e))?
            .iter()
            .map(str::to_string)
            .collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| read_error(path, e))?;
            rows.push(record.iter().map(str::to_string).collect());
        }

        Ok(Table { headers, rows })
    }

    fn write(&self, path: &Path, table: &Table) -> Result<(), SinkError> {
        let mut writer = csv::Writer::from_path(path).map_err(|e| write_error(path, e))?;
        writer
            .write_record(&table.headers)
            .map_err(|e| write_error(path, e))?;
        for row in &table.rows {
            writer.write_record(row).map_err(|e| write_error(path, e))?;
        }
        writer.flush().map_err(|e| write_error(path, e))
    }
}

/// Writes invoice records in the configured column layout.
pub struct SpreadsheetSink {
    file: Box<dyn TableFile + Send + Sync>,
    format: SheetFormat,
    columns: Vec<Column>,
}

impl SpreadsheetSink {
    pub fn new(format: SheetFormat, include_customer_columns: bool) -> Self {
        let file: Box<dyn TableFile + Send + Sync> = match format {
            SheetFormat::Xlsx => Box::new(XlsxFile),
            SheetFormat::Csv => Box::new(CsvFile),
        };
        Self {
            file,
            format,
            columns: Column::layout(include_customer_columns),
        }
    }

    /// Output path for a file stem inside `dir`.
    pub fn path_for(&self, dir: &Path, stem: &str) -> PathBuf {
        dir.join(format!("{}.{}", stem, self.format.extension()))
    }

    fn headers(&self) -> Vec<String> {
        Column::headers(&self.columns)
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    fn rows(&self, records: &[InvoiceRecord]) -> Vec<Vec<String>> {
        records.iter().map(|r| r.to_row(&self.columns)).collect()
    }

    /// Append records to `path`, creating it when absent. Existing rows are
    /// kept and realigned to the current columns. Returns the total row count.
    pub fn append(&self, path: &Path, records: &[InvoiceRecord]) -> Result<usize, SinkError> {
        let headers = self.headers();
        let mut rows = if path.exists() {
            let existing = self.file.read(path)?;
            debug!("Appending to {} ({} existing rows)", path.display(), existing.rows.len());
            existing.project(&headers)
        } else {
            Vec::new()
        };
        rows.extend(self.rows(records));

        let table = Table { headers, rows };
        self.file.write(path, &table)?;
        Ok(table.rows.len())
    }

    /// Write records to a fresh file, replacing any existing one.
    pub fn create(&self, path: &Path, records: &[InvoiceRecord]) -> Result<(), SinkError> {
        let table = Table {
            headers: self.headers(),
            rows: self.rows(records),
        };
        self.file.write(path, &table)
    }
}

/// A document that could not be turned into a record.
#[derive(Debug, Clone)]
pub struct BatchFailure {
    pub file: String,
    pub error: String,
}

/// Write failures as `Archivo,Error` CSV.
pub fn write_error_log(path: &Path, failures: &[BatchFailure]) -> Result<(), SinkError> {
    let table = Table {
        headers: vec!["Archivo".to_string(), "Error".to_string()],
        rows: failures
            .iter()
            .map(|f| vec![f.file.clone(), f.error.clone()])
            .collect(),
    };
    CsvFile.write(path, &table)
}
