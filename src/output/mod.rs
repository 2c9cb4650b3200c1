//! Output module for exporting records and reporting on a crawl
//!
//! This module handles:
//! - Rendering the record table as an `.xlsx` workbook or as CSV
//! - Describing how a crawl ended
//! - Printing a summary to the console

mod csv_sink;
mod report;
mod traits;
mod xlsx_sink;

pub use csv_sink::{write_csv, CsvSink};
pub use report::{outcome_label, print_report};
pub use traits::{CrawlOutcome, CrawlReport, OutputError, OutputResult, RecordSink};
pub use xlsx_sink::{XlsxSink, SHEET_NAME};

use crate::config::OutputFormat;
use crate::record::CompanyRecord;
use std::path::Path;

/// Writes `records` to `path` with the sink for `format`
pub fn export_records(
    format: OutputFormat,
    path: &Path,
    records: &[CompanyRecord],
) -> OutputResult<usize> {
    match format {
        OutputFormat::Xlsx => XlsxSink::new(path).write_records(records),
        OutputFormat::Csv => CsvSink::new(path).write_records(records),
    }
}
