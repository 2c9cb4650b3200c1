//! Spreadsheet export of the collected records

use crate::output::traits::{OutputResult, RecordSink};
use crate::record::{CompanyRecord, COLUMNS};
use rust_xlsxwriter::{Format, Workbook};
use std::path::{Path, PathBuf};

/// Name of the single sheet in the exported workbook
pub const SHEET_NAME: &str = "Companies";

/// Writes the record table to an `.xlsx` workbook, replacing any previous export
#[derive(Debug, Clone)]
pub struct XlsxSink {
    path: PathBuf,
}

impl XlsxSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordSink for XlsxSink {
    fn write_records(self, records: &[CompanyRecord]) -> OutputResult<usize> {
        let mut workbook = Workbook::new();
        let header = Format::new().set_bold();

        let worksheet = workbook.add_worksheet();
        worksheet.set_name(SHEET_NAME)?;

        for (col, title) in COLUMNS.iter().enumerate() {
            worksheet.write_string_with_format(0, col as u16, *title, &header)?;
        }

        for (row, record) in records.iter().enumerate() {
            for (col, value) in record.as_row().iter().enumerate() {
                // Empty fields stay blank cells
                if !value.is_empty() {
                    worksheet.write_string(row as u32 + 1, col as u16, *value)?;
                }
            }
        }

        workbook.save(&self.path)?;
        tracing::info!(
            "Wrote {} record(s) to sheet '{}' of {}",
            records.len(),
            SHEET_NAME,
            self.path.display()
        );
        Ok(records.len())
    }
}
