//! CSV export of the collected records

use crate::output::traits::{OutputResult, RecordSink};
use crate::record::{CompanyRecord, COLUMNS};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Writes the record table to a CSV file, replacing any previous export
#[derive(Debug, Clone)]
pub struct CsvSink {
    path: PathBuf,
}

impl CsvSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordSink for CsvSink {
    fn write_records(self, records: &[CompanyRecord]) -> OutputResult<usize> {
        let file = File::create(&self.path)?;
        let written = write_csv(file, records)?;
        tracing::info!(
            "Wrote {} record(s) to {}",
            written,
            self.path.display()
        );
        Ok(written)
    }
}

/// Writes the header row followed by one row per record
///
/// The header is written even when `records` is empty.
pub fn write_csv<W: Write>(writer: W, records: &[CompanyRecord]) -> OutputResult<usize> {
    let mut wtr = csv::Writer::from_writer(writer);

    wtr.write_record(COLUMNS)?;
    for record in records {
        wtr.write_record(record.as_row())?;
    }
    wtr.flush()?;

    Ok(records.len())
}
