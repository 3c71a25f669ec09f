// ============================================================
// Layer 4: CSV Table Loader
// ============================================================
// Reads the mortality table from a delimited text file with
// the csv crate.
//
// What happens per record:
//   1. The date column is parsed into a NaiveDate
//      (several common layouts are accepted)
//   2. Every other cell is trimmed and kept as text
//   3. Cells equal to a missing marker ("", "?", "NA", ...)
//      become None so the preprocessor can drop the row
//
// The date is the sort key, so it is never treated as missing:
// a blank or unparseable date stops the load with
// MalformedValue (1-based data row) instead of keeping the
// row with an empty date the way a dataframe reader would.
//
// Numeric parsing is deferred to the preprocessor: columns
// that are about to be dropped may legitimately hold text.
//
// Reference: csv crate documentation
//            chrono crate documentation (NaiveDate::parse_from_str)
//            Rust Book §9 (Error Handling)

use std::{fs::File, io::BufReader, path::PathBuf};

use chrono::{NaiveDate, NaiveDateTime};

use crate::domain::error::{DataError, DataResult};
use crate::domain::table::{RawRecord, RawTable};
use crate::domain::traits::TableSource;

/// Date layouts tried in order.
const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%m-%d-%Y", "%m/%d/%Y", "%Y/%m/%d"];
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%m/%d/%Y %H:%M"];

/// Loads a CSV file with a header row into a RawTable.
/// Implements the TableSource trait from Layer 3.
pub struct CsvTableLoader {
    path:            PathBuf,
    date_column:     String,
    missing_markers: Vec<String>,
}

impl CsvTableLoader {
    pub fn new(
        path:            impl Into<PathBuf>,
        date_column:     impl Into<String>,
        missing_markers: Vec<String>,
    ) -> Self {
        Self {
            path:        path.into(),
            date_column: date_column.into(),
            missing_markers,
        }
    }

    fn unavailable(&self, reason: impl ToString) -> DataError {
        DataError::DataSourceUnavailable {
            path:   self.path.display().to_string(),
            reason: reason.to_string(),
        }
    }

    fn is_missing(&self, cell: &str) -> bool {
        self.missing_markers.iter().any(|m| m == cell)
    }
}

impl TableSource for CsvTableLoader {
    fn load(&self) -> DataResult<RawTable> {
        let file = File::open(&self.path).map_err(|e| self.unavailable(e))?;
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(BufReader::new(file));

        let headers = reader.headers().map_err(|e| self.unavailable(e))?.clone();

        let date_idx = headers
            .iter()
            .position(|h| h == self.date_column)
            .ok_or_else(|| DataError::MissingColumn(self.date_column.clone()))?;

        let columns: Vec<String> = headers
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != date_idx)
            .map(|(_, h)| h.to_string())
            .collect();

        let mut records = Vec::new();

        for (row, result) in reader.records().enumerate() {
            let record = result.map_err(|e| self.unavailable(e))?;

            let raw_date = record.get(date_idx).unwrap_or("");
            let date = parse_date(raw_date).ok_or_else(|| DataError::MalformedValue {
                row:    row + 1,
                column: self.date_column.clone(),
                value:  raw_date.to_string(),
            })?;

            let cells = record
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != date_idx)
                .map(|(_, cell)| {
                    if self.is_missing(cell) { None } else { Some(cell.to_string()) }
                })
                .collect();

            records.push(RawRecord { date, cells });
        }

        tracing::info!(
            "Loaded {} records with {} columns from '{}'",
            records.len(),
            columns.len(),
            self.path.display()
        );

        Ok(RawTable { columns, records })
    }
}

/// Parse a date cell, accepting date-only and date-time layouts.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
                .map(|dt| dt.date())
        })
}
