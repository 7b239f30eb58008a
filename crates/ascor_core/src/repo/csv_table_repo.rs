//! CSV-backed assessment table source.
//!
//! # Responsibility
//! - Read a CSV export of the assessment spreadsheet (header row = labels).
//!
//! # Invariants
//! - Empty (or whitespace-only) fields are absent cells; every other field is
//!   kept as text, untrimmed.
//! - Numeric-looking fields are not reparsed: `42.0` in the file renders as
//!   `42.0` in documents, exactly as exported.
//! - Records shorter than the header are padded with absent cells.

use super::{build_table, RepoResult, TableRepository};
use crate::model::table::{AssessmentTable, CellValue};
use std::io::Read;
use std::path::PathBuf;

/// CSV file repository.
pub struct CsvTableRepository {
    path: PathBuf,
}

impl CsvTableRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TableRepository for CsvTableRepository {
    fn load_table(&self) -> RepoResult<AssessmentTable> {
        let reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(&self.path)?;
        read_csv_table(reader, &format!("csv:{}", self.path.display()))
    }
}

/// Reads a whole CSV stream into an `AssessmentTable`.
pub fn read_csv_table<R: Read>(
    mut reader: csv::Reader<R>,
    source: &str,
) -> RepoResult<AssessmentTable> {
    let columns: Vec<String> = reader
        .headers()?
        .iter()
        .enumerate()
        .map(|(index, header)| {
            if index == 0 {
                header.trim_start_matches('\u{feff}').to_string()
            } else {
                header.to_string()
            }
        })
        .collect();

    let mut raw_rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let cells: Vec<Option<CellValue>> = (0..columns.len())
            .map(|index| {
                record
                    .get(index)
                    .filter(|field| !field.trim().is_empty())
                    .map(CellValue::from)
            })
            .collect();
        raw_rows.push(cells);
    }

    build_table(source, columns, raw_rows)
}
