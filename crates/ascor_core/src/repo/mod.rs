//! Table source contracts and loaders.
//!
//! # Responsibility
//! - Define the `TableRepository` contract that yields one immutable
//!   `AssessmentTable`.
//! - Resolve id columns and assessment years shared by every source.
//!
//! # Invariants
//! - Loading is fail-fast: a missing id column fails the whole load.
//! - Row order of the source is preserved.

pub mod assessment_date;
pub mod csv_table_repo;
pub mod sqlite_table_repo;

use crate::db::DbError;
use crate::model::table::{
    AssessmentRow, AssessmentTable, CellValue, ASSESSMENT_DATE_COLUMN, COUNTRY_COLUMN,
};
use assessment_date::assessment_year;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Errors raised while loading an assessment table.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    Csv(csv::Error),
    MissingColumn(String),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Csv(err) => write!(f, "{err}"),
            Self::MissingColumn(column) => {
                write!(f, "assessment table is missing required column `{column}`")
            }
            Self::InvalidData(message) => write!(f, "invalid assessment data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Csv(err) => Some(err),
            Self::MissingColumn(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<csv::Error> for RepoError {
    fn from(value: csv::Error) -> Self {
        Self::Csv(value)
    }
}

/// Source of the wide assessment table.
pub trait TableRepository {
    /// Loads the complete table. Called once at startup.
    fn load_table(&self) -> RepoResult<AssessmentTable>;
}

/// Builds an `AssessmentTable` from raw cells, resolving id columns.
///
/// Rows with an absent country or unparseable assessment date are kept (the
/// table mirrors its source) but can never match a lookup.
pub(crate) fn build_table(
    source: &str,
    columns: Vec<String>,
    raw_rows: Vec<Vec<Option<CellValue>>>,
) -> RepoResult<AssessmentTable> {
    let country_index = required_column(&columns, COUNTRY_COLUMN)?;
    let date_index = required_column(&columns, ASSESSMENT_DATE_COLUMN)?;

    let mut unmatched_rows = 0usize;
    let rows: Vec<AssessmentRow> = raw_rows
        .into_iter()
        .enumerate()
        .map(|(row_number, cells)| {
            let country = cells
                .get(country_index)
                .cloned()
                .flatten()
                .map(|value| value.to_string());
            let date = cells.get(date_index).and_then(Option::as_ref);
            let year = assessment_year(date);
            if year.is_none() {
                unmatched_rows += 1;
                warn!(
                    "event=table_load module=repo status=warn source={} row={} reason=unparseable_assessment_date value={}",
                    source,
                    row_number,
                    date.map_or_else(|| "<absent>".to_string(), ToString::to_string)
                );
            }
            AssessmentRow::new(country, year, cells)
        })
        .collect();

    info!(
        "event=table_load module=repo status=ok source={} columns={} rows={} rows_without_year={}",
        source,
        columns.len(),
        rows.len(),
        unmatched_rows
    );

    Ok(AssessmentTable::new(columns, rows))
}

fn required_column(columns: &[String], label: &str) -> RepoResult<usize> {
    columns
        .iter()
        .position(|column| column.trim() == label)
        .ok_or_else(|| RepoError::MissingColumn(label.to_string()))
}

#[cfg(test)]
mod tests {
    use super::{build_table, RepoError};
    use crate::model::table::CellValue;

    fn columns(labels: &[&str]) -> Vec<String> {
        labels.iter().map(|label| label.to_string()).collect()
    }

    #[test]
    fn build_table_requires_id_columns() {
        let err = build_table("test", columns(&["Country", "area EP.1"]), Vec::new()).unwrap_err();
        assert!(matches!(err, RepoError::MissingColumn(column) if column == "Assessment date"));
    }

    #[test]
    fn build_table_resolves_country_and_year() {
        let table = build_table(
            "test",
            columns(&["Country", "Assessment date", "area EP.1"]),
            vec![
                vec![
                    Some(CellValue::from("Germany")),
                    Some(CellValue::from("2023-10-01")),
                    Some(CellValue::from("Partial")),
                ],
                vec![None, Some(CellValue::from("not a date")), None],
            ],
        )
        .unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[0].key(), Some(("Germany", 2023)));
        assert_eq!(table.rows()[1].country, None);
        assert_eq!(table.rows()[1].assessment_year, None);
    }
}
