//! In-memory wide assessment table.
//!
//! # Responsibility
//! - Hold the raw table exactly as loaded: column labels plus one cell per
//!   column per row.
//! - Carry the id values (country, derived assessment year) next to each row.
//!
//! # Invariants
//! - Row order is table order; lookup tie-breaks depend on it.
//! - `AssessmentRow::cells` is positionally aligned with `AssessmentTable::columns`.
//! - The table is never mutated after construction.

use std::fmt::{Display, Formatter};

/// Id column holding the country name.
pub const COUNTRY_COLUMN: &str = "Country";
/// Id column holding the assessment date; lookup years derive from it.
pub const ASSESSMENT_DATE_COLUMN: &str = "Assessment date";

/// One present cell value. Absent cells are `None` at the row level.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Integer(i64),
    Real(f64),
    Text(String),
}

impl CellValue {
    /// Returns whether this value is a floating NaN (spreadsheet blank marker).
    pub fn is_nan(&self) -> bool {
        matches!(self, Self::Real(value) if value.is_nan())
    }
}

impl Display for CellValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Integer(value) => write!(f, "{value}"),
            // Shortest round-trip form: `42.0` renders as `42`, `0.5` as `0.5`.
            Self::Real(value) => write!(f, "{value}"),
            Self::Text(value) => f.write_str(value),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        Self::Real(value)
    }
}

/// One table row with its id values resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct AssessmentRow {
    /// `None` when the country cell is absent; such rows never match a lookup.
    pub country: Option<String>,
    /// Calendar year of the assessment date, `None` when absent/unparseable.
    pub assessment_year: Option<i32>,
    /// One entry per table column, `None` for absent cells.
    pub cells: Vec<Option<CellValue>>,
}

impl AssessmentRow {
    pub fn new(
        country: Option<String>,
        assessment_year: Option<i32>,
        cells: Vec<Option<CellValue>>,
    ) -> Self {
        Self {
            country,
            assessment_year,
            cells,
        }
    }

    /// Returns the row key when both id values are present.
    pub fn key(&self) -> Option<(&str, i32)> {
        match (self.country.as_deref(), self.assessment_year) {
            (Some(country), Some(year)) => Some((country, year)),
            _ => None,
        }
    }
}

/// Immutable wide-format table as produced by a table repository.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssessmentTable {
    columns: Vec<String>,
    rows: Vec<AssessmentRow>,
}

impl AssessmentTable {
    pub fn new(columns: Vec<String>, rows: Vec<AssessmentRow>) -> Self {
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[AssessmentRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
