//! Assessment lookup use-case service.
//!
//! # Responsibility
//! - Normalize every table row once, at construction.
//! - Resolve (country, assessment year) keys and assemble documents on demand.
//!
//! # Invariants
//! - State is immutable after construction; the service is `Send + Sync`
//!   and needs no locking when shared.
//! - Country matching is exact and case-sensitive; years come from the
//!   assessment date, never the publication date.
//! - On duplicate keys the first row in table order wins. Duplicates are
//!   logged at construction and never turn into errors.

use crate::model::document::Document;
use crate::model::fact::CanonicalFact;
use crate::model::table::AssessmentTable;
use crate::transform::assemble::{assemble, AssembleError};
use crate::transform::normalize::RowNormalizer;
use log::{debug, info, warn};
use std::collections::{BTreeMap, HashMap};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

pub type LookupResult<T> = Result<T, LookupError>;

/// Lookup outcomes other than a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    /// No row matches the key. Expected, not a failure of the service.
    NotFound { country: String, year: i32 },
    /// Assembly contract violation; fatal to the request only.
    Assemble(AssembleError),
}

impl Display for LookupError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { country, year } => {
                write!(f, "No data found for country: {country} and year: {year}")
            }
            Self::Assemble(err) => write!(f, "{err}"),
        }
    }
}

impl Error for LookupError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::NotFound { .. } => None,
            Self::Assemble(err) => Some(err),
        }
    }
}

impl From<AssembleError> for LookupError {
    fn from(value: AssembleError) -> Self {
        Self::Assemble(value)
    }
}

/// Summary of how the source table was normalized.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizationReport {
    pub rows: usize,
    pub keyed_rows: usize,
    pub taxonomy_columns: usize,
    /// Taxonomy-looking labels dropped as malformed.
    pub rejected_columns: Vec<String>,
    /// Keys that occur more than once, with their row count.
    pub duplicate_keys: Vec<(String, i32, usize)>,
}

/// Immutable, precomputed lookup index over one assessment table.
#[derive(Debug, Clone)]
pub struct LookupService {
    /// Facts per keyed row, first row per key only.
    facts: Vec<Vec<CanonicalFact>>,
    /// country -> year -> index into `facts`.
    index: HashMap<String, BTreeMap<i32, usize>>,
    /// Distinct countries in first-seen table order.
    countries: Vec<String>,
    report: NormalizationReport,
}

impl LookupService {
    /// Normalizes the whole table and builds the key index.
    pub fn new(table: &AssessmentTable) -> Self {
        let started_at = Instant::now();
        let normalizer = RowNormalizer::new(table.columns());

        let mut facts = Vec::new();
        let mut index: HashMap<String, BTreeMap<i32, usize>> = HashMap::new();
        let mut countries = Vec::new();
        let mut occurrences: BTreeMap<(String, i32), usize> = BTreeMap::new();

        for row in table.rows() {
            let Some((country, year)) = row.key() else {
                continue;
            };
            *occurrences.entry((country.to_string(), year)).or_insert(0) += 1;

            let years = index.entry(country.to_string()).or_insert_with(|| {
                countries.push(country.to_string());
                BTreeMap::new()
            });
            if years.contains_key(&year) {
                continue;
            }
            years.insert(year, facts.len());
            facts.push(normalizer.normalize(&row.cells));
        }

        let duplicate_keys: Vec<(String, i32, usize)> = occurrences
            .into_iter()
            .filter(|(_, count)| *count > 1)
            .map(|((country, year), count)| (country, year, count))
            .collect();
        for (country, year, count) in &duplicate_keys {
            warn!(
                "event=lookup_duplicate_key module=service status=warn country={} year={} rows={} resolution=first_row",
                country, year, count
            );
        }
        for column in normalizer.rejected_columns() {
            debug!(
                "event=table_normalize module=service status=skipped column={:?} reason=malformed_label",
                column
            );
        }

        let report = NormalizationReport {
            rows: table.len(),
            keyed_rows: facts.len(),
            taxonomy_columns: normalizer.taxonomy_column_count(),
            rejected_columns: normalizer.rejected_columns().to_vec(),
            duplicate_keys,
        };
        info!(
            "event=table_normalize module=service status=ok rows={} keys={} taxonomy_columns={} rejected_columns={} duplicate_keys={} duration_ms={}",
            report.rows,
            report.keyed_rows,
            report.taxonomy_columns,
            report.rejected_columns.len(),
            report.duplicate_keys.len(),
            started_at.elapsed().as_millis()
        );

        Self {
            facts,
            index,
            countries,
            report,
        }
    }

    /// Returns the document for one key.
    ///
    /// # Errors
    /// - `LookupError::NotFound` when no row carries the key.
    /// - `LookupError::Assemble` when the stored facts violate coordinate
    ///   invariants.
    pub fn lookup(&self, country: &str, year: i32) -> LookupResult<Document> {
        let Some(facts) = self.facts_for(country, year) else {
            debug!(
                "event=lookup module=service status=not_found country={:?} year={}",
                country, year
            );
            return Err(LookupError::NotFound {
                country: country.to_string(),
                year,
            });
        };

        let document = assemble(facts, country, year)?;
        debug!(
            "event=lookup module=service status=ok country={:?} year={} pillars={}",
            country,
            year,
            document.pillars.len()
        );
        Ok(document)
    }

    /// Canonical facts of the authoritative row for one key.
    pub fn facts_for(&self, country: &str, year: i32) -> Option<&[CanonicalFact]> {
        let row_index = *self.index.get(country)?.get(&year)?;
        self.facts.get(row_index).map(Vec::as_slice)
    }

    /// Distinct countries in table order.
    pub fn countries(&self) -> &[String] {
        &self.countries
    }

    /// Assessment years available for a country, ascending.
    pub fn years_for(&self, country: &str) -> Vec<i32> {
        self.index
            .get(country)
            .map(|years| years.keys().copied().collect())
            .unwrap_or_default()
    }

    pub fn report(&self) -> &NormalizationReport {
        &self.report
    }
}

#[cfg(test)]
mod tests {
    use super::{LookupError, LookupService};
    use crate::model::table::{AssessmentRow, AssessmentTable, CellValue};

    fn table() -> AssessmentTable {
        let columns = ["Country", "Assessment date", "area EP.1", "area XX.9"]
            .iter()
            .map(|label| label.to_string())
            .collect();
        let row = |country: Option<&str>, year: Option<i32>, area: &str| {
            AssessmentRow::new(
                country.map(str::to_string),
                year,
                vec![
                    country.map(CellValue::from),
                    None,
                    Some(CellValue::from(area)),
                    None,
                ],
            )
        };
        AssessmentTable::new(
            columns,
            vec![
                row(Some("France"), Some(2022), "first"),
                row(Some("Chile"), Some(2024), "Yes"),
                row(Some("France"), Some(2022), "second"),
                row(Some("France"), Some(2021), "older"),
                row(None, Some(2024), "anonymous"),
                row(Some("Chile"), None, "undated"),
            ],
        )
    }

    #[test]
    fn duplicate_keys_resolve_to_first_row() {
        let service = LookupService::new(&table());
        let document = service.lookup("France", 2022).unwrap();
        assert_eq!(
            document.pillars[0].areas[0].assessment.as_deref(),
            Some("first")
        );
        assert_eq!(
            service.report().duplicate_keys,
            vec![("France".to_string(), 2022, 2)]
        );
    }

    #[test]
    fn not_found_is_a_structured_outcome() {
        let service = LookupService::new(&table());
        let err = service.lookup("france", 2022).unwrap_err();
        assert_eq!(
            err,
            LookupError::NotFound {
                country: "france".to_string(),
                year: 2022
            }
        );
        assert_eq!(
            err.to_string(),
            "No data found for country: france and year: 2022"
        );
    }

    #[test]
    fn countries_and_years_follow_table_order() {
        let service = LookupService::new(&table());
        assert_eq!(service.countries(), ["France", "Chile"]);
        assert_eq!(service.years_for("France"), vec![2021, 2022]);
        assert!(service.years_for("Atlantis").is_empty());
    }

    #[test]
    fn report_counts_rows_and_rejected_columns() {
        let service = LookupService::new(&table());
        let report = service.report();
        assert_eq!(report.rows, 6);
        assert_eq!(report.keyed_rows, 3);
        assert_eq!(report.taxonomy_columns, 1);
        assert_eq!(report.rejected_columns, vec!["area XX.9".to_string()]);
    }
}
