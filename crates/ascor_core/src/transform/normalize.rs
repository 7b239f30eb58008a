//! Wide row to canonical fact normalization.
//!
//! # Responsibility
//! - Melt one wide row into an ordered sequence of `CanonicalFact`s.
//! - Merge `source indicator …` columns into the matching indicator fact.
//!
//! # Invariants
//! - Facts follow input column order; assembly re-sorts.
//! - Absent and NaN cells become `value = None`; present cells are kept as-is.
//! - A taxonomy column with an absent value still emits a fact.
//! - Only indicator facts ever carry a source.

use crate::model::coordinate::{Coordinate, CoordinateKind};
use crate::model::fact::CanonicalFact;
use crate::model::table::CellValue;
use crate::transform::label::{looks_like_taxonomy, parse_label, ColumnLabel};
use log::debug;
use std::collections::{HashMap, HashSet};

/// Column labels of one table, parsed once and reused for every row.
#[derive(Debug, Clone)]
pub struct RowNormalizer {
    plan: Vec<ColumnLabel>,
    rejected_columns: Vec<String>,
}

impl RowNormalizer {
    /// Parses every column label of a table.
    pub fn new<S: AsRef<str>>(columns: &[S]) -> Self {
        let plan: Vec<ColumnLabel> = columns
            .iter()
            .map(|column| parse_label(column.as_ref()))
            .collect();
        let rejected_columns = columns
            .iter()
            .zip(plan.iter())
            .filter(|(column, parsed)| !parsed.is_taxonomy() && looks_like_taxonomy(column.as_ref()))
            .map(|(column, _)| column.as_ref().to_string())
            .collect();

        Self {
            plan,
            rejected_columns,
        }
    }

    /// Taxonomy-looking labels that failed to parse and are dropped.
    pub fn rejected_columns(&self) -> &[String] {
        &self.rejected_columns
    }

    /// Number of columns that produce facts or sources.
    pub fn taxonomy_column_count(&self) -> usize {
        self.plan.iter().filter(|parsed| parsed.is_taxonomy()).count()
    }

    /// Normalizes one row whose cells are aligned with the parsed columns.
    ///
    /// Missing trailing cells are treated as absent.
    pub fn normalize(&self, cells: &[Option<CellValue>]) -> Vec<CanonicalFact> {
        let mut facts = Vec::new();
        let mut sources: HashMap<&Coordinate, String> = HashMap::new();

        for (index, parsed) in self.plan.iter().enumerate() {
            let value = cells.get(index).cloned().flatten().filter(|value| !value.is_nan());
            match parsed {
                ColumnLabel::Node(coordinate) => {
                    facts.push(CanonicalFact::new(coordinate.clone(), value));
                }
                ColumnLabel::IndicatorSource(coordinate) => {
                    if let Some(value) = value {
                        sources.entry(coordinate).or_insert_with(|| value.to_string());
                    }
                }
                ColumnLabel::NotATaxonomyColumn => {}
            }
        }

        let mut attached: HashSet<&Coordinate> = HashSet::new();
        for fact in &mut facts {
            if fact.coordinate.kind != CoordinateKind::Indicator {
                continue;
            }
            // Every column decoding to this indicator gets the same source.
            if let Some((coordinate, source)) = sources.get_key_value(&fact.coordinate) {
                fact.source = Some(source.clone());
                attached.insert(*coordinate);
            }
        }

        for coordinate in sources.keys().filter(|coordinate| !attached.contains(**coordinate)) {
            debug!(
                "event=source_orphaned module=transform status=skipped coordinate={}",
                coordinate.name()
            );
        }

        facts
    }
}

/// Normalizes one row against its column labels.
///
/// Convenience wrapper for single rows; table-wide callers should build one
/// `RowNormalizer` and reuse it.
pub fn normalize_row<S: AsRef<str>>(
    columns: &[S],
    cells: &[Option<CellValue>],
) -> Vec<CanonicalFact> {
    RowNormalizer::new(columns).normalize(cells)
}

#[cfg(test)]
mod tests {
    use super::{normalize_row, RowNormalizer};
    use crate::model::coordinate::{Coordinate, Pillar};
    use crate::model::table::CellValue;

    fn text(value: &str) -> Option<CellValue> {
        Some(CellValue::from(value))
    }

    #[test]
    fn emits_facts_in_column_order_and_skips_id_columns() {
        let columns = [
            "Country",
            "metric EP.1.a.i",
            "Assessment date",
            "area EP.1",
            "indicator EP.1.a",
        ];
        let cells = vec![
            text("Germany"),
            Some(CellValue::Integer(42)),
            text("2023-10-01"),
            text("Partial"),
            text("Yes"),
        ];

        let facts = normalize_row(&columns, &cells);
        let labels: Vec<String> = facts.iter().map(|fact| fact.coordinate.label()).collect();
        assert_eq!(
            labels,
            vec!["metric EP.1.a.i", "area EP.1", "indicator EP.1.a"]
        );
        assert_eq!(facts[0].value, Some(CellValue::Integer(42)));
    }

    #[test]
    fn blank_and_nan_become_absent_but_empty_text_survives() {
        let columns = ["area EP.1", "area EP.2", "area EP.3"];
        let cells = vec![None, Some(CellValue::Real(f64::NAN)), text("")];

        let facts = normalize_row(&columns, &cells);
        assert_eq!(facts.len(), 3);
        assert_eq!(facts[0].value, None);
        assert_eq!(facts[1].value, None);
        assert_eq!(facts[2].value, text(""));
    }

    #[test]
    fn sources_attach_to_matching_indicator_only() {
        let columns = [
            "source indicator EP.1.a",
            "indicator EP.1.a",
            "indicator EP.1.b",
            "source indicator CP.2.c",
        ];
        let cells = vec![text("IEA 2023"), text("Yes"), text("No"), text("orphan")];

        let facts = normalize_row(&columns, &cells);
        assert_eq!(facts.len(), 2);
        assert_eq!(
            facts[0].coordinate,
            Coordinate::indicator(Pillar::Ep, 1, 'a').unwrap()
        );
        assert_eq!(facts[0].source.as_deref(), Some("IEA 2023"));
        assert_eq!(facts[1].source, None);
    }

    #[test]
    fn source_reaches_every_column_of_the_same_indicator() {
        let columns = [
            "indicator EP.1.a",
            "source indicator EP.1.a",
            " indicator EP.1.a",
        ];
        let facts = normalize_row(&columns, &[text("Yes"), text("IEA 2023"), text("No")]);
        assert_eq!(facts.len(), 2);
        assert_eq!(facts[0].source.as_deref(), Some("IEA 2023"));
        assert_eq!(facts[1].source.as_deref(), Some("IEA 2023"));
    }

    #[test]
    fn absent_source_cell_attaches_nothing() {
        let columns = ["indicator EP.1.a", "source indicator EP.1.a"];
        let facts = normalize_row(&columns, &[text("Yes"), None]);
        assert_eq!(facts[0].source, None);
    }

    #[test]
    fn short_rows_are_padded_with_absent_values() {
        let columns = ["area EP.1", "indicator EP.1.a"];
        let facts = normalize_row(&columns, &[text("Partial")]);
        assert_eq!(facts.len(), 2);
        assert_eq!(facts[1].value, None);
    }

    #[test]
    fn reports_rejected_taxonomy_looking_columns() {
        let normalizer =
            RowNormalizer::new(&["Country", "area XX.1", "area EP.1", "metric EP.1.a"]);
        assert_eq!(normalizer.rejected_columns(), ["area XX.1", "metric EP.1.a"]);
        assert_eq!(normalizer.taxonomy_column_count(), 1);
    }
}
