//! Canonical facts: one normalized record per taxonomy column of a row.

use crate::model::coordinate::Coordinate;
use crate::model::table::CellValue;

/// Normalized (coordinate, value, source) triple.
///
/// `value` is `None` for absent or NaN cells; a genuine empty string stays
/// `Some(CellValue::Text(""))`. `source` is only ever set on indicator facts.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalFact {
    pub coordinate: Coordinate,
    pub value: Option<CellValue>,
    pub source: Option<String>,
}

impl CanonicalFact {
    pub fn new(coordinate: Coordinate, value: Option<CellValue>) -> Self {
        Self {
            coordinate,
            value,
            source: None,
        }
    }

    /// Attaches a source string, consuming and returning the fact.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Value rendered the way it appears in the output document.
    pub fn rendered_value(&self) -> Option<String> {
        self.value.as_ref().map(ToString::to_string)
    }
}
