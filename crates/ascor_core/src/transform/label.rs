//! Column label grammar.
//!
//! # Responsibility
//! - Decode raw column labels into taxonomy coordinates.
//! - Recognize the `source indicator …` side-channel.
//!
//! # Invariants
//! - Parsing is total: every input yields a `ColumnLabel`, never a panic.
//! - Only well-formed coordinates are returned; malformed taxonomy-looking
//!   labels are `NotATaxonomyColumn`.
//! - `parse_label(&c.label())` yields `c` for every well-formed coordinate.

use crate::model::coordinate::{Coordinate, CoordinateKind, Pillar, METRIC_SUFFIXES};
use once_cell::sync::Lazy;
use regex::Regex;

// Two uppercase letters are accepted here and checked against the pillar set
// afterwards, so unknown pillars fall through as non-taxonomy columns.
static LABEL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(source\s+indicator|area|indicator|metric)\s+([A-Z]{2})\.([1-9][0-9]*)(?:\.([a-z])(?:\.([a-z]+))?)?$",
    )
    .expect("valid taxonomy label regex")
});

const TAXONOMY_PREFIXES: &[&str] = &["area", "indicator", "metric", "source"];

/// Result of decoding one column label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnLabel {
    /// `area …`, `indicator …` or `metric …` column producing its own fact.
    Node(Coordinate),
    /// `source indicator …` column; carries the indicator coordinate it feeds.
    IndicatorSource(Coordinate),
    /// Id column, unrelated column or malformed taxonomy label.
    NotATaxonomyColumn,
}

impl ColumnLabel {
    pub fn is_taxonomy(&self) -> bool {
        !matches!(self, Self::NotATaxonomyColumn)
    }
}

/// Parses a column label. Case-sensitive; surrounding whitespace is ignored.
pub fn parse_label(label: &str) -> ColumnLabel {
    parse_inner(label.trim()).unwrap_or(ColumnLabel::NotATaxonomyColumn)
}

/// Returns whether a label starts like a taxonomy column.
///
/// Used for diagnostics: a label that looks like taxonomy but does not parse
/// points at dirty upstream headers.
pub fn looks_like_taxonomy(label: &str) -> bool {
    let trimmed = label.trim_start();
    TAXONOMY_PREFIXES.iter().any(|prefix| {
        trimmed
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with(char::is_whitespace))
    })
}

fn parse_inner(label: &str) -> Option<ColumnLabel> {
    let captures = LABEL_RE.captures(label)?;
    let keyword = captures.get(1)?.as_str();
    let pillar = Pillar::from_code(captures.get(2)?.as_str())?;
    // Overflowing area numbers are simply not taxonomy columns.
    let area = captures.get(3)?.as_str().parse::<u8>().ok()?;
    let letter = captures
        .get(4)
        .and_then(|value| value.as_str().chars().next());
    let suffix = captures.get(5).map(|value| value.as_str());

    if keyword.starts_with("source") {
        return match (letter, suffix) {
            (Some(letter), None) => Coordinate::indicator(pillar, area, letter)
                .ok()
                .map(ColumnLabel::IndicatorSource),
            _ => None,
        };
    }

    let kind = match keyword {
        "area" => CoordinateKind::Area,
        "indicator" => CoordinateKind::Indicator,
        "metric" => CoordinateKind::Metric,
        _ => return None,
    };

    let coordinate = match (kind, letter, suffix) {
        (CoordinateKind::Area, None, None) => Coordinate::area(pillar, area),
        (CoordinateKind::Indicator, Some(letter), None) => {
            Coordinate::indicator(pillar, area, letter)
        }
        (CoordinateKind::Metric, Some(letter), Some(suffix))
            if METRIC_SUFFIXES.contains(&suffix) =>
        {
            Coordinate::metric(pillar, area, letter, suffix)
        }
        _ => return None,
    };

    coordinate.ok().map(ColumnLabel::Node)
}
