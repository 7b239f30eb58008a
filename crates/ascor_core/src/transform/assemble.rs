//! Canonical facts to document tree assembly.
//!
//! # Responsibility
//! - Group facts of one (country, year) key into pillars, areas, indicators
//!   and metrics.
//! - Apply the bottom-up sparsity rule.
//!
//! # Invariants
//! - Output order is EP/CP/CF, then area index, indicator letter, then
//!   metric suffix in `METRIC_SUFFIXES` order.
//! - Output is independent of input fact order. Facts sharing a coordinate
//!   resolve to one node: a present value beats an absent one, then the
//!   smaller rendered value wins.
//! - Indicators survive only with an assessment, a source or metrics; areas
//!   only with an assessment or indicators; pillars only with areas.
//! - Metric lists are never empty: they are `None` instead.

use crate::model::coordinate::{
    Coordinate, CoordinateError, CoordinateKind, Pillar, METRIC_SUFFIXES,
};
use crate::model::document::{Area, Document, Indicator, Metadata, Metric, PillarNode};
use crate::model::fact::CanonicalFact;
use log::debug;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Contract violations detected while assembling a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssembleError {
    /// A fact carried a coordinate that breaks the coordinate invariants.
    InvalidCoordinate {
        coordinate: Coordinate,
        reason: CoordinateError,
    },
}

impl Display for AssembleError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidCoordinate { coordinate, reason } => write!(
                f,
                "invalid {} fact for {}.{}: {reason}",
                coordinate.kind.keyword(),
                coordinate.pillar,
                coordinate.area
            ),
        }
    }
}

impl Error for AssembleError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidCoordinate { reason, .. } => Some(reason),
        }
    }
}

struct IndicatorBucket {
    assessment: Option<String>,
    source: Option<String>,
}

impl IndicatorBucket {
    fn rank(&self) -> (ValueRank<'_>, ValueRank<'_>) {
        (value_rank(&self.assessment), value_rank(&self.source))
    }
}

type ValueRank<'v> = (bool, Option<&'v str>);

/// Lower ranks win: present before absent, then by rendered text.
fn value_rank(value: &Option<String>) -> ValueRank<'_> {
    (value.is_none(), value.as_deref())
}

fn suffix_rank(suffix: &str) -> usize {
    METRIC_SUFFIXES
        .iter()
        .position(|known| *known == suffix)
        .unwrap_or(usize::MAX)
}

#[derive(Default)]
struct AreaBucket<'a> {
    /// Outer `Option` tracks whether an area fact was seen at all.
    assessment: Option<Option<String>>,
    indicators: BTreeMap<char, IndicatorBucket>,
    metrics: BTreeMap<char, Vec<(&'a str, String)>>,
}

/// Builds the document for one key from its canonical facts.
///
/// # Errors
/// - Returns `AssembleError::InvalidCoordinate` for any fact whose coordinate
///   fails `Coordinate::validate()`; no partial document is returned.
pub fn assemble(
    facts: &[CanonicalFact],
    country: &str,
    assessment_year: i32,
) -> Result<Document, AssembleError> {
    let mut grouped: BTreeMap<Pillar, BTreeMap<u8, AreaBucket<'_>>> = BTreeMap::new();

    for fact in facts {
        let coordinate = &fact.coordinate;
        coordinate
            .validate()
            .map_err(|reason| AssembleError::InvalidCoordinate {
                coordinate: coordinate.clone(),
                reason,
            })?;

        let bucket = grouped
            .entry(coordinate.pillar)
            .or_default()
            .entry(coordinate.area)
            .or_default();

        // `validate()` guarantees letters/suffixes for the kinds that need them.
        match (coordinate.kind, coordinate.indicator) {
            (CoordinateKind::Area, _) => {
                let candidate = fact.rendered_value();
                let replace = bucket
                    .assessment
                    .as_ref()
                    .map_or(true, |current| value_rank(&candidate) < value_rank(current));
                if replace {
                    bucket.assessment = Some(candidate);
                }
            }
            (CoordinateKind::Indicator, Some(letter)) => {
                let candidate = IndicatorBucket {
                    assessment: fact.rendered_value(),
                    source: fact.source.clone(),
                };
                match bucket.indicators.entry(letter) {
                    Entry::Vacant(entry) => {
                        entry.insert(candidate);
                    }
                    Entry::Occupied(mut entry) => {
                        if candidate.rank() < entry.get().rank() {
                            entry.insert(candidate);
                        }
                    }
                }
            }
            (CoordinateKind::Metric, Some(letter)) => {
                let suffix = coordinate.metric_suffix.as_deref().unwrap_or_default();
                if let Some(value) = fact.rendered_value() {
                    bucket.metrics.entry(letter).or_default().push((suffix, value));
                }
            }
            (_, None) => {}
        }
    }

    let mut pillars = Vec::new();
    for (pillar, areas) in grouped {
        let mut retained_areas = Vec::new();
        for (area_index, bucket) in areas {
            if let Some(area) = build_area(pillar, area_index, bucket) {
                retained_areas.push(area);
            }
        }
        if !retained_areas.is_empty() {
            pillars.push(PillarNode {
                name: pillar,
                areas: retained_areas,
            });
        }
    }

    Ok(Document {
        metadata: Metadata {
            country: country.to_string(),
            assessment_year,
        },
        pillars,
    })
}

fn build_area(pillar: Pillar, area_index: u8, bucket: AreaBucket<'_>) -> Option<Area> {
    let AreaBucket {
        assessment,
        indicators,
        mut metrics,
    } = bucket;
    let area_name = format!("{}.{}", pillar.code(), area_index);

    let mut retained_indicators = Vec::new();
    for (letter, indicator) in indicators {
        let name = format!("{area_name}.{letter}");
        let metrics = metrics.remove(&letter).and_then(|mut entries| {
            entries.sort_by(|left, right| {
                (suffix_rank(left.0), &left.1).cmp(&(suffix_rank(right.0), &right.1))
            });
            entries.dedup_by(|later, kept| later.0 == kept.0);
            let rendered: Vec<Metric> = entries
                .into_iter()
                .map(|(suffix, value)| Metric {
                    name: format!("{name}.{suffix}"),
                    value,
                })
                .collect();
            (!rendered.is_empty()).then_some(rendered)
        });

        if indicator.assessment.is_none() && indicator.source.is_none() && metrics.is_none() {
            continue;
        }
        retained_indicators.push(Indicator {
            name,
            assessment: indicator.assessment,
            source: indicator.source,
            metrics,
        });
    }

    for letter in metrics.keys() {
        debug!(
            "event=metric_orphaned module=transform status=skipped indicator={area_name}.{letter}"
        );
    }

    let assessment = assessment.flatten();
    if assessment.is_none() && retained_indicators.is_empty() {
        return None;
    }

    Some(Area {
        name: area_name,
        assessment,
        indicators: retained_indicators,
    })
}

#[cfg(test)]
mod tests {
    use super::{assemble, AssembleError};
    use crate::model::coordinate::{Coordinate, CoordinateKind, Pillar};
    use crate::model::fact::CanonicalFact;
    use crate::model::table::CellValue;

    fn fact(coordinate: Coordinate, value: Option<&str>) -> CanonicalFact {
        CanonicalFact::new(coordinate, value.map(CellValue::from))
    }

    #[test]
    fn empty_facts_yield_empty_pillars() {
        let document = assemble(&[], "Germany", 2023).unwrap();
        assert!(document.pillars.is_empty());
        assert_eq!(document.metadata.country, "Germany");
        assert_eq!(document.metadata.assessment_year, 2023);
    }

    #[test]
    fn area_without_assessment_or_indicators_is_dropped() {
        let facts = vec![
            fact(Coordinate::area(Pillar::Ep, 1).unwrap(), None),
            fact(Coordinate::indicator(Pillar::Ep, 1, 'a').unwrap(), None),
        ];
        let document = assemble(&facts, "Germany", 2023).unwrap();
        assert!(document.pillars.is_empty());
    }

    #[test]
    fn one_assessed_indicator_keeps_its_area() {
        let facts = vec![
            fact(Coordinate::area(Pillar::Ep, 1).unwrap(), None),
            fact(Coordinate::indicator(Pillar::Ep, 1, 'a').unwrap(), Some("Yes")),
        ];
        let document = assemble(&facts, "Germany", 2023).unwrap();
        assert_eq!(document.pillars.len(), 1);
        let area = &document.pillars[0].areas[0];
        assert_eq!(area.name, "EP.1");
        assert_eq!(area.assessment, None);
        assert_eq!(area.indicators[0].name, "EP.1.a");
    }

    #[test]
    fn metric_without_value_collapses_to_null_metrics() {
        let facts = vec![
            fact(Coordinate::indicator(Pillar::Cp, 2, 'b').unwrap(), Some("No")),
            fact(Coordinate::metric(Pillar::Cp, 2, 'b', "i").unwrap(), None),
        ];
        let document = assemble(&facts, "Chile", 2024).unwrap();
        let indicator = document.find_indicator("CP.2.b").unwrap();
        assert_eq!(indicator.metrics, None);
    }

    #[test]
    fn indicator_kept_by_metrics_alone() {
        let facts = vec![
            fact(Coordinate::indicator(Pillar::Cf, 1, 'a').unwrap(), None),
            fact(Coordinate::metric(Pillar::Cf, 1, 'a', "i").unwrap(), Some("1.5")),
        ];
        let document = assemble(&facts, "Chile", 2024).unwrap();
        let indicator = document.find_indicator("CF.1.a").unwrap();
        assert_eq!(indicator.assessment, None);
        let metrics = indicator.metrics.as_ref().unwrap();
        assert_eq!(metrics[0].name, "CF.1.a.i");
        assert_eq!(metrics[0].value, "1.5");
    }

    #[test]
    fn duplicate_metric_facts_keep_one_value_whatever_the_order() {
        let mut facts = vec![
            fact(Coordinate::indicator(Pillar::Ep, 2, 'a').unwrap(), Some("Yes")),
            fact(Coordinate::metric(Pillar::Ep, 2, 'a', "i").unwrap(), Some("2")),
            fact(Coordinate::metric(Pillar::Ep, 2, 'a', "i").unwrap(), Some("1")),
        ];
        let forward = assemble(&facts, "Chile", 2024).unwrap();
        facts.reverse();
        let reversed = assemble(&facts, "Chile", 2024).unwrap();

        assert_eq!(forward, reversed);
        let metrics = forward
            .find_indicator("EP.2.a")
            .and_then(|indicator| indicator.metrics.as_ref())
            .unwrap();
        assert_eq!(metrics.len(), 1);
        assert_eq!(metrics[0].name, "EP.2.a.i");
        assert_eq!(metrics[0].value, "1");
    }

    #[test]
    fn duplicate_indicator_and_area_facts_prefer_present_values() {
        let mut facts = vec![
            fact(Coordinate::area(Pillar::Cp, 1).unwrap(), None),
            fact(Coordinate::area(Pillar::Cp, 1).unwrap(), Some("Partial")),
            fact(Coordinate::indicator(Pillar::Cp, 1, 'a').unwrap(), Some("Yes")),
            fact(Coordinate::indicator(Pillar::Cp, 1, 'a').unwrap(), None),
            fact(Coordinate::indicator(Pillar::Cp, 1, 'a').unwrap(), Some("No")),
        ];
        let forward = assemble(&facts, "Chile", 2024).unwrap();
        facts.reverse();
        let reversed = assemble(&facts, "Chile", 2024).unwrap();

        assert_eq!(forward, reversed);
        let area = &forward.pillars[0].areas[0];
        assert_eq!(area.assessment.as_deref(), Some("Partial"));
        assert_eq!(area.indicators.len(), 1);
        assert_eq!(area.indicators[0].assessment.as_deref(), Some("No"));
    }

    #[test]
    fn metric_without_indicator_fact_is_not_rendered() {
        let facts = vec![
            fact(Coordinate::area(Pillar::Ep, 3).unwrap(), Some("Exempt")),
            fact(Coordinate::metric(Pillar::Ep, 3, 'c', "i").unwrap(), Some("7")),
        ];
        let document = assemble(&facts, "Chile", 2024).unwrap();
        let area = &document.pillars[0].areas[0];
        assert_eq!(area.assessment.as_deref(), Some("Exempt"));
        assert!(area.indicators.is_empty());
    }

    #[test]
    fn invalid_coordinate_is_an_error() {
        let broken = CanonicalFact::new(
            Coordinate {
                kind: CoordinateKind::Indicator,
                pillar: Pillar::Ep,
                area: 1,
                indicator: None,
                metric_suffix: None,
            },
            Some(CellValue::from("Yes")),
        );
        let err = assemble(&[broken], "Germany", 2023).unwrap_err();
        assert!(matches!(err, AssembleError::InvalidCoordinate { .. }));
    }
}
