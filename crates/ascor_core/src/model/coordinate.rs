//! Taxonomy coordinate model.
//!
//! # Responsibility
//! - Identify one area/indicator/metric node of the assessment taxonomy.
//! - Render coordinates back to column labels and document node names.
//!
//! # Invariants
//! - `area` is 1-based and bounded by `Pillar::max_area()`.
//! - `Area` coordinates carry neither an indicator letter nor a metric suffix.
//! - `Indicator` coordinates carry a lowercase letter and no metric suffix.
//! - `Metric` coordinates carry both a letter and a suffix from
//!   `METRIC_SUFFIXES`; the column grammar accepts exactly that set.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Metric suffixes used by the taxonomy, in output order.
pub const METRIC_SUFFIXES: &[&str] = &["i"];

/// Top-level taxonomy category.
///
/// Declaration order is the fixed output order (`EP`, `CP`, `CF`), so the
/// derived `Ord` doubles as the document sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Pillar {
    #[serde(rename = "EP")]
    Ep,
    #[serde(rename = "CP")]
    Cp,
    #[serde(rename = "CF")]
    Cf,
}

impl Pillar {
    /// All pillars in taxonomy order.
    pub const ALL: [Pillar; 3] = [Pillar::Ep, Pillar::Cp, Pillar::Cf];

    /// Stable two-letter code used in column labels and node names.
    pub fn code(self) -> &'static str {
        match self {
            Self::Ep => "EP",
            Self::Cp => "CP",
            Self::Cf => "CF",
        }
    }

    /// Highest valid 1-based area index for this pillar.
    pub fn max_area(self) -> u8 {
        match self {
            Self::Ep => 3,
            Self::Cp => 6,
            Self::Cf => 4,
        }
    }

    /// Parses a pillar code. Case-sensitive.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "EP" => Some(Self::Ep),
            "CP" => Some(Self::Cp),
            "CF" => Some(Self::Cf),
            _ => None,
        }
    }
}

impl Display for Pillar {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Taxonomy level addressed by a coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordinateKind {
    Area,
    Indicator,
    Metric,
}

impl CoordinateKind {
    /// Keyword that prefixes this kind in column labels.
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Area => "area",
            Self::Indicator => "indicator",
            Self::Metric => "metric",
        }
    }
}

/// Validation failures for hand-built coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoordinateError {
    AreaOutOfRange { pillar: Pillar, area: u8 },
    InvalidIndicatorLetter(char),
    MissingIndicator(CoordinateKind),
    UnexpectedIndicator(CoordinateKind),
    MissingMetricSuffix,
    UnexpectedMetricSuffix(CoordinateKind),
    InvalidMetricSuffix(String),
}

impl Display for CoordinateError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AreaOutOfRange { pillar, area } => write!(
                f,
                "area {area} is out of range for pillar {pillar} (1..={})",
                pillar.max_area()
            ),
            Self::InvalidIndicatorLetter(letter) => {
                write!(f, "indicator letter `{letter}` must be a lowercase ascii letter")
            }
            Self::MissingIndicator(kind) => {
                write!(f, "{} coordinate requires an indicator letter", kind.keyword())
            }
            Self::UnexpectedIndicator(kind) => {
                write!(f, "{} coordinate must not carry an indicator letter", kind.keyword())
            }
            Self::MissingMetricSuffix => write!(f, "metric coordinate requires a metric suffix"),
            Self::UnexpectedMetricSuffix(kind) => {
                write!(f, "{} coordinate must not carry a metric suffix", kind.keyword())
            }
            Self::InvalidMetricSuffix(suffix) => {
                write!(f, "metric suffix `{suffix}` is not one of {METRIC_SUFFIXES:?}")
            }
        }
    }
}

impl Error for CoordinateError {}

/// Position of one node in the pillar/area/indicator/metric taxonomy.
///
/// Fields are public so callers can pattern-match freely; anything built by
/// hand should go through `validate()` (the constructors already do).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coordinate {
    pub kind: CoordinateKind,
    pub pillar: Pillar,
    /// 1-based area index within the pillar.
    pub area: u8,
    /// Meaningful for `Indicator` and `Metric` kinds.
    pub indicator: Option<char>,
    /// Meaningful only for `Metric`; one of `METRIC_SUFFIXES`.
    pub metric_suffix: Option<String>,
}

impl Coordinate {
    /// Builds a validated area coordinate.
    pub fn area(pillar: Pillar, area: u8) -> Result<Self, CoordinateError> {
        let coordinate = Self {
            kind: CoordinateKind::Area,
            pillar,
            area,
            indicator: None,
            metric_suffix: None,
        };
        coordinate.validate()?;
        Ok(coordinate)
    }

    /// Builds a validated indicator coordinate.
    pub fn indicator(pillar: Pillar, area: u8, letter: char) -> Result<Self, CoordinateError> {
        let coordinate = Self {
            kind: CoordinateKind::Indicator,
            pillar,
            area,
            indicator: Some(letter),
            metric_suffix: None,
        };
        coordinate.validate()?;
        Ok(coordinate)
    }

    /// Builds a validated metric coordinate.
    pub fn metric(
        pillar: Pillar,
        area: u8,
        letter: char,
        suffix: impl Into<String>,
    ) -> Result<Self, CoordinateError> {
        let coordinate = Self {
            kind: CoordinateKind::Metric,
            pillar,
            area,
            indicator: Some(letter),
            metric_suffix: Some(suffix.into()),
        };
        coordinate.validate()?;
        Ok(coordinate)
    }

    /// Checks the kind/field invariants listed in the module docs.
    pub fn validate(&self) -> Result<(), CoordinateError> {
        if self.area == 0 || self.area > self.pillar.max_area() {
            return Err(CoordinateError::AreaOutOfRange {
                pillar: self.pillar,
                area: self.area,
            });
        }

        match (self.kind, self.indicator) {
            (CoordinateKind::Area, Some(_)) => {
                return Err(CoordinateError::UnexpectedIndicator(self.kind));
            }
            (CoordinateKind::Indicator | CoordinateKind::Metric, None) => {
                return Err(CoordinateError::MissingIndicator(self.kind));
            }
            (_, Some(letter)) if !letter.is_ascii_lowercase() => {
                return Err(CoordinateError::InvalidIndicatorLetter(letter));
            }
            _ => {}
        }

        match (self.kind, self.metric_suffix.as_deref()) {
            (CoordinateKind::Metric, None) => Err(CoordinateError::MissingMetricSuffix),
            (CoordinateKind::Metric, Some(suffix)) => {
                if METRIC_SUFFIXES.contains(&suffix) {
                    Ok(())
                } else {
                    Err(CoordinateError::InvalidMetricSuffix(suffix.to_string()))
                }
            }
            (kind, Some(_)) => Err(CoordinateError::UnexpectedMetricSuffix(kind)),
            (_, None) => Ok(()),
        }
    }

    /// Node name used in the output document, e.g. `EP.1`, `EP.1.a`, `EP.1.a.i`.
    pub fn name(&self) -> String {
        let mut name = format!("{}.{}", self.pillar.code(), self.area);
        if let Some(letter) = self.indicator {
            name.push('.');
            name.push(letter);
        }
        if let Some(suffix) = self.metric_suffix.as_deref() {
            name.push('.');
            name.push_str(suffix);
        }
        name
    }

    /// Canonical column label, e.g. `metric EP.1.a.i`.
    pub fn label(&self) -> String {
        format!("{} {}", self.kind.keyword(), self.name())
    }

    /// Column label of the source side-channel for an indicator coordinate.
    pub fn source_label(&self) -> Option<String> {
        match self.kind {
            CoordinateKind::Indicator => Some(format!("source {}", self.label())),
            _ => None,
        }
    }
}

impl Display for Coordinate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.label())
    }
}
