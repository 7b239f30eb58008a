//! Output document tree.
//!
//! # Responsibility
//! - Define the nested metadata/pillar/area/indicator/metric JSON shape.
//!
//! # Invariants
//! - Optional fields serialize as `null`, never as omitted keys.
//! - `Indicator::metrics` is `None` rather than an empty list.

use crate::model::coordinate::Pillar;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub country: String,
    pub assessment_year: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metric {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Indicator {
    pub name: String,
    pub assessment: Option<String>,
    pub source: Option<String>,
    /// Never `Some(vec![])`; empty metric lists collapse to `None`.
    pub metrics: Option<Vec<Metric>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Area {
    pub name: String,
    pub assessment: Option<String>,
    pub indicators: Vec<Indicator>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PillarNode {
    /// Serialized as `"EP"`, `"CP"` or `"CF"`.
    pub name: Pillar,
    pub areas: Vec<Area>,
}

/// Assessment document for one (country, assessment year) key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub metadata: Metadata,
    pub pillars: Vec<PillarNode>,
}

impl Document {
    /// Creates a document with no pillars.
    pub fn empty(country: impl Into<String>, assessment_year: i32) -> Self {
        Self {
            metadata: Metadata {
                country: country.into(),
                assessment_year,
            },
            pillars: Vec::new(),
        }
    }

    /// Finds an indicator by node name, e.g. `EP.1.a`.
    pub fn find_indicator(&self, name: &str) -> Option<&Indicator> {
        self.pillars
            .iter()
            .flat_map(|pillar| pillar.areas.iter())
            .flat_map(|area| area.indicators.iter())
            .find(|indicator| indicator.name == name)
    }
}
