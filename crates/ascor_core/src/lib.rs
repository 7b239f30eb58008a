//! Core domain logic for the ASCOR assessment service.
//! Turns wide, column-encoded assessment rows into nested per-country
//! documents and serves them by (country, assessment year).

pub mod api;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod transform;

pub use api::router::{ApiResponse, ApiRouter};
pub use config::{ConfigError, DataFormat, ServiceConfig};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::coordinate::{
    Coordinate, CoordinateError, CoordinateKind, Pillar, METRIC_SUFFIXES,
};
pub use model::document::{Area, Document, Indicator, Metadata, Metric, PillarNode};
pub use model::fact::CanonicalFact;
pub use model::table::{AssessmentRow, AssessmentTable, CellValue};
pub use repo::csv_table_repo::CsvTableRepository;
pub use repo::sqlite_table_repo::SqliteTableRepository;
pub use repo::{RepoError, RepoResult, TableRepository};
pub use service::lookup_service::{LookupError, LookupResult, LookupService, NormalizationReport};
pub use service::startup::{load_lookup_service, load_table, StartupError};
pub use transform::assemble::{assemble, AssembleError};
pub use transform::label::{parse_label, ColumnLabel};
pub use transform::normalize::{normalize_row, RowNormalizer};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
