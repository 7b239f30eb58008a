//! One-time, fail-fast startup loading.
//!
//! # Responsibility
//! - Pick the table repository named by configuration and load the table.
//! - Build the immutable `LookupService` before anything is served.
//!
//! # Invariants
//! - Either a fully built service is returned or nothing is; there is no
//!   partially loaded state to fall back on.

use crate::config::{ConfigError, DataFormat, ServiceConfig};
use crate::db::open_db_read_only;
use crate::model::table::AssessmentTable;
use crate::repo::csv_table_repo::CsvTableRepository;
use crate::repo::sqlite_table_repo::SqliteTableRepository;
use crate::repo::{RepoError, TableRepository};
use crate::service::lookup_service::LookupService;
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

#[derive(Debug)]
pub enum StartupError {
    Config(ConfigError),
    Repo(RepoError),
}

impl Display for StartupError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "failed to load assessment table: {err}"),
        }
    }
}

impl Error for StartupError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<ConfigError> for StartupError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<RepoError> for StartupError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Loads the configured table source.
pub fn load_table(config: &ServiceConfig) -> Result<AssessmentTable, StartupError> {
    let (path, format) = config.data_source()?;
    let table = match format {
        DataFormat::Sqlite => {
            let conn = open_db_read_only(path).map_err(RepoError::from)?;
            SqliteTableRepository::new(&conn, config.table_name.as_str())?.load_table()?
        }
        DataFormat::Csv => CsvTableRepository::new(path).load_table()?,
    };
    Ok(table)
}

/// Loads the table and builds the lookup service.
///
/// # Side effects
/// - Emits `service_start` logging events with duration and status.
pub fn load_lookup_service(config: &ServiceConfig) -> Result<LookupService, StartupError> {
    let started_at = Instant::now();
    info!("event=service_start module=service status=start");

    match load_table(config) {
        Ok(table) => {
            let service = LookupService::new(&table);
            info!(
                "event=service_start module=service status=ok countries={} duration_ms={}",
                service.countries().len(),
                started_at.elapsed().as_millis()
            );
            Ok(service)
        }
        Err(err) => {
            error!(
                "event=service_start module=service status=error duration_ms={} error={}",
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}
