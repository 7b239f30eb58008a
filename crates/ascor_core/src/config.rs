//! Startup configuration.
//!
//! # Responsibility
//! - Collect data source, routing and logging settings from the environment.
//! - Turn hosting-environment detection into an explicit `base_path` value.
//!
//! # Invariants
//! - `base_path` always starts with `/` and never ends with `/` (except the
//!   root path itself).
//! - Configuration is resolved once at startup and passed down explicitly.

use crate::logging::default_log_level;
use crate::repo::sqlite_table_repo::DEFAULT_TABLE_NAME;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const ENV_DATA_PATH: &str = "ASCOR_DATA_PATH";
pub const ENV_DATA_FORMAT: &str = "ASCOR_DATA_FORMAT";
pub const ENV_TABLE: &str = "ASCOR_TABLE";
pub const ENV_BASE_PATH: &str = "ASCOR_BASE_PATH";
pub const ENV_LOG_LEVEL: &str = "ASCOR_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "ASCOR_LOG_DIR";
pub const ENV_HOSTNAME: &str = "HOSTNAME";

/// Hosted notebook machines are named `nv-…` and serve behind this proxy prefix.
const HOSTED_HOSTNAME_PREFIX: &str = "nv-";
const HOSTED_BASE_PATH: &str = "/proxy/8000";

/// Storage format of the assessment table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFormat {
    Sqlite,
    Csv,
}

impl DataFormat {
    /// Infers the format from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "sqlite" | "sqlite3" | "db" => Some(Self::Sqlite),
            "csv" => Some(Self::Csv),
            _ => None,
        }
    }
}

impl FromStr for DataFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(Self::Sqlite),
            "csv" => Ok(Self::Csv),
            other => Err(ConfigError::UnknownDataFormat(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    MissingDataPath,
    UnknownDataFormat(String),
    UnrecognizedExtension(PathBuf),
    RelativeLogDir(PathBuf),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingDataPath => {
                write!(f, "no data path configured; set {ENV_DATA_PATH} or pass --data")
            }
            Self::UnknownDataFormat(value) => {
                write!(f, "unknown data format `{value}`; expected sqlite|csv")
            }
            Self::UnrecognizedExtension(path) => write!(
                f,
                "cannot infer data format from `{}`; set {ENV_DATA_FORMAT}",
                path.display()
            ),
            Self::RelativeLogDir(path) => {
                write!(f, "log dir must be an absolute path, got `{}`", path.display())
            }
        }
    }
}

impl Error for ConfigError {}

/// Resolved service configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub data_path: Option<PathBuf>,
    /// Explicit format; inferred from `data_path` when `None`.
    pub data_format: Option<DataFormat>,
    /// SQLite table holding the assessments.
    pub table_name: String,
    /// Prefix every routed path is served under.
    pub base_path: String,
    pub log_level: String,
    /// File logging is enabled only when set.
    pub log_dir: Option<PathBuf>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            data_path: None,
            data_format: None,
            table_name: DEFAULT_TABLE_NAME.to_string(),
            base_path: "/".to_string(),
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl ServiceConfig {
    /// Reads configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through an arbitrary key lookup.
    ///
    /// Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let config = Self {
            data_path: get(ENV_DATA_PATH).map(PathBuf::from),
            data_format: get(ENV_DATA_FORMAT)
                .map(|value| value.parse::<DataFormat>())
                .transpose()?,
            table_name: get(ENV_TABLE).unwrap_or_else(|| DEFAULT_TABLE_NAME.to_string()),
            base_path: match get(ENV_BASE_PATH) {
                Some(base_path) => normalize_base_path(&base_path),
                None => detect_base_path(get(ENV_HOSTNAME).as_deref()),
            },
            log_level: get(ENV_LOG_LEVEL).unwrap_or_else(|| default_log_level().to_string()),
            log_dir: get(ENV_LOG_DIR).map(PathBuf::from),
        };

        config.validate()?;
        Ok(config)
    }

    /// Checks cross-field constraints that parsing alone cannot.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(log_dir) = &self.log_dir {
            if !log_dir.is_absolute() {
                return Err(ConfigError::RelativeLogDir(log_dir.clone()));
            }
        }
        Ok(())
    }

    /// Data path and effective format.
    ///
    /// # Errors
    /// - `MissingDataPath` when no path is configured.
    /// - `UnrecognizedExtension` when the format is neither set nor inferable.
    pub fn data_source(&self) -> Result<(&Path, DataFormat), ConfigError> {
        let path = self
            .data_path
            .as_deref()
            .ok_or(ConfigError::MissingDataPath)?;
        let format = match self.data_format {
            Some(format) => format,
            None => DataFormat::from_path(path)
                .ok_or_else(|| ConfigError::UnrecognizedExtension(path.to_path_buf()))?,
        };
        Ok((path, format))
    }
}

/// Base path for a host: the proxy prefix on hosted notebooks, `/` elsewhere.
pub fn detect_base_path(hostname: Option<&str>) -> String {
    match hostname {
        Some(name) if name.starts_with(HOSTED_HOSTNAME_PREFIX) => HOSTED_BASE_PATH.to_string(),
        _ => "/".to_string(),
    }
}

/// Normalizes a base path to `/segment/...` form without a trailing slash.
pub fn normalize_base_path(value: &str) -> String {
    let segments: Vec<&str> = value
        .split('/')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .collect();
    if segments.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", segments.join("/"))
    }
}
