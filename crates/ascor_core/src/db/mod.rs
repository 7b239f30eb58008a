//! SQLite access for assessment table sources.
//!
//! # Responsibility
//! - Open SQLite databases that hold the wide assessment table.
//! - Check that the expected table exists before anything reads it.
//!
//! # Invariants
//! - Connections used for loading are read-only; the loader never writes.
//! - Table names are validated before they are interpolated into SQL.

use std::error::Error;
use std::fmt::{Display, Formatter};

mod open;

pub(crate) use open::ensure_table_name;
pub use open::{open_db_read_only, table_exists, table_has_rowid};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    InvalidTableName(String),
    MissingTable(String),
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::InvalidTableName(name) => write!(f, "invalid table name `{name}`"),
            Self::MissingTable(name) => write!(f, "table `{name}` does not exist"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::InvalidTableName(_) | Self::MissingTable(_) => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
