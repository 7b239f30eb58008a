//! Connection bootstrap utilities for SQLite table sources.
//!
//! # Responsibility
//! - Open database files read-only with a bounded busy timeout.
//! - Answer table existence checks.
//!
//! # Invariants
//! - A missing database file is an error, never a freshly created file.

use super::{DbError, DbResult};
use log::{error, info};
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::{Connection, OpenFlags};
use std::path::Path;
use std::time::{Duration, Instant};

static TABLE_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_ ]*$").expect("valid table name regex"));

/// Opens a SQLite database file for reading.
///
/// # Side effects
/// - Emits `db_open` logging events with duration and status.
pub fn open_db_read_only(path: impl AsRef<Path>) -> DbResult<Connection> {
    let path = path.as_ref();
    let started_at = Instant::now();
    info!(
        "event=db_open module=db status=start mode=read_only path={}",
        path.display()
    );

    let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX;
    let conn = match Connection::open_with_flags(path, flags) {
        Ok(conn) => conn,
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode=read_only duration_ms={} error_code=db_open_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err.into());
        }
    };

    if let Err(err) = conn.busy_timeout(Duration::from_secs(5)) {
        error!(
            "event=db_open module=db status=error mode=read_only duration_ms={} error_code=db_bootstrap_failed error={}",
            started_at.elapsed().as_millis(),
            err
        );
        return Err(err.into());
    }

    info!(
        "event=db_open module=db status=ok mode=read_only duration_ms={}",
        started_at.elapsed().as_millis()
    );
    Ok(conn)
}

/// Returns whether `table_name` exists as a table. Views do not count.
///
/// # Errors
/// - `DbError::InvalidTableName` when the name is not a plain identifier.
pub fn table_exists(conn: &Connection, table_name: &str) -> DbResult<bool> {
    ensure_table_name(table_name)?;
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table_name],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

/// Returns whether an existing table has a `rowid` (is not `WITHOUT ROWID`).
pub fn table_has_rowid(conn: &Connection, table_name: &str) -> DbResult<bool> {
    ensure_table_name(table_name)?;
    let without_rowid: i64 = conn.query_row(
        "SELECT wr FROM pragma_table_list WHERE schema = 'main' AND name = ?1;",
        [table_name],
        |row| row.get(0),
    )?;
    Ok(without_rowid == 0)
}

pub(crate) fn ensure_table_name(table_name: &str) -> DbResult<()> {
    if TABLE_NAME_RE.is_match(table_name) {
        Ok(())
    } else {
        Err(DbError::InvalidTableName(table_name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::{ensure_table_name, table_exists, table_has_rowid};
    use crate::db::DbError;
    use rusqlite::Connection;

    #[test]
    fn table_name_validation_rejects_sql_fragments() {
        assert!(ensure_table_name("assessments").is_ok());
        assert!(ensure_table_name("ASCOR assessments").is_ok());
        assert!(matches!(
            ensure_table_name("x\"; DROP TABLE y; --"),
            Err(DbError::InvalidTableName(_))
        ));
        assert!(ensure_table_name("").is_err());
    }

    #[test]
    fn table_exists_reports_presence() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE assessments (\"Country\" TEXT);")
            .unwrap();
        assert!(table_exists(&conn, "assessments").unwrap());
        assert!(!table_exists(&conn, "missing").unwrap());
    }

    #[test]
    fn views_are_not_tables_and_rowid_is_detected() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE assessments (\"Country\" TEXT);
             CREATE VIEW latest AS SELECT * FROM assessments;
             CREATE TABLE keyed (\"Country\" TEXT PRIMARY KEY) WITHOUT ROWID;",
        )
        .unwrap();
        assert!(!table_exists(&conn, "latest").unwrap());
        assert!(table_has_rowid(&conn, "assessments").unwrap());
        assert!(!table_has_rowid(&conn, "keyed").unwrap());
    }
}
