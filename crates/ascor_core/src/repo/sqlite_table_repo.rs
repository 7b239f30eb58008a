//! SQLite-backed assessment table source.
//!
//! # Responsibility
//! - Read one wide table from a SQLite database, column labels included.
//! - Map SQLite storage classes onto `CellValue`.
//!
//! # Invariants
//! - Rows are read in `rowid` order, which is the table order used for
//!   duplicate-key tie-breaks.
//! - `NULL` maps to an absent cell; `BLOB` values are rejected.
//! - Views and `WITHOUT ROWID` tables are rejected; they have no `rowid` order.

use super::{build_table, RepoError, RepoResult, TableRepository};
use crate::db::{ensure_table_name, table_exists, table_has_rowid, DbError};
use crate::model::table::{AssessmentTable, CellValue};
use rusqlite::types::ValueRef;
use rusqlite::Connection;

/// Default table name used when configuration does not override it.
pub const DEFAULT_TABLE_NAME: &str = "assessments";

/// SQLite table repository bound to an open connection.
pub struct SqliteTableRepository<'conn> {
    conn: &'conn Connection,
    table_name: String,
}

impl<'conn> SqliteTableRepository<'conn> {
    /// Creates a repository reading `table_name`.
    ///
    /// # Errors
    /// - `DbError::InvalidTableName` for names that are not plain identifiers.
    pub fn new(conn: &'conn Connection, table_name: impl Into<String>) -> RepoResult<Self> {
        let table_name = table_name.into();
        ensure_table_name(&table_name)?;
        Ok(Self { conn, table_name })
    }
}

impl TableRepository for SqliteTableRepository<'_> {
    fn load_table(&self) -> RepoResult<AssessmentTable> {
        if !table_exists(self.conn, &self.table_name)? {
            return Err(DbError::MissingTable(self.table_name.clone()).into());
        }
        if !table_has_rowid(self.conn, &self.table_name)? {
            return Err(RepoError::InvalidData(format!(
                "table `{}` is declared WITHOUT ROWID; rows have no stable order",
                self.table_name
            )));
        }

        let mut stmt = self
            .conn
            .prepare(&format!("SELECT * FROM \"{}\" ORDER BY rowid;", self.table_name))?;
        let columns: Vec<String> = stmt
            .column_names()
            .into_iter()
            .map(str::to_string)
            .collect();
        let column_count = columns.len();

        let mut rows = stmt.query([])?;
        let mut raw_rows = Vec::new();
        while let Some(row) = rows.next()? {
            let mut cells = Vec::with_capacity(column_count);
            for (index, column) in columns.iter().enumerate() {
                cells.push(parse_cell(row.get_ref(index)?, column)?);
            }
            raw_rows.push(cells);
        }

        build_table(
            &format!("sqlite:{}", self.table_name),
            columns,
            raw_rows,
        )
    }
}

fn parse_cell(value: ValueRef<'_>, column: &str) -> RepoResult<Option<CellValue>> {
    match value {
        ValueRef::Null => Ok(None),
        ValueRef::Integer(number) => Ok(Some(CellValue::Integer(number))),
        ValueRef::Real(number) => Ok(Some(CellValue::Real(number))),
        ValueRef::Text(bytes) => std::str::from_utf8(bytes)
            .map(|text| Some(CellValue::Text(text.to_string())))
            .map_err(|_| {
                RepoError::InvalidData(format!("non UTF-8 text in column `{column}`"))
            }),
        ValueRef::Blob(_) => Err(RepoError::InvalidData(format!(
            "unsupported blob value in column `{column}`"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::{SqliteTableRepository, TableRepository};
    use crate::db::DbError;
    use crate::model::table::CellValue;
    use crate::repo::RepoError;
    use rusqlite::Connection;

    fn fixture() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE assessments (
                \"Country\" TEXT,
                \"Assessment date\" TEXT,
                \"area EP.1\" TEXT,
                \"metric EP.1.a.i\" REAL
            );
            INSERT INTO assessments VALUES ('Germany', '2023-10-01', 'Partial', 42.0);
            INSERT INTO assessments VALUES ('France', '2022-05-01', NULL, NULL);",
        )
        .unwrap();
        conn
    }

    #[test]
    fn loads_columns_rows_and_storage_classes() {
        let conn = fixture();
        let table = SqliteTableRepository::new(&conn, "assessments")
            .unwrap()
            .load_table()
            .unwrap();

        assert_eq!(
            table.columns(),
            ["Country", "Assessment date", "area EP.1", "metric EP.1.a.i"]
        );
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[0].key(), Some(("Germany", 2023)));
        assert_eq!(table.rows()[0].cells[3], Some(CellValue::Real(42.0)));
        assert_eq!(table.rows()[1].cells[2], None);
    }

    #[test]
    fn missing_table_is_reported() {
        let conn = fixture();
        let err = SqliteTableRepository::new(&conn, "nope")
            .unwrap()
            .load_table()
            .unwrap_err();
        assert!(matches!(err, RepoError::Db(DbError::MissingTable(name)) if name == "nope"));
    }

    #[test]
    fn views_and_without_rowid_tables_are_rejected() {
        let conn = fixture();
        conn.execute_batch(
            "CREATE VIEW german AS SELECT * FROM assessments WHERE \"Country\" = 'Germany';
             CREATE TABLE keyed (
                \"Country\" TEXT,
                \"Assessment date\" TEXT,
                PRIMARY KEY (\"Country\", \"Assessment date\")
             ) WITHOUT ROWID;",
        )
        .unwrap();

        let err = SqliteTableRepository::new(&conn, "german")
            .unwrap()
            .load_table()
            .unwrap_err();
        assert!(matches!(err, RepoError::Db(DbError::MissingTable(name)) if name == "german"));

        let err = SqliteTableRepository::new(&conn, "keyed")
            .unwrap()
            .load_table()
            .unwrap_err();
        assert!(matches!(
            err,
            RepoError::InvalidData(message) if message.contains("WITHOUT ROWID")
        ));
    }

    #[test]
    fn blob_cells_are_rejected() {
        let conn = fixture();
        conn.execute_batch(
            "INSERT INTO assessments VALUES ('Chile', '2024-01-01', x'00ff', NULL);",
        )
        .unwrap();
        let err = SqliteTableRepository::new(&conn, "assessments")
            .unwrap()
            .load_table()
            .unwrap_err();
        assert!(matches!(err, RepoError::InvalidData(_)));
    }
}
