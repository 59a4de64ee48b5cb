//! SQLite row source.
//!
//! RULE: Only the store talks to the database.
//! Scoring and analytics work on loaded records and never execute SQL.

use crate::{
    error::{AnalysisError, AnalysisResult},
    types::DEFAULT_TABLE,
};
use log::debug;
use rusqlite::{params, Connection};

mod customer;

pub use customer::LoadedRows;

pub struct DelinquencyStore {
    conn: Connection,
    table: String,
}

impl DelinquencyStore {
    pub fn open(path: &str) -> AnalysisResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        debug!("Opened database at {path}");
        Ok(Self {
            conn,
            table: DEFAULT_TABLE.to_string(),
        })
    }

    /// Open an in-memory database (used in tests and synthetic runs).
    pub fn in_memory() -> AnalysisResult<Self> {
        let conn = Connection::open(":memory:")?;
        Ok(Self {
            conn,
            table: DEFAULT_TABLE.to_string(),
        })
    }

    /// Point the store at a different source table.
    /// The name is interpolated into SQL, so only plain identifiers pass.
    pub fn with_table(mut self, table: &str) -> AnalysisResult<Self> {
        validate_identifier(table)?;
        self.table = table.to_string();
        Ok(self)
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Apply the schema migration to the configured table.
    pub fn migrate(&self) -> AnalysisResult<()> {
        let sql = include_str!("../../../migrations/001_delinquency.sql")
            .replace(DEFAULT_TABLE, &self.table);
        self.conn.execute_batch(&sql)?;
        Ok(())
    }

    /// Declared column types in table order, e.g. `("income", "REAL")`.
    pub fn column_types(&self) -> AnalysisResult<Vec<(String, String)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name, type FROM pragma_table_info(?1) ORDER BY cid")?;
        let rows = stmt.query_map(params![self.table], |row| Ok((row.get(0)?, row.get(1)?)))?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}

fn validate_identifier(name: &str) -> AnalysisResult<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };
    if valid {
        Ok(())
    } else {
        Err(AnalysisError::InvalidTableName {
            name: name.to_string(),
        })
    }
}
