//! Storage engine access.
//!
//! `SqlStore` is the pipeline's view of the database: read the catalog, run a
//! statement. `SqliteStore` backs it with one long-lived rusqlite connection
//! guarded by a mutex; every call locks, runs to completion, and unlocks, so
//! no statement or transaction outlives the call.

use anyhow::{Context, Result};
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags};
use serde_json::{json, Value};
use sqlsage_shared::Row;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::info;

/// Storage errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database unavailable: {0}")]
    Unavailable(String),

    #[error("{0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// One column as declared in the catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    pub declared_type: Option<String>,
}

/// A foreign key from `from` to `table(to)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey {
    pub from: String,
    pub table: String,
    pub to: Option<String>,
}

/// A user table and its columns, in declaration order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    pub name: String,
    pub columns: Vec<ColumnInfo>,
    pub foreign_keys: Vec<ForeignKey>,
}

/// Trait abstraction over the storage engine
pub trait SqlStore: Send + Sync {
    /// User tables in catalog order
    fn catalog(&self) -> Result<Vec<TableSchema>, StoreError>;

    /// Run one statement and fetch every row
    fn query(&self, sql: &str) -> Result<Vec<Row>, StoreError>;

    /// Human-readable location, for logs and health reports
    fn describe(&self) -> String;
}

// ============================================================================
// SQLite
// ============================================================================

/// SQLite store (single connection with mutex)
pub struct SqliteStore {
    conn: Mutex<Connection>,
    location: String,
}

impl SqliteStore {
    /// Open an existing database file
    pub fn open(path: &Path, read_only: bool) -> Result<Self> {
        if !path.exists() {
            anyhow::bail!(
                "Database file '{}' not found. Run `sqlsagectl seed --db {}` first.",
                path.display(),
                path.display()
            );
        }

        let conn = if read_only {
            Connection::open_with_flags(
                path,
                OpenFlags::SQLITE_OPEN_READ_ONLY
                    | OpenFlags::SQLITE_OPEN_URI
                    | OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )
        } else {
            Connection::open(path)
        }
        .with_context(|| format!("Failed to open SQLite database {}", path.display()))?;

        conn.busy_timeout(Duration::from_secs(5))
            .context("Failed to set busy timeout")?;
        conn.pragma_update(None, "foreign_keys", "ON")
            .context("Failed to enable foreign keys")?;

        info!(
            "Opened database at {} ({})",
            path.display(),
            if read_only { "read-only" } else { "read-write" }
        );

        Ok(Self::from_connection(conn, path.display().to_string()))
    }

    /// Wrap an already open connection
    pub fn from_connection(conn: Connection, location: impl Into<String>) -> Self {
        Self {
            conn: Mutex::new(conn),
            location: location.into(),
        }
    }

    /// A panic in an earlier call leaves no statement open, so a poisoned
    /// lock still guards a usable connection.
    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SqlStore for SqliteStore {
    fn catalog(&self) -> Result<Vec<TableSchema>, StoreError> {
        let conn = self.lock();

        let mut statement = conn.prepare(
            "SELECT name FROM sqlite_master
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
        )?;
        let names = statement
            .query_map([], |row| row.get::<usize, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        names
            .into_iter()
            .map(|name| -> Result<TableSchema, StoreError> {
                let columns = load_columns(&conn, &name)?;
                let foreign_keys = load_foreign_keys(&conn, &name)?;
                Ok(TableSchema {
                    name,
                    columns,
                    foreign_keys,
                })
            })
            .collect()
    }

    fn query(&self, sql: &str) -> Result<Vec<Row>, StoreError> {
        let conn = self.lock();

        let mut statement = conn.prepare(sql)?;
        let column_names: Vec<String> = statement
            .column_names()
            .iter()
            .map(ToString::to_string)
            .collect();

        let mut rows = statement.query([])?;
        let mut result_rows = Vec::new();
        while let Some(row) = rows.next()? {
            let mut record = Row::new();
            for (index, column_name) in column_names.iter().enumerate() {
                let value = row.get_ref(index)?;
                record.insert(column_name.clone(), json_value_from_sql(value));
            }
            result_rows.push(record);
        }

        Ok(result_rows)
    }

    fn describe(&self) -> String {
        self.location.clone()
    }
}

fn load_columns(conn: &Connection, table: &str) -> Result<Vec<ColumnInfo>, StoreError> {
    let pragma_sql = format!("PRAGMA table_info({})", sqlite_single_quoted(table));
    let mut statement = conn.prepare(&pragma_sql)?;
    let columns = statement
        .query_map([], |row| {
            Ok(ColumnInfo {
                name: row.get::<usize, String>(1)?,
                declared_type: row
                    .get::<usize, Option<String>>(2)?
                    .filter(|t| !t.trim().is_empty()),
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(columns)
}

fn load_foreign_keys(conn: &Connection, table: &str) -> Result<Vec<ForeignKey>, StoreError> {
    let pragma_sql = format!("PRAGMA foreign_key_list({})", sqlite_single_quoted(table));
    let mut statement = conn.prepare(&pragma_sql)?;
    let keys = statement
        .query_map([], |row| {
            Ok(ForeignKey {
                table: row.get::<usize, String>(2)?,
                from: row.get::<usize, String>(3)?,
                to: row.get::<usize, Option<String>>(4)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(keys)
}

fn sqlite_single_quoted(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// TEXT is not guaranteed to be UTF-8; invalid bytes become U+FFFD
fn json_value_from_sql(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(value) => json!(value),
        ValueRef::Real(value) => json!(value),
        ValueRef::Text(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Value::String(format!("<blob {} bytes>", bytes.len())),
    }
}
