/*!
 * Database connection management.
 *
 * This module handles SQLite database connection creation and implements the
 * query-execution boundary on top of it.
 */

use log::{debug, info};
use rusqlite::types::Value;
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use super::backend::QueryBackend;
use crate::errors::{Result, StorageError};

/// Default database filename
const DEFAULT_DB_FILENAME: &str = "translations.db";

/// Default database directory name under user's data directory
const DEFAULT_DB_DIRNAME: &str = "translation-store";

/// Database connection wrapper with thread-safe access
#[derive(Clone)]
pub struct DatabaseConnection {
    /// Path to the database file
    db_path: PathBuf,
    /// Thread-safe connection wrapped in Arc<Mutex>
    connection: Arc<Mutex<Connection>>,
    /// Number of statements sent to the database
    queries: Arc<AtomicUsize>,
}

impl DatabaseConnection {
    /// Create a new database connection at the default location
    pub fn new_default() -> Result<Self> {
        let db_path = Self::default_database_path()?;
        Self::new(&db_path)
    }

    /// Create a new database connection at the specified path
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_path = db_path.as_ref().to_path_buf();

        // Ensure parent directory exists
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| StorageError::ResourceUnavailable {
                    path: parent.display().to_string(),
                    source: e,
                })?;
            }
        }

        info!("Opening database at: {:?}", db_path);

        let conn = Connection::open(&db_path)?;

        Ok(Self {
            db_path,
            connection: Arc::new(Mutex::new(conn)),
            queries: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// Create an in-memory database (for testing)
    pub fn new_in_memory() -> Result<Self> {
        debug!("Creating in-memory database");

        let conn = Connection::open_in_memory()?;

        Ok(Self {
            db_path: PathBuf::from(":memory:"),
            connection: Arc::new(Mutex::new(conn)),
            queries: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// Get the default database path
    pub fn default_database_path() -> Result<PathBuf> {
        // Try to use the system data directory
        let base_dir = dirs::data_local_dir()
            .or_else(dirs::data_dir)
            .or_else(|| dirs::home_dir().map(|h| h.join(".local").join("share")))
            .ok_or_else(|| StorageError::Backend {
                statement: None,
                message: "Could not determine data directory".to_string(),
            })?;

        Ok(base_dir.join(DEFAULT_DB_DIRNAME).join(DEFAULT_DB_FILENAME))
    }

    /// Get the database file path
    pub fn path(&self) -> &Path {
        &self.db_path
    }

    /// Number of statements executed through this connection so far
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::Relaxed)
    }

    /// Execute a database operation with the connection
    ///
    /// This method acquires the mutex lock and executes the provided closure
    /// with access to the connection.
    pub fn with_connection<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> rusqlite::Result<T>,
    {
        let conn = self.connection.lock().map_err(|e| StorageError::Backend {
            statement: None,
            message: format!("Failed to acquire database lock: {}", e),
        })?;

        Ok(f(&conn)?)
    }

    /// Run one statement, counting it and tagging failures with its text
    fn run<F, T>(&self, sql: &str, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> rusqlite::Result<T>,
    {
        self.queries.fetch_add(1, Ordering::Relaxed);
        debug!("SQL: {}", sql);

        self.with_connection(f).map_err(|e| match e {
            StorageError::Backend { message, .. } => StorageError::backend(sql, message),
            other => other,
        })
    }
}

/// Render a SQLite value the way the boundary reports it
fn value_to_string(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Integer(i) => Some(i.to_string()),
        Value::Real(r) => Some(r.to_string()),
        Value::Text(s) => Some(s),
        Value::Blob(b) => Some(String::from_utf8_lossy(&b).into_owned()),
    }
}

impl QueryBackend for DatabaseConnection {
    fn execute(&self, sql: &str) -> Result<usize> {
        self.run(sql, |conn| conn.execute(sql, []))
    }

    fn query_one(&self, sql: &str) -> Result<Option<String>> {
        self.run(sql, |conn| {
            let mut stmt = conn.prepare(sql)?;
            let mut rows = stmt.query([])?;
            let value = match rows.next()? {
                Some(row) => value_to_string(row.get::<_, Value>(0)?),
                None => None,
            };
            Ok(value)
        })
    }

    fn query_column(&self, sql: &str) -> Result<Vec<Option<String>>> {
        self.run(sql, |conn| {
            let mut stmt = conn.prepare(sql)?;
            let values = stmt
                .query_map([], |row| row.get::<_, Value>(0))?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(values.into_iter().map(value_to_string).collect())
        })
    }

    fn query_rows(&self, sql: &str) -> Result<Vec<Vec<Option<String>>>> {
        self.run(sql, |conn| {
            let mut stmt = conn.prepare(sql)?;
            let columns = stmt.column_count();
            let rows = stmt
                .query_map([], |row| {
                    (0..columns)
                        .map(|i| row.get::<_, Value>(i).map(value_to_string))
                        .collect::<rusqlite::Result<Vec<_>>>()
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })
    }

    fn quote(&self, value: &str) -> String {
        format!("'{}'", value.replace('\'', "''"))
    }

    fn list_tables(&self) -> Result<Vec<String>> {
        let sql = "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name";
        Ok(self.query_column(sql)?.into_iter().flatten().collect())
    }

    fn list_columns(&self, table: &str) -> Result<Vec<String>> {
        let sql = format!("SELECT name FROM pragma_table_info({}) ORDER BY cid", self.quote(table));
        Ok(self.query_column(&sql)?.into_iter().flatten().collect())
    }
}
