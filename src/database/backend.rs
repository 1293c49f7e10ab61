/*!
 * Query-execution boundary of the relational backend.
 *
 * Containers build statement text themselves; implementations of this trait
 * only execute it, quote literals and report which tables and columns exist.
 */

use crate::errors::Result;

/// Generic query-execution capability
pub trait QueryBackend {
    /// Execute a statement, returning the number of affected rows
    fn execute(&self, sql: &str) -> Result<usize>;

    /// First column of the first row, `None` when no row or a NULL value comes back
    fn query_one(&self, sql: &str) -> Result<Option<String>>;

    /// First column of every row
    fn query_column(&self, sql: &str) -> Result<Vec<Option<String>>>;

    /// Every column of every row
    fn query_rows(&self, sql: &str) -> Result<Vec<Vec<Option<String>>>>;

    /// Quote a literal for safe interpolation
    fn quote(&self, value: &str) -> String;

    /// Names of the tables that currently exist
    fn list_tables(&self) -> Result<Vec<String>>;

    /// Column names of an existing table, in declaration order
    fn list_columns(&self, table: &str) -> Result<Vec<String>>;

    /// Quote an optional literal, rendering `None` as SQL `NULL`
    fn quote_nullable(&self, value: Option<&str>) -> String {
        match value {
            Some(value) => self.quote(value),
            None => "NULL".to_string(),
        }
    }
}
