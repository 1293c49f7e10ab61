/*!
 * Relational backend for the translation store.
 *
 * Languages are grouped into physical tables, each language owning one text
 * column of its table. This module provides:
 * - The query-execution boundary and its SQLite implementation
 * - Identifier validation for interpolated table and column names
 * - The language directory, schema manager and record store
 * - `RelationalContainer`, which ties them to the container interface
 */

pub mod backend;
pub mod connection;
pub mod container;
pub mod directory;
pub mod repository;
pub mod schema;
pub mod sql;

// Re-export main types
pub use backend::QueryBackend;
pub use connection::DatabaseConnection;
pub use container::RelationalContainer;
pub use directory::{LanguageDirectory, TableMapping};
pub use repository::Repository;
pub use schema::SchemaManager;
pub use sql::{Identifier, Layout};
