/*!
 * # translation-store - storage engine for localized strings
 *
 * Persists and retrieves translated strings keyed by (string id, page id,
 * language id) against interchangeable backends.
 *
 * ## Features
 *
 * - Relational backend (SQLite) using a table-per-language-group layout:
 *   languages share tables, each language owning one text column
 * - Schema management when languages are added or removed
 * - XML document backend with normalization of irregular documents
 * - Per-language charsets, decoded on load and re-encoded on save
 * - Output-charset decorator for consumers that need non-UTF-8 text
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `container`: The container interface both backends implement
 * - `database`: Relational backend:
 *   - `database::directory`: Language -> table/column mapping
 *   - `database::schema`: Table and column creation and removal
 *   - `database::repository`: Grouped reads and writes of string entries
 * - `document`: XML document backend and its in-memory index
 * - `encoding`: Charset conversion
 * - `decorator`: Output-charset conversion over any container
 * - `app_config`: Configuration management
 * - `errors`: Error types for the library
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod container;
pub mod database;
pub mod decorator;
pub mod document;
pub mod encoding;
pub mod errors;
pub mod language;

// Re-export main types for easier usage
pub use app_config::Config;
pub use container::{AdminContainer, Container, LanguageMap, PageStrings, Translations};
pub use database::RelationalContainer;
pub use decorator::EncodingDecorator;
pub use document::DocumentContainer;
pub use errors::{Result, StorageError};
pub use language::{Language, LanguageSpec};
