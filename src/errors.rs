/*!
 * Error types for the translation store.
 *
 * Every storage operation surfaces the first failure it meets through
 * `StorageError`. Nothing is retried and nothing is rolled back, so a
 * multi-statement operation can leave storage partially applied.
 */

use thiserror::Error;

/// Errors raised by containers and their collaborators
#[derive(Error, Debug)]
pub enum StorageError {
    /// Execution or connectivity failure reported by the relational backend
    #[error("Backend error: {message}")]
    Backend {
        /// Statement that was being executed, if any
        statement: Option<String>,
        /// Message reported by the backend
        message: String,
    },

    /// A schema-altering statement failed
    #[error("Schema error while executing `{statement}`: {message}")]
    Schema {
        /// Failing DDL statement
        statement: String,
        /// Message reported by the backend
        message: String,
    },

    /// The operation referenced a language that is not registered
    #[error("Unknown language: {0}")]
    UnknownLanguage(String),

    /// A value could not be represented in the target charset
    #[error(
        "Encoding conversion error (source encoding: {source_charset}, target encoding: {target_charset}, processed string: \"{value}\")"
    )]
    EncodingConversion {
        /// Charset the value was declared in
        source_charset: String,
        /// Charset the value was converted to
        target_charset: String,
        /// Offending value, lossily rendered
        value: String,
    },

    /// The document resource could not be opened, locked or written
    #[error("Resource unavailable: {path}: {source}")]
    ResourceUnavailable {
        /// Path of the backing resource
        path: String,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// A configured table or column name failed the identifier allow-list
    #[error("Invalid SQL identifier: {0:?}")]
    InvalidIdentifier(String),

    /// The document could not be parsed
    #[error("Malformed document: {0}")]
    Parse(String),
}

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, StorageError>;

impl StorageError {
    /// Create a backend error for a failed statement
    pub fn backend(statement: impl Into<String>, message: impl ToString) -> Self {
        Self::Backend {
            statement: Some(statement.into()),
            message: message.to_string(),
        }
    }

    /// Re-label a backend failure raised by a DDL statement as a schema error
    pub fn into_schema(self) -> Self {
        match self {
            Self::Backend { statement, message } => Self::Schema {
                statement: statement.unwrap_or_default(),
                message,
            },
            other => other,
        }
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(error: rusqlite::Error) -> Self {
        Self::Backend {
            statement: None,
            message: error.to_string(),
        }
    }
}

impl From<quick_xml::Error> for StorageError {
    fn from(error: quick_xml::Error) -> Self {
        Self::Parse(error.to_string())
    }
}
