/*!
 * Statement fragments for the table-per-language-group layout.
 *
 * Table and column names come from configuration and language ids, so they
 * are interpolated into statement text. The backend's quoting only covers
 * literals; identifiers are checked against an allow-list here instead.
 */

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::app_config::RelationalConfig;
use crate::errors::{Result, StorageError};

static IDENTIFIER_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]{0,63}$").expect("identifier pattern is valid")
});

/// Placeholder replaced by the language id in table and column patterns
pub const LANG_PLACEHOLDER: &str = "%s";

/// A table or column name that is safe to interpolate
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identifier(String);

impl Identifier {
    pub fn new(name: &str) -> Result<Self> {
        if IDENTIFIER_PATTERN.is_match(name) {
            Ok(Self(name.to_string()))
        } else {
            Err(StorageError::InvalidIdentifier(name.to_string()))
        }
    }

    /// Expand a `%s` pattern with the language id, then validate the result
    pub fn from_pattern(pattern: &str, lang_id: &str) -> Result<Self> {
        Self::new(&pattern.replace(LANG_PLACEHOLDER, lang_id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Validated names of the registry table and the fixed string-table columns
#[derive(Debug, Clone)]
pub struct Layout {
    pub langs_table: Identifier,
    pub lang_id: Identifier,
    pub lang_name: Identifier,
    pub lang_meta: Identifier,
    pub lang_errmsg: Identifier,
    pub lang_encoding: Identifier,
    pub string_id: Identifier,
    pub page_id: Identifier,
    pub page_id_length: usize,
}

impl Layout {
    pub fn from_config(config: &RelationalConfig) -> Result<Self> {
        Ok(Self {
            langs_table: Identifier::new(&config.langs_avail_table)?,
            lang_id: Identifier::new(&config.lang_id_col)?,
            lang_name: Identifier::new(&config.lang_name_col)?,
            lang_meta: Identifier::new(&config.lang_meta_col)?,
            lang_errmsg: Identifier::new(&config.lang_errmsg_col)?,
            lang_encoding: Identifier::new(&config.lang_encoding_col)?,
            string_id: Identifier::new(&config.string_id_col)?,
            page_id: Identifier::new(&config.string_page_id_col)?,
            page_id_length: config.string_page_id_col_length,
        })
    }
}

/// Predicate matching a page id column.
///
/// An absent page id must use `IS NULL`: under SQL semantics `NULL = NULL`
/// never holds, and an empty string is a distinct, real page id.
pub fn page_predicate(column: &Identifier, quoted_page_id: Option<&str>) -> String {
    match quoted_page_id {
        None => format!("{} IS NULL", column),
        Some(quoted) => format!("{} = {}", column, quoted),
    }
}

/// Name of an index on `column` of `table`
pub fn index_name(table: &Identifier, column: &Identifier) -> Result<Identifier> {
    Identifier::new(&format!("{}_{}_index", table, column))
}

/// Comma-separated identifier list
pub fn join(identifiers: &[Identifier]) -> String {
    identifiers
        .iter()
        .map(Identifier::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
