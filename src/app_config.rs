use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::database::sql::Identifier;

/// Application configuration module
/// This module handles the configuration of the storage backends, including
/// loading, validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Storage backend selection and options
    #[serde(default)]
    pub backend: BackendConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Storage backend selected at container construction time
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BackendConfig {
    /// Table-per-language-group relational storage
    Sqlite(RelationalConfig),
    /// Single XML document
    Xml(DocumentConfig),
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self::Sqlite(RelationalConfig::default())
    }
}

impl BackendConfig {
    // @returns: Lowercase backend identifier
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Sqlite(_) => "sqlite",
            Self::Xml(_) => "xml",
        }
    }
}

/// Relational storage options
///
/// Table and column names are interpolated into statements, so every one of
/// them must pass the identifier allow-list (see `Config::validate`).
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RelationalConfig {
    /// Database file; `None` selects the default location under the user data dir
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// Registry table listing the available languages
    #[serde(default = "default_langs_avail_table")]
    pub langs_avail_table: String,

    #[serde(default = "default_lang_id_col")]
    pub lang_id_col: String,

    #[serde(default = "default_lang_name_col")]
    pub lang_name_col: String,

    #[serde(default = "default_lang_meta_col")]
    pub lang_meta_col: String,

    #[serde(default = "default_lang_errmsg_col")]
    pub lang_errmsg_col: String,

    #[serde(default = "default_lang_encoding_col")]
    pub lang_encoding_col: String,

    /// Table used for languages without an explicit mapping; `%s` is replaced by the language id
    #[serde(default = "default_strings_default_table")]
    pub strings_default_table: String,

    /// Explicit language id -> table mapping
    #[serde(default)]
    pub strings_tables: BTreeMap<String, String>,

    #[serde(default = "default_string_id_col")]
    pub string_id_col: String,

    #[serde(default = "default_string_page_id_col")]
    pub string_page_id_col: String,

    /// Width of the page id column
    #[serde(default = "default_string_page_id_col_length")]
    pub string_page_id_col_length: usize,

    /// Column holding a language's text; `%s` is replaced by the language id
    #[serde(default = "default_string_text_col")]
    pub string_text_col: String,
}

impl Default for RelationalConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            langs_avail_table: default_langs_avail_table(),
            lang_id_col: default_lang_id_col(),
            lang_name_col: default_lang_name_col(),
            lang_meta_col: default_lang_meta_col(),
            lang_errmsg_col: default_lang_errmsg_col(),
            lang_encoding_col: default_lang_encoding_col(),
            strings_default_table: default_strings_default_table(),
            strings_tables: BTreeMap::new(),
            string_id_col: default_string_id_col(),
            string_page_id_col: default_string_page_id_col(),
            string_page_id_col_length: default_string_page_id_col_length(),
            string_text_col: default_string_text_col(),
        }
    }
}

impl RelationalConfig {
    /// Validate every identifier the statement builder will interpolate
    pub fn validate(&self) -> Result<()> {
        let fixed = [
            ("langs_avail_table", &self.langs_avail_table),
            ("lang_id_col", &self.lang_id_col),
            ("lang_name_col", &self.lang_name_col),
            ("lang_meta_col", &self.lang_meta_col),
            ("lang_errmsg_col", &self.lang_errmsg_col),
            ("lang_encoding_col", &self.lang_encoding_col),
            ("string_id_col", &self.string_id_col),
            ("string_page_id_col", &self.string_page_id_col),
        ];
        for (option, name) in fixed {
            Identifier::new(name).with_context(|| format!("Invalid value for option '{}'", option))?;
        }

        // Patterns are checked with a representative language id substituted
        for (option, pattern) in [
            ("strings_default_table", &self.strings_default_table),
            ("string_text_col", &self.string_text_col),
        ] {
            Identifier::from_pattern(pattern, "xx")
                .with_context(|| format!("Invalid value for option '{}'", option))?;
        }

        for (lang_id, table) in &self.strings_tables {
            Identifier::new(table)
                .with_context(|| format!("Invalid table configured for language '{}'", lang_id))?;
        }

        if self.string_page_id_col_length == 0 {
            return Err(anyhow!("string_page_id_col_length must be greater than zero"));
        }

        Ok(())
    }
}

/// XML document storage options
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DocumentConfig {
    /// Path to the XML document
    pub filename: PathBuf,

    /// Charset assumed for languages that do not declare one
    #[serde(default = "default_document_encoding")]
    pub default_encoding: String,

    /// Persist the document after every mutation instead of on explicit save
    #[serde(default)]
    pub save_on_change: bool,
}

impl DocumentConfig {
    pub fn new<P: AsRef<Path>>(filename: P) -> Self {
        Self {
            filename: filename.as_ref().to_path_buf(),
            default_encoding: default_document_encoding(),
            save_on_change: false,
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_langs_avail_table() -> String {
    "langs".to_string()
}

fn default_lang_id_col() -> String {
    "id".to_string()
}

fn default_lang_name_col() -> String {
    "name".to_string()
}

fn default_lang_meta_col() -> String {
    "meta".to_string()
}

fn default_lang_errmsg_col() -> String {
    "error_text".to_string()
}

fn default_lang_encoding_col() -> String {
    "encoding".to_string()
}

fn default_strings_default_table() -> String {
    "i18n".to_string()
}

fn default_string_id_col() -> String {
    "id".to_string()
}

fn default_string_page_id_col() -> String {
    "page_id".to_string()
}

fn default_string_page_id_col_length() -> usize {
    50
}

fn default_string_text_col() -> String {
    "%s".to_string()
}

fn default_document_encoding() -> String {
    crate::encoding::WORKING_CHARSET.to_string()
}

impl Config {
    /// Load the configuration from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open config file: {}", path.display()))?;

        let reader = BufReader::new(file);
        let config: Config = serde_json::from_reader(reader)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Write the configuration as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let config_json =
            serde_json::to_string_pretty(self).context("Failed to serialize config to JSON")?;

        std::fs::write(path, config_json)
            .with_context(|| format!("Failed to write config to file: {}", path.display()))?;

        Ok(())
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        match &self.backend {
            BackendConfig::Sqlite(relational) => relational.validate(),
            BackendConfig::Xml(document) => {
                if document.filename.as_os_str().is_empty() {
                    return Err(anyhow!("An XML filename is required for the xml backend"));
                }
                if encoding_rs::Encoding::for_label(document.default_encoding.trim().as_bytes())
                    .is_none()
                {
                    return Err(anyhow!(
                        "Unknown default encoding: {}",
                        document.default_encoding
                    ));
                }
                Ok(())
            }
        }
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            backend: BackendConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
