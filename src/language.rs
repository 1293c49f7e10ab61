/*!
 * Language records shared by every container.
 */

use serde::{Deserialize, Serialize};

/// A registered language and its descriptive metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Language {
    /// Unique, stable identifier (e.g. "en", "fr_FR")
    pub id: String,
    /// Display name
    pub name: String,
    /// Opaque free-form metadata
    pub meta: String,
    /// Text shown when a translation is missing
    pub error_text: String,
    /// Declared charset of this language's strings
    pub encoding: String,
    /// Physical table holding this language's column (relational backend only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
}

impl Language {
    /// Create a language with empty descriptive fields
    pub fn new(id: impl Into<String>, encoding: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            meta: String::new(),
            error_text: String::new(),
            encoding: encoding.into(),
            table: None,
        }
    }
}

/// Metadata supplied when creating a language
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageSpec {
    pub id: String,
    /// Table the language's column goes into; shared tables hold several languages
    pub table_name: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub meta: String,
    #[serde(default)]
    pub error_text: String,
    #[serde(default = "default_spec_encoding")]
    pub encoding: String,
}

impl LanguageSpec {
    pub fn new(id: impl Into<String>, table_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            table_name: table_name.into(),
            name: String::new(),
            meta: String::new(),
            error_text: String::new(),
            encoding: default_spec_encoding(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_error_text(mut self, error_text: impl Into<String>) -> Self {
        self.error_text = error_text.into();
        self
    }

    pub fn with_meta(mut self, meta: impl Into<String>) -> Self {
        self.meta = meta.into();
        self
    }

    pub fn with_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = encoding.into();
        self
    }

    /// The record a directory holds once this language is registered
    pub fn to_language(&self) -> Language {
        Language {
            id: self.id.clone(),
            name: self.name.clone(),
            meta: self.meta.clone(),
            error_text: self.error_text.clone(),
            encoding: self.encoding.clone(),
            table: Some(self.table_name.clone()),
        }
    }
}

fn default_spec_encoding() -> String {
    crate::encoding::WORKING_CHARSET.to_string()
}
