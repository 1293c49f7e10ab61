/*!
 * In-memory index of a translation document.
 *
 * Loading normalizes the raw tree into languages -> pages -> strings ->
 * per-language value, fills in language defaults, then decodes every value
 * from its owning language's charset into the working charset.
 */

use indexmap::IndexMap;
use log::{debug, warn};

use super::raw::{unescape_text, RawDocument, RawLanguage, RawPage};
use crate::container::{LanguageMap, PageStrings, Translations};
use crate::encoding;
use crate::errors::{Result, StorageError};
use crate::language::Language;

/// Page key standing for an absent page id
pub const NULL_PAGE: &str = "#NULL";

/// Page key standing for an empty page id
pub const EMPTY_PAGE: &str = "#EMPTY";

/// Strings of one page: string key -> language -> value
pub type PageEntries = IndexMap<String, Translations>;

/// Bucket holding the strings of `page_id`
pub fn page_key(page_id: Option<&str>) -> &str {
    match page_id {
        None => NULL_PAGE,
        Some("") => EMPTY_PAGE,
        Some(page_id) => page_id,
    }
}

/// Inverse of `page_key`
fn page_id_of(key: &str) -> Option<String> {
    match key {
        NULL_PAGE => None,
        EMPTY_PAGE => Some(String::new()),
        key => Some(key.to_string()),
    }
}

type RawValues = IndexMap<String, Vec<u8>>;

/// Pages with duplicates merged and every node a mapping, values still raw
fn normalize_pages(pages: Vec<RawPage>) -> IndexMap<String, IndexMap<String, RawValues>> {
    let mut normalized: IndexMap<String, IndexMap<String, RawValues>> = IndexMap::new();

    for page in pages {
        let what = format!("page '{}'", page.key);
        let strings = page.strings.into_mapping(&what);
        let bucket = normalized.entry(page.key).or_default();

        for string in strings {
            let what = format!("string '{}'", string.key);
            let slot = bucket.entry(string.key).or_default();
            for (lang, value) in string.translations.into_mapping(&what) {
                slot.insert(lang, value);
            }
        }
    }

    normalized
}

/// Decode raw escaped bytes declared in `charset`
fn decode_text(raw: &[u8], charset: &str) -> Result<String> {
    let decoded = encoding::decode(raw, charset)?;
    unescape_text(&decoded)
}

fn load_language(raw: RawLanguage, default_encoding: &str) -> Result<Language> {
    let mut fields: IndexMap<String, Vec<u8>> = raw.fields.into_iter().collect();

    let charset = match fields.shift_remove("encoding") {
        Some(bytes) => decode_text(&bytes, encoding::WORKING_CHARSET)?.trim().to_string(),
        None => String::new(),
    };
    let charset = if charset.is_empty() {
        default_encoding.to_string()
    } else {
        charset
    };

    let mut language = Language::new(raw.id, charset);
    for (field, bytes) in fields {
        let target = match field.as_str() {
            "name" => &mut language.name,
            "meta" => &mut language.meta,
            "error_text" => &mut language.error_text,
            other => {
                debug!("Ignoring <{}> in language '{}'", other, language.id);
                continue;
            }
        };
        *target = decode_text(&bytes, &language.encoding)?;
    }

    Ok(language)
}

/// Normalized translation document
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentIndex {
    languages: LanguageMap,
    pages: IndexMap<String, PageEntries>,
    default_encoding: String,
}

impl DocumentIndex {
    /// Empty index; languages without a declared charset use `default_encoding`
    pub fn new(default_encoding: &str) -> Self {
        Self {
            languages: IndexMap::new(),
            pages: IndexMap::new(),
            default_encoding: default_encoding.to_string(),
        }
    }

    /// Normalize a raw document and decode it into the working charset
    pub fn load(raw: RawDocument, default_encoding: &str) -> Result<Self> {
        let mut index = Self::new(default_encoding);

        for language in raw.languages.into_mapping("languages") {
            let language = load_language(language, default_encoding)?;
            index.languages.insert(language.id.clone(), language);
        }

        for (page, strings) in normalize_pages(raw.pages.into_mapping("pages")) {
            let mut entries = PageEntries::with_capacity(strings.len());
            for (string_id, values) in strings {
                let mut translations = Translations::with_capacity(values.len());
                for (lang, raw_value) in values {
                    if !index.languages.contains_key(&lang) {
                        warn!(
                            "String '{}' on page '{}' has a value for undeclared language '{}'",
                            string_id, page, lang
                        );
                    }
                    let value = decode_text(&raw_value, index.charset_of(&lang))?;
                    translations.insert(lang, value);
                }
                entries.insert(string_id, translations);
            }
            index.pages.insert(page, entries);
        }

        debug!(
            "Document index loaded: {} language(s), {} page(s)",
            index.languages.len(),
            index.pages.len()
        );
        Ok(index)
    }

    /// Declared charset of a language, or the default for undeclared ones
    pub fn charset_of(&self, lang_id: &str) -> &str {
        self.languages
            .get(lang_id)
            .map(|language| language.encoding.as_str())
            .unwrap_or(self.default_encoding.as_str())
    }

    pub fn languages(&self) -> &LanguageMap {
        &self.languages
    }

    /// Pages keyed by their stored key (sentinels included)
    pub fn pages(&self) -> &IndexMap<String, PageEntries> {
        &self.pages
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    /// Strings of a page in one language, `None` where it has no value
    pub fn get_page(&self, page_id: Option<&str>, lang_id: &str) -> PageStrings {
        self.pages
            .get(page_key(page_id))
            .map(|entries| {
                entries
                    .iter()
                    .map(|(string_id, values)| (string_id.clone(), values.get(lang_id).cloned()))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn get_one(&self, string_id: &str, page_id: Option<&str>, lang_id: &str) -> Option<&str> {
        self.pages
            .get(page_key(page_id))?
            .get(string_id)?
            .get(lang_id)
            .map(String::as_str)
    }

    /// First string on the page holding `value` in any language; linear in the page size
    pub fn find_string_id(&self, value: &str, page_id: Option<&str>) -> Option<&str> {
        self.pages
            .get(page_key(page_id))?
            .iter()
            .find(|(_, values)| values.values().any(|v| v == value))
            .map(|(string_id, _)| string_id.as_str())
    }

    /// Page ids in document order; sentinels map back to absent and empty ids
    pub fn page_ids(&self) -> Vec<Option<String>> {
        self.pages.keys().map(|key| page_id_of(key)).collect()
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Declare a language, replacing the metadata of an existing one
    pub fn add_language(&mut self, language: Language) {
        self.languages.insert(language.id.clone(), language);
    }

    /// Remove a language and its value from every string
    pub fn remove_language(&mut self, lang_id: &str) -> Result<()> {
        if self.languages.shift_remove(lang_id).is_none() {
            return Err(StorageError::UnknownLanguage(lang_id.to_string()));
        }
        for entries in self.pages.values_mut() {
            for values in entries.values_mut() {
                values.shift_remove(lang_id);
            }
        }
        Ok(())
    }

    /// Values restricted to declared languages
    fn declared<'v>(&self, values: &'v Translations) -> Vec<(&'v String, &'v String)> {
        values
            .iter()
            .filter(|(lang, _)| self.languages.contains_key(lang.as_str()))
            .collect()
    }

    /// Insert or update an entry; returns false when no value was for a declared language
    pub fn upsert(&mut self, string_id: &str, page_id: Option<&str>, values: &Translations) -> bool {
        let declared = self.declared(values);
        if declared.is_empty() {
            return false;
        }

        let slot = self
            .pages
            .entry(page_key(page_id).to_string())
            .or_default()
            .entry(string_id.to_string())
            .or_default();
        for (lang, value) in declared {
            slot.insert(lang.clone(), value.clone());
        }
        true
    }

    /// Update an existing entry; returns false when nothing was written
    pub fn update(&mut self, string_id: &str, page_id: Option<&str>, values: &Translations) -> bool {
        let declared = self.declared(values);
        let Some(slot) = self
            .pages
            .get_mut(page_key(page_id))
            .and_then(|entries| entries.get_mut(string_id))
        else {
            return false;
        };

        for (lang, value) in &declared {
            slot.insert((*lang).clone(), (*value).clone());
        }
        !declared.is_empty()
    }

    /// Remove an entry, and its page once the page holds no string; returns whether it existed
    pub fn remove_entry(&mut self, string_id: &str, page_id: Option<&str>) -> bool {
        let key = page_key(page_id);
        let Some(entries) = self.pages.get_mut(key) else {
            return false;
        };

        let removed = entries.shift_remove(string_id).is_some();
        if entries.is_empty() {
            self.pages.shift_remove(key);
        }
        removed
    }
}
