/*!
 * Language directory for the relational backend.
 *
 * Maps every registered language to the physical table and column holding
 * its strings. The directory is owned by one container, filled by `refresh`
 * on first use and kept until explicitly invalidated.
 */

use indexmap::IndexMap;
use log::debug;
use std::collections::BTreeMap;

use super::backend::QueryBackend;
use super::sql::{Identifier, Layout};
use crate::app_config::RelationalConfig;
use crate::encoding::WORKING_CHARSET;
use crate::errors::{Result, StorageError};
use crate::language::Language;

/// Language id -> table/column naming rules
#[derive(Debug, Clone)]
pub struct TableMapping {
    /// Table pattern used when no explicit mapping exists
    default_table: String,
    /// Explicit per-language tables
    tables: BTreeMap<String, String>,
    /// Column pattern
    text_column: String,
}

impl TableMapping {
    pub fn from_config(config: &RelationalConfig) -> Self {
        Self {
            default_table: config.strings_default_table.clone(),
            tables: config.strings_tables.clone(),
            text_column: config.string_text_col.clone(),
        }
    }

    /// Table a language is stored in, registered or not
    pub fn table_for(&self, lang_id: &str) -> Result<Identifier> {
        match self.tables.get(lang_id) {
            Some(table) => Identifier::new(table),
            None => Identifier::from_pattern(&self.default_table, lang_id),
        }
    }

    /// Column a language is stored in
    pub fn column_for(&self, lang_id: &str) -> Result<Identifier> {
        Identifier::from_pattern(&self.text_column, lang_id)
    }

    pub fn assign(&mut self, lang_id: &str, table: &str) {
        self.tables.insert(lang_id.to_string(), table.to_string());
    }
}

/// Cached view of the registered languages
#[derive(Debug, Clone)]
pub struct LanguageDirectory {
    languages: IndexMap<String, Language>,
    mapping: TableMapping,
    loaded: bool,
}

impl LanguageDirectory {
    pub fn new(mapping: TableMapping) -> Self {
        Self {
            languages: IndexMap::new(),
            mapping,
            loaded: false,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Drop the cached languages; the next access refreshes them
    pub fn invalidate(&mut self) {
        self.languages.clear();
        self.loaded = false;
    }

    /// Reload every language from the registry table.
    ///
    /// A missing registry table means no language was ever registered.
    pub fn refresh<B: QueryBackend + ?Sized>(&mut self, backend: &B, layout: &Layout) -> Result<()> {
        let tables = backend.list_tables()?;
        let mut languages = IndexMap::new();

        if tables.iter().any(|t| t == layout.langs_table.as_str()) {
            let query = format!(
                "SELECT {}, {}, {}, {}, {} FROM {}",
                layout.lang_id,
                layout.lang_name,
                layout.lang_meta,
                layout.lang_errmsg,
                layout.lang_encoding,
                layout.langs_table
            );

            for row in backend.query_rows(&query)? {
                let mut fields = row.into_iter();
                let Some(id) = fields.next().flatten() else {
                    continue;
                };
                let mut next = || fields.next().flatten().unwrap_or_default();
                let name = next();
                let meta = next();
                let error_text = next();
                let encoding = match next() {
                    e if e.trim().is_empty() => WORKING_CHARSET.to_string(),
                    e => e,
                };
                languages.insert(
                    id.clone(),
                    Language { id, name, meta, error_text, encoding, table: None },
                );
            }
        }

        let mut columns: IndexMap<&str, Vec<String>> = IndexMap::new();
        if !languages.is_empty() {
            for table in tables.iter().filter(|t| *t != layout.langs_table.as_str()) {
                columns.insert(table.as_str(), backend.list_columns(table)?);
            }
        }
        for language in languages.values_mut() {
            self.locate(language, &columns);
        }

        debug!("Language directory refreshed: {} language(s)", languages.len());
        self.languages = languages;
        self.loaded = true;
        Ok(())
    }

    /// Point a loaded language at the table that physically holds its column.
    ///
    /// The configured table wins when it has the column; otherwise the first
    /// table carrying the column is adopted, which recovers tables chosen at
    /// registration time in an earlier session.
    fn locate(&mut self, language: &mut Language, columns: &IndexMap<&str, Vec<String>>) {
        let expected = self.mapping.table_for(&language.id).ok();
        let Ok(column) = self.mapping.column_for(&language.id) else {
            language.table = expected.map(|t| t.to_string());
            return;
        };
        let holds = |table: &str| {
            columns
                .get(table)
                .is_some_and(|names| names.iter().any(|name| name == column.as_str()))
        };

        if expected.as_ref().is_some_and(|t| holds(t.as_str())) {
            language.table = expected.map(|t| t.to_string());
            return;
        }

        match columns.keys().copied().find(|table| holds(table)) {
            Some(table) => {
                debug!("Language {} found in table {}", language.id, table);
                self.mapping.assign(&language.id, table);
                language.table = Some(table.to_string());
            }
            None => language.table = expected.map(|t| t.to_string()),
        }
    }

    /// Add a language and record its table without a round-trip to the registry
    pub fn register(&mut self, language: Language, table: &str) {
        self.mapping.assign(&language.id, table);
        let mut language = language;
        language.table = Some(table.to_string());
        self.languages.insert(language.id.clone(), language);
    }

    /// Record a language's table without registering the language
    pub fn assign_table(&mut self, lang_id: &str, table: &str) {
        self.mapping.assign(lang_id, table);
    }

    pub fn forget(&mut self, lang_id: &str) {
        self.languages.shift_remove(lang_id);
    }

    pub fn get(&self, lang_id: &str) -> Option<&Language> {
        self.languages.get(lang_id)
    }

    pub fn contains(&self, lang_id: &str) -> bool {
        self.languages.contains_key(lang_id)
    }

    pub fn languages(&self) -> impl Iterator<Item = &Language> {
        self.languages.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.languages.keys().map(String::as_str)
    }

    /// Table group of a registered language
    pub fn resolve_table(&self, lang_id: &str) -> Result<Identifier> {
        if !self.contains(lang_id) {
            return Err(StorageError::UnknownLanguage(lang_id.to_string()));
        }
        self.mapping.table_for(lang_id)
    }

    /// Column of a registered language
    pub fn resolve_column(&self, lang_id: &str) -> Result<Identifier> {
        if !self.contains(lang_id) {
            return Err(StorageError::UnknownLanguage(lang_id.to_string()));
        }
        self.mapping.column_for(lang_id)
    }

    /// Partition languages by table, keeping input order inside each group
    pub fn group_by_table<'a, I>(&self, lang_ids: I) -> Result<IndexMap<Identifier, Vec<String>>>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut groups: IndexMap<Identifier, Vec<String>> = IndexMap::new();
        for lang_id in lang_ids {
            let table = self.resolve_table(lang_id)?;
            let group = groups.entry(table).or_default();
            if !group.iter().any(|l| l == lang_id) {
                group.push(lang_id.to_string());
            }
        }
        Ok(groups)
    }

    /// Distinct tables of every registered language
    pub fn tables(&self) -> Result<Vec<Identifier>> {
        Ok(self.group_by_table(self.ids())?.into_keys().collect())
    }

    /// Registered languages stored in `table`
    pub fn langs_in_table(&self, table: &Identifier) -> Vec<String> {
        self.ids()
            .filter(|id| self.mapping.table_for(id).ok().as_ref() == Some(table))
            .map(str::to_string)
            .collect()
    }

    /// Table/column naming rules, including registrations made since construction
    pub fn mapping(&self) -> &TableMapping {
        &self.mapping
    }
}
