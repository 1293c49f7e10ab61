/*!
 * Repository layer for translated strings.
 *
 * A logical string entry is keyed by (string id, page id). Its values for
 * languages sharing a table live in one row; languages in other tables get
 * their own rows. Writes are batched per table: each table receives at most
 * one write statement per call. There is no atomicity across tables.
 */

use indexmap::{IndexMap, IndexSet};
use log::debug;

use super::backend::QueryBackend;
use super::directory::LanguageDirectory;
use super::sql::{join, page_predicate, Identifier, Layout};
use crate::container::{PageStrings, Translations};
use crate::errors::{Result, StorageError};

/// Record store operations over one language directory snapshot
pub struct Repository<'a, B: QueryBackend + ?Sized> {
    backend: &'a B,
    layout: &'a Layout,
    directory: &'a LanguageDirectory,
}

impl<'a, B: QueryBackend + ?Sized> Repository<'a, B> {
    pub fn new(backend: &'a B, layout: &'a Layout, directory: &'a LanguageDirectory) -> Self {
        Self {
            backend,
            layout,
            directory,
        }
    }

    // =========================================================================
    // Statement helpers
    // =========================================================================

    /// `string_id = '...' AND page_id ...` for one entry
    fn entry_predicate(&self, string_id: &str, page_id: Option<&str>) -> String {
        let quoted_page = page_id.map(|p| self.backend.quote(p));
        format!(
            "{} = {} AND {}",
            self.layout.string_id,
            self.backend.quote(string_id),
            page_predicate(&self.layout.page_id, quoted_page.as_deref())
        )
    }

    /// Languages of `values` that are registered, in input order
    fn registered_langs<'v>(&self, values: &'v Translations) -> Vec<&'v str> {
        values
            .keys()
            .map(String::as_str)
            .filter(|lang| self.directory.contains(lang))
            .collect()
    }

    fn existing_tables(&self) -> Result<Vec<Identifier>> {
        let present = self.backend.list_tables()?;
        Ok(self
            .directory
            .tables()?
            .into_iter()
            .filter(|table| present.iter().any(|p| p == table.as_str()))
            .collect())
    }

    // =========================================================================
    // Write operations
    // =========================================================================

    /// Whether `table` holds a row for (string id, page id)
    pub fn record_exists(&self, string_id: &str, page_id: Option<&str>, table: &Identifier) -> Result<bool> {
        let query = format!(
            "SELECT COUNT(*) FROM {} WHERE {}",
            table,
            self.entry_predicate(string_id, page_id)
        );
        let count = match self.backend.query_one(&query)? {
            Some(count) => count.parse::<i64>().map_err(|_| {
                StorageError::backend(query.as_str(), format!("COUNT(*) returned a non-integer value {:?}", count))
            })?,
            None => return Err(StorageError::backend(query.as_str(), "COUNT(*) returned no value")),
        };
        Ok(count > 0)
    }

    /// Insert or update an entry, one statement per table group.
    ///
    /// Languages that are not registered are ignored; when none remain the
    /// call succeeds without writing anything.
    pub fn upsert_entry(&self, string_id: &str, page_id: Option<&str>, values: &Translations) -> Result<()> {
        let langs = self.registered_langs(values);
        if langs.is_empty() {
            debug!("No registered language in entry {:?}; nothing written", string_id);
            return Ok(());
        }

        for (table, table_langs) in self.directory.group_by_table(langs)? {
            if self.record_exists(string_id, page_id, &table)? {
                self.update_group(&table, &table_langs, string_id, page_id, values)?;
                continue;
            }
            self.insert_group(&table, &table_langs, string_id, page_id, values)?;
        }

        Ok(())
    }

    /// Update an entry in every table group, without checking it exists.
    ///
    /// Groups where no row matches are silently left untouched.
    pub fn update_entry(&self, string_id: &str, page_id: Option<&str>, values: &Translations) -> Result<()> {
        let langs = self.registered_langs(values);
        if langs.is_empty() {
            debug!("No registered language in entry {:?}; nothing written", string_id);
            return Ok(());
        }

        for (table, table_langs) in self.directory.group_by_table(langs)? {
            let updated = self.update_group(&table, &table_langs, string_id, page_id, values)?;
            if updated == 0 {
                debug!("No row for {:?} in {}; update skipped", string_id, table);
            }
        }

        Ok(())
    }

    fn update_group(
        &self,
        table: &Identifier,
        langs: &[String],
        string_id: &str,
        page_id: Option<&str>,
        values: &Translations,
    ) -> Result<usize> {
        let mut assignments = Vec::with_capacity(langs.len());
        for lang in langs {
            let column = self.directory.resolve_column(lang)?;
            let value = values.get(lang).map(String::as_str).unwrap_or_default();
            assignments.push(format!("{} = {}", column, self.backend.quote(value)));
        }

        let statement = format!(
            "UPDATE {} SET {} WHERE {}",
            table,
            assignments.join(", "),
            self.entry_predicate(string_id, page_id)
        );
        self.backend.execute(&statement)
    }

    fn insert_group(
        &self,
        table: &Identifier,
        langs: &[String],
        string_id: &str,
        page_id: Option<&str>,
        values: &Translations,
    ) -> Result<()> {
        let columns = langs
            .iter()
            .map(|lang| self.directory.resolve_column(lang))
            .collect::<Result<Vec<_>>>()?;
        let literals = langs
            .iter()
            .map(|lang| self.backend.quote(values.get(lang).map(String::as_str).unwrap_or_default()))
            .collect::<Vec<_>>();

        let statement = format!(
            "INSERT INTO {} ({}, {}, {}) VALUES ({}, {}, {})",
            table,
            self.layout.string_id,
            self.layout.page_id,
            join(&columns),
            self.backend.quote(string_id),
            self.backend.quote_nullable(page_id),
            literals.join(", ")
        );
        self.backend.execute(&statement)?;
        Ok(())
    }

    /// Delete an entry from every table group that exists
    pub fn remove_entry(&self, string_id: &str, page_id: Option<&str>) -> Result<()> {
        for table in self.existing_tables()? {
            let statement = format!(
                "DELETE FROM {} WHERE {}",
                table,
                self.entry_predicate(string_id, page_id)
            );
            self.backend.execute(&statement)?;
        }
        Ok(())
    }

    /// Distinct page ids across every table group; `None` is the absent page
    pub fn list_page_ids(&self) -> Result<Vec<Option<String>>> {
        let mut pages: IndexSet<Option<String>> = IndexSet::new();
        for table in self.existing_tables()? {
            let query = format!("SELECT DISTINCT {} FROM {}", self.layout.page_id, table);
            pages.extend(self.backend.query_column(&query)?);
        }
        Ok(pages.into_iter().collect())
    }

    // =========================================================================
    // Read operations
    // =========================================================================

    /// Every string of a page in one language
    pub fn get_page(&self, page_id: Option<&str>, lang_id: &str) -> Result<PageStrings> {
        let table = self.directory.resolve_table(lang_id)?;
        let column = self.directory.resolve_column(lang_id)?;
        let quoted_page = page_id.map(|p| self.backend.quote(p));

        let query = format!(
            "SELECT {}, {} FROM {} WHERE {}",
            self.layout.string_id,
            column,
            table,
            page_predicate(&self.layout.page_id, quoted_page.as_deref())
        );

        let mut strings = IndexMap::new();
        for row in self.backend.query_rows(&query)? {
            let mut fields = row.into_iter();
            if let Some(string_id) = fields.next().flatten() {
                strings.insert(string_id, fields.next().flatten());
            }
        }
        Ok(strings)
    }

    /// One string in one language; `None` when the row or value is missing
    pub fn get_one(&self, string_id: &str, page_id: Option<&str>, lang_id: &str) -> Result<Option<String>> {
        let table = self.directory.resolve_table(lang_id)?;
        let column = self.directory.resolve_column(lang_id)?;

        let query = format!(
            "SELECT {} FROM {} WHERE {}",
            column,
            table,
            self.entry_predicate(string_id, page_id)
        );
        self.backend.query_one(&query)
    }

    /// First string id on the page whose value matches in any registered language
    pub fn get_string_id(&self, value: &str, page_id: Option<&str>) -> Result<Option<String>> {
        let present = self.backend.list_tables()?;
        let quoted_page = page_id.map(|p| self.backend.quote(p));
        let quoted_value = self.backend.quote(value);

        for (table, langs) in self.directory.group_by_table(self.directory.ids())? {
            if !present.iter().any(|p| p == table.as_str()) {
                continue;
            }

            let mut matches = Vec::with_capacity(langs.len());
            for lang in &langs {
                let column = self.directory.resolve_column(lang)?;
                matches.push(format!("{} = {}", column, quoted_value));
            }

            let query = format!(
                "SELECT {} FROM {} WHERE {} AND ({}) LIMIT 1",
                self.layout.string_id,
                table,
                page_predicate(&self.layout.page_id, quoted_page.as_deref()),
                matches.join(" OR ")
            );
            if let Some(string_id) = self.backend.query_one(&query)? {
                return Ok(Some(string_id));
            }
        }

        Ok(None)
    }
}
