/*!
 * Schema management for the table-per-language-group layout.
 *
 * Languages sharing a table each own one text column in it. Adding a
 * language either creates its table or ALTERs an existing one; removing a
 * language drops its column or the whole table. Statements run one by one
 * with no rollback: a failure leaves the steps already applied in place.
 */

use log::{debug, info};

use super::backend::QueryBackend;
use super::directory::LanguageDirectory;
use super::sql::{index_name, Identifier, Layout};
use crate::errors::{Result, StorageError};
use crate::language::LanguageSpec;

/// Creates and drops physical storage for languages
pub struct SchemaManager<'a, B: QueryBackend + ?Sized> {
    backend: &'a B,
    layout: &'a Layout,
}

impl<'a, B: QueryBackend + ?Sized> SchemaManager<'a, B> {
    pub fn new(backend: &'a B, layout: &'a Layout) -> Self {
        Self { backend, layout }
    }

    /// Run a DDL statement, reporting failures as schema errors
    fn execute_ddl(&self, statement: &str) -> Result<()> {
        self.backend
            .execute(statement)
            .map(|_| ())
            .map_err(StorageError::into_schema)
    }

    fn table_exists(&self, table: &Identifier) -> Result<bool> {
        Ok(self
            .backend
            .list_tables()?
            .iter()
            .any(|t| t == table.as_str()))
    }

    /// Make room for `lang_id` in `table_name`.
    ///
    /// An existing table gets a new column; adding a column that already
    /// exists fails at the backend and is reported as a schema error.
    ///
    /// A new table gets a unique index on (string id, page id) rather than
    /// on the string id alone, so the same string id may live on several
    /// pages but only once per page.
    pub fn ensure_language_storage(
        &self,
        directory: &LanguageDirectory,
        lang_id: &str,
        table_name: &str,
    ) -> Result<()> {
        let table = Identifier::new(table_name)?;
        let column = directory.mapping().column_for(lang_id)?;

        if self.table_exists(&table)? {
            info!("Adding column {} to table {}", column, table);
            return self.execute_ddl(&format!("ALTER TABLE {} ADD COLUMN {} TEXT", table, column));
        }

        info!("Creating table {} for language {}", table, lang_id);
        let string_id = &self.layout.string_id;
        let page_id = &self.layout.page_id;
        let string_index = index_name(&table, string_id)?;
        let page_index = index_name(&table, page_id)?;

        let statements = [
            format!(
                "CREATE TABLE {} ( {} VARCHAR({}) default NULL, {} TEXT NOT NULL, {} TEXT )",
                table, page_id, self.layout.page_id_length, string_id, column
            ),
            format!(
                "CREATE UNIQUE INDEX {} ON {} ({}, {})",
                string_index, table, string_id, page_id
            ),
            format!("CREATE INDEX {} ON {} ({})", page_index, table, page_id),
            // Same name as the unique index above: kept as a no-op step
            format!("CREATE INDEX IF NOT EXISTS {} ON {} ({})", string_index, table, string_id),
        ];

        for statement in &statements {
            self.execute_ddl(statement)?;
        }

        Ok(())
    }

    /// Insert the language into the registry table, creating the registry on first use.
    ///
    /// The directory learns the language's table even when the insert fails.
    pub fn register_language(
        &self,
        directory: &mut LanguageDirectory,
        spec: &LanguageSpec,
    ) -> Result<()> {
        let layout = self.layout;

        if !self.table_exists(&layout.langs_table)? {
            info!("Creating language registry table {}", layout.langs_table);
            let statements = [
                format!(
                    "CREATE TABLE {} ({} VARCHAR(16), {} VARCHAR(200), {} TEXT, {} VARCHAR(250), {} VARCHAR(16) )",
                    layout.langs_table,
                    layout.lang_id,
                    layout.lang_name,
                    layout.lang_meta,
                    layout.lang_errmsg,
                    layout.lang_encoding
                ),
                format!(
                    "CREATE UNIQUE INDEX {} ON {} ({})",
                    index_name(&layout.langs_table, &layout.lang_id)?,
                    layout.langs_table,
                    layout.lang_id
                ),
            ];
            for statement in &statements {
                self.execute_ddl(statement)?;
            }
        }

        let quote = |value: &str| self.backend.quote(value);
        let insert = format!(
            "INSERT INTO {} ({}, {}, {}, {}, {}) VALUES ({}, {}, {}, {}, {})",
            layout.langs_table,
            layout.lang_id,
            layout.lang_name,
            layout.lang_meta,
            layout.lang_errmsg,
            layout.lang_encoding,
            quote(&spec.id),
            quote(&spec.name),
            quote(&spec.meta),
            quote(&spec.error_text),
            quote(&spec.encoding)
        );

        let result = self.backend.execute(&insert);
        match &result {
            Ok(_) => directory.register(spec.to_language(), &spec.table_name),
            Err(_) => {
                debug!("Registry insert for {} failed; recording table mapping only", spec.id);
                directory.assign_table(&spec.id, &spec.table_name);
            }
        }
        result.map(|_| ())
    }

    /// Unregister a language and drop its storage.
    ///
    /// When other languages share the table and `force` is false only the
    /// language's column is dropped; otherwise the whole table goes.
    pub fn remove_language(
        &self,
        directory: &mut LanguageDirectory,
        lang_id: &str,
        force: bool,
    ) -> Result<()> {
        let table = directory.resolve_table(lang_id)?;
        let column = directory.resolve_column(lang_id)?;
        let others = directory
            .langs_in_table(&table)
            .into_iter()
            .filter(|l| l != lang_id)
            .count();

        let layout = self.layout;
        let delete = format!(
            "DELETE FROM {} WHERE {} = {}",
            layout.langs_table,
            layout.lang_id,
            self.backend.quote(lang_id)
        );
        self.backend.execute(&delete)?;
        directory.forget(lang_id);

        if others > 0 && !force {
            info!("Dropping column {} from shared table {}", column, table);
            return self.execute_ddl(&format!("ALTER TABLE {} DROP COLUMN {}", table, column));
        }

        info!("Dropping table {}", table);
        self.execute_ddl(&format!("DROP TABLE {}", table))
    }
}
