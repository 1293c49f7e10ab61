/*!
 * Relational container: the table-per-language-group scheme behind the
 * container interface.
 *
 * The language directory is loaded from the registry table on first use and
 * cached for the container's lifetime. Schema changes made through this
 * container keep the cache current; changes made by other processes are only
 * seen after `refresh` or `invalidate`.
 */

use log::debug;
use parking_lot::{RwLock, RwLockReadGuard, RwLockUpgradableReadGuard, RwLockWriteGuard};

use super::backend::QueryBackend;
use super::connection::DatabaseConnection;
use super::directory::{LanguageDirectory, TableMapping};
use super::repository::Repository;
use super::schema::SchemaManager;
use super::sql::Layout;
use crate::app_config::RelationalConfig;
use crate::container::{AdminContainer, Container, LanguageMap, PageStrings, Translations};
use crate::errors::Result;
use crate::language::LanguageSpec;

/// Container over a relational query backend
pub struct RelationalContainer<B: QueryBackend = DatabaseConnection> {
    backend: B,
    layout: Layout,
    directory: RwLock<LanguageDirectory>,
}

impl RelationalContainer<DatabaseConnection> {
    /// Open the SQLite database named by the configuration
    pub fn open(config: &RelationalConfig) -> Result<Self> {
        let connection = match &config.database_path {
            Some(path) => DatabaseConnection::new(path)?,
            None => DatabaseConnection::new_default()?,
        };
        Self::new(connection, config)
    }
}

impl<B: QueryBackend> RelationalContainer<B> {
    /// Build a container; fails when a configured identifier is rejected
    pub fn new(backend: B, config: &RelationalConfig) -> Result<Self> {
        let layout = Layout::from_config(config)?;
        let directory = LanguageDirectory::new(TableMapping::from_config(config));
        Ok(Self {
            backend,
            layout,
            directory: RwLock::new(directory),
        })
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Reload the language directory from the registry table now
    pub fn refresh(&self) -> Result<()> {
        self.directory.write().refresh(&self.backend, &self.layout)
    }

    /// Drop the cached languages; the next operation reloads them
    pub fn invalidate(&self) {
        self.directory.write().invalidate();
    }

    /// Loaded directory, refreshing it first if needed
    fn directory(&self) -> Result<RwLockReadGuard<'_, LanguageDirectory>> {
        let guard = self.directory.upgradable_read();
        if guard.is_loaded() {
            return Ok(RwLockUpgradableReadGuard::downgrade(guard));
        }

        let mut writer = RwLockUpgradableReadGuard::upgrade(guard);
        debug!("Loading language directory");
        writer.refresh(&self.backend, &self.layout)?;
        Ok(RwLockWriteGuard::downgrade(writer))
    }

    fn loaded<'d>(
        directory: &'d mut RwLock<LanguageDirectory>,
        backend: &B,
        layout: &Layout,
    ) -> Result<&'d mut LanguageDirectory> {
        let directory = directory.get_mut();
        if !directory.is_loaded() {
            directory.refresh(backend, layout)?;
        }
        Ok(directory)
    }
}

impl<B: QueryBackend> Container for RelationalContainer<B> {
    fn fetch_languages(&self) -> Result<LanguageMap> {
        let directory = self.directory()?;
        Ok(directory
            .languages()
            .map(|language| (language.id.clone(), language.clone()))
            .collect())
    }

    fn get_page(&self, page_id: Option<&str>, lang_id: &str) -> Result<PageStrings> {
        let directory = self.directory()?;
        Repository::new(&self.backend, &self.layout, &directory).get_page(page_id, lang_id)
    }

    fn get_one(&self, string_id: &str, page_id: Option<&str>, lang_id: &str) -> Result<Option<String>> {
        let directory = self.directory()?;
        Repository::new(&self.backend, &self.layout, &directory).get_one(string_id, page_id, lang_id)
    }

    fn get_string_id(&self, value: &str, page_id: Option<&str>) -> Result<String> {
        let directory = self.directory()?;
        let found = Repository::new(&self.backend, &self.layout, &directory).get_string_id(value, page_id)?;
        Ok(found.unwrap_or_default())
    }
}

impl<B: QueryBackend> AdminContainer for RelationalContainer<B> {
    fn create_language(&mut self, spec: &LanguageSpec) -> Result<()> {
        let Self {
            backend,
            layout,
            directory,
        } = self;
        let directory = Self::loaded(directory, backend, layout)?;
        let manager = SchemaManager::new(&*backend, &*layout);

        manager.ensure_language_storage(directory, &spec.id, &spec.table_name)?;
        manager.register_language(directory, spec)
    }

    fn remove_language(&mut self, lang_id: &str, force: bool) -> Result<()> {
        let Self {
            backend,
            layout,
            directory,
        } = self;
        let directory = Self::loaded(directory, backend, layout)?;
        SchemaManager::new(&*backend, &*layout).remove_language(directory, lang_id, force)
    }

    fn add_or_update_entry(&mut self, string_id: &str, page_id: Option<&str>, values: &Translations) -> Result<()> {
        let directory = self.directory()?;
        Repository::new(&self.backend, &self.layout, &directory).upsert_entry(string_id, page_id, values)
    }

    fn update_entry(&mut self, string_id: &str, page_id: Option<&str>, values: &Translations) -> Result<()> {
        let directory = self.directory()?;
        Repository::new(&self.backend, &self.layout, &directory).update_entry(string_id, page_id, values)
    }

    fn remove_entry(&mut self, string_id: &str, page_id: Option<&str>) -> Result<()> {
        let directory = self.directory()?;
        Repository::new(&self.backend, &self.layout, &directory).remove_entry(string_id, page_id)
    }

    fn list_page_ids(&self) -> Result<Vec<Option<String>>> {
        let directory = self.directory()?;
        Repository::new(&self.backend, &self.layout, &directory).list_page_ids()
    }
}
