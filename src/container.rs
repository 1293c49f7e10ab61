/*!
 * The uniform contract every storage backend implements.
 *
 * Reads never fail because something is absent: a missing string comes back
 * as `None`, a missing page as an empty mapping. Administrative operations
 * live in `AdminContainer` so read-only consumers can take `&dyn Container`.
 */

use indexmap::IndexMap;
use log::info;

use crate::app_config::BackendConfig;
use crate::database::RelationalContainer;
use crate::document::DocumentContainer;
use crate::errors::Result;
use crate::language::{Language, LanguageSpec};

/// Values of one string entry keyed by language id
pub type Translations = IndexMap<String, String>;

/// Strings of one page in one language; `None` marks a missing translation
pub type PageStrings = IndexMap<String, Option<String>>;

/// Registered languages keyed by id, in registration order
pub type LanguageMap = IndexMap<String, Language>;

/// Read side of a translation container
pub trait Container {
    /// Snapshot of every registered language
    fn fetch_languages(&self) -> Result<LanguageMap>;

    /// Every string of a page in one language
    fn get_page(&self, page_id: Option<&str>, lang_id: &str) -> Result<PageStrings>;

    /// One string in one language
    fn get_one(&self, string_id: &str, page_id: Option<&str>, lang_id: &str) -> Result<Option<String>>;

    /// First string id on the page whose value equals `value` in any language.
    ///
    /// Returns an empty string when nothing matches.
    fn get_string_id(&self, value: &str, page_id: Option<&str>) -> Result<String>;
}

/// Write side of a translation container
pub trait AdminContainer: Container {
    /// Make storage for a new language and register it
    fn create_language(&mut self, spec: &LanguageSpec) -> Result<()>;

    /// Unregister a language and drop its storage.
    ///
    /// `force` also drops data of languages sharing the same storage.
    fn remove_language(&mut self, lang_id: &str, force: bool) -> Result<()>;

    /// Insert the entry, or update it when it already exists.
    ///
    /// Languages that are not registered are ignored.
    fn add_or_update_entry(&mut self, string_id: &str, page_id: Option<&str>, values: &Translations) -> Result<()>;

    /// Update an existing entry; a missing entry is not an error
    fn update_entry(&mut self, string_id: &str, page_id: Option<&str>, values: &Translations) -> Result<()>;

    fn remove_entry(&mut self, string_id: &str, page_id: Option<&str>) -> Result<()>;

    /// Distinct page ids; `None` is the absent page
    fn list_page_ids(&self) -> Result<Vec<Option<String>>>;

    /// Persist pending changes. Backends that write through do nothing.
    fn save(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Open the container selected by configuration
pub fn open(config: &BackendConfig) -> Result<Box<dyn AdminContainer>> {
    info!("Opening {} container", config.kind());
    match config {
        BackendConfig::Sqlite(relational) => Ok(Box::new(RelationalContainer::open(relational)?)),
        BackendConfig::Xml(document) => Ok(Box::new(DocumentContainer::open(document)?)),
    }
}

impl<C: Container + ?Sized> Container for &C {
    fn fetch_languages(&self) -> Result<LanguageMap> {
        (**self).fetch_languages()
    }

    fn get_page(&self, page_id: Option<&str>, lang_id: &str) -> Result<PageStrings> {
        (**self).get_page(page_id, lang_id)
    }

    fn get_one(&self, string_id: &str, page_id: Option<&str>, lang_id: &str) -> Result<Option<String>> {
        (**self).get_one(string_id, page_id, lang_id)
    }

    fn get_string_id(&self, value: &str, page_id: Option<&str>) -> Result<String> {
        (**self).get_string_id(value, page_id)
    }
}

impl<C: Container + ?Sized> Container for Box<C> {
    fn fetch_languages(&self) -> Result<LanguageMap> {
        (**self).fetch_languages()
    }

    fn get_page(&self, page_id: Option<&str>, lang_id: &str) -> Result<PageStrings> {
        (**self).get_page(page_id, lang_id)
    }

    fn get_one(&self, string_id: &str, page_id: Option<&str>, lang_id: &str) -> Result<Option<String>> {
        (**self).get_one(string_id, page_id, lang_id)
    }

    fn get_string_id(&self, value: &str, page_id: Option<&str>) -> Result<String> {
        (**self).get_string_id(value, page_id)
    }
}
