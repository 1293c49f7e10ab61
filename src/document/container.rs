/*!
 * Document container: a whole translation document held in memory.
 *
 * The file is read once, under a shared advisory lock, when the container is
 * opened. Mutations change the in-memory index; they reach the file on
 * `save`, or immediately when `save_on_change` is set. Writers of the same
 * file must coordinate externally.
 */

use fs2::FileExt;
use log::{debug, info, warn};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;

use super::index::DocumentIndex;
use super::{raw, writer};
use crate::app_config::DocumentConfig;
use crate::container::{AdminContainer, Container, LanguageMap, PageStrings, Translations};
use crate::errors::{Result, StorageError};
use crate::language::{Language, LanguageSpec};

fn unavailable(path: &Path) -> impl Fn(std::io::Error) -> StorageError + '_ {
    move |source| StorageError::ResourceUnavailable {
        path: path.display().to_string(),
        source,
    }
}

/// Read the whole file while holding a shared lock on it
fn read_locked(path: &Path) -> Result<Vec<u8>> {
    let mut file = File::open(path).map_err(unavailable(path))?;
    FileExt::lock_shared(&file).map_err(unavailable(path))?;

    let mut bytes = Vec::new();
    let read = file.read_to_end(&mut bytes);
    if let Err(e) = FileExt::unlock(&file) {
        debug!("Failed to release lock on {}: {}", path.display(), e);
    }
    read.map_err(unavailable(path))?;

    Ok(bytes)
}

/// Container over a single XML document
#[derive(Debug)]
pub struct DocumentContainer {
    config: DocumentConfig,
    index: DocumentIndex,
    dirty: bool,
}

impl DocumentContainer {
    /// Load the document named by the configuration
    pub fn open(config: &DocumentConfig) -> Result<Self> {
        let bytes = read_locked(&config.filename)?;
        let index = DocumentIndex::load(raw::parse(&bytes)?, &config.default_encoding)?;

        info!(
            "Loaded {} language(s) and {} page(s) from {}",
            index.languages().len(),
            index.pages().len(),
            config.filename.display()
        );

        Ok(Self {
            config: config.clone(),
            index,
            dirty: false,
        })
    }

    pub fn index(&self) -> &DocumentIndex {
        &self.index
    }

    pub fn path(&self) -> &Path {
        &self.config.filename
    }

    /// Whether the index holds changes not yet written
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    fn changed(&mut self) -> Result<()> {
        self.dirty = true;
        if self.config.save_on_change {
            return self.save();
        }
        Ok(())
    }
}

impl Drop for DocumentContainer {
    fn drop(&mut self) {
        if self.dirty {
            warn!("Unsaved changes to {} discarded", self.config.filename.display());
        }
    }
}

impl Container for DocumentContainer {
    fn fetch_languages(&self) -> Result<LanguageMap> {
        Ok(self.index.languages().clone())
    }

    fn get_page(&self, page_id: Option<&str>, lang_id: &str) -> Result<PageStrings> {
        Ok(self.index.get_page(page_id, lang_id))
    }

    fn get_one(&self, string_id: &str, page_id: Option<&str>, lang_id: &str) -> Result<Option<String>> {
        Ok(self.index.get_one(string_id, page_id, lang_id).map(str::to_string))
    }

    fn get_string_id(&self, value: &str, page_id: Option<&str>) -> Result<String> {
        Ok(self
            .index
            .find_string_id(value, page_id)
            .map(str::to_string)
            .unwrap_or_default())
    }
}

impl AdminContainer for DocumentContainer {
    /// The document has no physical tables; `spec.table_name` is ignored
    fn create_language(&mut self, spec: &LanguageSpec) -> Result<()> {
        let mut language: Language = spec.to_language();
        language.table = None;
        if language.encoding.trim().is_empty() {
            language.encoding = self.config.default_encoding.clone();
        }

        info!("Adding language {} to {}", language.id, self.config.filename.display());
        self.index.add_language(language);
        self.changed()
    }

    /// Values of the language are dropped everywhere; `force` has no effect
    fn remove_language(&mut self, lang_id: &str, _force: bool) -> Result<()> {
        self.index.remove_language(lang_id)?;
        info!("Removed language {} from {}", lang_id, self.config.filename.display());
        self.changed()
    }

    fn add_or_update_entry(&mut self, string_id: &str, page_id: Option<&str>, values: &Translations) -> Result<()> {
        if !self.index.upsert(string_id, page_id, values) {
            debug!("No declared language in entry {:?}; nothing written", string_id);
            return Ok(());
        }
        self.changed()
    }

    fn update_entry(&mut self, string_id: &str, page_id: Option<&str>, values: &Translations) -> Result<()> {
        if !self.index.update(string_id, page_id, values) {
            debug!("Entry {:?} not updated", string_id);
            return Ok(());
        }
        self.changed()
    }

    fn remove_entry(&mut self, string_id: &str, page_id: Option<&str>) -> Result<()> {
        if !self.index.remove_entry(string_id, page_id) {
            return Ok(());
        }
        self.changed()
    }

    fn list_page_ids(&self) -> Result<Vec<Option<String>>> {
        Ok(self.index.page_ids())
    }

    /// Write the document atomically next to its current location
    fn save(&mut self) -> Result<()> {
        let bytes = writer::to_xml(&self.index)?;
        let path = self.config.filename.as_path();
        let dir = path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        let mut file = NamedTempFile::new_in(dir).map_err(unavailable(path))?;
        file.write_all(&bytes).map_err(unavailable(path))?;
        file.as_file().sync_all().map_err(unavailable(path))?;
        file.persist(path).map_err(|e| unavailable(path)(e.error))?;

        self.dirty = false;
        info!("Saved {} ({} bytes)", path.display(), bytes.len());
        Ok(())
    }
}
