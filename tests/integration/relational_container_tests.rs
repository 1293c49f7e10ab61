/*!
 * Integration tests for the SQLite-backed container
 */

use anyhow::Result;
use translation_store::app_config::{BackendConfig, RelationalConfig};
use translation_store::container::{self, AdminContainer, Container};
use translation_store::database::{DatabaseConnection, QueryBackend, RelationalContainer};
use translation_store::errors::StorageError;
use translation_store::language::LanguageSpec;
use crate::common::{self, translations};

/// en and fr share `i18n`, de has `i18n_de` to itself
fn three_language_store() -> Result<RelationalContainer> {
    let mut store = common::relational_container()?;
    common::register_languages(&mut store, &[("en", "i18n"), ("fr", "i18n"), ("de", "i18n_de")])?;
    Ok(store)
}

/// Test the documented multi-table write scenario
#[test]
fn test_upsert_withLanguagesInTwoTables_shouldWriteOneRowPerTable() -> Result<()> {
    let mut store = three_language_store()?;

    store.add_or_update_entry(
        "greet",
        Some("home"),
        &translations(&[("en", "Hi"), ("fr", "Salut"), ("de", "Hallo")]),
    )?;

    let db = store.backend();
    assert_eq!(
        db.query_rows("SELECT id, page_id, en, fr FROM i18n")?,
        vec![vec![
            Some("greet".to_string()),
            Some("home".to_string()),
            Some("Hi".to_string()),
            Some("Salut".to_string()),
        ]]
    );
    assert_eq!(
        db.query_rows("SELECT id, page_id, de FROM i18n_de")?,
        vec![vec![Some("greet".to_string()), Some("home".to_string()), Some("Hallo".to_string())]]
    );
    assert_eq!(store.get_one("greet", Some("home"), "fr")?.as_deref(), Some("Salut"));
    Ok(())
}

/// Test that every written value reads back for every registered language
#[test]
fn test_upsert_thenGetOne_shouldReturnWrittenValue() -> Result<()> {
    let mut store = three_language_store()?;
    let cases = [
        ("title", None, "en", "Welcome"),
        ("title", Some(""), "fr", "Bienvenue (vide)"),
        ("title", Some("home"), "de", "Willkommen"),
        ("quote", Some("home"), "fr", "l'été"),
    ];

    for (string_id, page_id, lang, value) in cases {
        store.add_or_update_entry(string_id, page_id, &translations(&[(lang, value)]))?;
        assert_eq!(store.get_one(string_id, page_id, lang)?.as_deref(), Some(value));
    }

    // absent and empty page ids stay distinct entries
    assert_eq!(store.get_one("title", None, "fr")?, None);
    assert_eq!(store.get_one("title", Some(""), "en")?, None);
    Ok(())
}

/// Test removing a language that shares its table without force
#[test]
fn test_removeLanguage_withSharedTableAndNoForce_shouldKeepOtherLanguages() -> Result<()> {
    let mut store = common::relational_container()?;
    common::register_languages(&mut store, &[("en", "i18n"), ("fr", "i18n"), ("it", "i18n")])?;
    store.add_or_update_entry(
        "greet",
        None,
        &translations(&[("en", "Hi"), ("fr", "Salut"), ("it", "Ciao")]),
    )?;

    store.remove_language("fr", false)?;

    assert_eq!(store.get_one("greet", None, "en")?.as_deref(), Some("Hi"));
    assert_eq!(store.get_one("greet", None, "it")?.as_deref(), Some("Ciao"));
    assert!(matches!(
        store.get_one("greet", None, "fr"),
        Err(StorageError::UnknownLanguage(_))
    ));
    let languages = store.fetch_languages()?;
    assert_eq!(languages.keys().collect::<Vec<_>>(), vec!["en", "it"]);
    Ok(())
}

/// Test that a forced removal drops the data of every language in the table
#[test]
fn test_removeLanguage_withForce_shouldDropSharedTable() -> Result<()> {
    let mut store = three_language_store()?;
    store.add_or_update_entry("greet", None, &translations(&[("en", "Hi"), ("de", "Hallo")]))?;

    store.remove_language("fr", true)?;

    let tables = store.backend().list_tables()?;
    assert!(!tables.contains(&"i18n".to_string()));
    assert!(tables.contains(&"i18n_de".to_string()));
    assert_eq!(store.get_one("greet", None, "de")?.as_deref(), Some("Hallo"));

    // en is still registered but its table is gone
    assert!(store.get_one("greet", None, "en").is_err());
    Ok(())
}

/// Test the no-op success when no supplied language is registered
#[test]
fn test_upsert_withOnlyUnknownLanguages_shouldSucceedWithoutWriting() -> Result<()> {
    let mut store = three_language_store()?;

    store.add_or_update_entry("ghost", None, &translations(&[("xx", "?"), ("yy", "?")]))?;
    store.update_entry("ghost", None, &translations(&[("zz", "?")]))?;

    assert!(store.list_page_ids()?.is_empty());
    assert_eq!(store.backend().query_one("SELECT COUNT(*) FROM i18n")?.as_deref(), Some("0"));
    Ok(())
}

/// Test reads of pages, string ids and page listings
#[test]
fn test_reads_afterSeveralWrites_shouldReflectStoredEntries() -> Result<()> {
    let mut store = three_language_store()?;
    store.add_or_update_entry("yes", Some("ui"), &translations(&[("en", "Yes"), ("de", "Ja")]))?;
    store.add_or_update_entry("no", Some("ui"), &translations(&[("en", "No")]))?;
    store.add_or_update_entry("intro", None, &translations(&[("de", "Einleitung")]))?;

    // "no" was never written to i18n_de
    let page = store.get_page(Some("ui"), "de")?;
    assert_eq!(page.len(), 1);
    assert_eq!(page.get("yes"), Some(&Some("Ja".to_string())));
    let page = store.get_page(Some("ui"), "en")?;
    assert_eq!(page.get("yes"), Some(&Some("Yes".to_string())));
    assert_eq!(page.get("no"), Some(&Some("No".to_string())));
    assert_eq!(page.len(), 2);

    assert_eq!(store.get_string_id("Ja", Some("ui"))?, "yes");
    assert_eq!(store.get_string_id("Einleitung", None)?, "intro");
    assert_eq!(store.get_string_id("Nope", Some("ui"))?, "");

    let mut pages = store.list_page_ids()?;
    pages.sort();
    assert_eq!(pages, vec![None, Some("ui".to_string())]);

    store.remove_entry("yes", Some("ui"))?;
    assert_eq!(store.get_one("yes", Some("ui"), "en")?, None);
    assert_eq!(store.get_one("yes", Some("ui"), "de")?, None);
    Ok(())
}

/// Test that the language directory is loaded once and reused
#[test]
fn test_languageDirectory_shouldBeCachedUntilInvalidated() -> Result<()> {
    let mut store = three_language_store()?;
    store.add_or_update_entry("greet", None, &translations(&[("en", "Hi")]))?;

    // Another writer registers a language behind the container's back
    let db = store.backend().clone();
    db.execute("ALTER TABLE i18n ADD COLUMN es TEXT")?;
    db.execute("INSERT INTO langs (id, name, meta, error_text, encoding) VALUES ('es', 'Español', '', '', '')")?;

    assert!(!store.fetch_languages()?.contains_key("es"));

    store.invalidate();
    let languages = store.fetch_languages()?;
    assert_eq!(languages["es"].name, "Español");
    assert_eq!(languages["es"].encoding, "UTF-8");

    store.add_or_update_entry("greet", None, &translations(&[("es", "Hola")]))?;
    assert_eq!(store.get_one("greet", None, "es")?.as_deref(), Some("Hola"));

    let before = db.query_count();
    store.fetch_languages()?;
    assert_eq!(db.query_count(), before);
    Ok(())
}

/// Test that table patterns from configuration drive the physical layout
#[test]
fn test_createLanguage_withConfiguredPatterns_shouldUseExpandedNames() -> Result<()> {
    let mut config = RelationalConfig::default();
    config.strings_default_table = "strings_%s".to_string();
    config.string_text_col = "text_%s".to_string();
    config.langs_avail_table = "languages".to_string();
    let mut store = common::relational_container_with(&config)?;

    store.create_language(&LanguageSpec::new("nl", "strings_nl").with_name("Nederlands"))?;
    store.add_or_update_entry("hello", None, &translations(&[("nl", "Hallo")]))?;

    assert_eq!(
        store.backend().query_one("SELECT text_nl FROM strings_nl WHERE id = 'hello'")?.as_deref(),
        Some("Hallo")
    );

    // A fresh container over the same database finds the language by pattern
    let reopened = RelationalContainer::new(store.backend().clone(), &config)?;
    assert_eq!(reopened.get_one("hello", None, "nl")?.as_deref(), Some("Hallo"));
    assert_eq!(reopened.fetch_languages()?["nl"].table.as_deref(), Some("strings_nl"));
    Ok(())
}

/// Test the schema error when a language is added twice to one table
#[test]
fn test_createLanguage_withExistingColumn_shouldFailWithSchemaError() -> Result<()> {
    let mut store = three_language_store()?;

    let result = store.create_language(&LanguageSpec::new("en", "i18n"));

    assert!(matches!(result, Err(StorageError::Schema { .. })));
    Ok(())
}

/// Test opening a file-backed store through the configuration factory
#[test]
fn test_open_withSqliteConfig_shouldPersistAcrossContainers() -> Result<()> {
    common::init_test_logging();
    let dir = common::create_temp_dir()?;
    let mut relational = RelationalConfig::default();
    relational.database_path = Some(dir.path().join("store.db"));
    relational.strings_tables.insert("de".to_string(), "i18n_de".to_string());
    let config = BackendConfig::Sqlite(relational);

    {
        let mut store = container::open(&config)?;
        store.create_language(&LanguageSpec::new("de", "i18n_de"))?;
        store.add_or_update_entry("greet", Some("home"), &translations(&[("de", "Hallo")]))?;
        store.save()?;
    }

    let store = container::open(&config)?;
    assert_eq!(store.get_one("greet", Some("home"), "de")?.as_deref(), Some("Hallo"));
    assert_eq!(store.list_page_ids()?, vec![Some("home".to_string())]);
    Ok(())
}

/// Test that tables chosen at registration are found again by a new process
#[test]
fn test_open_withTableOutsideConfiguredPattern_shouldRecoverTableOnReopen() -> Result<()> {
    common::init_test_logging();
    let dir = common::create_temp_dir()?;
    let mut relational = RelationalConfig::default();
    relational.database_path = Some(dir.path().join("store.db"));
    let config = BackendConfig::Sqlite(relational);

    {
        let mut store = container::open(&config)?;
        store.create_language(&LanguageSpec::new("en", "i18n"))?;
        store.create_language(&LanguageSpec::new("de", "i18n_de"))?;
        store.add_or_update_entry("greet", Some("home"), &translations(&[("de", "Hallo"), ("en", "Hi")]))?;
    }

    {
        let mut store = container::open(&config)?;
        assert_eq!(store.get_one("greet", Some("home"), "de")?.as_deref(), Some("Hallo"));
        assert_eq!(store.fetch_languages()?["de"].table.as_deref(), Some("i18n_de"));
        assert_eq!(store.fetch_languages()?["en"].table.as_deref(), Some("i18n"));
        store.add_or_update_entry("greet", Some("home"), &translations(&[("de", "Servus")]))?;
    }

    let mut store = container::open(&config)?;
    assert_eq!(store.get_one("greet", Some("home"), "de")?.as_deref(), Some("Servus"));

    // the column is dropped from the table that really holds it
    store.remove_language("de", false)?;
    let db = DatabaseConnection::new(dir.path().join("store.db"))?;
    assert!(!db.list_tables()?.contains(&"i18n_de".to_string()));
    assert_eq!(db.list_columns("i18n")?, vec!["page_id", "id", "en"]);
    Ok(())
}

/// Test that a connection can be shared between two containers
#[test]
fn test_sharedConnection_shouldSeeWritesAfterRefresh() -> Result<()> {
    common::init_test_logging();
    let db = DatabaseConnection::new_in_memory()?;
    let config = RelationalConfig::default();
    let mut writer = RelationalContainer::new(db.clone(), &config)?;
    let reader = RelationalContainer::new(db, &config)?;

    assert!(reader.fetch_languages()?.is_empty());
    writer.create_language(&LanguageSpec::new("en", "i18n"))?;
    writer.add_or_update_entry("greet", None, &translations(&[("en", "Hi")]))?;

    reader.refresh()?;
    assert_eq!(reader.get_one("greet", None, "en")?.as_deref(), Some("Hi"));
    Ok(())
}
