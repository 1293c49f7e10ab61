/*!
 * Tests for application configuration functionality
 */

use translation_store::app_config::{BackendConfig, Config, LogLevel, RelationalConfig};
use crate::common;

/// Test default configuration values
#[test]
fn test_default_config_withNoParameters_shouldHaveCorrectDefaults() {
    let config = Config::default();

    assert_eq!(config.log_level, LogLevel::Info);
    assert_eq!(config.backend.kind(), "sqlite");

    let BackendConfig::Sqlite(relational) = &config.backend else {
        panic!("Default backend should be sqlite");
    };
    assert_eq!(relational.langs_avail_table, "langs");
    assert_eq!(relational.lang_id_col, "id");
    assert_eq!(relational.lang_errmsg_col, "error_text");
    assert_eq!(relational.strings_default_table, "i18n");
    assert_eq!(relational.string_id_col, "id");
    assert_eq!(relational.string_page_id_col, "page_id");
    assert_eq!(relational.string_page_id_col_length, 50);
    assert_eq!(relational.string_text_col, "%s");
    assert!(relational.strings_tables.is_empty());
    assert!(config.validate().is_ok());
}

/// Test configuration validation against the identifier allow-list
#[test]
fn test_config_validation_withUnsafeIdentifiers_shouldFail() {
    let mut relational = RelationalConfig::default();
    assert!(relational.validate().is_ok());

    relational.langs_avail_table = "langs; DROP TABLE i18n".to_string();
    assert!(relational.validate().is_err());
    relational.langs_avail_table = "langs".to_string();

    relational.strings_default_table = "i18n_%s".to_string();
    assert!(relational.validate().is_ok());
    relational.strings_default_table = "i18n-%s".to_string();
    assert!(relational.validate().is_err());
    relational.strings_default_table = "i18n".to_string();

    relational.strings_tables.insert("de".to_string(), "german strings".to_string());
    assert!(relational.validate().is_err());
    relational.strings_tables.clear();

    relational.string_page_id_col_length = 0;
    assert!(relational.validate().is_err());
}

/// Test loading a partial JSON file for the xml backend
#[test]
fn test_config_load_withPartialXmlConfig_shouldFillDefaults() -> anyhow::Result<()> {
    let dir = common::create_temp_dir()?;
    let path = common::create_test_file(
        dir.path(),
        "conf.json",
        br#"{ "log_level": "debug", "backend": { "type": "xml", "filename": "strings.xml" } }"#,
    )?;

    let config = Config::load(&path)?;

    assert_eq!(config.log_level, LogLevel::Debug);
    match &config.backend {
        BackendConfig::Xml(document) => {
            assert_eq!(document.filename.to_string_lossy(), "strings.xml");
            assert_eq!(document.default_encoding, "UTF-8");
            assert!(!document.save_on_change);
        }
        other => panic!("Expected xml backend, got {:?}", other),
    }
    assert!(config.validate().is_ok());
    Ok(())
}

/// Test that a saved configuration loads back unchanged
#[test]
fn test_config_save_thenLoad_shouldPreserveValues() -> anyhow::Result<()> {
    let dir = common::create_temp_dir()?;
    let path = dir.path().join("conf.json");

    let mut relational = RelationalConfig::default();
    relational.strings_tables.insert("de".to_string(), "i18n_de".to_string());
    relational.database_path = Some(dir.path().join("store.db"));
    let config = Config {
        backend: BackendConfig::Sqlite(relational),
        log_level: LogLevel::Warn,
    };

    config.save(&path)?;
    let loaded = Config::load(&path)?;

    assert_eq!(loaded.log_level, LogLevel::Warn);
    let BackendConfig::Sqlite(loaded_relational) = loaded.backend else {
        panic!("Expected sqlite backend");
    };
    assert_eq!(loaded_relational.strings_tables.get("de").map(String::as_str), Some("i18n_de"));
    assert_eq!(loaded_relational.database_path, Some(dir.path().join("store.db")));
    Ok(())
}

/// Test validation of xml backend options
#[test]
fn test_config_validation_withBadXmlOptions_shouldFail() -> anyhow::Result<()> {
    let dir = common::create_temp_dir()?;
    let path = common::create_test_file(
        dir.path(),
        "conf.json",
        br#"{ "backend": { "type": "xml", "filename": "", "default_encoding": "UTF-8" } }"#,
    )?;
    assert!(Config::load(&path)?.validate().is_err());

    let path = common::create_test_file(
        dir.path(),
        "conf2.json",
        br#"{ "backend": { "type": "xml", "filename": "a.xml", "default_encoding": "klingon" } }"#,
    )?;
    assert!(Config::load(&path)?.validate().is_err());
    Ok(())
}

/// Test that an unreadable file reports its path
#[test]
fn test_config_load_withMissingFile_shouldFailWithPath() {
    let error = Config::load("/nonexistent/conf.json").unwrap_err();
    assert!(error.to_string().contains("/nonexistent/conf.json"));
}
