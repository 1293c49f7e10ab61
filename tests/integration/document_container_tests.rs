/*!
 * Integration tests for the XML document container
 */

use anyhow::Result;
use translation_store::app_config::{BackendConfig, DocumentConfig};
use translation_store::container::{self, AdminContainer, Container};
use translation_store::document::DocumentContainer;
use translation_store::errors::StorageError;
use translation_store::language::LanguageSpec;
use crate::common::{self, translations};

const PETS: &str = r#"<?xml version="1.0" encoding="iso-8859-1"?>
<translation2>
    <languages>
        <lang id="fr_FR">
            <name>French</name>
            <encoding>iso-8859-1</encoding>
        </lang>
        <lang id="en">
            <name>English</name>
        </lang>
    </languages>
    <pages>
        <page key="pets">
            <string key="cat">
                <tr lang="fr_FR">Chat</tr>
                <tr lang="en">Cat</tr>
            </string>
        </page>
    </pages>
</translation2>
"#;

/// Test reading a page of a declared latin-1 language
#[test]
fn test_getPage_withDeclaredLanguage_shouldReturnPageStrings() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let (store, _) = common::document_container(&dir, PETS.as_bytes())?;

    let page = store.get_page(Some("pets"), "fr_FR")?;

    assert_eq!(page.len(), 1);
    assert_eq!(page["cat"].as_deref(), Some("Chat"));
    assert_eq!(store.fetch_languages()?["fr_FR"].encoding, "iso-8859-1");
    assert_eq!(store.fetch_languages()?["en"].encoding, "UTF-8");
    Ok(())
}

/// Test that a page holding only text reads as an empty page
#[test]
fn test_getPage_withTextOnlyPage_shouldReturnEmptyMapping() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let xml = r#"<translation2><languages><lang id="fr_FR"/></languages><pages><page key="pets"></page></pages></translation2>"#;
    let (store, _) = common::document_container(&dir, xml.as_bytes())?;

    assert!(store.get_page(Some("pets"), "fr_FR")?.is_empty());
    assert_eq!(store.list_page_ids()?, vec![Some("pets".to_string())]);
    Ok(())
}

/// Test that latin-1 bytes in the file become working-charset strings
#[test]
fn test_open_withLatin1Bytes_shouldDecodePerLanguage() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let mut xml = br#"<translation2><languages><lang id="fr"><encoding>ISO-8859-1</encoding></lang><lang id="en"/></languages><pages><page key="ui"><string key="boy"><tr lang="fr">Gar"#.to_vec();
    xml.push(0xE7);
    xml.extend_from_slice(br#"on &amp; fille</tr><tr lang="en">Boy</tr></string></page></pages></translation2>"#);
    let (store, _) = common::document_container(&dir, &xml)?;

    assert_eq!(store.get_one("boy", Some("ui"), "fr")?.as_deref(), Some("Garçon & fille"));
    assert_eq!(store.get_string_id("Garçon & fille", Some("ui"))?, "boy");
    assert_eq!(store.get_string_id("Boy", Some("ui"))?, "boy");
    assert_eq!(store.get_string_id("Girl", Some("ui"))?, "");
    Ok(())
}

/// Test that saving and reopening preserves every language, page and value
#[test]
fn test_save_thenReopen_shouldPreserveDocument() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let (mut store, config) = common::document_container(&dir, PETS.as_bytes())?;

    store.create_language(&LanguageSpec::new("de", "ignored").with_name("Deutsch"))?;
    store.add_or_update_entry("cat", Some("pets"), &translations(&[("de", "Katze"), ("fr_FR", "Chatte")]))?;
    store.add_or_update_entry("dog", Some("pets"), &translations(&[("fr_FR", "Chien été")]))?;
    store.add_or_update_entry("title", None, &translations(&[("en", "<Home> & \"away\"")]))?;
    store.add_or_update_entry("blank", Some(""), &translations(&[("en", "")]))?;
    assert!(store.is_dirty());
    store.save()?;
    assert!(!store.is_dirty());

    let reopened = DocumentContainer::open(&config)?;
    assert_eq!(reopened.index(), store.index());
    assert_eq!(reopened.get_one("dog", Some("pets"), "fr_FR")?.as_deref(), Some("Chien été"));
    assert_eq!(reopened.get_one("title", None, "en")?.as_deref(), Some("<Home> & \"away\""));
    assert_eq!(reopened.get_one("blank", Some(""), "en")?.as_deref(), Some(""));
    assert_eq!(reopened.get_one("title", Some(""), "en")?, None);
    assert_eq!(reopened.fetch_languages()?["de"].table, None);

    // fr_FR values are stored in its own charset
    let bytes = std::fs::read(&config.filename)?;
    assert!(bytes.windows(10).any(|w| w == b"Chien \xE9t\xE9<"));
    Ok(())
}

/// Test that edge whitespace of values and language fields survives a save
#[test]
fn test_save_thenReopen_withEdgeWhitespace_shouldKeepValuesVerbatim() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let (mut store, config) = common::document_container(&dir, PETS.as_bytes())?;

    store.create_language(&LanguageSpec::new("es", "").with_name(" Español ").with_error_text("\tfalta\n"))?;
    store.add_or_update_entry("s", Some("p"), &translations(&[("en", " Hello, ")]))?;
    store.add_or_update_entry("t", Some("p"), &translations(&[("en", "  indented\n"), ("fr_FR", "Chat ")]))?;
    store.save()?;

    let reopened = DocumentContainer::open(&config)?;
    assert_eq!(reopened.get_one("s", Some("p"), "en")?.as_deref(), Some(" Hello, "));
    assert_eq!(reopened.get_one("t", Some("p"), "en")?.as_deref(), Some("  indented\n"));
    assert_eq!(reopened.get_one("t", Some("p"), "fr_FR")?.as_deref(), Some("Chat "));
    let languages = reopened.fetch_languages()?;
    assert_eq!(languages["es"].name, " Español ");
    assert_eq!(languages["es"].error_text, "\tfalta\n");
    assert_eq!(reopened.index(), store.index());
    Ok(())
}

/// Test absent and empty page ids through the container surface
#[test]
fn test_listPageIds_withSentinelPages_shouldReturnAbsentAndEmptyIds() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let xml = r##"<translation2><languages><lang id="en"/></languages><pages>
        <page key="#NULL"><string key="a"><tr lang="en">null page</tr></string></page>
        <page key="#EMPTY"><string key="a"><tr lang="en">empty page</tr></string></page>
        <page key="menu"><string key="a"><tr lang="en">menu</tr></string></page>
    </pages></translation2>"##;
    let (store, _) = common::document_container(&dir, xml.as_bytes())?;

    assert_eq!(
        store.list_page_ids()?,
        vec![None, Some(String::new()), Some("menu".to_string())]
    );
    assert_eq!(store.get_one("a", None, "en")?.as_deref(), Some("null page"));
    assert_eq!(store.get_one("a", Some(""), "en")?.as_deref(), Some("empty page"));
    assert_eq!(store.get_string_id("empty page", None)?, "");
    Ok(())
}

/// Test language removal and entry edits on the document
#[test]
fn test_mutations_shouldFollowDeclaredLanguages() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let (mut store, _) = common::document_container(&dir, PETS.as_bytes())?;

    // undeclared languages are skipped
    store.add_or_update_entry("bird", Some("pets"), &translations(&[("xx", "?")]))?;
    assert_eq!(store.get_page(Some("pets"), "en")?.len(), 1);

    store.update_entry("cat", Some("pets"), &translations(&[("en", "Kitty")]))?;
    store.update_entry("ghost", Some("pets"), &translations(&[("en", "Boo")]))?;
    assert_eq!(store.get_one("cat", Some("pets"), "en")?.as_deref(), Some("Kitty"));
    assert_eq!(store.get_one("ghost", Some("pets"), "en")?, None);

    store.remove_language("fr_FR", false)?;
    assert!(!store.fetch_languages()?.contains_key("fr_FR"));
    assert_eq!(store.get_one("cat", Some("pets"), "fr_FR")?, None);
    assert!(matches!(
        store.remove_language("fr_FR", true),
        Err(StorageError::UnknownLanguage(_))
    ));

    store.remove_entry("cat", Some("pets"))?;
    assert!(store.list_page_ids()?.is_empty());

    // nothing is written until save
    let on_disk = DocumentContainer::open(&DocumentConfig::new(store.path()))?;
    assert_eq!(on_disk.get_one("cat", Some("pets"), "fr_FR")?.as_deref(), Some("Chat"));
    Ok(())
}

/// Test that malformed documents are rejected
#[test]
fn test_open_withMalformedDocument_shouldFailWithParseError() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let path = common::create_test_file(dir.path(), "broken.xml", b"<translation2><pages><page key=\"p\"></pages>")?;

    let result = DocumentContainer::open(&DocumentConfig::new(path));

    assert!(matches!(result, Err(StorageError::Parse(_))));
    Ok(())
}

/// Test opening through the configuration factory with auto-save enabled
#[test]
fn test_open_withXmlConfigAndSaveOnChange_shouldWriteEachMutation() -> Result<()> {
    common::init_test_logging();
    let dir = common::create_temp_dir()?;
    let path = common::create_test_file(dir.path(), "pets.xml", PETS.as_bytes())?;
    let mut document = DocumentConfig::new(&path);
    document.save_on_change = true;
    let config = BackendConfig::Xml(document.clone());

    let mut store = container::open(&config)?;
    store.add_or_update_entry("dog", Some("pets"), &translations(&[("en", "Dog")]))?;

    let reopened = container::open(&config)?;
    assert_eq!(reopened.get_one("dog", Some("pets"), "en")?.as_deref(), Some("Dog"));
    assert_eq!(reopened.get_one("cat", Some("pets"), "fr_FR")?.as_deref(), Some("Chat"));
    Ok(())
}
