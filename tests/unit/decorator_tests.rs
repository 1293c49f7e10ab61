/*!
 * Tests for the output-charset decorator over real containers
 */

use anyhow::Result;
use translation_store::container::AdminContainer;
use translation_store::decorator::EncodingDecorator;
use translation_store::language::LanguageSpec;
use crate::common;

/// The decorator must encode values read from the relational backend
#[test]
fn test_decorator_overRelationalContainer_shouldEncodeLookups() -> Result<()> {
    let mut container = common::relational_container()?;
    container.create_language(&LanguageSpec::new("fr", "i18n").with_encoding("ISO-8859-1"))?;
    container.add_or_update_entry("boy", Some("people"), &common::translations(&[("fr", "Garçon")]))?;

    let decorator = EncodingDecorator::new(&container);

    assert_eq!(decorator.get_one("boy", Some("people"), "fr")?, Some(b"Gar\xE7on".to_vec()));
    let page = decorator.get_page(Some("people"), "fr")?;
    assert_eq!(page.get("boy"), Some(&Some(b"Gar\xE7on".to_vec())));
    assert_eq!(decorator.get_string_id(b"Gar\xE7on", Some("people"))?, "boy");
    assert_eq!(decorator.fetch_languages()?.len(), 1);
    Ok(())
}

/// A UTF-8 output charset leaves values byte-identical
#[test]
fn test_decorator_withUtf8Output_shouldPassValuesThrough() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let (container, _) = common::document_container(
        &dir,
        r#"<translation2><languages><lang id="ja"/></languages><pages><page key="p"><string key="city"><tr lang="ja">東京</tr></string></page></pages></translation2>"#.as_bytes(),
    )?;

    let decorator = EncodingDecorator::with_charset(container, "UTF-8");

    assert_eq!(decorator.get_one("city", Some("p"), "ja")?, Some("東京".as_bytes().to_vec()));
    assert_eq!(decorator.charset(), "UTF-8");
    Ok(())
}
