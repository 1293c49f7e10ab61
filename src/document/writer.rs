/*!
 * Serialization of a document index back to XML.
 *
 * Language fields and translated values are re-encoded into their owning
 * language's charset, the inverse of the decoding applied on load. Markup,
 * keys and language ids are written in the charset named by the XML
 * declaration, or UTF-8 when the declaration names none.
 */

use quick_xml::escape::escape;

use super::index::DocumentIndex;
use crate::encoding::{self, same_charset, WORKING_CHARSET};
use crate::errors::Result;

const INDENT: &str = "    ";

/// Byte buffer with indentation helpers; markup goes out in `charset`
struct XmlBuffer {
    bytes: Vec<u8>,
    charset: String,
}

impl XmlBuffer {
    fn markup(&mut self, markup: &str) -> Result<()> {
        let encoded = encoding::encode(markup, &self.charset)?;
        self.bytes.extend_from_slice(&encoded);
        Ok(())
    }

    fn line(&mut self, depth: usize, markup: &str) -> Result<()> {
        self.markup(&INDENT.repeat(depth))?;
        self.markup(markup)?;
        self.bytes.push(b'\n');
        Ok(())
    }

    /// `<tag attr="..">text</tag>` with `text` encoded into `charset`
    fn text_element(&mut self, depth: usize, open: &str, tag: &str, text: &str, charset: &str) -> Result<()> {
        let encoded = encoding::encode(&escape(text), charset)?;
        self.markup(&INDENT.repeat(depth))?;
        self.markup(open)?;
        self.bytes.extend_from_slice(&encoded);
        self.markup(&format!("</{}>\n", tag))
    }
}

/// Charset named in the XML declaration.
///
/// It is the charset every language shares, provided every id and key can be
/// written in it; otherwise the declaration names none.
fn declared_charset(index: &DocumentIndex) -> Option<String> {
    let mut charsets = index.languages().values().map(|l| l.encoding.trim());
    let first = charsets.next().unwrap_or(WORKING_CHARSET);
    if !charsets.all(|c| same_charset(c, first)) {
        return None;
    }

    let representable = |text: &str| encoding::encode(text, first).is_ok();
    let markup_fits = encoding::is_supported(first)
        && index.languages().keys().all(|id| representable(id))
        && index.pages().iter().all(|(page, entries)| {
            representable(page)
                && entries
                    .iter()
                    .all(|(string_id, values)| representable(string_id) && values.keys().all(|lang| representable(lang)))
        });
    markup_fits.then(|| first.to_string())
}

/// Serialize the whole index
pub fn to_xml(index: &DocumentIndex) -> Result<Vec<u8>> {
    let declared = declared_charset(index);
    let mut out = XmlBuffer {
        bytes: Vec::new(),
        charset: declared.clone().unwrap_or_else(|| WORKING_CHARSET.to_string()),
    };

    match declared {
        Some(charset) => out.line(0, &format!(r#"<?xml version="1.0" encoding="{}"?>"#, escape(&charset)))?,
        None => out.line(0, r#"<?xml version="1.0"?>"#)?,
    }
    out.line(0, "<translation2>")?;

    out.line(1, "<languages>")?;
    for language in index.languages().values() {
        out.line(2, &format!(r#"<lang id="{}">"#, escape(&language.id)))?;
        for (tag, value) in [
            ("name", &language.name),
            ("meta", &language.meta),
            ("error_text", &language.error_text),
        ] {
            out.text_element(3, &format!("<{}>", tag), tag, value, &language.encoding)?;
        }
        out.line(3, &format!("<encoding>{}</encoding>", escape(&language.encoding)))?;
        out.line(2, "</lang>")?;
    }
    out.line(1, "</languages>")?;

    out.line(1, "<pages>")?;
    for (page, entries) in index.pages() {
        out.line(2, &format!(r#"<page key="{}">"#, escape(page)))?;
        for (string_id, values) in entries {
            out.line(3, &format!(r#"<string key="{}">"#, escape(string_id)))?;
            for (lang, value) in values {
                let open = format!(r#"<tr lang="{}">"#, escape(lang));
                out.text_element(4, &open, "tr", value, index.charset_of(lang))?;
            }
            out.line(3, "</string>")?;
        }
        out.line(2, "</page>")?;
    }
    out.line(1, "</pages>")?;

    out.line(0, "</translation2>")?;
    Ok(out.bytes)
}
