/*!
 * XML parser boundary for the document backend.
 *
 * Produces the document exactly as written: text is kept as raw, still
 * escaped bytes because each language's values may be in a different
 * charset, and any node that should hold children but holds only text is
 * reported as `RawNode::Scalar` for the index to normalize. Attribute
 * values (ids and keys) are markup and follow the charset named in the XML
 * declaration, UTF-8 when it names none.
 */

use log::debug;
use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::encoding::{self, WORKING_CHARSET};
use crate::errors::{Result, StorageError};

/// A node that is either a bare text value or a structure
#[derive(Debug, Clone, PartialEq)]
pub enum RawNode<T> {
    /// Text content (often empty) where children were expected
    Scalar(Vec<u8>),
    Mapping(T),
}

impl<T: Default> RawNode<T> {
    /// Resolve to a structure; text content becomes an empty one
    pub fn into_mapping(self, what: &str) -> T {
        match self {
            RawNode::Mapping(mapping) => mapping,
            RawNode::Scalar(text) => {
                if !text.trim_ascii().is_empty() {
                    log::warn!(
                        "Discarding text content of {}: {:?}",
                        what,
                        String::from_utf8_lossy(&text)
                    );
                }
                T::default()
            }
        }
    }
}

/// `<lang>` entry; fields keep document order, later duplicates win on load
#[derive(Debug, Clone, PartialEq)]
pub struct RawLanguage {
    pub id: String,
    pub fields: Vec<(String, Vec<u8>)>,
}

/// `<string>` entry with its `<tr>` children as (language id, raw text)
#[derive(Debug, Clone, PartialEq)]
pub struct RawString {
    pub key: String,
    pub translations: RawNode<Vec<(String, Vec<u8>)>>,
}

/// `<page>` entry; a key may repeat within a page
#[derive(Debug, Clone, PartialEq)]
pub struct RawPage {
    pub key: String,
    pub strings: RawNode<Vec<RawString>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawDocument {
    pub languages: RawNode<Vec<RawLanguage>>,
    pub pages: RawNode<Vec<RawPage>>,
}

/// Generic element tree built from the event stream
#[derive(Debug, Default)]
struct Element {
    name: Vec<u8>,
    /// Attribute values decoded from the markup charset, still escaped
    attributes: Vec<(Vec<u8>, String)>,
    children: Vec<Element>,
    text: Vec<u8>,
}

impl Element {
    fn open(start: &BytesStart<'_>, charset: &str) -> Result<Self> {
        let mut attributes = Vec::new();
        for attribute in start.attributes() {
            let attribute = attribute.map_err(|e| StorageError::Parse(e.to_string()))?;
            let value = encoding::decode(&attribute.value, charset)?;
            attributes.push((attribute.key.as_ref().to_vec(), value));
        }

        Ok(Self {
            name: start.name().as_ref().to_vec(),
            attributes,
            ..Self::default()
        })
    }

    fn tag(&self) -> String {
        String::from_utf8_lossy(&self.name).into_owned()
    }

    /// Unescaped value of a required attribute
    fn required_attribute(&self, name: &str) -> Result<String> {
        let raw = self
            .attributes
            .iter()
            .find(|(key, _)| key.as_slice() == name.as_bytes())
            .map(|(_, value)| value.as_str())
            .ok_or_else(|| {
                StorageError::Parse(format!("<{}> element without '{}' attribute", self.tag(), name))
            })?;

        unescape_text(raw)
    }

    /// Children if there are any, the text content otherwise
    fn shape<T>(self, build: impl FnOnce(Vec<Element>) -> Result<T>) -> Result<RawNode<T>> {
        if self.children.is_empty() {
            Ok(RawNode::Scalar(self.text))
        } else {
            Ok(RawNode::Mapping(build(self.children)?))
        }
    }
}

/// Resolve entity and character references
pub fn unescape_text(text: &str) -> Result<String> {
    unescape(text)
        .map(|unescaped| unescaped.into_owned())
        .map_err(|e| StorageError::Parse(format!("Invalid escape sequence in {:?}: {}", text, e)))
}

/// CDATA content is literal; escape it so it joins the surrounding raw text
fn escape_bytes(content: &[u8]) -> Vec<u8> {
    let mut escaped = Vec::with_capacity(content.len());
    for &byte in content {
        match byte {
            b'&' => escaped.extend_from_slice(b"&amp;"),
            b'<' => escaped.extend_from_slice(b"&lt;"),
            b'>' => escaped.extend_from_slice(b"&gt;"),
            _ => escaped.push(byte),
        }
    }
    escaped
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) -> Result<()> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(element);
        return Ok(());
    }
    if root.is_some() {
        return Err(StorageError::Parse("More than one root element".to_string()));
    }
    *root = Some(element);
    Ok(())
}

fn parse_tree(bytes: &[u8]) -> Result<Element> {
    // Text is kept verbatim: edge whitespace of values is significant.
    // Indentation between children only reaches nodes whose text is unused.
    let mut reader = Reader::from_reader(bytes);

    let mut buf = Vec::new();
    let mut stack: Vec<Element> = Vec::new();
    let mut root = None;
    let mut charset = WORKING_CHARSET.to_string();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Decl(decl) => {
                if let Some(label) = decl.encoding() {
                    let label = label.map_err(|e| StorageError::Parse(e.to_string()))?;
                    charset = markup_charset(&String::from_utf8_lossy(&label));
                }
            }
            Event::Start(start) => stack.push(Element::open(&start, &charset)?),
            Event::Empty(start) => {
                let element = Element::open(&start, &charset)?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| StorageError::Parse("Unbalanced end tag".to_string()))?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::Text(text) => {
                if let Some(current) = stack.last_mut() {
                    current.text.extend_from_slice(&text.into_inner());
                }
            }
            Event::CData(data) => {
                if let Some(current) = stack.last_mut() {
                    current.text.extend(escape_bytes(&data.into_inner()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if !stack.is_empty() {
        return Err(StorageError::Parse("Unexpected end of document".to_string()));
    }
    root.ok_or_else(|| StorageError::Parse("Document has no root element".to_string()))
}

/// Charset of ids and keys; labels that cannot be decoded fall back to UTF-8
fn markup_charset(label: &str) -> String {
    if encoding::is_supported(label) {
        return label.trim().to_string();
    }
    debug!("Unsupported declared encoding {:?}; reading markup as UTF-8", label);
    WORKING_CHARSET.to_string()
}

fn children_named<'e>(children: Vec<Element>, name: &'e str) -> impl Iterator<Item = Element> + 'e {
    children.into_iter().filter(move |child| {
        let matches = child.name.as_slice() == name.as_bytes();
        if !matches {
            debug!("Ignoring <{}> where <{}> was expected", child.tag(), name);
        }
        matches
    })
}

fn parse_languages(children: Vec<Element>) -> Result<Vec<RawLanguage>> {
    children_named(children, "lang")
        .map(|lang| {
            let id = lang.required_attribute("id")?;
            let fields = lang
                .children
                .into_iter()
                .map(|field| (field.tag(), field.text))
                .collect();
            Ok(RawLanguage { id, fields })
        })
        .collect()
}

fn parse_translations(children: Vec<Element>) -> Result<Vec<(String, Vec<u8>)>> {
    children_named(children, "tr")
        .map(|tr| Ok((tr.required_attribute("lang")?, tr.text)))
        .collect()
}

fn parse_strings(children: Vec<Element>) -> Result<Vec<RawString>> {
    children_named(children, "string")
        .map(|string| {
            let key = string.required_attribute("key")?;
            let translations = string.shape(parse_translations)?;
            Ok(RawString { key, translations })
        })
        .collect()
}

fn parse_pages(children: Vec<Element>) -> Result<Vec<RawPage>> {
    children_named(children, "page")
        .map(|page| {
            let key = page.required_attribute("key")?;
            let strings = page.shape(parse_strings)?;
            Ok(RawPage { key, strings })
        })
        .collect()
}

/// Parse a document into its raw tree.
///
/// A missing `<languages>` or `<pages>` section reads as an empty one.
pub fn parse(bytes: &[u8]) -> Result<RawDocument> {
    let root = parse_tree(bytes)?;
    let mut document = RawDocument {
        languages: RawNode::Scalar(Vec::new()),
        pages: RawNode::Scalar(Vec::new()),
    };

    for section in root.children {
        match section.name.as_slice() {
            b"languages" => document.languages = section.shape(parse_languages)?,
            b"pages" => document.pages = section.shape(parse_pages)?,
            _ => debug!("Ignoring top-level <{}> element", section.tag()),
        }
    }

    Ok(document)
}
