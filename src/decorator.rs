/*!
 * Output-charset decorator.
 *
 * Wraps any container and hands lookups back as bytes in a fixed output
 * charset instead of working-charset strings. Missing and empty values are
 * passed through untouched.
 */

use indexmap::IndexMap;

use crate::container::{Container, LanguageMap};
use crate::encoding;
use crate::errors::Result;

/// Charset used when none is configured
pub const DEFAULT_OUTPUT_CHARSET: &str = "ISO-8859-1";

/// Strings of one page encoded in the output charset
pub type EncodedPage = IndexMap<String, Option<Vec<u8>>>;

/// Re-encodes everything a container returns
#[derive(Debug, Clone)]
pub struct EncodingDecorator<C> {
    inner: C,
    charset: String,
}

impl<C: Container> EncodingDecorator<C> {
    pub fn new(inner: C) -> Self {
        Self::with_charset(inner, DEFAULT_OUTPUT_CHARSET)
    }

    pub fn with_charset(inner: C, charset: impl Into<String>) -> Self {
        Self {
            inner,
            charset: charset.into(),
        }
    }

    pub fn charset(&self) -> &str {
        &self.charset
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }

    pub fn into_inner(self) -> C {
        self.inner
    }

    fn encode(&self, value: String) -> Result<Vec<u8>> {
        if value.is_empty() {
            return Ok(value.into_bytes());
        }
        encoding::encode(&value, &self.charset)
    }

    pub fn fetch_languages(&self) -> Result<LanguageMap> {
        self.inner.fetch_languages()
    }

    pub fn get_one(&self, string_id: &str, page_id: Option<&str>, lang_id: &str) -> Result<Option<Vec<u8>>> {
        self.inner
            .get_one(string_id, page_id, lang_id)?
            .map(|value| self.encode(value))
            .transpose()
    }

    pub fn get_page(&self, page_id: Option<&str>, lang_id: &str) -> Result<EncodedPage> {
        self.inner
            .get_page(page_id, lang_id)?
            .into_iter()
            .map(|(string_id, value)| Ok((string_id, value.map(|v| self.encode(v)).transpose()?)))
            .collect()
    }

    /// Look up a string id by a value given in the output charset
    pub fn get_string_id(&self, value: &[u8], page_id: Option<&str>) -> Result<String> {
        let value = encoding::decode(value, &self.charset)?;
        self.inner.get_string_id(&value, page_id)
    }
}
