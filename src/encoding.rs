/*!
 * Charset conversion between declared text encodings.
 *
 * Languages declare the charset their strings are stored in. In memory every
 * value lives in the working charset (UTF-8); this module moves bytes between
 * the two and refuses conversions that cannot represent the input.
 */

use std::borrow::Cow;

use encoding_rs::{Encoding, UTF_8};

use crate::errors::{Result, StorageError};

/// Charset of every in-memory value
pub const WORKING_CHARSET: &str = "UTF-8";

/// Compare two charset labels the way the conversion routine does
pub fn same_charset(left: &str, right: &str) -> bool {
    left.trim().eq_ignore_ascii_case(right.trim())
}

/// Whether `label` names a charset values can be both decoded from and encoded into
pub fn is_supported(label: &str) -> bool {
    Encoding::for_label(label.trim().as_bytes()).is_some_and(|e| e.output_encoding() == e)
}

/// Convert `value` from `source` charset to `target` charset.
///
/// Equal labels (case-insensitive) short-circuit to the input unchanged, even
/// when the label is unknown or the bytes are not valid in that charset.
pub fn convert<'a>(value: &'a [u8], source: &str, target: &str) -> Result<Cow<'a, [u8]>> {
    if same_charset(source, target) {
        return Ok(Cow::Borrowed(value));
    }

    let failure = || StorageError::EncodingConversion {
        source_charset: source.trim().to_uppercase(),
        target_charset: target.trim().to_uppercase(),
        value: String::from_utf8_lossy(value).into_owned(),
    };

    let from = Encoding::for_label(source.trim().as_bytes()).ok_or_else(failure)?;
    let to = Encoding::for_label(target.trim().as_bytes()).ok_or_else(failure)?;

    // UTF-16 has no encoder in encoding_rs; it would silently emit UTF-8
    if to.output_encoding() != to {
        return Err(failure());
    }

    let decoded = from
        .decode_without_bom_handling_and_without_replacement(value)
        .ok_or_else(failure)?;

    if to == UTF_8 {
        return Ok(Cow::Owned(decoded.into_owned().into_bytes()));
    }

    let (encoded, _, had_unmappable) = to.encode(&decoded);
    if had_unmappable {
        return Err(failure());
    }

    Ok(Cow::Owned(encoded.into_owned()))
}

/// Decode bytes declared in `charset` into a working-charset string
pub fn decode(value: &[u8], charset: &str) -> Result<String> {
    let converted = convert(value, charset, WORKING_CHARSET)?;
    String::from_utf8(converted.into_owned()).map_err(|e| StorageError::EncodingConversion {
        source_charset: charset.trim().to_uppercase(),
        target_charset: WORKING_CHARSET.to_string(),
        value: String::from_utf8_lossy(e.as_bytes()).into_owned(),
    })
}

/// Encode a working-charset string into `charset`
pub fn encode(value: &str, charset: &str) -> Result<Vec<u8>> {
    Ok(convert(value.as_bytes(), WORKING_CHARSET, charset)?.into_owned())
}
