//! Typed read/write of a single element's content.
//!
//! Getters never modify the tree; setters replace the element's
//! content entirely.  Decode failures are reported as `FileCorrupt`
//! carrying the element's source line.

use std::fmt::Display;
use std::io::Read;
use std::str::FromStr;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, NaiveDateTime, Utc};
use flate2::read::GzDecoder;

use super::dom::{Element, Protection};
use super::names::{
    ATTR_COMPRESSED, ATTR_PROTECTED, ATTR_PROTECTED_IN_MEM_PLAIN_XML, ATTR_REF, VAL_FALSE,
    VAL_NULL, VAL_TRUE,
};
use crate::crypto::ProtectedValue;
use crate::errors::{KdbxError, Result};
use crate::format::KdbxUuid;

/// Seconds between 0001-01-01T00:00:00Z and the Unix epoch.
pub const EPOCH_SECONDS: i64 = 62_135_596_800;

/// A KDBX boolean: `True`, `False`, or the literal `null` meaning
/// "defined but unknown".  Absence is expressed with `Option`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XmlBool {
    True,
    False,
    Null,
}

impl XmlBool {
    pub fn as_bool(self) -> Option<bool> {
        match self {
            Self::True => Some(true),
            Self::False => Some(false),
            Self::Null => None,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::True => VAL_TRUE,
            Self::False => VAL_FALSE,
            Self::Null => VAL_NULL,
        }
    }
}

impl From<bool> for XmlBool {
    fn from(value: bool) -> Self {
        if value {
            Self::True
        } else {
            Self::False
        }
    }
}

/// Content of a field that may or may not be memory-protected.
#[derive(Debug, Clone)]
pub enum ProtectedText {
    Protected(ProtectedValue),
    Plain(String),
}

impl ProtectedText {
    /// Plaintext, decoding a protected value if needed.
    pub fn text(&self) -> String {
        match self {
            Self::Protected(pv) => pv.text(),
            Self::Plain(text) => text.clone(),
        }
    }
}

/// Content of a binary attachment element.
#[derive(Debug, Clone)]
pub enum BinaryOrRef {
    Protected(ProtectedValue),
    Inline(Vec<u8>),
    /// Reference to an entry in the document's shared binary pool.
    Ref(String),
}

fn corrupt(el: &Element, message: String) -> KdbxError {
    KdbxError::corrupt_at(message, el.line())
}

// --- Text ---

/// The element's text.  For a protected element this is the decoded
/// value, never the obfuscated form.
pub fn get_text(el: &Element) -> String {
    match el.protection().value() {
        Some(pv) => pv.text(),
        None => el.text_content(),
    }
}

/// Replace all content with `text`.  `None` and `""` both leave the
/// element empty.
pub fn set_text(el: &mut Element, text: Option<&str>) {
    el.set_protection(Protection::Plain);
    el.replace_text(text.unwrap_or_default());
}

// --- Tags ---

/// Split on `;`, `,` or `:`, trimming and dropping empty tags.
pub fn get_tags(el: &Element) -> Vec<String> {
    get_text(el)
        .split([';', ',', ':'])
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Always joined with `", "`, regardless of the separators read.
pub fn set_tags<S: AsRef<str>>(el: &mut Element, tags: &[S]) {
    let joined = tags.iter().map(AsRef::as_ref).collect::<Vec<_>>().join(", ");
    set_text(el, Some(&joined));
}

// --- Bytes ---

pub fn get_bytes(el: &Element) -> Result<Option<Vec<u8>>> {
    let text = get_text(el);
    if text.is_empty() {
        return Ok(None);
    }
    BASE64
        .decode(text.trim())
        .map(Some)
        .map_err(|e| corrupt(el, format!("bad base64 in <{}>: {e}", el.name())))
}

pub fn set_bytes(el: &mut Element, bytes: Option<&[u8]>) {
    let encoded = bytes.map(|b| BASE64.encode(b));
    set_text(el, encoded.as_deref());
}

/// Store bytes given in base64, normalizing the encoding.
pub fn set_bytes_base64(el: &mut Element, encoded: &str) -> Result<()> {
    let bytes = BASE64
        .decode(encoded.trim())
        .map_err(|e| KdbxError::corrupt(format!("bad base64: {e}")))?;
    set_bytes(el, Some(&bytes));
    Ok(())
}

// --- Dates ---

/// Read either form: ISO-8601 text (anything containing `:`) or the
/// base64 of 8 little-endian bytes counting seconds from 0001-01-01.
pub fn get_date(el: &Element) -> Result<Option<DateTime<Utc>>> {
    let text = get_text(el);
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }

    if text.contains(':') {
        if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
            return Ok(Some(dt.with_timezone(&Utc)));
        }
        // Some producers omit the zone designator; those are UTC.
        return NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
            .map(|naive| Some(naive.and_utc()))
            .map_err(|e| corrupt(el, format!("bad date '{text}': {e}")));
    }

    let bytes = BASE64
        .decode(text)
        .map_err(|e| corrupt(el, format!("bad binary date: {e}")))?;
    let raw: [u8; 8] = bytes
        .as_slice()
        .try_into()
        .map_err(|_| corrupt(el, format!("binary date must be 8 bytes, got {}", bytes.len())))?;
    let seconds = i64::from_le_bytes(raw)
        .checked_sub(EPOCH_SECONDS)
        .ok_or_else(|| corrupt(el, "binary date before year 1".to_string()))?;
    DateTime::from_timestamp(seconds, 0)
        .map(Some)
        .ok_or_else(|| corrupt(el, format!("binary date out of range: {seconds}")))
}

/// Write a date truncated to whole seconds, in binary or text form.
/// `None` leaves the element empty.
pub fn set_date(el: &mut Element, date: Option<DateTime<Utc>>, binary: bool) {
    let text = date.map(|dt| {
        if binary {
            let seconds = dt.timestamp() + EPOCH_SECONDS;
            BASE64.encode(seconds.to_le_bytes())
        } else {
            dt.format("%Y-%m-%dT%H:%M:%SZ").to_string()
        }
    });
    set_text(el, text.as_deref());
}

// --- Numbers ---

/// Parsed number, or `None` for empty or unparsable text.
pub fn get_number<T: FromStr>(el: &Element) -> Option<T> {
    let text = get_text(el);
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    text.parse().ok()
}

pub fn set_number<T: Display>(el: &mut Element, number: Option<T>) {
    let text = number.map(|n| n.to_string());
    set_text(el, text.as_deref());
}

// --- Booleans ---

/// Case-insensitive `true`/`false`/`null`; anything else is `None`.
pub fn str_to_boolean(text: Option<&str>) -> Option<XmlBool> {
    let text = text?;
    if text.eq_ignore_ascii_case("true") {
        Some(XmlBool::True)
    } else if text.eq_ignore_ascii_case("false") {
        Some(XmlBool::False)
    } else if text.eq_ignore_ascii_case("null") {
        Some(XmlBool::Null)
    } else {
        None
    }
}

pub fn get_boolean(el: &Element) -> Option<XmlBool> {
    let text = get_text(el);
    if text.is_empty() {
        return None;
    }
    str_to_boolean(Some(&text))
}

pub fn set_boolean(el: &mut Element, value: Option<XmlBool>) {
    set_text(el, value.map(XmlBool::as_str));
}

pub(crate) fn attribute_is_true(el: &Element, name: &str) -> bool {
    str_to_boolean(el.attribute(name)) == Some(XmlBool::True)
}

// --- Identifiers ---

pub fn get_uuid(el: &Element) -> Result<Option<KdbxUuid>> {
    match get_bytes(el)? {
        Some(bytes) => KdbxUuid::from_bytes(&bytes)
            .map(Some)
            .map_err(|_| corrupt(el, format!("bad uuid length {}", bytes.len()))),
        None => Ok(None),
    }
}

pub fn set_uuid(el: &mut Element, uuid: Option<&KdbxUuid>) {
    set_bytes(el, uuid.map(KdbxUuid::as_bytes));
}

// --- Protected scalars ---

/// The protected value if the element carries one, otherwise its text.
pub fn get_protected_text(el: &Element) -> ProtectedText {
    match el.protection().value() {
        Some(pv) => ProtectedText::Protected(pv.clone()),
        None => ProtectedText::Plain(el.text_content()),
    }
}

/// Store a protected value (marking the element) or plain text
/// (clearing the markers).
pub fn set_protected_text(el: &mut Element, value: ProtectedText) {
    el.remove_attribute(ATTR_PROTECTED_IN_MEM_PLAIN_XML);
    match value {
        ProtectedText::Protected(pv) => {
            el.set_attribute(ATTR_PROTECTED, VAL_TRUE);
            el.replace_text(&pv.to_base64());
            el.set_protection(Protection::Protected(pv));
        }
        ProtectedText::Plain(text) => {
            el.remove_attribute(ATTR_PROTECTED);
            set_text(el, Some(&text));
        }
    }
}

// --- Protected binaries ---

/// Decode an attachment element: protected value, pool reference, or
/// inline base64 (gunzipped when `Compressed="True"`).
pub fn get_protected_binary(el: &Element) -> Result<Option<BinaryOrRef>> {
    if let Some(pv) = el.protection().value() {
        return Ok(Some(BinaryOrRef::Protected(pv.clone())));
    }
    if let Some(reference) = el.attribute(ATTR_REF) {
        return Ok(Some(BinaryOrRef::Ref(reference.to_string())));
    }
    let Some(bytes) = get_bytes(el)? else {
        return Ok(None);
    };
    if !attribute_is_true(el, ATTR_COMPRESSED) {
        return Ok(Some(BinaryOrRef::Inline(bytes)));
    }
    let mut inflated = Vec::new();
    GzDecoder::new(bytes.as_slice())
        .read_to_end(&mut inflated)
        .map_err(|e| corrupt(el, format!("bad compressed binary: {e}")))?;
    Ok(Some(BinaryOrRef::Inline(inflated)))
}

/// Write exactly one binary form; attributes belonging to the other
/// forms are removed.
pub fn set_protected_binary(el: &mut Element, binary: BinaryOrRef) {
    for attr in [
        ATTR_PROTECTED,
        ATTR_PROTECTED_IN_MEM_PLAIN_XML,
        ATTR_REF,
        ATTR_COMPRESSED,
    ] {
        el.remove_attribute(attr);
    }
    match binary {
        BinaryOrRef::Protected(pv) => set_protected_text(el, ProtectedText::Protected(pv)),
        BinaryOrRef::Ref(reference) => {
            set_text(el, None);
            el.set_attribute(ATTR_REF, reference);
        }
        BinaryOrRef::Inline(bytes) => set_bytes(el, Some(&bytes)),
    }
}
