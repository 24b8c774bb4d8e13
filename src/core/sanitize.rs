// src/core/sanitize.rs
//! Deterministic text repair for values scraped off the portal.
//!
//! The portal serves a mix of HTML entities, double-decoded UTF-8
//! (`Ã©` for `é`, `â€™` for `’`) and stray control characters. [`normalize`]
//! undoes all of it and is idempotent: feeding its output back in returns the
//! same string.

use std::borrow::Cow;

use encoding_rs::{Encoding, ISO_8859_15, WINDOWS_1252};
use serde_json::Value;

// Every changing pass strictly lowers the char count or only moves
// whitespace towards ' ', so the fixed point is reached long before this.
const MAX_PASSES: usize = 64;

/// Legacy 8-bit encodings tried, in order, when repairing mojibake.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Legacy {
    Windows1252,
    Latin1,
    Latin9,
}

pub const LEGACY_ORDER: [Legacy; 3] = [Legacy::Windows1252, Legacy::Latin1, Legacy::Latin9];

impl Legacy {
    /// Re-encode `s` into this charset. `None` if any char is unmappable.
    fn encode(self, s: &str) -> Option<Vec<u8>> {
        match self {
            // encoding_rs aliases the latin1 label to windows-1252, so the
            // real ISO-8859-1 mapping (code point == byte) is done by hand.
            Legacy::Latin1 => s.chars().map(|c| u8::try_from(u32::from(c)).ok()).collect(),
            Legacy::Windows1252 => encode_with(WINDOWS_1252, s),
            Legacy::Latin9 => encode_with(ISO_8859_15, s),
        }
    }
}

fn encode_with(encoding: &'static Encoding, s: &str) -> Option<Vec<u8>> {
    let (bytes, _, unmappable) = encoding.encode(s);
    if unmappable {
        None
    } else {
        Some(bytes.into_owned())
    }
}

/// Full repair: entities, mojibake, control chars, whitespace.
pub fn normalize(text: &str) -> String {
    let mut current = normalize_pass(text);
    for _ in 1..MAX_PASSES {
        let next = normalize_pass(&current);
        if next == current {
            break;
        }
        current = next;
    }
    current
}

fn normalize_pass(text: &str) -> String {
    let decoded = decode_entities(text);
    let repaired = repair_mojibake(&decoded);
    normalize_ws(&strip_controls(&repaired))
}

/// Decode named and numeric HTML character references.
pub fn decode_entities(s: &str) -> Cow<'_, str> {
    if !s.contains('&') {
        return Cow::Borrowed(s);
    }
    html_escape::decode_html_entities(s)
}

/// Undo UTF-8 text that was decoded through a legacy charset upstream.
///
/// For each encoding in [`LEGACY_ORDER`], the text is re-encoded to bytes and
/// those bytes are read back as UTF-8. The first encoding that yields valid
/// UTF-8 wins. Repeats until nothing applies, which also undoes double
/// mojibake (`ÃƒÂ©` → `Ã©` → `é`). Text that no encoding repairs is kept.
pub fn repair_mojibake(s: &str) -> Cow<'_, str> {
    let mut current = Cow::Borrowed(s);
    while let Some(fixed) = repair_once(&current) {
        current = Cow::Owned(fixed);
    }
    current
}

fn repair_once(s: &str) -> Option<String> {
    if s.is_ascii() {
        return None;
    }
    LEGACY_ORDER.iter().find_map(|legacy| {
        let bytes = legacy.encode(s)?;
        let decoded = String::from_utf8(bytes).ok()?;
        (decoded != s).then_some(decoded)
    })
}

/// Remove C0/C1 control characters and DEL. Whitespace controls become a
/// plain space so words on either side of a line break stay apart.
pub fn strip_controls(s: &str) -> String {
    s.chars()
        .filter_map(|c| match c {
            '\t' | '\n' | '\r' | '\u{0B}' | '\u{0C}' => Some(' '),
            c if c.is_control() => None,
            c => Some(c),
        })
        .collect()
}

/// Collapse sequences of whitespace into a single space and trim.
pub fn normalize_ws(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_space = false;
    for ch in s.chars() {
        if ch.is_whitespace() {
            if !prev_space {
                out.push(' ');
                prev_space = true;
            }
        } else {
            out.push(ch);
            prev_space = false;
        }
    }
    out.trim().to_string()
}

/// Apply [`normalize`] to every string inside a JSON value.
/// Object keys, numbers, booleans and nulls are left alone.
pub fn normalize_value(value: Value) -> Value {
    match value {
        Value::String(s) => Value::String(normalize(&s)),
        Value::Array(items) => Value::Array(items.into_iter().map(normalize_value).collect()),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, v)| (key, normalize_value(v)))
                .collect(),
        ),
        other => other,
    }
}

/// Case- and apostrophe-insensitive form used when matching page labels.
pub fn fold(s: &str) -> String {
    normalize(s).replace('\u{2019}', "'").to_lowercase()
}
