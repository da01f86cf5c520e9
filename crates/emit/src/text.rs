//! String and character emission with RFC 4627 escaping
//!
//! Only the mandated set is escaped: `"`, `\`, and the control characters
//! U+0000..U+001F. The common control characters get their two-character
//! shorthand; the rest become `\uXXXX` with uppercase, zero-padded hex.
//! Everything else, including non-ASCII text, is copied through verbatim.
//!
//! Strings are scanned for the first character needing escape; the clean
//! prefix is appended as one bulk copy and only the remainder is walked
//! character by character. Strings with nothing to escape take a single
//! scan and a single copy.

use crate::sink::JsonSink;
use cascade_core::{Error, Result};

const HEX_UPPER: &[u8; 16] = b"0123456789ABCDEF";

/// Whether RFC 4627 requires `c` to be escaped inside a JSON string
#[inline]
fn needs_escape(c: char) -> bool {
    matches!(c, '"' | '\\') || (c as u32) < 0x20
}

/// Emit a quoted, escaped JSON string
pub fn emit_str<S: JsonSink>(sink: &mut S, value: &str) -> Result<()> {
    sink.push_char('"')?;
    match value.find(needs_escape) {
        None => sink.push_str(value)?,
        Some(idx) => {
            sink.push_str(&value[..idx])?;
            for c in value[idx..].chars() {
                emit_escaped(sink, c)?;
            }
        }
    }
    sink.push_char('"')
}

/// Emit a single character as a quoted JSON string
pub fn emit_char<S: JsonSink>(sink: &mut S, value: char) -> Result<()> {
    sink.push_char('"')?;
    emit_escaped(sink, value)?;
    sink.push_char('"')
}

/// Emit a JSON object key
///
/// A null key is a programmer error and fails immediately with
/// [`Error::NullKey`]; it is never silently skipped.
pub fn emit_object_key<S: JsonSink>(sink: &mut S, key: Option<&str>) -> Result<()> {
    match key {
        Some(k) => emit_str(sink, k),
        None => Err(Error::NullKey),
    }
}

/// Emit one character, escaped if RFC 4627 requires it
fn emit_escaped<S: JsonSink>(sink: &mut S, c: char) -> Result<()> {
    match c {
        '"' => sink.push_str("\\\""),
        '\\' => sink.push_str("\\\\"),
        '\u{0008}' => sink.push_str("\\b"),
        '\u{000C}' => sink.push_str("\\f"),
        '\n' => sink.push_str("\\n"),
        '\r' => sink.push_str("\\r"),
        '\t' => sink.push_str("\\t"),
        c if (c as u32) < 0x20 => {
            let n = c as u32;
            sink.push_ascii(&[
                b'\\',
                b'u',
                b'0',
                b'0',
                HEX_UPPER[(n >> 4) as usize],
                HEX_UPPER[(n & 0xF) as usize],
            ])
        }
        c => sink.push_char(c),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::StringSink;

    fn emit(value: &str) -> String {
        let mut out = String::new();
        emit_str(&mut StringSink::new(&mut out), value).unwrap();
        out
    }

    #[test]
    fn test_clean_string_copied_verbatim() {
        assert_eq!(emit("hello world"), "\"hello world\"");
        assert_eq!(emit(""), "\"\"");
        // Non-ASCII needs no escaping.
        assert_eq!(emit("caf\u{00e9} \u{2603}"), "\"caf\u{00e9} \u{2603}\"");
    }

    #[test]
    fn test_mandated_escapes() {
        assert_eq!(emit("a\"b"), "\"a\\\"b\"");
        assert_eq!(emit("a\\b"), "\"a\\\\b\"");
        assert_eq!(emit("a\nb\tc\rd"), "\"a\\nb\\tc\\rd\"");
        assert_eq!(emit("\u{0008}\u{000C}"), "\"\\b\\f\"");
    }

    #[test]
    fn test_control_chars_use_uppercase_hex() {
        assert_eq!(emit("\u{0000}"), "\"\\u0000\"");
        assert_eq!(emit("\u{001F}"), "\"\\u001F\"");
        assert_eq!(emit("\u{000B}"), "\"\\u000B\"");
    }

    #[test]
    fn test_prefix_bulk_copy_then_escapes() {
        assert_eq!(emit("prefix\nsuffix\"end"), "\"prefix\\nsuffix\\\"end\"");
    }

    #[test]
    fn test_char_emission() {
        let mut out = String::new();
        emit_char(&mut StringSink::new(&mut out), '\n').unwrap();
        assert_eq!(out, "\"\\n\"");

        out.clear();
        emit_char(&mut StringSink::new(&mut out), 'x').unwrap();
        assert_eq!(out, "\"x\"");
    }

    #[test]
    fn test_null_object_key_fails() {
        let mut out = String::new();
        let err = emit_object_key(&mut StringSink::new(&mut out), None);
        assert!(matches!(err, Err(Error::NullKey)));
        assert!(out.is_empty());

        emit_object_key(&mut StringSink::new(&mut out), Some("k")).unwrap();
        assert_eq!(out, "\"k\"");
    }
}
