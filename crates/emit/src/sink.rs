//! Output sinks for JSON emission
//!
//! The emitter writes to exactly two sink kinds: an in-memory string
//! buffer and a streaming byte writer. [`JsonSink`] abstracts the two so
//! the scalar routines are written once. String-buffer appends cannot
//! fail; writer appends surface `io::Error` through the crate `Result`.

use cascade_core::Result;
use std::io::Write;

/// Destination for emitted JSON text
pub trait JsonSink {
    /// Append a single character
    fn push_char(&mut self, c: char) -> Result<()>;

    /// Append a string slice
    fn push_str(&mut self, s: &str) -> Result<()>;

    /// Append a block of ASCII bytes (digit runs, escape sequences)
    ///
    /// Callers guarantee `bytes` is ASCII; this lets both sink kinds
    /// append the block without a per-character loop.
    fn push_ascii(&mut self, bytes: &[u8]) -> Result<()>;
}

/// Sink backed by a growable `String`
pub struct StringSink<'a> {
    buf: &'a mut String,
}

impl<'a> StringSink<'a> {
    /// Wrap an existing buffer; emitted text is appended to it
    pub fn new(buf: &'a mut String) -> Self {
        StringSink { buf }
    }
}

impl JsonSink for StringSink<'_> {
    #[inline]
    fn push_char(&mut self, c: char) -> Result<()> {
        self.buf.push(c);
        Ok(())
    }

    #[inline]
    fn push_str(&mut self, s: &str) -> Result<()> {
        self.buf.push_str(s);
        Ok(())
    }

    #[inline]
    fn push_ascii(&mut self, bytes: &[u8]) -> Result<()> {
        debug_assert!(bytes.is_ascii());
        match std::str::from_utf8(bytes) {
            Ok(s) => self.buf.push_str(s),
            // Unreachable for ASCII input; keep a safe fallback.
            Err(_) => bytes.iter().for_each(|&b| self.buf.push(b as char)),
        }
        Ok(())
    }
}

/// Sink backed by a streaming `io::Write`
pub struct WriterSink<'a> {
    inner: &'a mut dyn Write,
}

impl<'a> WriterSink<'a> {
    /// Wrap a streaming writer; emitted text is written as UTF-8 bytes
    pub fn new(inner: &'a mut dyn Write) -> Self {
        WriterSink { inner }
    }
}

impl JsonSink for WriterSink<'_> {
    #[inline]
    fn push_char(&mut self, c: char) -> Result<()> {
        let mut buf = [0u8; 4];
        self.inner.write_all(c.encode_utf8(&mut buf).as_bytes())?;
        Ok(())
    }

    #[inline]
    fn push_str(&mut self, s: &str) -> Result<()> {
        self.inner.write_all(s.as_bytes())?;
        Ok(())
    }

    #[inline]
    fn push_ascii(&mut self, bytes: &[u8]) -> Result<()> {
        debug_assert!(bytes.is_ascii());
        self.inner.write_all(bytes)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_sink_appends() {
        let mut out = String::from("x");
        let mut sink = StringSink::new(&mut out);
        sink.push_char('y').unwrap();
        sink.push_str("z").unwrap();
        sink.push_ascii(b"123").unwrap();
        assert_eq!(out, "xyz123");
    }

    #[test]
    fn test_writer_sink_appends_utf8() {
        let mut out: Vec<u8> = Vec::new();
        {
            let mut sink = WriterSink::new(&mut out);
            sink.push_str("a\u{00e9}").unwrap();
            sink.push_char('\u{2603}').unwrap();
            sink.push_ascii(b"!").unwrap();
        }
        assert_eq!(out, "a\u{00e9}\u{2603}!".as_bytes());
    }
}
