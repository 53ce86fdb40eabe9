//! Fixed-width integer and length-prefixed text codec.
//!
//! All integers are big-endian. Text and byte blobs are written as a 4-byte
//! signed length followed by the raw bytes; a length of `-1` denotes null.
//!
//! ```text
//! +----------+------------------+
//! | length   | bytes            |
//! | 4 bytes  | length bytes     |
//! +----------+------------------+
//! ```

use crate::error::DecodeError;
use bytes::{BufMut, Bytes, BytesMut};

/// Size of the length prefix in front of text and byte blobs.
pub const LEN_PREFIX_SIZE: usize = 4;

/// Length value marking a null text or blob.
pub const NULL_LENGTH: i32 = -1;

/// Returns the number of bytes `text` occupies after its length prefix.
///
/// Used to precompute request lengths without encoding the text first.
pub fn text_len(text: &str) -> usize {
    text.len()
}

/// Returns the full encoded size of `text` including its length prefix.
pub fn encoded_text_len(text: &str) -> usize {
    LEN_PREFIX_SIZE + text_len(text)
}

/// Appends wire values to a growable buffer.
#[derive(Debug, Default)]
pub struct WireWriter {
    buf: BytesMut,
}

impl WireWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
        }
    }

    pub fn put_u8(&mut self, value: u8) -> &mut Self {
        self.buf.put_u8(value);
        self
    }

    pub fn put_i8(&mut self, value: i8) -> &mut Self {
        self.buf.put_i8(value);
        self
    }

    pub fn put_bool(&mut self, value: bool) -> &mut Self {
        self.put_u8(value as u8)
    }

    pub fn put_i16(&mut self, value: i16) -> &mut Self {
        self.buf.put_i16(value);
        self
    }

    pub fn put_i32(&mut self, value: i32) -> &mut Self {
        self.buf.put_i32(value);
        self
    }

    pub fn put_i64(&mut self, value: i64) -> &mut Self {
        self.buf.put_i64(value);
        self
    }

    /// Writes a length-prefixed UTF-8 string.
    pub fn put_string(&mut self, value: &str) -> &mut Self {
        self.put_bytes(value.as_bytes())
    }

    /// Writes a length-prefixed string, or the null length for `None`.
    pub fn put_opt_string(&mut self, value: Option<&str>) -> &mut Self {
        match value {
            Some(text) => self.put_string(text),
            None => self.put_i32(NULL_LENGTH),
        }
    }

    /// Writes a length-prefixed byte blob.
    pub fn put_bytes(&mut self, value: &[u8]) -> &mut Self {
        self.buf.put_i32(value.len() as i32);
        self.buf.put_slice(value);
        self
    }

    /// Writes raw bytes without a length prefix.
    pub fn put_raw(&mut self, value: &[u8]) -> &mut Self {
        self.buf.put_slice(value);
        self
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn into_inner(self) -> BytesMut {
        self.buf
    }

    pub fn freeze(self) -> Bytes {
        self.buf.freeze()
    }
}

/// Reads wire values from a borrowed buffer, advancing an owned cursor.
///
/// The cursor is shared by every decode step of one response: a miscounted
/// read shifts all subsequent reads, so every method either consumes exactly
/// the bytes it describes or fails without advancing.
#[derive(Debug, Clone)]
pub struct WireReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> WireReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Creates a reader starting at `pos`.
    pub fn at(buf: &'a [u8], pos: usize) -> Self {
        Self { buf, pos }
    }

    /// Current cursor offset from the start of the buffer.
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.pos)
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }

    fn take(&mut self, needed: usize) -> Result<&'a [u8], DecodeError> {
        let remaining = self.remaining();
        if remaining < needed {
            return Err(DecodeError::Truncated {
                offset: self.pos,
                needed,
                remaining,
            });
        }
        let slice = &self.buf[self.pos..self.pos + needed];
        self.pos += needed;
        Ok(slice)
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let slice = self.take(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(slice);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.take_array::<1>()?[0])
    }

    pub fn read_i8(&mut self) -> Result<i8, DecodeError> {
        Ok(i8::from_be_bytes(self.take_array()?))
    }

    pub fn read_bool(&mut self) -> Result<bool, DecodeError> {
        Ok(self.read_u8()? != 0)
    }

    pub fn read_i16(&mut self) -> Result<i16, DecodeError> {
        Ok(i16::from_be_bytes(self.take_array()?))
    }

    pub fn read_i32(&mut self) -> Result<i32, DecodeError> {
        Ok(i32::from_be_bytes(self.take_array()?))
    }

    pub fn read_i64(&mut self) -> Result<i64, DecodeError> {
        Ok(i64::from_be_bytes(self.take_array()?))
    }

    /// Reads a 32-bit element count. Negative counts are rejected.
    pub fn read_count(&mut self) -> Result<usize, DecodeError> {
        let start = self.pos;
        let count = self.read_i32()?;
        if count < 0 {
            self.pos = start;
            return Err(DecodeError::NegativeLength {
                offset: start,
                length: count,
            });
        }
        Ok(count as usize)
    }

    /// Reads `len` raw bytes with no length prefix.
    pub fn read_raw(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        self.take(len)
    }

    /// Reads a length-prefixed byte blob; the null length yields `None`.
    pub fn read_opt_bytes(&mut self) -> Result<Option<&'a [u8]>, DecodeError> {
        let start = self.pos;
        let length = self.read_i32()?;
        if length == NULL_LENGTH {
            return Ok(None);
        }
        if length < 0 {
            self.pos = start;
            return Err(DecodeError::NegativeLength {
                offset: start,
                length,
            });
        }
        match self.take(length as usize) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) => {
                self.pos = start;
                Err(e)
            }
        }
    }

    /// Reads a length-prefixed byte blob; null is read as empty.
    pub fn read_bytes(&mut self) -> Result<&'a [u8], DecodeError> {
        Ok(self.read_opt_bytes()?.unwrap_or(&[]))
    }

    /// Reads a length-prefixed UTF-8 string; the null length yields `None`.
    pub fn read_opt_string(&mut self) -> Result<Option<String>, DecodeError> {
        let start = self.pos;
        match self.read_opt_bytes()? {
            Some(bytes) => match std::str::from_utf8(bytes) {
                Ok(text) => Ok(Some(text.to_string())),
                Err(_) => {
                    self.pos = start;
                    Err(DecodeError::InvalidUtf8 { offset: start })
                }
            },
            None => Ok(None),
        }
    }

    /// Reads a length-prefixed UTF-8 string; null is read as empty.
    pub fn read_string(&mut self) -> Result<String, DecodeError> {
        Ok(self.read_opt_string()?.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_integers_are_big_endian() {
        let mut w = WireWriter::new();
        w.put_i16(0x0102).put_i32(0x0304_0506).put_i64(-2);
        let bytes = w.freeze();

        assert_eq!(&bytes[0..2], &[0x01, 0x02]);
        assert_eq!(&bytes[2..6], &[0x03, 0x04, 0x05, 0x06]);
        assert_eq!(&bytes[6..14], &[0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xfe]);
    }

    #[test]
    fn test_string_layout() {
        let mut w = WireWriter::new();
        w.put_string("héllo");
        let bytes = w.freeze();

        assert_eq!(&bytes[0..4], &6i32.to_be_bytes());
        assert_eq!(&bytes[4..], "héllo".as_bytes());
        assert_eq!(text_len("héllo"), 6);
        assert_eq!(encoded_text_len("héllo"), bytes.len());
    }

    #[test]
    fn test_truncated_read_does_not_advance() {
        let data = [0x00, 0x01, 0x02];
        let mut r = WireReader::new(&data);
        let err = r.read_i32().unwrap_err();
        assert_eq!(
            err,
            DecodeError::Truncated {
                offset: 0,
                needed: 4,
                remaining: 3
            }
        );
        assert_eq!(r.position(), 0);
        assert_eq!(r.read_i16().unwrap(), 1);
        assert_eq!(r.position(), 2);
    }

    #[test]
    fn test_truncated_string_body_rewinds() {
        let mut w = WireWriter::new();
        w.put_i32(10).put_raw(b"abc");
        let bytes = w.freeze();

        let mut r = WireReader::new(&bytes);
        assert!(matches!(
            r.read_string(),
            Err(DecodeError::Truncated { needed: 10, .. })
        ));
        assert_eq!(r.position(), 0);
    }

    #[test]
    fn test_null_string() {
        let mut w = WireWriter::new();
        w.put_opt_string(None).put_opt_string(Some("x"));
        let bytes = w.freeze();

        let mut r = WireReader::new(&bytes);
        assert_eq!(r.read_opt_string().unwrap(), None);
        assert_eq!(r.read_opt_string().unwrap(), Some("x".to_string()));
        assert!(r.is_exhausted());
    }

    #[test]
    fn test_negative_count_rejected() {
        let mut w = WireWriter::new();
        w.put_i32(-5).put_i32(3);
        let bytes = w.freeze();

        let mut r = WireReader::new(&bytes);
        assert_eq!(
            r.read_count().unwrap_err(),
            DecodeError::NegativeLength {
                offset: 0,
                length: -5
            }
        );
        assert_eq!(r.position(), 0);
        r.read_i32().unwrap();
        assert_eq!(r.read_count().unwrap(), 3);
    }

    #[test]
    fn test_negative_length_rejected() {
        let mut w = WireWriter::new();
        w.put_i32(-7);
        let bytes = w.freeze();

        let mut r = WireReader::new(&bytes);
        assert_eq!(
            r.read_bytes().unwrap_err(),
            DecodeError::NegativeLength {
                offset: 0,
                length: -7
            }
        );
    }

    #[test]
    fn test_invalid_utf8() {
        let mut w = WireWriter::new();
        w.put_bytes(&[0xff, 0xfe]);
        let bytes = w.freeze();

        let mut r = WireReader::new(&bytes);
        assert_eq!(
            r.read_string().unwrap_err(),
            DecodeError::InvalidUtf8 { offset: 0 }
        );
    }

    #[test]
    fn test_reader_at_offset() {
        let data = [0xaa, 0xbb, 0x00, 0x05];
        let mut r = WireReader::at(&data, 2);
        assert_eq!(r.read_i16().unwrap(), 5);
        assert!(r.is_exhausted());
    }

    proptest! {
        #[test]
        fn prop_scalar_roundtrip(a in any::<i8>(), b in any::<i16>(), c in any::<i32>(), d in any::<i64>(), flag in any::<bool>()) {
            let mut w = WireWriter::new();
            w.put_i8(a).put_i16(b).put_i32(c).put_i64(d).put_bool(flag);
            let bytes = w.freeze();

            let mut r = WireReader::new(&bytes);
            prop_assert_eq!(r.read_i8().unwrap(), a);
            prop_assert_eq!(r.read_i16().unwrap(), b);
            prop_assert_eq!(r.read_i32().unwrap(), c);
            prop_assert_eq!(r.read_i64().unwrap(), d);
            prop_assert_eq!(r.read_bool().unwrap(), flag);
            prop_assert!(r.is_exhausted());
        }

        #[test]
        fn prop_text_roundtrip(text in ".*") {
            let mut w = WireWriter::new();
            w.put_string(&text);
            prop_assert_eq!(w.len(), encoded_text_len(&text));

            let bytes = w.freeze();
            let mut r = WireReader::new(&bytes);
            prop_assert_eq!(r.read_string().unwrap(), text);
            prop_assert!(r.is_exhausted());
        }
    }
}
