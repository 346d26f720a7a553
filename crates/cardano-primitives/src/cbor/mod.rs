//! Canonical CBOR encoding and decoding.
//!
//! Provides `CborWriter` and `CborReader` for reading/writing the subset of
//! CBOR the ledger's wire format uses, with the determinism rules the fee
//! calculation depends on: minimal-length headers, definite lengths only,
//! and canonical map-key ordering (shorter encoded keys first, then
//! bytewise). Two logically-identical structures always produce identical
//! bytes.

/// CBOR major type for unsigned integers.
const MAJOR_UINT: u8 = 0;
/// CBOR major type for negative integers.
const MAJOR_NINT: u8 = 1;
/// CBOR major type for byte strings.
const MAJOR_BYTES: u8 = 2;
/// CBOR major type for text strings.
const MAJOR_TEXT: u8 = 3;
/// CBOR major type for arrays.
const MAJOR_ARRAY: u8 = 4;
/// CBOR major type for maps.
const MAJOR_MAP: u8 = 5;
/// CBOR major type for tags.
const MAJOR_TAG: u8 = 6;
/// CBOR major type for simple values and floats.
const MAJOR_SIMPLE: u8 = 7;

/// Simple value: false.
const SIMPLE_FALSE: u8 = 0xf4;
/// Simple value: true.
const SIMPLE_TRUE: u8 = 0xf5;
/// Simple value: null.
const SIMPLE_NULL: u8 = 0xf6;

/// Errors produced while encoding or decoding CBOR.
#[derive(Debug, thiserror::Error)]
pub enum CborError {
    #[error("unexpected end of data")]
    UnexpectedEof,

    #[error("expected {expected}, found major type {found}")]
    TypeMismatch { expected: &'static str, found: u8 },

    #[error("indefinite-length items are not canonical")]
    IndefiniteLength,

    #[error("invalid utf-8 in text string")]
    InvalidUtf8,

    #[error("trailing {0} bytes after value")]
    TrailingBytes(usize),

    #[error("{what}: expected {expected} fields, got {got}")]
    WrongFieldCount {
        what: &'static str,
        expected: u64,
        got: u64,
    },

    #[error("expected tag {expected}, got {got}")]
    UnexpectedTag { expected: u64, got: u64 },

    #[error("{what}: unknown discriminant {got}")]
    UnknownDiscriminant { what: &'static str, got: u64 },

    #[error("integer out of range for target type")]
    IntOverflow,

    #[error("length {0} exceeds remaining input")]
    LengthOverflow(u64),
}

// ---------------------------------------------------------------------------
// Writer
// ---------------------------------------------------------------------------

/// An append-only canonical CBOR encoder.
///
/// All headers use the minimal-length encoding and all containers are
/// definite-length, so encoding the same value twice yields identical
/// bytes.
#[derive(Debug, Default)]
pub struct CborWriter {
    buf: Vec<u8>,
}

impl CborWriter {
    /// Create a new empty writer.
    pub fn new() -> Self {
        CborWriter { buf: Vec::new() }
    }

    /// Create a new writer with pre-allocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        CborWriter {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Consume the writer and return the encoded bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Current length of the encoded output in bytes.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether nothing has been written yet.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Write a header with the minimal-length argument encoding.
    fn write_header(&mut self, major: u8, value: u64) {
        let mt = major << 5;
        if value < 24 {
            self.buf.push(mt | value as u8);
        } else if value <= u8::MAX as u64 {
            self.buf.push(mt | 24);
            self.buf.push(value as u8);
        } else if value <= u16::MAX as u64 {
            self.buf.push(mt | 25);
            self.buf.extend_from_slice(&(value as u16).to_be_bytes());
        } else if value <= u32::MAX as u64 {
            self.buf.push(mt | 26);
            self.buf.extend_from_slice(&(value as u32).to_be_bytes());
        } else {
            self.buf.push(mt | 27);
            self.buf.extend_from_slice(&value.to_be_bytes());
        }
    }

    /// Write an unsigned integer.
    pub fn write_uint(&mut self, value: u64) {
        self.write_header(MAJOR_UINT, value);
    }

    /// Write a signed integer (major type 0 or 1 depending on sign).
    pub fn write_int(&mut self, value: i64) {
        if value >= 0 {
            self.write_header(MAJOR_UINT, value as u64);
        } else {
            self.write_header(MAJOR_NINT, !(value as u64));
        }
    }

    /// Write a byte string (header plus raw bytes).
    pub fn write_bytes(&mut self, data: &[u8]) {
        self.write_header(MAJOR_BYTES, data.len() as u64);
        self.buf.extend_from_slice(data);
    }

    /// Write a UTF-8 text string.
    pub fn write_text(&mut self, text: &str) {
        self.write_header(MAJOR_TEXT, text.len() as u64);
        self.buf.extend_from_slice(text.as_bytes());
    }

    /// Write a definite-length array header; the caller writes the
    /// `len` elements afterwards.
    pub fn write_array(&mut self, len: u64) {
        self.write_header(MAJOR_ARRAY, len);
    }

    /// Write a definite-length map header; the caller writes the
    /// `len` key/value pairs afterwards, already in canonical order.
    pub fn write_map(&mut self, len: u64) {
        self.write_header(MAJOR_MAP, len);
    }

    /// Write a map from pre-encoded entries, sorting the keys into
    /// canonical order (encoded length first, then bytewise).
    ///
    /// # Arguments
    /// * `entries` - `(encoded key, encoded value)` pairs in any order.
    pub fn write_map_canonical(&mut self, mut entries: Vec<(Vec<u8>, Vec<u8>)>) {
        entries.sort_by(|(a, _), (b, _)| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));
        self.write_header(MAJOR_MAP, entries.len() as u64);
        for (key, value) in entries {
            self.buf.extend_from_slice(&key);
            self.buf.extend_from_slice(&value);
        }
    }

    /// Write a tag header; the caller writes the tagged value afterwards.
    pub fn write_tag(&mut self, tag: u64) {
        self.write_header(MAJOR_TAG, tag);
    }

    /// Write a boolean.
    pub fn write_bool(&mut self, value: bool) {
        self.buf.push(if value { SIMPLE_TRUE } else { SIMPLE_FALSE });
    }

    /// Write a null.
    pub fn write_null(&mut self) {
        self.buf.push(SIMPLE_NULL);
    }

    /// Splice already-encoded CBOR bytes into the output verbatim.
    pub fn write_raw(&mut self, encoded: &[u8]) {
        self.buf.extend_from_slice(encoded);
    }
}

// ---------------------------------------------------------------------------
// Reader
// ---------------------------------------------------------------------------

/// A cursor-based CBOR decoder over a byte slice.
///
/// Rejects indefinite-length items and surfaces expected-vs-found context
/// on every type mismatch.
#[derive(Debug)]
pub struct CborReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> CborReader<'a> {
    /// Create a reader positioned at the start of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        CborReader { data, pos: 0 }
    }

    /// Number of unread bytes.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Error unless the input has been fully consumed.
    pub fn finish(&self) -> Result<(), CborError> {
        if self.remaining() != 0 {
            return Err(CborError::TrailingBytes(self.remaining()));
        }
        Ok(())
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], CborError> {
        if self.remaining() < n {
            return Err(CborError::UnexpectedEof);
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    /// Peek at the major type of the next item without consuming it.
    pub fn peek_major(&self) -> Result<u8, CborError> {
        if self.remaining() == 0 {
            return Err(CborError::UnexpectedEof);
        }
        Ok(self.data[self.pos] >> 5)
    }

    /// Whether the next item is the null simple value.
    pub fn peek_null(&self) -> bool {
        self.remaining() > 0 && self.data[self.pos] == SIMPLE_NULL
    }

    /// Whether the next item is a tag with the given number.
    pub fn peek_tag(&self, tag: u64) -> bool {
        let mut probe = CborReader {
            data: self.data,
            pos: self.pos,
        };
        match probe.read_header() {
            Ok((MAJOR_TAG, value)) => value == tag,
            _ => false,
        }
    }

    /// Read a header, returning `(major type, argument)`.
    fn read_header(&mut self) -> Result<(u8, u64), CborError> {
        let initial = self.take(1)?[0];
        let major = initial >> 5;
        let info = initial & 0x1f;
        let value = match info {
            0..=23 => info as u64,
            24 => self.take(1)?[0] as u64,
            25 => u16::from_be_bytes(self.take(2)?.try_into().expect("2 bytes")) as u64,
            26 => u32::from_be_bytes(self.take(4)?.try_into().expect("4 bytes")) as u64,
            27 => u64::from_be_bytes(self.take(8)?.try_into().expect("8 bytes")),
            31 => return Err(CborError::IndefiniteLength),
            _ => return Err(CborError::TypeMismatch {
                expected: "well-formed header",
                found: initial,
            }),
        };
        Ok((major, value))
    }

    fn expect(&mut self, major: u8, expected: &'static str) -> Result<u64, CborError> {
        let (found, value) = self.read_header()?;
        if found != major {
            return Err(CborError::TypeMismatch { expected, found });
        }
        Ok(value)
    }

    /// Read an unsigned integer.
    pub fn read_uint(&mut self) -> Result<u64, CborError> {
        self.expect(MAJOR_UINT, "uint")
    }

    /// Read a signed integer (major type 0 or 1).
    pub fn read_int(&mut self) -> Result<i64, CborError> {
        let (major, value) = self.read_header()?;
        match major {
            MAJOR_UINT => i64::try_from(value).map_err(|_| CborError::IntOverflow),
            MAJOR_NINT => {
                if value > i64::MAX as u64 {
                    return Err(CborError::IntOverflow);
                }
                Ok(-1 - value as i64)
            }
            found => Err(CborError::TypeMismatch {
                expected: "int",
                found,
            }),
        }
    }

    /// Read a byte string, returning a slice into the input.
    pub fn read_bytes(&mut self) -> Result<&'a [u8], CborError> {
        let len = self.expect(MAJOR_BYTES, "bytes")?;
        if len > self.remaining() as u64 {
            return Err(CborError::LengthOverflow(len));
        }
        self.take(len as usize)
    }

    /// Read a UTF-8 text string.
    pub fn read_text(&mut self) -> Result<&'a str, CborError> {
        let len = self.expect(MAJOR_TEXT, "text")?;
        if len > self.remaining() as u64 {
            return Err(CborError::LengthOverflow(len));
        }
        std::str::from_utf8(self.take(len as usize)?).map_err(|_| CborError::InvalidUtf8)
    }

    /// Read an array header, returning the element count.
    pub fn read_array(&mut self) -> Result<u64, CborError> {
        self.expect(MAJOR_ARRAY, "array")
    }

    /// Read an array header and require an exact element count.
    ///
    /// # Arguments
    /// * `expected` - The required number of elements.
    /// * `what` - A label for the structure, used in the error.
    pub fn expect_array(&mut self, expected: u64, what: &'static str) -> Result<(), CborError> {
        let got = self.read_array()?;
        if got != expected {
            return Err(CborError::WrongFieldCount {
                what,
                expected,
                got,
            });
        }
        Ok(())
    }

    /// Read a map header, returning the entry count.
    pub fn read_map(&mut self) -> Result<u64, CborError> {
        self.expect(MAJOR_MAP, "map")
    }

    /// Read a tag header, returning the tag number.
    pub fn read_tag(&mut self) -> Result<u64, CborError> {
        self.expect(MAJOR_TAG, "tag")
    }

    /// Read a tag header and require a specific tag number.
    pub fn expect_tag(&mut self, expected: u64) -> Result<(), CborError> {
        let got = self.read_tag()?;
        if got != expected {
            return Err(CborError::UnexpectedTag { expected, got });
        }
        Ok(())
    }

    /// Read a boolean simple value.
    pub fn read_bool(&mut self) -> Result<bool, CborError> {
        let (major, value) = self.read_header()?;
        if major != MAJOR_SIMPLE {
            return Err(CborError::TypeMismatch {
                expected: "bool",
                found: major,
            });
        }
        match (MAJOR_SIMPLE << 5) | value as u8 {
            SIMPLE_TRUE => Ok(true),
            SIMPLE_FALSE => Ok(false),
            found => Err(CborError::TypeMismatch {
                expected: "bool",
                found,
            }),
        }
    }

    /// Read and discard a null simple value.
    pub fn read_null(&mut self) -> Result<(), CborError> {
        if self.remaining() == 0 {
            return Err(CborError::UnexpectedEof);
        }
        let byte = self.data[self.pos];
        if byte != SIMPLE_NULL {
            return Err(CborError::TypeMismatch {
                expected: "null",
                found: byte >> 5,
            });
        }
        self.pos += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_uint(v: u64) -> Vec<u8> {
        let mut w = CborWriter::new();
        w.write_uint(v);
        w.into_bytes()
    }

    // ---- Header encoding (RFC 8949 appendix A vectors) ----

    #[test]
    fn test_uint_minimal_headers() {
        assert_eq!(encode_uint(0), vec![0x00]);
        assert_eq!(encode_uint(23), vec![0x17]);
        assert_eq!(encode_uint(24), vec![0x18, 0x18]);
        assert_eq!(encode_uint(100), vec![0x18, 0x64]);
        assert_eq!(encode_uint(1000), vec![0x19, 0x03, 0xe8]);
        assert_eq!(encode_uint(1000000), vec![0x1a, 0x00, 0x0f, 0x42, 0x40]);
        assert_eq!(
            encode_uint(1000000000000),
            vec![0x1b, 0x00, 0x00, 0x00, 0xe8, 0xd4, 0xa5, 0x10, 0x00]
        );
    }

    #[test]
    fn test_negative_int() {
        let mut w = CborWriter::new();
        w.write_int(-1);
        w.write_int(-10);
        w.write_int(-1000);
        assert_eq!(w.into_bytes(), vec![0x20, 0x29, 0x39, 0x03, 0xe7]);
    }

    #[test]
    fn test_bytes_and_text() {
        let mut w = CborWriter::new();
        w.write_bytes(&[0x01, 0x02, 0x03, 0x04]);
        w.write_text("IETF");
        assert_eq!(
            w.into_bytes(),
            vec![0x44, 0x01, 0x02, 0x03, 0x04, 0x64, 0x49, 0x45, 0x54, 0x46]
        );
    }

    #[test]
    fn test_simple_values() {
        let mut w = CborWriter::new();
        w.write_bool(false);
        w.write_bool(true);
        w.write_null();
        assert_eq!(w.into_bytes(), vec![0xf4, 0xf5, 0xf6]);
    }

    // ---- Canonical map ordering ----

    #[test]
    fn test_canonical_map_sorts_by_length_then_bytes() {
        // Keys "aa", "b", "a": canonical order is "a", "b", "aa".
        let key = |s: &str| {
            let mut w = CborWriter::new();
            w.write_text(s);
            w.into_bytes()
        };
        let val = |v: u64| {
            let mut w = CborWriter::new();
            w.write_uint(v);
            w.into_bytes()
        };

        let mut w = CborWriter::new();
        w.write_map_canonical(vec![
            (key("aa"), val(2)),
            (key("b"), val(1)),
            (key("a"), val(0)),
        ]);
        assert_eq!(
            hex::encode(w.into_bytes()),
            "a361610061620162616102"
        );
    }

    // ---- Reader ----

    #[test]
    fn test_read_roundtrip() {
        let mut w = CborWriter::new();
        w.write_array(3);
        w.write_uint(42);
        w.write_bytes(b"hello");
        w.write_int(-7);
        let bytes = w.into_bytes();

        let mut r = CborReader::new(&bytes);
        r.expect_array(3, "triple").unwrap();
        assert_eq!(r.read_uint().unwrap(), 42);
        assert_eq!(r.read_bytes().unwrap(), b"hello");
        assert_eq!(r.read_int().unwrap(), -7);
        r.finish().unwrap();
    }

    #[test]
    fn test_reject_indefinite_length() {
        // 0x9f is an indefinite-length array header.
        let mut r = CborReader::new(&[0x9f, 0x01, 0xff]);
        assert!(matches!(r.read_array(), Err(CborError::IndefiniteLength)));
    }

    #[test]
    fn test_reject_trailing_bytes() {
        let mut r = CborReader::new(&[0x01, 0x02]);
        r.read_uint().unwrap();
        assert!(matches!(r.finish(), Err(CborError::TrailingBytes(1))));
    }

    #[test]
    fn test_type_mismatch_context() {
        let mut r = CborReader::new(&[0x44, 0x01, 0x02, 0x03, 0x04]);
        let err = r.read_uint().unwrap_err();
        assert!(err.to_string().contains("expected uint"));
    }

    #[test]
    fn test_truncated_bytes() {
        let mut r = CborReader::new(&[0x58, 0x20, 0x01]);
        assert!(matches!(
            r.read_bytes(),
            Err(CborError::LengthOverflow(_)) | Err(CborError::UnexpectedEof)
        ));
    }

    #[test]
    fn test_tag_roundtrip() {
        let mut w = CborWriter::new();
        w.write_tag(30);
        w.write_array(2);
        w.write_uint(1);
        w.write_uint(2);
        let bytes = w.into_bytes();

        let mut r = CborReader::new(&bytes);
        assert!(r.peek_tag(30));
        r.expect_tag(30).unwrap();
        r.expect_array(2, "rational").unwrap();
        assert_eq!(r.read_uint().unwrap(), 1);
        assert_eq!(r.read_uint().unwrap(), 2);
    }

    #[test]
    fn test_peek_null() {
        let mut w = CborWriter::new();
        w.write_null();
        let bytes = w.into_bytes();
        let mut r = CborReader::new(&bytes);
        assert!(r.peek_null());
        r.read_null().unwrap();
        r.finish().unwrap();
    }
}
