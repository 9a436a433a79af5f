//! Byte codec utilities.
//!
//! Conversions between hex strings, byte sequences, UTF-8 text, and
//! fixed-width little-endian integers, plus the `AplReader` / `AplWriter`
//! cursor types used to lay out and parse transaction bytes.

use crate::PrimitivesError;

// ---------------------------------------------------------------------------
// Hex and text
// ---------------------------------------------------------------------------

/// Decode a hex string into bytes.
///
/// Upper- and lower-case digits are accepted. When the input has an odd
/// number of characters the first character is decoded as a byte of its
/// own (`"abc"` becomes `[0x0a, 0xbc]`); existing Apollo tooling produces
/// such strings and relies on this behaviour.
///
/// # Arguments
/// * `hex_str` - Hex digits without a `0x` prefix.
///
/// # Returns
/// The decoded bytes, or `InvalidHex` if a character is not a hex digit.
pub fn hex_to_bytes(hex_str: &str) -> Result<Vec<u8>, PrimitivesError> {
    if hex_str.len() % 2 == 0 {
        return Ok(hex::decode(hex_str)?);
    }
    let mut chars = hex_str.chars();
    let first = chars.next().map(nibble).transpose()?.unwrap_or(0);
    let rest = hex::decode(chars.as_str())?;

    let mut out = Vec::with_capacity(rest.len() + 1);
    out.push(first);
    out.extend_from_slice(&rest);
    Ok(out)
}

fn nibble(c: char) -> Result<u8, PrimitivesError> {
    c.to_digit(16)
        .map(|d| d as u8)
        .ok_or_else(|| PrimitivesError::InvalidHex(format!("invalid character {:?}", c)))
}

/// Encode bytes as a lowercase hex string without prefix.
pub fn bytes_to_hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

/// UTF-8 encode a string.
pub fn string_to_bytes(s: &str) -> Vec<u8> {
    s.as_bytes().to_vec()
}

/// Decode UTF-8 bytes into a string.
///
/// # Returns
/// The decoded string, or `InvalidUtf8` for malformed sequences.
pub fn bytes_to_string(bytes: &[u8]) -> Result<String, PrimitivesError> {
    Ok(String::from_utf8(bytes.to_vec())?)
}

// ---------------------------------------------------------------------------
// Fixed-width integers
// ---------------------------------------------------------------------------

/// Encode an unsigned integer as `width` little-endian bytes.
///
/// # Arguments
/// * `value` - The integer to encode.
/// * `width` - Output width in bytes: 1, 2, 4 or 8.
///
/// # Returns
/// The encoded bytes, `ValueOutOfRange` if the value does not fit, or
/// `UnsupportedWidth` for any other width.
pub fn int_to_le_bytes(value: u64, width: usize) -> Result<Vec<u8>, PrimitivesError> {
    if !matches!(width, 1 | 2 | 4 | 8) {
        return Err(PrimitivesError::UnsupportedWidth(width));
    }
    if width < 8 && value >> (width * 8) != 0 {
        return Err(PrimitivesError::ValueOutOfRange { value, width });
    }
    Ok(value.to_le_bytes()[..width].to_vec())
}

/// Decode a 1, 2, 4 or 8 byte little-endian unsigned integer.
pub fn le_bytes_to_int(bytes: &[u8]) -> Result<u64, PrimitivesError> {
    if !matches!(bytes.len(), 1 | 2 | 4 | 8) {
        return Err(PrimitivesError::UnsupportedWidth(bytes.len()));
    }
    let mut buf = [0u8; 8];
    buf[..bytes.len()].copy_from_slice(bytes);
    Ok(u64::from_le_bytes(buf))
}

/// Constant-time comparison of two byte slices.
///
/// Returns `false` immediately on a length mismatch; equal-length inputs
/// are compared without early exit.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

// ---------------------------------------------------------------------------
// AplReader
// ---------------------------------------------------------------------------

/// A cursor-based reader over transaction bytes.
///
/// Wraps a byte slice and maintains a read position, providing methods
/// to read fixed-size little-endian integers and byte runs.
pub struct AplReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> AplReader<'a> {
    /// Create a new reader positioned at the start of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        AplReader { data, pos: 0 }
    }

    /// Read `n` bytes and advance the position.
    ///
    /// # Arguments
    /// * `n` - Number of bytes to read.
    ///
    /// # Returns
    /// A byte slice of length `n`, or `UnexpectedEof` if insufficient data remains.
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], PrimitivesError> {
        if n > self.remaining() {
            return Err(PrimitivesError::UnexpectedEof);
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    /// Read exactly `N` bytes into a fixed-size array.
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], PrimitivesError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8, PrimitivesError> {
        Ok(self.read_bytes(1)?[0])
    }

    pub fn read_u16_le(&mut self) -> Result<u16, PrimitivesError> {
        Ok(u16::from_le_bytes(self.read_array()?))
    }

    pub fn read_u32_le(&mut self) -> Result<u32, PrimitivesError> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    pub fn read_u64_le(&mut self) -> Result<u64, PrimitivesError> {
        Ok(u64::from_le_bytes(self.read_array()?))
    }

    /// Check whether the unread bytes start with `prefix`, without consuming.
    pub fn peek_matches(&self, prefix: &[u8]) -> bool {
        self.data[self.pos..].starts_with(prefix)
    }

    /// Current byte offset from the start of the data.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Return the number of unread bytes.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }
}

// ---------------------------------------------------------------------------
// AplWriter
// ---------------------------------------------------------------------------

/// A buffer-based writer for transaction bytes.
///
/// Appends fixed-size integers in little-endian order. Call
/// [`AplWriter::into_bytes`] to freeze the layout once all fields are written.
pub struct AplWriter {
    buf: Vec<u8>,
}

impl AplWriter {
    pub fn new() -> Self {
        AplWriter { buf: Vec::new() }
    }

    /// Create a new writer with a pre-allocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        AplWriter { buf: Vec::with_capacity(capacity) }
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn write_u8(&mut self, val: u8) {
        self.buf.push(val);
    }

    pub fn write_u16_le(&mut self, val: u16) {
        self.buf.extend_from_slice(&val.to_le_bytes());
    }

    pub fn write_u32_le(&mut self, val: u32) {
        self.buf.extend_from_slice(&val.to_le_bytes());
    }

    pub fn write_u64_le(&mut self, val: u64) {
        self.buf.extend_from_slice(&val.to_le_bytes());
    }

    /// Append `n` zero bytes (used for reserved and placeholder fields).
    pub fn write_zeros(&mut self, n: usize) {
        self.buf.resize(self.buf.len() + n, 0);
    }

    /// Consume the writer and return the accumulated bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

impl Default for AplWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -- hex --

    #[test]
    fn test_hex_to_bytes_even() {
        assert_eq!(hex_to_bytes("00ff10").unwrap(), vec![0x00, 0xff, 0x10]);
        assert_eq!(hex_to_bytes("ABcd").unwrap(), vec![0xab, 0xcd]);
        assert_eq!(hex_to_bytes("").unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_hex_to_bytes_odd_length_leading_nibble() {
        assert_eq!(hex_to_bytes("abc").unwrap(), vec![0x0a, 0xbc]);
        assert_eq!(hex_to_bytes("f").unwrap(), vec![0x0f]);
    }

    #[test]
    fn test_hex_to_bytes_invalid() {
        assert!(matches!(hex_to_bytes("zz"), Err(PrimitivesError::InvalidHex(_))));
        assert!(matches!(hex_to_bytes("g12"), Err(PrimitivesError::InvalidHex(_))));
        assert!(matches!(hex_to_bytes("1g2"), Err(PrimitivesError::InvalidHex(_))));
    }

    #[test]
    fn test_bytes_to_hex_lowercase() {
        assert_eq!(bytes_to_hex(&[0xde, 0xad, 0xBE, 0xEF]), "deadbeef");
        let hex = "0a1b2c3d4e5f";
        assert_eq!(bytes_to_hex(&hex_to_bytes(hex).unwrap()), hex);
    }

    #[test]
    fn test_utf8_conversions() {
        let bytes = string_to_bytes("Apollo ✓");
        assert_eq!(bytes_to_string(&bytes).unwrap(), "Apollo ✓");
        assert!(matches!(
            bytes_to_string(&[0xff, 0xfe]),
            Err(PrimitivesError::InvalidUtf8(_))
        ));
    }

    // -- fixed-width integers --

    #[test]
    fn test_int_to_le_bytes_widths() {
        assert_eq!(int_to_le_bytes(0x7f, 1).unwrap(), vec![0x7f]);
        assert_eq!(int_to_le_bytes(1440, 2).unwrap(), vec![0xa0, 0x05]);
        assert_eq!(int_to_le_bytes(0x80000005, 4).unwrap(), vec![0x05, 0x00, 0x00, 0x80]);
        assert_eq!(
            int_to_le_bytes(0x0102030405060708, 8).unwrap(),
            vec![0x08, 0x07, 0x06, 0x05, 0x04, 0x03, 0x02, 0x01]
        );
    }

    #[test]
    fn test_int_to_le_bytes_rejects_overflow() {
        assert!(matches!(
            int_to_le_bytes(256, 1),
            Err(PrimitivesError::ValueOutOfRange { value: 256, width: 1 })
        ));
        assert!(int_to_le_bytes(u32::MAX as u64 + 1, 4).is_err());
        assert!(matches!(int_to_le_bytes(1, 3), Err(PrimitivesError::UnsupportedWidth(3))));
    }

    #[test]
    fn test_le_bytes_to_int() {
        assert_eq!(le_bytes_to_int(&[0xa0, 0x05]).unwrap(), 1440);
        assert_eq!(le_bytes_to_int(&u64::MAX.to_le_bytes()).unwrap(), u64::MAX);
        assert!(le_bytes_to_int(&[1, 2, 3]).is_err());
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"ab"));
    }

    // -- AplReader / AplWriter --

    #[test]
    fn test_reader_writer_roundtrip() {
        let mut writer = AplWriter::new();
        writer.write_u8(0x42);
        writer.write_u16_le(0x1234);
        writer.write_u32_le(0xDEADBEEF);
        writer.write_u64_le(0x0102030405060708);
        writer.write_zeros(3);
        writer.write_bytes(b"hello");

        let data = writer.into_bytes();
        let mut reader = AplReader::new(&data);

        assert_eq!(reader.read_u8().unwrap(), 0x42);
        assert_eq!(reader.read_u16_le().unwrap(), 0x1234);
        assert_eq!(reader.read_u32_le().unwrap(), 0xDEADBEEF);
        assert_eq!(reader.read_u64_le().unwrap(), 0x0102030405060708);
        assert_eq!(reader.read_array::<3>().unwrap(), [0, 0, 0]);
        assert!(reader.peek_matches(b"hel"));
        assert_eq!(reader.position(), 18);
        assert_eq!(reader.read_bytes(5).unwrap(), b"hello");
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn test_reader_eof() {
        let mut reader = AplReader::new(&[0x01, 0x02, 0x03]);
        assert!(matches!(reader.read_u32_le(), Err(PrimitivesError::UnexpectedEof)));
        assert_eq!(reader.position(), 0);
        assert_eq!(reader.read_u16_le().unwrap(), 0x0201);
        assert!(reader.read_u16_le().is_err());
    }
}
