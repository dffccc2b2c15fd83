//! Binary reader for parsing byte slices.
//!
//! This module provides [`BinaryReader`], a cursor-like type that reads
//! little-endian binary data from a byte slice without copying.

use crate::{Error, Result, MAX_VARINT_BYTES};

/// A binary reader over a byte slice.
///
/// Maintains a monotonically advancing position; all multi-byte reads are
/// little-endian, matching the XNB container format.
///
/// # Example
///
/// ```
/// use xnbkit_common::BinaryReader;
///
/// let data = [0x2A, 0x00, 0x00, 0x00, 0x01];
/// let mut reader = BinaryReader::new(&data);
///
/// assert_eq!(reader.read_i32().unwrap(), 42);
/// assert!(reader.read_bool().unwrap());
/// assert!(reader.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct BinaryReader<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> BinaryReader<'a> {
    /// Create a new reader from a byte slice.
    #[inline]
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    /// Get the current position in the buffer.
    #[inline]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Get the total length of the underlying buffer.
    #[inline]
    pub const fn len(&self) -> usize {
        self.data.len()
    }

    /// Get the number of bytes remaining to read.
    #[inline]
    pub const fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }

    /// Check if there are no more bytes to read.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.position >= self.data.len()
    }

    /// Get the remaining bytes as a slice.
    #[inline]
    pub fn remaining_bytes(&self) -> &'a [u8] {
        &self.data[self.position.min(self.data.len())..]
    }

    /// Peek at bytes without advancing the position.
    #[inline]
    pub fn peek_bytes(&self, count: usize) -> Result<&'a [u8]> {
        if self.remaining() < count {
            return Err(Error::UnexpectedEof {
                needed: count,
                available: self.remaining(),
            });
        }
        Ok(&self.data[self.position..self.position + count])
    }

    /// Read bytes and advance the position.
    #[inline]
    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8]> {
        let bytes = self.peek_bytes(count)?;
        self.position += count;
        Ok(bytes)
    }

    /// Read a single byte.
    #[inline]
    pub fn read_u8(&mut self) -> Result<u8> {
        self.read_bytes(1).map(|b| b[0])
    }

    /// Read a signed byte.
    #[inline]
    pub fn read_i8(&mut self) -> Result<i8> {
        self.read_u8().map(|b| b as i8)
    }

    /// Read a boolean (non-zero = true).
    #[inline]
    pub fn read_bool(&mut self) -> Result<bool> {
        self.read_u8().map(|b| b != 0)
    }

    /// Read a little-endian u16.
    #[inline]
    pub fn read_u16(&mut self) -> Result<u16> {
        let bytes = self.read_bytes(2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    /// Read a little-endian u32.
    #[inline]
    pub fn read_u32(&mut self) -> Result<u32> {
        let bytes = self.read_bytes(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Read a little-endian i32.
    #[inline]
    pub fn read_i32(&mut self) -> Result<i32> {
        let bytes = self.read_bytes(4)?;
        Ok(i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Read a little-endian f32.
    #[inline]
    pub fn read_f32(&mut self) -> Result<f32> {
        let bytes = self.read_bytes(4)?;
        Ok(f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Read a 7-bit encoded unsigned integer.
    ///
    /// Each byte carries 7 payload bits, least-significant group first; the
    /// high bit set means another byte follows. Streams that never clear the
    /// continuation bit are rejected after [`MAX_VARINT_BYTES`] groups.
    pub fn read_7bit_u32(&mut self) -> Result<u32> {
        let mut value: u32 = 0;
        let mut shift = 0;

        for _ in 0..MAX_VARINT_BYTES {
            let byte = self.read_u8()?;
            value |= u32::from(byte & 0x7F) << shift;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
            shift += 7;
        }

        Err(Error::VarIntTooLong {
            max_bytes: MAX_VARINT_BYTES,
        })
    }

    /// Expect specific magic bytes.
    pub fn expect_magic(&mut self, expected: &[u8]) -> Result<()> {
        let actual = self.read_bytes(expected.len())?;
        if actual != expected {
            return Err(Error::InvalidMagic {
                expected: expected.to_vec(),
                actual: actual.to_vec(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_primitives() {
        let data = [
            0x2A, 0x00, 0x00, 0x00, // i32: 42
            0x00, 0x00, 0x80, 0x3F, // f32: 1.0
            0x01, // bool: true
        ];
        let mut reader = BinaryReader::new(&data);

        assert_eq!(reader.read_i32().unwrap(), 42);
        assert_eq!(reader.read_f32().unwrap(), 1.0);
        assert!(reader.read_bool().unwrap());
        assert!(reader.is_empty());
    }

    #[test]
    fn test_varint_single_byte() {
        let mut reader = BinaryReader::new(&[0x05]);
        assert_eq!(reader.read_7bit_u32().unwrap(), 5);
        assert_eq!(reader.position(), 1);
    }

    #[test]
    fn test_varint_multi_byte() {
        // 300 = 0b10_0101100 -> 0xAC 0x02
        let mut reader = BinaryReader::new(&[0xAC, 0x02]);
        assert_eq!(reader.read_7bit_u32().unwrap(), 300);
    }

    #[test]
    fn test_varint_stops_at_terminator() {
        let mut reader = BinaryReader::new(&[0x7F, 0xFF]);
        assert_eq!(reader.read_7bit_u32().unwrap(), 127);
        assert_eq!(reader.position(), 1);
    }

    #[test]
    fn test_varint_unbounded_is_rejected() {
        let mut reader = BinaryReader::new(&[0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]);
        assert!(matches!(
            reader.read_7bit_u32(),
            Err(Error::VarIntTooLong { .. })
        ));
    }

    #[test]
    fn test_magic() {
        let mut reader = BinaryReader::new(b"XNBw");
        assert!(reader.expect_magic(b"XNB").is_ok());
        assert_eq!(reader.read_u8().unwrap(), b'w');

        let mut reader = BinaryReader::new(b"BNXw");
        assert!(matches!(
            reader.expect_magic(b"XNB"),
            Err(Error::InvalidMagic { .. })
        ));
    }

    #[test]
    fn test_eof_error() {
        let data = [0x01, 0x02];
        let mut reader = BinaryReader::new(&data);
        assert!(matches!(
            reader.read_u32(),
            Err(Error::UnexpectedEof {
                needed: 4,
                available: 2
            })
        ));
    }
}
