//! Binary writer mirroring [`BinaryReader`](crate::BinaryReader).

use crate::MAX_VARINT_BYTES;

/// A growable little-endian binary output buffer.
///
/// # Example
///
/// ```
/// use xnbkit_common::BinaryWriter;
///
/// let mut writer = BinaryWriter::new();
/// writer.write_i32(42);
/// writer.write_bool(true);
/// assert_eq!(writer.into_inner(), vec![0x2A, 0x00, 0x00, 0x00, 0x01]);
/// ```
#[derive(Debug, Default, Clone)]
pub struct BinaryWriter {
    buf: Vec<u8>,
}

impl BinaryWriter {
    /// Create a new empty writer.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a writer with a preallocated capacity.
    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Number of bytes written so far.
    #[inline]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Check whether nothing has been written yet.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// View the bytes written so far.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consume the writer and return the output buffer.
    #[inline]
    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }

    /// Append raw bytes.
    #[inline]
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Write a single byte.
    #[inline]
    pub fn write_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    /// Write a boolean as one byte.
    #[inline]
    pub fn write_bool(&mut self, value: bool) {
        self.buf.push(u8::from(value));
    }

    /// Write a little-endian u16.
    #[inline]
    pub fn write_u16(&mut self, value: u16) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Write a little-endian u32.
    #[inline]
    pub fn write_u32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Write a little-endian i32.
    #[inline]
    pub fn write_i32(&mut self, value: i32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Write a little-endian f32.
    #[inline]
    pub fn write_f32(&mut self, value: f32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Write a 7-bit encoded unsigned integer.
    ///
    /// Inverse of [`BinaryReader::read_7bit_u32`](crate::BinaryReader::read_7bit_u32);
    /// a u32 never needs more than [`MAX_VARINT_BYTES`] groups.
    pub fn write_7bit_u32(&mut self, mut value: u32) {
        for _ in 0..MAX_VARINT_BYTES {
            let byte = (value & 0x7F) as u8;
            value >>= 7;
            if value == 0 {
                self.buf.push(byte);
                return;
            }
            self.buf.push(byte | 0x80);
        }
    }
}
