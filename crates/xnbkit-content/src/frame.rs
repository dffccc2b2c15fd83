//! Compression collaborator boundary.
//!
//! The container's compressed body uses the XMemCompress chunked LZX
//! scheme. The algorithm itself is external and replaceable: anything
//! implementing [`XmemCodec`] can be plugged into
//! [`Container::decode`](crate::Container::decode) and
//! [`Container::encode`](crate::Container::encode).
//!
//! [`LzxCodec`] is the bundled implementation. It decompresses real files
//! through the `lzxd` crate; no LZX *encoder* exists in the ecosystem, so
//! its compress side reports [`Error::CompressionUnsupported`] and packing
//! falls back to the uncompressed frame.

use lzxd::{Lzxd, WindowSize};
use xnbkit_common::BinaryReader;

use crate::{Error, Result};

/// Default LZX frame size: each chunk decompresses to 32 KiB unless the
/// stream says otherwise.
const DEFAULT_FRAME_SIZE: usize = 0x8000;

/// The narrow compress/decompress contract of the external compression
/// collaborator.
///
/// Implementations are treated as synchronous and stateless; no concurrent
/// reentrancy is assumed, so parallel workers each make their own calls.
pub trait XmemCodec {
    /// Decompress `input`, failing fast unless exactly `expected_len`
    /// bytes come out.
    fn decompress(&self, input: &[u8], expected_len: usize) -> Result<Vec<u8>>;

    /// Compress `input`.
    fn compress(&self, input: &[u8]) -> Result<Vec<u8>>;
}

/// LZX codec over the XMemCompress chunk framing.
///
/// Each chunk is prefixed with a big-endian block size; a leading `0xFF`
/// byte escapes an explicit frame size for partial frames.
#[derive(Debug, Default, Clone, Copy)]
pub struct LzxCodec;

impl LzxCodec {
    /// Create a new codec instance.
    pub fn new() -> Self {
        Self
    }
}

impl XmemCodec for LzxCodec {
    fn decompress(&self, input: &[u8], expected_len: usize) -> Result<Vec<u8>> {
        let mut lzxd = Lzxd::new(WindowSize::KB64);
        let mut reader = BinaryReader::new(input);
        let mut output = Vec::with_capacity(expected_len);

        while !reader.is_empty() && output.len() < expected_len {
            let hi = reader.read_u8()?;
            let lo = reader.read_u8()?;

            let (frame_size, block_size) = if hi == 0xFF {
                let frame = (usize::from(lo) << 8) | usize::from(reader.read_u8()?);
                let bhi = reader.read_u8()?;
                let blo = reader.read_u8()?;
                (frame, (usize::from(bhi) << 8) | usize::from(blo))
            } else {
                (DEFAULT_FRAME_SIZE, (usize::from(hi) << 8) | usize::from(lo))
            };

            if block_size == 0 || frame_size == 0 {
                break;
            }

            let chunk = reader.read_bytes(block_size)?;
            let frame_size = frame_size.min(expected_len - output.len());
            let decoded = lzxd
                .decompress_next(chunk, frame_size)
                .map_err(|e| Error::Decompression(format!("{e:?}")))?;
            output.extend_from_slice(decoded);
        }

        if output.len() != expected_len {
            return Err(Error::DecompressedSizeMismatch {
                expected: expected_len,
                actual: output.len(),
            });
        }
        Ok(output)
    }

    fn compress(&self, _input: &[u8]) -> Result<Vec<u8>> {
        Err(Error::CompressionUnsupported)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lzx_compress_is_unsupported() {
        let err = LzxCodec::new().compress(b"anything").unwrap_err();
        assert!(matches!(err, Error::CompressionUnsupported));
        assert!(err.is_unsupported());
    }

    #[test]
    fn test_lzx_empty_input_fails_length_check() {
        let err = LzxCodec::new().decompress(&[], 16).unwrap_err();
        assert!(matches!(
            err,
            Error::DecompressedSizeMismatch {
                expected: 16,
                actual: 0
            }
        ));
    }
}
