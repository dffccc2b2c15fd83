//! Error types for XNB container decoding and encoding.
//!
//! Errors fall into three kinds that callers handle differently:
//!
//! - fatal structural errors (bad magic, bad version, malformed body):
//!   the file operation aborts, nothing is written;
//! - unsupported-content errors ([`Error::UnsupportedType`],
//!   [`Error::UnsupportedPixelFormat`], [`Error::CompressionUnsupported`]):
//!   the file still aborts, but [`Error::is_unsupported`] lets a batch
//!   driver skip it and keep going;
//! - everything else propagates as-is; nothing is swallowed in the codec.

use thiserror::Error;

/// Errors that can occur when working with XNB containers.
#[derive(Debug, Error)]
pub enum Error {
    /// Common library error (EOF, magic, varint, UTF-8).
    #[error("{0}")]
    Common(#[from] xnbkit_common::Error),

    /// Container format version other than the one supported revision.
    #[error("unsupported XNB format version: expected 5, got {0}")]
    UnsupportedVersion(u8),

    /// The shared-resource table is unimplemented by design; a nonzero
    /// count signals a file this codec cannot represent.
    #[error("shared resources are not supported: count {0}")]
    SharedResources(u32),

    /// Bytes left over after the root value was fully decoded.
    #[error("trailing data after root value: {remaining} bytes")]
    TrailingData { remaining: usize },

    /// Type name absent from the codec name table. Skippable.
    #[error("unsupported type: {0}")]
    UnsupportedType(String),

    /// Engine type name that could not be parsed at all.
    #[error("malformed type name: {0}")]
    MalformedTypeName(String),

    /// Generic type whose argument count disagrees with its arity.
    #[error("type {name} expects {expected} type argument(s), got {actual}")]
    ArityMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },

    /// Reference index pointing outside the per-file type table.
    #[error("reader index {index} out of range for table of {count} entries")]
    ReaderIndexOutOfRange { index: u32, count: usize },

    /// Node whose type has no entry in the per-file type table.
    #[error("type {0} is not in the container's type table")]
    TypeNotInTable(String),

    /// Node shape does not match the codec chosen for its slot.
    #[error("type mismatch: codec for {expected} given a {actual} node")]
    TypeMismatch { expected: String, actual: String },

    /// Char payload that is not exactly one UTF-8 scalar value.
    #[error("char payload is not a single character")]
    InvalidChar,

    /// Texture with a mip count other than 1; multi-mip textures are
    /// unsupported by design.
    #[error("unsupported texture mip count: {0}")]
    InvalidMipCount(u32),

    /// Pixel format value outside the recognized set. Skippable.
    #[error("unimplemented Texture2D pixel format: {0}")]
    UnsupportedPixelFormat(i32),

    /// Pixel or block buffer whose length disagrees with the texture
    /// dimensions.
    #[error("pixel buffer size mismatch: expected {expected} bytes, got {actual}")]
    PixelBufferSize { expected: usize, actual: usize },

    /// Texture node encoded while its pixels are externalized.
    #[error("texture has no pixel data (was it re-inlined?)")]
    MissingPixels,

    /// Tile map node encoded while its bytes are externalized.
    #[error("tile map has no data (was it re-inlined?)")]
    MissingMapData,

    /// Target platform byte outside the ASCII range.
    #[error("invalid target platform: {0:?}")]
    InvalidTarget(char),

    /// Negative length prefix in the body.
    #[error("negative length prefix: {0}")]
    NegativeLength(i32),

    /// Decompression failure from the compression collaborator.
    #[error("decompression error: {0}")]
    Decompression(String),

    /// Decompressed body did not reach the recorded size.
    #[error("decompressed size mismatch: expected {expected}, got {actual}")]
    DecompressedSizeMismatch { expected: usize, actual: usize },

    /// The configured compression collaborator cannot compress. Skippable.
    #[error("compression is not supported by the configured codec")]
    CompressionUnsupported,
}

impl Error {
    /// Whether this error marks content the codec does not implement,
    /// as opposed to a structurally broken file.
    ///
    /// Batch drivers skip files that fail with an unsupported error and
    /// continue with the next one.
    pub fn is_unsupported(&self) -> bool {
        matches!(
            self,
            Error::UnsupportedType(_)
                | Error::UnsupportedPixelFormat(_)
                | Error::CompressionUnsupported
        )
    }
}

/// Result type for XNB container operations.
pub type Result<T> = std::result::Result<T, Error>;
