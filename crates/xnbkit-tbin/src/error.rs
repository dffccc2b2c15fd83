use thiserror::Error;

/// Errors that can occur while rewriting a tile map buffer.
#[derive(Debug, Error)]
pub enum Error {
    /// Common library error (EOF while walking the structure).
    #[error("{0}")]
    Common(#[from] xnbkit_common::Error),

    /// Negative length prefix inside the map structure.
    #[error("negative length prefix in tile map: {0}")]
    NegativeLength(i32),

    /// Property tag byte outside the known set (0..=3).
    #[error("unknown tile map property type: {0}")]
    UnknownPropertyType(u8),

    /// Tileset image source that is not valid UTF-8.
    #[error("tileset image source is not valid UTF-8")]
    InvalidImageSource,
}

/// Result type for tile map operations.
pub type Result<T> = std::result::Result<T, Error>;
