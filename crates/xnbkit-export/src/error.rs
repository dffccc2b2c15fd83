use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while externalizing or re-inlining resources.
#[derive(Debug, Error)]
pub enum Error {
    /// Container codec error.
    #[error("{0}")]
    Content(#[from] xnbkit_content::Error),

    /// Tile map rewrite error.
    #[error("{0}")]
    Tbin(#[from] xnbkit_tbin::Error),

    /// Filesystem error.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Document (de)serialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// PNG encode/decode error.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// A sibling resource file named by the manifest is missing.
    #[error("missing extracted resource file: {0}")]
    MissingResource(PathBuf),

    /// A manifest tree path no longer resolves to a node.
    #[error("extracted resource path does not resolve: {0:?}")]
    PathNotFound(String),

    /// Pixel buffer whose shape disagrees with the PNG dimensions.
    #[error("pixel buffer does not match {width}x{height} RGBA")]
    PixelShape { width: u32, height: u32 },
}

/// Result type for externalization operations.
pub type Result<T> = std::result::Result<T, Error>;
