//! Xnbkit - XNB game asset container extraction and repacking library.
//!
//! This crate provides a unified interface to the xnbkit library ecosystem
//! for working with XNB content files.
//!
//! # Crates
//!
//! - [`xnbkit_common`] - Binary cursor reading/writing and 7-bit varints
//! - [`xnbkit_content`] - Container codec (type table, value tree, textures,
//!   compression frame)
//! - [`xnbkit_tbin`] - Tile map (`.tbin`) tileset-reference rewriting
//! - [`xnbkit_export`] - Editable JSON documents with externalized resources
//!
//! # Example
//!
//! ```no_run
//! use xnbkit::prelude::*;
//!
//! // Unpack a container into an editable JSON document plus sibling files
//! let bytes = std::fs::read("portraits.xnb")?;
//! let container = Container::decode(&bytes, &LzxCodec)?;
//! save_document(container, "portraits.json".as_ref())?;
//!
//! // ...edit the JSON...
//!
//! // Repack it
//! let container = load_document("portraits.json".as_ref())?;
//! std::fs::write("portraits.xnb", container.encode(&LzxCodec)?)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

// Re-export all sub-crates
pub use xnbkit_common as common;
pub use xnbkit_content as content;
pub use xnbkit_export as export;
pub use xnbkit_tbin as tbin;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use xnbkit_common::{BinaryReader, BinaryWriter};
    pub use xnbkit_content::{Container, LzxCodec, PixelFormat, Texture2D, Value, XmemCodec};
    pub use xnbkit_export::{load_document, save_document, Document};
    pub use xnbkit_tbin::{externalize_tilesheets, internalize_tilesheets};
}

// Re-export commonly used types at the crate root
pub use xnbkit_content::{Container, LzxCodec, Value};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
