//! XNB container codec: decode game content files into an editable value
//! tree and encode the tree back to bytes.
//!
//! # File Format
//!
//! XNB files are type-tagged binary containers:
//! - 3 bytes: Magic ("XNB")
//! - 1 byte: Target platform ('w' desktop, 'm' phone, 'x' console)
//! - 1 byte: Format version (5)
//! - 1 byte: Flags (0x80 compressed, 0x01 HiDef)
//! - 4 bytes: Total on-disk size
//! - 4 bytes: Decompressed body size (compressed files only)
//! - N bytes: Body (XMemCompress/LZX when the compressed flag is set)
//!
//! The body opens with a type table (7-bit varint count, then
//! length-prefixed engine-qualified type names with an i32 version each),
//! a shared-resource count that must be zero, and the root value.
//! Reference-typed values are prefixed with a 1-based varint index into
//! the type table; index 0 is a null reference. Value-typed data is
//! inlined with no prefix.
//!
//! # Example
//!
//! ```no_run
//! use xnbkit_content::{Container, LzxCodec, Value};
//!
//! let bytes = std::fs::read("portraits.xnb")?;
//! let mut container = Container::decode(&bytes, &LzxCodec)?;
//!
//! if let Value::Dictionary(dict) = &mut container.content {
//!     println!("{} entries", dict.entries.len());
//! }
//!
//! std::fs::write("portraits.out.xnb", container.encode(&LzxCodec)?)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod container;
mod error;
mod frame;
mod registry;
pub mod texture;
mod typedesc;
pub mod value;

pub use container::{Container, ReaderEntry, FLAG_COMPRESSED, FLAG_HIDEF, FORMAT_VERSION, XNB_MAGIC};
pub use error::{Error, Result};
pub use frame::{LzxCodec, XmemCodec};
pub use registry::{Codec, TypeRegistry};
pub use typedesc::TypeDescriptor;

// Re-export commonly used types at crate root
pub use texture::{PixelFormat, Texture2D};
pub use value::Value;
