//! Common utilities for xnbkit.
//!
//! This crate provides the foundational types used across all xnbkit crates:
//!
//! - [`BinaryReader`] - Cursor-style binary reading from byte slices
//! - [`BinaryWriter`] - Growable binary output buffer
//! - 7-bit variable-length integer encoding (the .NET `Write7BitEncodedInt`
//!   scheme used throughout the XNB container format)

mod error;
mod reader;
mod writer;

pub use error::{Error, Result};
pub use reader::BinaryReader;
pub use writer::BinaryWriter;

/// Maximum number of byte groups in a 7-bit encoded u32.
///
/// Five groups of 7 bits cover the full 32-bit range; a sixth group can
/// only come from a malformed or hostile stream.
pub const MAX_VARINT_BYTES: usize = 5;
