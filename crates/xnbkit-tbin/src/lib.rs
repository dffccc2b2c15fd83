//! Structural rewriter for embedded tile map (.tbin) buffers.
//!
//! Tile maps are carried through the container codec as opaque bytes; the
//! only part of the format this crate understands is the prefix up to and
//! including the tileset table, which is where the tileset image-source
//! strings live. Everything after the last tileset (layers, tiles, paths)
//! is copied through untouched.
//!
//! The walked prefix looks like:
//! - 6 bytes: header
//! - map id string, map description string
//! - map property list
//! - i32 tileset count, then per tileset: id string, description string,
//!   image source string, 32 bytes of sizes/margin/spacing, property list
//!
//! All strings are i32-length-prefixed; property lists are an i32 count of
//! (key string, tag byte, payload) entries with tags 0 bool, 1 i32,
//! 2 f32, 3 string.
//!
//! [`externalize_tilesheets`] appends `.png` to every image source (so an
//! extracted map references real files on disk) and reports the rewritten
//! names; [`internalize_tilesheets`] strips the suffix back off before the
//! map is re-embedded.

mod error;

pub use error::{Error, Result};

use xnbkit_common::{BinaryReader, BinaryWriter};

const HEADER_SIZE: usize = 6;

// 4 pairs of i32: sheet size, tile size, margin, spacing.
const TILESET_GEOMETRY_SIZE: usize = 4 * 2 * 4;

/// Rewrite every tileset image source in `data` through `rewrite`,
/// returning the new buffer.
///
/// The buffer's structure outside the image-source strings is preserved
/// byte for byte, so rewriting with an identity function reproduces the
/// input exactly.
pub fn rewrite_tilesheets<F>(data: &[u8], mut rewrite: F) -> Result<Vec<u8>>
where
    F: FnMut(&str) -> String,
{
    let mut reader = BinaryReader::new(data);
    let mut out = BinaryWriter::with_capacity(data.len());

    out.write_bytes(reader.read_bytes(HEADER_SIZE)?);

    copy_string(&mut reader, &mut out)?; // map id
    copy_string(&mut reader, &mut out)?; // map description
    copy_properties(&mut reader, &mut out)?;

    let tileset_count = reader.read_i32()?;
    if tileset_count < 0 {
        return Err(Error::NegativeLength(tileset_count));
    }
    out.write_i32(tileset_count);

    for _ in 0..tileset_count {
        copy_string(&mut reader, &mut out)?; // tileset id
        copy_string(&mut reader, &mut out)?; // tileset description

        let source = read_string(&mut reader)?;
        let rewritten = rewrite(&source);
        out.write_i32(rewritten.len() as i32);
        out.write_bytes(rewritten.as_bytes());

        out.write_bytes(reader.read_bytes(TILESET_GEOMETRY_SIZE)?);
        copy_properties(&mut reader, &mut out)?;
    }

    // Layers and tile data follow; none of it references files.
    out.write_bytes(reader.remaining_bytes());
    Ok(out.into_inner())
}

/// Append `.png` to every tileset image source, returning the rewritten
/// buffer and the referenced file names in tileset order.
pub fn externalize_tilesheets(data: &[u8]) -> Result<(Vec<u8>, Vec<String>)> {
    let mut tilesheets = Vec::new();
    let buffer = rewrite_tilesheets(data, |source| {
        let name = format!("{source}.png");
        tilesheets.push(name.clone());
        name
    })?;
    Ok((buffer, tilesheets))
}

/// Strip a trailing `.png` from every tileset image source.
pub fn internalize_tilesheets(data: &[u8]) -> Result<Vec<u8>> {
    rewrite_tilesheets(data, |source| {
        source.strip_suffix(".png").unwrap_or(source).to_string()
    })
}

fn read_string(reader: &mut BinaryReader<'_>) -> Result<String> {
    let len = reader.read_i32()?;
    if len < 0 {
        return Err(Error::NegativeLength(len));
    }
    let bytes = reader.read_bytes(len as usize)?;
    String::from_utf8(bytes.to_vec()).map_err(|_| Error::InvalidImageSource)
}

fn copy_string(reader: &mut BinaryReader<'_>, out: &mut BinaryWriter) -> Result<()> {
    let len = reader.read_i32()?;
    if len < 0 {
        return Err(Error::NegativeLength(len));
    }
    out.write_i32(len);
    out.write_bytes(reader.read_bytes(len as usize)?);
    Ok(())
}

fn copy_properties(reader: &mut BinaryReader<'_>, out: &mut BinaryWriter) -> Result<()> {
    let count = reader.read_i32()?;
    if count < 0 {
        return Err(Error::NegativeLength(count));
    }
    out.write_i32(count);

    for _ in 0..count {
        copy_string(reader, out)?; // key

        let tag = reader.read_u8()?;
        out.write_u8(tag);
        match tag {
            0 => out.write_bytes(reader.read_bytes(1)?), // bool
            1 | 2 => out.write_bytes(reader.read_bytes(4)?), // i32 / f32
            3 => copy_string(reader, out)?,
            other => return Err(Error::UnknownPropertyType(other)),
        }
    }
    Ok(())
}
