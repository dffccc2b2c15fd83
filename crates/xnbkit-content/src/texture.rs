//! Texture2D resource codec.
//!
//! On the wire a texture is `{format:i32, width:u32, height:u32,
//! mip_count:u32, length:u32, blocks}`. Block-compressed formats (DXT1/3/5)
//! are expanded to RGBA8 on decode and recompressed on encode, so the tree
//! always holds plain pixels.
//!
//! Alpha handling is deliberately asymmetric: decode un-premultiplies with
//! *ceiling* rounding, encode premultiplies with *floor*. The original
//! tooling behaves exactly this way, which makes the pixel round trip lossy
//! within ±1 per channel; callers test against that tolerance, not
//! equality.

use serde::{Deserialize, Serialize};
use xnbkit_common::{BinaryReader, BinaryWriter};

use crate::{Error, Result};

/// Surface format of an embedded texture.
///
/// Wire values follow the engine's surface-format enumeration; everything
/// outside this set is an unimplemented-pixel-format error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PixelFormat {
    /// Uncompressed RGBA8.
    Color,
    /// BC1: 4 bpp, 1-bit alpha.
    Dxt1,
    /// BC2: 8 bpp, explicit alpha.
    Dxt3,
    /// BC3: 8 bpp, interpolated alpha.
    Dxt5,
}

impl PixelFormat {
    /// Parse the wire value.
    pub fn from_wire(value: i32) -> Result<Self> {
        match value {
            0 => Ok(Self::Color),
            4 => Ok(Self::Dxt1),
            5 => Ok(Self::Dxt3),
            6 => Ok(Self::Dxt5),
            other => Err(Error::UnsupportedPixelFormat(other)),
        }
    }

    /// The wire value for this format.
    pub fn to_wire(self) -> i32 {
        match self {
            Self::Color => 0,
            Self::Dxt1 => 4,
            Self::Dxt3 => 5,
            Self::Dxt5 => 6,
        }
    }

    /// The matching block codec, if this format is block-compressed.
    fn block_format(self) -> Option<texpresso::Format> {
        match self {
            Self::Color => None,
            Self::Dxt1 => Some(texpresso::Format::Bc1),
            Self::Dxt3 => Some(texpresso::Format::Bc2),
            Self::Dxt5 => Some(texpresso::Format::Bc3),
        }
    }
}

/// A decoded texture payload.
///
/// `pixels` is un-premultiplied RGBA8 of length `width * height * 4`, or
/// `None` while the image is externalized to a sibling PNG file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Texture2D {
    pub format: PixelFormat,
    pub width: u32,
    pub height: u32,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub pixels: Option<Vec<u8>>,
}

/// Decode a texture payload from the body.
pub fn decode(reader: &mut BinaryReader<'_>) -> Result<Texture2D> {
    let format = PixelFormat::from_wire(reader.read_i32()?)?;
    let width = reader.read_u32()?;
    let height = reader.read_u32()?;

    // Multi-mip textures are unsupported by design.
    let mip_count = reader.read_u32()?;
    if mip_count != 1 {
        return Err(Error::InvalidMipCount(mip_count));
    }

    let length = reader.read_u32()? as usize;
    let data = reader.read_bytes(length)?;
    let rgba_len = width as usize * height as usize * 4;

    let mut pixels = match format.block_format() {
        Some(block) => {
            let expected = block.compressed_size(width as usize, height as usize);
            if data.len() != expected {
                return Err(Error::PixelBufferSize {
                    expected,
                    actual: data.len(),
                });
            }
            let mut rgba = vec![0u8; rgba_len];
            block.decompress(data, width as usize, height as usize, &mut rgba);
            rgba
        }
        None => {
            if data.len() != rgba_len {
                return Err(Error::PixelBufferSize {
                    expected: rgba_len,
                    actual: data.len(),
                });
            }
            data.to_vec()
        }
    };

    unpremultiply(&mut pixels);

    Ok(Texture2D {
        format,
        width,
        height,
        pixels: Some(pixels),
    })
}

/// Encode a texture payload into the body.
///
/// The recorded format is written back: block-compressed textures are
/// recompressed to the same block codec they were decoded from.
pub fn encode(writer: &mut BinaryWriter, texture: &Texture2D) -> Result<()> {
    let pixels = texture.pixels.as_ref().ok_or(Error::MissingPixels)?;

    let rgba_len = texture.width as usize * texture.height as usize * 4;
    if pixels.len() != rgba_len {
        return Err(Error::PixelBufferSize {
            expected: rgba_len,
            actual: pixels.len(),
        });
    }

    let mut premultiplied = pixels.clone();
    premultiply(&mut premultiplied);

    let data = match texture.format.block_format() {
        Some(block) => {
            let mut blocks =
                vec![0u8; block.compressed_size(texture.width as usize, texture.height as usize)];
            block.compress(
                &premultiplied,
                texture.width as usize,
                texture.height as usize,
                texpresso::Params::default(),
                &mut blocks,
            );
            blocks
        }
        None => premultiplied,
    };

    writer.write_i32(texture.format.to_wire());
    writer.write_u32(texture.width);
    writer.write_u32(texture.height);
    writer.write_u32(1);
    writer.write_u32(data.len() as u32);
    writer.write_bytes(&data);
    Ok(())
}

/// Un-premultiply alpha in place: `c = ceil(c * 255 / a)` for a != 0.
///
/// A channel exceeding its alpha (not valid premultiplied data) clamps
/// to 255; the original tooling wraps modulo 256 there instead.
fn unpremultiply(pixels: &mut [u8]) {
    for px in pixels.chunks_exact_mut(4) {
        let alpha = u32::from(px[3]);
        if alpha == 0 {
            continue;
        }
        for c in px[..3].iter_mut() {
            let scaled = (u32::from(*c) * 255).div_ceil(alpha);
            *c = scaled.min(255) as u8;
        }
    }
}

/// Premultiply alpha in place: `c = floor(c * a / 255)`.
fn premultiply(pixels: &mut [u8]) {
    for px in pixels.chunks_exact_mut(4) {
        let alpha = u32::from(px[3]);
        for c in px[..3].iter_mut() {
            *c = (u32::from(*c) * alpha / 255) as u8;
        }
    }
}
