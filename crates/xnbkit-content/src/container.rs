//! Top-level container decode/encode.
//!
//! Wire layout:
//!
//! ```text
//! "XNB"(3) | target(1) | version(1)=5 | flags(1) | on_disk_size(u32)
//!         | [decompressed_size(u32) if compressed] | body
//! body:    varint reader_count
//!        | reader_count * (string type_name, i32 version)
//!        | varint shared_resource_count (must be 0)
//!        | root value
//! ```
//!
//! The reader-table order recorded at decode time drives encode, so a
//! decode → encode round trip of any file that avoids the lossy pixel path
//! is byte-identical.

use serde::{Deserialize, Serialize};
use xnbkit_common::{BinaryReader, BinaryWriter};

use crate::frame::XmemCodec;
use crate::registry::{read_string, write_string, TypeRegistry};
use crate::value::Value;
use crate::{Error, Result};

/// Container signature bytes.
pub const XNB_MAGIC: &[u8; 3] = b"XNB";

/// The one supported format revision.
pub const FORMAT_VERSION: u8 = 5;

/// Flag bit: body is XMemCompress-compressed.
pub const FLAG_COMPRESSED: u8 = 0x80;

/// Flag bit: HiDef graphics profile.
pub const FLAG_HIDEF: u8 = 0x01;

/// Header bytes before the on-disk-size field.
const HEADER_SIZE: usize = 6;

/// One entry of the per-file type table.
///
/// The engine-qualified name is preserved verbatim; re-encoding writes it
/// back unchanged, which keeps the table region byte-identical.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReaderEntry {
    #[serde(rename = "type")]
    pub type_name: String,
    pub version: i32,
}

/// A fully decoded container: header metadata, reader table and the root
/// value tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Container {
    /// Target platform byte (`'w'` desktop, `'m'` phone, `'x'` console).
    pub target: char,
    /// HiDef graphics profile flag.
    pub hi_def: bool,
    /// Whether the source file carried a compressed body.
    pub compressed: bool,
    /// The ordered type table; order is load-bearing for index dispatch.
    pub readers: Vec<ReaderEntry>,
    /// The root value.
    pub content: Value,
}

impl Container {
    /// Check whether data starts with the container signature.
    pub fn is_xnb(data: &[u8]) -> bool {
        data.len() >= XNB_MAGIC.len() && &data[..XNB_MAGIC.len()] == XNB_MAGIC
    }

    /// Decode a container from its on-disk bytes.
    ///
    /// `codec` is consulted only when the compressed flag is set.
    pub fn decode(data: &[u8], codec: &dyn XmemCodec) -> Result<Self> {
        let mut reader = BinaryReader::new(data);
        reader.expect_magic(XNB_MAGIC)?;

        let target = char::from(reader.read_u8()?);

        let version = reader.read_u8()?;
        if version != FORMAT_VERSION {
            return Err(Error::UnsupportedVersion(version));
        }

        let flags = reader.read_u8()?;
        let compressed = flags & FLAG_COMPRESSED != 0;
        let hi_def = flags & FLAG_HIDEF != 0;

        // Recorded on-disk size; re-derived on encode.
        let _on_disk_size = reader.read_u32()?;

        let decompressed;
        let body: &[u8] = if compressed {
            let expected = reader.read_u32()? as usize;
            decompressed = codec.decompress(reader.remaining_bytes(), expected)?;
            &decompressed
        } else {
            reader.remaining_bytes()
        };

        Self::decode_body(body, target, hi_def, compressed)
    }

    fn decode_body(body: &[u8], target: char, hi_def: bool, compressed: bool) -> Result<Self> {
        let mut r = BinaryReader::new(body);

        let reader_count = r.read_7bit_u32()?;
        let mut readers = Vec::with_capacity(reader_count as usize);
        for _ in 0..reader_count {
            let type_name = read_string(&mut r)?;
            let version = r.read_i32()?;
            readers.push(ReaderEntry { type_name, version });
        }

        let registry = TypeRegistry::from_entries(&readers)?;

        let shared = r.read_7bit_u32()?;
        if shared != 0 {
            return Err(Error::SharedResources(shared));
        }

        let content = registry.read_value(&mut r)?;

        if !r.is_empty() {
            return Err(Error::TrailingData {
                remaining: r.remaining(),
            });
        }

        Ok(Self {
            target,
            hi_def,
            compressed,
            readers,
            content,
        })
    }

    /// Encode the container back to on-disk bytes.
    ///
    /// The body is serialized in the recorded reader-table order; if the
    /// compressed flag is set, the codec's compress side is invoked and
    /// its failure propagates (nothing is written half-way).
    pub fn encode(&self, codec: &dyn XmemCodec) -> Result<Vec<u8>> {
        if !self.target.is_ascii() {
            return Err(Error::InvalidTarget(self.target));
        }

        let mut body = BinaryWriter::new();
        body.write_7bit_u32(self.readers.len() as u32);
        for entry in &self.readers {
            write_string(&mut body, &entry.type_name);
            body.write_i32(entry.version);
        }
        body.write_7bit_u32(0); // shared resources

        let registry = TypeRegistry::from_entries(&self.readers)?;
        registry.write_value(&mut body, &self.content)?;
        let body = body.into_inner();

        let mut out = BinaryWriter::with_capacity(HEADER_SIZE + 8 + body.len());
        out.write_bytes(XNB_MAGIC);
        out.write_u8(self.target as u8);
        out.write_u8(FORMAT_VERSION);

        let mut flags = 0u8;
        if self.compressed {
            flags |= FLAG_COMPRESSED;
        }
        if self.hi_def {
            flags |= FLAG_HIDEF;
        }
        out.write_u8(flags);

        if self.compressed {
            let compressed = codec.compress(&body)?;
            // header + size field + decompressed-size field + payload
            out.write_u32((HEADER_SIZE + 8 + compressed.len()) as u32);
            out.write_u32(body.len() as u32);
            out.write_bytes(&compressed);
        } else {
            out.write_u32((HEADER_SIZE + 4 + body.len()) as u32);
            out.write_bytes(&body);
        }

        Ok(out.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{DictEntry, Dictionary, Sequence};

    /// Identity "compression" for exercising the compressed frame without
    /// a real LZX encoder.
    struct StoreCodec;

    impl XmemCodec for StoreCodec {
        fn decompress(&self, input: &[u8], expected_len: usize) -> Result<Vec<u8>> {
            if input.len() != expected_len {
                return Err(Error::DecompressedSizeMismatch {
                    expected: expected_len,
                    actual: input.len(),
                });
            }
            Ok(input.to_vec())
        }

        fn compress(&self, input: &[u8]) -> Result<Vec<u8>> {
            Ok(input.to_vec())
        }
    }

    fn int32_container(value: i32) -> Vec<u8> {
        let type_name = "Microsoft.Xna.Framework.Content.Int32Reader";
        let mut body = BinaryWriter::new();
        body.write_7bit_u32(1); // reader count
        body.write_7bit_u32(type_name.len() as u32);
        body.write_bytes(type_name.as_bytes());
        body.write_i32(0); // reader version
        body.write_7bit_u32(0); // shared resources
        body.write_7bit_u32(1); // root type index
        body.write_i32(value);
        let body = body.into_inner();

        let mut out = BinaryWriter::new();
        out.write_bytes(b"XNB");
        out.write_u8(b'w');
        out.write_u8(5);
        out.write_u8(0);
        out.write_u32((10 + body.len()) as u32);
        out.write_bytes(&body);
        out.into_inner()
    }

    #[test]
    fn test_minimal_int32_container() {
        let bytes = int32_container(42);
        let container = Container::decode(&bytes, &StoreCodec).unwrap();

        assert_eq!(container.target, 'w');
        assert!(!container.compressed);
        assert!(!container.hi_def);
        assert_eq!(container.readers.len(), 1);
        assert_eq!(container.content, Value::Int32(42));

        let reencoded = container.encode(&StoreCodec).unwrap();
        assert_eq!(reencoded, bytes);
    }

    #[test]
    fn test_dictionary_roundtrip_preserves_order() {
        let dict_reader = "Microsoft.Xna.Framework.Content.DictionaryReader`2[[System.String, mscorlib],[System.Int32, mscorlib]]";
        let container = Container {
            target: 'w',
            hi_def: false,
            compressed: false,
            readers: vec![
                ReaderEntry {
                    type_name: dict_reader.to_string(),
                    version: 0,
                },
                ReaderEntry {
                    type_name: "Microsoft.Xna.Framework.Content.StringReader".to_string(),
                    version: 0,
                },
                ReaderEntry {
                    type_name: "Microsoft.Xna.Framework.Content.Int32Reader".to_string(),
                    version: 0,
                },
            ],
            content: Value::Dictionary(Dictionary {
                key_type: "String".to_string(),
                value_type: "Int32".to_string(),
                entries: vec![
                    DictEntry {
                        key: Value::String("zebra".to_string()),
                        value: Value::Int32(1),
                    },
                    DictEntry {
                        key: Value::String("apple".to_string()),
                        value: Value::Int32(2),
                    },
                ],
            }),
        };

        let bytes = container.encode(&StoreCodec).unwrap();
        let decoded = Container::decode(&bytes, &StoreCodec).unwrap();

        // Insertion order survives: "zebra" stays first.
        assert_eq!(decoded, container);
        let Value::Dictionary(dict) = &decoded.content else {
            panic!("expected dictionary root");
        };
        assert_eq!(dict.entries[0].key, Value::String("zebra".to_string()));

        let reencoded = decoded.encode(&StoreCodec).unwrap();
        assert_eq!(reencoded, bytes);
    }

    #[test]
    fn test_compressed_frame_roundtrip() {
        let container = Container {
            target: 'w',
            hi_def: true,
            compressed: true,
            readers: vec![ReaderEntry {
                type_name: "System.Int32".to_string(),
                version: 0,
            }],
            content: Value::Int32(-7),
        };

        let bytes = container.encode(&StoreCodec).unwrap();
        assert_eq!(bytes[5], FLAG_COMPRESSED | FLAG_HIDEF);

        // on_disk_size and decompressed_size bracket the stored body.
        let on_disk = u32::from_le_bytes(bytes[6..10].try_into().unwrap()) as usize;
        assert_eq!(on_disk, bytes.len());
        let decompressed_size = u32::from_le_bytes(bytes[10..14].try_into().unwrap()) as usize;
        assert_eq!(decompressed_size, bytes.len() - 14);

        let decoded = Container::decode(&bytes, &StoreCodec).unwrap();
        assert_eq!(decoded, container);
    }

    #[test]
    fn test_bad_version_is_fatal() {
        let mut bytes = int32_container(1);
        bytes[4] = 4;
        assert!(matches!(
            Container::decode(&bytes, &StoreCodec),
            Err(Error::UnsupportedVersion(4))
        ));
    }

    #[test]
    fn test_bad_magic_is_fatal() {
        let mut bytes = int32_container(1);
        bytes[0] = b'Y';
        assert!(matches!(
            Container::decode(&bytes, &StoreCodec),
            Err(Error::Common(xnbkit_common::Error::InvalidMagic { .. }))
        ));
    }

    #[test]
    fn test_nonzero_shared_resources_is_fatal() {
        let type_name = "System.Int32";
        let mut body = BinaryWriter::new();
        body.write_7bit_u32(1);
        body.write_7bit_u32(type_name.len() as u32);
        body.write_bytes(type_name.as_bytes());
        body.write_i32(0);
        body.write_7bit_u32(2); // shared resource count
        let body = body.into_inner();

        let mut out = BinaryWriter::new();
        out.write_bytes(b"XNB");
        out.write_u8(b'w');
        out.write_u8(5);
        out.write_u8(0);
        out.write_u32((10 + body.len()) as u32);
        out.write_bytes(&body);

        assert!(matches!(
            Container::decode(&out.into_inner(), &StoreCodec),
            Err(Error::SharedResources(2))
        ));
    }

    #[test]
    fn test_trailing_data_is_fatal() {
        let mut bytes = int32_container(42);
        bytes.push(0xAB);
        assert!(matches!(
            Container::decode(&bytes, &StoreCodec),
            Err(Error::TrailingData { remaining: 1 })
        ));
    }

    #[test]
    fn test_unsupported_type_is_skippable() {
        let type_name = "Some.Game.CustomReader";
        let mut body = BinaryWriter::new();
        body.write_7bit_u32(1);
        body.write_7bit_u32(type_name.len() as u32);
        body.write_bytes(type_name.as_bytes());
        body.write_i32(0);
        body.write_7bit_u32(0);
        let body = body.into_inner();

        let mut out = BinaryWriter::new();
        out.write_bytes(b"XNB");
        out.write_u8(b'w');
        out.write_u8(5);
        out.write_u8(0);
        out.write_u32((10 + body.len()) as u32);
        out.write_bytes(&body);

        let err = Container::decode(&out.into_inner(), &StoreCodec).unwrap_err();
        assert!(err.is_unsupported());
    }

    #[test]
    fn test_is_xnb() {
        assert!(Container::is_xnb(b"XNBw\x05..."));
        assert!(!Container::is_xnb(b"PNG"));
        assert!(!Container::is_xnb(b"XN"));
    }
}
