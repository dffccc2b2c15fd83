//! Codec registry and reader/writer resolver.
//!
//! Every format type gets one [`Codec`] variant pairing its decoder and
//! encoder. The open-ended reflection dispatch of the original engine is
//! replaced by this closed sum type: a [`TypeRegistry`] is built once per
//! file from the ordered reader table, and every nested value routes either
//! inline (value types) or through a 1-based table index (reference types,
//! index 0 meaning a null reference).

use xnbkit_common::{BinaryReader, BinaryWriter};

use crate::container::ReaderEntry;
use crate::texture;
use crate::typedesc::TypeDescriptor;
use crate::value::{
    DictEntry, Dictionary, Nullable, Rectangle, Sequence, SpriteFont, TileMap, Value, Vector3,
};
use crate::{Error, Result};

/// A paired decoder/encoder for one format type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Codec {
    Int32,
    Boolean,
    Char,
    String,
    Single,
    Vector3,
    Rectangle,
    Nullable(Box<Codec>),
    Array(Box<Codec>),
    List(Box<Codec>),
    Dictionary(Box<Codec>, Box<Codec>),
    Texture2D,
    TBin,
    SpriteFont,
}

impl Codec {
    /// Resolve a normalized type descriptor to its codec.
    pub fn from_descriptor(desc: &TypeDescriptor) -> Result<Self> {
        let arity = |expected: usize| -> Result<()> {
            if desc.subtypes.len() == expected {
                Ok(())
            } else {
                Err(Error::ArityMismatch {
                    name: desc.name.clone(),
                    expected,
                    actual: desc.subtypes.len(),
                })
            }
        };

        match desc.name.as_str() {
            "Int32" => arity(0).map(|_| Codec::Int32),
            "Boolean" => arity(0).map(|_| Codec::Boolean),
            "Char" => arity(0).map(|_| Codec::Char),
            "String" => arity(0).map(|_| Codec::String),
            "Single" => arity(0).map(|_| Codec::Single),
            "Vector3" => arity(0).map(|_| Codec::Vector3),
            "Rectangle" => arity(0).map(|_| Codec::Rectangle),
            "Texture2D" => arity(0).map(|_| Codec::Texture2D),
            "TBin" => arity(0).map(|_| Codec::TBin),
            "SpriteFont" => arity(0).map(|_| Codec::SpriteFont),
            "Nullable" => {
                arity(1)?;
                Ok(Codec::Nullable(Box::new(Self::from_descriptor(
                    &desc.subtypes[0],
                )?)))
            }
            "Array" => {
                arity(1)?;
                Ok(Codec::Array(Box::new(Self::from_descriptor(
                    &desc.subtypes[0],
                )?)))
            }
            "List" => {
                arity(1)?;
                Ok(Codec::List(Box::new(Self::from_descriptor(
                    &desc.subtypes[0],
                )?)))
            }
            "Dictionary" => {
                arity(2)?;
                Ok(Codec::Dictionary(
                    Box::new(Self::from_descriptor(&desc.subtypes[0])?),
                    Box::new(Self::from_descriptor(&desc.subtypes[1])?),
                ))
            }
            _ => Err(Error::UnsupportedType(desc.to_string())),
        }
    }

    /// Whether values of this codec are inlined directly (value types) or
    /// dispatched through a table index (reference types).
    ///
    /// This is a property of the format, not of any particular node.
    pub fn is_value_type(&self) -> bool {
        !matches!(
            self,
            Codec::String
                | Codec::Array(_)
                | Codec::List(_)
                | Codec::Dictionary(..)
                | Codec::Texture2D
                | Codec::TBin
                | Codec::SpriteFont
        )
    }

    /// The canonical normalized descriptor name of this codec.
    pub fn type_name(&self) -> String {
        match self {
            Codec::Int32 => "Int32".to_string(),
            Codec::Boolean => "Boolean".to_string(),
            Codec::Char => "Char".to_string(),
            Codec::String => "String".to_string(),
            Codec::Single => "Single".to_string(),
            Codec::Vector3 => "Vector3".to_string(),
            Codec::Rectangle => "Rectangle".to_string(),
            Codec::Nullable(e) => format!("Nullable<{}>", e.type_name()),
            Codec::Array(e) => format!("Array<{}>", e.type_name()),
            Codec::List(e) => format!("List<{}>", e.type_name()),
            Codec::Dictionary(k, v) => {
                format!("Dictionary<{},{}>", k.type_name(), v.type_name())
            }
            Codec::Texture2D => "Texture2D".to_string(),
            Codec::TBin => "TBin".to_string(),
            Codec::SpriteFont => "SpriteFont".to_string(),
        }
    }

    /// Decode one value of this codec's type.
    pub fn decode(&self, r: &mut BinaryReader<'_>, registry: &TypeRegistry) -> Result<Value> {
        Ok(match self {
            Codec::Int32 => Value::Int32(r.read_i32()?),
            Codec::Boolean => Value::Boolean(r.read_bool()?),
            Codec::Char => Value::Char(read_char(r)?),
            Codec::String => Value::String(read_string(r)?),
            Codec::Single => Value::Single(r.read_f32()?),
            Codec::Vector3 => Value::Vector3(Vector3 {
                x: r.read_f32()?,
                y: r.read_f32()?,
                z: r.read_f32()?,
            }),
            Codec::Rectangle => Value::Rectangle(Rectangle {
                x: r.read_i32()?,
                y: r.read_i32()?,
                width: r.read_i32()?,
                height: r.read_i32()?,
            }),
            Codec::Nullable(elem) => {
                let value = if r.read_bool()? {
                    Some(Box::new(decode_element(elem, r, registry)?))
                } else {
                    None
                };
                Value::Nullable(Nullable {
                    inner_type: elem.type_name(),
                    value,
                })
            }
            Codec::Array(elem) | Codec::List(elem) => {
                let count = r.read_u32()?;
                let mut items = Vec::with_capacity(count as usize);
                for _ in 0..count {
                    items.push(decode_element(elem, r, registry)?);
                }
                let seq = Sequence {
                    element_type: elem.type_name(),
                    items,
                };
                if matches!(self, Codec::Array(_)) {
                    Value::Array(seq)
                } else {
                    Value::List(seq)
                }
            }
            Codec::Dictionary(key, value) => {
                let count = r.read_u32()?;
                let mut entries = Vec::with_capacity(count as usize);
                for _ in 0..count {
                    entries.push(DictEntry {
                        key: decode_element(key, r, registry)?,
                        value: decode_element(value, r, registry)?,
                    });
                }
                Value::Dictionary(Dictionary {
                    key_type: key.type_name(),
                    value_type: value.type_name(),
                    entries,
                })
            }
            Codec::Texture2D => Value::Texture2D(texture::decode(r)?),
            Codec::TBin => {
                let length = r.read_i32()?;
                if length < 0 {
                    return Err(Error::NegativeLength(length));
                }
                Value::TBin(TileMap {
                    data: Some(r.read_bytes(length as usize)?.to_vec()),
                })
            }
            Codec::SpriteFont => Value::SpriteFont(Box::new(SpriteFont {
                texture: registry.read_value(r)?,
                glyphs: registry.read_value(r)?,
                cropping: registry.read_value(r)?,
                character_map: registry.read_value(r)?,
                vertical_spacing: r.read_i32()?,
                horizontal_spacing: r.read_f32()?,
                kerning: registry.read_value(r)?,
                default_character: if r.read_bool()? {
                    Some(read_char(r)?)
                } else {
                    None
                },
            })),
        })
    }

    /// Encode one value of this codec's type.
    pub fn encode(&self, w: &mut BinaryWriter, value: &Value, registry: &TypeRegistry) -> Result<()> {
        match (self, value) {
            (Codec::Int32, Value::Int32(v)) => w.write_i32(*v),
            (Codec::Boolean, Value::Boolean(v)) => w.write_bool(*v),
            (Codec::Char, Value::Char(v)) => write_char(w, *v),
            (Codec::String, Value::String(v)) => write_string(w, v),
            (Codec::Single, Value::Single(v)) => w.write_f32(*v),
            (Codec::Vector3, Value::Vector3(v)) => {
                w.write_f32(v.x);
                w.write_f32(v.y);
                w.write_f32(v.z);
            }
            (Codec::Rectangle, Value::Rectangle(v)) => {
                w.write_i32(v.x);
                w.write_i32(v.y);
                w.write_i32(v.width);
                w.write_i32(v.height);
            }
            (Codec::Nullable(elem), Value::Nullable(n)) => match &n.value {
                Some(inner) => {
                    w.write_bool(true);
                    encode_element(elem, w, inner, registry)?;
                }
                None => w.write_bool(false),
            },
            (Codec::Array(elem), Value::Array(seq)) | (Codec::List(elem), Value::List(seq)) => {
                w.write_u32(seq.items.len() as u32);
                for item in &seq.items {
                    encode_element(elem, w, item, registry)?;
                }
            }
            (Codec::Dictionary(key, value), Value::Dictionary(dict)) => {
                w.write_u32(dict.entries.len() as u32);
                for entry in &dict.entries {
                    encode_element(key, w, &entry.key, registry)?;
                    encode_element(value, w, &entry.value, registry)?;
                }
            }
            (Codec::Texture2D, Value::Texture2D(tex)) => texture::encode(w, tex)?,
            (Codec::TBin, Value::TBin(map)) => {
                let data = map.data.as_ref().ok_or(Error::MissingMapData)?;
                w.write_i32(data.len() as i32);
                w.write_bytes(data);
            }
            (Codec::SpriteFont, Value::SpriteFont(font)) => {
                registry.write_value(w, &font.texture)?;
                registry.write_value(w, &font.glyphs)?;
                registry.write_value(w, &font.cropping)?;
                registry.write_value(w, &font.character_map)?;
                w.write_i32(font.vertical_spacing);
                w.write_f32(font.horizontal_spacing);
                registry.write_value(w, &font.kerning)?;
                match font.default_character {
                    Some(c) => {
                        w.write_bool(true);
                        write_char(w, c);
                    }
                    None => w.write_bool(false),
                }
            }
            (codec, value) => {
                return Err(Error::TypeMismatch {
                    expected: codec.type_name(),
                    actual: value.type_name(),
                })
            }
        }
        Ok(())
    }
}

/// Decode a nested element: inline for value types, resolver dispatch
/// (index-prefixed) for reference types. The choice follows the element's
/// own codec, never the container's.
fn decode_element(
    elem: &Codec,
    r: &mut BinaryReader<'_>,
    registry: &TypeRegistry,
) -> Result<Value> {
    if elem.is_value_type() {
        elem.decode(r, registry)
    } else {
        registry.read_value(r)
    }
}

/// Encode a nested element, mirroring [`decode_element`].
fn encode_element(
    elem: &Codec,
    w: &mut BinaryWriter,
    value: &Value,
    registry: &TypeRegistry,
) -> Result<()> {
    if elem.is_value_type() {
        elem.encode(w, value, registry)
    } else {
        registry.write_value(w, value)
    }
}

/// Read a length-prefixed UTF-8 string (7-bit encoded byte length).
pub fn read_string(r: &mut BinaryReader<'_>) -> Result<String> {
    let length = r.read_7bit_u32()? as usize;
    let bytes = r.read_bytes(length)?;
    let s = std::str::from_utf8(bytes).map_err(xnbkit_common::Error::from)?;
    Ok(s.to_string())
}

/// Write a length-prefixed UTF-8 string.
pub fn write_string(w: &mut BinaryWriter, s: &str) {
    w.write_7bit_u32(s.len() as u32);
    w.write_bytes(s.as_bytes());
}

/// Read a single UTF-8 encoded character.
fn read_char(r: &mut BinaryReader<'_>) -> Result<char> {
    let first = r.read_u8()?;
    let len = match first {
        0x00..=0x7F => 1,
        0xC0..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF7 => 4,
        _ => return Err(Error::InvalidChar),
    };

    let mut buf = [first, 0, 0, 0];
    for slot in buf.iter_mut().take(len).skip(1) {
        *slot = r.read_u8()?;
    }

    let s = std::str::from_utf8(&buf[..len]).map_err(|_| Error::InvalidChar)?;
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(Error::InvalidChar),
    }
}

/// Write a character as UTF-8.
fn write_char(w: &mut BinaryWriter, c: char) {
    let mut buf = [0u8; 4];
    w.write_bytes(c.encode_utf8(&mut buf).as_bytes());
}

/// Per-file dispatcher over the ordered type table.
///
/// The table order defines the 1-based index space used by reference-type
/// dispatch for the lifetime of one file; building the registry from the
/// same table on decode and encode guarantees stable round-trip ordering.
#[derive(Debug)]
pub struct TypeRegistry {
    entries: Vec<RegistryEntry>,
}

#[derive(Debug)]
struct RegistryEntry {
    type_name: String,
    codec: Codec,
}

impl TypeRegistry {
    /// Build a registry from the reader table, in table order.
    pub fn from_entries(readers: &[ReaderEntry]) -> Result<Self> {
        let mut entries = Vec::with_capacity(readers.len());
        for reader in readers {
            let desc = TypeDescriptor::from_engine_name(&reader.type_name)?;
            let codec = Codec::from_descriptor(&desc)?;
            entries.push(RegistryEntry {
                type_name: desc.to_string(),
                codec,
            });
        }
        Ok(Self { entries })
    }

    /// Number of table entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Read an index-prefixed value: the 1-based table index selects the
    /// codec, index 0 is a null reference.
    pub fn read_value(&self, r: &mut BinaryReader<'_>) -> Result<Value> {
        let index = r.read_7bit_u32()?;
        if index == 0 {
            return Ok(Value::Null);
        }
        let entry = self
            .entries
            .get(index as usize - 1)
            .ok_or(Error::ReaderIndexOutOfRange {
                index,
                count: self.entries.len(),
            })?;
        entry.codec.decode(r, self)
    }

    /// Write an index-prefixed value.
    ///
    /// The index is looked up by the node's recorded type name. It is
    /// always written here - the root slot and every reference-type slot
    /// carry an index on the wire; value-type elements never reach this
    /// method because containers inline them directly.
    pub fn write_value(&self, w: &mut BinaryWriter, value: &Value) -> Result<()> {
        if value.is_null() {
            w.write_7bit_u32(0);
            return Ok(());
        }

        let name = value.type_name();
        let (index, entry) = self
            .entries
            .iter()
            .enumerate()
            .find(|(_, e)| e.type_name == name)
            .ok_or_else(|| Error::TypeNotInTable(name.clone()))?;

        w.write_7bit_u32(index as u32 + 1);
        entry.codec.encode(w, value, self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry_of(names: &[&str]) -> TypeRegistry {
        let readers: Vec<ReaderEntry> = names
            .iter()
            .map(|n| ReaderEntry {
                type_name: n.to_string(),
                version: 0,
            })
            .collect();
        TypeRegistry::from_entries(&readers).unwrap()
    }

    #[test]
    fn test_value_type_classification() {
        assert!(Codec::Int32.is_value_type());
        assert!(Codec::Boolean.is_value_type());
        assert!(Codec::Char.is_value_type());
        assert!(Codec::Single.is_value_type());
        assert!(Codec::Vector3.is_value_type());
        assert!(Codec::Rectangle.is_value_type());
        assert!(Codec::Nullable(Box::new(Codec::Char)).is_value_type());

        assert!(!Codec::String.is_value_type());
        assert!(!Codec::Texture2D.is_value_type());
        assert!(!Codec::TBin.is_value_type());
        assert!(!Codec::SpriteFont.is_value_type());
        assert!(!Codec::Array(Box::new(Codec::Int32)).is_value_type());
        assert!(!Codec::List(Box::new(Codec::Int32)).is_value_type());
        assert!(!Codec::Dictionary(Box::new(Codec::String), Box::new(Codec::Int32)).is_value_type());
    }

    #[test]
    fn test_null_reference_roundtrip() {
        let registry = registry_of(&["System.String"]);

        let mut w = BinaryWriter::new();
        registry.write_value(&mut w, &Value::Null).unwrap();
        let bytes = w.into_inner();
        assert_eq!(bytes, vec![0x00]);

        let mut r = BinaryReader::new(&bytes);
        assert_eq!(registry.read_value(&mut r).unwrap(), Value::Null);
    }

    #[test]
    fn test_index_out_of_range() {
        let registry = registry_of(&["System.Int32"]);
        let mut r = BinaryReader::new(&[0x05]);
        assert!(matches!(
            registry.read_value(&mut r),
            Err(Error::ReaderIndexOutOfRange { index: 5, count: 1 })
        ));
    }

    #[test]
    fn test_type_not_in_table() {
        let registry = registry_of(&["System.Int32"]);
        let mut w = BinaryWriter::new();
        let err = registry
            .write_value(&mut w, &Value::String("hi".to_string()))
            .unwrap_err();
        assert!(matches!(err, Error::TypeNotInTable(name) if name == "String"));
    }

    #[test]
    fn test_char_roundtrip() {
        for c in ['a', 'é', 'あ', '🦀'] {
            let mut w = BinaryWriter::new();
            write_char(&mut w, c);
            let bytes = w.into_inner();
            assert_eq!(bytes.len(), c.len_utf8());
            let mut r = BinaryReader::new(&bytes);
            assert_eq!(read_char(&mut r).unwrap(), c);
        }
    }

    #[test]
    fn test_char_rejects_continuation_byte() {
        let mut r = BinaryReader::new(&[0x80]);
        assert!(matches!(read_char(&mut r), Err(Error::InvalidChar)));
    }

    #[test]
    fn test_string_roundtrip() {
        let long = "x".repeat(200); // two-byte varint length
        for s in ["", "hello", "héllo wörld", long.as_str()] {
            let mut w = BinaryWriter::new();
            write_string(&mut w, s);
            let bytes = w.into_inner();
            let mut r = BinaryReader::new(&bytes);
            assert_eq!(read_string(&mut r).unwrap(), s);
            assert!(r.is_empty());
        }
    }

    #[test]
    fn test_nested_container_dispatch() {
        // List<String>: elements are reference types, so each element is
        // index-prefixed while the list itself is dispatched by the root.
        let raw = "Microsoft.Xna.Framework.Content.ListReader`1[[System.String, mscorlib]]";
        let registry = registry_of(&[raw, "System.String"]);

        let list = Value::List(Sequence {
            element_type: "String".to_string(),
            items: vec![
                Value::String("a".to_string()),
                Value::Null,
                Value::String("b".to_string()),
            ],
        });

        let mut w = BinaryWriter::new();
        registry.write_value(&mut w, &list).unwrap();
        let bytes = w.into_inner();

        // index 1 (List), count 3, then: index 2 + "a", index 0, index 2 + "b"
        assert_eq!(
            bytes,
            vec![0x01, 0x03, 0x00, 0x00, 0x00, 0x02, 0x01, b'a', 0x00, 0x02, 0x01, b'b']
        );

        let mut r = BinaryReader::new(&bytes);
        assert_eq!(registry.read_value(&mut r).unwrap(), list);
        assert!(r.is_empty());
    }

    #[test]
    fn test_value_type_elements_are_inlined() {
        // Array<Int32>: elements are value types, no per-element index.
        let raw = "Microsoft.Xna.Framework.Content.ArrayReader`1[[System.Int32, mscorlib]]";
        let registry = registry_of(&[raw, "System.Int32"]);

        let array = Value::Array(Sequence {
            element_type: "Int32".to_string(),
            items: vec![Value::Int32(1), Value::Int32(2)],
        });

        let mut w = BinaryWriter::new();
        registry.write_value(&mut w, &array).unwrap();
        let bytes = w.into_inner();
        assert_eq!(
            bytes,
            vec![0x01, 0x02, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x02, 0x00, 0x00, 0x00]
        );

        let mut r = BinaryReader::new(&bytes);
        assert_eq!(registry.read_value(&mut r).unwrap(), array);
    }
}
