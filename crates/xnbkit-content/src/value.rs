//! The decoded, editable in-memory representation of a container's root
//! object graph.
//!
//! [`Value`] is a tagged union serialized as `{type, data}` pairs, which is
//! the shape the editable JSON document exposes. Container variants carry
//! their element descriptor names so the encoder can reconstruct the full
//! generic type name of any node from tree metadata alone, never from
//! content.

use serde::{Deserialize, Serialize};

use crate::texture::Texture2D;

/// A single node of the value tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Value {
    Int32(i32),
    Boolean(bool),
    Char(char),
    String(String),
    Single(f32),
    Vector3(Vector3),
    Rectangle(Rectangle),
    Nullable(Nullable),
    Array(Sequence),
    List(Sequence),
    Dictionary(Dictionary),
    Texture2D(Texture2D),
    TBin(TileMap),
    SpriteFont(Box<SpriteFont>),
    /// A null reference (table index 0 on the wire).
    Null,
}

/// A three-component float vector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// An integer rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rectangle {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

/// A `Nullable<T>` value: presence flag plus optional payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Nullable {
    /// Descriptor name of the wrapped type.
    pub inner_type: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub value: Option<Box<Value>>,
}

/// Backing storage for both `Array<T>` and `List<T>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sequence {
    /// Descriptor name of the element type.
    pub element_type: String,
    pub items: Vec<Value>,
}

/// An insertion-ordered `Dictionary<K,V>`.
///
/// Entries are an ordered list, not a hash map: the wire format has no
/// canonical ordering, so re-encoding must emit entries in the order they
/// were decoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dictionary {
    pub key_type: String,
    pub value_type: String,
    pub entries: Vec<DictEntry>,
}

/// One key/value pair of a [`Dictionary`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DictEntry {
    pub key: Value,
    pub value: Value,
}

/// An embedded tile map, carried as an opaque byte buffer.
///
/// Only tileset image-source strings inside the buffer are addressable
/// (see the `xnbkit-tbin` crate); everything else is pass-through. `data`
/// is `None` while the map is externalized to a sibling file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileMap {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub data: Option<Vec<u8>>,
}

/// A decoded sprite font.
///
/// The texture, glyph/cropping rectangles, character map and kerning all
/// dispatch through the resolver; only the spacing scalars and the default
/// character are inlined on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpriteFont {
    pub texture: Value,
    pub glyphs: Value,
    pub cropping: Value,
    pub character_map: Value,
    pub vertical_spacing: i32,
    pub horizontal_spacing: f32,
    pub kerning: Value,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub default_character: Option<char>,
}

impl Value {
    /// Whether this node is a null reference.
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The full normalized descriptor name of this node, composed from the
    /// metadata the node carries.
    ///
    /// This is the key used to look up the node's codec (and its table
    /// index) at encode time.
    pub fn type_name(&self) -> String {
        match self {
            Value::Int32(_) => "Int32".to_string(),
            Value::Boolean(_) => "Boolean".to_string(),
            Value::Char(_) => "Char".to_string(),
            Value::String(_) => "String".to_string(),
            Value::Single(_) => "Single".to_string(),
            Value::Vector3(_) => "Vector3".to_string(),
            Value::Rectangle(_) => "Rectangle".to_string(),
            Value::Nullable(n) => format!("Nullable<{}>", n.inner_type),
            Value::Array(s) => format!("Array<{}>", s.element_type),
            Value::List(s) => format!("List<{}>", s.element_type),
            Value::Dictionary(d) => format!("Dictionary<{},{}>", d.key_type, d.value_type),
            Value::Texture2D(_) => "Texture2D".to_string(),
            Value::TBin(_) => "TBin".to_string(),
            Value::SpriteFont(_) => "SpriteFont".to_string(),
            Value::Null => "Null".to_string(),
        }
    }
}
