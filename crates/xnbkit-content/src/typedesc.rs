//! Type descriptor parsing.
//!
//! The per-file type table records engine-qualified reader names like
//!
//! ```text
//! Microsoft.Xna.Framework.Content.DictionaryReader`2[[System.String, mscorlib,
//! Version=4.0.0.0, ...],[System.Int32, mscorlib, ...]]
//! ```
//!
//! which normalize to the compact grammar `Dictionary<String,Int32>`. Both
//! forms are parsed here: [`TypeDescriptor::from_engine_name`] maps the
//! engine form through a fixed name table, [`TypeDescriptor::parse`] reads
//! the normalized form back (it is what the editable document stores).

use std::fmt;

use crate::{Error, Result};

/// A normalized type descriptor: a name plus ordered generic arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDescriptor {
    pub name: String,
    pub subtypes: Vec<TypeDescriptor>,
}

impl TypeDescriptor {
    /// Create a descriptor with no type arguments.
    pub fn simple(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            subtypes: Vec::new(),
        }
    }

    /// Normalize an engine-qualified type name.
    ///
    /// Handles the backtick-arity suffix, bracketed (possibly nested,
    /// possibly assembly-qualified) argument lists, and the `[]` array
    /// suffix. Names missing from the fixed table yield
    /// [`Error::UnsupportedType`], which batch drivers treat as skippable.
    pub fn from_engine_name(raw: &str) -> Result<Self> {
        let raw = raw.trim();

        // Base name is everything before the arity marker or the first
        // assembly-qualifying comma.
        let main = raw
            .split(['`', ','])
            .next()
            .unwrap_or_default()
            .trim();

        if let Some(element) = main.strip_suffix("[]") {
            return Ok(Self {
                name: "Array".to_string(),
                subtypes: vec![Self::from_engine_name(element)?],
            });
        }

        let (name, generic) = match main {
            "Microsoft.Xna.Framework.Content.DictionaryReader" => ("Dictionary", true),
            "Microsoft.Xna.Framework.Content.ArrayReader" => ("Array", true),
            "Microsoft.Xna.Framework.Content.ListReader" => ("List", true),
            "Microsoft.Xna.Framework.Content.NullableReader" => ("Nullable", true),
            "Microsoft.Xna.Framework.Content.Texture2DReader" => ("Texture2D", false),
            "Microsoft.Xna.Framework.Content.SpriteFontReader" => ("SpriteFont", false),
            "Microsoft.Xna.Framework.Content.Vector3Reader"
            | "Microsoft.Xna.Framework.Vector3" => ("Vector3", false),
            "Microsoft.Xna.Framework.Content.RectangleReader"
            | "Microsoft.Xna.Framework.Rectangle" => ("Rectangle", false),
            "Microsoft.Xna.Framework.Content.StringReader" | "System.String" => {
                ("String", false)
            }
            "Microsoft.Xna.Framework.Content.Int32Reader" | "System.Int32" => ("Int32", false),
            "Microsoft.Xna.Framework.Content.SingleReader" | "System.Single" => {
                ("Single", false)
            }
            "Microsoft.Xna.Framework.Content.CharReader" | "System.Char" => ("Char", false),
            "Microsoft.Xna.Framework.Content.BooleanReader" | "System.Boolean" => {
                ("Boolean", false)
            }
            "xTile.Pipeline.TideReader" => ("TBin", false),
            other => return Err(Error::UnsupportedType(other.to_string())),
        };

        let subtypes = if generic {
            parse_engine_subtypes(raw)?
        } else {
            Vec::new()
        };

        Ok(Self {
            name: name.to_string(),
            subtypes,
        })
    }

    /// Parse the normalized `Name<Sub,...>` grammar.
    ///
    /// Splitting on commas tracks `<`/`>` nesting depth, so
    /// `Dictionary<String,Array<Int32>>` yields exactly two subtypes.
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(Error::MalformedTypeName(s.to_string()));
        }

        let Some(lt) = s.find('<') else {
            if s.contains(['>', ',']) {
                return Err(Error::MalformedTypeName(s.to_string()));
            }
            return Ok(Self::simple(s));
        };

        if !s.ends_with('>') {
            return Err(Error::MalformedTypeName(s.to_string()));
        }

        let name = s[..lt].trim();
        let inner = &s[lt + 1..s.len() - 1];

        let mut subtypes = Vec::new();
        let mut depth = 0usize;
        let mut start = 0usize;
        for (i, b) in inner.bytes().enumerate() {
            match b {
                b'<' => depth += 1,
                b'>' => {
                    depth = depth
                        .checked_sub(1)
                        .ok_or_else(|| Error::MalformedTypeName(s.to_string()))?;
                }
                b',' if depth == 0 => {
                    subtypes.push(Self::parse(&inner[start..i])?);
                    start = i + 1;
                }
                _ => {}
            }
        }
        if depth != 0 {
            return Err(Error::MalformedTypeName(s.to_string()));
        }
        subtypes.push(Self::parse(&inner[start..])?);

        Ok(Self {
            name: name.to_string(),
            subtypes,
        })
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if !self.subtypes.is_empty() {
            f.write_str("<")?;
            for (i, sub) in self.subtypes.iter().enumerate() {
                if i > 0 {
                    f.write_str(",")?;
                }
                write!(f, "{sub}")?;
            }
            f.write_str(">")?;
        }
        Ok(())
    }
}

/// Extract and normalize the bracketed argument list of an engine name.
///
/// Nested brackets (each argument is itself bracketed, and may be generic)
/// must not cause a premature split, so arguments are collected by
/// tracking bracket depth and taking depth-0 groups only.
fn parse_engine_subtypes(raw: &str) -> Result<Vec<TypeDescriptor>> {
    let tick = raw
        .find('`')
        .ok_or_else(|| Error::MalformedTypeName(raw.to_string()))?;
    let rest = &raw[tick + 1..];

    let digits_end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    let arity: usize = rest[..digits_end]
        .parse()
        .map_err(|_| Error::MalformedTypeName(raw.to_string()))?;

    let args = rest[digits_end..].trim();
    let inner = args
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .ok_or_else(|| Error::MalformedTypeName(raw.to_string()))?;

    let mut subtypes = Vec::with_capacity(arity);
    let mut depth = 0usize;
    let mut start = 0usize;
    for (i, b) in inner.bytes().enumerate() {
        match b {
            b'[' => {
                if depth == 0 {
                    start = i + 1;
                }
                depth += 1;
            }
            b']' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| Error::MalformedTypeName(raw.to_string()))?;
                if depth == 0 {
                    subtypes.push(TypeDescriptor::from_engine_name(&inner[start..i])?);
                }
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(Error::MalformedTypeName(raw.to_string()));
    }

    if subtypes.len() != arity {
        return Err(Error::ArityMismatch {
            name: raw[..tick].to_string(),
            expected: arity,
            actual: subtypes.len(),
        });
    }

    Ok(subtypes)
}
