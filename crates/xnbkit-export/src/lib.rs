//! Externalization layer: turns a decoded [`Container`] into an editable
//! JSON document with bulky resources moved to sibling files, and back.
//!
//! Saving walks the value tree depth first. Every texture's pixels go to a
//! sibling PNG and every embedded tile map goes to a sibling `.tbin` (with
//! its tileset references rewritten to the extracted PNG names); the
//! emptied nodes stay in the tree and a manifest of what went where is
//! persisted inside the document itself.
//!
//! Loading replays the manifest: each record's tree path is re-resolved
//! against the (possibly edited) tree and the sibling file is read back in.
//! A manifest record whose file is gone aborts the load with
//! [`Error::MissingResource`].
//!
//! Sibling files are named `<document stem>.<tree path>.<ext>`, where the
//! tree path is dotted segments: dictionary key, sequence index, or struct
//! field name.

mod error;

pub use error::{Error, Result};

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use xnbkit_content::value::Value;
use xnbkit_content::Container;

/// Manifest record for an externalized texture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedImage {
    /// Dotted tree path of the texture node.
    pub path: String,
}

/// Manifest record for an externalized tile map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedMap {
    /// Dotted tree path of the tile map node.
    pub path: String,
    /// PNG file names the extracted map references.
    pub tilesheets: Vec<String>,
}

/// The on-disk JSON document: the container plus the extraction manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(flatten)]
    pub container: Container,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub extracted_images: Vec<ExtractedImage>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub extracted_maps: Vec<ExtractedMap>,
}

/// Externalize resources out of `container` and write the JSON document to
/// `json_path`, with sibling files next to it.
pub fn save_document(mut container: Container, json_path: &Path) -> Result<()> {
    let mut images = Vec::new();
    let mut maps = Vec::new();

    extract_node(&mut container.content, String::new(), json_path, &mut images, &mut maps)?;

    let document = Document {
        container,
        extracted_images: images,
        extracted_maps: maps,
    };
    fs::write(json_path, serde_json::to_vec_pretty(&document)?)?;
    Ok(())
}

/// Read the JSON document at `json_path` and re-inline every externalized
/// resource, yielding a container ready to encode.
pub fn load_document(json_path: &Path) -> Result<Container> {
    let document: Document = serde_json::from_slice(&fs::read(json_path)?)?;
    let Document {
        mut container,
        extracted_images,
        extracted_maps,
    } = document;

    for image in &extracted_images {
        load_image(&mut container.content, &image.path, json_path)?;
    }
    for map in &extracted_maps {
        load_map(&mut container.content, &map.path, json_path)?;
    }

    Ok(container)
}

/// Sibling file name for the resource at `tree_path`:
/// `<document stem>[.<tree path>].<ext>` in the document's directory.
fn resource_path(json_path: &Path, tree_path: &str, ext: &str) -> PathBuf {
    let stem = json_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = if tree_path.is_empty() {
        format!("{stem}.{ext}")
    } else {
        format!("{stem}.{tree_path}.{ext}")
    };
    json_path.with_file_name(name)
}

fn extract_node(
    value: &mut Value,
    path: String,
    json_path: &Path,
    images: &mut Vec<ExtractedImage>,
    maps: &mut Vec<ExtractedMap>,
) -> Result<()> {
    let join = |segment: &str| {
        if path.is_empty() {
            segment.to_string()
        } else {
            format!("{path}.{segment}")
        }
    };

    match value {
        Value::Texture2D(texture) => {
            if let Some(pixels) = texture.pixels.take() {
                let file = resource_path(json_path, &path, "png");
                let png = image::RgbaImage::from_raw(texture.width, texture.height, pixels)
                    .ok_or(Error::PixelShape {
                        width: texture.width,
                        height: texture.height,
                    })?;
                png.save(&file)?;
                images.push(ExtractedImage { path });
            }
        }
        Value::TBin(map) => {
            if let Some(data) = map.data.take() {
                let (rewritten, tilesheets) = xnbkit_tbin::externalize_tilesheets(&data)?;
                fs::write(resource_path(json_path, &path, "tbin"), rewritten)?;
                maps.push(ExtractedMap { path, tilesheets });
            }
        }
        Value::Nullable(nullable) => {
            if let Some(inner) = nullable.value.as_deref_mut() {
                extract_node(inner, join("value"), json_path, images, maps)?;
            }
        }
        Value::Array(seq) | Value::List(seq) => {
            for (i, item) in seq.items.iter_mut().enumerate() {
                extract_node(item, join(&i.to_string()), json_path, images, maps)?;
            }
        }
        Value::Dictionary(dict) => {
            for (i, entry) in dict.entries.iter_mut().enumerate() {
                let segment = key_segment(&entry.key).unwrap_or_else(|| i.to_string());
                extract_node(&mut entry.value, join(&segment), json_path, images, maps)?;
            }
        }
        Value::SpriteFont(font) => {
            for (name, field) in [
                ("texture", &mut font.texture),
                ("glyphs", &mut font.glyphs),
                ("cropping", &mut font.cropping),
                ("character_map", &mut font.character_map),
                ("kerning", &mut font.kerning),
            ] {
                extract_node(field, join(name), json_path, images, maps)?;
            }
        }
        _ => {}
    }
    Ok(())
}

fn load_image(content: &mut Value, tree_path: &str, json_path: &Path) -> Result<()> {
    let file = resource_path(json_path, tree_path, "png");
    let bytes = read_resource(&file)?;
    let png = image::load_from_memory(&bytes)?.into_rgba8();

    let Some(Value::Texture2D(texture)) = resolve_mut(content, tree_path) else {
        return Err(Error::PathNotFound(tree_path.to_string()));
    };

    texture.width = png.width();
    texture.height = png.height();
    texture.pixels = Some(png.into_raw());
    Ok(())
}

fn load_map(content: &mut Value, tree_path: &str, json_path: &Path) -> Result<()> {
    let file = resource_path(json_path, tree_path, "tbin");
    let bytes = read_resource(&file)?;
    let data = xnbkit_tbin::internalize_tilesheets(&bytes)?;

    let Some(Value::TBin(map)) = resolve_mut(content, tree_path) else {
        return Err(Error::PathNotFound(tree_path.to_string()));
    };

    map.data = Some(data);
    Ok(())
}

fn read_resource(file: &Path) -> Result<Vec<u8>> {
    match fs::read(file) {
        Ok(bytes) => Ok(bytes),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(Error::MissingResource(file.to_path_buf()))
        }
        Err(e) => Err(Error::Io(e)),
    }
}

/// Path segment for a dictionary key, when the key renders to a stable
/// scalar. Compound keys, and keys containing the `.` path separator,
/// fall back to the entry index.
fn key_segment(key: &Value) -> Option<String> {
    let segment = match key {
        Value::String(s) => s.clone(),
        Value::Int32(n) => n.to_string(),
        Value::Char(c) => c.to_string(),
        Value::Boolean(b) => b.to_string(),
        _ => return None,
    };
    if segment.contains('.') {
        return None;
    }
    Some(segment)
}

fn resolve_mut<'a>(root: &'a mut Value, tree_path: &str) -> Option<&'a mut Value> {
    let mut current = root;
    if tree_path.is_empty() {
        return Some(current);
    }
    for segment in tree_path.split('.') {
        current = match current {
            Value::Nullable(nullable) if segment == "value" => nullable.value.as_deref_mut()?,
            Value::Array(seq) | Value::List(seq) => {
                seq.items.get_mut(segment.parse::<usize>().ok()?)?
            }
            Value::Dictionary(dict) => {
                let by_key = dict
                    .entries
                    .iter()
                    .position(|e| key_segment(&e.key).as_deref() == Some(segment));
                let index = by_key.or_else(|| segment.parse::<usize>().ok())?;
                &mut dict.entries.get_mut(index)?.value
            }
            Value::SpriteFont(font) => match segment {
                "texture" => &mut font.texture,
                "glyphs" => &mut font.glyphs,
                "cropping" => &mut font.cropping,
                "character_map" => &mut font.character_map,
                "kerning" => &mut font.kerning,
                _ => return None,
            },
            _ => return None,
        };
    }
    Some(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use xnbkit_content::texture::{PixelFormat, Texture2D};
    use xnbkit_content::value::{DictEntry, Dictionary, TileMap};
    use xnbkit_content::ReaderEntry;

    fn container_with(content: Value) -> Container {
        Container {
            target: 'w',
            hi_def: false,
            compressed: false,
            readers: vec![ReaderEntry {
                type_name: "Microsoft.Xna.Framework.Content.Texture2DReader".to_string(),
                version: 0,
            }],
            content,
        }
    }

    fn checker_texture() -> Texture2D {
        let mut pixels = Vec::with_capacity(2 * 2 * 4);
        for i in 0..4u8 {
            pixels.extend_from_slice(&[i * 60, 255 - i * 60, 7, 255]);
        }
        Texture2D {
            format: PixelFormat::Color,
            width: 2,
            height: 2,
            pixels: Some(pixels),
        }
    }

    #[test]
    fn test_texture_extract_and_reload_is_exact() {
        let dir = tempfile::tempdir().unwrap();
        let json = dir.path().join("portrait.json");

        let container = container_with(Value::Texture2D(checker_texture()));
        save_document(container.clone(), &json).unwrap();

        assert!(dir.path().join("portrait.png").exists());

        // The stored document carries no pixels, only the manifest.
        let doc: Document = serde_json::from_slice(&fs::read(&json).unwrap()).unwrap();
        assert_eq!(doc.extracted_images.len(), 1);
        assert_eq!(doc.extracted_images[0].path, "");
        let Value::Texture2D(stored) = &doc.container.content else {
            panic!("expected texture root");
        };
        assert!(stored.pixels.is_none());

        let reloaded = load_document(&json).unwrap();
        assert_eq!(reloaded, container);
    }

    #[test]
    fn test_nested_texture_paths_use_dictionary_keys() {
        let dir = tempfile::tempdir().unwrap();
        let json = dir.path().join("sheet.json");

        let container = container_with(Value::Dictionary(Dictionary {
            key_type: "String".to_string(),
            value_type: "Texture2D".to_string(),
            entries: vec![DictEntry {
                key: Value::String("hero".to_string()),
                value: Value::Texture2D(checker_texture()),
            }],
        }));
        save_document(container.clone(), &json).unwrap();

        assert!(dir.path().join("sheet.hero.png").exists());
        assert_eq!(load_document(&json).unwrap(), container);
    }

    #[test]
    fn test_dotted_dictionary_key_falls_back_to_entry_index() {
        // A `.` inside a key would be ambiguous in the dotted path, so
        // the segment must be the entry index for the round trip to hold.
        let dir = tempfile::tempdir().unwrap();
        let json = dir.path().join("sheet.json");

        let container = container_with(Value::Dictionary(Dictionary {
            key_type: "String".to_string(),
            value_type: "Texture2D".to_string(),
            entries: vec![DictEntry {
                key: Value::String("hero.idle".to_string()),
                value: Value::Texture2D(checker_texture()),
            }],
        }));
        save_document(container.clone(), &json).unwrap();

        assert!(dir.path().join("sheet.0.png").exists());
        assert_eq!(load_document(&json).unwrap(), container);
    }

    #[test]
    fn test_map_extract_rewrites_tilesheets() {
        let dir = tempfile::tempdir().unwrap();
        let json = dir.path().join("town.json");

        // Minimal map: header, two strings, empty properties, one tileset.
        let mut map = Vec::new();
        map.extend_from_slice(b"tBIN10");
        for s in ["Town", ""] {
            map.extend_from_slice(&(s.len() as i32).to_le_bytes());
            map.extend_from_slice(s.as_bytes());
        }
        map.extend_from_slice(&0i32.to_le_bytes()); // map properties
        map.extend_from_slice(&1i32.to_le_bytes()); // tilesets
        for s in ["ts", "", "townsheet"] {
            map.extend_from_slice(&(s.len() as i32).to_le_bytes());
            map.extend_from_slice(s.as_bytes());
        }
        map.extend_from_slice(&[0u8; 32]); // geometry
        map.extend_from_slice(&0i32.to_le_bytes()); // tileset properties
        map.extend_from_slice(&[1, 2, 3]); // opaque tail

        let container = container_with(Value::TBin(TileMap {
            data: Some(map.clone()),
        }));
        save_document(container.clone(), &json).unwrap();

        let doc: Document = serde_json::from_slice(&fs::read(&json).unwrap()).unwrap();
        assert_eq!(
            doc.extracted_maps[0].tilesheets,
            vec!["townsheet.png".to_string()]
        );

        let extracted = fs::read(dir.path().join("town.tbin")).unwrap();
        assert_ne!(extracted, map); // image source rewritten

        let reloaded = load_document(&json).unwrap();
        assert_eq!(reloaded, container);
    }

    #[test]
    fn test_missing_resource_file_aborts_load() {
        let dir = tempfile::tempdir().unwrap();
        let json = dir.path().join("portrait.json");

        save_document(container_with(Value::Texture2D(checker_texture())), &json).unwrap();
        fs::remove_file(dir.path().join("portrait.png")).unwrap();

        let err = load_document(&json).unwrap_err();
        assert!(matches!(err, Error::MissingResource(_)));
    }

    #[test]
    fn test_document_without_manifest_loads_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let json = dir.path().join("num.json");

        let container = container_with(Value::Int32(9));
        fs::write(
            &json,
            serde_json::to_vec(&Document {
                container: container.clone(),
                extracted_images: Vec::new(),
                extracted_maps: Vec::new(),
            })
            .unwrap(),
        )
        .unwrap();

        assert_eq!(load_document(&json).unwrap(), container);
    }
}
