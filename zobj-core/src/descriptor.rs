//! Structural description of an object: names, kinds and shapes, no bytes.
//!
//! The descriptor is what gets checked in next to a ROM dump. Replaying it
//! rebuilds the entry layout; [`ZObject::load`] then fills in the contents.

use serde::{Deserialize, Serialize};

use crate::entry::{Entry, EntryKind, ObjectEntry, TextureEntry};
use crate::error::{segment_size, ObjectError, Result};
use crate::format::{TextureFormat, Vertex, VERTEX_SIZE};
use crate::object::ZObject;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryRecord {
    pub name: String,
    /// Kept as a string so an unrecognized kind is reported by name.
    pub entry_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vertex_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tlut: Option<String>,
}

impl EntryRecord {
    fn bare(entry: &Entry) -> Self {
        Self {
            name: entry.name().to_string(),
            entry_type: entry.kind().to_string(),
            size: None,
            vertex_count: None,
            width: None,
            height: None,
            format: None,
            tlut: None,
        }
    }

    pub fn from_entry(entry: &Entry) -> Self {
        let record = Self::bare(entry);
        match entry {
            Entry::DList(_) | Entry::Unknown(_) => Self {
                size: Some(entry.size()),
                ..record
            },
            Entry::Vertex(vertices) => Self {
                vertex_count: Some(vertices.count() as u32),
                ..record
            },
            Entry::Texture(texture) => Self {
                width: Some(texture.width()),
                height: Some(texture.height()),
                format: Some(texture.format().to_string()),
                tlut: texture.palette().map(str::to_string),
                ..record
            },
        }
    }

    fn require(&self, value: Option<u32>, field: &'static str) -> Result<u32> {
        value.ok_or_else(|| ObjectError::MissingField {
            name: self.name.clone(),
            field,
        })
    }

    /// Materializes a zero-filled entry of the described shape.
    pub fn to_entry(&self) -> Result<Entry> {
        let kind: EntryKind = self.entry_type.parse()?;
        match kind {
            EntryKind::DList => {
                let size = self.require(self.size, "size")?;
                Entry::dlist(&self.name, vec![0; size as usize])
            }
            EntryKind::Unknown => {
                let size = self.require(self.size, "size")?;
                Entry::unknown(&self.name, vec![0; size as usize])
            }
            EntryKind::Vertex => {
                let count = self.require(self.vertex_count, "vertexCount")?;
                segment_size(count as u64 * VERTEX_SIZE as u64)?;
                Entry::vertices(&self.name, vec![Vertex::default(); count as usize])
            }
            EntryKind::Texture => {
                let width = self.require(self.width, "width")?;
                let height = self.require(self.height, "height")?;
                let format: TextureFormat = self
                    .format
                    .as_deref()
                    .ok_or_else(|| ObjectError::MissingField {
                        name: self.name.clone(),
                        field: "format",
                    })?
                    .parse()?;
                let texture = TextureEntry::new(&self.name, width, height, format)?
                    .with_palette(self.tlut.as_deref());
                Ok(Entry::texture(texture))
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Descriptor {
    pub entries: Vec<EntryRecord>,
}

impl Descriptor {
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }
}

impl ZObject {
    pub fn to_descriptor(&self) -> Descriptor {
        Descriptor {
            entries: self.entries().iter().map(EntryRecord::from_entry).collect(),
        }
    }

    /// Replays a descriptor through the normal insertion path, then resolves
    /// palette names once every entry exists.
    pub fn from_descriptor(descriptor: &Descriptor) -> Result<Self> {
        let mut obj = ZObject::new();
        for record in &descriptor.entries {
            obj.insert(record.to_entry()?, None)?;
        }

        for entry in obj.entries() {
            let Some(texture) = entry.as_texture() else {
                continue;
            };
            let Some(palette) = texture.palette() else {
                continue;
            };
            let resolved = obj
                .find(palette)
                .and_then(|index| obj.entries()[index].as_texture());
            if resolved.is_none() {
                return Err(ObjectError::PaletteReferenceNotFound {
                    texture: texture.name().to_string(),
                    palette: palette.to_string(),
                });
            }
        }

        Ok(obj)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn record(name: &str, entry_type: &str) -> EntryRecord {
        EntryRecord {
            name: name.to_string(),
            entry_type: entry_type.to_string(),
            size: None,
            vertex_count: None,
            width: None,
            height: None,
            format: None,
            tlut: None,
        }
    }

    #[test]
    fn records_carry_kind_specific_fields() {
        let mut obj = ZObject::new();
        obj.add_dlist("gfx", vec![0; 8], None).unwrap();
        obj.add_vertices("vtx", vec![Vertex::default(); 3], None).unwrap();
        let tex = TextureEntry::new("tex", 8, 4, TextureFormat::Ci8)
            .unwrap()
            .with_palette(Some("pal"));
        obj.add_texture(tex, None).unwrap();

        let descriptor = obj.to_descriptor();
        assert_eq!(
            descriptor.entries[0],
            EntryRecord {
                size: Some(8),
                ..record("gfx", "DList")
            }
        );
        assert_eq!(
            descriptor.entries[1],
            EntryRecord {
                vertex_count: Some(3),
                ..record("vtx", "Vertex")
            }
        );
        assert_eq!(
            descriptor.entries[2],
            EntryRecord {
                width: Some(8),
                height: Some(4),
                format: Some("ci8".to_string()),
                tlut: Some("pal".to_string()),
                ..record("tex", "Texture")
            }
        );
    }

    #[test]
    fn yaml_uses_descriptor_field_names() {
        let descriptor = Descriptor {
            entries: vec![EntryRecord {
                vertex_count: Some(2),
                ..record("vtx", "Vertex")
            }],
        };
        let yaml = descriptor.to_yaml().unwrap();
        assert!(yaml.contains("entryType: Vertex"));
        assert!(yaml.contains("vertexCount: 2"));
        assert!(!yaml.contains("tlut"));
        assert_eq!(Descriptor::from_yaml(&yaml).unwrap(), descriptor);
    }

    #[test]
    fn forward_palette_reference_resolves() {
        let yaml = r#"
entries:
  - name: skin
    entryType: Texture
    width: 16
    height: 16
    format: ci4
    tlut: skin_pal
  - name: skin_pal
    entryType: Texture
    width: 16
    height: 1
    format: rgba16
"#;
        let descriptor = Descriptor::from_yaml(yaml).unwrap();
        let obj = ZObject::from_descriptor(&descriptor).unwrap();
        assert_eq!(obj.len(), 2);
        assert_eq!(obj.total_size(), 0x80 + 0x20);
        assert_eq!(obj.palette_of(0).unwrap().name(), "skin_pal");
        assert_eq!(obj.to_descriptor(), descriptor);
    }

    #[test]
    fn missing_palette_is_reported() {
        let descriptor = Descriptor {
            entries: vec![EntryRecord {
                width: Some(4),
                height: Some(4),
                format: Some("ci8".to_string()),
                tlut: Some("gone".to_string()),
                ..record("tex", "Texture")
            }],
        };
        assert!(matches!(
            ZObject::from_descriptor(&descriptor),
            Err(ObjectError::PaletteReferenceNotFound { texture, palette })
                if texture == "tex" && palette == "gone"
        ));
    }

    #[test]
    fn unknown_kind_is_reported() {
        let descriptor = Descriptor {
            entries: vec![EntryRecord {
                size: Some(4),
                ..record("light", "Light")
            }],
        };
        assert!(matches!(
            ZObject::from_descriptor(&descriptor),
            Err(ObjectError::UnknownEntryKind(kind)) if kind == "Light"
        ));
    }

    #[test]
    fn oversized_records_are_refused() {
        let vtx = EntryRecord {
            vertex_count: Some(0x1000_0000),
            ..record("vtx", "Vertex")
        };
        assert!(matches!(
            vtx.to_entry(),
            Err(ObjectError::SizeOverflow(0x1_0000_0000))
        ));

        let tex = EntryRecord {
            width: Some(0x10000),
            height: Some(0x10001),
            format: Some("rgba32".to_string()),
            ..record("tex", "Texture")
        };
        let descriptor = Descriptor { entries: vec![tex] };
        assert!(matches!(
            ZObject::from_descriptor(&descriptor),
            Err(ObjectError::SizeOverflow(0x4_0004_0000))
        ));
    }

    #[test]
    fn incomplete_records_are_reported() {
        let err = record("gfx", "DList").to_entry().unwrap_err();
        assert!(matches!(err, ObjectError::MissingField { field: "size", .. }));

        let tex = EntryRecord {
            width: Some(4),
            height: Some(4),
            ..record("tex", "Texture")
        };
        assert!(matches!(
            tex.to_entry(),
            Err(ObjectError::MissingField { field: "format", .. })
        ));
    }
}
