use std::fmt;
use std::str::FromStr;

use crate::error::{segment_size, ObjectError, Result};
use crate::format::{decode_vertices, encode_vertices, TextureFormat, Vertex, VERTEX_SIZE};

/// The closed set of entry kinds an object segment is carved into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    DList,
    Vertex,
    Texture,
    Unknown,
}

impl EntryKind {
    /// Prefix used for generated names.
    pub fn prefix(self) -> &'static str {
        match self {
            EntryKind::DList => "dlist",
            EntryKind::Vertex => "vtx",
            EntryKind::Texture => "tex",
            EntryKind::Unknown => "unk",
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            EntryKind::DList => "DList",
            EntryKind::Vertex => "Vertex",
            EntryKind::Texture => "Texture",
            EntryKind::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for EntryKind {
    type Err = ObjectError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "DList" => Ok(EntryKind::DList),
            "Vertex" => Ok(EntryKind::Vertex),
            "Texture" => Ok(EntryKind::Texture),
            "Unknown" => Ok(EntryKind::Unknown),
            _ => Err(ObjectError::UnknownEntryKind(s.to_string())),
        }
    }
}

fn validate_name(name: &str) -> Result<String> {
    if name.trim().is_empty() {
        return Err(ObjectError::InvalidName(name.to_string()));
    }
    Ok(name.to_string())
}

/// Capabilities shared by every entry kind.
pub trait ObjectEntry {
    fn name(&self) -> &str;
    fn set_name(&mut self, name: &str) -> Result<()>;
    fn kind(&self) -> EntryKind;
    /// Byte size, recomputed from the current contents.
    fn size(&self) -> u32;
    fn to_bytes(&self) -> Vec<u8>;
    fn set_bytes(&mut self, data: &[u8]) -> Result<()>;
}

/// Raw F3DEX microcode. The words are kept opaque.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayListEntry {
    name: String,
    data: Vec<u8>,
}

impl DisplayListEntry {
    pub fn new(name: &str, data: Vec<u8>) -> Result<Self> {
        segment_size(data.len() as u64)?;
        Ok(Self {
            name: validate_name(name)?,
            data,
        })
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

impl ObjectEntry for DisplayListEntry {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: &str) -> Result<()> {
        self.name = validate_name(name)?;
        Ok(())
    }

    fn kind(&self) -> EntryKind {
        EntryKind::DList
    }

    fn size(&self) -> u32 {
        self.data.len() as u32
    }

    fn to_bytes(&self) -> Vec<u8> {
        self.data.clone()
    }

    fn set_bytes(&mut self, data: &[u8]) -> Result<()> {
        segment_size(data.len() as u64)?;
        self.data = data.to_vec();
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexEntry {
    name: String,
    vertices: Vec<Vertex>,
}

impl VertexEntry {
    pub fn new(name: &str, vertices: Vec<Vertex>) -> Result<Self> {
        segment_size(vertices.len() as u64 * VERTEX_SIZE as u64)?;
        Ok(Self {
            name: validate_name(name)?,
            vertices,
        })
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn count(&self) -> usize {
        self.vertices.len()
    }

    pub(crate) fn from_parts(name: String, vertices: Vec<Vertex>) -> Self {
        Self { name, vertices }
    }

    pub(crate) fn into_parts(self) -> (String, Vec<Vertex>) {
        (self.name, self.vertices)
    }
}

impl ObjectEntry for VertexEntry {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: &str) -> Result<()> {
        self.name = validate_name(name)?;
        Ok(())
    }

    fn kind(&self) -> EntryKind {
        EntryKind::Vertex
    }

    fn size(&self) -> u32 {
        self.vertices.len() as u32 * VERTEX_SIZE
    }

    fn to_bytes(&self) -> Vec<u8> {
        encode_vertices(&self.vertices)
    }

    fn set_bytes(&mut self, data: &[u8]) -> Result<()> {
        segment_size(data.len() as u64)?;
        self.vertices = decode_vertices(data)?;
        Ok(())
    }
}

/// Texel data of a fixed shape. The palette is a name, resolved by the owning object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureEntry {
    name: String,
    width: u32,
    height: u32,
    format: TextureFormat,
    palette: Option<String>,
    data: Vec<u8>,
}

impl TextureEntry {
    /// Creates a zero-filled texture of the given shape.
    pub fn new(name: &str, width: u32, height: u32, format: TextureFormat) -> Result<Self> {
        let name = validate_name(name)?;
        let size = format.size_for(width, height)?;
        Ok(Self {
            name,
            width,
            height,
            format,
            palette: None,
            data: vec![0; size as usize],
        })
    }

    pub fn with_data(mut self, data: &[u8]) -> Result<Self> {
        self.set_bytes(data)?;
        Ok(self)
    }

    pub fn with_palette(mut self, palette: Option<&str>) -> Self {
        self.palette = palette.map(str::to_string);
        self
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> TextureFormat {
        self.format
    }

    pub fn palette(&self) -> Option<&str> {
        self.palette.as_deref()
    }

    pub fn set_palette(&mut self, palette: Option<String>) {
        self.palette = palette;
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

impl ObjectEntry for TextureEntry {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: &str) -> Result<()> {
        self.name = validate_name(name)?;
        Ok(())
    }

    fn kind(&self) -> EntryKind {
        EntryKind::Texture
    }

    fn size(&self) -> u32 {
        // the shape was checked in `new` and `set_bytes` keeps the length
        self.data.len() as u32
    }

    fn to_bytes(&self) -> Vec<u8> {
        self.data.clone()
    }

    fn set_bytes(&mut self, data: &[u8]) -> Result<()> {
        let expected = self.size() as usize;
        if data.len() != expected {
            return Err(ObjectError::SizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        self.data = data.to_vec();
        Ok(())
    }
}

/// Bytes nobody has claimed yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownEntry {
    name: String,
    data: Vec<u8>,
}

impl UnknownEntry {
    pub fn new(name: &str, data: Vec<u8>) -> Result<Self> {
        segment_size(data.len() as u64)?;
        Ok(Self {
            name: validate_name(name)?,
            data,
        })
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub(crate) fn from_parts(name: String, data: Vec<u8>) -> Self {
        Self { name, data }
    }

    pub(crate) fn append(&mut self, data: &[u8]) {
        self.data.extend_from_slice(data);
    }
}

impl ObjectEntry for UnknownEntry {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: &str) -> Result<()> {
        self.name = validate_name(name)?;
        Ok(())
    }

    fn kind(&self) -> EntryKind {
        EntryKind::Unknown
    }

    fn size(&self) -> u32 {
        self.data.len() as u32
    }

    fn to_bytes(&self) -> Vec<u8> {
        self.data.clone()
    }

    fn set_bytes(&mut self, data: &[u8]) -> Result<()> {
        segment_size(data.len() as u64)?;
        self.data = data.to_vec();
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    DList(DisplayListEntry),
    Vertex(VertexEntry),
    Texture(TextureEntry),
    Unknown(UnknownEntry),
}

impl Entry {
    pub fn dlist(name: &str, data: Vec<u8>) -> Result<Self> {
        Ok(Entry::DList(DisplayListEntry::new(name, data)?))
    }

    pub fn vertices(name: &str, vertices: Vec<Vertex>) -> Result<Self> {
        Ok(Entry::Vertex(VertexEntry::new(name, vertices)?))
    }

    pub fn texture(texture: TextureEntry) -> Self {
        Entry::Texture(texture)
    }

    pub fn unknown(name: &str, data: Vec<u8>) -> Result<Self> {
        Ok(Entry::Unknown(UnknownEntry::new(name, data)?))
    }

    /// `<prefix>_<offset>`, e.g. `vtx_0001A0`.
    pub fn auto_name(kind: EntryKind, offset: u32) -> String {
        format!("{}_{:06X}", kind.prefix(), offset)
    }

    pub fn as_texture(&self) -> Option<&TextureEntry> {
        match self {
            Entry::Texture(texture) => Some(texture),
            _ => None,
        }
    }

    pub fn as_vertex(&self) -> Option<&VertexEntry> {
        match self {
            Entry::Vertex(vertex) => Some(vertex),
            _ => None,
        }
    }

    /// Replaces the name without validation; callers pass generated names.
    pub(crate) fn rename(&mut self, name: String) {
        match self {
            Entry::DList(entry) => entry.name = name,
            Entry::Vertex(entry) => entry.name = name,
            Entry::Texture(entry) => entry.name = name,
            Entry::Unknown(entry) => entry.name = name,
        }
    }

    fn inner(&self) -> &dyn ObjectEntry {
        match self {
            Entry::DList(entry) => entry,
            Entry::Vertex(entry) => entry,
            Entry::Texture(entry) => entry,
            Entry::Unknown(entry) => entry,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn ObjectEntry {
        match self {
            Entry::DList(entry) => entry,
            Entry::Vertex(entry) => entry,
            Entry::Texture(entry) => entry,
            Entry::Unknown(entry) => entry,
        }
    }
}

impl ObjectEntry for Entry {
    fn name(&self) -> &str {
        self.inner().name()
    }

    fn set_name(&mut self, name: &str) -> Result<()> {
        self.inner_mut().set_name(name)
    }

    fn kind(&self) -> EntryKind {
        self.inner().kind()
    }

    fn size(&self) -> u32 {
        self.inner().size()
    }

    fn to_bytes(&self) -> Vec<u8> {
        self.inner().to_bytes()
    }

    fn set_bytes(&mut self, data: &[u8]) -> Result<()> {
        self.inner_mut().set_bytes(data)
    }
}
