//! The ordered entry container.
//!
//! Entries are kept in a `Vec` in segment order. The offset of an entry is the
//! sum of the sizes before it, so every lookup is a prefix scan; nothing is
//! cached and no mutation has to invalidate anything.

mod insert;
mod maintenance;

use log::debug;

use crate::entry::{Entry, EntryKind, ObjectEntry, TextureEntry, UnknownEntry};
use crate::error::{ObjectError, Result};

/// Built segments are padded to this alignment.
pub const SEGMENT_ALIGN: usize = 16;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ZObject {
    entries: Vec<Entry>,
}

impl ZObject {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps a raw segment as one unclaimed entry, ready to be carved up.
    pub fn from_blob(bytes: &[u8]) -> Self {
        if bytes.is_empty() {
            return Self::new();
        }
        let entry = UnknownEntry::from_parts(Entry::auto_name(EntryKind::Unknown, 0), bytes.to_vec());
        Self {
            entries: vec![Entry::Unknown(entry)],
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&Entry> {
        self.entries.get(index)
    }

    pub fn total_size(&self) -> u32 {
        self.entries.iter().map(|e| e.size()).sum()
    }

    /// Entries paired with their offset into the segment.
    pub fn iter_with_offsets(&self) -> impl Iterator<Item = (u32, &Entry)> + '_ {
        self.entries.iter().scan(0u32, |offset, entry| {
            let start = *offset;
            *offset += entry.size();
            Some((start, entry))
        })
    }

    pub fn offset_of(&self, index: usize) -> Option<u32> {
        if index >= self.entries.len() {
            return None;
        }
        Some(self.entries[..index].iter().map(|e| e.size()).sum())
    }

    /// First entry with the given name.
    pub fn find(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.name() == name)
    }

    /// Index of the entry covering `offset`.
    pub fn entry_at(&self, offset: u32) -> Option<usize> {
        self.iter_with_offsets()
            .position(|(start, entry)| start <= offset && offset < start + entry.size())
    }

    /// The texture named by the texture-at-`index`'s palette reference.
    pub fn palette_of(&self, index: usize) -> Option<&TextureEntry> {
        let palette = self.entries.get(index)?.as_texture()?.palette()?;
        self.entries[self.find(palette)?].as_texture()
    }

    /// Concatenates every entry and zero-pads to [`SEGMENT_ALIGN`].
    pub fn build(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(self.total_size() as usize + SEGMENT_ALIGN);
        for entry in &self.entries {
            data.extend_from_slice(&entry.to_bytes());
        }
        let padded = data.len().next_multiple_of(SEGMENT_ALIGN);
        data.resize(padded, 0);
        data
    }

    /// Refills every entry from `bytes` without changing any boundary.
    pub fn load(&mut self, bytes: &[u8]) -> Result<()> {
        let expected = self.total_size() as usize;
        if bytes.len() != expected {
            return Err(ObjectError::SizeMismatch {
                expected,
                actual: bytes.len(),
            });
        }

        let mut offset = 0usize;
        for entry in &mut self.entries {
            let size = entry.size() as usize;
            entry.set_bytes(&bytes[offset..offset + size])?;
            offset += size;
        }
        debug!("loaded 0x{:X} bytes into {} entries", expected, self.entries.len());
        Ok(())
    }
}
