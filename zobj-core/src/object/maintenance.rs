use log::debug;

use super::ZObject;
use crate::entry::{Entry, EntryKind, ObjectEntry};

impl ZObject {
    /// Renames every entry to `<prefix>_<offset>` and points palette
    /// references at the renamed palettes.
    pub fn fix_names(&mut self) {
        let palettes: Vec<Option<usize>> = self
            .entries
            .iter()
            .map(|entry| {
                entry
                    .as_texture()
                    .and_then(|texture| texture.palette())
                    .and_then(|palette| self.find(palette))
            })
            .collect();
        let offsets: Vec<u32> = self.iter_with_offsets().map(|(offset, _)| offset).collect();

        for (entry, &offset) in self.entries.iter_mut().zip(&offsets) {
            let name = Entry::auto_name(entry.kind(), offset);
            entry.rename(name);
        }

        for (index, palette) in palettes.into_iter().enumerate() {
            let Some(palette) = palette else {
                continue;
            };
            let name = self.entries[palette].name().to_string();
            if let Entry::Texture(texture) = &mut self.entries[index] {
                texture.set_palette(Some(name));
            }
        }
    }

    /// Folds runs of adjacent unknown entries into their first entry.
    ///
    /// Returns how many entries were absorbed.
    pub fn group_unknown_entries(&mut self) -> usize {
        let mut merged = 0;
        let mut index = 0;
        while index + 1 < self.entries.len() {
            let adjacent = matches!(
                (&self.entries[index], &self.entries[index + 1]),
                (Entry::Unknown(_), Entry::Unknown(_))
            );
            if !adjacent {
                index += 1;
                continue;
            }

            let next = self.entries.remove(index + 1);
            if let Entry::Unknown(first) = &mut self.entries[index] {
                first.append(&next.to_bytes());
            }
            merged += 1;
        }
        if merged > 0 {
            debug!("merged {} unknown entries", merged);
        }
        merged
    }

    /// True unless a claimed (non-unknown) entry covers `offset`.
    pub fn is_offset_free(&self, offset: u32) -> bool {
        self.entry_at(offset)
            .map_or(true, |index| self.entries[index].kind() == EntryKind::Unknown)
    }
}
