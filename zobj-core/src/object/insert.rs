use log::debug;

use super::ZObject;
use crate::entry::{Entry, EntryKind, ObjectEntry, TextureEntry, UnknownEntry, VertexEntry};
use crate::error::{segment_size, ObjectError, Result};
use crate::format::{Vertex, VERTEX_SIZE};

/// One step of a vertex insertion: the part of the entry at `index` that the
/// incoming buffer takes over.
#[derive(Debug, Clone, Copy)]
struct Splice {
    index: usize,
    start: u32,
    lead: u32,
    covered: u32,
}

impl ZObject {
    /// Inserts `entry` at `offset`, or at the end when `offset` is `None`.
    ///
    /// Returns the index the entry ended up at. Inserting at the exact span of
    /// an existing entry of the same kind returns that entry instead.
    pub fn insert(&mut self, entry: Entry, offset: Option<u32>) -> Result<usize> {
        let size = entry.size();
        if size == 0 {
            return Err(ObjectError::InvalidSize(size));
        }
        let offset = offset.unwrap_or_else(|| self.total_size());
        segment_size(offset as u64 + size as u64)?;

        match entry {
            Entry::Vertex(vertices) => self.insert_vertices(vertices, offset),
            other => self.insert_claimed(other, offset),
        }
    }

    pub fn add_unknown(&mut self, name: &str, data: Vec<u8>, offset: Option<u32>) -> Result<usize> {
        self.insert(Entry::unknown(name, data)?, offset)
    }

    pub fn add_dlist(&mut self, name: &str, data: Vec<u8>, offset: Option<u32>) -> Result<usize> {
        self.insert(Entry::dlist(name, data)?, offset)
    }

    pub fn add_vertices(
        &mut self,
        name: &str,
        vertices: Vec<Vertex>,
        offset: Option<u32>,
    ) -> Result<usize> {
        self.insert(Entry::vertices(name, vertices)?, offset)
    }

    pub fn add_texture(&mut self, texture: TextureEntry, offset: Option<u32>) -> Result<usize> {
        self.insert(Entry::texture(texture), offset)
    }

    /// Appends `entry` at `offset >= total_size()`, closing any gap with filler.
    fn append_at(&mut self, entry: Entry, offset: u32) -> usize {
        let total = self.total_size();
        if offset > total {
            debug!("filling gap 0x{:X}..0x{:X}", total, offset);
            let filler = UnknownEntry::from_parts(
                Entry::auto_name(EntryKind::Unknown, total),
                vec![0; (offset - total) as usize],
            );
            self.entries.push(Entry::Unknown(filler));
        }
        debug!("appending {} {:?} at 0x{:X}", entry.kind(), entry.name(), offset);
        self.entries.push(entry);
        self.entries.len() - 1
    }

    fn insert_claimed(&mut self, entry: Entry, offset: u32) -> Result<usize> {
        if offset >= self.total_size() {
            return Ok(self.append_at(entry, offset));
        }

        let size = entry.size();
        let end = offset as u64 + size as u64;
        let host = self.iter_with_offsets().enumerate().find_map(|(index, (start, e))| {
            let fits = start <= offset && end <= start as u64 + e.size() as u64;
            (e.kind() == EntryKind::Unknown && fits).then_some((index, start))
        });
        if let Some((index, start)) = host {
            debug!(
                "carving {} {:?} out of {:?} at 0x{:X}",
                entry.kind(),
                entry.name(),
                self.entries[index].name(),
                offset
            );
            let lead = offset - start;
            let pieces = carve(&self.entries[index], start, lead, entry);
            self.entries.splice(index..=index, pieces);
            return Ok(index + usize::from(lead > 0));
        }

        let existing = self
            .iter_with_offsets()
            .position(|(start, e)| start == offset && e.size() == size && e.kind() == entry.kind());
        if let Some(index) = existing {
            debug!("{} at 0x{:X} already described", entry.kind(), offset);
            return Ok(index);
        }

        let kind = self
            .entry_at(offset)
            .map_or(EntryKind::Unknown, |index| self.entries[index].kind());
        Err(ObjectError::OverlapConflict { offset, size, kind })
    }

    fn insert_vertices(&mut self, incoming: VertexEntry, offset: u32) -> Result<usize> {
        if offset >= self.total_size() {
            return Ok(self.append_at(Entry::Vertex(incoming), offset));
        }

        let size = incoming.size();
        let existing = self.iter_with_offsets().position(|(start, e)| {
            start == offset && e.size() == size && e.kind() == EntryKind::Vertex
        });
        if let Some(index) = existing {
            debug!("vertex buffer at 0x{:X} already described", offset);
            return Ok(index);
        }

        let splices = self.plan_vertex_splices(offset, size)?;
        Ok(self.apply_vertex_splices(incoming, &splices))
    }

    /// Walks the entries the incoming buffer would cover and checks every split
    /// before anything is touched.
    fn plan_vertex_splices(&self, offset: u32, size: u32) -> Result<Vec<Splice>> {
        let mut splices = Vec::new();
        let mut cursor = offset;
        let mut remaining = size;

        for (index, (start, entry)) in self.iter_with_offsets().enumerate() {
            let end = start + entry.size();
            if cursor >= end {
                continue;
            }

            let kind = entry.kind();
            if !matches!(kind, EntryKind::Vertex | EntryKind::Unknown) {
                return Err(ObjectError::VertexOverlapConflict { offset, size, kind });
            }

            let lead = cursor - start;
            let covered = remaining.min(end - cursor);
            if lead % VERTEX_SIZE != 0 {
                return Err(ObjectError::VertexAlignmentError {
                    offset: cursor,
                    boundary: lead,
                });
            }
            if covered % VERTEX_SIZE != 0 {
                return Err(ObjectError::VertexAlignmentError {
                    offset: cursor,
                    boundary: covered,
                });
            }

            splices.push(Splice {
                index,
                start,
                lead,
                covered,
            });
            cursor += covered;
            remaining -= covered;
            if remaining == 0 {
                break;
            }
        }

        Ok(splices)
    }

    fn apply_vertex_splices(&mut self, incoming: VertexEntry, splices: &[Splice]) -> usize {
        let (name, vertices) = incoming.into_parts();

        let mut chunks = Vec::with_capacity(splices.len());
        let mut consumed = 0usize;
        for splice in splices {
            let count = (splice.covered / VERTEX_SIZE) as usize;
            chunks.push(vertices[consumed..consumed + count].to_vec());
            consumed += count;
        }
        let leftover = vertices[consumed..].to_vec();

        let first = splices
            .first()
            .map(|splice| splice.index + usize::from(splice.lead > 0));

        // back to front so earlier indices stay valid
        for (i, (splice, chunk)) in splices.iter().zip(chunks).enumerate().rev() {
            let piece_name = if i == 0 {
                name.clone()
            } else {
                Entry::auto_name(EntryKind::Vertex, splice.start + splice.lead)
            };
            debug!(
                "splicing {} vertices into {:?} at 0x{:X}",
                chunk.len(),
                self.entries[splice.index].name(),
                splice.start + splice.lead
            );
            let piece = Entry::Vertex(VertexEntry::from_parts(piece_name, chunk));
            let pieces = carve(&self.entries[splice.index], splice.start, splice.lead, piece);
            self.entries.splice(splice.index..=splice.index, pieces);
        }

        if leftover.is_empty() {
            // a non-empty plan always exists when the buffer starts inside the segment
            return first.unwrap_or(0);
        }

        let start = self.total_size();
        let piece_name = if first.is_some() {
            Entry::auto_name(EntryKind::Vertex, start)
        } else {
            name
        };
        debug!("appending {} trailing vertices at 0x{:X}", leftover.len(), start);
        self.entries
            .push(Entry::Vertex(VertexEntry::from_parts(piece_name, leftover)));
        first.unwrap_or(self.entries.len() - 1)
    }
}

/// Replaces `host` (starting at `start`) with up to three pieces: the part
/// before `lead`, `inserted`, and whatever follows it. Empty pieces are dropped.
///
/// Vertex hosts keep vertex remainders; any other host is split as raw bytes.
fn carve(host: &Entry, start: u32, lead: u32, inserted: Entry) -> Vec<Entry> {
    let covered = inserted.size();
    let tail_start = start + lead + covered;
    let mut pieces = Vec::with_capacity(3);

    match host {
        Entry::Vertex(vertices) => {
            let records = vertices.vertices();
            let head = (lead / VERTEX_SIZE) as usize;
            let tail = ((lead + covered) / VERTEX_SIZE) as usize;
            if head > 0 {
                pieces.push(Entry::Vertex(VertexEntry::from_parts(
                    host.name().to_string(),
                    records[..head].to_vec(),
                )));
            }
            pieces.push(inserted);
            if tail < records.len() {
                pieces.push(Entry::Vertex(VertexEntry::from_parts(
                    Entry::auto_name(EntryKind::Vertex, tail_start),
                    records[tail..].to_vec(),
                )));
            }
        }
        _ => {
            let data = host.to_bytes();
            let head = lead as usize;
            let tail = (lead + covered) as usize;
            if head > 0 {
                pieces.push(Entry::Unknown(UnknownEntry::from_parts(
                    host.name().to_string(),
                    data[..head].to_vec(),
                )));
            }
            pieces.push(inserted);
            if tail < data.len() {
                pieces.push(Entry::Unknown(UnknownEntry::from_parts(
                    Entry::auto_name(EntryKind::Unknown, tail_start),
                    data[tail..].to_vec(),
                )));
            }
        }
    }

    pieces
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::format::TextureFormat;

    fn layout(obj: &ZObject) -> Vec<(u32, EntryKind, u32)> {
        obj.iter_with_offsets()
            .map(|(offset, e)| (offset, e.kind(), e.size()))
            .collect()
    }

    fn vtx(n: usize) -> Vec<Vertex> {
        (0..n)
            .map(|i| Vertex {
                pos: [i as i16, 0, 0],
                ..Default::default()
            })
            .collect()
    }

    #[test]
    fn zero_sized_entries_are_rejected() {
        let mut obj = ZObject::new();
        assert!(matches!(
            obj.add_dlist("gfx", vec![], None),
            Err(ObjectError::InvalidSize(0))
        ));
        assert!(matches!(
            obj.add_vertices("vtx", vec![], Some(0x10)),
            Err(ObjectError::InvalidSize(0))
        ));
        assert!(obj.is_empty());
    }

    #[test]
    fn appending_past_the_end_fills_the_gap() {
        let mut obj = ZObject::new();
        obj.add_dlist("gfx", vec![0; 8], None).unwrap();
        let index = obj.add_dlist("far", vec![0; 8], Some(0x20)).unwrap();

        assert_eq!(index, 2);
        assert_eq!(
            layout(&obj),
            vec![
                (0, EntryKind::DList, 8),
                (8, EntryKind::Unknown, 0x18),
                (0x20, EntryKind::DList, 8),
            ]
        );
        assert_eq!(obj.entries()[1].name(), "unk_000008");
    }

    #[test]
    fn insertion_inside_unknown_splits_three_ways() {
        let mut obj = ZObject::new();
        obj.add_unknown("filler", (0..0x20).collect(), None).unwrap();
        let index = obj.add_dlist("gfx", vec![0xDF; 0x10], Some(0x8)).unwrap();

        assert_eq!(index, 1);
        assert_eq!(
            layout(&obj),
            vec![
                (0, EntryKind::Unknown, 0x8),
                (0x8, EntryKind::DList, 0x10),
                (0x18, EntryKind::Unknown, 0x8),
            ]
        );
        let names: Vec<_> = obj.entries().iter().map(|e| e.name()).collect();
        assert_eq!(names, vec!["filler", "gfx", "unk_000018"]);
        assert_eq!(obj.entries()[0].to_bytes(), (0..8).collect::<Vec<u8>>());
        assert_eq!(obj.entries()[2].to_bytes(), (0x18..0x20).collect::<Vec<u8>>());
    }

    #[test]
    fn flush_insertions_drop_empty_remainders() {
        let mut obj = ZObject::from_blob(&[0; 0x20]);
        obj.add_dlist("head", vec![0; 0x10], Some(0)).unwrap();
        obj.add_dlist("tail", vec![0; 0x10], Some(0x10)).unwrap();
        assert_eq!(
            layout(&obj),
            vec![(0, EntryKind::DList, 0x10), (0x10, EntryKind::DList, 0x10)]
        );
    }

    #[test]
    fn claimed_space_is_not_subdivided() {
        let mut obj = ZObject::new();
        obj.add_dlist("gfx", vec![0; 0x20], None).unwrap();
        let before = obj.clone();

        let texture = TextureEntry::new("tex", 4, 2, TextureFormat::Rgba16).unwrap();
        let err = obj.add_texture(texture, Some(0x8)).unwrap_err();
        assert!(matches!(
            err,
            ObjectError::OverlapConflict {
                offset: 0x8,
                size: 0x10,
                kind: EntryKind::DList
            }
        ));
        assert_eq!(obj, before);
    }

    #[test]
    fn spanning_two_unknowns_is_a_conflict() {
        let mut obj = ZObject::new();
        obj.add_unknown("a", vec![0; 0x10], None).unwrap();
        obj.add_unknown("b", vec![0; 0x10], None).unwrap();
        assert!(matches!(
            obj.add_dlist("gfx", vec![0; 0x10], Some(0x8)),
            Err(ObjectError::OverlapConflict { .. })
        ));
        assert_eq!(obj.len(), 2);
    }

    #[test]
    fn running_off_the_end_is_a_conflict() {
        let mut obj = ZObject::from_blob(&[0; 0x20]);
        assert!(matches!(
            obj.add_dlist("gfx", vec![0; 0x10], Some(0x18)),
            Err(ObjectError::OverlapConflict {
                kind: EntryKind::Unknown,
                ..
            })
        ));
    }

    #[test]
    fn same_span_same_kind_returns_existing() {
        let mut obj = ZObject::new();
        obj.add_unknown("pad", vec![0; 8], None).unwrap();
        obj.add_dlist("gfx", vec![1; 0x10], None).unwrap();

        let index = obj.add_dlist("again", vec![2; 0x10], Some(8)).unwrap();
        assert_eq!(index, 1);
        assert_eq!(obj.len(), 2);
        assert_eq!(obj.entries()[1].name(), "gfx");
        assert_eq!(obj.entries()[1].to_bytes(), vec![1; 0x10]);
    }

    #[test]
    fn same_span_other_kind_is_a_conflict() {
        let mut obj = ZObject::new();
        obj.add_dlist("gfx", vec![0; 0x20], None).unwrap();
        let texture = TextureEntry::new("tex", 4, 4, TextureFormat::Rgba16).unwrap();
        assert!(matches!(
            obj.add_texture(texture, Some(0)),
            Err(ObjectError::OverlapConflict {
                kind: EntryKind::DList,
                ..
            })
        ));
    }

    #[test]
    fn vertices_split_an_existing_buffer() {
        let mut obj = ZObject::new();
        obj.add_vertices("pool", vtx(4), None).unwrap();
        let index = obj.add_vertices("mid", vtx(2), Some(0x10)).unwrap();

        assert_eq!(index, 1);
        assert_eq!(
            layout(&obj),
            vec![
                (0, EntryKind::Vertex, 0x10),
                (0x10, EntryKind::Vertex, 0x20),
                (0x30, EntryKind::Vertex, 0x10),
            ]
        );
        let names: Vec<_> = obj.entries().iter().map(|e| e.name()).collect();
        assert_eq!(names, vec!["pool", "mid", "vtx_000030"]);
        // the tail keeps the original fourth record
        assert_eq!(obj.entries()[2].as_vertex().unwrap().vertices()[0].pos[0], 3);
    }

    #[test]
    fn vertices_span_vertex_and_unknown() {
        let mut obj = ZObject::new();
        obj.add_vertices("pool", vtx(4), None).unwrap();
        obj.add_unknown("rest", vec![0; 0x20], None).unwrap();

        let index = obj.add_vertices("shared", vtx(2), Some(0x30)).unwrap();
        assert_eq!(index, 1);
        assert_eq!(
            layout(&obj),
            vec![
                (0, EntryKind::Vertex, 0x30),
                (0x30, EntryKind::Vertex, 0x10),
                (0x40, EntryKind::Vertex, 0x10),
                (0x50, EntryKind::Unknown, 0x10),
            ]
        );
        assert_eq!(obj.total_size(), 0x60);
        assert_eq!(obj.entries()[2].name(), "vtx_000040");
        assert_eq!(obj.entries()[2].as_vertex().unwrap().vertices()[0].pos[0], 1);
    }

    #[test]
    fn vertices_overrunning_the_end_are_appended() {
        let mut obj = ZObject::new();
        obj.add_unknown("rest", vec![0; 0x10], None).unwrap();
        obj.add_vertices("tail", vtx(3), Some(0)).unwrap();
        assert_eq!(
            layout(&obj),
            vec![(0, EntryKind::Vertex, 0x10), (0x10, EntryKind::Vertex, 0x20)]
        );
        assert_eq!(obj.entries()[1].name(), "vtx_000010");
    }

    #[test]
    fn vertices_may_not_touch_claimed_kinds() {
        let mut obj = ZObject::new();
        obj.add_vertices("pool", vtx(2), None).unwrap();
        obj.add_dlist("gfx", vec![0; 0x10], None).unwrap();
        let before = obj.clone();

        assert!(matches!(
            obj.add_vertices("wide", vtx(2), Some(0x10)),
            Err(ObjectError::VertexOverlapConflict {
                kind: EntryKind::DList,
                ..
            })
        ));
        assert_eq!(obj, before);
    }

    #[test]
    fn misaligned_vertex_split_is_rejected() {
        let mut obj = ZObject::new();
        obj.add_vertices("pool", vtx(2), None).unwrap();
        obj.add_unknown("odd", vec![0; 0x8], None).unwrap();
        obj.add_unknown("more", vec![0; 0x10], None).unwrap();
        let before = obj.clone();

        assert!(matches!(
            obj.add_vertices("bad", vtx(1), Some(0x8)),
            Err(ObjectError::VertexAlignmentError {
                offset: 0x8,
                boundary: 0x8
            })
        ));
        // the unknown piece would end up 8 bytes long
        assert!(matches!(
            obj.add_vertices("bad", vtx(2), Some(0x20)),
            Err(ObjectError::VertexAlignmentError {
                offset: 0x20,
                boundary: 0x8
            })
        ));
        assert_eq!(obj, before);
    }

    #[test]
    fn unknown_host_is_split_on_record_boundaries() {
        let mut obj = ZObject::from_blob(&[0; 0x24]);
        let before = obj.clone();
        assert!(matches!(
            obj.add_vertices("vtx", vtx(1), Some(0x4)),
            Err(ObjectError::VertexAlignmentError {
                offset: 0x4,
                boundary: 0x4
            })
        ));
        assert_eq!(obj, before);

        obj.add_vertices("vtx", vtx(1), Some(0x10)).unwrap();
        assert_eq!(
            layout(&obj),
            vec![
                (0, EntryKind::Unknown, 0x10),
                (0x10, EntryKind::Vertex, 0x10),
                (0x20, EntryKind::Unknown, 0x4),
            ]
        );
    }

    #[test]
    fn entries_must_end_inside_the_segment_space() {
        let mut obj = ZObject::new();
        assert!(matches!(
            obj.add_dlist("gfx", vec![0; 0x10], Some(u32::MAX - 8)),
            Err(ObjectError::SizeOverflow(_))
        ));
        assert!(obj.is_empty());
    }

    #[test]
    fn matching_vertex_buffer_is_returned() {
        let mut obj = ZObject::new();
        obj.add_unknown("pad", vec![0; 0x10], None).unwrap();
        obj.add_vertices("pool", vtx(2), None).unwrap();
        let index = obj.add_vertices("dup", vtx(2), Some(0x10)).unwrap();
        assert_eq!(index, 1);
        assert_eq!(obj.len(), 2);
        assert_eq!(obj.entries()[1].name(), "pool");
    }
}
