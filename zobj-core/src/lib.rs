//! This crate implements the layout engine for N64 object segments.
//!
//! An object segment is a flat blob that gets carved into typed entries
//! (display lists, vertex buffers, textures and unclaimed bytes). The entries
//! always tile the segment: no gaps, no overlaps.

#![allow(clippy::uninlined_format_args)]

pub mod descriptor;
pub mod entry;
pub mod error;
pub mod format;
pub mod object;

pub use descriptor::{Descriptor, EntryRecord};
pub use entry::{
    DisplayListEntry, Entry, EntryKind, ObjectEntry, TextureEntry, UnknownEntry, VertexEntry,
};
pub use error::{ObjectError, Result};
pub use format::{TextureFormat, Vertex, VERTEX_SIZE};
pub use object::ZObject;
