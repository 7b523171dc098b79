use thiserror::Error;

use crate::entry::EntryKind;

#[derive(Debug, Error)]
pub enum ObjectError {
    #[error("invalid entry name: {0:?}")]
    InvalidName(String),

    #[error("invalid entry size: 0x{0:X}")]
    InvalidSize(u32),

    #[error("entry at 0x{offset:X} (size 0x{size:X}) overlaps an existing {kind} entry")]
    OverlapConflict {
        offset: u32,
        size: u32,
        kind: EntryKind,
    },

    #[error("vertex buffer at 0x{offset:X} (size 0x{size:X}) overlaps an existing {kind} entry")]
    VertexOverlapConflict {
        offset: u32,
        size: u32,
        kind: EntryKind,
    },

    #[error("vertex split at 0x{offset:X} leaves a 0x{boundary:X} byte piece that is not a multiple of 16")]
    VertexAlignmentError { offset: u32, boundary: u32 },

    #[error("entry size 0x{0:X} does not fit a 32-bit segment")]
    SizeOverflow(u64),

    #[error("size mismatch: expected 0x{expected:X} bytes, got 0x{actual:X}")]
    SizeMismatch { expected: usize, actual: usize },

    #[error("unknown entry kind: {0:?}")]
    UnknownEntryKind(String),

    #[error("unknown texture format: {0:?}")]
    UnknownTextureFormat(String),

    #[error("descriptor entry {name:?} is missing `{field}`")]
    MissingField { name: String, field: &'static str },

    #[error("texture {texture:?} references missing palette {palette:?}")]
    PaletteReferenceNotFound { texture: String, palette: String },

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, ObjectError>;

/// Narrows a byte count to the segment's 32-bit offset space.
pub(crate) fn segment_size(bytes: u64) -> Result<u32> {
    u32::try_from(bytes).map_err(|_| ObjectError::SizeOverflow(bytes))
}
