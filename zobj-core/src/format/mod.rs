//! Per-record collaborators the layout engine relies on.
//!
//! - [`TextureFormat`] answers "how many bytes does a texture of this shape take".
//! - [`Vertex`] is the 16-byte big-endian vertex record.

mod texture;
mod vertex;

pub use texture::TextureFormat;
pub use vertex::{decode_vertices, encode_vertices, Vertex, VERTEX_SIZE};
