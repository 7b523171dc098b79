use std::io::{Cursor, Read};

use byteorder::{BigEndian, ByteOrder, ReadBytesExt};

use crate::error::{ObjectError, Result};

/// Size of one encoded vertex record.
pub const VERTEX_SIZE: u32 = 16;

/// A single `Vtx` record as stored in the segment.
///
/// Layout (big-endian):
/// - 0x00: i16 x, i16 y, i16 z
/// - 0x06: u16 flag
/// - 0x08: i16 s, i16 t
/// - 0x0C: u8 r/nx, u8 g/ny, u8 b/nz, u8 a
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Vertex {
    pub pos: [i16; 3],
    pub flag: u16,
    pub tex_coord: [i16; 2],
    pub color: [u8; 4],
}

impl Vertex {
    pub fn read(reader: &mut impl Read) -> std::io::Result<Self> {
        let mut pos = [0i16; 3];
        reader.read_i16_into::<BigEndian>(&mut pos)?;
        let flag = reader.read_u16::<BigEndian>()?;
        let mut tex_coord = [0i16; 2];
        reader.read_i16_into::<BigEndian>(&mut tex_coord)?;
        let mut color = [0u8; 4];
        reader.read_exact(&mut color)?;
        Ok(Self {
            pos,
            flag,
            tex_coord,
            color,
        })
    }

    pub fn to_bytes(&self) -> [u8; VERTEX_SIZE as usize] {
        let mut buf = [0u8; VERTEX_SIZE as usize];
        BigEndian::write_i16_into(&self.pos, &mut buf[0x0..0x6]);
        BigEndian::write_u16(&mut buf[0x6..0x8], self.flag);
        BigEndian::write_i16_into(&self.tex_coord, &mut buf[0x8..0xC]);
        buf[0xC..].copy_from_slice(&self.color);
        buf
    }
}

pub fn decode_vertices(bytes: &[u8]) -> Result<Vec<Vertex>> {
    let record = VERTEX_SIZE as usize;
    if bytes.len() % record != 0 {
        return Err(ObjectError::SizeMismatch {
            expected: bytes.len() - bytes.len() % record,
            actual: bytes.len(),
        });
    }

    let mut cursor = Cursor::new(bytes);
    let mut vertices = Vec::with_capacity(bytes.len() / record);
    for _ in 0..bytes.len() / record {
        // the length check above guarantees every read is complete
        let vertex = Vertex::read(&mut cursor).map_err(|_| ObjectError::SizeMismatch {
            expected: bytes.len(),
            actual: cursor.position() as usize,
        })?;
        vertices.push(vertex);
    }
    Ok(vertices)
}

pub fn encode_vertices(vertices: &[Vertex]) -> Vec<u8> {
    let mut data = Vec::with_capacity(vertices.len() * VERTEX_SIZE as usize);
    for vertex in vertices {
        data.extend_from_slice(&vertex.to_bytes());
    }
    data
}
