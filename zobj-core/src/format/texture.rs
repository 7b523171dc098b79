use std::fmt;
use std::str::FromStr;

use crate::error::{segment_size, ObjectError, Result};

/// Pixel formats understood by the RDP texture loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    Rgba16,
    Rgba32,
    Ci4,
    Ci8,
    Ia4,
    Ia8,
    Ia16,
    I4,
    I8,
}

impl TextureFormat {
    pub const ALL: [TextureFormat; 9] = [
        TextureFormat::Rgba16,
        TextureFormat::Rgba32,
        TextureFormat::Ci4,
        TextureFormat::Ci8,
        TextureFormat::Ia4,
        TextureFormat::Ia8,
        TextureFormat::Ia16,
        TextureFormat::I4,
        TextureFormat::I8,
    ];

    pub fn bits_per_pixel(self) -> u32 {
        match self {
            TextureFormat::Ci4 | TextureFormat::Ia4 | TextureFormat::I4 => 4,
            TextureFormat::Ci8 | TextureFormat::Ia8 | TextureFormat::I8 => 8,
            TextureFormat::Rgba16 | TextureFormat::Ia16 => 16,
            TextureFormat::Rgba32 => 32,
        }
    }

    /// Byte size of a `width` x `height` texture, rounded up to a whole byte.
    pub fn size_for(self, width: u32, height: u32) -> Result<u32> {
        let bits = width as u64 * height as u64 * self.bits_per_pixel() as u64;
        segment_size(bits.div_ceil(8))
    }

    /// Color-indexed formats need a palette (TLUT) to be displayed.
    pub fn is_palette_indexed(self) -> bool {
        matches!(self, TextureFormat::Ci4 | TextureFormat::Ci8)
    }

    pub fn tag(self) -> &'static str {
        match self {
            TextureFormat::Rgba16 => "rgba16",
            TextureFormat::Rgba32 => "rgba32",
            TextureFormat::Ci4 => "ci4",
            TextureFormat::Ci8 => "ci8",
            TextureFormat::Ia4 => "ia4",
            TextureFormat::Ia8 => "ia8",
            TextureFormat::Ia16 => "ia16",
            TextureFormat::I4 => "i4",
            TextureFormat::I8 => "i8",
        }
    }
}

impl fmt::Display for TextureFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for TextureFormat {
    type Err = ObjectError;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.to_ascii_lowercase();
        TextureFormat::ALL
            .into_iter()
            .find(|format| format.tag() == lower)
            .ok_or_else(|| ObjectError::UnknownTextureFormat(s.to_string()))
    }
}
