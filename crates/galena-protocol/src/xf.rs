//! Transform-unit registers.
//!
//! Unlike raster registers, transform registers are streamed: a load
//! names a 16-bit base address and carries consecutive words. The
//! consumer is expected to scatter them into its register file, so the
//! words themselves are plain payloads with no embedded address.

use crate::cmd::Rgba8;

/// Number of active vertex color channels.
pub const NUM_CHANNELS: u16 = 0x0040;
/// Lighting controls for color channel 0. Only the material source bit
/// is modeled.
pub const CHAN0_COLOR_CTRL: u16 = 0x0041;
/// Lighting controls for the alpha of channel 0.
pub const CHAN0_ALPHA_CTRL: u16 = 0x0042;
/// Material color used when a channel sources from the register file.
pub const CHAN0_MATERIAL: u16 = 0x0043;
/// First of the six viewport words; see [`Viewport`].
pub const VIEWPORT_BASE: u16 = 0x0050;

/// Where a color channel takes its per-vertex value from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MaterialSource {
    /// The material register ([`CHAN0_MATERIAL`]).
    Register = 0,
    /// The color attribute supplied with each vertex.
    Vertex = 1,
}

/// Payload of [`CHAN0_COLOR_CTRL`] / [`CHAN0_ALPHA_CTRL`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ChannelCtrl(u32);

impl ChannelCtrl {
    const MATERIAL_SOURCE_BIT: u32 = 1 << 0;

    pub fn from_word(word: u32) -> Self {
        Self(word)
    }

    pub fn word(self) -> u32 {
        self.0
    }

    pub fn material_source(self) -> MaterialSource {
        if self.0 & Self::MATERIAL_SOURCE_BIT != 0 {
            MaterialSource::Vertex
        } else {
            MaterialSource::Register
        }
    }

    pub fn set_material_source(&mut self, source: MaterialSource) {
        match source {
            MaterialSource::Vertex => self.0 |= Self::MATERIAL_SOURCE_BIT,
            MaterialSource::Register => self.0 &= !Self::MATERIAL_SOURCE_BIT,
        }
    }
}

/// Packs a material color into its register word.
pub fn pack_material(color: Rgba8) -> u32 {
    u32::from(color.r) << 24
        | u32::from(color.g) << 16
        | u32::from(color.b) << 8
        | u32::from(color.a)
}

/// Inverse of [`pack_material`].
pub fn unpack_material(word: u32) -> Rgba8 {
    Rgba8 {
        r: (word >> 24) as u8,
        g: (word >> 16) as u8,
        b: (word >> 8) as u8,
        a: word as u8,
    }
}

/// Viewport transform, streamed as six consecutive words starting at
/// [`VIEWPORT_BASE`]: origin, extent, then the near and far window
/// depths. Each word is the raw bit pattern of an `f32`, so the
/// round trip through the wire is exact.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub depth_near: f32,
    pub depth_far: f32,
}

impl Viewport {
    pub const WORD_COUNT: usize = 6;

    pub fn to_words(self) -> [u32; Self::WORD_COUNT] {
        [
            self.x.to_bits(),
            self.y.to_bits(),
            self.width.to_bits(),
            self.height.to_bits(),
            self.depth_near.to_bits(),
            self.depth_far.to_bits(),
        ]
    }

    pub fn from_words(words: [u32; Self::WORD_COUNT]) -> Self {
        Self {
            x: f32::from_bits(words[0]),
            y: f32::from_bits(words[1]),
            width: f32::from_bits(words[2]),
            height: f32::from_bits(words[3]),
            depth_near: f32::from_bits(words[4]),
            depth_far: f32::from_bits(words[5]),
        }
    }
}

/// Index into the viewport word block for `addr`, if it falls inside.
pub fn viewport_word_index(addr: u16) -> Option<usize> {
    let offset = addr.checked_sub(VIEWPORT_BASE)? as usize;
    (offset < Viewport::WORD_COUNT).then_some(offset)
}
