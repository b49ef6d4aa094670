//! Embedded framebuffer storage and copy-out encodings.

use galena_protocol::{CopyRect, ReadbackTarget, Rgba8};

pub const EFB_WIDTH: u32 = 640;
pub const EFB_HEIGHT: u32 = 528;

/// Largest value a 24-bit depth sample can hold. With the inverted
/// depth convention this is the near plane; zero is the far plane.
pub const DEPTH_MAX: u32 = 0x00ff_ffff;

/// The embedded framebuffer: one RGBA8 color sample and one 24-bit
/// depth sample per pixel. Boots to opaque black and far depth.
pub struct Efb {
    color: Vec<Rgba8>,
    depth: Vec<u32>,
}

impl Efb {
    pub fn new() -> Self {
        let pixels = (EFB_WIDTH * EFB_HEIGHT) as usize;
        Self {
            color: vec![Rgba8::new(0, 0, 0, 0xff); pixels],
            depth: vec![0; pixels],
        }
    }

    fn index(x: u32, y: u32) -> usize {
        debug_assert!(x < EFB_WIDTH && y < EFB_HEIGHT);
        (y * EFB_WIDTH + x) as usize
    }

    pub fn color_at(&self, x: u32, y: u32) -> Rgba8 {
        self.color[Self::index(x, y)]
    }

    pub fn set_color(&mut self, x: u32, y: u32, color: Rgba8) {
        self.color[Self::index(x, y)] = color;
    }

    pub fn depth_at(&self, x: u32, y: u32) -> u32 {
        self.depth[Self::index(x, y)]
    }

    pub fn set_depth(&mut self, x: u32, y: u32, depth: u32) {
        self.depth[Self::index(x, y)] = depth & DEPTH_MAX;
    }

    /// Copies `rect` out as tightly packed RGBA8 rows, top to bottom.
    ///
    /// `target` must be exactly `width * height * 4` bytes and `rect`
    /// must lie inside the framebuffer.
    pub fn copy_color_into(&self, rect: CopyRect, target: &ReadbackTarget) {
        assert!(rect.x + rect.width <= EFB_WIDTH && rect.y + rect.height <= EFB_HEIGHT);
        assert_eq!(target.len(), (rect.width * rect.height * 4) as usize);

        let mut row = Vec::with_capacity((rect.width * 4) as usize);
        for y in 0..rect.height {
            row.clear();
            for x in 0..rect.width {
                let c = self.color_at(rect.x + x, rect.y + y);
                row.extend_from_slice(&[c.r, c.g, c.b, c.a]);
            }
            target.write((y * rect.width * 4) as usize, &row);
        }
    }

    /// Copies `rect` out as 24-bit depth texels.
    ///
    /// The destination grid is the rect rounded up to four-texel
    /// alignment in both axes, matching the texture cache's block size;
    /// see [`depth_copy_len`]. Each texel is four bytes, a zero pad
    /// byte followed by the depth value most significant byte first.
    /// Pad texels outside the rect read back as zero.
    pub fn copy_depth_into(&self, rect: CopyRect, target: &ReadbackTarget) {
        assert!(rect.x + rect.width <= EFB_WIDTH && rect.y + rect.height <= EFB_HEIGHT);
        assert_eq!(target.len(), depth_copy_len(rect));

        let padded_width = align4(rect.width);
        let mut row = vec![0u8; (padded_width * 4) as usize];
        for y in 0..rect.height {
            for x in 0..rect.width {
                let d = self.depth_at(rect.x + x, rect.y + y);
                let at = (x * 4) as usize;
                row[at] = 0;
                row[at + 1] = (d >> 16) as u8;
                row[at + 2] = (d >> 8) as u8;
                row[at + 3] = d as u8;
            }
            target.write((y * padded_width * 4) as usize, &row);
        }
        // A copy overwrites the whole destination, pad rows included,
        // so reused targets never leak stale texels.
        let zero_row = vec![0u8; (padded_width * 4) as usize];
        for y in rect.height..align4(rect.height) {
            target.write((y * padded_width * 4) as usize, &zero_row);
        }
    }
}

impl Default for Efb {
    fn default() -> Self {
        Self::new()
    }
}

fn align4(v: u32) -> u32 {
    (v + 3) & !3
}

/// Byte length of the buffer a depth copy of `rect` fills.
pub fn depth_copy_len(rect: CopyRect) -> usize {
    (align4(rect.width) * align4(rect.height) * 4) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn boots_to_opaque_black_over_far_depth() {
        let efb = Efb::new();
        assert_eq!(efb.color_at(0, 0), Rgba8::new(0, 0, 0, 0xff));
        assert_eq!(efb.color_at(EFB_WIDTH - 1, EFB_HEIGHT - 1), Rgba8::new(0, 0, 0, 0xff));
        assert_eq!(efb.depth_at(320, 200), 0);
    }

    #[test]
    fn depth_samples_are_masked_to_24_bits() {
        let mut efb = Efb::new();
        efb.set_depth(5, 7, 0xdead_beef);
        assert_eq!(efb.depth_at(5, 7), 0x00ad_beef);
    }

    #[test]
    fn color_copy_extracts_tight_rows() {
        let mut efb = Efb::new();
        efb.set_color(10, 20, Rgba8::new(1, 2, 3, 4));
        efb.set_color(11, 21, Rgba8::new(5, 6, 7, 8));

        let rect = CopyRect { x: 10, y: 20, width: 2, height: 2 };
        let target = ReadbackTarget::with_len(2 * 2 * 4);
        efb.copy_color_into(rect, &target);

        let bytes = target.bytes();
        assert_eq!(&bytes[0..4], &[1, 2, 3, 4]);
        assert_eq!(&bytes[4..8], &[0, 0, 0, 0xff]);
        assert_eq!(&bytes[8..12], &[0, 0, 0, 0xff]);
        assert_eq!(&bytes[12..16], &[5, 6, 7, 8]);
    }

    #[test]
    fn depth_copy_pads_to_four_texel_alignment() {
        let rect = CopyRect { x: 0, y: 0, width: 50, height: 50 };
        assert_eq!(depth_copy_len(rect), 52 * 52 * 4);

        let mut efb = Efb::new();
        efb.set_depth(0, 0, 0x123456);
        efb.set_depth(49, 49, DEPTH_MAX);

        let target = ReadbackTarget::with_len(depth_copy_len(rect));
        efb.copy_depth_into(rect, &target);

        let bytes = target.bytes();
        assert_eq!(&bytes[0..4], &[0, 0x12, 0x34, 0x56]);
        let last = ((49 * 52 + 49) * 4) as usize;
        assert_eq!(&bytes[last..last + 4], &[0, 0xff, 0xff, 0xff]);
        // Pad texel to the right of the last rect column.
        let pad = ((49 * 52 + 50) * 4) as usize;
        assert_eq!(&bytes[pad..pad + 4], &[0, 0, 0, 0]);
        // Pad rows below the rect.
        assert!(bytes[(50 * 52 * 4)..].iter().all(|&b| b == 0));
    }

    #[test]
    fn aligned_rects_need_no_padding() {
        let rect = CopyRect { x: 4, y: 4, width: 8, height: 4 };
        assert_eq!(depth_copy_len(rect), 8 * 4 * 4);
    }
}
