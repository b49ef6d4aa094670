//! Framebuffer readback wrappers.
//!
//! Each snapshot owns a [`ReadbackTarget`] sized for the suite's copy
//! rectangle and decodes the wire layout on access. Requesting a copy
//! only queues it; samples are meaningful after the sink's
//! `wait_idle`.

use galena_protocol::{CommandSink, CopyRect, ReadbackTarget, Rgba8};

/// The framebuffer rectangle every suite copy reads, matching the
/// render viewport.
pub const COPY_RECT: CopyRect = CopyRect { x: 20, y: 20, width: 50, height: 50 };

const fn align4(v: u32) -> u32 {
    (v + 3) & !3
}

/// A depth copy of [`COPY_RECT`] in the padded 24-bit texel layout.
#[derive(Clone, Debug)]
pub struct DepthSnapshot {
    target: ReadbackTarget,
}

impl DepthSnapshot {
    /// Width of the copied grid after alignment padding.
    pub const PADDED_WIDTH: u32 = align4(COPY_RECT.width);
    /// Height of the copied grid after alignment padding.
    pub const PADDED_HEIGHT: u32 = align4(COPY_RECT.height);

    pub fn new() -> Self {
        let len = (Self::PADDED_WIDTH * Self::PADDED_HEIGHT * 4) as usize;
        Self { target: ReadbackTarget::with_len(len) }
    }

    /// Queues a copy into this snapshot's buffer. A copy overwrites
    /// the whole buffer, so snapshots can be reused across passes.
    pub fn request<S: CommandSink>(&self, sink: &mut S) {
        sink.copy_depth(COPY_RECT, &self.target);
    }

    pub fn bytes(&self) -> Vec<u8> {
        self.target.bytes()
    }

    /// 24-bit depth at rect-relative `(x, y)`.
    pub fn sample(&self, x: u32, y: u32) -> u32 {
        assert!(x < COPY_RECT.width && y < COPY_RECT.height);
        let bytes = self.target.bytes();
        let at = ((y * Self::PADDED_WIDTH + x) * 4) as usize;
        u32::from(bytes[at + 1]) << 16 | u32::from(bytes[at + 2]) << 8 | u32::from(bytes[at + 3])
    }
}

impl Default for DepthSnapshot {
    fn default() -> Self {
        Self::new()
    }
}

/// Byte-for-byte comparison over the full padded extent.
pub fn depth_snapshots_match(a: &DepthSnapshot, b: &DepthSnapshot) -> bool {
    a.bytes() == b.bytes()
}

/// A color copy of [`COPY_RECT`] as tightly packed RGBA8 rows.
#[derive(Clone, Debug)]
pub struct ColorSnapshot {
    target: ReadbackTarget,
}

impl ColorSnapshot {
    pub const WIDTH: u32 = COPY_RECT.width;
    pub const HEIGHT: u32 = COPY_RECT.height;

    pub fn new() -> Self {
        Self { target: ReadbackTarget::with_len((Self::WIDTH * Self::HEIGHT * 4) as usize) }
    }

    pub fn request<S: CommandSink>(&self, sink: &mut S) {
        sink.copy_color(COPY_RECT, &self.target);
    }

    pub fn bytes(&self) -> Vec<u8> {
        self.target.bytes()
    }

    /// Color at rect-relative `(x, y)`.
    pub fn sample(&self, x: u32, y: u32) -> Rgba8 {
        assert!(x < Self::WIDTH && y < Self::HEIGHT);
        let bytes = self.target.bytes();
        let at = ((y * Self::WIDTH + x) * 4) as usize;
        Rgba8::new(bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3])
    }

    /// Box-filtered color centered on `(x, y)`, for reads that must
    /// tolerate edge filtering on real hardware. The window is clipped
    /// to the rect, never wrapped.
    pub fn sample_averaged(&self, x: u32, y: u32, radius: u32) -> Rgba8 {
        let x0 = x.saturating_sub(radius);
        let y0 = y.saturating_sub(radius);
        let x1 = (x + radius).min(Self::WIDTH - 1);
        let y1 = (y + radius).min(Self::HEIGHT - 1);

        let mut sums = [0u32; 4];
        let mut count = 0u32;
        for sy in y0..=y1 {
            for sx in x0..=x1 {
                let c = self.sample(sx, sy);
                sums[0] += u32::from(c.r);
                sums[1] += u32::from(c.g);
                sums[2] += u32::from(c.b);
                sums[3] += u32::from(c.a);
                count += 1;
            }
        }
        let avg = |sum: u32| ((sum + count / 2) / count) as u8;
        Rgba8::new(avg(sums[0]), avg(sums[1]), avg(sums[2]), avg(sums[3]))
    }
}

impl Default for ColorSnapshot {
    fn default() -> Self {
        Self::new()
    }
}
