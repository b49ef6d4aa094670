//! The command stream.
//!
//! A producer (the test harness, a capture replayer) never touches the
//! rasterizer directly; it submits [`Command`]s to a [`CommandSink`] and
//! synchronizes with [`CommandSink::wait_idle`]. Readback results land
//! in caller-owned [`ReadbackTarget`] buffers, which stay stale until
//! the sink has been drained. The same stream can be fed to a software
//! model, a recording sink, or a bridge to real hardware.

use std::sync::{Arc, Mutex};

/// An 8-bit RGBA color, as carried per vertex and stored in the color
/// framebuffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

/// One quad corner in clip space.
///
/// `x` and `y` span -1..=1 across the viewport, `depth` spans 0
/// (near) to 1 (far). The viewport transform inverts depth on the way
/// into the framebuffer, so stored depth grows toward the viewer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Vertex {
    pub x: f32,
    pub y: f32,
    pub depth: f32,
    pub color: Rgba8,
}

/// Framebuffer rectangle for copy-out commands, in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CopyRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Destination buffer for a copy-out command.
///
/// The producer allocates the target and keeps a handle; the consumer
/// writes into it when the copy executes. Contents are unspecified
/// until a [`CommandSink::wait_idle`] that covers the copy returns.
/// Equality is identity of the underlying buffer, not content.
#[derive(Clone, Debug)]
pub struct ReadbackTarget(Arc<Mutex<Vec<u8>>>);

impl ReadbackTarget {
    /// A zero-filled target of `len` bytes.
    pub fn with_len(len: usize) -> Self {
        Self(Arc::new(Mutex::new(vec![0; len])))
    }

    pub fn len(&self) -> usize {
        self.0.lock().expect("readback buffer lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the current contents.
    pub fn bytes(&self) -> Vec<u8> {
        self.0.lock().expect("readback buffer lock poisoned").clone()
    }

    /// Consumer-side entry point: overwrites `bytes` starting at
    /// `offset`.
    ///
    /// Panics if the write runs past the end of the buffer; copy
    /// extents are fixed by the rect that created the command, so that
    /// is a consumer bug rather than a recoverable condition.
    pub fn write(&self, offset: usize, bytes: &[u8]) {
        let mut buf = self.0.lock().expect("readback buffer lock poisoned");
        buf[offset..offset + bytes.len()].copy_from_slice(bytes);
    }
}

impl PartialEq for ReadbackTarget {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for ReadbackTarget {}

/// One unit of work for a [`CommandSink`].
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Load a self-addressed raster register word (see [`crate::regs`]).
    LoadRaster(u32),
    /// Load consecutive transform registers starting at `base` (see
    /// [`crate::xf`]).
    LoadXf { base: u16, words: Vec<u32> },
    /// Draw a quad. Corners are supplied top-left, top-right,
    /// bottom-right, bottom-left; the rasterizer splits along the
    /// top-left/bottom-right diagonal, second triangle last.
    DrawQuad { vertices: [Vertex; 4] },
    /// Copy a color rectangle out of the framebuffer as RGBA8 rows.
    CopyColor { rect: CopyRect, target: ReadbackTarget },
    /// Copy a depth rectangle out of the framebuffer in the tiled
    /// 24-bit layout (see the consumer's documentation for padding).
    CopyDepth { rect: CopyRect, target: ReadbackTarget },
}

/// Ordered, asynchronous consumer of a command stream.
///
/// Implementations must retire commands in submission order but may
/// defer execution arbitrarily; the only synchronization point is
/// [`CommandSink::wait_idle`], after which every effect of every prior
/// command (register state, framebuffer contents, readback writes) must
/// be observable.
pub trait CommandSink {
    fn submit(&mut self, command: Command);

    /// Blocks until all previously submitted commands have retired.
    fn wait_idle(&mut self);

    fn load_raster(&mut self, word: u32) {
        self.submit(Command::LoadRaster(word));
    }

    fn load_xf(&mut self, base: u16, words: Vec<u32>) {
        self.submit(Command::LoadXf { base, words });
    }

    fn draw_quad(&mut self, vertices: [Vertex; 4]) {
        self.submit(Command::DrawQuad { vertices });
    }

    fn copy_color(&mut self, rect: CopyRect, target: &ReadbackTarget) {
        self.submit(Command::CopyColor { rect, target: target.clone() });
    }

    fn copy_depth(&mut self, rect: CopyRect, target: &ReadbackTarget) {
        self.submit(Command::CopyDepth { rect, target: target.clone() });
    }
}

/// Discards everything. Useful when a producer needs a sink but the
/// output does not matter.
#[derive(Debug, Default)]
pub struct NullSink;

impl CommandSink for NullSink {
    fn submit(&mut self, _command: Command) {}

    fn wait_idle(&mut self) {}
}

/// Captures the stream for inspection instead of executing it.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub commands: Vec<Command>,
    pub idle_waits: usize,
}

impl CommandSink for RecordingSink {
    fn submit(&mut self, command: Command) {
        self.commands.push(command);
    }

    fn wait_idle(&mut self) {
        self.idle_waits += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn corner(x: f32, y: f32) -> Vertex {
        Vertex { x, y, depth: 0.5, color: Rgba8::new(0xff, 0, 0, 0xff) }
    }

    #[test]
    fn helpers_build_the_expected_commands_in_order() {
        let mut sink = RecordingSink::default();
        let target = ReadbackTarget::with_len(16);
        let rect = CopyRect { x: 20, y: 20, width: 50, height: 50 };
        let quad = [corner(-1.0, 1.0), corner(1.0, 1.0), corner(1.0, -1.0), corner(-1.0, -1.0)];

        sink.load_raster(0x0100_001d);
        sink.load_xf(0x0040, vec![1]);
        sink.draw_quad(quad);
        sink.copy_depth(rect, &target);
        sink.wait_idle();

        assert_eq!(
            sink.commands,
            vec![
                Command::LoadRaster(0x0100_001d),
                Command::LoadXf { base: 0x0040, words: vec![1] },
                Command::DrawQuad { vertices: quad },
                Command::CopyDepth { rect, target: target.clone() },
            ]
        );
        assert_eq!(sink.idle_waits, 1);
    }

    #[test]
    fn readback_target_starts_zeroed_and_stays_stale_until_written() {
        let target = ReadbackTarget::with_len(8);
        assert_eq!(target.len(), 8);
        assert_eq!(target.bytes(), vec![0; 8]);

        target.write(2, &[0xaa, 0xbb]);
        assert_eq!(target.bytes(), vec![0, 0, 0xaa, 0xbb, 0, 0, 0, 0]);
    }

    #[test]
    fn readback_target_clones_share_storage() {
        let target = ReadbackTarget::with_len(4);
        let consumer_handle = target.clone();
        consumer_handle.write(0, &[1, 2, 3, 4]);
        assert_eq!(target.bytes(), vec![1, 2, 3, 4]);
        assert_eq!(target, consumer_handle);

        // Distinct allocations are never equal, even with equal bytes.
        assert_ne!(target, ReadbackTarget::with_len(4));
    }
}
