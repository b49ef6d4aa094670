//! Fixed-function state management for the suite.
//!
//! The registers themselves are write-only on the wire, so [`Pipeline`]
//! keeps a shadow of the two words it rewrites (GEN_MODE and Z_MODE)
//! and derives every load from that shadow. Single-shot configuration
//! happens once in [`Pipeline::bring_up`].

use galena_protocol::regs::{
    CombinerSrc, DepthCompare, DepthFormat, GenMode, PeControl, PixelFormat, StageOrder, TevAlpha,
    TevColor, ZMode,
};
use galena_protocol::xf::{self, ChannelCtrl, MaterialSource, Viewport};
use galena_protocol::CommandSink;

use crate::quad::Quad;

/// The viewport every suite pass renders into. Small and offset from
/// the framebuffer origin so out-of-rect writes are detectable.
pub const VIEWPORT: Viewport = Viewport {
    x: 20.0,
    y: 20.0,
    width: 50.0,
    height: 50.0,
    depth_near: 0.0,
    depth_far: 1.0,
};

/// Shadowed raster state plus the bring-up recipe.
pub struct Pipeline {
    gen_mode: GenMode,
    z_mode: ZMode,
}

impl Pipeline {
    /// Configures a single pass-through combiner stage fed by vertex
    /// color, an opaque RGB8 framebuffer with linear 24-bit depth, and
    /// the suite viewport. Depth testing is left disabled; the first
    /// [`Pipeline::clear`] establishes it.
    pub fn bring_up<S: CommandSink>(sink: &mut S) -> Self {
        sink.load_raster(StageOrder::default().word());

        sink.load_xf(xf::NUM_CHANNELS, vec![1]);
        let mut ctrl = ChannelCtrl::default();
        ctrl.set_material_source(MaterialSource::Vertex);
        sink.load_xf(xf::CHAN0_COLOR_CTRL, vec![ctrl.word()]);
        sink.load_xf(xf::CHAN0_ALPHA_CTRL, vec![ctrl.word()]);

        sink.load_raster(TevAlpha::stage(0).word());

        let gen_mode = GenMode::default();
        sink.load_raster(gen_mode.word());

        let mut pe = PeControl::default();
        pe.set_pixel_format(PixelFormat::Rgb8Z24);
        pe.set_depth_format(DepthFormat::Linear);
        pe.set_early_depth_test(false);
        sink.load_raster(pe.word());

        sink.load_xf(xf::VIEWPORT_BASE, VIEWPORT.to_words().to_vec());

        let mut tev = TevColor::stage(0);
        tev.set_d(CombinerSrc::Raster);
        sink.load_raster(tev.word());

        Self { gen_mode, z_mode: ZMode::default() }
    }

    /// Flips the depth-plane freeze bit, leaving the rest of GEN_MODE
    /// as configured.
    pub fn set_zfreeze<S: CommandSink>(&mut self, sink: &mut S, frozen: bool) {
        self.gen_mode.set_zfreeze(frozen);
        sink.load_raster(self.gen_mode.word());
    }

    /// Enables depth testing and depth writes with `compare`.
    pub fn set_depth_test<S: CommandSink>(&mut self, sink: &mut S, compare: DepthCompare) {
        self.z_mode.set_test_enable(true);
        self.z_mode.set_compare(compare);
        self.z_mode.set_update_enable(true);
        sink.load_raster(self.z_mode.word());
    }

    /// Resets the render target between subtests: freeze off, then a
    /// full-viewport black quad at the far plane written with the
    /// compare forced to Always, then the working GreaterOrEqual test.
    ///
    /// The clear quad rasterizes like any other primitive, so it also
    /// leaves the recorded depth plane flat at the far plane.
    pub fn clear<S: CommandSink>(&mut self, sink: &mut S) {
        self.set_zfreeze(sink, false);
        self.set_depth_test(sink, DepthCompare::Always);
        Quad::new().color_rgba(0, 0, 0, 0xff).draw(sink);
        self.set_depth_test(sink, DepthCompare::GreaterOrEqual);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use galena_protocol::{Command, RecordingSink};
    use pretty_assertions::assert_eq;

    #[test]
    fn bring_up_emits_the_documented_word_sequence() {
        let mut sink = RecordingSink::default();
        Pipeline::bring_up(&mut sink);

        assert_eq!(
            sink.commands,
            vec![
                Command::LoadRaster(0x0300_0000),
                Command::LoadXf { base: 0x0040, words: vec![1] },
                Command::LoadXf { base: 0x0041, words: vec![1] },
                Command::LoadXf { base: 0x0042, words: vec![1] },
                Command::LoadRaster(0x1100_0000),
                Command::LoadRaster(0x0000_0000),
                Command::LoadRaster(0x0200_0000),
                Command::LoadXf {
                    base: 0x0050,
                    words: vec![
                        0x41a0_0000, // 20.0
                        0x41a0_0000,
                        0x4248_0000, // 50.0
                        0x4248_0000,
                        0x0000_0000, // 0.0
                        0x3f80_0000, // 1.0
                    ],
                },
                Command::LoadRaster(0x1000_00c0),
            ]
        );
    }

    #[test]
    fn clear_brackets_the_fill_with_compare_modes() {
        let mut sink = RecordingSink::default();
        let mut pipeline = Pipeline::bring_up(&mut sink);
        sink.commands.clear();

        pipeline.clear(&mut sink);

        assert_eq!(sink.commands.len(), 4);
        assert_eq!(sink.commands[0], Command::LoadRaster(0x0000_0000), "freeze off first");
        assert_eq!(sink.commands[1], Command::LoadRaster(0x0100_001f), "compare Always");
        assert!(matches!(sink.commands[2], Command::DrawQuad { .. }));
        assert_eq!(sink.commands[3], Command::LoadRaster(0x0100_001d), "compare GreaterOrEqual");

        let Command::DrawQuad { vertices } = sink.commands[2].clone() else {
            unreachable!();
        };
        assert!(vertices.iter().all(|v| v.depth == 1.0));
        assert!(vertices.iter().all(|v| v.color == galena_protocol::Rgba8::new(0, 0, 0, 0xff)));
    }

    #[test]
    fn set_zfreeze_rewrites_only_the_freeze_bit() {
        let mut sink = RecordingSink::default();
        let mut pipeline = Pipeline::bring_up(&mut sink);
        sink.commands.clear();

        pipeline.set_zfreeze(&mut sink, true);
        pipeline.set_zfreeze(&mut sink, false);

        assert_eq!(
            sink.commands,
            vec![Command::LoadRaster(0x0000_0020), Command::LoadRaster(0x0000_0000)]
        );
    }
}
