#![forbid(unsafe_code)]

//! Software reference model of the Galena rasterizer.
//!
//! [`GalenaGpu`] consumes the `galena-protocol` command stream the same
//! way the hardware does: submission only queues work, and effects
//! (register state, framebuffer writes, readback copies) become
//! observable once [`CommandSink::wait_idle`] drains the queue. The
//! model exists to pin down the depth pipeline precisely, in particular
//! the recorded depth plane behind the GEN_MODE freeze bit, so the
//! validation harness can run against it and against captures from real
//! hardware interchangeably.

mod efb;
mod raster;

pub use efb::{depth_copy_len, Efb, DEPTH_MAX, EFB_HEIGHT, EFB_WIDTH};

use std::collections::VecDeque;

use galena_protocol::regs::{
    self, CombinerSrc, DepthFormat, GenMode, PeControl, PixelFormat, StageOrder, TevAlpha,
    TevColor, ZMode,
};
use galena_protocol::xf::{self, ChannelCtrl, MaterialSource, Viewport};
use galena_protocol::{Command, CommandSink, Rgba8, Vertex};
use tracing::{debug, warn};

use raster::DepthPlane;

pub const MAX_STAGES: usize = 8;

/// Raster and transform register state, at the documented boot values.
struct RegFile {
    gen_mode: GenMode,
    z_mode: ZMode,
    pe_control: PeControl,
    stage_order: StageOrder,
    tev_color: [TevColor; MAX_STAGES],
    tev_alpha: [TevAlpha; MAX_STAGES],
    num_channels: u32,
    chan0_color_ctrl: ChannelCtrl,
    chan0_alpha_ctrl: ChannelCtrl,
    chan0_material: Rgba8,
    viewport_words: [u32; Viewport::WORD_COUNT],
}

impl Default for RegFile {
    fn default() -> Self {
        let full_screen = Viewport {
            x: 0.0,
            y: 0.0,
            width: EFB_WIDTH as f32,
            height: EFB_HEIGHT as f32,
            depth_near: 0.0,
            depth_far: 1.0,
        };
        Self {
            gen_mode: GenMode::default(),
            z_mode: ZMode::default(),
            pe_control: PeControl::default(),
            stage_order: StageOrder::default(),
            tev_color: std::array::from_fn(|n| TevColor::stage(n as u8)),
            tev_alpha: std::array::from_fn(|n| TevAlpha::stage(n as u8)),
            num_channels: 0,
            chan0_color_ctrl: ChannelCtrl::default(),
            chan0_alpha_ctrl: ChannelCtrl::default(),
            chan0_material: Rgba8::new(0xff, 0xff, 0xff, 0xff),
            viewport_words: full_screen.to_words(),
        }
    }
}

impl RegFile {
    fn viewport(&self) -> Viewport {
        Viewport::from_words(self.viewport_words)
    }
}

/// The reference rasterizer.
pub struct GalenaGpu {
    queue: VecDeque<Command>,
    submitted: u64,
    retired: u64,
    regs: RegFile,
    efb: Efb,
    /// Depth plane of the last primitive that survived rejection,
    /// degeneracy, and culling. Only advances while the freeze bit is
    /// clear; boots to a flat far plane.
    freeze_plane: DepthPlane,
    warned_depth_format: bool,
}

impl GalenaGpu {
    pub fn new() -> Self {
        Self {
            queue: VecDeque::new(),
            submitted: 0,
            retired: 0,
            regs: RegFile::default(),
            efb: Efb::new(),
            freeze_plane: DepthPlane::flat(0.0),
            warned_depth_format: false,
        }
    }

    /// Commands accepted so far.
    pub fn submitted_fence(&self) -> u64 {
        self.submitted
    }

    /// Commands fully executed so far.
    pub fn retired_fence(&self) -> u64 {
        self.retired
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Direct framebuffer access, for inspection by tests and debug
    /// tooling. Commands still in the queue are not reflected.
    pub fn efb(&self) -> &Efb {
        &self.efb
    }

    fn execute(&mut self, command: Command) {
        match command {
            Command::LoadRaster(word) => self.load_raster_word(word),
            Command::LoadXf { base, words } => {
                for (i, word) in words.into_iter().enumerate() {
                    self.load_xf_word(base.wrapping_add(i as u16), word);
                }
            }
            Command::DrawQuad { vertices } => self.draw_quad_now(vertices),
            Command::CopyColor { rect, target } => self.efb.copy_color_into(rect, &target),
            Command::CopyDepth { rect, target } => self.efb.copy_depth_into(rect, &target),
        }
    }

    fn load_raster_word(&mut self, word: u32) {
        let addr = regs::word_addr(word);
        match addr {
            GenMode::ADDR => self.regs.gen_mode = GenMode::from_word(word),
            ZMode::ADDR => self.regs.z_mode = ZMode::from_word(word),
            PeControl::ADDR => {
                self.regs.pe_control = PeControl::from_word(word);
                let format = self.regs.pe_control.depth_format();
                if format != DepthFormat::Linear && !self.warned_depth_format {
                    self.warned_depth_format = true;
                    warn!(?format, "compressed depth encoding stored but evaluated as linear");
                }
            }
            StageOrder::ADDR => self.regs.stage_order = StageOrder::from_word(word),
            _ => {
                if let Some(stage) = TevColor::stage_for_addr(addr) {
                    self.regs.tev_color[usize::from(stage)] = TevColor::from_word(word);
                } else if let Some(stage) = TevAlpha::stage_for_addr(addr) {
                    self.regs.tev_alpha[usize::from(stage)] = TevAlpha::from_word(word);
                } else {
                    warn!(addr, word, "raster load to unknown address ignored");
                }
            }
        }
    }

    fn load_xf_word(&mut self, addr: u16, word: u32) {
        if let Some(index) = xf::viewport_word_index(addr) {
            self.regs.viewport_words[index] = word;
            return;
        }
        match addr {
            xf::NUM_CHANNELS => self.regs.num_channels = word,
            xf::CHAN0_COLOR_CTRL => self.regs.chan0_color_ctrl = ChannelCtrl::from_word(word),
            xf::CHAN0_ALPHA_CTRL => self.regs.chan0_alpha_ctrl = ChannelCtrl::from_word(word),
            xf::CHAN0_MATERIAL => self.regs.chan0_material = xf::unpack_material(word),
            _ => warn!(addr, word, "transform load to unknown address ignored"),
        }
    }

    fn draw_quad_now(&mut self, vertices: [Vertex; 4]) {
        // Corners arrive top-left, top-right, bottom-right, bottom-left
        // and split along the top-left/bottom-right diagonal. The
        // second triangle is rasterized last, so its plane is the one a
        // subsequent freeze observes.
        const SPLIT: [[usize; 3]; 2] = [[0, 1, 2], [0, 2, 3]];
        let viewport = self.regs.viewport();
        for indices in SPLIT {
            self.draw_triangle(indices.map(|i| vertices[i]), &viewport);
        }
    }

    fn draw_triangle(&mut self, vertices: [Vertex; 3], viewport: &Viewport) {
        if raster::outside_clip_volume(&vertices) {
            debug!("triangle fully outside the clip volume, dropped");
            return;
        }
        let screen = vertices.map(|v| raster::to_screen(v, viewport));
        let Some(setup) = raster::TriangleSetup::new(screen) else {
            debug!("degenerate triangle, dropped");
            return;
        };
        if setup.culled(self.regs.gen_mode.cull()) {
            return;
        }

        if !self.regs.gen_mode.zfreeze() {
            self.freeze_plane = setup.plane();
        }
        let depth_plane =
            if self.regs.gen_mode.zfreeze() { self.freeze_plane } else { setup.plane() };
        self.fill(&setup, depth_plane);
    }

    fn fill(&mut self, setup: &raster::TriangleSetup, depth_plane: DepthPlane) {
        let z_mode = self.regs.z_mode;
        let pixel_format = self.regs.pe_control.pixel_format();

        let (min_x, min_y, max_x, max_y) = setup.bounds();
        let min_x = min_x.max(0);
        let min_y = min_y.max(0);
        let max_x = max_x.min(i64::from(EFB_WIDTH) - 1);
        let max_y = max_y.min(i64::from(EFB_HEIGHT) - 1);

        for py in min_y..=max_y {
            for px in min_x..=max_x {
                // Sample at pixel centers.
                let cx = px as f64 + 0.5;
                let cy = py as f64 + 0.5;
                let Some(bary) = setup.barycentric_at(cx, cy) else {
                    continue;
                };
                let (x, y) = (px as u32, py as u32);

                // The frozen plane replaces interpolation for the test
                // and for the value written back.
                let depth = raster::quantize_depth(depth_plane.eval(cx, cy));
                if z_mode.test_enable() {
                    if !raster::depth_test_passes(z_mode.compare(), depth, self.efb.depth_at(x, y))
                    {
                        continue;
                    }
                    if z_mode.update_enable() {
                        self.efb.set_depth(x, y, depth);
                    }
                }

                if pixel_format == PixelFormat::Z24 {
                    continue;
                }
                let shaded = self.shade(setup.color_at(bary));
                let stored = match pixel_format {
                    PixelFormat::Rgba6Z24 => shaded,
                    // The other formats have no alpha plane.
                    _ => Rgba8 { a: 0xff, ..shaded },
                };
                self.efb.set_color(x, y, stored);
            }
        }
    }

    /// Runs the combiner chain for one fragment. Channel 0 is the only
    /// rasterized channel; the stage order register selects it for
    /// every modeled stage.
    fn shade(&self, interpolated: Rgba8) -> Rgba8 {
        let raster_rgb = match self.regs.chan0_color_ctrl.material_source() {
            MaterialSource::Vertex => interpolated,
            MaterialSource::Register => self.regs.chan0_material,
        };
        let raster_a = match self.regs.chan0_alpha_ctrl.material_source() {
            MaterialSource::Vertex => interpolated.a,
            MaterialSource::Register => self.regs.chan0_material.a,
        };

        let mut prev = Rgba8::new(0, 0, 0, 0);
        for stage in 0..self.regs.gen_mode.stage_count() as usize {
            let color = self.regs.tev_color[stage];
            let alpha = self.regs.tev_alpha[stage];
            let stage_input = prev;
            let rgb_operand = |src: CombinerSrc, channel: fn(Rgba8) -> u8| match src {
                CombinerSrc::Zero => 0,
                CombinerSrc::One => 0xff,
                CombinerSrc::Prev => channel(stage_input),
                CombinerSrc::Raster => channel(raster_rgb),
            };
            let a_operand = |src: CombinerSrc| match src {
                CombinerSrc::Zero => 0,
                CombinerSrc::One => 0xff,
                CombinerSrc::Prev => stage_input.a,
                CombinerSrc::Raster => raster_a,
            };
            prev = Rgba8 {
                r: combine(
                    rgb_operand(color.a(), |c| c.r),
                    rgb_operand(color.b(), |c| c.r),
                    rgb_operand(color.c(), |c| c.r),
                    rgb_operand(color.d(), |c| c.r),
                ),
                g: combine(
                    rgb_operand(color.a(), |c| c.g),
                    rgb_operand(color.b(), |c| c.g),
                    rgb_operand(color.c(), |c| c.g),
                    rgb_operand(color.d(), |c| c.g),
                ),
                b: combine(
                    rgb_operand(color.a(), |c| c.b),
                    rgb_operand(color.b(), |c| c.b),
                    rgb_operand(color.c(), |c| c.b),
                    rgb_operand(color.d(), |c| c.b),
                ),
                a: combine(
                    a_operand(alpha.a()),
                    a_operand(alpha.b()),
                    a_operand(alpha.c()),
                    a_operand(alpha.d()),
                ),
            };
        }
        prev
    }
}

impl Default for GalenaGpu {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandSink for GalenaGpu {
    fn submit(&mut self, command: Command) {
        self.queue.push_back(command);
        self.submitted += 1;
    }

    fn wait_idle(&mut self) {
        while let Some(command) = self.queue.pop_front() {
            self.execute(command);
            self.retired += 1;
        }
    }
}

/// One combiner stage for one channel: `d + a * (1 - c) + b * c`, with
/// `c` applied as a 0..=1 blend factor.
fn combine(a: u8, b: u8, c: u8, d: u8) -> u8 {
    let t = f64::from(c) / 255.0;
    let value = f64::from(d) + f64::from(a) * (1.0 - t) + f64::from(b) * t;
    value.round().clamp(0.0, 255.0) as u8
}
