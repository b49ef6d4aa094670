//! Raster-state register words.
//!
//! Every raster register is carried on the wire as a single
//! self-describing `u32`: bits `[31:24]` hold the register address and
//! the low 24 bits hold the fields. The newtypes here bake the address
//! into their `Default` value, so a word built from a default plus a few
//! setters is always routable by the consumer without extra bookkeeping.
//!
//! Field layouts follow the Galena bitplanes document; unused bits must
//! be written as zero and are ignored on decode.

/// Address carried in bits `[31:24]` of a raster register word.
pub fn word_addr(word: u32) -> u8 {
    (word >> 24) as u8
}

/// Field payload of a raster register word (low 24 bits).
pub fn word_payload(word: u32) -> u32 {
    word & 0x00ff_ffff
}

/// Depth comparison selected by [`ZMode`].
///
/// Depth in the framebuffer is inverted window depth, so with the
/// standard near-0/far-1 viewport a *larger* value is *nearer* and
/// `GreaterOrEqual` is the usual "nearer or same wins" test.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DepthCompare {
    Never = 0,
    Less = 1,
    Equal = 2,
    LessOrEqual = 3,
    Greater = 4,
    NotEqual = 5,
    GreaterOrEqual = 6,
    Always = 7,
}

impl DepthCompare {
    pub fn from_bits(bits: u32) -> Self {
        match bits & 0b111 {
            0 => Self::Never,
            1 => Self::Less,
            2 => Self::Equal,
            3 => Self::LessOrEqual,
            4 => Self::Greater,
            5 => Self::NotEqual,
            6 => Self::GreaterOrEqual,
            7 => Self::Always,
            _ => unreachable!(),
        }
    }

    pub fn bits(self) -> u32 {
        self as u32
    }
}

/// Face culling selected by [`GenMode`].
///
/// Front-facing means clockwise in screen coordinates (y grows
/// downward).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CullMode {
    None = 0,
    Front = 1,
    Back = 2,
    All = 3,
}

impl CullMode {
    pub fn from_bits(bits: u32) -> Self {
        match bits & 0b11 {
            0 => Self::None,
            1 => Self::Front,
            2 => Self::Back,
            3 => Self::All,
            _ => unreachable!(),
        }
    }

    pub fn bits(self) -> u32 {
        self as u32
    }
}

/// Color format of the embedded framebuffer, selected by [`PeControl`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelFormat {
    /// 8-bit RGB with a 24-bit depth plane. No alpha storage; alpha
    /// reads back as fully opaque.
    Rgb8Z24 = 0,
    Rgba6Z24 = 1,
    Rgb565Z16 = 2,
    /// Depth-only framebuffer. Color writes are dropped.
    Z24 = 3,
}

impl PixelFormat {
    pub fn from_bits(bits: u32) -> Self {
        match bits & 0b111 {
            0 => Self::Rgb8Z24,
            1 => Self::Rgba6Z24,
            2 => Self::Rgb565Z16,
            _ => Self::Z24,
        }
    }

    pub fn bits(self) -> u32 {
        self as u32
    }
}

/// Encoding of depth values in the embedded framebuffer.
///
/// Only `Linear` is exercised by the current test suites; the
/// compressed-range formats exist in the register map and are accepted,
/// but consumers may approximate them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DepthFormat {
    Linear = 0,
    CompressedNear = 1,
    CompressedMid = 2,
    CompressedFar = 3,
}

impl DepthFormat {
    pub fn from_bits(bits: u32) -> Self {
        match bits & 0b111 {
            0 => Self::Linear,
            1 => Self::CompressedNear,
            2 => Self::CompressedMid,
            _ => Self::CompressedFar,
        }
    }

    pub fn bits(self) -> u32 {
        self as u32
    }
}

/// Input selector for one operand of a [`TevColor`] or [`TevAlpha`]
/// stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CombinerSrc {
    Zero = 0,
    One = 1,
    /// Output of the previous stage (zero for stage 0).
    Prev = 2,
    /// Color rasterized from the vertex channel routed to this stage.
    Raster = 3,
}

impl CombinerSrc {
    pub fn from_bits(bits: u32) -> Self {
        match bits & 0b11 {
            0 => Self::Zero,
            1 => Self::One,
            2 => Self::Prev,
            3 => Self::Raster,
            _ => unreachable!(),
        }
    }

    pub fn bits(self) -> u32 {
        self as u32
    }
}

/// GEN_MODE: pipeline shape and the depth-plane freeze bit.
///
/// `Default` is one active stage, no culling, freeze disabled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GenMode(u32);

impl GenMode {
    pub const ADDR: u8 = 0x00;

    const STAGES_MASK: u32 = 0b111; // [2:0] active stages minus one
    const CULL_SHIFT: u32 = 3; // [4:3]
    const ZFREEZE_BIT: u32 = 1 << 5;

    pub fn from_word(word: u32) -> Self {
        Self(word)
    }

    pub fn word(self) -> u32 {
        self.0
    }

    /// Number of active combiner stages, 1..=8.
    pub fn stage_count(self) -> u32 {
        (self.0 & Self::STAGES_MASK) + 1
    }

    pub fn set_stage_count(&mut self, count: u32) {
        let minus_one = count.clamp(1, Self::STAGES_MASK + 1) - 1;
        self.0 = (self.0 & !Self::STAGES_MASK) | minus_one;
    }

    pub fn cull(self) -> CullMode {
        CullMode::from_bits(self.0 >> Self::CULL_SHIFT)
    }

    pub fn set_cull(&mut self, mode: CullMode) {
        self.0 = (self.0 & !(0b11 << Self::CULL_SHIFT)) | (mode.bits() << Self::CULL_SHIFT);
    }

    /// When set, the rasterizer substitutes its recorded depth plane for
    /// the interpolated depth of every primitive drawn while the bit
    /// stays set. The recorded plane itself only updates while the bit
    /// is clear.
    pub fn zfreeze(self) -> bool {
        self.0 & Self::ZFREEZE_BIT != 0
    }

    pub fn set_zfreeze(&mut self, frozen: bool) {
        if frozen {
            self.0 |= Self::ZFREEZE_BIT;
        } else {
            self.0 &= !Self::ZFREEZE_BIT;
        }
    }
}

impl Default for GenMode {
    fn default() -> Self {
        Self(u32::from(Self::ADDR) << 24)
    }
}

/// Z_MODE: depth test enable, comparison function, and write enable.
///
/// `Default` has the test and writes disabled and compares `Never`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ZMode(u32);

impl ZMode {
    pub const ADDR: u8 = 0x01;

    const TEST_ENABLE_BIT: u32 = 1 << 0;
    const COMPARE_SHIFT: u32 = 1; // [3:1]
    const UPDATE_ENABLE_BIT: u32 = 1 << 4;

    pub fn from_word(word: u32) -> Self {
        Self(word)
    }

    pub fn word(self) -> u32 {
        self.0
    }

    /// With the test disabled the depth buffer is neither read nor
    /// written, regardless of the write enable.
    pub fn test_enable(self) -> bool {
        self.0 & Self::TEST_ENABLE_BIT != 0
    }

    pub fn set_test_enable(&mut self, enable: bool) {
        if enable {
            self.0 |= Self::TEST_ENABLE_BIT;
        } else {
            self.0 &= !Self::TEST_ENABLE_BIT;
        }
    }

    pub fn compare(self) -> DepthCompare {
        DepthCompare::from_bits(self.0 >> Self::COMPARE_SHIFT)
    }

    pub fn set_compare(&mut self, compare: DepthCompare) {
        self.0 =
            (self.0 & !(0b111 << Self::COMPARE_SHIFT)) | (compare.bits() << Self::COMPARE_SHIFT);
    }

    pub fn update_enable(self) -> bool {
        self.0 & Self::UPDATE_ENABLE_BIT != 0
    }

    pub fn set_update_enable(&mut self, enable: bool) {
        if enable {
            self.0 |= Self::UPDATE_ENABLE_BIT;
        } else {
            self.0 &= !Self::UPDATE_ENABLE_BIT;
        }
    }
}

impl Default for ZMode {
    fn default() -> Self {
        Self(u32::from(Self::ADDR) << 24)
    }
}

/// PE_CTRL: framebuffer pixel format, depth encoding, and the early
/// depth test switch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PeControl(u32);

impl PeControl {
    pub const ADDR: u8 = 0x02;

    const PIXEL_FORMAT_MASK: u32 = 0b111; // [2:0]
    const DEPTH_FORMAT_SHIFT: u32 = 3; // [5:3]
    const EARLY_DEPTH_BIT: u32 = 1 << 6;

    pub fn from_word(word: u32) -> Self {
        Self(word)
    }

    pub fn word(self) -> u32 {
        self.0
    }

    pub fn pixel_format(self) -> PixelFormat {
        PixelFormat::from_bits(self.0 & Self::PIXEL_FORMAT_MASK)
    }

    pub fn set_pixel_format(&mut self, format: PixelFormat) {
        self.0 = (self.0 & !Self::PIXEL_FORMAT_MASK) | format.bits();
    }

    pub fn depth_format(self) -> DepthFormat {
        DepthFormat::from_bits(self.0 >> Self::DEPTH_FORMAT_SHIFT)
    }

    pub fn set_depth_format(&mut self, format: DepthFormat) {
        self.0 = (self.0 & !(0b111 << Self::DEPTH_FORMAT_SHIFT))
            | (format.bits() << Self::DEPTH_FORMAT_SHIFT);
    }

    /// Early depth test runs before shading; late runs after. The
    /// outcome is identical for the opaque pipelines modeled here, but
    /// the bit is decoded so streams can be inspected faithfully.
    pub fn early_depth_test(self) -> bool {
        self.0 & Self::EARLY_DEPTH_BIT != 0
    }

    pub fn set_early_depth_test(&mut self, early: bool) {
        if early {
            self.0 |= Self::EARLY_DEPTH_BIT;
        } else {
            self.0 &= !Self::EARLY_DEPTH_BIT;
        }
    }
}

impl Default for PeControl {
    fn default() -> Self {
        Self(u32::from(Self::ADDR) << 24)
    }
}

/// STAGE_ORDER: vertex color channel routed to each pair of combiner
/// stages. Channel 0 everywhere by default.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StageOrder(u32);

impl StageOrder {
    pub const ADDR: u8 = 0x03;

    const EVEN_MASK: u32 = 0b111; // [2:0]
    const ODD_SHIFT: u32 = 4; // [6:4]

    pub fn from_word(word: u32) -> Self {
        Self(word)
    }

    pub fn word(self) -> u32 {
        self.0
    }

    pub fn even_channel(self) -> u32 {
        self.0 & Self::EVEN_MASK
    }

    pub fn set_even_channel(&mut self, channel: u32) {
        self.0 = (self.0 & !Self::EVEN_MASK) | (channel & Self::EVEN_MASK);
    }

    pub fn odd_channel(self) -> u32 {
        (self.0 >> Self::ODD_SHIFT) & Self::EVEN_MASK
    }

    pub fn set_odd_channel(&mut self, channel: u32) {
        self.0 = (self.0 & !(Self::EVEN_MASK << Self::ODD_SHIFT))
            | ((channel & Self::EVEN_MASK) << Self::ODD_SHIFT);
    }
}

impl Default for StageOrder {
    fn default() -> Self {
        Self(u32::from(Self::ADDR) << 24)
    }
}

/// TEV_COLOR[n]: color combiner inputs for one stage.
///
/// The stage computes `d + a * (1 - c) + b * c` per channel, clamped to
/// the representable range. All four operands default to
/// [`CombinerSrc::Zero`], so an untouched stage outputs black.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TevColor(u32);

/// TEV_ALPHA[n]: alpha combiner inputs for one stage. Same layout and
/// semantics as [`TevColor`], one channel wide.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TevAlpha(u32);

macro_rules! combiner_accessors {
    ($ty:ident, $base:literal) => {
        impl $ty {
            pub const BASE_ADDR: u8 = $base;

            const A_SHIFT: u32 = 0;
            const B_SHIFT: u32 = 2;
            const C_SHIFT: u32 = 4;
            const D_SHIFT: u32 = 6;

            /// Word for stage `n` (0..=7) with all operands zeroed.
            pub fn stage(n: u8) -> Self {
                Self(u32::from(Self::BASE_ADDR + 2 * (n & 0b111)) << 24)
            }

            /// Stage index for `addr`, if it belongs to this register
            /// bank.
            pub fn stage_for_addr(addr: u8) -> Option<u8> {
                let offset = addr.checked_sub(Self::BASE_ADDR)?;
                if offset < 16 && offset % 2 == 0 {
                    Some(offset / 2)
                } else {
                    None
                }
            }

            pub fn from_word(word: u32) -> Self {
                Self(word)
            }

            pub fn word(self) -> u32 {
                self.0
            }

            fn src(self, shift: u32) -> CombinerSrc {
                CombinerSrc::from_bits(self.0 >> shift)
            }

            fn set_src(&mut self, shift: u32, src: CombinerSrc) {
                self.0 = (self.0 & !(0b11 << shift)) | (src.bits() << shift);
            }

            pub fn a(self) -> CombinerSrc {
                self.src(Self::A_SHIFT)
            }

            pub fn set_a(&mut self, src: CombinerSrc) {
                self.set_src(Self::A_SHIFT, src);
            }

            pub fn b(self) -> CombinerSrc {
                self.src(Self::B_SHIFT)
            }

            pub fn set_b(&mut self, src: CombinerSrc) {
                self.set_src(Self::B_SHIFT, src);
            }

            pub fn c(self) -> CombinerSrc {
                self.src(Self::C_SHIFT)
            }

            pub fn set_c(&mut self, src: CombinerSrc) {
                self.set_src(Self::C_SHIFT, src);
            }

            pub fn d(self) -> CombinerSrc {
                self.src(Self::D_SHIFT)
            }

            pub fn set_d(&mut self, src: CombinerSrc) {
                self.set_src(Self::D_SHIFT, src);
            }
        }

        impl Default for $ty {
            fn default() -> Self {
                Self::stage(0)
            }
        }
    };
}

combiner_accessors!(TevColor, 0x10);
combiner_accessors!(TevAlpha, 0x11);
