#![forbid(unsafe_code)]

//! Wire-level types shared by the Galena rasterizer model and the
//! validation harness.
//!
//! The crate deliberately contains no behavior beyond encoding and
//! decoding: raster-state register words ([`regs`]), transform-unit
//! registers ([`xf`]), and the command stream a producer hands to a
//! [`CommandSink`] ([`cmd`]). Anything that interprets these values
//! (rasterization, depth testing, copies) lives behind the sink.

pub mod cmd;
pub mod regs;
pub mod xf;

pub use cmd::{
    Command, CommandSink, CopyRect, NullSink, ReadbackTarget, RecordingSink, Rgba8, Vertex,
};
