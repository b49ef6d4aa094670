#![forbid(unsafe_code)]

//! Validation suite for the Galena rasterizer's depth-plane freeze.
//!
//! The suite drives any [`galena_protocol::CommandSink`] through a
//! fixed sequence of register loads, quad draws, and framebuffer
//! readbacks, then judges the sampled colors and depth snapshots. Run
//! against the software model it pins the intended semantics; run
//! against a bridge to real hardware it validates the model.
//!
//! [`suite::run`] executes the whole catalog (or a filtered subset) and
//! returns a [`report::SuiteReport`]; everything else here is the
//! building blocks it is made of, usable on their own for one-off
//! experiments.

pub mod check;
pub mod pipeline;
pub mod quad;
pub mod report;
pub mod snapshot;
pub mod suite;

pub use check::Checks;
pub use pipeline::Pipeline;
pub use quad::Quad;
pub use report::{Outcome, SubtestResult, SuiteReport};
pub use snapshot::{depth_snapshots_match, ColorSnapshot, DepthSnapshot, COPY_RECT};
pub use suite::{run, subtest_names, EfbCapture, SuiteError, SuiteOptions};
