//! The subtest catalog and orchestration.
//!
//! One [`run`] owns the full lifecycle: bring-up, an initial clear,
//! then each selected subtest in catalog order against shared state.
//! Subtests after the first are responsible for their own clear, which
//! keeps them meaningful when a filter runs them in isolation.

use galena_protocol::{CommandSink, NullSink};
use thiserror::Error;
use tracing::info;

use crate::check::Checks;
use crate::pipeline::Pipeline;
use crate::quad::Quad;
use crate::report::{Outcome, SubtestResult, SuiteReport};
use crate::snapshot::{depth_snapshots_match, ColorSnapshot, DepthSnapshot};

#[derive(Debug, Error)]
pub enum SuiteError {
    #[error("filter {0:?} matches no subtest")]
    FilterMatchesNothing(String),
}

/// Framebuffer copies taken right after a subtest finished, for
/// operator inspection and image dumps.
pub struct EfbCapture {
    pub color: ColorSnapshot,
    pub depth: DepthSnapshot,
}

/// Called after each subtest retires.
pub type Observer<'a> = Box<dyn FnMut(&SubtestResult, Option<&EfbCapture>) + 'a>;

pub struct SuiteOptions<'a> {
    /// Case-sensitive substring selecting subtests by name.
    pub filter: Option<String>,
    /// Copy the framebuffer after each subtest and hand it to the
    /// observer.
    pub capture: bool,
    pub observer: Option<Observer<'a>>,
}

impl Default for SuiteOptions<'_> {
    fn default() -> Self {
        Self { filter: None, capture: false, observer: None }
    }
}

/// State threaded through the subtests, mirroring what a manual
/// operator would keep on hand: the shadowed pipeline, the two working
/// quads, and a pair of reusable depth snapshots.
struct SuiteState {
    pipeline: Pipeline,
    /// Sloped quad establishing depth: 0.2 at the top-left corner,
    /// 0.8 at the bottom-right, 0.5 on the other diagonal. Blue.
    depth_quad: Quad,
    /// Flat red quad at depth 0.5 used to probe the depth state.
    probe_quad: Quad,
    depth_before: DepthSnapshot,
    depth_after: DepthSnapshot,
}

impl SuiteState {
    fn bring_up<S: CommandSink>(sink: &mut S) -> Self {
        let mut pipeline = Pipeline::bring_up(sink);
        pipeline.clear(sink);

        let mut depth_quad = Quad::new();
        depth_quad
            .color_rgba(0, 0, 0xff, 0xff)
            .top_left(-1.0, 1.0, 0.2)
            .bottom_left(-1.0, -1.0, 0.5)
            .top_right(1.0, 1.0, 0.5)
            .bottom_right(1.0, -1.0, 0.8);

        let mut probe_quad = Quad::new();
        probe_quad.at_depth(0.5).color_rgba(0xff, 0, 0, 0xff);

        Self {
            pipeline,
            depth_quad,
            probe_quad,
            depth_before: DepthSnapshot::new(),
            depth_after: DepthSnapshot::new(),
        }
    }
}

type Subtest<S> = fn(&mut S, &mut SuiteState) -> Outcome;

fn catalog<S: CommandSink>() -> [(&'static str, Subtest<S>); 9] {
    [
        ("depth-buffer-baseline", depth_buffer_baseline::<S>),
        ("zfreeze-basic", zfreeze_basic::<S>),
        ("random-polygons", random_polygons::<S>),
        ("polygons-outside-frozen-plane", polygons_outside_frozen_plane::<S>),
        ("clipped-probe", clipped_probe::<S>),
        ("clipped-freeze-candidate", clipped_freeze_candidate::<S>),
        ("freeze-plane-outside-clip", freeze_plane_outside_clip::<S>),
        ("non-planar-freeze-plane", non_planar_freeze_plane::<S>),
        ("depth-compare-equal-edge", depth_compare_equal_edge::<S>),
    ]
}

/// Names of every subtest, in execution order.
pub fn subtest_names() -> Vec<&'static str> {
    catalog::<NullSink>().into_iter().map(|(name, _)| name).collect()
}

/// Runs the catalog (or the subset selected by the filter) against
/// `sink` and collects a report. Failed expectations never abort the
/// run; they are recorded per subtest.
pub fn run<S: CommandSink>(
    sink: &mut S,
    mut options: SuiteOptions<'_>,
) -> Result<SuiteReport, SuiteError> {
    let selected: Vec<_> = catalog::<S>()
        .into_iter()
        .filter(|(name, _)| options.filter.as_deref().map_or(true, |f| name.contains(f)))
        .collect();
    if selected.is_empty() {
        return Err(SuiteError::FilterMatchesNothing(options.filter.unwrap_or_default()));
    }

    let mut state = SuiteState::bring_up(sink);
    let mut report = SuiteReport::default();
    for (name, subtest) in selected {
        info!(subtest = name, "running");
        let outcome = subtest(sink, &mut state);
        let result = SubtestResult { name, outcome };

        let capture = if options.capture {
            let color = ColorSnapshot::new();
            let depth = DepthSnapshot::new();
            color.request(sink);
            depth.request(sink);
            sink.wait_idle();
            Some(EfbCapture { color, depth })
        } else {
            None
        };
        if let Some(observer) = options.observer.as_mut() {
            observer(&result, capture.as_ref());
        }
        report.results.push(result);
    }
    Ok(report)
}

/// A sloped quad then a flat probe with the depth test live: the probe
/// wins only where it is nearer, and its depth writes change the
/// buffer. Runs against the bring-up clear.
fn depth_buffer_baseline<S: CommandSink>(sink: &mut S, state: &mut SuiteState) -> Outcome {
    let mut checks = Checks::new();

    state.depth_quad.draw(sink);
    state.depth_before.request(sink);
    state.probe_quad.draw(sink);
    state.depth_after.request(sink);
    let color = ColorSnapshot::new();
    color.request(sink);
    sink.wait_idle();

    let top_left = color.sample(15, 15);
    let bottom_right = color.sample(35, 35);
    checks.expect(
        "top-left sample keeps the nearer sloped quad",
        top_left.r == 0 && top_left.b == 0xff,
    );
    checks.expect(
        "bottom-right sample takes the probe",
        bottom_right.r == 0xff && bottom_right.b == 0,
    );
    checks.expect(
        "probe writes moved the depth buffer",
        !depth_snapshots_match(&state.depth_before, &state.depth_after),
    );
    checks.into_outcome()
}

/// The same probe drawn frozen: it rasterizes with the recorded
/// plane's depth for both the test and the write, so it lands
/// everywhere the plane already won and leaves the depth buffer
/// byte-identical.
fn zfreeze_basic<S: CommandSink>(sink: &mut S, state: &mut SuiteState) -> Outcome {
    let mut checks = Checks::new();

    state.pipeline.clear(sink);
    state.depth_quad.draw(sink);
    state.depth_before.request(sink);
    state.pipeline.set_zfreeze(sink, true);
    state.probe_quad.draw(sink);
    state.depth_after.request(sink);
    let color = ColorSnapshot::new();
    color.request(sink);
    sink.wait_idle();

    let top_left = color.sample(15, 15);
    let bottom_right = color.sample(35, 35);
    checks.expect(
        "top-left sample takes the frozen probe",
        top_left.r == 0xff && top_left.b == 0,
    );
    checks.expect(
        "bottom-right sample takes the frozen probe",
        bottom_right.r == 0xff && bottom_right.b == 0,
    );
    checks.expect(
        "frozen writes left the depth buffer byte-identical",
        depth_snapshots_match(&state.depth_before, &state.depth_after),
    );
    checks.into_outcome()
}

/// Intended coverage: a randomized polygon soup whose frozen depths
/// are cross-checked against an independently computed plane.
fn random_polygons<S: CommandSink>(_sink: &mut S, _state: &mut SuiteState) -> Outcome {
    Outcome::NotImplemented
}

/// Intended coverage: probes drawn entirely outside the footprint of
/// the primitive that recorded the plane.
fn polygons_outside_frozen_plane<S: CommandSink>(
    _sink: &mut S,
    _state: &mut SuiteState,
) -> Outcome {
    Outcome::NotImplemented
}

/// A frozen probe that is itself beyond the far plane never
/// rasterizes: clipping rejects the primitive before plane
/// substitution could save it.
fn clipped_probe<S: CommandSink>(sink: &mut S, state: &mut SuiteState) -> Outcome {
    let mut checks = Checks::new();

    state.pipeline.clear(sink);
    state.depth_quad.draw(sink);
    state.pipeline.set_zfreeze(sink, true);
    Quad::new().at_depth(1.1).color_rgba(0xff, 0, 0, 0xff).draw(sink);
    let color = ColorSnapshot::new();
    color.request(sink);
    sink.wait_idle();

    let top_left = color.sample(15, 15);
    let bottom_right = color.sample(35, 35);
    checks.expect(
        "top-left sample keeps the sloped quad",
        top_left.r == 0 && top_left.b == 0xff,
    );
    checks.expect(
        "bottom-right sample keeps the sloped quad",
        bottom_right.r == 0 && bottom_right.b == 0xff,
    );
    checks.into_outcome()
}

/// A fully clipped quad must not take over the recorded plane: the
/// probe still freezes to the flat green quad drawn before it, matches
/// its depth exactly, and wins the GreaterOrEqual test everywhere.
fn clipped_freeze_candidate<S: CommandSink>(sink: &mut S, state: &mut SuiteState) -> Outcome {
    let mut checks = Checks::new();

    state.pipeline.clear(sink);
    Quad::new().at_depth(0.55).color_rgba(0, 0xff, 0, 0xff).draw(sink);
    state
        .depth_quad
        .top_left(1.1, 1.0, 0.8)
        .bottom_left(1.1, -1.0, 0.2)
        .top_right(1.3, 1.0, 0.8)
        .bottom_right(1.3, -1.0, 0.2);
    state.depth_quad.draw(sink);
    state.pipeline.set_zfreeze(sink, true);
    state.probe_quad.draw(sink);
    let color = ColorSnapshot::new();
    color.request(sink);
    sink.wait_idle();

    let top_left = color.sample(15, 15);
    let bottom_right = color.sample(35, 35);
    checks.expect(
        "top-left sample takes the probe over the green fill",
        top_left.r == 0xff && top_left.g == 0,
    );
    checks.expect(
        "bottom-right sample takes the probe over the green fill",
        bottom_right.r == 0xff && bottom_right.g == 0,
    );
    checks.into_outcome()
}

/// Intended coverage: freeze to a plane that extends beyond the depth
/// range without being clipped, then probe inside the range.
fn freeze_plane_outside_clip<S: CommandSink>(_sink: &mut S, _state: &mut SuiteState) -> Outcome {
    Outcome::NotImplemented
}

/// A folded quad rasterizes as two distinct planes; the freeze records
/// the second (lower-left) triangle's plane, and frozen depth writes
/// persist that plane into the buffer for later draws to test against.
fn non_planar_freeze_plane<S: CommandSink>(sink: &mut S, state: &mut SuiteState) -> Outcome {
    let mut checks = Checks::new();

    state.pipeline.clear(sink);
    let mut folded = Quad::new();
    folded
        .color_rgba(0, 0, 0xff, 0xff)
        .top_left(-1.0, 1.0, 0.5)
        .bottom_left(-1.0, -1.0, 1.0)
        .top_right(1.0, 1.0, 1.0)
        .bottom_right(1.0, -1.0, 0.5);
    folded.draw(sink);
    state.pipeline.set_zfreeze(sink, true);
    state.probe_quad.draw(sink);
    state.pipeline.set_zfreeze(sink, false);
    Quad::new().at_depth(0.5).color_rgba(0, 0xff, 0, 0xff).draw(sink);
    let color = ColorSnapshot::new();
    color.request(sink);
    sink.wait_idle();

    // The frozen probe wrote the recorded plane's depth, which is near
    // on the upper-right half and far on the lower-left half, so the
    // follow-up green quad splits along the fold.
    let upper_right = color.sample(35, 15);
    let lower_left = color.sample(15, 35);
    checks.expect(
        "upper-right sample keeps the probe",
        upper_right.r == 0xff && upper_right.g == 0,
    );
    checks.expect(
        "lower-left sample takes the later green quad",
        lower_left.r == 0 && lower_left.g == 0xff,
    );
    checks.into_outcome()
}

/// Intended coverage: Equal and GreaterOrEqual compares against a
/// frozen plane that exactly matches the stored depth.
fn depth_compare_equal_edge<S: CommandSink>(_sink: &mut S, _state: &mut SuiteState) -> Outcome {
    Outcome::NotImplemented
}
