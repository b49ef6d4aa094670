//! End-to-end runs of the validation suite against the software
//! rasterizer model. On hardware these same sequences go out over the
//! bridge; here they pin the reference behavior.

use galena_gpu::GalenaGpu;
use galena_harness::{
    depth_snapshots_match, run, subtest_names, DepthSnapshot, EfbCapture, Pipeline, Quad,
    SubtestResult, SuiteOptions,
};
use galena_protocol::CommandSink;
use pretty_assertions::assert_eq;

#[test]
fn full_suite_passes_on_the_reference_model() {
    let mut gpu = GalenaGpu::default();
    let report = run(&mut gpu, SuiteOptions::default()).unwrap();

    assert_eq!(report.results.len(), 9);
    assert_eq!(report.passed_count(), 5);
    assert_eq!(report.failed_count(), 0);
    assert_eq!(report.not_implemented_count(), 4);
    assert!(report.all_passed());

    let names: Vec<_> = report.results.iter().map(|r| r.name).collect();
    assert_eq!(names, subtest_names());
}

#[test]
fn filtered_run_isolates_a_single_subtest() {
    let mut gpu = GalenaGpu::default();
    let options = SuiteOptions { filter: Some("non-planar".to_owned()), ..Default::default() };
    let report = run(&mut gpu, options).unwrap();

    assert_eq!(report.results.len(), 1);
    assert_eq!(report.results[0].name, "non-planar-freeze-plane");
    assert!(report.all_passed());
}

#[test]
fn filters_select_every_matching_subtest() {
    let mut gpu = GalenaGpu::default();
    let options = SuiteOptions { filter: Some("clipped".to_owned()), ..Default::default() };
    let report = run(&mut gpu, options).unwrap();

    let names: Vec<_> = report.results.iter().map(|r| r.name).collect();
    assert_eq!(names, vec!["clipped-probe", "clipped-freeze-candidate"]);
    assert!(report.all_passed());
}

#[test]
fn captures_accompany_observer_callbacks() {
    let mut gpu = GalenaGpu::default();
    let mut seen = Vec::new();
    let options = SuiteOptions {
        capture: true,
        observer: Some(Box::new(|result: &SubtestResult, capture: Option<&EfbCapture>| {
            let capture = capture.expect("capture was requested");
            let color = capture.color.sample(35, 35);
            let depth = capture.depth.sample(35, 35);
            seen.push((result.name, color, depth));
        })),
        ..Default::default()
    };
    run(&mut gpu, options).unwrap();

    assert_eq!(seen.len(), 9);
    // After the baseline subtest the flat probe at depth 0.5 owns the
    // bottom-right sample, so the capture shows its color and its
    // exactly representable depth.
    let (name, color, depth) = seen[0];
    assert_eq!(name, "depth-buffer-baseline");
    assert_eq!((color.r, color.g, color.b), (0xff, 0, 0));
    assert_eq!(depth, 0x0080_0000);
}

#[test]
fn reruns_on_the_same_device_pass() {
    let mut gpu = GalenaGpu::default();
    let first = run(&mut gpu, SuiteOptions::default()).unwrap();
    let second = run(&mut gpu, SuiteOptions::default()).unwrap();

    assert!(first.all_passed());
    assert!(second.all_passed());
}

#[test]
fn every_clear_restores_the_same_depth_baseline() {
    let mut gpu = GalenaGpu::default();
    let mut pipeline = Pipeline::bring_up(&mut gpu);
    pipeline.clear(&mut gpu);

    let reference = DepthSnapshot::new();
    reference.request(&mut gpu);
    gpu.wait_idle();

    // Disturb both planes, then clear again.
    Quad::new().at_depth(0.3).color_rgba(0x00, 0xff, 0x00, 0xff).draw(&mut gpu);
    pipeline.clear(&mut gpu);

    let after = DepthSnapshot::new();
    after.request(&mut gpu);
    gpu.wait_idle();

    assert!(depth_snapshots_match(&reference, &after));
}
