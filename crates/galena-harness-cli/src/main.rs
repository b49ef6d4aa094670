#![forbid(unsafe_code)]

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use galena_gpu::GalenaGpu;
use galena_harness::{
    run, subtest_names, ColorSnapshot, EfbCapture, Outcome, SubtestResult, SuiteOptions,
};

#[derive(Debug, Parser)]
#[command(about = "Runs the depth-freeze validation suite against the software rasterizer model")]
struct Args {
    /// Run only subtests whose name contains this substring.
    #[arg(long)]
    filter: Option<String>,

    /// List subtest names in execution order and exit.
    #[arg(long)]
    list: bool,

    /// Write per-subtest color and depth PNGs into this directory.
    #[arg(long)]
    capture_dir: Option<PathBuf>,

    /// Stop after each subtest until Enter is pressed, so the
    /// framebuffer can be inspected while it still shows the result.
    #[arg(long)]
    pause: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    if args.list {
        for name in subtest_names() {
            println!("{name}");
        }
        return Ok(());
    }

    if let Some(dir) = &args.capture_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create capture directory: {}", dir.display()))?;
    }

    // Capture dumps happen inside the observer, which cannot return an
    // error; park the first failure and surface it after the run.
    let mut dump_error: Option<anyhow::Error> = None;
    let options = SuiteOptions {
        filter: args.filter.clone(),
        capture: args.capture_dir.is_some(),
        observer: Some(Box::new(|result: &SubtestResult, capture: Option<&EfbCapture>| {
            if let (Some(dir), Some(capture)) = (args.capture_dir.as_deref(), capture) {
                if let Err(err) = dump_capture(dir, result.name, capture) {
                    dump_error.get_or_insert(err);
                }
            }
            if args.pause {
                wait_for_enter(result);
            }
        })),
    };

    let mut gpu = GalenaGpu::default();
    let report = run(&mut gpu, options)?;
    if let Some(err) = dump_error {
        return Err(err);
    }

    report.print_summary();
    if !report.all_passed() {
        std::process::exit(1);
    }
    Ok(())
}

fn wait_for_enter(result: &SubtestResult) {
    let status = match &result.outcome {
        Outcome::Passed { .. } => "pass",
        Outcome::Failed { .. } => "FAIL",
        Outcome::NotImplemented => "skip",
    };
    eprint!("{}: {status}; press Enter to continue ", result.name);
    let _ = io::stderr().flush();
    let mut line = String::new();
    let _ = io::stdin().lock().read_line(&mut line);
}

/// Writes `<name>-color.png` (RGBA) and `<name>-depth.png` (the top 8
/// bits of each 24-bit depth value, so brightness grows toward the
/// viewer).
fn dump_capture(dir: &Path, name: &str, capture: &EfbCapture) -> Result<()> {
    let color_path = dir.join(format!("{name}-color.png"));
    let color = image::RgbaImage::from_raw(
        ColorSnapshot::WIDTH,
        ColorSnapshot::HEIGHT,
        capture.color.bytes(),
    )
    .ok_or_else(|| anyhow!("color capture has the wrong length"))?;
    color
        .save(&color_path)
        .with_context(|| format!("failed to write PNG: {}", color_path.display()))?;

    let mut gray = Vec::with_capacity((ColorSnapshot::WIDTH * ColorSnapshot::HEIGHT) as usize);
    for y in 0..ColorSnapshot::HEIGHT {
        for x in 0..ColorSnapshot::WIDTH {
            gray.push((capture.depth.sample(x, y) >> 16) as u8);
        }
    }
    let depth_path = dir.join(format!("{name}-depth.png"));
    let depth = image::GrayImage::from_raw(ColorSnapshot::WIDTH, ColorSnapshot::HEIGHT, gray)
        .ok_or_else(|| anyhow!("depth capture has the wrong length"))?;
    depth
        .save(&depth_path)
        .with_context(|| format!("failed to write PNG: {}", depth_path.display()))?;
    Ok(())
}
