//! Example: cross-sections of a synthetic streak.
//!
//! Renders a rotated elongated Gaussian, traces a jittered polyline along its
//! major axis, resamples it with a parametric spline, then samples intensity
//! profiles perpendicular to the trace and correlates them pairwise. A
//! straight, symmetric streak gives near-unit similarity and zero lag between
//! all cuts.
//!
//! Results are written as JSON; timing is printed to stdout.
//!
//! Run from the workspace root:
//!   cargo run -p trace-metrology --example streak_profile -- --help

use std::time::Instant;

use anyhow::{Context, Result, ensure};
use clap::Parser;
use serde::Serialize;
use trace_metrology::{
    Gaussian2D, Point2, ProfileConfig, ResampleMode, Vec2, XCorrConfig, improfile, linspace,
    resample, xcorr_map,
};

#[derive(Parser, Debug)]
#[command(about = "Sample and correlate cross-sections of a synthetic streak")]
struct Args {
    #[arg(long, default_value_t = 160)]
    width: usize,

    #[arg(long, default_value_t = 120)]
    height: usize,

    /// Number of perpendicular cuts along the trace
    #[arg(long, default_value_t = 6)]
    cuts: usize,

    /// Half length of each cut, in pixels
    #[arg(long, default_value_t = 12.0)]
    half_len: f64,

    #[arg(long, default_value = "streak_profile.json")]
    out: String,
}

#[derive(Serialize)]
struct CutDto {
    center: Point2,
    angle: f64,
    profile: Vec<f64>,
}

#[derive(Serialize)]
struct Report {
    trace_x: Vec<f64>,
    trace_y: Vec<f64>,
    posang: Vec<f64>,
    cuts: Vec<CutDto>,
    ccmax: Vec<Vec<f64>>,
    ccpeak: Vec<Vec<f64>>,
    elapsed_ms: f64,
}

fn main() -> Result<()> {
    let args = Args::parse();
    ensure!(args.cuts >= 2, "need at least two cuts, got {}", args.cuts);

    let streak = Gaussian2D {
        amplitude: 200.0,
        xo: args.width as f64 / 2.0,
        yo: args.height as f64 / 2.0,
        sigma_x: args.width as f64 / 4.0,
        sigma_y: 2.5,
        theta: 0.25,
        offset: 10.0,
    };
    let img = streak.eval_grid(args.width, args.height);
    println!(
        "rendered {}x{} streak at ({:.1}, {:.1})",
        args.width, args.height, streak.xo, streak.yo
    );

    let t0 = Instant::now();

    // Jittered points along the major axis, as a detector would report them.
    let axis = Vec2 {
        x: streak.theta.cos(),
        y: streak.theta.sin(),
    };
    let center = Point2::new(streak.xo, streak.yo);
    let span = streak.sigma_x * 1.5;
    let (mut xs, mut ys) = (Vec::new(), Vec::new());
    for (i, t) in linspace(-span, span, 25).into_iter().enumerate() {
        let jitter = ((i * 7) % 5) as f64 * 0.05 - 0.1;
        let p = center + axis * t;
        xs.push(p.x - axis.y * jitter);
        ys.push(p.y + axis.x * jitter);
    }

    let trace = resample(&xs, &ys, 100, ResampleMode::ParametricSpline { s: 0.5 })
        .context("resampling trace")?;

    let cfg = ProfileConfig::default();
    let picks = linspace(10.0, (trace.len() - 11) as f64, args.cuts);
    let mut cuts = Vec::with_capacity(picks.len());
    for pick in picks {
        let i = pick.round() as usize;
        let angle = trace.posang[i];
        let normal = Vec2 {
            x: -angle.sin(),
            y: angle.cos(),
        } * args.half_len;
        let mid = Point2::new(trace.xs[i], trace.ys[i]);
        let (a, b) = (mid + normal * -1.0, mid + normal);

        let profile = improfile(&img.as_view(), &[a.x, b.x], &[a.y, b.y], &cfg)
            .with_context(|| format!("sampling cut at trace index {i}"))?;
        cuts.push(CutDto {
            center: mid,
            angle,
            profile,
        });
    }

    let samples = cuts[0].profile.len();
    let z: Vec<Vec<f64>> = cuts.iter().map(|c| c.profile.clone()).collect();
    let x = linspace(-args.half_len, args.half_len, samples);
    let labels: Vec<f64> = (0..cuts.len()).map(|i| i as f64).collect();
    let map = xcorr_map(&z, &x, &labels, &XCorrConfig::default()).context("correlating cuts")?;

    let elapsed_ms = t0.elapsed().as_secs_f64() * 1e3;
    println!(
        "{} cuts of {samples} samples, correlated in {elapsed_ms:.2} ms",
        cuts.len()
    );
    for r in 0..map.ccmax.rows() {
        let row: Vec<String> = map
            .ccmax
            .row(r)
            .iter()
            .map(|v| format!("{v:.3}"))
            .collect();
        println!("  ccmax[{r}] = [{}]", row.join(", "));
    }

    let report = Report {
        trace_x: trace.xs,
        trace_y: trace.ys,
        posang: trace.posang,
        cuts,
        ccmax: map.ccmax.to_rows(),
        ccpeak: map.ccpeak.to_rows(),
        elapsed_ms,
    };
    let json = serde_json::to_string_pretty(&report).context("serializing report")?;
    std::fs::write(&args.out, json).with_context(|| format!("writing {}", args.out))?;
    println!("wrote {}", args.out);

    Ok(())
}
