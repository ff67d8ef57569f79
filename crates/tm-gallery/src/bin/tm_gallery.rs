use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use image::GrayImage;
use serde::{Deserialize, Serialize};
use trace_metrology::{
    Gaussian2D, Image, NearestAxes, ProfileConfig, ProfileInterp, ResampleMode, XCorrConfig,
    improfile, resample, xcorr_map,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "tm_gallery")]
#[command(about = "Run trace-metrology algorithms on external fixtures")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Intensity profile along a path through a grayscale image
    #[command(name = "profile")]
    Profile(ProfileArgs),
    /// Uniform resampling of a curve read from JSON
    #[command(name = "resample")]
    Resample(ResampleArgs),
    /// Pairwise correlation map of a signal stack read from JSON
    #[command(name = "xcorr")]
    Xcorr(XcorrArgs),
    /// Render the rotated 2D Gaussian model
    #[command(name = "gauss2d")]
    Gauss2d(Gauss2dArgs),
}

#[derive(Args, Debug, Clone)]
struct ProfileArgs {
    #[arg(long, required = true)]
    input: PathBuf,
    /// Path column coordinates, comma separated
    #[arg(long, required = true, value_delimiter = ',', allow_hyphen_values = true)]
    xi: Vec<f64>,
    /// Path row coordinates, comma separated
    #[arg(long, required = true, value_delimiter = ',', allow_hyphen_values = true)]
    yi: Vec<f64>,
    #[arg(long, default_value = "cubic")]
    interp: ProfileInterp,
    #[arg(long, value_enum, default_value_t = AxesArg::Swapped)]
    nearest_axes: AxesArg,
    #[arg(long, default_value = "docs/fig/raw")]
    out: PathBuf,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum AxesArg {
    Swapped,
    Natural,
}

#[derive(Args, Debug, Clone)]
struct ResampleArgs {
    #[arg(long, required = true)]
    input: PathBuf,
    #[arg(long, default_value_t = 100)]
    length: usize,
    #[arg(long, value_enum, default_value_t = ModeArg::Parametric)]
    mode: ModeArg,
    /// Smoothing factor for the spline modes
    #[arg(long, default_value_t = 0.0)]
    s: f64,
    /// Polynomial degree for `poly`
    #[arg(long, default_value_t = 3)]
    deg: usize,
    #[arg(long, default_value = "docs/fig/raw")]
    out: PathBuf,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum ModeArg {
    Parametric,
    Poly,
    Spline,
}

#[derive(Args, Debug, Clone)]
struct XcorrArgs {
    #[arg(long, required = true)]
    input: PathBuf,
    /// Correlate the rows as given instead of re-gridding them first
    #[arg(long)]
    no_resample: bool,
    #[arg(long, default_value = "docs/fig/raw")]
    out: PathBuf,
}

#[derive(Args, Debug, Clone)]
struct Gauss2dArgs {
    #[arg(long, default_value_t = 128)]
    width: usize,
    #[arg(long, default_value_t = 96)]
    height: usize,
    #[arg(long, default_value_t = 1.0)]
    amplitude: f64,
    /// Center column; defaults to the image center
    #[arg(long, allow_hyphen_values = true)]
    xo: Option<f64>,
    /// Center row; defaults to the image center
    #[arg(long, allow_hyphen_values = true)]
    yo: Option<f64>,
    #[arg(long, default_value_t = 12.0)]
    sigma_x: f64,
    #[arg(long, default_value_t = 6.0)]
    sigma_y: f64,
    /// Rotation in radians
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    theta: f64,
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    offset: f64,
    #[arg(long, default_value = "docs/fig/raw")]
    out: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
struct CurveInput {
    x: Vec<f64>,
    y: Vec<f64>,
}

#[derive(Debug, Clone, Deserialize)]
struct StackInput {
    z: Vec<Vec<f64>>,
    x: Vec<f64>,
    y: Vec<f64>,
}

#[derive(Debug, Clone, Serialize)]
struct MetaProfile {
    input: String,
    width: usize,
    height: usize,
    interp: ProfileInterp,
    nearest_axes: NearestAxes,
    path_points: usize,
    samples: usize,
}

#[derive(Debug, Clone, Serialize)]
struct MetaXcorr {
    rows: usize,
    samples: usize,
    fine_samples: usize,
    resampled: bool,
    degenerate_cells: usize,
}

#[derive(Debug, Clone, Serialize)]
struct MetaGauss2d {
    model: Gaussian2D,
    width: usize,
    height: usize,
    min: f64,
    max: f64,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tm_gallery=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.cmd {
        Command::Profile(args) => run_profile(args),
        Command::Resample(args) => run_resample(args),
        Command::Xcorr(args) => run_xcorr(args),
        Command::Gauss2d(args) => run_gauss2d(args),
    }
}

fn run_profile(args: ProfileArgs) -> Result<()> {
    ensure_file_exists(&args.input, "input")?;
    let case_dir = prepare_case_dir(&args.out, "profile")?;
    let img = load_input_u8(&args.input)?;

    let cfg = ProfileConfig {
        interp: args.interp,
        nearest_axes: match args.nearest_axes {
            AxesArg::Swapped => NearestAxes::Swapped,
            AxesArg::Natural => NearestAxes::Natural,
        },
        ..ProfileConfig::default()
    };
    let profile = improfile(&img.as_view(), &args.xi, &args.yi, &cfg)
        .with_context(|| format!("sampling profile of {}", args.input.display()))?;
    info!(samples = profile.len(), interp = ?cfg.interp, "profile sampled");

    write_csv(case_dir.join("profile.csv"), &profile)?;
    write_json(
        case_dir.join("meta.json"),
        &MetaProfile {
            input: args.input.display().to_string(),
            width: img.width(),
            height: img.height(),
            interp: cfg.interp,
            nearest_axes: cfg.nearest_axes,
            path_points: args.xi.len(),
            samples: profile.len(),
        },
    )?;

    Ok(())
}

fn run_resample(args: ResampleArgs) -> Result<()> {
    ensure_file_exists(&args.input, "input")?;
    let curve: CurveInput = read_json(&args.input)?;
    let case_dir = prepare_case_dir(&args.out, "resample")?;

    let mode = match args.mode {
        ModeArg::Parametric => ResampleMode::ParametricSpline { s: args.s },
        ModeArg::Poly => ResampleMode::Polynomial { deg: args.deg },
        ModeArg::Spline => ResampleMode::Spline { s: args.s },
    };
    let out = resample(&curve.x, &curve.y, args.length, mode)
        .with_context(|| format!("resampling curve from {}", args.input.display()))?;
    info!(points = curve.x.len(), length = out.len(), ?mode, "curve resampled");

    write_json(case_dir.join("resampled.json"), &out)?;
    Ok(())
}

fn run_xcorr(args: XcorrArgs) -> Result<()> {
    ensure_file_exists(&args.input, "input")?;
    let stack: StackInput = read_json(&args.input)?;
    let case_dir = prepare_case_dir(&args.out, "xcorr")?;

    let cfg = XCorrConfig {
        resample: !args.no_resample,
    };
    let map = xcorr_map(&stack.z, &stack.x, &stack.y, &cfg)
        .with_context(|| format!("building correlation map from {}", args.input.display()))?;

    let degenerate_cells = map
        .ccmax
        .data()
        .iter()
        .zip(map.ccpeak.data())
        .filter(|&(&v, &lag)| v == 0.0 && lag == 0.0)
        .count();
    if degenerate_cells > 0 {
        warn!(degenerate_cells, "some pairs involve all-zero rows");
    }
    info!(rows = map.ny, fine_samples = map.nxfit, "correlation map built");

    let n = map.ccmax.rows();
    save_luma_raw(case_dir.join("ccmax.png"), n, n, f64_to_u8_vis(map.ccmax.data()))?;
    let zfit = Image::from_rows(&map.zfit).context("stacking re-gridded rows")?;
    save_luma_raw(
        case_dir.join("zfit.png"),
        zfit.width(),
        zfit.height(),
        f64_to_u8_vis(zfit.data()),
    )?;
    write_json(case_dir.join("xcorr.json"), &map)?;
    write_json(
        case_dir.join("meta.json"),
        &MetaXcorr {
            rows: map.ny,
            samples: map.nx,
            fine_samples: map.nxfit,
            resampled: cfg.resample,
            degenerate_cells,
        },
    )?;

    Ok(())
}

fn run_gauss2d(args: Gauss2dArgs) -> Result<()> {
    if args.width == 0 || args.height == 0 {
        bail!("image size must be non-zero, got {}x{}", args.width, args.height);
    }
    let case_dir = prepare_case_dir(&args.out, "gauss2d")?;

    let model = Gaussian2D {
        amplitude: args.amplitude,
        xo: args.xo.unwrap_or((args.width as f64 - 1.0) / 2.0),
        yo: args.yo.unwrap_or((args.height as f64 - 1.0) / 2.0),
        sigma_x: args.sigma_x,
        sigma_y: args.sigma_y,
        theta: args.theta,
        offset: args.offset,
    };
    let grid = model.eval_grid(args.width, args.height);
    let (min, max) = finite_range(grid.data()).unwrap_or((f64::NAN, f64::NAN));
    info!(width = args.width, height = args.height, min, max, "gaussian rendered");

    save_luma_raw(
        case_dir.join("gauss2d.png"),
        grid.width(),
        grid.height(),
        f64_to_u8_vis(grid.data()),
    )?;
    write_json(
        case_dir.join("meta.json"),
        &MetaGauss2d {
            model,
            width: args.width,
            height: args.height,
            min,
            max,
        },
    )?;

    Ok(())
}

fn prepare_case_dir(out: &Path, case_name: &str) -> Result<PathBuf> {
    let case_dir = out.join(case_name);
    fs::create_dir_all(&case_dir)
        .with_context(|| format!("creating output directory {}", case_dir.display()))?;
    Ok(case_dir)
}

fn load_input_u8(path: &Path) -> Result<Image<u8>> {
    let dyn_img =
        image::open(path).with_context(|| format!("opening input image {}", path.display()))?;
    let luma = dyn_img.to_luma8();
    let (w, h) = luma.dimensions();
    let data = luma.into_raw();

    Image::from_vec(w as usize, h as usize, data)
        .with_context(|| format!("constructing tm-core image from {}", path.display()))
}

fn ensure_file_exists(path: &Path, label: &str) -> Result<()> {
    if !path.is_file() {
        bail!("{label} file does not exist: {}", path.display());
    }
    Ok(())
}

fn save_luma_raw(path: PathBuf, width: usize, height: usize, data: Vec<u8>) -> Result<()> {
    let gray = GrayImage::from_raw(width as u32, height as u32, data)
        .context("constructing GrayImage from raw bytes")?;
    gray.save(&path)
        .with_context(|| format!("saving image {}", path.display()))
}

fn finite_range(data: &[f64]) -> Option<(f64, f64)> {
    data.iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

/// Min/max stretch to 8 bits; non-finite values map to 0.
fn f64_to_u8_vis(data: &[f64]) -> Vec<u8> {
    let Some((min_v, max_v)) = finite_range(data) else {
        return vec![0u8; data.len()];
    };
    if (max_v - min_v).abs() < 1e-12 {
        return vec![0u8; data.len()];
    }

    let scale = 255.0 / (max_v - min_v);
    data.iter()
        .map(|&v| {
            if v.is_finite() {
                ((v - min_v) * scale).round().clamp(0.0, 255.0) as u8
            } else {
                0
            }
        })
        .collect()
}

fn write_json(path: PathBuf, value: &impl Serialize) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(value).context("serializing json")?;
    fs::write(&path, bytes).with_context(|| format!("writing json {}", path.display()))
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let data = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_slice(&data).with_context(|| format!("parsing json {}", path.display()))
}

fn write_csv(path: PathBuf, values: &[f64]) -> Result<()> {
    let mut file =
        fs::File::create(&path).with_context(|| format!("creating {}", path.display()))?;
    writeln!(file, "index,value").context("writing csv header")?;
    for (i, v) in values.iter().enumerate() {
        writeln!(file, "{i},{v}").context("writing csv row")?;
    }
    Ok(())
}
