//! spx: replay recorded sensor frames through range estimation and
//! fisheye rectification.

mod logger;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use spx_core::sensor::{FrameReport, ProcessingSettings};
use spx_core::{FrameProcessor, FrameSource, ProcessingContext};
use spx_io::{DirectoryFrameSource, load_calibration, load_settings};
use tracing::{error, info, info_span};

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "spx")]
#[command(about = "Proximity estimation and fisheye rectification for stereo IR sensor frames")]
#[command(version)]
struct Cli {
    /// Log at debug level with per-frame timings (RUST_LOG overrides).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a recording directory through the processor.
    Run(RunArgs),

    /// Print geometry and value ranges of a calibration map.
    InspectCalibration {
        /// Calibration file (.json, or a raw little-endian f32 dump).
        path: PathBuf,
    },
}

#[derive(Debug, Clone, Args)]
struct RunArgs {
    /// Directory of `frame_<id>_cam<k>.<ext>` images.
    #[arg(long)]
    frames: PathBuf,

    /// Calibration for a camera, as `<camera>=<file>`. Repeatable.
    #[arg(long = "calibration", value_parser = parse_calibration_arg)]
    calibrations: Vec<(usize, PathBuf)>,

    /// TOML settings file.
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Rectify every n-th frame (0 disables rectification).
    #[arg(long, default_value = "0")]
    trigger_every: u64,

    /// Override the sensor's operating range in centimetres.
    #[arg(long)]
    range_cm: Option<f64>,

    /// Override the fraction of the range that counts as in range.
    #[arg(long)]
    in_range_fraction: Option<f64>,
}

fn parse_calibration_arg(arg: &str) -> Result<(usize, PathBuf), String> {
    let (camera, path) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected <camera>=<file>, got '{arg}'"))?;
    let camera = camera
        .trim()
        .parse()
        .map_err(|_| format!("invalid camera index '{camera}'"))?;
    Ok((camera, PathBuf::from(path)))
}

fn main() {
    let cli = Cli::parse();
    logger::init(cli.verbose);

    let result = match cli.command {
        Commands::Run(args) => run(args),
        Commands::InspectCalibration { path } => inspect_calibration(path),
    };

    if let Err(e) = result {
        error!("{e}");
        std::process::exit(1);
    }
}

fn settings_for(args: &RunArgs) -> CliResult<ProcessingSettings> {
    let mut settings = match &args.settings {
        Some(path) => load_settings(path)?,
        None => ProcessingSettings::default(),
    };
    if let Some(range_cm) = args.range_cm {
        settings.range.range_cm = range_cm;
    }
    if let Some(fraction) = args.in_range_fraction {
        settings.range.in_range_fraction = fraction;
    }
    settings.validate()?;
    Ok(settings)
}

fn run(args: RunArgs) -> CliResult<()> {
    let settings = settings_for(&args)?;

    let mut processor = FrameProcessor::new(&settings);
    for (camera, path) in &args.calibrations {
        processor = processor.with_map(*camera, Arc::new(load_calibration(path)?));
    }

    let mut source = DirectoryFrameSource::open(&args.frames)?;
    info!(
        frames = source.remaining(),
        threshold_cm = processor.policy().threshold(),
        trigger_every = args.trigger_every,
        "replaying recording"
    );

    let mut ctx = ProcessingContext::new();
    while let Some(frame) = source.next_frame()? {
        let _span = info_span!("frame", id = frame.id).entered();

        let trigger = args.trigger_every > 0 && ctx.frames_processed() % args.trigger_every == 0;
        let report = processor.process(&mut ctx, &frame, trigger)?;
        log_report(&report);
    }

    info!(frames = ctx.frames_processed(), "replay finished");
    Ok(())
}

fn log_report(report: &FrameReport) {
    for cam in &report.cameras {
        info!(
            frame = report.frame_id,
            camera = cam.camera,
            mean = cam.stats.mean,
            min = cam.stats.min,
            max = cam.stats.max,
            distance_cm = cam.distance,
            in_range = cam.in_range,
            "frame summary"
        );
        if let Some(rectified) = &cam.rectified {
            let stats = rectified.stats();
            info!(
                frame = report.frame_id,
                camera = cam.camera,
                sampled = stats.sampled,
                outside = stats.outside,
                clamped = stats.clamped,
                "rectified"
            );
        }
    }
}

fn inspect_calibration(path: PathBuf) -> CliResult<()> {
    let map = load_calibration(&path)?;
    let (lo, hi) = map.bounds();

    println!("file:        {}", path.display());
    println!("grid:        {} x {}", map.grid_width(), map.grid_height());
    println!("row pitch:   {}", map.row_pitch());
    println!("entries:     {}", map.entries().len());
    println!("x range:     [{:.4}, {:.4}]", lo.x, hi.x);
    println!("y range:     [{:.4}, {:.4}]", lo.y, hi.y);
    Ok(())
}
