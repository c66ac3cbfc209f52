//! GOES-R point sampler.
//!
//! Streams decoded scenes from a directory, accumulates them per configured
//! product, reprojects the result onto the target lat/lon grid and prints
//! the value at each requested point as JSON on stdout. Logs go to stderr.

mod run;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use geo_common::BoundingBox;
use scene_pipeline::{JsonDirSceneSource, JsonRasterExport, PipelineConfig, RasterSink};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "goes-sampler")]
#[command(about = "Accumulate GOES-R scenes and sample them at points")]
struct Args {
    /// Pipeline configuration file (YAML). Defaults plus GOES_* environment
    /// overrides when absent.
    #[arg(short, long, env = "GOES_SAMPLER_CONFIG")]
    config: Option<PathBuf>,

    /// Directory of scene JSON files
    #[arg(short, long)]
    scenes: PathBuf,

    /// JSON file with an array of {name, latitude, longitude}
    #[arg(short, long)]
    points: Option<PathBuf>,

    /// Extra point as "name=lat,lon" or "lat,lon" (repeatable)
    #[arg(long = "point")]
    point: Vec<String>,

    /// Target extent "min_lon,min_lat,max_lon,max_lat"
    #[arg(long)]
    extent: Option<String>,

    /// Target resolution in degrees, both axes
    #[arg(long)]
    resolution: Option<f64>,

    /// Directory to write one raster JSON per product into
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Scenes read and decoded together
    #[arg(long, default_value_t = run::DEFAULT_DECODE_BATCH)]
    batch_size: usize,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(true)
        .with_writer(std::io::stderr)
        .json()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting GOES point sampler");

    let mut config = match &args.config {
        Some(path) => PipelineConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => PipelineConfig::from_env().context("invalid environment configuration")?,
    };
    if let Some(extent) = &args.extent {
        config.target.extent = BoundingBox::parse(extent).context("invalid --extent")?;
    }
    if let Some(res) = args.resolution {
        config.target.x_res = res;
        config.target.y_res = res;
    }
    config.validate()?;

    info!(
        products = ?config.products.iter().map(|p| p.id.as_str()).collect::<Vec<_>>(),
        extent = ?config.target.extent,
        x_res = config.target.x_res,
        y_res = config.target.y_res,
        "Loaded configuration"
    );

    let mut points = match &args.points {
        Some(path) => run::load_points(path)?,
        None => Vec::new(),
    };
    for spec in &args.point {
        points.push(run::parse_point(spec)?);
    }
    if points.is_empty() {
        bail!("no points to sample, pass --points or --point");
    }

    let mut source = JsonDirSceneSource::open(&args.scenes)
        .with_context(|| format!("failed to open scene directory {}", args.scenes.display()))?;

    let mut export = match &args.output {
        Some(dir) => Some(
            JsonRasterExport::new(dir)
                .with_context(|| format!("failed to create output directory {}", dir.display()))?,
        ),
        None => None,
    };
    let sink = export.as_mut().map(|e| e as &mut dyn RasterSink);

    let reports = run::run(&config, &mut source, &points, args.batch_size, sink)?;
    println!("{}", serde_json::to_string_pretty(&reports)?);

    info!(products = reports.len(), "Sampling complete");
    Ok(())
}
