use anyhow::{bail, Context};
use clap::Parser;
use radarview_core::ColorBy;
use radarview_io::{read_mesh, read_sequence};
use radarview_viewer::{parse_color_by, run, run_headless, LaunchOptions, Settings};
use std::path::PathBuf;

/// Command line parameters
#[derive(Parser, Debug)]
#[command(name = "radarview", version, about = "Viewer for recorded automotive radar sequences")]
struct Args {
    /// Sequence file to open on startup
    sequence: Option<PathBuf>,

    /// TOML settings file
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// OBJ model of the vehicle
    #[arg(long, short)]
    mesh: Option<PathBuf>,

    /// Render every frame without opening a window
    #[arg(long)]
    headless: bool,

    /// Detection coloring: doppler, rcs, sensor_id or uniform
    #[arg(long, value_parser = parse_color_by)]
    color_by: Option<ColorBy>,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .filter_module("wgpu_core", log::LevelFilter::Warn)
        .filter_module("wgpu_hal", log::LevelFilter::Warn)
        .filter_module("naga", log::LevelFilter::Warn)
        .init();

    let args = Args::parse();

    let mut settings = match &args.config {
        Some(path) => Settings::load(path).with_context(|| format!("reading settings from {}", path.display()))?,
        None => Settings::default(),
    };
    if let Some(color_by) = args.color_by {
        settings.color_by = color_by;
    }

    if args.headless {
        let Some(path) = &args.sequence else {
            bail!("--headless needs a sequence file");
        };
        let sequence = read_sequence(path).with_context(|| format!("loading {}", path.display()))?;
        let mesh = match &args.mesh {
            Some(path) => Some(read_mesh(path).with_context(|| format!("loading {}", path.display()))?),
            None => None,
        };
        let report = run_headless(settings, &sequence, mesh.as_ref())?;
        println!(
            "{} frames, {} detections, {} uploads, {} draw calls",
            report.frames, report.detections, report.uploads, report.draws
        );
        return Ok(());
    }

    run(
        settings,
        LaunchOptions {
            sequence: args.sequence,
            mesh: args.mesh,
            color_by: args.color_by,
        },
    )
}
