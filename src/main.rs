use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::{error, info};

use segtile::{run_pipeline, Layout, PipelineConfig, SegtileError, TileId};

/// Cuts a large segmentation into tiles and vectorizes each tile on its own.
#[derive(Parser, Debug)]
#[command(name = "segtile", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run (or resume) the tile pipeline
    Run(RunArgs),
    /// Count the artifacts of a previous run
    Status(StatusArgs),
}

#[derive(Args, Debug)]
struct RunArgs {
    /// JSON file with pipeline settings; flags take precedence
    #[arg(long)]
    config: Option<PathBuf>,

    /// Segmentation raster, with its attribute table as `<input>.rat.json`
    #[arg(short = 'i', long)]
    input: Option<PathBuf>,

    /// Raster of tile ids
    #[arg(short = 'm', long)]
    mode: Option<PathBuf>,

    /// Output pixel size, in map units
    #[arg(short = 'r', long)]
    resolution: Option<f64>,

    /// Number of worker threads
    #[arg(short = 'c', long)]
    cores: Option<usize>,

    /// Skip tiles at least this wide or tall
    #[arg(long)]
    size_limit: Option<f64>,

    /// Never process this tile; may be repeated
    #[arg(long = "exclude-tile")]
    exclude_tile: Vec<TileId>,

    /// Base directory of the outputs; defaults to the parent of the input's directory
    #[arg(short = 'o', long)]
    output_dir: Option<PathBuf>,

    /// Do not write overviews into the rasters
    #[arg(long, default_value_t = false)]
    no_pyramids: bool,

    /// Exit with success even when some tiles failed
    #[arg(long, default_value_t = false)]
    allow_partial: bool,
}

#[derive(Args, Debug)]
struct StatusArgs {
    /// Base directory of a run
    #[arg(short = 'o', long)]
    output_dir: Option<PathBuf>,

    /// Segmentation the run was made from, to derive the base directory
    #[arg(short = 'i', long)]
    input: Option<PathBuf>,
}

const EXIT_PARTIAL: u8 = 2;

fn run(args: RunArgs) -> Result<ExitCode> {
    let mut config = match &args.config {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };
    if args.input.is_some() {
        config.segmentation = args.input;
    }
    if args.mode.is_some() {
        config.tile_raster = args.mode;
    }
    if args.resolution.is_some() {
        config.resolution = args.resolution;
    }
    if let Some(cores) = args.cores {
        config.workers = cores;
    }
    if let Some(limit) = args.size_limit {
        config.size_limit = limit;
    }
    config.exclude_tiles.extend(args.exclude_tile);
    if args.output_dir.is_some() {
        config.output_dir = args.output_dir;
    }
    if args.no_pyramids {
        config.pyramids = false;
    }

    let run = config.validate().context("invalid run configuration")?;
    info!("Writing to {}", run.layout.base.display());
    let report = match run_pipeline(&run) {
        Ok(report) => report,
        Err(e @ SegtileError::MissingColumn { .. }) => {
            return Err(anyhow::Error::new(e)
                .context("the attribute table has no tile assignment; run the grid population step first"));
        }
        Err(e) => return Err(e.into()),
    };

    if report.is_complete() || args.allow_partial {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(EXIT_PARTIAL))
    }
}

fn status(args: StatusArgs) -> Result<ExitCode> {
    let base = match (args.output_dir, args.input) {
        (Some(dir), _) => dir,
        (None, Some(input)) => Layout::derive_base(&input),
        (None, None) => anyhow::bail!("either --output-dir or --input is needed"),
    };
    let layout = Layout::new(base);
    let census = layout
        .census()
        .with_context(|| format!("reading {}", layout.base.display()))?;
    for (stage, count) in census.artifacts.iter() {
        println!("{:<22}{}", stage.dir_name(), count);
    }
    println!("{:<22}{}", "complete tiles", census.complete.len());
    Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    let result = match cli.command {
        Command::Run(args) => run(args),
        Command::Status(args) => status(args),
    };
    match result {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
