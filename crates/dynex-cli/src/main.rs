//! `dynex`: roughness-aware vertical exaggeration of GeoTIFF DEMs.
mod config;
mod preview;
mod raster;

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dynex_core::pipeline::check_grid;
use dynex_core::{DynamicExaggeration, RoughnessEstimator, VarianceMethod};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use config::Tunables;
use raster::{read_geotiff, write_geotiff};

#[derive(Parser, Debug)]
#[command(
    name = "dynex",
    version,
    about = "Exaggerate smooth terrain more than rough terrain"
)]
struct Cli {
    /// Verbose output (debug-level logging)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a dynamically exaggerated copy of a DEM
    Exaggerate {
        /// Input single-band GeoTIFF
        input: PathBuf,
        /// Output GeoTIFF (64-bit float, georeferencing copied from input)
        output: PathBuf,
        #[command(flatten)]
        tunables: Tunables,
    },

    /// Write the local slope deviation (roughness) of a DEM
    Roughness {
        input: PathBuf,
        output: PathBuf,
        /// Window side length in cells
        #[arg(short, long, default_value_t = 3)]
        neighborhood: usize,
        /// Local variance strategy: separable, direct or auto
        #[arg(long, default_value_t = VarianceMethod::Separable)]
        variance: VarianceMethod,
    },

    /// Write grayscale PNGs of elevation, roughness, weights and output
    Preview {
        input: PathBuf,
        out_dir: PathBuf,
        #[command(flatten)]
        tunables: Tunables,
    },
}

fn setup_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match cli.command {
        Command::Exaggerate { input, output, tunables } => {
            cmd_exaggerate(&input, &output, &tunables)
        }
        Command::Roughness {
            input,
            output,
            neighborhood,
            variance,
        } => cmd_roughness(&input, &output, neighborhood, variance),
        Command::Preview {
            input,
            out_dir,
            tunables,
        } => cmd_preview(&input, &out_dir, &tunables),
    }
}

fn cmd_exaggerate(input: &Path, output: &Path, tunables: &Tunables) -> Result<()> {
    let params = tunables.resolve()?;
    let raster = read_geotiff(input)?;
    info!(
        "loaded {} ({}x{})",
        input.display(),
        raster.grid.width,
        raster.grid.height
    );
    if !raster.geo.is_georeferenced() {
        warn!("{} carries no georeferencing tags", input.display());
    }

    let start = Instant::now();
    let result = DynamicExaggeration::new(params)?
        .run(&raster.grid)
        .with_context(|| format!("Cannot exaggerate {}", input.display()))?;
    info!(
        "exaggerated in {:.2}s (roughness mean {:.4}, std {:.4})",
        start.elapsed().as_secs_f64(),
        result.stats.mean,
        result.stats.std
    );

    write_geotiff(output, &result.exaggerated, &raster.geo)?;
    info!("wrote {}", output.display());
    Ok(())
}

fn cmd_roughness(
    input: &Path,
    output: &Path,
    neighborhood: usize,
    variance: VarianceMethod,
) -> Result<()> {
    let estimator = RoughnessEstimator::new(neighborhood, variance)?;
    let raster = read_geotiff(input)?;
    check_grid(&raster.grid, neighborhood)
        .with_context(|| format!("Cannot estimate roughness of {}", input.display()))?;

    let start = Instant::now();
    let estimate = estimator.estimate(&raster.grid)?;
    info!(
        "roughness ({}) in {:.2}s, max {:.4}",
        estimate.method,
        start.elapsed().as_secs_f64(),
        estimate.field.max_value()
    );

    write_geotiff(output, &estimate.field, &raster.geo)?;
    info!("wrote {}", output.display());
    Ok(())
}

fn cmd_preview(input: &Path, out_dir: &Path, tunables: &Tunables) -> Result<()> {
    let params = tunables.resolve()?;
    let raster = read_geotiff(input)?;
    let result = DynamicExaggeration::new(params)?
        .run(&raster.grid)
        .with_context(|| format!("Cannot exaggerate {}", input.display()))?;
    preview::write_previews(&raster.grid, &result, out_dir)
}
