//! Air temperature map generator.
//!
//! Renders daily 2 m air temperature maps from NCEP reanalysis NetCDF
//! files, optionally masked to a boundary layer.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use grid_common::GridError;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use airmap::{run_mask, run_plot, AirmapConfig};

#[derive(Parser, Debug)]
#[command(name = "airmap")]
#[command(about = "Daily air temperature maps from reanalysis NetCDF files")]
struct Args {
    /// Configuration file path
    #[arg(short, long, env = "AIRMAP_CONFIG")]
    config: Option<PathBuf>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Plot one day's temperature over the plot region with the boundary outline
    Plot {
        /// Date label, e.g. 1980-02-02
        #[arg(short, long)]
        date: String,

        /// Directory holding air.2m.gauss.<year>.nc files
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Boundary shapefile or GeoJSON
        #[arg(long)]
        boundary: Option<PathBuf>,

        #[arg(long)]
        output_dir: Option<PathBuf>,
    },

    /// Mask one day's temperature to the boundary layer and plot it
    Mask {
        #[arg(short, long)]
        date: String,

        /// NetCDF file to read instead of the one derived from the date
        #[arg(short, long)]
        input: Option<PathBuf>,

        #[arg(long)]
        boundary: Option<PathBuf>,

        /// Burn this attribute's values instead of presence
        #[arg(long)]
        attribute: Option<String>,

        /// Mark every cell the boundary touches, not only those whose centre is inside
        #[arg(long)]
        all_touched: bool,

        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also write the mask as a GeoTIFF
        #[arg(long)]
        export_tiff: Option<PathBuf>,
    },

    /// Print the dimensions, variables and attributes of a NetCDF file
    Inspect {
        #[arg(short, long)]
        input: PathBuf,
    },
}

fn main() -> ExitCode {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let args = Args::parse();

    if let Err(e) = init_tracing(&args.log_level, args.json_logs) {
        eprintln!("Failed to initialize logging: {e}");
        return ExitCode::from(1);
    }

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %format!("{e:#}"), "airmap failed");
            eprintln!("Error: {e:#}");
            ExitCode::from(exit_code(&e))
        }
    }
}

fn init_tracing(log_level: &str, json: bool) -> Result<()> {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr);

    if json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }
    Ok(())
}

/// Exit status from the first [`GridError`] in the chain.
fn exit_code(err: &anyhow::Error) -> u8 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<GridError>())
        .map(GridError::exit_code)
        .and_then(|code| u8::try_from(code).ok())
        .unwrap_or(1)
}

fn run(args: Args) -> Result<()> {
    let mut config = AirmapConfig::load(args.config.as_deref())?;

    match args.command {
        Command::Plot {
            date,
            data_dir,
            boundary,
            output_dir,
        } => {
            if let Some(dir) = data_dir {
                config.data_dir = dir;
            }
            if let Some(path) = boundary {
                config.boundary_path = Some(path);
            }
            if let Some(dir) = output_dir {
                config.output_dir = dir;
            }
            config.validate()?;

            info!(date = %date, "Starting daily plot");
            let out = run_plot(&config, &date).with_context(|| format!("Failed to plot {}", date))?;
            info!(
                path = %out.path.display(),
                width = out.width,
                height = out.height,
                segments = out.segments,
                "Plot completed"
            );
        }

        Command::Mask {
            date,
            input,
            boundary,
            attribute,
            all_touched,
            output,
            export_tiff,
        } => {
            if let Some(path) = boundary {
                config.boundary_path = Some(path);
            }
            if attribute.is_some() {
                config.rasterize.attribute_column = attribute;
            }
            if all_touched {
                config.rasterize.all_touched = true;
            }
            config.validate()?;

            info!(date = %date, "Starting masked plot");
            let out = run_mask(
                &config,
                &date,
                input.as_deref(),
                output.as_deref(),
                export_tiff.as_deref(),
            )
            .with_context(|| format!("Failed to mask {}", date))?;
            info!(
                path = %out.path.display(),
                cells_inside = out.cells_inside,
                geotiff = ?out.geotiff,
                "Masked plot completed"
            );
        }

        Command::Inspect { input } => {
            let summary = netcdf_parser::describe(&input)
                .with_context(|| format!("Failed to inspect {:?}", input))?;
            print!("{}", summary);
        }
    }

    Ok(())
}
