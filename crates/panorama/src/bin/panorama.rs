use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use log::LevelFilter;
use panorama::config::{load_correspondences, load_job, ConfigError};
use panorama::core::{compute_homography_from_slice, HomographyError, Interpolation};
use panorama::run::{run_job, RunError};

#[derive(Parser, Debug)]
#[command(name = "panorama", version, about = "Stitch two images from four point correspondences")]
struct Cli {
    /// Log level (off, error, warn, info, debug, trace).
    #[arg(long, global = true, default_value = "info")]
    log_level: LevelFilter,

    /// Emit `tracing` spans instead of plain log lines (`RUST_LOG` filters).
    #[cfg(feature = "tracing")]
    #[arg(long, global = true)]
    trace_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a JSON stitch job.
    Stitch {
        job: PathBuf,
        /// Override the job's output path.
        #[arg(long)]
        output: Option<PathBuf>,
        /// Use nearest-neighbour sampling instead of the job's setting.
        #[arg(long)]
        nearest: bool,
        /// Scan every canvas pixel instead of the projected footprint only.
        #[arg(long)]
        full_scan: bool,
    },
    /// Print the homography for a JSON list of exactly 4 correspondences.
    Homography { pairs: PathBuf },
}

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Run(#[from] RunError),
    #[error(transparent)]
    Homography(#[from] HomographyError),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

fn init_logging(cli: &Cli) {
    #[cfg(feature = "tracing")]
    if cli.trace_json {
        panorama::core::init_tracing(true);
        return;
    }
    // another logger being installed first is not fatal for a CLI run
    let _ = panorama::core::init_with_level(cli.log_level);
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::Stitch {
            job,
            output,
            nearest,
            full_scan,
        } => {
            let mut job = load_job(&job)?;
            if let Some(output) = output {
                job.output = output;
            }
            if nearest {
                job.params.interpolation = Interpolation::Nearest;
            }
            if full_scan {
                job.params.fast = false;
            }
            let report = run_job(&job)?;
            println!(
                "{}x{} -> {}",
                report.output_width,
                report.output_height,
                job.output.display()
            );
        }
        Command::Homography { pairs } => {
            let pairs = load_correspondences(&pairs)?;
            let h = compute_homography_from_slice(&pairs)?;
            println!("{}", serde_json::to_string(&h)?);
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
