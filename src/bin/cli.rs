// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Areaform CLI

use anyhow::{Context, Result};
use areaform::cli::Reporter;
use areaform::{Boundary, BoundaryConverter, ConversionConfig};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "areaform")]
#[command(about = "Convert area boundary curves into tessellated surface meshes", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a JSON file of area boundaries
    Convert {
        /// Input JSON file (array of boundaries, or an object with a `boundaries` list)
        input: PathBuf,

        /// Write the batch report as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// TOML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Plane-fit and endpoint-merge tolerance
        #[arg(long)]
        tolerance: Option<f64>,

        /// Minimum declared area to convert
        #[arg(long)]
        min_area: Option<f64>,

        /// Ignore interior hole loops
        #[arg(long)]
        no_holes: bool,

        /// Leave the original boundaries out of the report
        #[arg(long)]
        no_originals: bool,
    },

    /// Print the effective configuration as TOML
    Config {
        /// TOML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Show version information
    Version,
}

/// Accepted input layouts
#[derive(Deserialize)]
#[serde(untagged)]
enum BatchInput {
    List(Vec<Boundary>),
    Wrapped { boundaries: Vec<Boundary> },
}

impl BatchInput {
    fn into_boundaries(self) -> Vec<Boundary> {
        match self {
            BatchInput::List(boundaries) | BatchInput::Wrapped { boundaries } => boundaries,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Convert {
            input,
            output,
            config,
            tolerance,
            min_area,
            no_holes,
            no_originals,
        } => {
            let mut config = load_config(config.as_deref())?;
            if let Some(tolerance) = tolerance {
                config.tolerance = tolerance;
            }
            if let Some(min_area) = min_area {
                config.min_area_threshold = min_area;
            }
            if no_holes {
                config.merge_holes = false;
            }
            if no_originals {
                config.preserve_original = false;
            }
            config.validate()?;
            convert_command(&input, output.as_deref(), config, cli.verbose)?;
        }
        Commands::Config { config } => {
            let config = load_config(config.as_deref())?;
            print!("{}", config.to_toml()?);
        }
        Commands::Version => {
            println!("Areaform v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "areaform=debug" } else { "areaform=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<ConversionConfig> {
    match path {
        Some(path) => ConversionConfig::from_file(path),
        None => ConversionConfig::load(),
    }
}

fn convert_command(
    input: &Path,
    output: Option<&Path>,
    config: ConversionConfig,
    verbose: bool,
) -> Result<()> {
    if !input.exists() {
        Reporter::report_error(&format!("Input file not found: {}", input.display()));
        std::process::exit(1);
    }

    let content = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read input file: {:?}", input))?;
    let boundaries = serde_json::from_str::<BatchInput>(&content)
        .with_context(|| format!("Failed to parse boundaries from {:?}", input))?
        .into_boundaries();

    if boundaries.is_empty() {
        Reporter::report_warning("Input contains no boundaries");
    } else if verbose {
        Reporter::report_info(&format!("Loaded {} boundaries", boundaries.len()));
    }

    let start = std::time::Instant::now();
    let report = BoundaryConverter::new(config).convert_batch(&boundaries);
    let elapsed = start.elapsed();

    Reporter::report_batch(&input.display().to_string(), &report, elapsed, verbose);

    if let Some(output) = output {
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(output, json)
            .with_context(|| format!("Failed to write report: {:?}", output))?;
        Reporter::success(&format!("Report written to {}", output.display()));
    }

    if let Err(err) = report.into_result() {
        Reporter::report_error(&err.to_string());
        std::process::exit(1);
    }

    Ok(())
}
