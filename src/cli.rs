//! CLI argument parsing for the transport-tariff-worker binary.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::types::CalibrationPoint;

#[derive(Parser)]
#[command(name = "transport-tariff-worker", about = "Transport tariff generation worker")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the worker server (default if no subcommand given)
    Serve,
    /// Run database migrations and exit
    Migrate,
    /// Fit the hyperbola through three points and print the result
    Solve {
        /// Calibration point as KM:TARIFF, given exactly three times
        #[arg(long = "point", value_parser = parse_point, num_args = 1, required = true)]
        points: Vec<CalibrationPoint>,
    },
    /// Generate the hyperbolic tariff table from a JSON request file
    Generate {
        /// Path to a JSON file shaped like the hyperbolic generate payload
        #[arg(long)]
        input: PathBuf,
        /// Generate into memory and print a sample instead of writing to the database
        #[arg(long)]
        dry_run: bool,
    },
}

/// Parse `KM:TARIFF`
fn parse_point(raw: &str) -> Result<CalibrationPoint, String> {
    let (km, tariff) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected KM:TARIFF, got '{raw}'"))?;
    let km: f64 = km.trim().parse().map_err(|e| format!("invalid km '{km}': {e}"))?;
    let tariff: f64 = tariff
        .trim()
        .parse()
        .map_err(|e| format!("invalid tariff '{tariff}': {e}"))?;
    Ok(CalibrationPoint::new(km, tariff))
}

/// Exactly three points, in the order given
pub fn three_points(points: &[CalibrationPoint]) -> Result<[CalibrationPoint; 3]> {
    <[CalibrationPoint; 3]>::try_from(points)
        .ok()
        .with_context(|| format!("exactly three --point values are required, got {}", points.len()))
}
