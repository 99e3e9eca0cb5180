//! Command-line interface for querying Trailside facilities.
#![forbid(unsafe_code)]

use clap::{Parser, Subcommand};

mod error;
mod facilities;

pub use error::CliError;

use facilities::{FacilitiesArgs, run_facilities};

pub(crate) const ARG_BOUNDS: &str = "bounds";
pub(crate) const ARG_AMENITIES: &str = "amenities";
pub(crate) const ARG_OVERPASS_URL: &str = "overpass-url";
pub(crate) const ARG_TIMEOUT_SECS: &str = "timeout-secs";
pub(crate) const ARG_CACHE_FILE: &str = "cache-file";
pub(crate) const ENV_BOUNDS: &str = "TRAILSIDE_CMDS_FACILITIES_BOUNDS";
pub(crate) const ENV_TIMEOUT_SECS: &str = "TRAILSIDE_CMDS_FACILITIES_TIMEOUT_SECS";

/// Run the Trailside CLI with the current process arguments and environment.
///
/// # Errors
///
/// Returns a [`CliError`] when argument parsing, configuration, the remote
/// fetch, or writing the output fails.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    match cli.command {
        Command::Facilities(args) => run_facilities(args),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "trailside",
    about = "Look up walker amenities inside a bounding box",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the facilities inside a bounding box as JSON.
    Facilities(FacilitiesArgs),
}

#[cfg(test)]
mod tests;
