//! Error types emitted by the Trailside CLI.
//!
//! Keep this error type reasonably small, as many CLI helpers return
//! `Result<_, CliError>` and the workspace enables `clippy::result_large_err`.

use std::sync::Arc;

use thiserror::Error;
use trailside_core::{Bounds, BoundsError, FacilityFetchError, UnknownFacilityType};
use trailside_data::{ProviderBuildError, SnapshotError};

/// Errors emitted by the Trailside CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        /// Long flag name.
        field: &'static str,
        /// Environment variable that can supply the value.
        env: &'static str,
    },
    /// The bounds option is not a valid `south,west,north,east` box.
    #[error("invalid bounds {value:?}: {source}")]
    InvalidBounds {
        /// Value as supplied.
        value: String,
        /// Parse or validation failure.
        #[source]
        source: BoundsError,
    },
    /// An amenity name is outside the supported vocabulary.
    #[error("invalid amenity list: {0}")]
    InvalidAmenity(#[from] UnknownFacilityType),
    /// The request timeout must be at least one second.
    #[error("timeout must be at least one second (set --{field} or {env})")]
    InvalidTimeout {
        /// Long flag name.
        field: &'static str,
        /// Environment variable that can supply the value.
        env: &'static str,
    },
    /// Constructing the facility source failed.
    #[error("failed to build facility source for {endpoint:?}: {source}")]
    BuildSource {
        /// Endpoint the source would contact.
        endpoint: String,
        /// Underlying client error.
        #[source]
        source: ProviderBuildError,
    },
    /// Starting the async runtime failed.
    #[error("failed to start async runtime: {0}")]
    Runtime(#[source] std::io::Error),
    /// The remote fetch failed.
    #[error("failed to fetch facilities for {bounds}: {source}")]
    Fetch {
        /// Requested region.
        bounds: Bounds,
        /// Source error.
        #[source]
        source: FacilityFetchError,
    },
    /// Loading or saving the cache snapshot failed.
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    /// Serializing the query output failed.
    #[error("failed to serialize facilities: {0}")]
    SerialiseOutput(#[source] serde_json::Error),
    /// Writing the query output failed.
    #[error("failed to write facilities output: {0}")]
    WriteOutput(#[source] std::io::Error),
}
