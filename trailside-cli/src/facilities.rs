//! Facilities command implementation for the Trailside CLI.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use log::debug;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use trailside_core::{
    Bounds, CachePolicy, FacilitiesCache, Facility, FacilityQueryService, FacilitySource,
    FacilityType,
};
use trailside_data::{CacheSnapshot, OverpassConfig, OverpassFacilitySource};

use crate::{
    ARG_AMENITIES, ARG_BOUNDS, ARG_CACHE_FILE, ARG_OVERPASS_URL, ARG_TIMEOUT_SECS, CliError,
    ENV_BOUNDS, ENV_TIMEOUT_SECS,
};

/// CLI arguments for the `facilities` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Query an Overpass endpoint for amenities inside a bounding \
                 box and print them as JSON. Regions fetched earlier are \
                 answered from the cache snapshot when --cache-file is set.",
    about = "Print the facilities inside a bounding box"
)]
#[ortho_config(prefix = "TRAILSIDE")]
pub(crate) struct FacilitiesArgs {
    /// Bounding box as `south,west,north,east` in degrees.
    #[arg(long = ARG_BOUNDS, value_name = "s,w,n,e", allow_hyphen_values = true)]
    #[serde(default)]
    pub(crate) bounds: Option<String>,
    /// Comma-separated amenity tags to request (defaults to all).
    #[arg(long = ARG_AMENITIES, value_name = "list")]
    #[serde(default)]
    pub(crate) amenities: Option<String>,
    /// Overpass interpreter URL.
    #[arg(long = ARG_OVERPASS_URL, value_name = "url")]
    #[serde(default)]
    pub(crate) overpass_url: Option<String>,
    /// Request timeout in seconds.
    #[arg(long = ARG_TIMEOUT_SECS, value_name = "secs")]
    #[serde(default)]
    pub(crate) timeout_secs: Option<u64>,
    /// JSON snapshot used to seed and persist the cache.
    #[arg(long = ARG_CACHE_FILE, value_name = "path")]
    #[serde(default)]
    pub(crate) cache_file: Option<Utf8PathBuf>,
}

impl FacilitiesArgs {
    pub(crate) fn into_config(self) -> Result<FacilitiesConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        FacilitiesConfig::try_from(merged)
    }
}

/// Resolved `facilities` command configuration.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct FacilitiesConfig {
    /// Region to query.
    pub(crate) bounds: Bounds,
    /// Overpass client settings, including the amenities to request.
    pub(crate) overpass: OverpassConfig,
    /// Optional snapshot location.
    pub(crate) cache_file: Option<Utf8PathBuf>,
}

impl TryFrom<FacilitiesArgs> for FacilitiesConfig {
    type Error = CliError;

    fn try_from(args: FacilitiesArgs) -> Result<Self, Self::Error> {
        let raw_bounds = args.bounds.ok_or(CliError::MissingArgument {
            field: ARG_BOUNDS,
            env: ENV_BOUNDS,
        })?;
        let bounds = raw_bounds
            .parse::<Bounds>()
            .map_err(|source| CliError::InvalidBounds {
                value: raw_bounds.clone(),
                source,
            })?;

        let mut overpass = OverpassConfig::default();
        if let Some(list) = args.amenities.as_deref() {
            let types = parse_amenities(list)?;
            if !types.is_empty() {
                overpass = overpass.with_facility_types(types);
            }
        }
        if let Some(url) = args.overpass_url {
            overpass.endpoint = url;
        }
        if let Some(secs) = args.timeout_secs {
            if secs == 0 {
                return Err(CliError::InvalidTimeout {
                    field: ARG_TIMEOUT_SECS,
                    env: ENV_TIMEOUT_SECS,
                });
            }
            overpass = overpass.with_timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            bounds,
            overpass,
            cache_file: args.cache_file,
        })
    }
}

/// Parse a comma-separated amenity list, ignoring blank items.
fn parse_amenities(list: &str) -> Result<Vec<FacilityType>, CliError> {
    list.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| item.parse::<FacilityType>().map_err(CliError::from))
        .collect()
}

/// Builds the facility source for the current invocation.
pub(super) trait FacilitySourceBuilder {
    fn build(&self, config: &FacilitiesConfig) -> Result<Arc<dyn FacilitySource>, CliError>;
}

pub(super) struct OverpassSourceBuilder;

impl FacilitySourceBuilder for OverpassSourceBuilder {
    fn build(&self, config: &FacilitiesConfig) -> Result<Arc<dyn FacilitySource>, CliError> {
        let source = OverpassFacilitySource::with_config(config.overpass.clone()).map_err(
            |source| CliError::BuildSource {
                endpoint: config.overpass.endpoint.clone(),
                source,
            },
        )?;
        Ok(Arc::new(source))
    }
}

/// JSON document printed by the command.
#[derive(Debug, Serialize)]
struct FacilitiesOutput<'a> {
    bounds: &'a Bounds,
    count: usize,
    facilities: &'a [Facility],
}

pub(super) fn run_facilities(args: FacilitiesArgs) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    let builder = OverpassSourceBuilder;
    run_facilities_with(args, &builder, &mut stdout)
}

pub(super) fn run_facilities_with(
    args: FacilitiesArgs,
    builder: &dyn FacilitySourceBuilder,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let config = args.into_config()?;
    let facilities = execute_facilities(&config, builder)?;
    write_facilities(writer, &config.bounds, &facilities)
}

fn execute_facilities(
    config: &FacilitiesConfig,
    builder: &dyn FacilitySourceBuilder,
) -> Result<Vec<Facility>, CliError> {
    let cache = load_cache(config.cache_file.as_deref())?;
    let source = builder.build(config)?;
    let service = FacilityQueryService::with_cache(source, cache);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;
    let facilities = runtime
        .block_on(service.get_facilities(&config.bounds))
        .map_err(|source| CliError::Fetch {
            bounds: config.bounds,
            source,
        })?;

    if let Some(path) = config.cache_file.as_deref() {
        CacheSnapshot::from_entries(service.cache_entries()).write(path)?;
    }
    Ok(facilities)
}

/// Seed a cache from `path` when it names an existing snapshot.
pub(super) fn load_cache(path: Option<&Utf8Path>) -> Result<FacilitiesCache, CliError> {
    let Some(snapshot_path) = path else {
        return Ok(FacilitiesCache::new());
    };
    match CacheSnapshot::read_if_exists(snapshot_path)? {
        Some(snapshot) => Ok(snapshot.into_cache(CachePolicy::default())),
        None => {
            debug!("no cache snapshot at {snapshot_path}; starting empty");
            Ok(FacilitiesCache::new())
        }
    }
}

fn write_facilities(
    writer: &mut dyn Write,
    bounds: &Bounds,
    facilities: &[Facility],
) -> Result<(), CliError> {
    let output = FacilitiesOutput {
        bounds,
        count: facilities.len(),
        facilities,
    };
    let payload = serde_json::to_string_pretty(&output).map_err(CliError::SerialiseOutput)?;
    writer
        .write_all(payload.as_bytes())
        .map_err(CliError::WriteOutput)?;
    writer.write_all(b"\n").map_err(CliError::WriteOutput)?;
    Ok(())
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<FacilitiesConfig, CliError> {
    let merged = FacilitiesArgs::merge_from_layers(layers).map_err(CliError::from)?;
    FacilitiesConfig::try_from(merged)
}
