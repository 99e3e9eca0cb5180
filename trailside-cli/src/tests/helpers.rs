//! Test helpers for running the facilities command against stub sources.

use std::sync::Arc;

use camino::Utf8PathBuf;
use geo::Coord;
use tempfile::TempDir;
use trailside_core::test_support::RecordingFacilitySource;
use trailside_core::{Facility, FacilitySource, FacilityType};

use crate::CliError;
use crate::facilities::{FacilitiesArgs, FacilitiesConfig, FacilitySourceBuilder};

/// Builder handing out clones of a recording source so tests can count
/// fetches after the command returns.
pub(super) struct StubSourceBuilder {
    pub(super) source: RecordingFacilitySource,
}

impl StubSourceBuilder {
    pub(super) fn with_alpine_facilities() -> Self {
        Self {
            source: RecordingFacilitySource::new(alpine_facilities()),
        }
    }
}

impl FacilitySourceBuilder for StubSourceBuilder {
    fn build(&self, _config: &FacilitiesConfig) -> Result<Arc<dyn FacilitySource>, CliError> {
        Ok(Arc::new(self.source.clone()))
    }
}

/// A bench and a water tap near Grindelwald plus a car park further west.
pub(super) fn alpine_facilities() -> Vec<Facility> {
    vec![
        Facility::new(FacilityType::Bench, Coord { x: 8.04, y: 46.62 }),
        Facility::new(FacilityType::DrinkingWater, Coord { x: 8.05, y: 46.63 }),
        Facility::new(FacilityType::Parking, Coord { x: 7.6, y: 46.4 }),
    ]
}

/// Scratch directory with a snapshot path that does not exist yet.
pub(super) struct Scratch {
    _dir: TempDir,
    pub(super) snapshot: Utf8PathBuf,
}

impl Scratch {
    pub(super) fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 tempdir");
        Self {
            snapshot: root.join("cache/facilities.json"),
            _dir: dir,
        }
    }
}

pub(super) fn args_for(bounds: &str, cache_file: Option<Utf8PathBuf>) -> FacilitiesArgs {
    FacilitiesArgs {
        bounds: Some(bounds.to_owned()),
        cache_file,
        ..FacilitiesArgs::default()
    }
}
