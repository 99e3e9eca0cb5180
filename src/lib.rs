//! Facade crate for the Trailside facility engine.
//!
//! This crate re-exports the core domain types and exposes the Overpass
//! source and cache snapshots behind the `overpass` feature.
//!
//! ```
//! use trailside::{Bounds, FacilitiesCache, Facility, FacilityType};
//! use geo::Coord;
//!
//! let region = Bounds::new(46.0, 7.0, 47.0, 8.0)?;
//! let mut cache = FacilitiesCache::new();
//! cache.insert(region, vec![Facility::new(FacilityType::Bench, Coord { x: 7.5, y: 46.5 })]);
//!
//! let hit = cache.lookup(&Bounds::new(46.4, 7.4, 46.6, 7.6)?);
//! assert_eq!(hit.map(|found| found.len()), Some(1));
//! # Ok::<(), trailside::BoundsError>(())
//! ```

#![forbid(unsafe_code)]

pub use trailside_core::{
    Bounds, BoundsError, CachePolicy, FacilitiesCache, Facility, FacilityFetchError,
    FacilityQueryService, FacilitySource, FacilityType, RouteProjection, UnknownFacilityType,
    project_onto_route,
};

#[cfg(feature = "test-support")]
pub use trailside_core::test_support;

#[cfg(feature = "overpass")]
pub use trailside_data::{
    CacheSnapshot, OverpassConfig, OverpassFacilitySource, OverpassParseError, ProviderBuildError,
    SnapshotError, parse_facilities,
};
