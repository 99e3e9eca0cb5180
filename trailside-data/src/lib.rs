//! Data access adapters for the Trailside facility engine.
//!
//! Responsibilities:
//! - Talk to the Overpass API and turn its JSON into typed facilities.
//! - Persist cache snapshots so fetched regions survive across processes.
//!
//! Boundaries:
//! - Do not encode domain rules (live in `trailside-core`).
//! - Keep blocking I/O off async executors; prefer async-capable clients.
//!
//! Invariants:
//! - Thread-safe by default where feasible.
//! - No global mutable state.

pub mod overpass;
pub mod snapshot;

pub use overpass::{
    OverpassConfig, OverpassFacilitySource, OverpassParseError, ProviderBuildError, build_query,
    parse_facilities,
};
pub use snapshot::{CacheSnapshot, SNAPSHOT_VERSION, SnapshotEntry, SnapshotError};
