//! Core domain types for the Trailside facility engine.
//!
//! The crate models rectangular query regions ([`Bounds`]), typed amenities
//! ([`Facility`]), the remote repository seam ([`FacilitySource`]) and the
//! containment-keyed cache that sits in front of it
//! ([`FacilitiesCache`], [`FacilityQueryService`]).
//!
//! Coordinates follow the `geo` convention used throughout the workspace:
//! `x = longitude`, `y = latitude`, both in WGS84 degrees.

#![forbid(unsafe_code)]

pub mod bounds;
pub mod cache;
pub mod facility;
pub mod query;
pub mod route;
pub mod source;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use bounds::{Bounds, BoundsError};
pub use cache::{CachePolicy, FacilitiesCache};
pub use facility::{Facility, FacilityType, UnknownFacilityType};
pub use query::FacilityQueryService;
pub use route::{RouteProjection, project_onto_route};
pub use source::{FacilityFetchError, FacilitySource};
