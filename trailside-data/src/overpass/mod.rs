//! Overpass API adapter for amenity lookups.
//!
//! The adapter has three layers:
//!
//! - [`build_query`] renders a bounds and an amenity allowlist as Overpass QL.
//! - [`parse_facilities`] turns an Overpass JSON document into facilities,
//!   silently dropping elements that cannot be typed or located.
//! - [`OverpassFacilitySource`] posts the query over HTTP and implements
//!   [`trailside_core::FacilitySource`].
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use trailside_core::{Bounds, FacilitySource, FacilityType};
//! use trailside_data::overpass::{OverpassConfig, OverpassFacilitySource};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let config = OverpassConfig::default()
//!     .with_timeout(Duration::from_secs(60))
//!     .with_facility_types([FacilityType::DrinkingWater, FacilityType::Toilets]);
//! let source = OverpassFacilitySource::with_config(config)?;
//!
//! let region = Bounds::new(46.6, 7.8, 46.7, 7.9)?;
//! let facilities = source.fetch_facilities(&region).await?;
//! println!("found {} facilities", facilities.len());
//! # Ok(())
//! # }
//! ```

mod client;
mod parser;
mod query;
mod response;

pub use client::{
    DEFAULT_ENDPOINT, DEFAULT_USER_AGENT, OverpassConfig, OverpassFacilitySource,
    ProviderBuildError,
};
pub use parser::{OverpassParseError, parse_facilities};
pub use query::build_query;
