//! Typed points of interest served to hikers.
//!
//! The amenity vocabulary is closed: each [`FacilityType`] corresponds to
//! exactly one OpenStreetMap `amenity=*` tag value.
//!
//! # Examples
//! ```
//! use geo::Coord;
//! use trailside_core::{Facility, FacilityType};
//!
//! let tap = Facility::new(FacilityType::DrinkingWater, Coord { x: 7.5, y: 46.5 });
//! assert_eq!(tap.kind.as_tag(), "drinking_water");
//! assert_eq!(tap.latitude(), 46.5);
//! ```

use std::{fmt, str::FromStr};

use geo::Coord;
use rstar::{AABB, RTreeObject};
use thiserror::Error;

/// Amenity categories recognised by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum FacilityType {
    /// Public toilets.
    Toilets,
    /// Car parks.
    Parking,
    /// Litter bins.
    WasteBasket,
    /// Grocery shops.
    Supermarket,
    /// Potable water taps and fountains.
    DrinkingWater,
    /// Ranger or visitor stations.
    RangerStation,
    /// Barbecue grills.
    Bbq,
    /// Benches.
    Bench,
    /// Restaurants.
    Restaurant,
    /// Beer gardens.
    Biergarten,
}

/// Error returned when parsing an amenity tag outside the closed vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown facility type '{0}'")]
pub struct UnknownFacilityType(pub String);

impl FacilityType {
    /// Every supported facility type in declaration order.
    pub const ALL: [Self; 10] = [
        Self::Toilets,
        Self::Parking,
        Self::WasteBasket,
        Self::Supermarket,
        Self::DrinkingWater,
        Self::RangerStation,
        Self::Bbq,
        Self::Bench,
        Self::Restaurant,
        Self::Biergarten,
    ];

    /// The OpenStreetMap `amenity` tag value for this type.
    ///
    /// # Examples
    /// ```
    /// use trailside_core::FacilityType;
    ///
    /// assert_eq!(FacilityType::WasteBasket.as_tag(), "waste_basket");
    /// ```
    #[must_use]
    pub const fn as_tag(&self) -> &'static str {
        match self {
            Self::Toilets => "toilets",
            Self::Parking => "parking",
            Self::WasteBasket => "waste_basket",
            Self::Supermarket => "supermarket",
            Self::DrinkingWater => "drinking_water",
            Self::RangerStation => "ranger_station",
            Self::Bbq => "bbq",
            Self::Bench => "bench",
            Self::Restaurant => "restaurant",
            Self::Biergarten => "biergarten",
        }
    }
}

impl fmt::Display for FacilityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_tag())
    }
}

impl FromStr for FacilityType {
    type Err = UnknownFacilityType;

    /// Parse an amenity tag. Matching is exact: OSM tag values are lowercase.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_tag() == s)
            .ok_or_else(|| UnknownFacilityType(s.to_owned()))
    }
}

/// A facility of a known type at a fixed position.
///
/// Coordinates are WGS84 with `x = longitude` and `y = latitude`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Facility {
    /// Amenity category.
    pub kind: FacilityType,
    /// Geospatial position.
    pub location: Coord<f64>,
}

impl Facility {
    /// Construct a facility.
    #[must_use]
    pub const fn new(kind: FacilityType, location: Coord<f64>) -> Self {
        Self { kind, location }
    }

    /// Latitude in degrees.
    #[must_use]
    pub const fn latitude(&self) -> f64 {
        self.location.y
    }

    /// Longitude in degrees.
    #[must_use]
    pub const fn longitude(&self) -> f64 {
        self.location.x
    }
}

impl RTreeObject for Facility {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.location.x, self.location.y])
    }
}
