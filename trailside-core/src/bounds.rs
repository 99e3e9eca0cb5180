//! Rectangular geographic regions used as facility queries and cache keys.
//!
//! A [`Bounds`] stores its edges in Overpass order (south, west, north,
//! east). Latitudes must satisfy `south <= north`; longitudes may wrap, so a
//! west edge numerically greater than the east edge describes a region that
//! crosses the antimeridian.
//!
//! # Examples
//! ```
//! use trailside_core::Bounds;
//!
//! let valley = Bounds::new(46.0, 7.0, 47.0, 8.0)?;
//! let meadow = Bounds::new(46.2, 7.2, 46.4, 7.4)?;
//! assert!(valley.contains_bounds(&meadow));
//! assert!(valley.contains_coordinate(46.5, 7.5));
//! # Ok::<(), trailside_core::BoundsError>(())
//! ```

use std::{fmt, str::FromStr};

use geo::{BoundingRect, Coord, LineString, Rect};
use thiserror::Error;

const MIN_LATITUDE: f64 = -90.0;
const MAX_LATITUDE: f64 = 90.0;
const MIN_LONGITUDE: f64 = -180.0;
const MAX_LONGITUDE: f64 = 180.0;

/// Errors returned when constructing or parsing [`Bounds`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BoundsError {
    /// One of the edges was NaN or infinite.
    #[error("bounds edges must be finite numbers")]
    NonFinite,
    /// A latitude edge fell outside `[-90, 90]`.
    #[error("latitude {value} is outside [-90, 90]")]
    LatitudeOutOfRange {
        /// The offending latitude.
        value: f64,
    },
    /// A longitude edge fell outside `[-180, 180]`.
    #[error("longitude {value} is outside [-180, 180]")]
    LongitudeOutOfRange {
        /// The offending longitude.
        value: f64,
    },
    /// The south edge lies north of the north edge.
    #[error("south edge {south} lies north of north edge {north}")]
    Inverted {
        /// Southern latitude supplied by the caller.
        south: f64,
        /// Northern latitude supplied by the caller.
        north: f64,
    },
    /// Textual bounds did not contain four comma-separated numbers.
    #[error("expected `south,west,north,east` as four numbers, found {input:?}")]
    Malformed {
        /// The rejected input.
        input: String,
    },
}

/// A rectangular region bounded by two parallels and two meridians.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "BoundsRecord"))]
pub struct Bounds {
    south: f64,
    west: f64,
    north: f64,
    east: f64,
}

#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct BoundsRecord {
    south: f64,
    west: f64,
    north: f64,
    east: f64,
}

#[cfg(feature = "serde")]
impl TryFrom<BoundsRecord> for Bounds {
    type Error = BoundsError;

    fn try_from(record: BoundsRecord) -> Result<Self, Self::Error> {
        Self::new(record.south, record.west, record.north, record.east)
    }
}

impl Bounds {
    /// Validate and construct a region from its four edges.
    ///
    /// # Errors
    ///
    /// Returns a [`BoundsError`] when an edge is not finite, lies outside the
    /// WGS84 range, or when `south > north`.
    pub fn new(south: f64, west: f64, north: f64, east: f64) -> Result<Self, BoundsError> {
        if ![south, west, north, east].iter().all(|edge| edge.is_finite()) {
            return Err(BoundsError::NonFinite);
        }
        for value in [south, north] {
            if !(MIN_LATITUDE..=MAX_LATITUDE).contains(&value) {
                return Err(BoundsError::LatitudeOutOfRange { value });
            }
        }
        for value in [west, east] {
            if !(MIN_LONGITUDE..=MAX_LONGITUDE).contains(&value) {
                return Err(BoundsError::LongitudeOutOfRange { value });
            }
        }
        if south > north {
            return Err(BoundsError::Inverted { south, north });
        }
        Ok(Self {
            south,
            west,
            north,
            east,
        })
    }

    /// The whole globe.
    #[must_use]
    pub const fn world() -> Self {
        Self {
            south: MIN_LATITUDE,
            west: MIN_LONGITUDE,
            north: MAX_LATITUDE,
            east: MAX_LONGITUDE,
        }
    }

    /// Smallest region enclosing every vertex of `route`.
    ///
    /// Returns `None` for an empty line string. The result never crosses the
    /// antimeridian.
    #[must_use]
    pub fn enclosing(route: &LineString<f64>) -> Option<Self> {
        let rect = route.bounding_rect()?;
        Self::from_rect(&rect).ok()
    }

    /// Convert a `geo` rectangle (`x = longitude`, `y = latitude`).
    ///
    /// # Errors
    ///
    /// Returns a [`BoundsError`] when the rectangle lies outside WGS84 range.
    pub fn from_rect(rect: &Rect<f64>) -> Result<Self, BoundsError> {
        let min = rect.min();
        let max = rect.max();
        Self::new(min.y, min.x, max.y, max.x)
    }

    /// Southern latitude.
    #[must_use]
    pub const fn south(&self) -> f64 {
        self.south
    }

    /// Western longitude.
    #[must_use]
    pub const fn west(&self) -> f64 {
        self.west
    }

    /// Northern latitude.
    #[must_use]
    pub const fn north(&self) -> f64 {
        self.north
    }

    /// Eastern longitude.
    #[must_use]
    pub const fn east(&self) -> f64 {
        self.east
    }

    /// Whether the region wraps across the ±180° meridian.
    #[must_use]
    pub fn crosses_date_line(&self) -> bool {
        self.west > self.east
    }

    /// Whether the point at (`lat`, `lon`) lies inside, edges included.
    #[must_use]
    pub fn contains_coordinate(&self, lat: f64, lon: f64) -> bool {
        (self.south..=self.north).contains(&lat) && self.contains_longitude(lon)
    }

    /// Whether `location` (`x = longitude`, `y = latitude`) lies inside.
    #[must_use]
    pub fn contains_location(&self, location: Coord<f64>) -> bool {
        self.contains_coordinate(location.y, location.x)
    }

    /// Whether `inner` is fully enclosed on both axes.
    ///
    /// Shared edges count as enclosed. A region that does not cross the
    /// antimeridian only encloses one that does when it spans every
    /// longitude.
    #[must_use]
    pub fn contains_bounds(&self, inner: &Self) -> bool {
        self.south <= inner.south
            && inner.north <= self.north
            && self.contains_longitude_span(inner)
    }

    /// Split into regions that do not cross the antimeridian.
    ///
    /// Returns the region itself when it does not cross; otherwise the
    /// western half (`west..=180`) followed by the eastern half
    /// (`-180..=east`).
    #[must_use]
    pub fn split_by_date_line(&self) -> Vec<Self> {
        if !self.crosses_date_line() {
            return vec![*self];
        }
        vec![
            Self {
                east: MAX_LONGITUDE,
                ..*self
            },
            Self {
                west: MIN_LONGITUDE,
                ..*self
            },
        ]
    }

    /// Non-crossing halves as `geo` rectangles.
    #[must_use]
    pub fn to_rects(&self) -> Vec<Rect<f64>> {
        self.split_by_date_line()
            .into_iter()
            .map(|half| {
                Rect::new(
                    Coord {
                        x: half.west,
                        y: half.south,
                    },
                    Coord {
                        x: half.east,
                        y: half.north,
                    },
                )
            })
            .collect()
    }

    /// Longitudinal extent in degrees, accounting for wraparound.
    #[must_use]
    #[expect(
        clippy::float_arithmetic,
        reason = "span computation requires float maths"
    )]
    pub fn longitude_span(&self) -> f64 {
        if self.crosses_date_line() {
            (MAX_LONGITUDE - self.west) + (self.east - MIN_LONGITUDE)
        } else {
            self.east - self.west
        }
    }

    /// Latitudinal extent in degrees.
    #[must_use]
    #[expect(
        clippy::float_arithmetic,
        reason = "span computation requires float maths"
    )]
    pub fn latitude_span(&self) -> f64 {
        self.north - self.south
    }

    /// Planar area in square degrees; used to rank overlapping regions.
    #[must_use]
    #[expect(
        clippy::float_arithmetic,
        reason = "area computation requires float maths"
    )]
    pub fn area_sq_degrees(&self) -> f64 {
        self.longitude_span() * self.latitude_span()
    }

    /// Grow every edge by `margin` degrees, clamped to the WGS84 range.
    ///
    /// Negative or non-finite margins leave the region unchanged. Padding a
    /// crossing region until its halves meet yields the whole globe in
    /// longitude.
    #[must_use]
    #[expect(
        clippy::float_arithmetic,
        reason = "padding adds a margin to each edge"
    )]
    pub fn padded(&self, margin: f64) -> Self {
        if !margin.is_finite() || margin <= 0.0 {
            return *self;
        }
        let south = (self.south - margin).max(MIN_LATITUDE);
        let north = (self.north + margin).min(MAX_LATITUDE);
        let west = (self.west - margin).max(MIN_LONGITUDE);
        let east = (self.east + margin).min(MAX_LONGITUDE);
        if self.crosses_date_line() && west <= east {
            return Self {
                south,
                west: MIN_LONGITUDE,
                north,
                east: MAX_LONGITUDE,
            };
        }
        Self {
            south,
            west,
            north,
            east,
        }
    }

    fn covers_all_longitudes(&self) -> bool {
        self.west <= MIN_LONGITUDE && self.east >= MAX_LONGITUDE
    }

    fn contains_longitude(&self, lon: f64) -> bool {
        if self.crosses_date_line() {
            lon >= self.west || lon <= self.east
        } else {
            (self.west..=self.east).contains(&lon)
        }
    }

    fn contains_longitude_span(&self, inner: &Self) -> bool {
        if self.covers_all_longitudes() {
            return true;
        }
        match (self.crosses_date_line(), inner.crosses_date_line()) {
            (false, false) | (true, true) => self.west <= inner.west && inner.east <= self.east,
            // A non-crossing inner region must sit entirely in one half.
            (true, false) => inner.west >= self.west || inner.east <= self.east,
            (false, true) => false,
        }
    }
}

impl fmt::Display for Bounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{},{}", self.south, self.west, self.north, self.east)
    }
}

impl FromStr for Bounds {
    type Err = BoundsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || BoundsError::Malformed {
            input: s.to_owned(),
        };
        let edges = s
            .split(',')
            .map(|part| part.trim().parse::<f64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| malformed())?;
        match edges.as_slice() {
            &[south, west, north, east] => Self::new(south, west, north, east),
            _ => Err(malformed()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    fn bounds(south: f64, west: f64, north: f64, east: f64) -> Bounds {
        Bounds::new(south, west, north, east).expect("valid bounds")
    }

    #[fixture]
    fn outer() -> Bounds {
        bounds(46.0, 7.0, 47.0, 8.0)
    }

    #[fixture]
    fn pacific() -> Bounds {
        bounds(-20.0, 170.0, -10.0, -170.0)
    }

    #[rstest]
    #[case(f64::NAN, 0.0, 1.0, 1.0, BoundsError::NonFinite)]
    #[case(0.0, f64::INFINITY, 1.0, 1.0, BoundsError::NonFinite)]
    #[case(-91.0, 0.0, 1.0, 1.0, BoundsError::LatitudeOutOfRange { value: -91.0 })]
    #[case(0.0, 0.0, 1.0, 180.5, BoundsError::LongitudeOutOfRange { value: 180.5 })]
    #[case(2.0, 0.0, 1.0, 1.0, BoundsError::Inverted { south: 2.0, north: 1.0 })]
    fn rejects_invalid_edges(
        #[case] south: f64,
        #[case] west: f64,
        #[case] north: f64,
        #[case] east: f64,
        #[case] expected: BoundsError,
    ) {
        let err = Bounds::new(south, west, north, east).expect_err("edges should be rejected");
        assert_eq!(err, expected);
    }

    #[rstest]
    fn contains_nested_bounds(outer: Bounds) {
        assert!(outer.contains_bounds(&bounds(46.2, 7.2, 46.8, 7.8)));
    }

    #[rstest]
    fn contains_itself(outer: Bounds) {
        assert!(outer.contains_bounds(&outer));
    }

    #[rstest]
    #[case::north(bounds(46.2, 7.2, 47.1, 7.8))]
    #[case::south(bounds(45.9, 7.2, 46.8, 7.8))]
    #[case::west(bounds(46.2, 6.9, 46.8, 7.8))]
    #[case::east(bounds(46.2, 7.2, 46.8, 8.1))]
    fn rejects_bounds_poking_out_of_one_edge(outer: Bounds, #[case] inner: Bounds) {
        assert!(!outer.contains_bounds(&inner));
    }

    #[rstest]
    #[case(46.0, 7.0)]
    #[case(47.0, 8.0)]
    #[case(46.5, 7.5)]
    fn coordinate_on_or_inside_edges_is_contained(
        outer: Bounds,
        #[case] lat: f64,
        #[case] lon: f64,
    ) {
        assert!(outer.contains_coordinate(lat, lon));
    }

    #[rstest]
    #[case(45.9999999, 7.5)]
    #[case(46.5, 8.0000001)]
    fn coordinate_just_outside_is_rejected(outer: Bounds, #[case] lat: f64, #[case] lon: f64) {
        assert!(!outer.contains_coordinate(lat, lon));
    }

    #[rstest]
    fn crossing_bounds_contain_both_sides_of_the_date_line(pacific: Bounds) {
        assert!(pacific.crosses_date_line());
        assert!(pacific.contains_coordinate(-15.0, 175.0));
        assert!(pacific.contains_coordinate(-15.0, -175.0));
        assert!(pacific.contains_coordinate(-15.0, 180.0));
        assert!(!pacific.contains_coordinate(-15.0, 0.0));
    }

    #[rstest]
    #[case::western_half(bounds(-18.0, 172.0, -12.0, 178.0), true)]
    #[case::eastern_half(bounds(-18.0, -178.0, -12.0, -172.0), true)]
    #[case::nested_crossing(bounds(-18.0, 175.0, -12.0, -175.0), true)]
    #[case::wider_crossing(bounds(-18.0, 165.0, -12.0, -175.0), false)]
    #[case::outside(bounds(-18.0, 100.0, -12.0, 120.0), false)]
    fn crossing_containment(pacific: Bounds, #[case] inner: Bounds, #[case] expected: bool) {
        assert_eq!(pacific.contains_bounds(&inner), expected);
    }

    #[rstest]
    fn non_crossing_bounds_never_contain_crossing_ones(pacific: Bounds) {
        let europe = bounds(-30.0, -10.0, 0.0, 30.0);
        assert!(!europe.contains_bounds(&pacific));
        assert!(Bounds::world().contains_bounds(&pacific));
    }

    #[rstest]
    fn splitting_crossing_bounds_yields_two_halves(pacific: Bounds) {
        let halves = pacific.split_by_date_line();
        assert_eq!(
            halves,
            vec![
                bounds(-20.0, 170.0, -10.0, 180.0),
                bounds(-20.0, -180.0, -10.0, -170.0)
            ]
        );
        assert!(halves.iter().all(|half| !half.crosses_date_line()));
    }

    #[rstest]
    fn splitting_regular_bounds_is_identity(outer: Bounds) {
        assert_eq!(outer.split_by_date_line(), vec![outer]);
        assert_eq!(outer.to_rects().len(), 1);
    }

    #[rstest]
    fn area_accounts_for_wraparound(pacific: Bounds) {
        assert!((pacific.longitude_span() - 20.0).abs() < 1e-9);
        assert!((pacific.area_sq_degrees() - 200.0).abs() < 1e-9);
    }

    #[rstest]
    fn parses_overpass_order() {
        let parsed: Bounds = " 46.0, 7.0 ,47.0,8.0".parse().expect("parse bounds");
        assert_eq!(parsed, bounds(46.0, 7.0, 47.0, 8.0));
        assert_eq!(parsed.to_string(), "46,7,47,8");
    }

    #[rstest]
    #[case("46,7,47")]
    #[case("46,7,47,8,9")]
    #[case("north,7,47,8")]
    fn rejects_malformed_text(#[case] input: &str) {
        let err = input.parse::<Bounds>().expect_err("malformed input");
        assert!(matches!(err, BoundsError::Malformed { .. }));
    }

    #[rstest]
    fn encloses_route_vertices() {
        let route = LineString::from(vec![(7.1, 46.1), (7.4, 46.6), (7.2, 46.3)]);
        let enclosing = Bounds::enclosing(&route).expect("non-empty route");
        assert_eq!(enclosing, bounds(46.1, 7.1, 46.6, 7.4));
        assert!(Bounds::enclosing(&LineString::new(Vec::new())).is_none());
    }

    #[rstest]
    fn padding_clamps_to_valid_range() {
        let padded = bounds(89.5, 179.5, 89.9, 179.9).padded(1.0);
        assert_eq!(padded, bounds(88.5, 178.5, 90.0, 180.0));
    }

    #[rstest]
    fn padding_crossing_bounds_until_they_meet_spans_the_globe() {
        let narrow_gap = bounds(0.0, -179.0, 1.0, -179.5).padded(1.0);
        assert!(!narrow_gap.crosses_date_line());
        assert!(narrow_gap.contains_coordinate(0.5, 0.0));
    }
}
