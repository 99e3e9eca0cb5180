//! Locate facilities relative to a hiking route.

use geo::{Closest, ClosestPoint, Coord, Distance, Haversine, Line, LineString, Point};

/// Where a location falls on a route polyline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteProjection {
    /// Closest point on the route.
    pub point: Coord<f64>,
    /// Index of the segment holding `point`; segment `i` joins vertices `i`
    /// and `i + 1`.
    pub segment_index: usize,
    /// Great-circle distance from the route start to `point`, in metres.
    pub distance_along_m: f64,
    /// Great-circle distance from the location to `point`, in metres.
    pub distance_from_route_m: f64,
}

/// Project `location` onto the nearest segment of `route`.
///
/// The closest point on each segment is found in the plane, then segments are
/// ranked by haversine distance. This is accurate for the short segments of a
/// recorded hike. Returns `None` when `route` has fewer than two vertices.
///
/// # Examples
/// ```
/// use geo::{Coord, LineString};
/// use trailside_core::project_onto_route;
///
/// let route = LineString::from(vec![(7.0, 46.0), (7.1, 46.0), (7.1, 46.1)]);
/// let projection = project_onto_route(Coord { x: 7.12, y: 46.05 }, &route)
///     .expect("route has segments");
/// assert_eq!(projection.segment_index, 1);
/// ```
#[must_use]
#[expect(
    clippy::float_arithmetic,
    reason = "distance along the route accumulates segment lengths"
)]
pub fn project_onto_route(location: Coord<f64>, route: &LineString<f64>) -> Option<RouteProjection> {
    let target = Point::from(location);
    let mut best: Option<RouteProjection> = None;
    let mut walked_m = 0.0;

    for (segment_index, segment) in route.lines().enumerate() {
        let point = closest_on_segment(&segment, target);
        let distance_from_route_m = Haversine.distance(target, Point::from(point));
        if best
            .as_ref()
            .is_none_or(|current| distance_from_route_m < current.distance_from_route_m)
        {
            best = Some(RouteProjection {
                point,
                segment_index,
                distance_along_m: walked_m
                    + Haversine.distance(segment.start_point(), Point::from(point)),
                distance_from_route_m,
            });
        }
        walked_m += Haversine.distance(segment.start_point(), segment.end_point());
    }

    best
}

fn closest_on_segment(segment: &Line<f64>, target: Point<f64>) -> Coord<f64> {
    match segment.closest_point(&target) {
        Closest::Intersection(point) | Closest::SinglePoint(point) => point.0,
        // Only reachable for degenerate input such as NaN coordinates.
        Closest::Indeterminate => segment.start,
    }
}
