//! Overpass JSON element types.
//!
//! Only the fields needed to place and classify an amenity are modelled.
//! Everything else in the document is ignored.
//!
//! See: <https://wiki.openstreetmap.org/wiki/Overpass_API/Output_Formats#JSON>

use geo::Coord;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// A single node, way or relation from the `elements` array.
///
/// Nodes carry `lat`/`lon` directly; ways and relations carry a `center`
/// object when the query ends with `out center`.
#[derive(Debug, Deserialize)]
pub(crate) struct OverpassElement {
    pub(crate) lat: Option<f64>,
    pub(crate) lon: Option<f64>,
    #[serde(default, deserialize_with = "lenient_center")]
    pub(crate) center: Option<OverpassCenter>,
    pub(crate) tags: Option<OverpassTags>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OverpassCenter {
    pub(crate) lat: f64,
    pub(crate) lon: f64,
}

/// A malformed `center` counts as absent so explicit coordinates still apply.
fn lenient_center<'de, D>(deserializer: D) -> Result<Option<OverpassCenter>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw.and_then(|value| OverpassCenter::deserialize(value).ok()))
}

#[derive(Debug, Deserialize)]
pub(crate) struct OverpassTags {
    pub(crate) amenity: Option<String>,
}

impl OverpassElement {
    /// The element's position, preferring explicit coordinates over the
    /// computed centre. Out-of-range positions are rejected.
    pub(crate) fn location(&self) -> Option<Coord<f64>> {
        let (lat, lon) = match (self.lat, self.lon, &self.center) {
            (Some(lat), Some(lon), _) => (lat, lon),
            (_, _, Some(center)) => (center.lat, center.lon),
            _ => return None,
        };
        let in_range = (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon);
        in_range.then_some(Coord { x: lon, y: lat })
    }

    pub(crate) fn amenity(&self) -> Option<&str> {
        self.tags.as_ref()?.amenity.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn element(json: &str) -> OverpassElement {
        serde_json::from_str(json).expect("should deserialise")
    }

    #[rstest]
    fn node_coordinates_win_over_centre() {
        let node = element(
            r#"{"type":"node","lat":46.5,"lon":7.5,"center":{"lat":0.0,"lon":0.0},
                "tags":{"amenity":"bench","name":"Aussicht"}}"#,
        );
        assert_eq!(node.location(), Some(Coord { x: 7.5, y: 46.5 }));
        assert_eq!(node.amenity(), Some("bench"));
    }

    #[rstest]
    fn way_centre_is_used_without_coordinates() {
        let way = element(r#"{"type":"way","center":{"lat":46.6,"lon":7.7},"tags":{}}"#);
        assert_eq!(way.location(), Some(Coord { x: 7.7, y: 46.6 }));
        assert_eq!(way.amenity(), None);
    }

    #[rstest]
    #[case(r#"{"lat":46.5,"lon":7.5,"center":{"lat":1}}"#)]
    #[case(r#"{"lat":46.5,"lon":7.5,"center":"middle"}"#)]
    #[case(r#"{"lat":46.5,"lon":7.5,"center":null}"#)]
    fn malformed_centre_does_not_hide_node_coordinates(#[case] json: &str) {
        let node = element(json);
        assert!(node.center.is_none());
        assert_eq!(node.location(), Some(Coord { x: 7.5, y: 46.5 }));
    }

    #[rstest]
    fn malformed_centre_alone_gives_no_position() {
        assert_eq!(element(r#"{"type":"way","center":{"lon":7.5}}"#).location(), None);
    }

    #[rstest]
    #[case(r#"{"lat":46.5}"#)]
    #[case(r#"{"lat":91.0,"lon":7.5}"#)]
    #[case(r#"{"lat":46.5,"lon":-180.5}"#)]
    fn unusable_positions_are_rejected(#[case] json: &str) {
        assert_eq!(element(json).location(), None);
    }

    #[rstest]
    fn string_coordinates_fail_to_deserialise() {
        let result = serde_json::from_str::<OverpassElement>(r#"{"lat":"46.5","lon":7.5}"#);
        assert!(result.is_err());
    }
}
