//! Overpass QL rendering.

use std::time::Duration;

use trailside_core::{Bounds, FacilityType};

/// Overpass element kinds that carry amenity tags worth reporting.
const ELEMENT_KINDS: [&str; 2] = ["node", "way"];

/// Render an Overpass QL query for the amenities inside `bounds`.
///
/// An empty `facility_types` slice selects every supported amenity. Regions
/// crossing the antimeridian are queried as two boxes because Overpass bbox
/// filters do not wrap. Ways are reported by their centre (`out center`).
///
/// # Examples
/// ```
/// use std::time::Duration;
///
/// use trailside_core::{Bounds, FacilityType};
/// use trailside_data::overpass::build_query;
///
/// let region = Bounds::new(46.0, 7.0, 47.0, 8.0)?;
/// let query = build_query(&region, &[FacilityType::Bench], Duration::from_secs(25));
/// assert!(query.starts_with("[out:json][timeout:25];"));
/// assert!(query.contains(r#"node["amenity"~"^(bench)$"](46,7,47,8);"#));
/// # Ok::<(), trailside_core::BoundsError>(())
/// ```
#[must_use]
pub fn build_query(bounds: &Bounds, facility_types: &[FacilityType], timeout: Duration) -> String {
    let selected = if facility_types.is_empty() {
        FacilityType::ALL.as_slice()
    } else {
        facility_types
    };
    let mut tags: Vec<&str> = Vec::with_capacity(selected.len());
    for kind in selected {
        if !tags.contains(&kind.as_tag()) {
            tags.push(kind.as_tag());
        }
    }
    let pattern = tags.join("|");

    let clauses: String = bounds
        .split_by_date_line()
        .iter()
        .flat_map(|half| {
            ELEMENT_KINDS
                .map(|element| format!("  {element}[\"amenity\"~\"^({pattern})$\"]({half});\n"))
        })
        .collect();

    let timeout_secs = timeout.as_secs().max(1);
    format!("[out:json][timeout:{timeout_secs}];\n(\n{clauses});\nout center;\n")
}
