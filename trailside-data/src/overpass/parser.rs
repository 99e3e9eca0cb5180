//! Lenient conversion of Overpass JSON documents into facilities.

use log::debug;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use trailside_core::{Facility, FacilityType};

use super::response::OverpassElement;

/// Errors for documents whose overall shape is unusable.
///
/// Problems with individual elements are never errors; such elements are
/// skipped.
#[derive(Debug, Error)]
pub enum OverpassParseError {
    /// The body was not valid JSON.
    #[error("response is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// The JSON root was an array, string, number or null.
    #[error("response root is not a JSON object")]
    RootNotObject,
    /// The root object had no `elements` array.
    #[error("response has no `elements` array")]
    MissingElements,
}

/// Extract typed facilities from an Overpass JSON response body.
///
/// An element yields a facility when it has numeric coordinates (directly or
/// via `center`) and an `amenity` tag naming a [`FacilityType`]. Elements
/// failing either test are dropped, and the number dropped is logged at
/// debug level. Document order is preserved.
///
/// # Errors
///
/// Returns [`OverpassParseError`] when the body is not JSON, the root is not
/// an object, or the root lacks an `elements` array.
///
/// # Examples
/// ```
/// use trailside_core::FacilityType;
/// use trailside_data::overpass::parse_facilities;
///
/// let body = r#"{"elements":[
///     {"type":"node","lat":46.68,"lon":7.86,"tags":{"amenity":"drinking_water"}},
///     {"type":"node","lat":46.69,"tags":{"amenity":"bench"}}
/// ]}"#;
/// let facilities = parse_facilities(body)?;
/// assert_eq!(facilities.len(), 1);
/// assert_eq!(facilities[0].kind, FacilityType::DrinkingWater);
/// # Ok::<(), trailside_data::overpass::OverpassParseError>(())
/// ```
pub fn parse_facilities(body: &str) -> Result<Vec<Facility>, OverpassParseError> {
    let root: Value = serde_json::from_str(body)?;
    let elements = root
        .as_object()
        .ok_or(OverpassParseError::RootNotObject)?
        .get("elements")
        .and_then(Value::as_array)
        .ok_or(OverpassParseError::MissingElements)?;

    let facilities: Vec<Facility> = elements.iter().filter_map(facility_from_value).collect();

    let dropped = elements.len() - facilities.len();
    if dropped > 0 {
        debug!(
            "skipped {dropped} of {} Overpass elements without a usable amenity or position",
            elements.len()
        );
    }
    Ok(facilities)
}

fn facility_from_value(value: &Value) -> Option<Facility> {
    let element = OverpassElement::deserialize(value).ok()?;
    let kind = element.amenity()?.parse::<FacilityType>().ok()?;
    let location = element.location()?;
    Some(Facility::new(kind, location))
}
