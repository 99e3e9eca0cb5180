//! Remote facility repositories.
//!
//! [`FacilitySource`] is the seam between the cache and whatever service
//! answers bounds queries (an Overpass endpoint in production, stubs in
//! tests). Errors are cloneable so a single failed fetch can be reported to
//! every caller that was waiting on it.

use async_trait::async_trait;
use thiserror::Error;

use crate::{Bounds, Facility};

/// Errors from [`FacilitySource::fetch_facilities`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FacilityFetchError {
    /// The request never produced a response.
    #[error("network error requesting {url}: {message}")]
    Network {
        /// Endpoint that was contacted.
        url: String,
        /// Transport error description.
        message: String,
    },
    /// The transport gave up waiting for a response.
    #[error("request to {url} timed out after {timeout_secs}s")]
    Timeout {
        /// Endpoint that was contacted.
        url: String,
        /// Configured timeout in whole seconds.
        timeout_secs: u64,
    },
    /// The service answered with a non-success status.
    #[error("{url} responded with HTTP {status}: {message}")]
    HttpStatus {
        /// Endpoint that was contacted.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Status description or response excerpt.
        message: String,
    },
    /// The service answered successfully but without a body.
    #[error("{url} returned an empty response body")]
    EmptyResponse {
        /// Endpoint that was contacted.
        url: String,
    },
    /// The response body was not a valid facility document.
    #[error("failed to parse facility response: {message}")]
    Parse {
        /// Decoder error description.
        message: String,
    },
}

/// Fetch every facility inside a region from a remote repository.
///
/// Implementations may return facilities slightly outside `bounds` (for
/// example way centroids); callers that need strict containment filter the
/// result themselves.
///
/// # Examples
///
/// ```rust
/// use async_trait::async_trait;
/// use geo::Coord;
/// use trailside_core::{Bounds, Facility, FacilityFetchError, FacilitySource, FacilityType};
///
/// struct SingleBench;
///
/// #[async_trait]
/// impl FacilitySource for SingleBench {
///     async fn fetch_facilities(
///         &self,
///         bounds: &Bounds,
///     ) -> Result<Vec<Facility>, FacilityFetchError> {
///         let bench = Facility::new(FacilityType::Bench, Coord { x: 7.5, y: 46.5 });
///         Ok(vec![bench]
///             .into_iter()
///             .filter(|facility| bounds.contains_location(facility.location))
///             .collect())
///     }
/// }
/// ```
#[async_trait]
pub trait FacilitySource: Send + Sync {
    /// Return the facilities located within `bounds`.
    async fn fetch_facilities(&self, bounds: &Bounds)
    -> Result<Vec<Facility>, FacilityFetchError>;
}
