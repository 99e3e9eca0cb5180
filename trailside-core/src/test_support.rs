//! Test-only [`FacilitySource`] implementations used by unit tests and by
//! downstream crates that enable the `test-support` feature.

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;

use crate::{Bounds, Facility, FacilityFetchError, FacilitySource};

/// In-memory source that counts fetches.
///
/// Successful fetches return the configured facilities that fall inside the
/// requested bounds. Clones share the call counter, so a test can hand one
/// clone to a service and inspect the other.
#[derive(Debug, Clone)]
pub struct RecordingFacilitySource {
    outcome: Result<Vec<Facility>, FacilityFetchError>,
    calls: Arc<AtomicUsize>,
}

impl RecordingFacilitySource {
    /// Serve `facilities` filtered to each requested region.
    #[must_use]
    pub fn new(facilities: Vec<Facility>) -> Self {
        Self {
            outcome: Ok(facilities),
            calls: Arc::default(),
        }
    }

    /// Fail every fetch with `error`.
    #[must_use]
    pub fn failing(error: FacilityFetchError) -> Self {
        Self {
            outcome: Err(error),
            calls: Arc::default(),
        }
    }

    /// Number of fetches issued so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FacilitySource for RecordingFacilitySource {
    async fn fetch_facilities(
        &self,
        bounds: &Bounds,
    ) -> Result<Vec<Facility>, FacilityFetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let facilities = self.outcome.as_ref().map_err(Clone::clone)?;
        Ok(facilities
            .iter()
            .filter(|facility| bounds.contains_location(facility.location))
            .copied()
            .collect())
    }
}
