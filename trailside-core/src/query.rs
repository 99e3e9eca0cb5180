//! Cache-first facility lookups with in-flight fetch coalescing.
//!
//! [`FacilityQueryService`] owns a [`FacilitiesCache`] and a
//! [`FacilitySource`]. Queries enclosed by a cached region are answered
//! locally. Queries enclosed by a region that is currently being fetched wait
//! for that fetch rather than starting another one. Everything else triggers
//! exactly one remote call whose full result is cached under the queried
//! bounds.
//!
//! The state mutex is never held across an await point.

use std::{
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError, Weak},
};

use futures_util::future::{BoxFuture, FutureExt, Shared};
use log::{debug, info, warn};

use crate::{Bounds, FacilitiesCache, Facility, FacilityFetchError, FacilitySource};

type FetchResult = Result<Arc<[Facility]>, FacilityFetchError>;
type SharedFetch = Shared<BoxFuture<'static, FetchResult>>;

struct InFlightFetch {
    id: u64,
    bounds: Bounds,
    pending: SharedFetch,
}

#[derive(Default)]
struct QueryState {
    cache: FacilitiesCache,
    in_flight: Vec<InFlightFetch>,
    next_fetch_id: u64,
}

impl QueryState {
    /// Drop fetches whose every waiter has gone away.
    ///
    /// Such a fetch is only referenced by its in-flight entry and will never
    /// be polled again, so joining it would stall on a stale request.
    fn prune_abandoned(&mut self) {
        let before = self.in_flight.len();
        self.in_flight
            .retain(|fetch| fetch.pending.strong_count() != Some(1));
        let pruned = before - self.in_flight.len();
        if pruned > 0 {
            debug!("discarded {pruned} abandoned in-flight fetches");
        }
    }

    /// The live in-flight fetch with the smallest region enclosing `bounds`.
    fn joinable_fetch(&mut self, bounds: &Bounds) -> Option<(Bounds, SharedFetch)> {
        self.prune_abandoned();
        self.in_flight
            .iter()
            .filter(|fetch| fetch.bounds.contains_bounds(bounds))
            .min_by(|a, b| {
                a.bounds
                    .area_sq_degrees()
                    .total_cmp(&b.bounds.area_sq_degrees())
            })
            .map(|fetch| (fetch.bounds, fetch.pending.clone()))
    }
}

/// Cache-first facade over a [`FacilitySource`].
///
/// Cloning the service shares its cache and in-flight fetches.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use async_trait::async_trait;
/// use geo::Coord;
/// use trailside_core::{
///     Bounds, Facility, FacilityFetchError, FacilityQueryService, FacilitySource, FacilityType,
/// };
///
/// struct Benches;
///
/// #[async_trait]
/// impl FacilitySource for Benches {
///     async fn fetch_facilities(
///         &self,
///         _bounds: &Bounds,
///     ) -> Result<Vec<Facility>, FacilityFetchError> {
///         Ok(vec![Facility::new(FacilityType::Bench, Coord { x: 7.5, y: 46.5 })])
///     }
/// }
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let service = FacilityQueryService::new(Arc::new(Benches));
/// let region = Bounds::new(46.0, 7.0, 47.0, 8.0)?;
/// let facilities = futures_util::FutureExt::now_or_never(service.get_facilities(&region))
///     .ok_or("source should resolve immediately")??;
/// assert_eq!(facilities.len(), 1);
/// assert_eq!(service.cached_entry_count(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct FacilityQueryService {
    source: Arc<dyn FacilitySource>,
    state: Arc<Mutex<QueryState>>,
}

impl fmt::Debug for FacilityQueryService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock_state();
        f.debug_struct("FacilityQueryService")
            .field("cache", &state.cache)
            .field("in_flight", &state.in_flight.len())
            .finish_non_exhaustive()
    }
}

impl FacilityQueryService {
    /// Create a service with an empty, unbounded cache.
    #[must_use]
    pub fn new(source: Arc<dyn FacilitySource>) -> Self {
        Self::with_cache(source, FacilitiesCache::new())
    }

    /// Create a service around an existing cache, for example one restored
    /// from a snapshot or configured with a [`crate::CachePolicy`].
    #[must_use]
    pub fn with_cache(source: Arc<dyn FacilitySource>, cache: FacilitiesCache) -> Self {
        Self {
            source,
            state: Arc::new(Mutex::new(QueryState {
                cache,
                ..QueryState::default()
            })),
        }
    }

    /// Return the facilities for `bounds`, consulting the cache first.
    ///
    /// A cache hit yields only the facilities inside `bounds`. A fresh fetch
    /// yields the source's full result, which is also cached under `bounds`.
    /// A query that joins a wider in-flight fetch receives that fetch's
    /// result filtered to `bounds`.
    ///
    /// # Errors
    ///
    /// Returns the source's [`FacilityFetchError`] unchanged when the fetch
    /// serving this query fails. Failures are never cached.
    pub async fn get_facilities(
        &self,
        bounds: &Bounds,
    ) -> Result<Vec<Facility>, FacilityFetchError> {
        let (fetch_bounds, pending) = {
            let mut state = self.lock_state();
            if let Some(hit) = state.cache.lookup(bounds) {
                debug!("cache hit for {bounds}: {} facilities", hit.len());
                return Ok(hit);
            }
            match state.joinable_fetch(bounds) {
                Some((fetch_bounds, pending)) => {
                    debug!("joining in-flight fetch for {fetch_bounds} to serve {bounds}");
                    (fetch_bounds, pending)
                }
                None => {
                    debug!("cache miss for {bounds}; fetching from source");
                    (*bounds, self.start_fetch(&mut state, *bounds))
                }
            }
        };

        let facilities = pending.await?;
        if fetch_bounds == *bounds {
            Ok(facilities.to_vec())
        } else {
            Ok(facilities
                .iter()
                .filter(|facility| bounds.contains_location(facility.location))
                .copied()
                .collect())
        }
    }

    /// Number of cached regions.
    #[must_use]
    pub fn cached_entry_count(&self) -> usize {
        self.lock_state().cache.len()
    }

    /// Copy out every live cache entry, oldest first.
    #[must_use]
    pub fn cache_entries(&self) -> Vec<(Bounds, Vec<Facility>)> {
        self.lock_state()
            .cache
            .entries()
            .map(|(bounds, facilities)| (bounds, facilities.to_vec()))
            .collect()
    }

    /// Forget every cached region. In-flight fetches are unaffected and will
    /// still populate the cache when they complete.
    pub fn clear_cache(&self) {
        self.lock_state().cache.clear();
    }

    fn lock_state(&self) -> MutexGuard<'_, QueryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn start_fetch(&self, state: &mut QueryState, bounds: Bounds) -> SharedFetch {
        let id = state.next_fetch_id;
        state.next_fetch_id = state.next_fetch_id.wrapping_add(1);

        let source = Arc::clone(&self.source);
        let shared_state = Arc::downgrade(&self.state);
        let pending = async move {
            let outcome = source
                .fetch_facilities(&bounds)
                .await
                .map(Arc::<[Facility]>::from);
            complete_fetch(&shared_state, id, bounds, &outcome);
            outcome
        }
        .boxed()
        .shared();

        state.in_flight.push(InFlightFetch {
            id,
            bounds,
            pending: pending.clone(),
        });
        pending
    }
}

/// Retire fetch `id` and cache its result in a single critical section so a
/// concurrent query always sees either the in-flight entry or the cached one.
fn complete_fetch(
    shared_state: &Weak<Mutex<QueryState>>,
    id: u64,
    bounds: Bounds,
    outcome: &FetchResult,
) {
    // The service may have been dropped while a detached waiter kept polling.
    let Some(state) = shared_state.upgrade() else {
        return;
    };
    let mut guard = state.lock().unwrap_or_else(PoisonError::into_inner);
    guard.in_flight.retain(|fetch| fetch.id != id);
    match outcome {
        Ok(facilities) => {
            info!("cached {} facilities for {bounds}", facilities.len());
            guard.cache.insert(bounds, Arc::clone(facilities));
        }
        Err(err) => warn!("facility fetch for {bounds} failed: {err}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FacilityType, test_support::RecordingFacilitySource};
    use async_trait::async_trait;
    use futures_util::future::join;
    use geo::Coord;
    use rstest::{fixture, rstest};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Source that yields before answering, so concurrent queries overlap.
    ///
    /// With `stall_first` set, the first fetch never completes.
    #[derive(Debug, Clone)]
    struct YieldingSource {
        facilities: Vec<Facility>,
        stall_first: bool,
        calls: Arc<AtomicUsize>,
    }

    impl YieldingSource {
        fn new(facilities: Vec<Facility>, stall_first: bool) -> Self {
            Self {
                facilities,
                stall_first,
                calls: Arc::default(),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl FacilitySource for YieldingSource {
        async fn fetch_facilities(
            &self,
            bounds: &Bounds,
        ) -> Result<Vec<Facility>, FacilityFetchError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.stall_first && call == 0 {
                std::future::pending::<()>().await;
            }
            tokio::task::yield_now().await;
            Ok(self
                .facilities
                .iter()
                .filter(|facility| bounds.contains_location(facility.location))
                .copied()
                .collect())
        }
    }

    fn bounds(south: f64, west: f64, north: f64, east: f64) -> Bounds {
        Bounds::new(south, west, north, east).expect("valid bounds")
    }

    fn block_on<F: std::future::Future>(future: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread()
            .build()
            .expect("runtime")
            .block_on(future)
    }

    #[fixture]
    fn facilities() -> Vec<Facility> {
        vec![
            Facility::new(FacilityType::Bench, Coord { x: 7.3, y: 46.3 }),
            Facility::new(FacilityType::Toilets, Coord { x: 7.9, y: 46.9 }),
        ]
    }

    #[rstest]
    fn miss_fetches_once_then_serves_from_cache(facilities: Vec<Facility>) {
        let source = RecordingFacilitySource::new(facilities.clone());
        let service = FacilityQueryService::new(Arc::new(source.clone()));
        let region = bounds(46.0, 7.0, 47.0, 8.0);

        let first = block_on(service.get_facilities(&region)).expect("fetch succeeds");
        let second = block_on(service.get_facilities(&bounds(46.2, 7.2, 46.4, 7.4)))
            .expect("cache hit succeeds");

        assert_eq!(first, facilities);
        assert_eq!(second, facilities.get(..1).expect("slice").to_vec());
        assert_eq!(source.calls(), 1);
        assert_eq!(service.cached_entry_count(), 1);
    }

    #[rstest]
    fn failures_propagate_without_caching() {
        let error = FacilityFetchError::Timeout {
            url: "https://overpass.test/api/interpreter".to_owned(),
            timeout_secs: 5,
        };
        let source = RecordingFacilitySource::failing(error.clone());
        let service = FacilityQueryService::new(Arc::new(source.clone()));
        let region = bounds(0.0, 0.0, 1.0, 1.0);

        let result = block_on(service.get_facilities(&region));

        assert_eq!(result, Err(error));
        assert_eq!(service.cached_entry_count(), 0);
        let retry = block_on(service.get_facilities(&region));
        assert!(retry.is_err());
        assert_eq!(source.calls(), 2, "failures must not be cached");
    }

    #[rstest]
    fn concurrent_contained_queries_share_one_fetch(facilities: Vec<Facility>) {
        let source = YieldingSource::new(facilities.clone(), false);
        let service = FacilityQueryService::new(Arc::new(source.clone()));
        let outer = bounds(46.0, 7.0, 47.0, 8.0);
        let inner = bounds(46.2, 7.2, 46.4, 7.4);

        let (wide, narrow) = block_on(join(
            service.get_facilities(&outer),
            service.get_facilities(&inner),
        ));

        assert_eq!(wide.expect("outer query"), facilities);
        assert_eq!(
            narrow.expect("inner query"),
            facilities.get(..1).expect("slice").to_vec()
        );
        assert_eq!(source.calls(), 1);
        assert_eq!(service.cached_entry_count(), 1, "only the outer fetch is cached");
    }

    #[rstest]
    fn abandoned_fetch_is_not_joined_by_later_queries(facilities: Vec<Facility>) {
        let source = YieldingSource::new(facilities.clone(), true);
        let service = FacilityQueryService::new(Arc::new(source.clone()));
        let region = bounds(46.0, 7.0, 47.0, 8.0);

        // Poll once, then give up while the fetch is still outstanding.
        assert!(service.get_facilities(&region).now_or_never().is_none());
        assert_eq!(source.calls(), 1);

        let fresh = block_on(service.get_facilities(&region)).expect("fresh fetch succeeds");
        let contained = block_on(service.get_facilities(&bounds(46.2, 7.2, 46.4, 7.4)))
            .expect("cache hit succeeds");

        assert_eq!(fresh, facilities);
        assert_eq!(contained.len(), 1);
        assert_eq!(source.calls(), 2);
        assert_eq!(service.cached_entry_count(), 1);
    }

    #[rstest]
    fn live_waiter_keeps_fetch_joinable(facilities: Vec<Facility>) {
        let source = YieldingSource::new(facilities, false);
        let service = FacilityQueryService::new(Arc::new(source.clone()));
        let outer = bounds(46.0, 7.0, 47.0, 8.0);
        let inner = bounds(46.2, 7.2, 46.4, 7.4);

        let mut waiter = Box::pin(service.get_facilities(&outer));
        assert!((&mut waiter).now_or_never().is_none());
        let (wide, narrow) = block_on(join(waiter, service.get_facilities(&inner)));

        assert_eq!(wide.expect("outer query").len(), 2);
        assert_eq!(narrow.expect("inner query").len(), 1);
        assert_eq!(source.calls(), 1);
    }

    #[rstest]
    fn clearing_cache_forces_refetch(facilities: Vec<Facility>) {
        let source = RecordingFacilitySource::new(facilities);
        let service = FacilityQueryService::new(Arc::new(source.clone()));
        let region = bounds(46.0, 7.0, 47.0, 8.0);

        block_on(service.get_facilities(&region)).expect("first fetch");
        service.clear_cache();
        block_on(service.get_facilities(&region)).expect("second fetch");

        assert_eq!(source.calls(), 2);
    }

    #[rstest]
    fn seeded_cache_is_served_without_fetching(facilities: Vec<Facility>) {
        let region = bounds(46.0, 7.0, 47.0, 8.0);
        let mut cache = FacilitiesCache::new();
        cache.insert(region, facilities.clone());
        let source = RecordingFacilitySource::new(Vec::new());
        let service = FacilityQueryService::with_cache(Arc::new(source.clone()), cache);

        let found = block_on(service.get_facilities(&region)).expect("cache hit");

        assert_eq!(found, facilities);
        assert_eq!(source.calls(), 0);
        assert_eq!(service.cache_entries(), vec![(region, facilities)]);
    }
}
