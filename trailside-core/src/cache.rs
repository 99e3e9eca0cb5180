//! Containment-keyed storage for previously fetched facility sets.
//!
//! Each entry remembers the exact bounds that populated it together with the
//! full result of that fetch. A later query is answered locally when some
//! entry's bounds encloses it: the entry's facilities are filtered down to the
//! query region using an R\*-tree built at insertion time.
//!
//! When several entries enclose a query, the one with the smallest area wins,
//! and ties go to the most recently inserted entry.

use std::{
    num::NonZeroUsize,
    sync::Arc,
    time::{Duration, Instant},
};

use rstar::{AABB, RTree, RTreeObject};

use crate::{Bounds, Facility};

/// Size and freshness limits applied by a [`FacilitiesCache`].
///
/// The default policy keeps every entry for the cache's lifetime, which suits
/// a short-lived session cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CachePolicy {
    /// Maximum number of entries; the oldest entry is evicted first.
    pub max_entries: Option<NonZeroUsize>,
    /// Age after which an entry is ignored and later purged.
    pub time_to_live: Option<Duration>,
}

impl CachePolicy {
    /// A policy without size or age limits.
    #[must_use]
    pub const fn unbounded() -> Self {
        Self {
            max_entries: None,
            time_to_live: None,
        }
    }

    /// Limit the number of stored entries.
    #[must_use]
    pub const fn with_max_entries(mut self, max_entries: NonZeroUsize) -> Self {
        self.max_entries = Some(max_entries);
        self
    }

    /// Expire entries older than `time_to_live`.
    #[must_use]
    pub const fn with_time_to_live(mut self, time_to_live: Duration) -> Self {
        self.time_to_live = Some(time_to_live);
        self
    }
}

/// Position of a facility inside its entry, indexed by location.
#[derive(Debug, Clone, Copy, PartialEq)]
struct IndexedFacility {
    position: usize,
    location: [f64; 2],
}

impl RTreeObject for IndexedFacility {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.location)
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    bounds: Bounds,
    facilities: Arc<[Facility]>,
    index: RTree<IndexedFacility>,
    sequence: u64,
    inserted_at: Instant,
}

impl CacheEntry {
    fn new(bounds: Bounds, facilities: Arc<[Facility]>, sequence: u64, now: Instant) -> Self {
        let indexed = facilities
            .iter()
            .enumerate()
            .filter(|(_, facility)| facility.location.x.is_finite() && facility.location.y.is_finite())
            .map(|(position, facility)| IndexedFacility {
                position,
                location: [facility.location.x, facility.location.y],
            })
            .collect();
        Self {
            bounds,
            facilities,
            index: RTree::bulk_load(indexed),
            sequence,
            inserted_at: now,
        }
    }

    /// Facilities inside `bounds`, in the order the source returned them.
    fn facilities_within(&self, bounds: &Bounds) -> Vec<Facility> {
        let mut positions: Vec<usize> = bounds
            .to_rects()
            .iter()
            .flat_map(|rect| {
                let envelope =
                    AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]);
                self.index
                    .locate_in_envelope(&envelope)
                    .map(|entry| entry.position)
                    .collect::<Vec<_>>()
            })
            .collect();
        // Points on the antimeridian can match both halves.
        positions.sort_unstable();
        positions.dedup();
        positions
            .into_iter()
            .filter_map(|position| self.facilities.get(position).copied())
            .collect()
    }
}

/// In-memory mapping from fetched bounds to their facility sets.
///
/// # Examples
///
/// ```
/// use geo::Coord;
/// use trailside_core::{Bounds, FacilitiesCache, Facility, FacilityType};
///
/// let mut cache = FacilitiesCache::new();
/// let valley = Bounds::new(46.0, 7.0, 47.0, 8.0)?;
/// let bench = Facility::new(FacilityType::Bench, Coord { x: 7.3, y: 46.3 });
/// let bins = Facility::new(FacilityType::WasteBasket, Coord { x: 7.9, y: 46.9 });
/// cache.insert(valley, vec![bench, bins]);
///
/// let meadow = Bounds::new(46.2, 7.2, 46.4, 7.4)?;
/// assert_eq!(cache.lookup(&meadow), Some(vec![bench]));
/// # Ok::<(), trailside_core::BoundsError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct FacilitiesCache {
    entries: Vec<CacheEntry>,
    policy: CachePolicy,
    next_sequence: u64,
}

impl FacilitiesCache {
    /// Create an unbounded cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cache that enforces `policy`.
    #[must_use]
    pub fn with_policy(policy: CachePolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    /// The policy in force.
    #[must_use]
    pub const fn policy(&self) -> CachePolicy {
        self.policy
    }

    /// Serve `bounds` from a stored entry that encloses it.
    ///
    /// Returns `None` when no live entry encloses the query. A hit returns
    /// only the facilities inside `bounds`, edges included.
    #[must_use]
    pub fn lookup(&self, bounds: &Bounds) -> Option<Vec<Facility>> {
        let now = Instant::now();
        self.entries
            .iter()
            .filter(|entry| !self.is_expired(entry, now))
            .filter(|entry| entry.bounds.contains_bounds(bounds))
            .min_by(|a, b| {
                a.bounds
                    .area_sq_degrees()
                    .total_cmp(&b.bounds.area_sq_degrees())
                    .then_with(|| b.sequence.cmp(&a.sequence))
            })
            .map(|entry| entry.facilities_within(bounds))
    }

    /// Store the full result of a fetch under its exact bounds.
    ///
    /// An existing entry with identical bounds is replaced. Expired entries
    /// are purged and the oldest entries evicted when the policy caps the
    /// cache size.
    pub fn insert(&mut self, bounds: Bounds, facilities: impl Into<Arc<[Facility]>>) {
        let now = Instant::now();
        self.purge_expired(now);
        self.entries.retain(|entry| entry.bounds != bounds);

        let sequence = self.next_sequence;
        self.next_sequence = self.next_sequence.wrapping_add(1);
        self.entries
            .push(CacheEntry::new(bounds, facilities.into(), sequence, now));

        if let Some(max_entries) = self.policy.max_entries {
            let excess = self.entries.len().saturating_sub(max_entries.get());
            // Entries stay in insertion order, so the front holds the oldest.
            self.entries.drain(..excess);
        }
    }

    /// Live entries in insertion order.
    pub fn entries(&self) -> impl Iterator<Item = (Bounds, &[Facility])> + '_ {
        let now = Instant::now();
        self.entries
            .iter()
            .filter(move |entry| !self.is_expired(entry, now))
            .map(|entry| (entry.bounds, &*entry.facilities))
    }

    /// Number of stored entries, including expired ones not yet purged.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    fn is_expired(&self, entry: &CacheEntry, now: Instant) -> bool {
        self.policy
            .time_to_live
            .is_some_and(|ttl| now.saturating_duration_since(entry.inserted_at) >= ttl)
    }

    fn purge_expired(&mut self, now: Instant) {
        if self.policy.time_to_live.is_none() {
            return;
        }
        let policy = self.policy;
        self.entries.retain(|entry| {
            policy
                .time_to_live
                .is_none_or(|ttl| now.saturating_duration_since(entry.inserted_at) < ttl)
        });
    }
}
