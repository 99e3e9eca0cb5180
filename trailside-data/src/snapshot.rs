//! Versioned JSON persistence for facility cache entries.
//!
//! A snapshot stores each cached region with the full facility list fetched
//! for it, so a later process can seed a [`FacilitiesCache`] and skip the
//! remote calls:
//!
//! ```json
//! {
//!   "version": 1,
//!   "entries": [
//!     {
//!       "bounds": { "south": 46.0, "west": 7.0, "north": 47.0, "east": 8.0 },
//!       "facilities": [ { "kind": "bench", "location": { "x": 7.5, "y": 46.5 } } ]
//!     }
//!   ]
//! }
//! ```

use camino::{Utf8Path, Utf8PathBuf};
use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use trailside_core::{Bounds, CachePolicy, FacilitiesCache, Facility};

/// Format version written by this crate.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Errors raised while reading or writing snapshots.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// Reading or writing the file failed.
    #[error("snapshot IO failed for {path}: {source}")]
    Io {
        /// Snapshot location.
        path: Utf8PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
    /// The file is not a valid snapshot document.
    #[error("failed to decode snapshot {path}: {source}")]
    Decode {
        /// Snapshot location.
        path: Utf8PathBuf,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
    /// Serialising the snapshot failed.
    #[error("failed to encode snapshot: {0}")]
    Encode(#[source] serde_json::Error),
    /// The file was written by an incompatible version.
    #[error("snapshot {path} has unsupported version {found}")]
    UnsupportedVersion {
        /// Snapshot location.
        path: Utf8PathBuf,
        /// Version recorded in the file.
        found: u32,
    },
}

/// One cached region and everything fetched for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    /// Bounds of the populating fetch.
    pub bounds: Bounds,
    /// Full fetch result.
    pub facilities: Vec<Facility>,
}

#[derive(Debug, Deserialize)]
struct VersionProbe {
    version: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct SnapshotDocument {
    version: u32,
    entries: Vec<SnapshotEntry>,
}

/// Cache contents detached from any running service.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheSnapshot {
    entries: Vec<SnapshotEntry>,
}

impl CacheSnapshot {
    /// Capture the given `(bounds, facilities)` pairs in order.
    #[must_use]
    pub fn from_entries(entries: impl IntoIterator<Item = (Bounds, Vec<Facility>)>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|(bounds, facilities)| SnapshotEntry { bounds, facilities })
                .collect(),
        }
    }

    /// Capture every live entry of `cache`.
    #[must_use]
    pub fn from_cache(cache: &FacilitiesCache) -> Self {
        Self::from_entries(
            cache
                .entries()
                .map(|(bounds, facilities)| (bounds, facilities.to_vec())),
        )
    }

    /// Stored entries, oldest first.
    #[must_use]
    pub fn entries(&self) -> &[SnapshotEntry] {
        &self.entries
    }

    /// Build a cache holding these entries under `policy`.
    ///
    /// Entries are inserted oldest first, so a capacity limit keeps the most
    /// recent regions.
    #[must_use]
    pub fn into_cache(self, policy: CachePolicy) -> FacilitiesCache {
        let mut cache = FacilitiesCache::with_policy(policy);
        for entry in self.entries {
            cache.insert(entry.bounds, entry.facilities);
        }
        cache
    }

    /// Load a snapshot from `path`.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError`] when the file cannot be read, is not a
    /// snapshot document, or has an unsupported version.
    pub fn read(path: &Utf8Path) -> Result<Self, SnapshotError> {
        let text = trailside_fs::read_to_string(path).map_err(|source| SnapshotError::Io {
            path: path.to_owned(),
            source,
        })?;
        let decode = |source| SnapshotError::Decode {
            path: path.to_owned(),
            source,
        };

        let probe: VersionProbe = serde_json::from_str(&text).map_err(decode)?;
        if probe.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::UnsupportedVersion {
                path: path.to_owned(),
                found: probe.version,
            });
        }
        let document: SnapshotDocument = serde_json::from_str(&text).map_err(decode)?;
        debug!("read {} cached regions from {path}", document.entries.len());
        Ok(Self {
            entries: document.entries,
        })
    }

    /// Load a snapshot when `path` names an existing file.
    ///
    /// # Errors
    ///
    /// As [`CacheSnapshot::read`], plus IO errors probing the path.
    pub fn read_if_exists(path: &Utf8Path) -> Result<Option<Self>, SnapshotError> {
        let exists = trailside_fs::file_is_file(path).map_err(|source| SnapshotError::Io {
            path: path.to_owned(),
            source,
        })?;
        if exists {
            Self::read(path).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Write the snapshot to `path` as pretty-printed JSON, creating parent
    /// directories and replacing any existing file atomically.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError`] when encoding or writing fails.
    pub fn write(&self, path: &Utf8Path) -> Result<(), SnapshotError> {
        let document = SnapshotDocument {
            version: SNAPSHOT_VERSION,
            entries: self.entries.clone(),
        };
        let text = serde_json::to_string_pretty(&document).map_err(SnapshotError::Encode)?;
        trailside_fs::write_atomically(path, text).map_err(|source| SnapshotError::Io {
            path: path.to_owned(),
            source,
        })?;
        debug!("wrote {} cached regions to {path}", self.entries.len());
        Ok(())
    }
}
