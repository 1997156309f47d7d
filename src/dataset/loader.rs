//! Cached dataset loader with an explicit staleness budget.

use super::{Dataset, RejectReason, RejectedRow};
use crate::clock::{Clock, SystemClock};
use crate::store::DataStore;
use crate::Error;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Where a [`LoadedDataset`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Just read from the store
    Fresh,
    /// Served from cache within the staleness budget
    Cached,
    /// Store unreadable; served an expired cache entry
    Stale,
    /// Store unreadable and nothing cached; empty dataset
    Empty,
}

/// Result of a dataset load. Never fails; failures degrade.
#[derive(Debug, Clone)]
pub struct LoadedDataset {
    /// Validated rows
    pub dataset: Arc<Dataset>,
    /// Rows excluded by validation on the load that produced `dataset`
    pub rejected: Arc<Vec<RejectedRow>>,
    /// Provenance of `dataset`
    pub freshness: Freshness,
    /// Store failure, when `freshness` is `Stale` or `Empty`
    pub failure: Option<Arc<Error>>,
}

impl LoadedDataset {
    /// Number of excluded rows.
    #[must_use]
    pub fn excluded(&self) -> usize {
        self.rejected.len()
    }

    /// User-facing warnings for this load, most important first.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        let mut out = Vec::new();
        if let Some(err) = &self.failure {
            out.push(err.to_string());
        }

        let unknown_species = self
            .rejected
            .iter()
            .filter(|r| matches!(r.reason, RejectReason::UnknownSpecies(_)))
            .count();
        if unknown_species > 0 {
            out.push(format!(
                "Found {unknown_species} rows with invalid species. They will be excluded."
            ));
        }
        let bad_measurements = self.rejected.len() - unknown_species;
        if bad_measurements > 0 {
            out.push(format!(
                "Found {bad_measurements} rows with missing or non-numeric measurements. They will be excluded."
            ));
        }
        out
    }
}

#[derive(Debug)]
struct CacheEntry {
    loaded_at: Instant,
    dataset: Arc<Dataset>,
    rejected: Arc<Vec<RejectedRow>>,
}

/// Loads the reference dataset, caching it for `staleness`.
///
/// A zero staleness budget refetches on every call. When the store cannot be
/// read the loader falls back to the last cached dataset (however old), and
/// to an empty dataset if it never loaded one.
pub struct DatasetLoader<S, C = SystemClock> {
    store: Arc<S>,
    table: String,
    staleness: Duration,
    clock: C,
    cache: Mutex<Option<CacheEntry>>,
}

impl<S: DataStore> DatasetLoader<S> {
    /// Create a loader on the system clock.
    #[must_use]
    pub fn new(store: Arc<S>, table: impl Into<String>, staleness: Duration) -> Self {
        Self::with_clock(store, table, staleness, SystemClock)
    }
}

impl<S: DataStore, C: Clock> DatasetLoader<S, C> {
    /// Create a loader on a custom clock.
    #[must_use]
    pub fn with_clock(
        store: Arc<S>,
        table: impl Into<String>,
        staleness: Duration,
        clock: C,
    ) -> Self {
        Self {
            store,
            table: table.into(),
            staleness,
            clock,
            cache: Mutex::new(None),
        }
    }

    /// Staleness budget.
    #[must_use]
    pub const fn staleness(&self) -> Duration {
        self.staleness
    }

    /// Drop the cached dataset so the next load refetches.
    pub fn invalidate(&self) {
        *self.cache.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Load the dataset, from cache when within budget.
    pub async fn load(&self) -> LoadedDataset {
        let now = self.clock.now();
        if let Some(hit) = self.cached(now, false) {
            debug!(table = %self.table, "dataset served from cache");
            return hit;
        }

        match self.fetch().await {
            Ok((dataset, rejected)) => {
                info!(
                    table = %self.table,
                    rows = dataset.len(),
                    excluded = rejected.len(),
                    "dataset loaded"
                );
                if !rejected.is_empty() {
                    warn!(table = %self.table, excluded = rejected.len(), "excluded invalid dataset rows");
                }
                let dataset = Arc::new(dataset);
                let rejected = Arc::new(rejected);
                *self.cache.lock().unwrap_or_else(PoisonError::into_inner) = Some(CacheEntry {
                    loaded_at: now,
                    dataset: Arc::clone(&dataset),
                    rejected: Arc::clone(&rejected),
                });
                LoadedDataset {
                    dataset,
                    rejected,
                    freshness: Freshness::Fresh,
                    failure: None,
                }
            }
            Err(err) => {
                warn!(table = %self.table, error = %err, "dataset unavailable");
                let failure = Arc::new(err);
                if let Some(mut stale) = self.cached(now, true) {
                    stale.freshness = Freshness::Stale;
                    stale.failure = Some(failure);
                    return stale;
                }
                LoadedDataset {
                    dataset: Arc::new(Dataset::default()),
                    rejected: Arc::new(Vec::new()),
                    freshness: Freshness::Empty,
                    failure: Some(failure),
                }
            }
        }
    }

    fn cached(&self, now: Instant, allow_expired: bool) -> Option<LoadedDataset> {
        let guard = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = guard.as_ref()?;
        let age = now.saturating_duration_since(entry.loaded_at);
        if !allow_expired && age >= self.staleness {
            return None;
        }
        Some(LoadedDataset {
            dataset: Arc::clone(&entry.dataset),
            rejected: Arc::clone(&entry.rejected),
            freshness: Freshness::Cached,
            failure: None,
        })
    }

    async fn fetch(&self) -> crate::Result<(Dataset, Vec<RejectedRow>)> {
        let table = self
            .store
            .read_table(&self.table)
            .await
            .map_err(|e| match e {
                Error::DataUnavailable(msg) => Error::DataUnavailable(msg),
                other => Error::DataUnavailable(format!(
                    "failed to read table '{}': {other}",
                    self.table
                )),
            })?;
        Dataset::from_table(&table).map_err(|e| Error::DataUnavailable(e.to_string()))
    }
}
