//! Interaction log reader
//!
//! The aggregator and the debug view read the accumulated log independently
//! of live trials. Reads never fail: an unreadable log degrades to an empty
//! one, and malformed rows are skipped and counted.

use super::{records_from_table, InteractionRecord};
use crate::clock::{Clock, SystemClock};
use crate::store::DataStore;
use crate::{Error, Result};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// A read of the interaction log.
#[derive(Debug, Clone, Default)]
pub struct LogSnapshot {
    /// Valid records in log order
    pub records: Arc<Vec<InteractionRecord>>,
    /// Rows skipped as malformed ([`Error::InvalidRow`])
    pub invalid_rows: Arc<Vec<Error>>,
    /// Read failure, if the log could not be read ([`Error::DataUnavailable`])
    pub failure: Option<Arc<Error>>,
}

impl LogSnapshot {
    /// Number of valid records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True if no valid record was read.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// User-facing messages describing degraded reads.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        let mut out = Vec::new();
        if let Some(err) = &self.failure {
            out.push(format!("Error reading interaction data: {err}"));
        }
        if !self.invalid_rows.is_empty() {
            out.push(format!(
                "Skipped {} malformed interaction rows.",
                self.invalid_rows.len()
            ));
        }
        out
    }
}

/// Reads the interaction log, optionally caching it.
pub struct InteractionLog<S, C = SystemClock> {
    store: Arc<S>,
    table: String,
    staleness: Duration,
    clock: C,
    cache: Mutex<Option<(Instant, LogSnapshot)>>,
}

impl<S: DataStore> InteractionLog<S> {
    /// Create an uncached reader.
    #[must_use]
    pub fn new(store: Arc<S>, table: impl Into<String>) -> Self {
        Self::with_clock(store, table, Duration::ZERO, SystemClock)
    }
}

impl<S: DataStore, C: Clock> InteractionLog<S, C> {
    /// Create a reader caching successful reads for `staleness`.
    #[must_use]
    pub fn with_clock(store: Arc<S>, table: impl Into<String>, staleness: Duration, clock: C) -> Self {
        Self {
            store,
            table: table.into(),
            staleness,
            clock,
            cache: Mutex::new(None),
        }
    }

    /// Drop the cached read, e.g. after a new record was appended.
    pub fn invalidate(&self) {
        *self.cache.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Read the log, degrading to empty on failure.
    pub async fn read(&self) -> LogSnapshot {
        let now = self.clock.now();
        if let Some(snapshot) = self.cached(now) {
            debug!(table = %self.table, "interaction log served from cache");
            return snapshot;
        }

        match self.read_strict().await {
            Ok(snapshot) => {
                *self.cache.lock().unwrap_or_else(PoisonError::into_inner) =
                    Some((now, snapshot.clone()));
                snapshot
            }
            Err(err) => {
                warn!(table = %self.table, error = %err, "interaction log unavailable");
                LogSnapshot {
                    failure: Some(Arc::new(err)),
                    ..LogSnapshot::default()
                }
            }
        }
    }

    /// Read the log, surfacing a read failure.
    ///
    /// A log that was never written reads as empty.
    ///
    /// # Errors
    /// Returns [`Error::DataUnavailable`] if the store cannot be read.
    pub async fn read_strict(&self) -> Result<LogSnapshot> {
        let table = match self.store.read_table(&self.table).await {
            Ok(table) => table,
            Err(Error::DataUnavailable(msg)) => {
                debug!(table = %self.table, reason = %msg, "interaction log absent");
                return Ok(LogSnapshot::default());
            }
            Err(err) => {
                return Err(Error::DataUnavailable(format!(
                    "failed to read table '{}': {err}",
                    self.table
                )))
            }
        };

        let (records, invalid) = records_from_table(&table);
        if !invalid.is_empty() {
            warn!(table = %self.table, skipped = invalid.len(), "skipped malformed interaction rows");
        }
        Ok(LogSnapshot {
            records: Arc::new(records),
            invalid_rows: Arc::new(invalid),
            failure: None,
        })
    }

    fn cached(&self, now: Instant) -> Option<LogSnapshot> {
        let guard = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        let (loaded_at, snapshot) = guard.as_ref()?;
        (now.saturating_duration_since(*loaded_at) < self.staleness).then(|| snapshot.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::experiment::{Condition, INTERACTION_COLUMNS};
    use crate::store::{FlakyStore, MemoryStore, Row, Table};

    fn row(chart: &str, secs: &str) -> Row {
        Row::new()
            .with("timestamp", "2025-01-01 00:00:00")
            .with("participant_id", "p")
            .with("chart_type", chart)
            .with("time_taken", secs)
    }

    #[tokio::test]
    async fn test_missing_log_reads_empty() {
        let log = InteractionLog::new(Arc::new(MemoryStore::new()), "interactions");
        let snapshot = log.read().await;
        assert!(snapshot.is_empty());
        assert!(snapshot.failure.is_none());
        assert!(snapshot.messages().is_empty());
    }

    #[tokio::test]
    async fn test_skips_malformed_rows() {
        let store = Arc::new(MemoryStore::new());
        store.write_table("interactions", Table::new(INTERACTION_COLUMNS)).await.unwrap();
        store.append_row("interactions", row("violin", "2.5")).await.unwrap();
        store.append_row("interactions", row("bar", "2.5")).await.unwrap();

        let log = InteractionLog::new(store, "interactions");
        let snapshot = log.read().await;
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.records[0].condition(), Condition::Violin);
        assert_eq!(snapshot.invalid_rows.len(), 1);
        assert_eq!(snapshot.messages(), vec!["Skipped 1 malformed interaction rows.".to_string()]);
    }

    #[tokio::test]
    async fn test_unreadable_log_degrades() {
        let store = Arc::new(FlakyStore::new(MemoryStore::new()));
        store.set_reads_failing(true);
        let log = InteractionLog::new(Arc::clone(&store), "interactions");

        let snapshot = log.read().await;
        assert!(snapshot.is_empty());
        assert!(matches!(snapshot.failure.as_deref(), Some(Error::DataUnavailable(_))));
        assert!(snapshot.messages()[0].starts_with("Error reading interaction data"));

        assert!(log.read_strict().await.is_err());
    }

    #[tokio::test]
    async fn test_cache_and_invalidate() {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(crate::clock::ManualClock::new(
            chrono::NaiveDate::from_ymd_opt(2025, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
        ));
        let log = InteractionLog::with_clock(
            Arc::clone(&store),
            "interactions",
            Duration::from_secs(60),
            Arc::clone(&clock),
        );

        assert_eq!(log.read().await.len(), 0);
        store.append_row("interactions", row("pair", "1")).await.unwrap();
        assert_eq!(log.read().await.len(), 0);

        log.invalidate();
        assert_eq!(log.read().await.len(), 1);
    }
}
