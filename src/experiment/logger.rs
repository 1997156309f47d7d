//! Interaction logger: one append per completed trial.

use super::{Condition, InteractionRecord, ParticipantId, INTERACTION_COLUMNS};
use crate::clock::{Clock, SystemClock};
use crate::store::{DataStore, Table};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// How the logger appends to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AppendMode {
    /// Use the store's `append_row`.
    #[default]
    Native,
    /// Read the whole log, add the row, write the whole log back.
    ///
    /// An unreadable log is treated as empty, so a transient read failure
    /// followed by a successful write replaces the log with a single row.
    ReadModifyWrite,
}

/// Appends [`InteractionRecord`]s to the interactions table.
///
/// Atomicity comes from the store: after success the record is present,
/// after failure the logger has written nothing itself.
pub struct InteractionLogger<S, C = SystemClock> {
    store: Arc<S>,
    table: String,
    mode: AppendMode,
    clock: C,
}

impl<S: DataStore> InteractionLogger<S> {
    /// Create a logger on the system clock.
    #[must_use]
    pub fn new(store: Arc<S>, table: impl Into<String>, mode: AppendMode) -> Self {
        Self::with_clock(store, table, mode, SystemClock)
    }
}

impl<S: DataStore, C: Clock> InteractionLogger<S, C> {
    /// Create a logger on a custom clock (used for record timestamps).
    #[must_use]
    pub fn with_clock(store: Arc<S>, table: impl Into<String>, mode: AppendMode, clock: C) -> Self {
        Self {
            store,
            table: table.into(),
            mode,
            clock,
        }
    }

    /// Target table name.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Append mode.
    #[must_use]
    pub const fn mode(&self) -> AppendMode {
        self.mode
    }

    /// Clock used for timestamps.
    #[must_use]
    pub const fn clock(&self) -> &C {
        &self.clock
    }

    /// Append one record stamped with the current wall-clock time.
    ///
    /// # Errors
    /// Returns [`Error::LogWriteFailure`] on any store failure. The caller
    /// decides whether to retry.
    pub async fn log_interaction(
        &self,
        participant_id: &ParticipantId,
        condition: Condition,
        elapsed_seconds: f64,
    ) -> Result<InteractionRecord> {
        let record = InteractionRecord::new(
            self.clock.wall(),
            participant_id.clone(),
            condition,
            elapsed_seconds,
        );

        let written = match self.mode {
            AppendMode::Native => self.store.append_row(&self.table, record.to_row()).await,
            AppendMode::ReadModifyWrite => self.read_modify_write(&record).await,
        };

        match written {
            Ok(()) => {
                info!(
                    table = %self.table,
                    participant = %participant_id,
                    condition = %condition,
                    elapsed_seconds = record.elapsed_seconds(),
                    "interaction logged"
                );
                Ok(record)
            }
            Err(err) => {
                warn!(table = %self.table, error = %err, "interaction log write failed");
                Err(Error::LogWriteFailure(err.to_string()))
            }
        }
    }

    async fn read_modify_write(&self, record: &InteractionRecord) -> Result<()> {
        let mut table = match self.store.read_table(&self.table).await {
            Ok(table) if !table.columns().is_empty() => table,
            Ok(_) => Table::new(INTERACTION_COLUMNS),
            Err(err) => {
                warn!(table = %self.table, error = %err, "interaction log unreadable, treating as empty");
                Table::new(INTERACTION_COLUMNS)
            }
        };
        table.push_named(&record.to_row());
        self.store.write_table(&self.table, table).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::experiment::records_from_table;
    use crate::store::{FlakyStore, MemoryStore};
    use chrono::NaiveDate;

    fn clock() -> ManualClock {
        ManualClock::new(
            NaiveDate::from_ymd_opt(2025, 6, 2)
                .unwrap()
                .and_hms_opt(10, 30, 0)
                .unwrap(),
        )
    }

    #[tokio::test]
    async fn test_native_append() {
        let store = Arc::new(MemoryStore::new());
        let logger =
            InteractionLogger::with_clock(Arc::clone(&store), "interactions", AppendMode::Native, clock());

        let record = logger
            .log_interaction(&"p-1".into(), Condition::Violin, 4.2)
            .await
            .unwrap();
        assert_eq!(record.timestamp().to_string(), "2025-06-02 10:30:00");

        let table = store.read_table("interactions").await.unwrap();
        let (records, invalid) = records_from_table(&table);
        assert!(invalid.is_empty());
        assert_eq!(records, vec![record]);
    }

    #[tokio::test]
    async fn test_read_modify_write_appends() {
        let store = Arc::new(MemoryStore::new());
        let logger = InteractionLogger::with_clock(
            Arc::clone(&store),
            "interactions",
            AppendMode::ReadModifyWrite,
            clock(),
        );

        for i in 0..3 {
            logger
                .log_interaction(&"p".into(), Condition::Pair, f64::from(i))
                .await
                .unwrap();
        }

        let table = store.read_table("interactions").await.unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.columns().len(), INTERACTION_COLUMNS.len());
    }

    #[tokio::test]
    async fn test_read_modify_write_tolerates_unreadable_log() {
        let store = Arc::new(FlakyStore::new(MemoryStore::new()));
        store.set_reads_failing(true);
        let logger =
            InteractionLogger::new(Arc::clone(&store), "interactions", AppendMode::ReadModifyWrite);

        assert!(logger
            .log_interaction(&"p".into(), Condition::Pair, 1.0)
            .await
            .is_ok());
        assert_eq!(store.inner().row_count("interactions"), 1);
    }

    #[tokio::test]
    async fn test_write_failure_is_log_write_failure() {
        let store = Arc::new(FlakyStore::new(MemoryStore::new()));
        store.set_writes_failing(true);

        for mode in [AppendMode::Native, AppendMode::ReadModifyWrite] {
            let logger = InteractionLogger::new(Arc::clone(&store), "interactions", mode);
            let err = logger
                .log_interaction(&"p".into(), Condition::Violin, 1.0)
                .await
                .unwrap_err();
            assert!(matches!(err, Error::LogWriteFailure(_)));
        }
        assert_eq!(store.inner().row_count("interactions"), 0);
    }

    #[test]
    fn test_append_mode_serde() {
        let mode: AppendMode = serde_json::from_str("\"read-modify-write\"").unwrap();
        assert_eq!(mode, AppendMode::ReadModifyWrite);
    }
}
