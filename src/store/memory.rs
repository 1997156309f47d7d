//! In-memory store implementation using `DashMap`.
//!
//! Data is lost on process restart. Use [`CsvDirStore`](super::CsvDirStore)
//! for persistence.

use super::{DataStore, Row, Table};
use crate::{Error, Result};
use dashmap::DashMap;

/// In-memory table store backed by a concurrent hashmap.
///
/// Appends lock only the target table's shard, so concurrent appends to the
/// same table never lose rows.
///
/// # Example
///
/// ```rust
/// use chart_ab::store::{DataStore, MemoryStore, Table};
///
/// # async fn example() -> chart_ab::Result<()> {
/// let store = MemoryStore::new();
/// store.write_table("penguins", Table::new(["species"])).await?;
/// assert!(store.read_table("penguins").await?.is_empty());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: DashMap<String, Table>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with tables.
    #[must_use]
    pub fn with_tables<I>(tables: I) -> Self
    where
        I: IntoIterator<Item = (String, Table)>,
    {
        Self {
            tables: tables.into_iter().collect(),
        }
    }

    /// Number of tables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// True if no table exists.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Number of rows in a table (0 if absent).
    #[must_use]
    pub fn row_count(&self, name: &str) -> usize {
        self.tables.get(name).map_or(0, |t| t.len())
    }
}

impl DataStore for MemoryStore {
    async fn read_table(&self, name: &str) -> Result<Table> {
        self.tables
            .get(name)
            .map(|t| t.value().clone())
            .ok_or_else(|| Error::DataUnavailable(format!("table '{name}' does not exist")))
    }

    async fn write_table(&self, name: &str, table: Table) -> Result<()> {
        self.tables.insert(name.to_string(), table);
        Ok(())
    }

    async fn append_row(&self, name: &str, row: Row) -> Result<()> {
        self.tables
            .entry(name.to_string())
            .or_default()
            .push_named(&row);
        Ok(())
    }

    fn supports_native_append(&self) -> bool {
        true
    }
}
