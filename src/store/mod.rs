//! Tabular DataStore abstraction
//!
//! The experiment persists to an external table store (originally a shared
//! spreadsheet). This module defines the boundary:
//!
//! - [`DataStore`]: read a whole table, replace a whole table, append a row
//! - [`MemoryStore`]: in-process backend for tests and demos
//! - [`CsvDirStore`]: one CSV file per table under a directory
//! - [`FlakyStore`]: wrapper that injects read/write failures
//!
//! # Example
//!
//! ```rust,no_run
//! use chart_ab::store::{DataStore, MemoryStore, Row};
//!
//! # async fn example() -> chart_ab::Result<()> {
//! let store = MemoryStore::new();
//! store
//!     .append_row("interactions", Row::new().with("chart_type", "pair"))
//!     .await?;
//! let table = store.read_table("interactions").await?;
//! assert_eq!(table.len(), 1);
//! # Ok(())
//! # }
//! ```

mod csv_dir;
mod flaky;
mod memory;
mod table;

pub use csv_dir::CsvDirStore;
pub use flaky::FlakyStore;
pub use memory::MemoryStore;
pub use table::{Row, RowRef, Table};

use crate::{Error, Result};
use std::future::Future;

/// External table store.
///
/// Consistency across concurrent writers is whatever the backend provides;
/// callers accept last-writer-wins.
pub trait DataStore: Send + Sync {
    /// Read a whole table.
    ///
    /// A table that does not exist yields [`Error::DataUnavailable`].
    fn read_table(&self, name: &str) -> impl Future<Output = Result<Table>> + Send;

    /// Replace a whole table.
    fn write_table(&self, name: &str, table: Table) -> impl Future<Output = Result<()>> + Send;

    /// Append one row, matching cells to columns by name.
    ///
    /// The default is read-modify-write; backends with an atomic append
    /// override it and report [`supports_native_append`](Self::supports_native_append).
    fn append_row(&self, name: &str, row: Row) -> impl Future<Output = Result<()>> + Send {
        async move {
            let mut table = match self.read_table(name).await {
                Ok(table) => table,
                Err(Error::DataUnavailable(_)) => Table::default(),
                Err(e) => return Err(e),
            };
            table.push_named(&row);
            self.write_table(name, table).await
        }
    }

    /// Whether [`append_row`](Self::append_row) is a native primitive.
    fn supports_native_append(&self) -> bool {
        false
    }
}
