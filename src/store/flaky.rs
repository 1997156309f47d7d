//! Failure-injecting store wrapper
//!
//! Wraps any `DataStore` and fails reads or writes on demand. Used to
//! exercise the degraded paths: unreadable dataset, unreadable log, failed
//! interaction append.

use super::{DataStore, Row, Table};
use crate::{Error, Result};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Store wrapper with switchable read/write failures.
///
/// # Example
///
/// ```rust
/// use chart_ab::store::{DataStore, FlakyStore, MemoryStore, Row};
///
/// # async fn example() {
/// let store = FlakyStore::new(MemoryStore::new());
/// store.fail_next_writes(1);
/// assert!(store.append_row("t", Row::new().with("a", "1")).await.is_err());
/// assert!(store.append_row("t", Row::new().with("a", "1")).await.is_ok());
/// # }
/// ```
#[derive(Debug)]
pub struct FlakyStore<S> {
    inner: S,
    reads_failing: AtomicBool,
    writes_failing: AtomicBool,
    pending_write_failures: AtomicUsize,
    write_attempts: AtomicUsize,
}

impl<S: DataStore> FlakyStore<S> {
    /// Wrap a store; no failures are injected until requested.
    #[must_use]
    pub const fn new(inner: S) -> Self {
        Self {
            inner,
            reads_failing: AtomicBool::new(false),
            writes_failing: AtomicBool::new(false),
            pending_write_failures: AtomicUsize::new(0),
            write_attempts: AtomicUsize::new(0),
        }
    }

    /// The wrapped store.
    #[must_use]
    pub const fn inner(&self) -> &S {
        &self.inner
    }

    /// Fail every read until switched off.
    pub fn set_reads_failing(&self, failing: bool) {
        self.reads_failing.store(failing, Ordering::SeqCst);
    }

    /// Fail every write and append until switched off.
    pub fn set_writes_failing(&self, failing: bool) {
        self.writes_failing.store(failing, Ordering::SeqCst);
    }

    /// Fail the next `count` writes or appends, then recover.
    pub fn fail_next_writes(&self, count: usize) {
        self.pending_write_failures.store(count, Ordering::SeqCst);
    }

    /// Writes and appends attempted so far, failed ones included.
    #[must_use]
    pub fn write_attempts(&self) -> usize {
        self.write_attempts.load(Ordering::SeqCst)
    }

    fn check_read(&self, name: &str) -> Result<()> {
        if self.reads_failing.load(Ordering::SeqCst) {
            return Err(Error::Storage(format!("injected read failure on '{name}'")));
        }
        Ok(())
    }

    fn check_write(&self, name: &str) -> Result<()> {
        self.write_attempts.fetch_add(1, Ordering::SeqCst);
        let consumed = self
            .pending_write_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if consumed || self.writes_failing.load(Ordering::SeqCst) {
            return Err(Error::Storage(format!("injected write failure on '{name}'")));
        }
        Ok(())
    }
}

impl<S: DataStore> DataStore for FlakyStore<S> {
    async fn read_table(&self, name: &str) -> Result<Table> {
        self.check_read(name)?;
        self.inner.read_table(name).await
    }

    async fn write_table(&self, name: &str, table: Table) -> Result<()> {
        self.check_write(name)?;
        self.inner.write_table(name, table).await
    }

    async fn append_row(&self, name: &str, row: Row) -> Result<()> {
        self.check_write(name)?;
        if !self.inner.supports_native_append() {
            // The inner read-modify-write reads first.
            self.check_read(name)?;
        }
        self.inner.append_row(name, row).await
    }

    fn supports_native_append(&self) -> bool {
        self.inner.supports_native_append()
    }
}
