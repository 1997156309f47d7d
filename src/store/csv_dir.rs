//! CSV-directory store
//!
//! One `<table>.csv` file per table under a root directory. Full replaces go
//! through a temp file in the same directory followed by a rename, so a
//! reader sees either the old table or the new one. Appends write a single
//! line when the row fits the existing header, otherwise fall back to a
//! full replace.

use super::{DataStore, Row, Table};
use crate::{csv, Error, Result};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// Table store backed by CSV files.
///
/// Writes from one process are serialized; writes from several processes
/// sharing a directory are last-writer-wins.
#[derive(Debug)]
pub struct CsvDirStore {
    root: PathBuf,
    write_lock: Mutex<()>,
}

impl CsvDirStore {
    /// Open (without creating) a store rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File path for a table.
    ///
    /// # Errors
    /// Returns [`Error::Storage`] if the name is not a plain identifier.
    pub fn table_path(&self, name: &str) -> Result<PathBuf> {
        let valid = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(Error::Storage(format!("invalid table name '{name}'")));
        }
        Ok(self.root.join(format!("{name}.csv")))
    }

    async fn blocking<T, F>(f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T> + Send + 'static,
    {
        tokio::task::spawn_blocking(f)
            .await
            .map_err(|e| Error::Storage(format!("store task failed: {e}")))?
    }
}

fn read_file(name: &str, path: &Path) -> Result<Table> {
    csv::decode(&read_text(name, path)?)
}

fn read_text(name: &str, path: &Path) -> Result<String> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(text),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(Error::DataUnavailable(
            format!("table '{name}' not found at {}", path.display()),
        )),
        Err(e) => Err(Error::Storage(format!(
            "failed to read {}: {e}",
            path.display()
        ))),
    }
}

fn replace_file(root: &Path, path: &Path, table: &Table) -> Result<()> {
    fs::create_dir_all(root)
        .map_err(|e| Error::Storage(format!("failed to create {}: {e}", root.display())))?;
    let mut tmp = tempfile::NamedTempFile::new_in(root)
        .map_err(|e| Error::Storage(format!("failed to create temp file: {e}")))?;
    tmp.write_all(csv::encode(table).as_bytes())
        .and_then(|()| tmp.as_file().sync_all())
        .map_err(|e| Error::Storage(format!("failed to write temp file: {e}")))?;
    tmp.persist(path)
        .map_err(|e| Error::Storage(format!("failed to replace {}: {e}", path.display())))?;
    Ok(())
}

fn append_file(name: &str, root: &Path, path: &Path, row: &Row) -> Result<()> {
    // A hand-edited file may lack the final line break; the new line must
    // not be glued onto the last row.
    let (mut table, terminated) = match read_text(name, path) {
        Ok(text) => (csv::decode(&text)?, text.is_empty() || text.ends_with('\n')),
        Err(Error::DataUnavailable(_)) => (Table::default(), true),
        Err(e) => return Err(e),
    };

    if table.columns().is_empty() || !table.fits(row) {
        table.push_named(row);
        return replace_file(root, path, &table);
    }

    let mut line = if terminated { String::new() } else { "\n".to_string() };
    line.push_str(&csv::encode_line(&row.aligned_to(table.columns())));
    let mut file = OpenOptions::new()
        .append(true)
        .open(path)
        .map_err(|e| Error::Storage(format!("failed to open {}: {e}", path.display())))?;
    file.write_all(line.as_bytes())
        .and_then(|()| file.sync_data())
        .map_err(|e| Error::Storage(format!("failed to append to {}: {e}", path.display())))
}

impl DataStore for CsvDirStore {
    async fn read_table(&self, name: &str) -> Result<Table> {
        let path = self.table_path(name)?;
        let name = name.to_string();
        Self::blocking(move || read_file(&name, &path)).await
    }

    async fn write_table(&self, name: &str, table: Table) -> Result<()> {
        let path = self.table_path(name)?;
        let root = self.root.clone();
        let _guard = self.write_lock.lock().await;
        Self::blocking(move || replace_file(&root, &path, &table)).await
    }

    async fn append_row(&self, name: &str, row: Row) -> Result<()> {
        let path = self.table_path(name)?;
        let root = self.root.clone();
        let name = name.to_string();
        let _guard = self.write_lock.lock().await;
        Self::blocking(move || append_file(&name, &root, &path, &row)).await
    }

    fn supports_native_append(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_table_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let store = CsvDirStore::new(dir.path());
        assert!(matches!(
            store.read_table("interactions").await,
            Err(Error::DataUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let store = CsvDirStore::new(dir.path().join("nested"));

        let mut table = Table::new(["species", "bill_length_mm"]);
        table
            .push_row(vec!["Adelie".into(), "39.1".into()])
            .unwrap();
        store.write_table("penguins", table.clone()).await.unwrap();

        assert_eq!(store.read_table("penguins").await.unwrap(), table);
        let text = std::fs::read_to_string(store.table_path("penguins").unwrap()).unwrap();
        assert_eq!(text, "species,bill_length_mm\nAdelie,39.1\n");
    }

    #[tokio::test]
    async fn test_append_creates_then_appends_lines() {
        let dir = tempfile::tempdir().unwrap();
        let store = CsvDirStore::new(dir.path());

        store
            .append_row("log", Row::new().with("a", "1").with("b", "x,y"))
            .await
            .unwrap();
        store
            .append_row("log", Row::new().with("b", "z").with("a", "2"))
            .await
            .unwrap();

        let text = std::fs::read_to_string(store.table_path("log").unwrap()).unwrap();
        assert_eq!(text, "a,b\n1,\"x,y\"\n2,z\n");
    }

    #[tokio::test]
    async fn test_append_widens_header() {
        let dir = tempfile::tempdir().unwrap();
        let store = CsvDirStore::new(dir.path());

        store
            .append_row("log", Row::new().with("a", "1"))
            .await
            .unwrap();
        store
            .append_row("log", Row::new().with("a", "2").with("b", "new"))
            .await
            .unwrap();

        let table = store.read_table("log").await.unwrap();
        assert_eq!(table.columns(), &["a".to_string(), "b".to_string()]);
        let rows: Vec<_> = table.iter().collect();
        assert_eq!(rows[0].get("b"), Some(""));
        assert_eq!(rows[1].get("b"), Some("new"));
    }

    #[tokio::test]
    async fn test_append_after_unterminated_last_row() {
        let dir = tempfile::tempdir().unwrap();
        let store = CsvDirStore::new(dir.path());
        let path = store.table_path("log").unwrap();
        std::fs::write(&path, "a,b\n1,x").unwrap();

        store
            .append_row("log", Row::new().with("a", "2").with("b", "y"))
            .await
            .unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "a,b\n1,x\n2,y\n");
        let table = store.read_table("log").await.unwrap();
        assert_eq!(table.len(), 2);
    }

    #[tokio::test]
    async fn test_append_after_unterminated_header() {
        let dir = tempfile::tempdir().unwrap();
        let store = CsvDirStore::new(dir.path());
        let path = store.table_path("log").unwrap();
        std::fs::write(&path, "a,b").unwrap();

        store
            .append_row("log", Row::new().with("a", "1").with("b", "x"))
            .await
            .unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "a,b\n1,x\n");
    }

    #[test]
    fn test_rejects_path_like_names() {
        let store = CsvDirStore::new("/tmp");
        assert!(store.table_path("../etc/passwd").is_err());
        assert!(store.table_path("").is_err());
        assert!(store.table_path("interactions").is_ok());
    }
}
