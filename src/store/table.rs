//! Tabular rows exchanged with a `DataStore`.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// An ordered table of string cells with named columns.
///
/// Cells are kept as text, the way a spreadsheet hands them back; typed
/// parsing happens in the dataset and interaction-log readers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Create an empty table with the given header.
    #[must_use]
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Column names in header order.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Raw rows, each aligned with [`columns`](Self::columns).
    #[must_use]
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Number of data rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True if there are no data rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column by name.
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Append a positional row.
    ///
    /// # Errors
    /// Returns [`Error::Schema`] if the row width differs from the header.
    pub fn push_row(&mut self, row: Vec<String>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(Error::Schema(format!(
                "row has {} cells, table has {} columns",
                row.len(),
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    /// Append a named row, matching cells to columns by name.
    ///
    /// Columns the table lacks are added (existing rows get an empty cell);
    /// columns the row lacks are left empty.
    pub fn push_named(&mut self, row: &Row) {
        for (name, _) in row.cells() {
            if self.column_index(name).is_none() {
                self.columns.push(name.clone());
                for existing in &mut self.rows {
                    existing.push(String::new());
                }
            }
        }

        let mut values = vec![String::new(); self.columns.len()];
        for (name, value) in row.cells() {
            if let Some(idx) = self.column_index(name) {
                values[idx].clone_from(value);
            }
        }
        self.rows.push(values);
    }

    /// Whether `row` would append without widening the header.
    #[must_use]
    pub fn fits(&self, row: &Row) -> bool {
        row.cells().iter().all(|(name, _)| self.column_index(name).is_some())
    }

    /// Iterate rows with by-name access.
    pub fn iter(&self) -> impl Iterator<Item = RowRef<'_>> {
        self.rows.iter().map(|values| RowRef {
            columns: &self.columns,
            values,
        })
    }
}

/// Borrowed view of one table row.
#[derive(Debug, Clone, Copy)]
pub struct RowRef<'a> {
    columns: &'a [String],
    values: &'a [String],
}

impl<'a> RowRef<'a> {
    /// Cell value for the named column.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&'a str> {
        self.columns
            .iter()
            .position(|c| c == column)
            .and_then(|idx| self.values.get(idx))
            .map(String::as_str)
    }
}

/// A row addressed by column name, used for appends.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    cells: Vec<(String, String)>,
}

impl Row {
    /// Create an empty row.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a cell.
    #[must_use]
    pub fn with(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.cells.push((column.into(), value.into()));
        self
    }

    /// Cells in insertion order.
    #[must_use]
    pub fn cells(&self) -> &[(String, String)] {
        &self.cells
    }

    /// Column names in insertion order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(name, _)| name.as_str())
    }

    /// Cell values ordered to match `columns`; missing cells are empty.
    #[must_use]
    pub fn aligned_to(&self, columns: &[String]) -> Vec<String> {
        columns
            .iter()
            .map(|col| {
                self.cells
                    .iter()
                    .find(|(name, _)| name == col)
                    .map(|(_, value)| value.clone())
                    .unwrap_or_default()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_row_checks_width() {
        let mut table = Table::new(["a", "b"]);
        assert!(table.push_row(vec!["1".into(), "2".into()]).is_ok());
        assert!(matches!(
            table.push_row(vec!["1".into()]),
            Err(Error::Schema(_))
        ));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_push_named_matches_by_name() {
        let mut table = Table::new(["a", "b"]);
        table.push_named(&Row::new().with("b", "2").with("a", "1"));
        assert_eq!(table.rows()[0], vec!["1".to_string(), "2".to_string()]);
    }

    #[test]
    fn test_push_named_widens_header() {
        let mut table = Table::new(["timestamp", "chart_type", "time_taken"]);
        table
            .push_row(vec!["t0".into(), "pair".into(), "1.5".into()])
            .unwrap();
        table.push_named(
            &Row::new()
                .with("timestamp", "t1")
                .with("participant_id", "p-1")
                .with("chart_type", "violin")
                .with("time_taken", "2.0"),
        );

        assert_eq!(table.columns().len(), 4);
        let rows: Vec<_> = table.iter().collect();
        assert_eq!(rows[0].get("participant_id"), Some(""));
        assert_eq!(rows[1].get("participant_id"), Some("p-1"));
        assert_eq!(rows[1].get("chart_type"), Some("violin"));
    }

    #[test]
    fn test_row_aligned_to() {
        let row = Row::new().with("x", "1").with("z", "3");
        let cols = vec!["z".to_string(), "y".to_string(), "x".to_string()];
        assert_eq!(row.aligned_to(&cols), vec!["3", "", "1"]);
    }
}
