//! Reference dataset: penguin bill measurements
//!
//! The experiment always shows the same dataset. Rows are validated on load:
//! an unknown species or a non-finite measurement excludes the row (it is
//! never repaired), and the exclusions are reported alongside the data.
//!
//! ```text
//! penguins table ──read──> Table ──validate──> Dataset + [RejectedRow]
//!                                                 │
//!                          DatasetLoader (staleness budget cache)
//! ```

mod loader;

pub use loader::{DatasetLoader, Freshness, LoadedDataset};

use crate::store::{RowRef, Table};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Column holding the category label.
pub const SPECIES_COLUMN: &str = "species";
/// First numeric measurement column.
pub const BILL_LENGTH_COLUMN: &str = "bill_length_mm";
/// Second numeric measurement column.
pub const BILL_DEPTH_COLUMN: &str = "bill_depth_mm";

/// Penguin species recognised by the dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Species {
    /// Pygoscelis adeliae
    Adelie,
    /// Pygoscelis antarcticus
    Chinstrap,
    /// Pygoscelis papua
    Gentoo,
}

impl Species {
    /// Every species, in display order.
    pub const ALL: [Self; 3] = [Self::Adelie, Self::Chinstrap, Self::Gentoo];

    /// Label as stored in the table.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Adelie => "Adelie",
            Self::Chinstrap => "Chinstrap",
            Self::Gentoo => "Gentoo",
        }
    }
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Species {
    type Err = RejectReason;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|sp| sp.as_str() == s)
            .ok_or_else(|| RejectReason::UnknownSpecies(s.to_string()))
    }
}

/// One validated observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DatasetRow {
    /// Category label
    pub species: Species,
    /// Bill length in millimetres (finite)
    pub bill_length_mm: f64,
    /// Bill depth in millimetres (finite)
    pub bill_depth_mm: f64,
}

/// Why a row was excluded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// Species label outside the allowed set
    UnknownSpecies(String),
    /// Measurement cell is not a number
    NonNumeric {
        /// Column name
        column: &'static str,
        /// Offending cell text
        value: String,
    },
    /// Measurement parsed but is NaN or infinite
    NonFinite {
        /// Column name
        column: &'static str,
    },
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownSpecies(s) => write!(f, "unknown species '{s}'"),
            Self::NonNumeric { column, value } => {
                write!(f, "{column} is not a number: '{value}'")
            }
            Self::NonFinite { column } => write!(f, "{column} is not finite"),
        }
    }
}

/// A row excluded during validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedRow {
    /// Zero-based data row index
    pub row: usize,
    /// Why it was excluded
    pub reason: RejectReason,
}

impl RejectedRow {
    /// Convert to the crate error taxonomy.
    #[must_use]
    pub fn to_error(&self) -> Error {
        Error::InvalidRow {
            row: self.row,
            reason: self.reason.to_string(),
        }
    }
}

/// Validated, read-only dataset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    rows: Vec<DatasetRow>,
}

impl Dataset {
    /// Build from already-valid rows.
    #[must_use]
    pub fn new(rows: Vec<DatasetRow>) -> Self {
        Self { rows }
    }

    /// Validate a raw table.
    ///
    /// Returns the valid rows in their original order plus every excluded
    /// row with its reason.
    ///
    /// # Errors
    /// Returns [`Error::Schema`] if a required column is missing.
    pub fn from_table(table: &Table) -> Result<(Self, Vec<RejectedRow>)> {
        for column in [SPECIES_COLUMN, BILL_LENGTH_COLUMN, BILL_DEPTH_COLUMN] {
            if table.column_index(column).is_none() {
                return Err(Error::Schema(format!(
                    "dataset table is missing column '{column}'"
                )));
            }
        }

        let mut rows = Vec::with_capacity(table.len());
        let mut rejected = Vec::new();
        for (idx, row) in table.iter().enumerate() {
            match parse_row(row) {
                Ok(parsed) => rows.push(parsed),
                Err(reason) => rejected.push(RejectedRow { row: idx, reason }),
            }
        }
        Ok((Self { rows }, rejected))
    }

    /// All rows.
    #[must_use]
    pub fn rows(&self) -> &[DatasetRow] {
        &self.rows
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True if the dataset has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows of one species.
    pub fn of_species(&self, species: Species) -> impl Iterator<Item = &DatasetRow> {
        self.rows.iter().filter(move |r| r.species == species)
    }

    /// Species present in the data, in [`Species::ALL`] order.
    #[must_use]
    pub fn species_present(&self) -> Vec<Species> {
        Species::ALL
            .into_iter()
            .filter(|sp| self.rows.iter().any(|r| r.species == *sp))
            .collect()
    }
}

fn parse_row(row: RowRef<'_>) -> std::result::Result<DatasetRow, RejectReason> {
    let species: Species = row.get(SPECIES_COLUMN).unwrap_or_default().trim().parse()?;
    Ok(DatasetRow {
        species,
        bill_length_mm: parse_measurement(row, BILL_LENGTH_COLUMN)?,
        bill_depth_mm: parse_measurement(row, BILL_DEPTH_COLUMN)?,
    })
}

fn parse_measurement(
    row: RowRef<'_>,
    column: &'static str,
) -> std::result::Result<f64, RejectReason> {
    let raw = row.get(column).unwrap_or_default().trim();
    let value: f64 = raw.parse().map_err(|_| RejectReason::NonNumeric {
        column,
        value: raw.to_string(),
    })?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(RejectReason::NonFinite { column })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn penguins(rows: &[[&str; 3]]) -> Table {
        let mut t = Table::new([SPECIES_COLUMN, BILL_LENGTH_COLUMN, BILL_DEPTH_COLUMN]);
        for r in rows {
            t.push_row(r.iter().map(|s| (*s).to_string()).collect())
                .unwrap();
        }
        t
    }

    #[test]
    fn test_species_parse() {
        assert_eq!("Gentoo".parse::<Species>(), Ok(Species::Gentoo));
        assert_eq!(
            "gentoo".parse::<Species>(),
            Err(RejectReason::UnknownSpecies("gentoo".to_string()))
        );
    }

    #[test]
    fn test_from_table_excludes_unknown_species() {
        let table = penguins(&[
            ["Adelie", "39.1", "18.7"],
            ["Orca", "50.0", "20.0"],
            ["Gentoo", "46.1", "13.2"],
        ]);
        let (dataset, rejected) = Dataset::from_table(&table).unwrap();

        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.rows()[0].species, Species::Adelie);
        assert_eq!(dataset.rows()[1].species, Species::Gentoo);
        assert_eq!(rejected.len(), 1);
        assert_eq!(rejected[0].row, 1);
        assert_eq!(
            rejected[0].reason,
            RejectReason::UnknownSpecies("Orca".to_string())
        );
    }

    #[test]
    fn test_from_table_excludes_bad_measurements() {
        let table = penguins(&[
            ["Adelie", "NA", "18.7"],
            ["Chinstrap", "46.5", "inf"],
            ["Chinstrap", "", "17.9"],
            ["Chinstrap", "46.5", "17.9"],
        ]);
        let (dataset, rejected) = Dataset::from_table(&table).unwrap();

        assert_eq!(dataset.len(), 1);
        assert_eq!(rejected.len(), 3);
        assert!(matches!(
            rejected[1].reason,
            RejectReason::NonFinite { column: BILL_DEPTH_COLUMN }
        ));
    }

    #[test]
    fn test_from_table_missing_column() {
        let table = Table::new([SPECIES_COLUMN, BILL_LENGTH_COLUMN]);
        assert!(matches!(Dataset::from_table(&table), Err(Error::Schema(_))));
    }

    #[test]
    fn test_rejected_row_error() {
        let rejected = RejectedRow {
            row: 4,
            reason: RejectReason::UnknownSpecies("Orca".to_string()),
        };
        let msg = rejected.to_error().to_string();
        assert!(msg.contains("Invalid row 4"));
        assert!(msg.contains("Orca"));
    }

    #[test]
    fn test_species_present() {
        let dataset = Dataset::new(vec![DatasetRow {
            species: Species::Gentoo,
            bill_length_mm: 47.0,
            bill_depth_mm: 15.0,
        }]);
        assert_eq!(dataset.species_present(), vec![Species::Gentoo]);
        assert_eq!(dataset.of_species(Species::Adelie).count(), 0);
    }
}
