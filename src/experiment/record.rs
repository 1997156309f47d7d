//! Interaction Record - persisted outcome of one completed trial

use super::{Condition, ParticipantId};
use crate::store::{Row, RowRef, Table};
use crate::Error;
use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

/// Wall-clock column.
pub const TIMESTAMP_COLUMN: &str = "timestamp";
/// Participant column.
pub const PARTICIPANT_COLUMN: &str = "participant_id";
/// Condition label column.
pub const CONDITION_COLUMN: &str = "chart_type";
/// Response-time column (seconds).
pub const ELAPSED_COLUMN: &str = "time_taken";

/// The `interactions` table header, in export order.
pub const INTERACTION_COLUMNS: [&str; 4] = [
    TIMESTAMP_COLUMN,
    PARTICIPANT_COLUMN,
    CONDITION_COLUMN,
    ELAPSED_COLUMN,
];

/// Timestamp text format (`YYYY-MM-DD HH:MM:SS`).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One completed trial, as written to the interaction log.
///
/// Append-only: nothing in the crate mutates a record after construction.
/// Timestamps are truncated to whole seconds to match the persisted format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionRecord {
    timestamp: NaiveDateTime,
    participant_id: ParticipantId,
    condition: Condition,
    elapsed_seconds: f64,
}

impl InteractionRecord {
    /// Create a record. Negative or NaN elapsed times are stored as zero.
    #[must_use]
    pub fn new(
        timestamp: NaiveDateTime,
        participant_id: ParticipantId,
        condition: Condition,
        elapsed_seconds: f64,
    ) -> Self {
        Self {
            timestamp: timestamp.with_nanosecond(0).unwrap_or(timestamp),
            participant_id,
            condition,
            elapsed_seconds: elapsed_seconds.max(0.0),
        }
    }

    /// Wall-clock time the record was written.
    #[must_use]
    pub const fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }

    /// Participant that produced the record.
    #[must_use]
    pub const fn participant_id(&self) -> &ParticipantId {
        &self.participant_id
    }

    /// Condition shown.
    #[must_use]
    pub const fn condition(&self) -> Condition {
        self.condition
    }

    /// Response time in seconds (non-negative).
    #[must_use]
    pub const fn elapsed_seconds(&self) -> f64 {
        self.elapsed_seconds
    }

    /// Encode as a named row.
    ///
    /// `time_taken` uses the shortest text that parses back to the same `f64`.
    #[must_use]
    pub fn to_row(&self) -> Row {
        Row::new()
            .with(TIMESTAMP_COLUMN, self.timestamp.format(TIMESTAMP_FORMAT).to_string())
            .with(PARTICIPANT_COLUMN, self.participant_id.as_str())
            .with(CONDITION_COLUMN, self.condition.as_str())
            .with(ELAPSED_COLUMN, self.elapsed_seconds.to_string())
    }

    /// Decode a table row.
    ///
    /// A missing `participant_id` column (logs written before participants
    /// were tracked) decodes as an empty identifier.
    ///
    /// # Errors
    /// Returns a description of the first invalid cell.
    pub fn from_row(row: RowRef<'_>) -> Result<Self, String> {
        let timestamp_raw = row
            .get(TIMESTAMP_COLUMN)
            .ok_or_else(|| format!("missing {TIMESTAMP_COLUMN}"))?
            .trim();
        let timestamp = NaiveDateTime::parse_from_str(timestamp_raw, TIMESTAMP_FORMAT)
            .map_err(|e| format!("bad {TIMESTAMP_COLUMN} '{timestamp_raw}': {e}"))?;

        let participant_id = ParticipantId::from(row.get(PARTICIPANT_COLUMN).unwrap_or_default());

        let condition: Condition = row
            .get(CONDITION_COLUMN)
            .ok_or_else(|| format!("missing {CONDITION_COLUMN}"))?
            .trim()
            .parse()?;

        let elapsed_raw = row
            .get(ELAPSED_COLUMN)
            .ok_or_else(|| format!("missing {ELAPSED_COLUMN}"))?
            .trim();
        let elapsed_seconds: f64 = elapsed_raw
            .parse()
            .map_err(|_| format!("bad {ELAPSED_COLUMN} '{elapsed_raw}'"))?;
        if !elapsed_seconds.is_finite() || elapsed_seconds < 0.0 {
            return Err(format!("{ELAPSED_COLUMN} out of range: {elapsed_seconds}"));
        }

        Ok(Self {
            timestamp,
            participant_id,
            condition,
            elapsed_seconds,
        })
    }
}

/// Decode every row of an interaction table.
///
/// Malformed rows are skipped and returned as [`Error::InvalidRow`].
#[must_use]
pub fn records_from_table(table: &Table) -> (Vec<InteractionRecord>, Vec<Error>) {
    let mut records = Vec::with_capacity(table.len());
    let mut invalid = Vec::new();
    for (row, cells) in table.iter().enumerate() {
        match InteractionRecord::from_row(cells) {
            Ok(record) => records.push(record),
            Err(reason) => invalid.push(Error::InvalidRow { row, reason }),
        }
    }
    (records, invalid)
}

/// Build an interaction table with the canonical header.
#[must_use]
pub fn records_to_table(records: &[InteractionRecord]) -> Table {
    let mut table = Table::new(INTERACTION_COLUMNS);
    for record in records {
        table.push_named(&record.to_row());
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 11, 5)
            .unwrap()
            .and_hms_milli_opt(14, 3, 9, 750)
            .unwrap()
    }

    #[test]
    fn test_new_truncates_and_clamps() {
        let record = InteractionRecord::new(ts(), "p".into(), Condition::Violin, -1.0);
        assert_eq!(record.timestamp().nanosecond(), 0);
        assert!(record.elapsed_seconds().abs() < f64::EPSILON);

        let nan = InteractionRecord::new(ts(), "p".into(), Condition::Violin, f64::NAN);
        assert!(nan.elapsed_seconds().abs() < f64::EPSILON);
    }

    #[test]
    fn test_to_row_cells() {
        let record = InteractionRecord::new(ts(), "p-1".into(), Condition::Pair, 3.25);
        let table = records_to_table(&[record]);
        assert_eq!(
            table.rows()[0],
            vec![
                "2024-11-05 14:03:09".to_string(),
                "p-1".to_string(),
                "pair".to_string(),
                "3.25".to_string()
            ]
        );
    }

    #[test]
    fn test_from_row_without_participant_column() {
        let mut table = Table::new([TIMESTAMP_COLUMN, CONDITION_COLUMN, ELAPSED_COLUMN]);
        table
            .push_row(vec!["2024-11-05 14:03:09".into(), "violin".into(), "4.5".into()])
            .unwrap();
        let (records, invalid) = records_from_table(&table);
        assert!(invalid.is_empty());
        assert_eq!(records[0].participant_id().as_str(), "");
        assert_eq!(records[0].condition(), Condition::Violin);
    }

    #[test]
    fn test_from_row_rejects_bad_cells() {
        let mut table = Table::new(INTERACTION_COLUMNS);
        for row in [
            ["2024-11-05", "p", "pair", "1.0"],
            ["2024-11-05 14:03:09", "p", "bar", "1.0"],
            ["2024-11-05 14:03:09", "p", "pair", "-2"],
            ["2024-11-05 14:03:09", "p", "pair", "soon"],
            ["2024-11-05 14:03:09", "p", "pair", "1.0"],
        ] {
            table
                .push_row(row.iter().map(|s| (*s).to_string()).collect())
                .unwrap();
        }

        let (records, invalid) = records_from_table(&table);
        assert_eq!(records.len(), 1);
        assert_eq!(invalid.len(), 4);
        assert!(matches!(invalid[1], Error::InvalidRow { row: 1, .. }));
    }
}
