//! CSV export of the interaction log
//!
//! The export is the `interactions` header followed by one line per record,
//! in record order. The same records always produce the same bytes, and
//! [`parse_csv`] reads the export back into equal records.

use crate::csv;
use crate::experiment::{records_from_table, records_to_table, InteractionRecord, INTERACTION_COLUMNS};
use crate::{Error, Result};
use std::path::Path;
use tracing::info;

/// Default export file name.
pub const DEFAULT_EXPORT_FILE: &str = "interactions.csv";

/// Encode records as CSV with the canonical header.
#[must_use]
pub fn export_csv(records: &[InteractionRecord]) -> String {
    csv::encode(&records_to_table(records))
}

/// Parse an export back into records.
///
/// # Errors
/// Returns [`Error::Csv`] for malformed text, [`Error::Schema`] if a column
/// of the header is missing, or the first [`Error::InvalidRow`].
pub fn parse_csv(text: &str) -> Result<Vec<InteractionRecord>> {
    let table = csv::decode(text)?;
    if table.columns().is_empty() {
        return Ok(Vec::new());
    }
    if let Some(missing) = INTERACTION_COLUMNS
        .iter()
        .find(|c| table.column_index(c).is_none())
    {
        return Err(Error::Schema(format!("export is missing column '{missing}'")));
    }

    let (records, invalid) = records_from_table(&table);
    match invalid.into_iter().next() {
        Some(err) => Err(err),
        None => Ok(records),
    }
}

/// Write [`export_csv`] to `path`.
///
/// # Errors
/// Returns [`Error::Io`] if the file cannot be written.
pub async fn write_csv(path: impl AsRef<Path>, records: &[InteractionRecord]) -> Result<()> {
    let path = path.as_ref();
    tokio::fs::write(path, export_csv(records)).await?;
    info!(path = %path.display(), records = records.len(), "interaction log exported");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::experiment::Condition;
    use chrono::NaiveDate;

    fn record(participant: &str, condition: Condition, secs: f64) -> InteractionRecord {
        InteractionRecord::new(
            NaiveDate::from_ymd_opt(2025, 3, 14)
                .unwrap()
                .and_hms_opt(15, 9, 26)
                .unwrap(),
            participant.into(),
            condition,
            secs,
        )
    }

    #[test]
    fn test_export_layout() {
        let csv = export_csv(&[
            record("p-1", Condition::Violin, 3.21),
            record("p-2", Condition::Pair, 0.1),
        ]);
        assert_eq!(
            csv,
            "timestamp,participant_id,chart_type,time_taken\n\
             2025-03-14 15:09:26,p-1,violin,3.21\n\
             2025-03-14 15:09:26,p-2,pair,0.1\n"
        );
    }

    #[test]
    fn test_empty_export_is_header_only() {
        assert_eq!(export_csv(&[]), "timestamp,participant_id,chart_type,time_taken\n");
        assert!(parse_csv(&export_csv(&[])).unwrap().is_empty());
        assert!(parse_csv("").unwrap().is_empty());
    }

    #[test]
    fn test_round_trip_with_awkward_ids() {
        let records = vec![
            record("comma,id", Condition::Violin, 1.0 / 3.0),
            record("quote\"id", Condition::Pair, 1e-7),
            record("", Condition::Pair, 12345.678),
        ];
        assert_eq!(parse_csv(&export_csv(&records)).unwrap(), records);
    }

    #[test]
    fn test_export_is_deterministic() {
        let records = vec![record("p", Condition::Violin, 2.5)];
        assert_eq!(export_csv(&records), export_csv(&records.clone()));
    }

    #[test]
    fn test_parse_rejects_invalid_row() {
        let text = "timestamp,participant_id,chart_type,time_taken\n2025-01-01 00:00:00,p,bar,1\n";
        assert!(matches!(
            parse_csv(text).unwrap_err(),
            Error::InvalidRow { row: 0, .. }
        ));
    }

    #[test]
    fn test_parse_rejects_missing_column() {
        let text = "timestamp,chart_type\n2025-01-01 00:00:00,pair\n";
        assert!(matches!(parse_csv(text).unwrap_err(), Error::Schema(_)));
    }

    #[tokio::test]
    async fn test_write_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_EXPORT_FILE);
        let records = vec![record("p", Condition::Pair, 4.0)];
        write_csv(&path, &records).await.unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(parse_csv(&text).unwrap(), records);
    }
}
