//! Delimited-text codec for tables
//!
//! Comma-separated, `\n` line endings, RFC 4180 quoting: a field is quoted
//! when it contains a comma, a quote, or a line break, and embedded quotes
//! are doubled. Encoding is deterministic, so the same table always yields
//! the same bytes.

use crate::store::Table;
use crate::{Error, Result};
use std::borrow::Cow;

/// Encode a table (header row first).
#[must_use]
pub fn encode(table: &Table) -> String {
    let mut out = String::new();
    push_line(&mut out, table.columns());
    for row in table.rows() {
        push_line(&mut out, row);
    }
    out
}

/// Encode a single record line, including the trailing newline.
#[must_use]
pub fn encode_line(fields: &[String]) -> String {
    let mut out = String::new();
    push_line(&mut out, fields);
    out
}

fn push_line(out: &mut String, fields: &[String]) {
    // A lone empty field would otherwise encode as a blank line.
    if let [only] = fields {
        if only.is_empty() {
            out.push_str("\"\"\n");
            return;
        }
    }
    let line = fields
        .iter()
        .map(|field| escape_field(field))
        .collect::<Vec<_>>()
        .join(",");
    out.push_str(&line);
    out.push('\n');
}

/// Quote a field if it needs it.
#[must_use]
pub fn escape_field(value: &str) -> Cow<'_, str> {
    if value.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}

/// Decode text produced by [`encode`] (or any RFC 4180 file).
///
/// Empty input yields an empty table with no columns. Blank lines outside
/// quotes are skipped. `\r\n` line endings are accepted.
///
/// # Errors
/// Returns [`Error::Csv`] for an unterminated quote, stray characters after
/// a closing quote, or a record whose width differs from the header.
pub fn decode(text: &str) -> Result<Table> {
    let records = split_records(text)?;
    let mut iter = records.into_iter();

    let Some((_, header)) = iter.next() else {
        return Ok(Table::default());
    };

    let mut table = Table::new(header);
    for (line, record) in iter {
        let width = record.len();
        table.push_row(record).map_err(|_| Error::Csv {
            line,
            reason: format!(
                "expected {} fields, found {width}",
                table.columns().len()
            ),
        })?;
    }
    Ok(table)
}

/// Split into records, each tagged with the line number it starts on.
fn split_records(text: &str) -> Result<Vec<(usize, Vec<String>)>> {
    let mut records = Vec::new();
    let mut fields: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut after_quote = false;
    let mut line = 1;
    let mut record_line = 1;
    let mut record_started = false;

    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => {
                    in_quotes = false;
                    after_quote = true;
                }
                '\n' => {
                    line += 1;
                    field.push(c);
                }
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' if field.is_empty() && !after_quote => {
                in_quotes = true;
                record_started = true;
            }
            ',' => {
                fields.push(std::mem::take(&mut field));
                after_quote = false;
                record_started = true;
            }
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                if record_started || !field.is_empty() {
                    fields.push(std::mem::take(&mut field));
                    records.push((record_line, std::mem::take(&mut fields)));
                }
                after_quote = false;
                record_started = false;
                line += 1;
                record_line = line;
            }
            _ if after_quote => {
                return Err(Error::Csv {
                    line,
                    reason: format!("unexpected character {c:?} after closing quote"),
                });
            }
            _ => {
                field.push(c);
                record_started = true;
            }
        }
    }

    if in_quotes {
        return Err(Error::Csv {
            line: record_line,
            reason: "unterminated quoted field".to_string(),
        });
    }
    if record_started || !field.is_empty() {
        fields.push(field);
        records.push((record_line, fields));
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(columns: &[&str], rows: &[&[&str]]) -> Table {
        let mut t = Table::new(columns.iter().copied());
        for row in rows {
            t.push_row(row.iter().map(|s| (*s).to_string()).collect())
                .unwrap();
        }
        t
    }

    #[test]
    fn test_encode_plain() {
        let t = table(&["a", "b"], &[&["1", "2"], &["3", "4"]]);
        assert_eq!(encode(&t), "a,b\n1,2\n3,4\n");
    }

    #[test]
    fn test_encode_quotes_special_fields() {
        let t = table(&["note"], &[&["x,y"], &["say \"hi\""], &["two\nlines"]]);
        assert_eq!(
            encode(&t),
            "note\n\"x,y\"\n\"say \"\"hi\"\"\"\n\"two\nlines\"\n"
        );
    }

    #[test]
    fn test_decode_quoted_fields() {
        let t = decode("note,n\n\"x,y\",1\n\"say \"\"hi\"\"\",2\n\"two\nlines\",3\n").unwrap();
        assert_eq!(t.len(), 3);
        assert_eq!(t.rows()[0][0], "x,y");
        assert_eq!(t.rows()[1][0], "say \"hi\"");
        assert_eq!(t.rows()[2][0], "two\nlines");
        assert_eq!(t.rows()[2][1], "3");
    }

    #[test]
    fn test_decode_crlf_and_blank_lines() {
        let t = decode("a,b\r\n1,2\r\n\r\n3,4").unwrap();
        assert_eq!(t.columns(), &["a".to_string(), "b".to_string()]);
        assert_eq!(t.len(), 2);
        assert_eq!(t.rows()[1], vec!["3".to_string(), "4".to_string()]);
    }

    #[test]
    fn test_decode_empty_fields() {
        let t = decode("a,b,c\n,,\n").unwrap();
        assert_eq!(t.rows()[0], vec![String::new(), String::new(), String::new()]);
    }

    #[test]
    fn test_decode_empty_input() {
        let t = decode("").unwrap();
        assert!(t.columns().is_empty());
        assert!(t.is_empty());
    }

    #[test]
    fn test_decode_ragged_row_reports_line() {
        let err = decode("a,b\n1,2\n3\n").unwrap_err();
        match err {
            Error::Csv { line, .. } => assert_eq!(line, 3),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_decode_unterminated_quote() {
        assert!(matches!(decode("a\n\"open\n"), Err(Error::Csv { .. })));
    }

    #[test]
    fn test_decode_garbage_after_quote() {
        assert!(matches!(decode("a\n\"x\"y\n"), Err(Error::Csv { .. })));
    }

    #[test]
    fn test_roundtrip_preserves_bytes() {
        let t = table(&["a", "b"], &[&["1,5", "q\"q"], &["", "z"]]);
        let text = encode(&t);
        let back = decode(&text).unwrap();
        assert_eq!(back, t);
        assert_eq!(encode(&back), text);
    }
}
