/// Tabular output parsing for pgmin.
///
/// The psql client renders listing queries as pipe-delimited, whitespace
/// padded tables. This module turns that text into ordered records by
/// matching each line against the column count expected for the query.
use crate::core::{PgminError, Result};
use serde::Serialize;

/// One parsed output row: ordered (column name, cell value) pairs.
///
/// Column order follows the header; names are not deduplicated, so a tool
/// that emits duplicate headers yields duplicate field names.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TabularRecord {
    pub fields: Vec<(String, String)>,
}

impl TabularRecord {
    /// Returns the value of the first field with the given column name.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value.as_str())
    }
}

/// Parses pipe-delimited aligned output into records.
///
/// Only lines whose pipe-split segment count equals `expected_columns`
/// survive; everything else (separator rules, row-count footers, wrapped
/// continuation lines) is dropped. The first surviving line is the header.
/// Header and data cells are whitespace-trimmed and the last segment of each
/// line is discarded (psql pads a trailing decorative column). Data rows
/// whose first cell is empty are rendering artifacts and are skipped.
///
/// A header with no data rows is a valid empty result. Output in which no
/// line matches the expected column count is not: that means the tool's
/// format assumption was violated, and it is reported as a `Parse` error
/// rather than silently treated as empty.
pub fn parse_aligned(raw: &str, expected_columns: usize) -> Result<Vec<TabularRecord>> {
    let lines: Vec<&str> = raw
        .lines()
        .filter(|line| line.split('|').count() == expected_columns)
        .collect();

    let Some((header_line, data_lines)) = lines.split_first() else {
        return Err(PgminError::Parse(format!(
            "no {}-column header row in output",
            expected_columns
        )));
    };

    let header: Vec<&str> = header_line.split('|').map(str::trim).collect();
    let mut records = Vec::new();
    for line in data_lines {
        let cells: Vec<&str> = line.split('|').map(str::trim).collect();
        if cells[0].is_empty() {
            continue;
        }
        let fields = header[..header.len() - 1]
            .iter()
            .zip(&cells[..cells.len() - 1])
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();
        records.push(TabularRecord { fields });
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DB_LISTING: &str = "\
                        List of databases
   Name    |  Owner   | Encoding | Collate | Ctype |   Access privileges
-----------+----------+----------+---------+-------+-----------------------
 mydb      | postgres | UTF8     | C       | C     |
 template1 | postgres | UTF8     | C       | C     | =c/postgres
(2 rows)
";

    #[test]
    fn test_parses_records_and_drops_decorations() {
        let records = parse_aligned(DB_LISTING, 6).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("Name"), Some("mydb"));
        assert_eq!(records[0].get("Owner"), Some("postgres"));
        assert_eq!(records[1].get("Name"), Some("template1"));
        // trailing decorative column is dropped
        assert_eq!(records[0].get("Access privileges"), None);
        assert_eq!(records[0].fields.len(), 5);
    }

    #[test]
    fn test_malformed_lines_are_dropped() {
        let raw = "\
 Name | Owner | Encoding | Collate | Ctype |
 mydb | postgres | UTF8 | C | C |
 short | row
";
        let records = parse_aligned(raw, 6).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get("Name"), Some("mydb"));
    }

    #[test]
    fn test_rows_with_empty_first_cell_are_skipped() {
        let raw = "\
 Name | Owner | Encoding | Collate | Ctype |
 mydb | postgres | UTF8 | C | C |
      | continuation | of | previous | row |
";
        let records = parse_aligned(raw, 6).unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_header_without_data_rows_is_empty_result() {
        let raw = " Name | Owner | Encoding | Collate | Ctype | \n(0 rows)\n";
        let records = parse_aligned(raw, 6).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_unparseable_output_is_an_error() {
        let err = parse_aligned("could not connect to server\n", 6).unwrap_err();
        assert!(matches!(err, PgminError::Parse(_)));
        assert!(err.to_string().contains("6-column"));
    }

    #[test]
    fn test_column_order_and_duplicates_preserved() {
        let raw = " a | b | a | \n x | y | z | \n";
        let records = parse_aligned(raw, 4).unwrap();
        assert_eq!(
            records[0].fields,
            vec![
                ("a".to_string(), "x".to_string()),
                ("b".to_string(), "y".to_string()),
                ("a".to_string(), "z".to_string()),
            ]
        );
        // get() returns the first match for a duplicated name
        assert_eq!(records[0].get("a"), Some("x"));
    }

    #[test]
    fn test_embedded_whitespace_in_cells_survives() {
        let raw = " Name | Access privileges | \n my db | =Tc/postgres +more | \n";
        let records = parse_aligned(raw, 3).unwrap();
        assert_eq!(records[0].get("Name"), Some("my db"));
    }
}
