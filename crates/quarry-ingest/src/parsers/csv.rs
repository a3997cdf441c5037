//! CSV parser.

use super::{DocumentParser, ParsedDocument};
use crate::error::{ExtractError, ExtractResult};

/// Parser for CSV files.
///
/// Each record becomes a block of `header: value` lines, records separated by
/// a blank line, so a chunk boundary never falls inside a row unless the row
/// alone exceeds the chunk size.
pub struct CsvParser;

impl DocumentParser for CsvParser {
    fn parse_bytes(&self, name: &str, data: &[u8]) -> ExtractResult<ParsedDocument> {
        let mut reader = ::csv::ReaderBuilder::new().flexible(true).from_reader(data);

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| ExtractError::parse(name, e))?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| ExtractError::parse(name, e))?;

            let lines: Vec<String> = record
                .iter()
                .enumerate()
                .filter(|(_, value)| !value.trim().is_empty())
                .map(|(i, value)| match headers.get(i).filter(|h| !h.is_empty()) {
                    Some(header) => format!("{}: {}", header, value.trim()),
                    None => format!("column {}: {}", i + 1, value.trim()),
                })
                .collect();

            if !lines.is_empty() {
                rows.push(lines.join("\n"));
            }
        }

        Ok(ParsedDocument::new(rows.join("\n\n")).with_metadata(serde_json::json!({
            "format": "csv",
            "columns": headers,
            "rows": rows.len(),
        })))
    }

    fn extensions(&self) -> &[&str] {
        &["csv"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_as_header_value_lines() {
        let data = b"name,role\nAda,engineer\nGrace,admiral\n";
        let doc = CsvParser.parse_bytes("people.csv", data).unwrap();

        assert_eq!(
            doc.content,
            "name: Ada\nrole: engineer\n\nname: Grace\nrole: admiral"
        );
        assert_eq!(doc.metadata["rows"], 2);
    }

    #[test]
    fn test_ragged_rows_and_blanks() {
        let data = b"a,b\n1,\n2,3,4\n";
        let doc = CsvParser.parse_bytes("ragged.csv", data).unwrap();

        assert_eq!(doc.content, "a: 1\n\na: 2\nb: 3\ncolumn 3: 4");
    }

    #[test]
    fn test_header_only() {
        let doc = CsvParser.parse_bytes("empty.csv", b"a,b\n").unwrap();
        assert!(doc.is_empty());
    }
}
