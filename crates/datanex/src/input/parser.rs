//! Delimited-text loader with delimiter sniffing.

use std::fs;
use std::path::Path;

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::dataset::Dataset;
use crate::error::{DatanexError, Result};

use super::source::SourceMetadata;

/// Candidate delimiters, in tie-break order.
const CANDIDATES: [u8; 4] = [b'\t', b',', b';', b'|'];

/// Lines sampled when sniffing.
const SNIFF_LINES: usize = 10;

/// Loader settings.
#[derive(Debug, Clone)]
pub struct ParserConfig {
    /// Fixed delimiter. `None` sniffs it from the first lines.
    pub delimiter: Option<u8>,
    /// First record holds column names.
    pub has_header: bool,
    /// Stop after this many data rows.
    pub max_rows: Option<usize>,
    pub quote: u8,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            delimiter: None,
            has_header: true,
            max_rows: None,
            quote: b'"',
        }
    }
}

/// Loads CSV/TSV files into typed datasets.
#[derive(Debug, Clone, Default)]
pub struct Parser {
    config: ParserConfig,
}

impl Parser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ParserConfig) -> Self {
        Self { config }
    }

    /// Read a file, infer column types and describe where it came from.
    pub fn parse_file(&self, path: impl AsRef<Path>) -> Result<(Dataset, SourceMetadata)> {
        let path = path.as_ref();
        let contents = fs::read(path).map_err(|source| DatanexError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let digest = Sha256::digest(&contents);
        let delimiter = match self.config.delimiter {
            Some(d) => d,
            None => self.sniff_delimiter(&contents)?,
        };
        let dataset = self.parse_bytes(&contents, delimiter)?;

        let format = format_name(delimiter);
        debug!(
            path = %path.display(),
            rows = dataset.row_count(),
            columns = dataset.column_count(),
            format,
            "Parsed delimited file"
        );

        let metadata = SourceMetadata::new(
            path.to_path_buf(),
            format!("sha256:{digest:x}"),
            contents.len() as u64,
            format.to_string(),
            delimiter,
            dataset.row_count(),
            dataset.column_count(),
        );
        Ok((dataset, metadata))
    }

    /// Parse in-memory text with a known delimiter.
    ///
    /// Short rows are padded with empty cells and long rows are cut to the
    /// header width.
    pub fn parse_bytes(&self, bytes: &[u8], delimiter: u8) -> Result<Dataset> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .quote(self.config.quote)
            .has_headers(false)
            .flexible(true)
            .from_reader(bytes);
        let mut records = reader.records();

        let mut headers: Vec<String> = Vec::new();
        if self.config.has_header {
            let Some(first) = records.next() else {
                return Err(DatanexError::EmptyData("No header row found".to_string()));
            };
            headers = first?.iter().map(|h| h.trim().to_string()).collect();
        }

        let limit = self.config.max_rows.unwrap_or(usize::MAX);
        let rows = records
            .take(limit)
            .map(|record| -> Result<Vec<String>> {
                Ok(record?.iter().map(str::to_string).collect())
            })
            .collect::<Result<Vec<_>>>()?;

        if !self.config.has_header {
            let width = rows.first().map_or(0, Vec::len);
            headers = (1..=width).map(|i| format!("column_{i}")).collect();
        }
        if headers.is_empty() {
            return Err(DatanexError::EmptyData("No columns found".to_string()));
        }

        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();

        Dataset::from_strings(headers, rows)
    }

    /// Choose the candidate whose field count agrees with the first line on
    /// the most sampled lines. Falls back to comma for single-column text.
    fn sniff_delimiter(&self, bytes: &[u8]) -> Result<u8> {
        let text = String::from_utf8_lossy(bytes);
        let sample: Vec<&str> = text
            .lines()
            .filter(|l| !l.trim().is_empty())
            .take(SNIFF_LINES)
            .collect();
        let Some(first) = sample.first() else {
            return Err(DatanexError::EmptyData("No lines to analyze".to_string()));
        };

        let best = CANDIDATES
            .iter()
            .enumerate()
            .filter_map(|(rank, &delim)| {
                let expected = separators(first, delim, self.config.quote);
                if expected == 0 {
                    return None;
                }
                let agreeing = sample
                    .iter()
                    .filter(|line| separators(line, delim, self.config.quote) == expected)
                    .count();
                Some(((agreeing, expected, std::cmp::Reverse(rank)), delim))
            })
            .max_by_key(|(key, _)| *key)
            .map(|(_, delim)| delim);

        Ok(best.unwrap_or(b','))
    }
}

/// Unquoted occurrences of `delimiter` in one line.
fn separators(line: &str, delimiter: u8, quote: u8) -> usize {
    line.bytes()
        .fold((0, false), |(n, quoted), b| {
            if b == quote {
                (n, !quoted)
            } else if b == delimiter && !quoted {
                (n + 1, quoted)
            } else {
                (n, quoted)
            }
        })
        .0
}

fn format_name(delimiter: u8) -> &'static str {
    match delimiter {
        b'\t' => "tsv",
        b',' => "csv",
        b';' => "csv-semicolon",
        b'|' => "psv",
        _ => "delimited",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{ColumnType, Value};

    fn sniff(text: &[u8]) -> u8 {
        Parser::new().sniff_delimiter(text).unwrap()
    }

    #[test]
    fn test_sniff_common_delimiters() {
        assert_eq!(sniff(b"a,b,c\n1,2,3\n4,5,6"), b',');
        assert_eq!(sniff(b"a\tb\tc\n1\t2\t3"), b'\t');
        assert_eq!(sniff(b"a;b\n1;2"), b';');
        assert_eq!(sniff(b"only\n1\n2"), b',');
    }

    #[test]
    fn test_sniff_ignores_quoted_commas() {
        assert_eq!(sniff(b"name\tnote\nAnn\t\"x, y, z\"\nBob\t\"p, q\""), b'\t');
    }

    #[test]
    fn test_sniff_empty_input_fails() {
        assert!(Parser::new().sniff_delimiter(b"\n  \n").is_err());
    }

    #[test]
    fn test_parse_csv_types() {
        let ds = Parser::new()
            .parse_bytes(b"name,age,city\nAlice,30,NYC\nBob,,LA", b',')
            .unwrap();

        assert_eq!(ds.column_names(), vec!["name", "age", "city"]);
        assert_eq!(ds.row_count(), 2);
        assert_eq!(ds.columns()[1].column_type, ColumnType::Integer);
        assert_eq!(ds.get(0, 0), Some(&Value::from("Alice")));
        assert_eq!(ds.get(1, 1), Some(&Value::Null));
    }

    #[test]
    fn test_ragged_rows_are_padded() {
        let ds = Parser::new()
            .parse_bytes(b"a,b,c\n1,2\n3,4,5,6", b',')
            .unwrap();
        assert_eq!(ds.get(0, 2), Some(&Value::Null));
        assert_eq!(ds.get(1, 2), Some(&Value::Integer(5)));
    }

    #[test]
    fn test_max_rows() {
        let parser = Parser::with_config(ParserConfig {
            max_rows: Some(1),
            ..ParserConfig::default()
        });
        let ds = parser.parse_bytes(b"a\n1\n2\n3", b',').unwrap();
        assert_eq!(ds.row_count(), 1);
    }

    #[test]
    fn test_headerless_names_generated() {
        let parser = Parser::with_config(ParserConfig {
            has_header: false,
            ..ParserConfig::default()
        });
        let ds = parser.parse_bytes(b"1,x\n2,y", b',').unwrap();
        assert_eq!(ds.column_names(), vec!["column_1", "column_2"]);
        assert_eq!(ds.row_count(), 2);
    }
}
