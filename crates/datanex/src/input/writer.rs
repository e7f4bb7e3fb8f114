//! Delimited-text writer for datasets.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::dataset::Dataset;
use crate::error::{DatanexError, Result};

/// Write a dataset as delimited text with a header row. Nulls become empty cells.
pub fn write_delimited<W: Write>(dataset: &Dataset, writer: W, delimiter: u8) -> Result<()> {
    let mut out = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(writer);

    out.write_record(dataset.column_names())?;
    for row in dataset.rows() {
        out.write_record(row.iter().map(|v| v.to_string()))?;
    }
    out.flush().map_err(|e| DatanexError::Io {
        path: "<writer>".into(),
        source: e,
    })?;
    Ok(())
}

/// Write a dataset to a file; `.tsv` paths use tabs, everything else commas.
pub fn write_file(dataset: &Dataset, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let delimiter = match path.extension().and_then(|e| e.to_str()) {
        Some("tsv") => b'\t',
        _ => b',',
    };
    let file = File::create(path).map_err(|e| DatanexError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    write_delimited(dataset, file, delimiter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Parser;

    #[test]
    fn test_written_file_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");

        let ds = Parser::new()
            .parse_bytes(b"id,name,score\n1,\"Smith, J\",2.5\n2,,3", b',')
            .unwrap();
        write_file(&ds, &path).unwrap();

        let (reloaded, meta) = Parser::new().parse_file(&path).unwrap();
        assert_eq!(meta.format, "csv");
        assert_eq!(reloaded.row_count(), 2);
        assert_eq!(reloaded.rows(), ds.rows());
    }
}
