// src/transform/chunk.rs

use anyhow::{Context, Result};
use csv::{ByteRecordsIntoIter, ReaderBuilder};
use encoding_rs::mem::decode_latin1;
use std::{
    fs::File,
    path::{Path, PathBuf},
};
use tracing::warn;

/// One in-memory batch of decoded rows. Every row has exactly `width` cells.
#[derive(Debug)]
pub struct Batch {
    pub width: usize,
    pub rows: Vec<Vec<String>>,
}

/// Streams a raw registry file as fixed-stride batches of rows.
///
/// Raw files are headerless, semicolon-delimited, Latin-1 text. The field
/// count of the first record establishes the file's width; later records
/// with a different field count are malformed lines and are skipped with a
/// warning rather than failing the file.
pub struct BatchReader {
    records: ByteRecordsIntoIter<File>,
    stride: usize,
    width: Option<usize>,
    path: PathBuf,
}

impl BatchReader {
    pub fn open(path: &Path, stride: usize) -> Result<Self> {
        let reader = ReaderBuilder::new()
            .has_headers(false)
            .delimiter(b';')
            .flexible(true)
            .from_path(path)
            .with_context(|| format!("opening raw file {}", path.display()))?;

        Ok(Self {
            records: reader.into_byte_records(),
            stride: stride.max(1),
            width: None,
            path: path.to_path_buf(),
        })
    }
}

impl Iterator for BatchReader {
    type Item = Result<Batch>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut rows = Vec::with_capacity(self.stride);

        while rows.len() < self.stride {
            let record = match self.records.next() {
                Some(Ok(record)) => record,
                Some(Err(e)) => {
                    return Some(Err(anyhow::Error::new(e).context(format!(
                        "reading raw file {}",
                        self.path.display()
                    ))))
                }
                None => break,
            };

            // In Latin-1 every byte is a valid code point, so decoding
            // cannot fail; it only widens bytes >= 0x80.
            let row: Vec<String> = record
                .iter()
                .map(|field| decode_latin1(field).into_owned())
                .collect();

            let width = *self.width.get_or_insert(row.len());
            if row.len() != width {
                let line = record.position().map(|p| p.line()).unwrap_or(0);
                warn!(
                    path = %self.path.display(),
                    line,
                    fields = row.len(),
                    expected = width,
                    "malformed line, skipping"
                );
                continue;
            }

            rows.push(row);
        }

        if rows.is_empty() {
            return None;
        }
        Some(Ok(Batch {
            width: self.width.unwrap_or(0),
            rows,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_raw(bytes: &[u8]) -> NamedTempFile {
        let mut tmp = NamedTempFile::new().unwrap();
        tmp.write_all(bytes).unwrap();
        tmp
    }

    #[test]
    fn decodes_latin1_bytes() -> Result<()> {
        // "SÃO PAULO" with Latin-1 0xC3 for 'Ã'.
        let tmp = write_raw(b"\"3550\";\"S\xC3O PAULO\"\n");
        let mut reader = BatchReader::open(tmp.path(), 10)?;

        let batch = reader.next().unwrap()?;
        assert_eq!(batch.rows, vec![vec!["3550".to_string(), "SÃO PAULO".to_string()]]);
        assert!(reader.next().is_none());
        Ok(())
    }

    #[test]
    fn batches_at_fixed_stride() -> Result<()> {
        let tmp = write_raw(b"1;a\n2;b\n3;c\n4;d\n5;e\n");
        let reader = BatchReader::open(tmp.path(), 2)?;

        let sizes: Vec<usize> = reader.map(|b| b.unwrap().rows.len()).collect();
        assert_eq!(sizes, vec![2, 2, 1]);
        Ok(())
    }

    #[test]
    fn skips_malformed_lines_without_losing_neighbors() -> Result<()> {
        let tmp = write_raw(b"1;a\n2;b;EXTRA\n3;c\n");
        let mut reader = BatchReader::open(tmp.path(), 10)?;

        let batch = reader.next().unwrap()?;
        assert_eq!(batch.width, 2);
        assert_eq!(
            batch.rows,
            vec![
                vec!["1".to_string(), "a".to_string()],
                vec!["3".to_string(), "c".to_string()],
            ]
        );
        Ok(())
    }
}
