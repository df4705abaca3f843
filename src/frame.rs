//! In-memory view of one survey export.
//!
//! The first CSV record becomes the column labels; every later record is a
//! row of text cells. Rows are kept exactly as wide as they were in the file,
//! so callers use [`RawTable::cell`] rather than indexing directly.

use std::path::Path;

use anyhow::{Context, Result};
use encoding_rs::Encoding;

use crate::io_utils;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    pub fn load(path: &Path, delimiter: u8, encoding: &'static Encoding) -> Result<Self> {
        let mut reader = io_utils::open_csv_reader_from_path(path, delimiter)?;
        let headers = io_utils::reader_headers(&mut reader, encoding)
            .with_context(|| format!("Reading header row of {path:?}"))?;
        let mut rows = Vec::new();
        for (row_idx, record) in reader.byte_records().enumerate() {
            let record =
                record.with_context(|| format!("Reading row {} in {:?}", row_idx + 2, path))?;
            let decoded = io_utils::decode_record(&record, encoding)
                .with_context(|| format!("Decoding row {} in {:?}", row_idx + 2, path))?;
            rows.push(decoded);
        }
        Ok(Self { headers, rows })
    }

    /// Cell text, or `None` when the row is shorter than `column`.
    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|cells| cells.get(column))
            .map(String::as_str)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}
